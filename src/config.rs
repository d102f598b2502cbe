use comrak::ComrakOptions;
use gotham_derive::StateData;

/// Application wide settings defined in configuration file.
#[derive(Deserialize, StateData, Clone)]
pub struct Settings {
    /// Postgres database url
    pub database_url: String,
    /// IP address to bind to
    pub host_address: String,
    /// Public base url of the site, without a trailing slash. Used when
    /// links have to be absolute, e.g. in the RSS feed.
    pub site_url: String,
    /// Cookie settings
    pub cookie: Cookie,
}

impl Settings {
    pub fn from_slice(data: &[u8]) -> Result<Self, toml::de::Error> {
        toml::from_slice(data)
    }
}

/// Cookie related settings
#[derive(Deserialize, Clone)]
pub struct Cookie {
    /// Require HTTPS for cookies
    pub secure: bool,
    /// Restrict cookies to given domain if set
    pub domain: Option<String>,
}

/// Options for markdown formatting using comrak. Post and comment bodies are
/// written by arbitrary registered users, so raw HTML stays disabled.
pub const COMRAK_OPTS: ComrakOptions = ComrakOptions {
    hardbreaks: false,
    smart: false,
    github_pre_lang: true,
    width: 0,
    default_info_string: None,
    unsafe_: false,
    ext_strikethrough: true,
    ext_tagfilter: false,
    ext_table: true,
    ext_autolink: true,
    ext_tasklist: false,
    ext_superscript: false,
    ext_header_ids: None,
    ext_footnotes: true,
    ext_description_lists: false,
};

#[cfg(test)]
mod tests {
    use super::Settings;

    #[test]
    fn parse_settings() {
        let toml = br#"
            database_url = "postgres://blog@localhost/blog"
            host_address = "127.0.0.1:8000"
            site_url = "https://blog.example.org"

            [cookie]
            secure = true
            domain = "blog.example.org"
        "#;
        let settings = Settings::from_slice(toml).unwrap();
        assert_eq!(settings.host_address, "127.0.0.1:8000");
        assert!(settings.cookie.secure);
        assert_eq!(settings.cookie.domain.as_deref(), Some("blog.example.org"));
    }
}
