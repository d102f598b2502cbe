//! Login, signup, profile pages and account settings.

use askama::Template;
use cookie::{Cookie, SameSite};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use gotham::state::{client_addr, FromState, State};
use gotham_derive::{StateData, StaticResponseExtender};
use http::header;

use crate::{
    config::Settings,
    db::DbConnection,
    document::{self, see_other, DocumentResult, PageQuery, TemplateExt},
    feed::{self, Page, PostSummary},
    user::{self, Login, NewUser, Session, User, UserProfile},
};

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct UserPath {
    pub username: String,
}

fn session_cookie<'a>(state: &State, id: &str) -> Cookie<'a> {
    let settings = Settings::borrow_from(state);
    let mut cookie = Cookie::build("session", id.to_owned())
        .same_site(SameSite::Strict)
        .http_only(true)
        .path("/")
        .finish();
    if settings.cookie.secure {
        cookie.set_secure(true);
    }
    if let Some(ref domain) = settings.cookie.domain {
        cookie.set_domain(domain.to_owned());
    }
    cookie
}

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate<'a> {
    session: Option<&'a Session>,
    profile: User,
    feed: Page<PostSummary>,
    /// Whether the viewer is looking at their own profile
    own: bool,
}

/// A user's profile: every one of their posts, drafts and scheduled posts
/// included. Following a link to somebody else's unpublished post still
/// 404s at the detail page.
pub fn profile(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);
    let username = &UserPath::borrow_from(state).username;
    let page = PageQuery::borrow_from(state).number();

    let (profile, feed) = feed::by_author(connection, username, page)?;
    let own = session.map_or(false, |s| &s.user == username);

    Ok(ProfileTemplate {
        session,
        profile,
        feed,
        own,
    }
    .to_response(state))
}

#[derive(Template)]
#[template(path = "profile-form.html")]
struct ProfileFormTemplate<'a> {
    session: Option<&'a Session>,
    name: String,
    email: String,
    errors: Vec<String>,
}

fn validate_profile(profile: &UserProfile) -> Vec<String> {
    let mut errors = Vec::new();
    if profile.name.trim().is_empty() {
        errors.push(String::from("the display name must not be empty"));
    }
    if !profile.email.contains('@') {
        errors.push(String::from("that doesn't look like an email address"));
    }
    errors
}

/// Form for changing your own identity fields.
pub fn edit(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = match Session::try_borrow_from(state) {
        Some(session) => session,
        None => return Ok(see_other(state, String::from("/login"))),
    };

    let user = user::get(connection, &session.user)?
        .ok_or_else(|| failure::err_msg("session for missing user"))?;
    Ok(ProfileFormTemplate {
        session: Some(session),
        name: user.name,
        email: user.email,
        errors: Vec::new(),
    }
    .to_response(state))
}

/// Applies profile changes to the session's own user, nobody else's.
pub fn edit_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = match Session::try_borrow_from(state) {
        Some(session) => session,
        None => return Ok(see_other(state, String::from("/login"))),
    };

    let profile: UserProfile = document::form(&body)?;
    let errors = validate_profile(&profile);
    if !errors.is_empty() {
        return Ok(ProfileFormTemplate {
            session: Some(session),
            name: profile.name,
            email: profile.email,
            errors,
        }
        .to_response(state));
    }

    user::edit_profile(connection, &session.user, &profile)?;
    Ok(see_other(state, format!("/profile/{}", session.user)))
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate<'a> {
    session: Option<&'a Session>,
    failed: bool,
}

/// Login form
pub fn login(state: &State) -> DocumentResult {
    Ok(LoginTemplate {
        session: Session::try_borrow_from(state),
        failed: false,
    }
    .to_response(state))
}

/// Login post. Sets the session cookie and goes home if the credentials
/// were right, otherwise shows the form again.
pub fn login_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let credentials: Login = document::form(&body)?;

    match credentials.login(connection)? {
        Some(session) => {
            let mut response = see_other(state, String::from("/"));
            let cookie = session_cookie(state, &session.id);
            response
                .headers_mut()
                .append(header::SET_COOKIE, cookie.to_string().parse()?);
            Ok(response)
        }
        None => Ok(LoginTemplate {
            session: Session::try_borrow_from(state),
            failed: true,
        }
        .to_response(state)),
    }
}

#[derive(Template)]
#[template(path = "signup.html")]
struct SignupTemplate<'a> {
    session: Option<&'a Session>,
    errors: Vec<String>,
}

pub fn signup(state: &State) -> DocumentResult {
    Ok(SignupTemplate {
        session: Session::try_borrow_from(state),
        errors: Vec::new(),
    }
    .to_response(state))
}

fn validate_signup(new_user: &NewUser) -> Vec<String> {
    let mut errors = Vec::new();
    if new_user.id.is_empty()
        || !new_user
            .id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        errors.push(String::from(
            "the username must consist of letters, digits, - and _",
        ));
    }
    if new_user.name.trim().is_empty() {
        errors.push(String::from("the display name must not be empty"));
    }
    if !new_user.email.contains('@') {
        errors.push(String::from("that doesn't look like an email address"));
    }
    errors
}

/// Registration. Creates the account and logs it straight in.
pub fn signup_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let new_user: NewUser = document::form(&body)?;

    // If the `phone` field is filled out we caught a spammer
    if !new_user.phone.is_empty() {
        let addr = match client_addr(state) {
            Some(addr) => format!("{}", addr),
            None => String::from("unavailable"),
        };
        warn!(
            "caught spam signup with id '{}' and client IP '{}'",
            new_user.id, addr,
        );
        return Err(failure::err_msg("You're not supposed to fill out this field"));
    }

    let errors = validate_signup(&new_user);
    if !errors.is_empty() {
        return Ok(SignupTemplate {
            session: Session::try_borrow_from(state),
            errors,
        }
        .to_response(state));
    }

    let connection = &DbConnection::from_state(state)?;
    if let Err(error) = user::create(connection, new_user.clone()) {
        // A taken username is the user's problem, not the server's.
        if let Some(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) =
            error.downcast_ref::<DieselError>()
        {
            return Ok(SignupTemplate {
                session: Session::try_borrow_from(state),
                errors: vec![String::from("that username is already taken")],
            }
            .to_response(state));
        }
        return Err(error);
    }
    let username = new_user.id.clone();
    let credentials: Login = new_user.into();

    let session = credentials
        .login(connection)?
        .ok_or_else(|| failure::err_msg("freshly created user failed to log in"))?;
    let mut response = see_other(state, format!("/profile/{}", username));
    let cookie = session_cookie(state, &session.id);
    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie.to_string().parse()?);

    Ok(response)
}

#[derive(Template)]
#[template(path = "logout.html")]
struct LogoutTemplate<'a> {
    session: Option<&'a Session>,
}

pub fn logout(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);

    if let Some(session) = session {
        user::logout(connection, &session.id)?;
    }

    let mut response = LogoutTemplate { session: None }.to_response(state);

    // Delete session cookie with Max-Age=0
    let cookie = Cookie::build("session", "")
        .max_age(time::Duration::zero())
        .finish();
    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie.to_string().parse()?);

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::{validate_profile, validate_signup};
    use crate::user::UserProfile;

    #[test]
    fn profile_fields_are_checked() {
        let good = UserProfile {
            name: String::from("Amanda"),
            email: String::from("amanda@example.org"),
        };
        assert!(validate_profile(&good).is_empty());

        let bad = UserProfile {
            name: String::from(" "),
            email: String::from("nope"),
        };
        assert_eq!(validate_profile(&bad).len(), 2);
    }

    #[test]
    fn signup_fields_are_checked() {
        let good = serde_urlencoded::from_str(
            "id=amanda&password=hunter2&name=Amanda&email=amanda%40example.org",
        )
        .unwrap();
        assert!(validate_signup(&good).is_empty());

        let bad =
            serde_urlencoded::from_str("id=am/anda&password=hunter2&name=&email=nope").unwrap();
        let errors = validate_signup(&bad);
        assert_eq!(errors.len(), 3);
    }
}
