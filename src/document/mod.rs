//! HTML page handlers and their shared helpers.

use gotham::{
    helpers::http::response::{create_response, create_temporary_redirect},
    state::State,
};
use gotham_derive::{StateData, StaticResponseExtender};
use http::StatusCode;
use hyper::{Body, Response};
use serde::de::DeserializeOwned;

use crate::error::Error;

pub mod comments;
pub mod posts;
pub mod users;

pub type DocumentResult = Result<Response<Body>, failure::Error>;

pub trait TemplateExt {
    fn to_response(&self, state: &State) -> Response<Body>;
}

impl<T: askama::Template> TemplateExt for T {
    fn to_response(&self, state: &State) -> Response<Body> {
        match self.render() {
            Ok(string) => create_response(state, StatusCode::OK, mime::TEXT_HTML, string),
            Err(e) => create_response(
                state,
                StatusCode::INTERNAL_SERVER_ERROR,
                mime::TEXT_PLAIN,
                format!("Template error: {}", e),
            ),
        }
    }
}

/// `?page=N` on the feed pages.
#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct PageQuery {
    page: Option<i64>,
}

impl PageQuery {
    pub fn number(&self) -> i64 {
        self.page.unwrap_or(1)
    }
}

/// A 303 redirect: the browser must re-request the target with GET, which is
/// what every form post answers with.
pub fn see_other(state: &State, location: String) -> Response<Body> {
    let mut response = create_temporary_redirect(state, location);
    *response.status_mut() = StatusCode::SEE_OTHER;
    response
}

/// Parses an urlencoded form body. A body that doesn't even deserialize is
/// reported as invalid input, not a server error.
pub fn form<T: DeserializeOwned>(body: &[u8]) -> Result<T, failure::Error> {
    serde_urlencoded::from_bytes(body).map_err(|e| Error::Validation(e.to_string()).into())
}
