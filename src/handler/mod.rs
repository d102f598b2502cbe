//! Request plumbing: the handler macros and the adapter that turns a
//! handler's error into the matching HTTP response.

use askama::Template;
use futures::{future, Future, Stream};
use gotham::{
    handler::{HandlerFuture, IntoHandlerError},
    helpers::http::response::create_response,
    state::{FromState, State},
};
use http::{Response, StatusCode};
use hyper::Body;

use crate::{error::Error, user::Session};

pub mod rss;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    session: Option<&'a Session>,
    status: &'a str,
    message: String,
}

/// Creates a `HandlerFuture` that runs the given function
pub fn body_handler<F>(mut state: State, op: F) -> Box<HandlerFuture>
where
    F: FnOnce(&State, Vec<u8>) -> Response<Body> + Send + 'static,
{
    let f = Body::take_from(&mut state)
        .concat2()
        .then(|result| match result {
            Ok(body) => {
                let response = op(&state, body.to_vec());
                future::ok((state, response))
            }
            Err(e) => future::err((state, e.into_handler_error())),
        });

    Box::new(f)
}

/// Renders an error page for the failure a handler returned.
///
/// NotFound answers 404, validation leftovers 400, anything unrecognized is
/// a 500. PermissionDenied is converted to a redirect inside the handlers
/// and only maps here in case one ever leaks through.
pub fn error_response(state: &State, error: &failure::Error) -> Response<Body> {
    let status = match error.downcast_ref::<Error>() {
        Some(Error::NotFound) => StatusCode::NOT_FOUND,
        Some(Error::PermissionDenied) => StatusCode::FORBIDDEN,
        Some(Error::Validation(_)) => StatusCode::BAD_REQUEST,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("request failed: {}", error);
    }

    let message = match error.downcast_ref::<Error>() {
        Some(error) => error.to_string(),
        // Don't leak database details to the client.
        None => String::from("internal server error"),
    };
    let template = ErrorTemplate {
        session: Session::try_borrow_from(state),
        status: status.canonical_reason().unwrap_or("error"),
        message,
    };
    match template.render() {
        Ok(content) => create_response(state, status, mime::TEXT_HTML, content),
        Err(_) => create_response(state, status, mime::TEXT_PLAIN, status.to_string()),
    }
}

pub fn response(state: &State, result: Result<Response<Body>, failure::Error>) -> Response<Body> {
    match result {
        Ok(response) => response,
        Err(error) => error_response(state, &error),
    }
}

#[macro_export]
macro_rules! handler {
    ($handler_fn:path) => {
        |state| {
            let r = crate::handler::response(&state, $handler_fn(&state));
            (state, r)
        }
    };
}

#[macro_export]
macro_rules! body_handler {
    ($handler_fn:path) => {
        |state| {
            crate::handler::body_handler(state, |state, post| {
                crate::handler::response(&state, $handler_fn(state, post))
            })
        }
    };
}
