//! Request-level error taxonomy.
//!
//! Handlers return `failure::Error`; the variants below are the conditions
//! that get a dedicated response instead of a 500. `PermissionDenied` is
//! special: handlers answer a failed ownership check with a redirect to the
//! entity's page, so the variant should never reach the response adapter.

use failure::Fail;

#[derive(Debug, Fail)]
pub enum Error {
    /// The entity is missing, or not visible to the viewer.
    #[fail(display = "not found")]
    NotFound,
    /// The viewer is not the author of the entity.
    #[fail(display = "permission denied")]
    PermissionDenied,
    /// Malformed form input.
    #[fail(display = "invalid input: {}", _0)]
    Validation(String),
}
