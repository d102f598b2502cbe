//! Handlers for submitting, editing and deleting comments.

use askama::Template;
use gotham::state::{FromState, State};
use gotham_derive::{StateData, StaticResponseExtender};

use crate::{
    comment::{self, NewComment},
    db::DbConnection,
    document::{self, posts::PostPath, see_other, DocumentResult, TemplateExt},
    error::Error,
    policy, post,
    user::Session,
};

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct CommentPath {
    /// Id of the post the comment belongs to
    pub id: i32,
    /// Id of the comment itself
    pub cid: i32,
}

#[derive(Deserialize)]
pub struct CommentForm {
    pub content: String,
}

#[derive(Template)]
#[template(path = "comment-form.html")]
struct CommentFormTemplate<'a> {
    session: Option<&'a Session>,
    /// Where the form posts to
    action: String,
    content: String,
    errors: Vec<String>,
}

/// Resolves a comment and checks it actually belongs to the post named in
/// the path; a mismatched pair is as much a 404 as a missing row.
fn resolve(
    connection: &crate::db::Connection,
    path: &CommentPath,
) -> Result<comment::Comment, failure::Error> {
    let comment = comment::get(connection, path.cid)?.ok_or(Error::NotFound)?;
    if comment.post != path.id {
        return Err(Error::NotFound.into());
    }
    Ok(comment)
}

/// Submits a comment on a post. Anyone logged in may comment; the post has
/// to exist, and a missing one is a 404.
pub fn add(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = match Session::try_borrow_from(state) {
        Some(session) => session,
        None => return Ok(see_other(state, String::from("/login"))),
    };
    let id = PostPath::borrow_from(state).id;

    let post = post::get(connection, id)?.ok_or(Error::NotFound)?;

    let form: CommentForm = document::form(&body)?;
    if form.content.trim().is_empty() {
        let template = CommentFormTemplate {
            session: Some(session),
            action: format!("/add_comment/{}", id),
            content: form.content,
            errors: vec![String::from("the comment must not be empty")],
        };
        return Ok(template.to_response(state));
    }

    comment::submit(
        connection,
        &NewComment {
            post: post.id,
            author: session.user.clone(),
            content: form.content,
        },
    )?;
    Ok(see_other(state, format!("/posts/{}", id)))
}

/// Form for editing a comment; authors only, everyone else is sent back to
/// the post.
pub fn edit(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);
    let path = CommentPath::borrow_from(state);

    let comment = resolve(connection, path)?;
    if !policy::can_mutate(&comment.author, session) {
        return Ok(see_other(state, format!("/posts/{}", path.id)));
    }

    let template = CommentFormTemplate {
        session,
        action: format!("/posts/{}/edit_comment/{}", path.id, path.cid),
        content: comment.content,
        errors: Vec::new(),
    };
    Ok(template.to_response(state))
}

/// Applies a comment edit.
pub fn edit_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);
    let path = CommentPath::borrow_from(state);

    let comment = resolve(connection, path)?;
    if !policy::can_mutate(&comment.author, session) {
        return Ok(see_other(state, format!("/posts/{}", path.id)));
    }

    let form: CommentForm = document::form(&body)?;
    if form.content.trim().is_empty() {
        let template = CommentFormTemplate {
            session,
            action: format!("/posts/{}/edit_comment/{}", path.id, path.cid),
            content: form.content,
            errors: vec![String::from("the comment must not be empty")],
        };
        return Ok(template.to_response(state));
    }

    comment::edit(connection, comment.id, &form.content)?;
    Ok(see_other(state, format!("/posts/{}", path.id)))
}

/// Deletes a comment. The second delete of the same comment finds no row
/// and 404s.
pub fn delete(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);
    let path = CommentPath::borrow_from(state);

    let comment = resolve(connection, path)?;
    if !policy::can_mutate(&comment.author, session) {
        return Ok(see_other(state, format!("/posts/{}", path.id)));
    }

    comment::delete(connection, comment.id)?;
    Ok(see_other(state, format!("/posts/{}", path.id)))
}
