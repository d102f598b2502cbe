//! Templates and handlers for the feed pages and everything concerning a
//! single post: detail view, writing, editing, deleting.

use askama::Template;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use gotham::state::{FromState, State};
use gotham_derive::{StateData, StaticResponseExtender};

use crate::{
    category::{self, Category},
    db::{Connection, DbConnection},
    document::{self, see_other, DocumentResult, PageQuery, TemplateExt},
    error::Error,
    feed::{self, Page, PostSummary},
    location::{self, Location},
    policy,
    post::{self, NewPost, Post, PostChanges},
    user::{Session, User},
};

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct PostPath {
    pub id: i32,
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct CategoryPath {
    pub slug: String,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    session: Option<&'a Session>,
    feed: Page<PostSummary>,
}

#[derive(Template)]
#[template(path = "category.html")]
struct CategoryTemplate<'a> {
    session: Option<&'a Session>,
    category: Category,
    feed: Page<PostSummary>,
}

/// A comment prepared for display: its mutation links are only drawn for
/// the comment's own author.
pub struct CommentView {
    pub comment: crate::comment::Comment,
    pub can_edit: bool,
}

#[derive(Template)]
#[template(path = "post.html", escape = "none")]
struct PostTemplate<'a> {
    session: Option<&'a Session>,
    post: Post,
    author: User,
    category: Option<Category>,
    location: Option<Location>,
    comments: Vec<CommentView>,
    can_edit: bool,
    can_comment: bool,
}

#[derive(Template)]
#[template(path = "post-form.html")]
struct PostFormTemplate<'a> {
    session: Option<&'a Session>,
    /// Some when editing an existing post
    id: Option<i32>,
    title: String,
    content: String,
    pub_date: String,
    image: String,
    published: bool,
    category: String,
    location: String,
    categories: Vec<Category>,
    locations: Vec<Location>,
    errors: Vec<String>,
}

const PUB_DATE_INPUT: &str = "%Y-%m-%dT%H:%M";

impl<'a> PostFormTemplate<'a> {
    /// An empty form for writing a new post, prefilled with the current time.
    fn blank(
        connection: &Connection,
        session: Option<&'a Session>,
    ) -> Result<Self, failure::Error> {
        Ok(PostFormTemplate {
            session,
            id: None,
            title: String::new(),
            content: String::new(),
            pub_date: Utc::now().naive_utc().format(PUB_DATE_INPUT).to_string(),
            image: String::new(),
            published: true,
            category: String::new(),
            location: String::new(),
            categories: category::published(connection)?,
            locations: location::published(connection)?,
            errors: Vec::new(),
        })
    }

    /// The form prefilled from a stored post.
    fn for_post(
        connection: &Connection,
        session: Option<&'a Session>,
        post: &Post,
    ) -> Result<Self, failure::Error> {
        Ok(PostFormTemplate {
            session,
            id: Some(post.id),
            title: post.title.clone(),
            content: post.content.clone(),
            pub_date: post.pub_date.format(PUB_DATE_INPUT).to_string(),
            image: post.image.clone().unwrap_or_default(),
            published: post.published,
            category: post.category.map(|id| id.to_string()).unwrap_or_default(),
            location: post.location.map(|id| id.to_string()).unwrap_or_default(),
            categories: category::published(connection)?,
            locations: location::published(connection)?,
            errors: Vec::new(),
        })
    }

    /// Redisplays what the user submitted, together with what was wrong
    /// with it.
    fn redisplay(
        connection: &Connection,
        session: Option<&'a Session>,
        id: Option<i32>,
        form: &PostForm,
        errors: Vec<String>,
    ) -> Result<Self, failure::Error> {
        Ok(PostFormTemplate {
            session,
            id,
            title: form.title.clone(),
            content: form.content.clone(),
            pub_date: form.pub_date.clone(),
            image: form.image.clone(),
            published: form.published.is_some(),
            category: form.category.clone(),
            location: form.location.clone(),
            categories: category::published(connection)?,
            locations: location::published(connection)?,
            errors,
        })
    }
}

/// An urlencoded post form, exactly as the browser sent it. Selects submit
/// the referenced id as a decimal string or the empty string for "none",
/// and the published checkbox is simply absent when unchecked.
#[derive(Deserialize)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    pub pub_date: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
}

/// The form's values checked and converted for the database.
#[derive(Debug)]
pub struct PostFields {
    pub title: String,
    pub content: String,
    pub pub_date: NaiveDateTime,
    pub image: Option<String>,
    pub published: bool,
    pub category: Option<i32>,
    pub location: Option<i32>,
}

fn parse_pub_date(input: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input, PUB_DATE_INPUT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_hms(0, 0, 0))
        })
}

fn parse_reference(input: &str) -> Result<Option<i32>, ()> {
    let input = input.trim();
    if input.is_empty() {
        Ok(None)
    } else {
        input.parse().map(Some).map_err(|_| ())
    }
}

impl PostForm {
    /// Checks every field and collects all problems rather than stopping at
    /// the first. A future publication date is deliberately not a problem:
    /// the post stays invisible to others until the date arrives.
    pub fn validate(&self) -> Result<PostFields, Vec<String>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(String::from("the title must not be empty"));
        }
        if self.content.trim().is_empty() {
            errors.push(String::from("the body must not be empty"));
        }
        let pub_date = parse_pub_date(&self.pub_date);
        if pub_date.is_none() {
            errors.push(String::from(
                "the publication date must look like 2024-05-18 or 2024-05-18T21:00",
            ));
        }
        let category = parse_reference(&self.category);
        if category.is_err() {
            errors.push(String::from("the selected category is not valid"));
        }
        let location = parse_reference(&self.location);
        if location.is_err() {
            errors.push(String::from("the selected location is not valid"));
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(PostFields {
            title: self.title.trim().to_owned(),
            content: self.content.clone(),
            pub_date: pub_date.unwrap(),
            image: match self.image.trim() {
                "" => None,
                image => Some(image.to_owned()),
            },
            published: self.published.is_some(),
            category: category.unwrap(),
            location: location.unwrap(),
        })
    }
}

/// The public feed.
pub fn index(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);
    let page = PageQuery::borrow_from(state).number();

    let feed = feed::public(connection, page, Utc::now().naive_utc())?;
    Ok(IndexTemplate { session, feed }.to_response(state))
}

/// The feed of one category.
pub fn category(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);
    let slug = &CategoryPath::borrow_from(state).slug;
    let page = PageQuery::borrow_from(state).number();

    let (category, feed) = feed::by_category(connection, slug, page, Utc::now().naive_utc())?;
    Ok(CategoryTemplate {
        session,
        category,
        feed,
    }
    .to_response(state))
}

/// Display a post with its comments
pub fn view(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);
    let id = PostPath::borrow_from(state).id;

    let detail = feed::detail(connection, id, session, Utc::now().naive_utc())?;
    let can_edit = policy::can_mutate(&detail.post.author, session);
    let comments = detail
        .comments
        .into_iter()
        .map(|comment| CommentView {
            can_edit: policy::can_mutate(&comment.author, session),
            comment,
        })
        .collect();

    let template = PostTemplate {
        session,
        post: detail.post,
        author: detail.author,
        category: detail.category,
        location: detail.location,
        comments,
        can_edit,
        can_comment: session.is_some(),
    };
    Ok(template.to_response(state))
}

/// Form for writing a new post
pub fn create(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = match Session::try_borrow_from(state) {
        Some(session) => session,
        None => return Ok(see_other(state, String::from("/login"))),
    };

    Ok(PostFormTemplate::blank(connection, Some(session))?.to_response(state))
}

/// Creates the post with the viewer as author.
pub fn create_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = match Session::try_borrow_from(state) {
        Some(session) => session,
        None => return Ok(see_other(state, String::from("/login"))),
    };

    let form: PostForm = document::form(&body)?;
    match form.validate() {
        Ok(fields) => {
            let new = NewPost {
                title: fields.title,
                author: session.user.clone(),
                content: fields.content,
                pub_date: fields.pub_date,
                image: fields.image,
                published: fields.published,
                category: fields.category,
                location: fields.location,
            };
            post::submit(connection, &new)?;
            Ok(see_other(state, format!("/profile/{}", session.user)))
        }
        Err(errors) => {
            let template =
                PostFormTemplate::redisplay(connection, Some(session), None, &form, errors)?;
            Ok(template.to_response(state))
        }
    }
}

/// Form for editing an existing post. Only its author gets the form;
/// everyone else is sent to the post's page without comment.
pub fn edit(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);
    let id = PostPath::borrow_from(state).id;

    let post = post::get(connection, id)?.ok_or(Error::NotFound)?;
    if !policy::can_mutate(&post.author, session) {
        return Ok(see_other(state, format!("/posts/{}", id)));
    }

    Ok(PostFormTemplate::for_post(connection, session, &post)?.to_response(state))
}

/// Applies an edit, or redirects to the post if the viewer isn't the author.
pub fn edit_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);
    let id = PostPath::borrow_from(state).id;

    let post = post::get(connection, id)?.ok_or(Error::NotFound)?;
    if !policy::can_mutate(&post.author, session) {
        return Ok(see_other(state, format!("/posts/{}", id)));
    }

    let form: PostForm = document::form(&body)?;
    match form.validate() {
        Ok(fields) => {
            let changes = PostChanges {
                title: fields.title,
                content: fields.content,
                pub_date: fields.pub_date,
                image: fields.image,
                published: fields.published,
                category: fields.category,
                location: fields.location,
            };
            post::edit(connection, id, &changes)?;
            Ok(see_other(state, format!("/posts/{}", id)))
        }
        Err(errors) => {
            let template =
                PostFormTemplate::redisplay(connection, session, Some(id), &form, errors)?;
            Ok(template.to_response(state))
        }
    }
}

/// Deletes a post and, through the schema cascade, its comments.
pub fn delete(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);
    let id = PostPath::borrow_from(state).id;

    let post = post::get(connection, id)?.ok_or(Error::NotFound)?;
    if !policy::can_mutate(&post.author, session) {
        return Ok(see_other(state, format!("/posts/{}", id)));
    }

    post::delete(connection, id)?;
    Ok(see_other(state, String::from("/")))
}

#[cfg(test)]
mod tests {
    use super::{parse_pub_date, PostForm};

    fn form() -> PostForm {
        PostForm {
            title: String::from("On gardens"),
            content: String::from("There are many."),
            pub_date: String::from("2024-05-18T21:00"),
            image: String::new(),
            published: Some(String::from("on")),
            category: String::from("3"),
            location: String::new(),
        }
    }

    #[test]
    fn valid_form_converts() {
        let fields = form().validate().unwrap();
        assert_eq!(fields.title, "On gardens");
        assert!(fields.published);
        assert_eq!(fields.category, Some(3));
        assert_eq!(fields.location, None);
        assert_eq!(fields.image, None);
    }

    #[test]
    fn date_only_input_means_midnight() {
        let date = parse_pub_date("2024-05-18").unwrap();
        assert_eq!(date.format("%H:%M:%S").to_string(), "00:00:00");
    }

    #[test]
    fn garbage_dates_are_rejected() {
        assert!(parse_pub_date("someday").is_none());
        assert!(parse_pub_date("2024-13-45").is_none());
    }

    #[test]
    fn empty_fields_are_each_reported() {
        let mut form = form();
        form.title = String::from("  ");
        form.content = String::new();
        form.pub_date = String::from("tomorrow");
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn unchecked_checkbox_means_draft() {
        let mut form = form();
        form.published = None;
        assert!(!form.validate().unwrap().published);
    }

    #[test]
    fn bad_reference_is_rejected() {
        let mut form = form();
        form.category = String::from("travel");
        assert!(form.validate().is_err());
    }
}
