use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::{
    config,
    db::{Connection, DieselResult},
    schema::posts,
};

const PREVIEW_LEN: usize = 500;

#[derive(Clone, Debug, Queryable, Identifiable)]
pub struct Post {
    /// The post's numeric id
    pub id: i32,
    /// The title of the post
    pub title: String,
    /// Username of the author
    pub author: String,
    /// The post's body as markdown
    pub content: String,
    /// The time of publication. May lie in the future, in which case only
    /// the author sees the post until the date arrives.
    pub pub_date: NaiveDateTime,
    /// Reference to an uploaded image in external media storage
    pub image: Option<String>,
    /// Whether the author has published the post
    pub published: bool,
    /// The category the post is filed under, if any
    pub category: Option<i32>,
    /// The place the post is about, if any
    pub location: Option<i32>,
}

impl Post {
    /// Used when displaying a preview of the post's contents in a feed.
    pub fn preview(&self) -> &str {
        let len = self.content.len();
        let end = if len < PREVIEW_LEN {
            len
        } else {
            // Get the last whitespace character before PREVIEW_LEN.
            self.content
                .match_indices(char::is_whitespace)
                .map(|(i, _)| i)
                .take_while(|i| *i < PREVIEW_LEN)
                .last()
                .unwrap_or(len)
        };
        &self.content[..end]
    }

    /// The body rendered from markdown to html.
    pub fn formatted(&self) -> String {
        comrak::markdown_to_html(&self.content, &config::COMRAK_OPTS)
    }
}

#[derive(Insertable)]
#[table_name = "posts"]
pub struct NewPost {
    pub title: String,
    pub author: String,
    pub content: String,
    pub pub_date: NaiveDateTime,
    pub image: Option<String>,
    pub published: bool,
    pub category: Option<i32>,
    pub location: Option<i32>,
}

/// Edits to a post. The author is fixed at creation and deliberately absent
/// here. `None` values mean the field is cleared, not skipped; the edit form
/// always submits every field.
#[derive(AsChangeset)]
#[table_name = "posts"]
#[changeset_options(treat_none_as_null = "true")]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub pub_date: NaiveDateTime,
    pub image: Option<String>,
    pub published: bool,
    pub category: Option<i32>,
    pub location: Option<i32>,
}

pub fn get(connection: &Connection, id: i32) -> DieselResult<Option<Post>> {
    use crate::schema::posts::dsl;

    dsl::posts.find(id).first(connection).optional()
}

pub fn submit(connection: &Connection, post: &NewPost) -> DieselResult<usize> {
    diesel::insert_into(posts::table)
        .values(post)
        .execute(connection)
}

pub fn edit(connection: &Connection, id: i32, changes: &PostChanges) -> DieselResult<usize> {
    use crate::schema::posts::dsl;

    diesel::update(dsl::posts.find(id))
        .set(changes)
        .execute(connection)
}

/// Deletes the post. Its comments go with it through the schema's cascade.
pub fn delete(connection: &Connection, id: i32) -> DieselResult<usize> {
    use crate::schema::posts::dsl;

    diesel::delete(dsl::posts.find(id)).execute(connection)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Post, PREVIEW_LEN};

    fn post(content: &str) -> Post {
        Post {
            id: 1,
            title: String::from("Test post"),
            author: String::from("test_author"),
            content: String::from(content),
            pub_date: Utc::now().naive_utc(),
            image: None,
            published: true,
            category: None,
            location: None,
        }
    }

    #[test]
    fn short_posts_preview_whole() {
        assert_eq!(post("A modest thought.").preview(), "A modest thought.");
    }

    #[test]
    fn long_posts_break_at_whitespace() {
        let word = "word ";
        let long = word.repeat(200);
        let preview = post(&long).preview();
        assert!(preview.len() <= PREVIEW_LEN);
        assert!(preview.ends_with("word"));
    }
}
