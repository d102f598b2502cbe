use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::{
    config,
    db::{Connection, DieselResult},
    schema::comments,
};

#[derive(Clone, Debug, Queryable, Identifiable)]
pub struct Comment {
    /// The unique id of this comment
    pub id: i32,
    /// The id of the post this comment belongs to
    pub post: i32,
    /// Username of the user who submitted the comment
    pub author: String,
    /// The comment's body as markdown
    pub content: String,
    /// The time of the comment's submission
    pub created: NaiveDateTime,
}

impl Comment {
    /// The body rendered from markdown to html.
    pub fn formatted(&self) -> String {
        comrak::markdown_to_html(&self.content, &config::COMRAK_OPTS)
    }
}

#[derive(Insertable)]
#[table_name = "comments"]
pub struct NewComment {
    pub post: i32,
    pub author: String,
    pub content: String,
}

/// A post's comments, oldest first. Feeds and detail pages rely on this
/// ordering being non-decreasing by submission time.
pub fn for_post(connection: &Connection, post: i32) -> DieselResult<Vec<Comment>> {
    use crate::schema::comments::dsl;

    dsl::comments
        .filter(dsl::post.eq(post))
        .order(dsl::created.asc())
        .load::<Comment>(connection)
}

/// Live number of comments on a post, counted at query time.
pub fn count_for_post(connection: &Connection, post: i32) -> DieselResult<i64> {
    use crate::schema::comments::dsl;

    dsl::comments
        .filter(dsl::post.eq(post))
        .count()
        .get_result(connection)
}

pub fn get(connection: &Connection, id: i32) -> DieselResult<Option<Comment>> {
    use crate::schema::comments::dsl;

    dsl::comments.find(id).first(connection).optional()
}

pub fn submit(connection: &Connection, comment: &NewComment) -> DieselResult<usize> {
    diesel::insert_into(comments::table)
        .values(comment)
        .execute(connection)
}

pub fn edit(connection: &Connection, id: i32, content: &str) -> DieselResult<usize> {
    use crate::schema::comments::dsl;

    diesel::update(dsl::comments.find(id))
        .set(dsl::content.eq(content))
        .execute(connection)
}

pub fn delete(connection: &Connection, id: i32) -> DieselResult<usize> {
    use crate::schema::comments::dsl;

    diesel::delete(dsl::comments.find(id)).execute(connection)
}
