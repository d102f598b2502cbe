use diesel::prelude::*;

use crate::db::{Connection, DieselResult};

/// A named grouping of posts. Categories are created by an administrator and
/// are never deleted while posts reference them; retiring one means clearing
/// its `published` flag, which hides the category feed and every post in it.
#[derive(Clone, Debug, Queryable)]
pub struct Category {
    pub id: i32,
    pub title: String,
    /// Unique url fragment identifying the category
    pub slug: String,
    pub description: String,
    pub published: bool,
}

pub fn get(connection: &Connection, id: i32) -> DieselResult<Option<Category>> {
    use crate::schema::categories::dsl;

    dsl::categories.find(id).first(connection).optional()
}

pub fn by_slug(connection: &Connection, slug: &str) -> DieselResult<Option<Category>> {
    use crate::schema::categories::dsl;

    dsl::categories
        .filter(dsl::slug.eq(slug))
        .first(connection)
        .optional()
}

/// The published categories, for the post form's category picker.
pub fn published(connection: &Connection) -> DieselResult<Vec<Category>> {
    use crate::schema::categories::dsl;

    dsl::categories
        .filter(dsl::published.eq(true))
        .order(dsl::title.asc())
        .load(connection)
}
