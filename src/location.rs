use diesel::prelude::*;

use crate::db::{Connection, DieselResult};

/// An optional named place a post is about. Same lifecycle as categories:
/// administrator-created, soft-unpublished, never deleted while referenced.
#[derive(Clone, Debug, Queryable)]
pub struct Location {
    pub id: i32,
    pub name: String,
    pub published: bool,
}

pub fn get(connection: &Connection, id: i32) -> DieselResult<Option<Location>> {
    use crate::schema::locations::dsl;

    dsl::locations.find(id).first(connection).optional()
}

/// The published locations, for the post form's location picker.
pub fn published(connection: &Connection) -> DieselResult<Vec<Location>> {
    use crate::schema::locations::dsl;

    dsl::locations
        .filter(dsl::published.eq(true))
        .order(dsl::name.asc())
        .load(connection)
}
