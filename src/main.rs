//! A community blogging engine.
//!
//! It has the following address scheme:
//! * `/` - The public feed, newest first, paginated with `?page=N`
//! * `/posts/<id>` - A post with its comments
//! * `/posts/create` - Write a new post
//! * `/posts/<id>/edit`, `/posts/<id>/delete` - Author-only mutation
//! * `/add_comment/<id>` - Comment on a post
//! * `/posts/<id>/edit_comment/<cid>` - Edit your comment
//! * `/posts/<id>/delete_comment/<cid>` - Delete your comment
//! * `/category/<slug>` - The feed of one category
//! * `/profile/<username>` - A user's posts, drafts included for themselves
//! * `/profile/edit` - Account settings
//! * `/login`, `/logout`, `/signup` - Sessions and registration
//! * `/feed.rss` - RSS feed of the public posts

#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

pub mod category;
pub mod comment;
pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod feed;
pub mod handler;
pub mod location;
pub mod policy;
pub mod post;
pub mod schema;
pub mod user;

use gotham::{
    middleware::cookie::CookieParser,
    middleware::state::StateMiddleware,
    pipeline::new_pipeline,
    pipeline::single::single_pipeline,
    router::builder::{build_router, DefineSingleRoute, DrawRoutes},
    router::response::extender::ResponseExtender,
    router::Router,
    state::State,
};
use http::status::StatusCode;
use hyper::{Body, Response};

use std::{borrow::Cow, path::Path};

use crate::{
    config::Settings,
    db::DbConnection,
    document::PageQuery,
    user::SessionMiddleware,
};

/// Response extender for 404 errors on paths no route matched
pub struct NotFound;

impl ResponseExtender<Body> for NotFound {
    fn extend(&self, _state: &mut State, res: &mut Response<Body>) {
        let body = res.body_mut();
        *body = "404 Not found".into();
    }
}

/// Builds the request router
fn router(settings: &Settings) -> Router {
    // The directory static assets are served from. Is:
    // STATIC_DIR compile-time environment variable if defined, otherwise
    // local directory 'static'
    let assets_dir: Cow<str> = if let Some(compile_env) = option_env!("STATIC_DIR") {
        compile_env.into()
    } else {
        "static".into()
    };

    // Set up shared state
    let connection = DbConnection::from_url(&settings.database_url);
    // Build pipeline
    let (chain, pipelines) = single_pipeline(
        new_pipeline()
            .add(StateMiddleware::new(connection))
            .add(StateMiddleware::new(settings.clone()))
            .add(CookieParser)
            .add(SessionMiddleware)
            .build(),
    );

    build_router(chain, pipelines, |route| {
        use crate::document::{comments, posts, users};

        route
            .get("/")
            .with_query_string_extractor::<PageQuery>()
            .to(handler!(posts::index));

        route.get("/posts/create").to(handler!(posts::create));
        route
            .post("/posts/create")
            .to(body_handler!(posts::create_post));

        route
            .get("/posts/:id")
            .with_path_extractor::<posts::PostPath>()
            .to(handler!(posts::view));
        route
            .get("/posts/:id/edit")
            .with_path_extractor::<posts::PostPath>()
            .to(handler!(posts::edit));
        route
            .post("/posts/:id/edit")
            .with_path_extractor::<posts::PostPath>()
            .to(body_handler!(posts::edit_post));
        route
            .post("/posts/:id/delete")
            .with_path_extractor::<posts::PostPath>()
            .to(handler!(posts::delete));

        route
            .post("/add_comment/:id")
            .with_path_extractor::<posts::PostPath>()
            .to(body_handler!(comments::add));
        route
            .get("/posts/:id/edit_comment/:cid")
            .with_path_extractor::<comments::CommentPath>()
            .to(handler!(comments::edit));
        route
            .post("/posts/:id/edit_comment/:cid")
            .with_path_extractor::<comments::CommentPath>()
            .to(body_handler!(comments::edit_post));
        route
            .post("/posts/:id/delete_comment/:cid")
            .with_path_extractor::<comments::CommentPath>()
            .to(handler!(comments::delete));

        route
            .get("/category/:slug")
            .with_path_extractor::<posts::CategoryPath>()
            .with_query_string_extractor::<PageQuery>()
            .to(handler!(posts::category));

        route.get("/profile/edit").to(handler!(users::edit));
        route
            .post("/profile/edit")
            .to(body_handler!(users::edit_post));
        route
            .get("/profile/:username")
            .with_path_extractor::<users::UserPath>()
            .with_query_string_extractor::<PageQuery>()
            .to(handler!(users::profile));

        route.get("/login").to(handler!(users::login));
        route.post("/login").to(body_handler!(users::login_post));
        route.get("/logout").to(handler!(users::logout));
        route.get("/signup").to(handler!(users::signup));
        route.post("/signup").to(body_handler!(users::signup_post));

        route.get("/feed.rss").to(handler!(handler::rss::rss));

        route.get("/static/*").to_dir(&*assets_dir);

        // Error responders
        route.add_response_extender(StatusCode::NOT_FOUND, NotFound);
    })
}

fn main() -> Result<(), failure::Error> {
    env_logger::init();

    // Read settings
    let path = if Path::new("/etc/bloggery/bloggery.toml").is_file() {
        Path::new("/etc/bloggery/bloggery.toml")
    } else {
        Path::new("bloggery.toml")
    };
    let data = std::fs::read(path)?;
    let settings = Settings::from_slice(&data)?;
    let address = settings.host_address.clone();

    info!("listening on {}", address);
    gotham::start(address, router(&settings));
    Ok(())
}
