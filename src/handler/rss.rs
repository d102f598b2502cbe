//! Handler for serving an rss feed of the public index.
use chrono::{DateTime, NaiveDateTime, Utc};
use gotham::{
    helpers::http::response::create_response,
    state::{FromState, State},
};
use http::{Response, StatusCode};
use hyper::Body;
use rss::{ChannelBuilder, Item, ItemBuilder};

use crate::{config::Settings, db::DbConnection, feed, feed::PostSummary};

fn item(summary: &PostSummary, site_url: &str) -> Item {
    let link = format!("{}/posts/{}", site_url, summary.post.id);
    let guid = rss::GuidBuilder::default()
        .value(link.clone())
        .permalink(true)
        .build()
        .unwrap();

    ItemBuilder::default()
        .title(summary.post.title.clone())
        .link(link)
        .guid(guid)
        .pub_date(date_format(summary.post.pub_date))
        .content(summary.post.formatted())
        .build()
        .unwrap()
}

/// Encodes a date in [RFC822](https://www.w3.org/Protocols/rfc822/#z28) format.
fn date_format(date: NaiveDateTime) -> String {
    DateTime::<Utc>::from_utc(date, Utc)
        .format("%a, %d %b %Y %H:%M:%S %z")
        .to_string()
}

/// Serves the latest publicly visible posts as an RSS feed.
pub fn rss(state: &State) -> Result<Response<Body>, failure::Error> {
    let connection = &DbConnection::from_state(state)?;
    let settings = Settings::borrow_from(state);

    let page = feed::public(connection, 1, Utc::now().naive_utc())?;
    let last_change = page.items.get(0).map(|entry| date_format(entry.post.pub_date));
    let items: Vec<Item> = page
        .items
        .iter()
        .map(|entry| item(entry, &settings.site_url))
        .collect();

    let mut buf = Vec::new();
    let channel = ChannelBuilder::default()
        .title(env!("CARGO_PKG_NAME"))
        .link(settings.site_url.clone())
        .description(env!("CARGO_PKG_DESCRIPTION"))
        .last_build_date(last_change.clone())
        .pub_date(last_change)
        .items(items)
        .build()
        .unwrap();
    channel.pretty_write_to(&mut buf, b' ', 4)?;

    let media_type: mime::Mime = "application/rss+xml".parse().unwrap();
    Ok(create_response(state, StatusCode::OK, media_type, buf))
}
