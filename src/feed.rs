//! Listing queries for the index, category and profile feeds, plus the
//! single-post detail lookup. Every feed is paginated with a fixed page size
//! and annotates each post with its live comment count.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::{
    category::{self, Category},
    comment::{self, Comment},
    db::{Connection, DieselResult},
    error::Error,
    location::{self, Location},
    policy,
    post::{self, Post},
    schema::{categories, posts},
    user::{self, Session, User},
};

/// Number of posts per feed page.
pub const PAGE_SIZE: i64 = 10;

/// One page of a feed plus what pager links need.
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub number: i64,
    /// Total matching rows across all pages
    pub total: i64,
}

impl<T> Page<T> {
    /// Number of pages the feed spans; an empty feed still has one page.
    pub fn pages(&self) -> i64 {
        if self.total == 0 {
            1
        } else {
            (self.total + PAGE_SIZE - 1) / PAGE_SIZE
        }
    }

    pub fn has_prev(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.pages()
    }

    pub fn prev(&self) -> i64 {
        self.number - 1
    }

    pub fn next(&self) -> i64 {
        self.number + 1
    }
}

/// Row offset for a 1-based page number; out of range numbers clamp to the
/// first page.
fn offset(page: i64) -> i64 {
    (page.max(1) - 1) * PAGE_SIZE
}

/// A feed entry: the post and its comment count at query time.
pub struct PostSummary {
    pub post: Post,
    pub comment_count: i64,
}

/// Everything the detail page shows for one post.
pub struct PostDetail {
    pub post: Post,
    pub author: User,
    pub category: Option<Category>,
    pub location: Option<Location>,
    /// The post's comments, ascending by submission time
    pub comments: Vec<Comment>,
}

fn annotate(connection: &Connection, posts: Vec<Post>) -> DieselResult<Vec<PostSummary>> {
    posts
        .into_iter()
        .map(|post| {
            let comment_count = comment::count_for_post(connection, post.id)?;
            Ok(PostSummary { post, comment_count })
        })
        .collect()
}

/// The public index feed: posts that are published, due, and in a published
/// or absent category, newest publication date first.
///
/// This is the anonymous visibility predicate applied in SQL. The author
/// exception deliberately does not apply to feeds; authors preview drafts
/// through the detail page and their own profile feed instead.
pub fn public(
    connection: &Connection,
    page: i64,
    now: NaiveDateTime,
) -> Result<Page<PostSummary>, failure::Error> {
    let page = page.max(1);
    let total: i64 = posts::table
        .left_join(categories::table)
        .filter(posts::published.eq(true))
        .filter(posts::pub_date.le(now))
        .filter(posts::category.is_null().or(categories::published.eq(true)))
        .count()
        .get_result(connection)?;
    let items = posts::table
        .left_join(categories::table)
        .filter(posts::published.eq(true))
        .filter(posts::pub_date.le(now))
        .filter(posts::category.is_null().or(categories::published.eq(true)))
        .order(posts::pub_date.desc())
        .limit(PAGE_SIZE)
        .offset(offset(page))
        .select(posts::all_columns)
        .load::<Post>(connection)?;

    Ok(Page {
        items: annotate(connection, items)?,
        number: page,
        total,
    })
}

/// The feed of one category, resolved by slug. An unknown or unpublished
/// category is a not-found condition, as is the whole feed then.
pub fn by_category(
    connection: &Connection,
    slug: &str,
    page: i64,
    now: NaiveDateTime,
) -> Result<(Category, Page<PostSummary>), failure::Error> {
    let category = category::by_slug(connection, slug)?.ok_or(Error::NotFound)?;
    if !category.published {
        return Err(Error::NotFound.into());
    }

    let page = page.max(1);
    let total: i64 = posts::table
        .filter(posts::category.eq(category.id))
        .filter(posts::published.eq(true))
        .filter(posts::pub_date.le(now))
        .count()
        .get_result(connection)?;
    let items = posts::table
        .filter(posts::category.eq(category.id))
        .filter(posts::published.eq(true))
        .filter(posts::pub_date.le(now))
        .order(posts::pub_date.desc())
        .limit(PAGE_SIZE)
        .offset(offset(page))
        .load::<Post>(connection)?;

    let page = Page {
        items: annotate(connection, items)?,
        number: page,
        total,
    };
    Ok((category, page))
}

/// The profile feed: every post by the user, drafts and future posts
/// included, newest first. The profile page is the author's own view of
/// their work, and what a visitor sees of somebody else's drafts is decided
/// by the detail page's visibility check when they click through.
pub fn by_author(
    connection: &Connection,
    username: &str,
    page: i64,
) -> Result<(User, Page<PostSummary>), failure::Error> {
    let author = user::get(connection, username)?.ok_or(Error::NotFound)?;

    let page = page.max(1);
    let total: i64 = posts::table
        .filter(posts::author.eq(username))
        .count()
        .get_result(connection)?;
    let items = posts::table
        .filter(posts::author.eq(username))
        .order(posts::pub_date.desc())
        .limit(PAGE_SIZE)
        .offset(offset(page))
        .load::<Post>(connection)?;

    let page = Page {
        items: annotate(connection, items)?,
        number: page,
        total,
    };
    Ok((author, page))
}

/// One post through the full visibility policy, with its comments and the
/// rows the detail page displays. Missing id and failed visibility are the
/// same not-found condition; the response must not reveal which it was.
pub fn detail(
    connection: &Connection,
    id: i32,
    viewer: Option<&Session>,
    now: NaiveDateTime,
) -> Result<PostDetail, failure::Error> {
    let post = post::get(connection, id)?.ok_or(Error::NotFound)?;
    let category = match post.category {
        Some(id) => Some(category::get(connection, id)?.ok_or(Error::NotFound)?),
        None => None,
    };

    if !policy::is_visible(&post, category.as_ref(), viewer, now) {
        return Err(Error::NotFound.into());
    }

    let location = match post.location {
        Some(id) => location::get(connection, id)?,
        None => None,
    };
    let author = user::get(connection, &post.author)?.ok_or(Error::NotFound)?;
    let comments = comment::for_post(connection, post.id)?;

    Ok(PostDetail {
        post,
        author,
        category,
        location,
        comments,
    })
}

#[cfg(test)]
mod tests {
    use super::{offset, Page, PAGE_SIZE};

    fn page(number: i64, total: i64) -> Page<()> {
        Page {
            items: Vec::new(),
            number,
            total,
        }
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page(1, 0).pages(), 1);
        assert_eq!(page(1, 1).pages(), 1);
        assert_eq!(page(1, PAGE_SIZE).pages(), 1);
        assert_eq!(page(1, PAGE_SIZE + 1).pages(), 2);
        assert_eq!(page(1, 3 * PAGE_SIZE).pages(), 3);
    }

    #[test]
    fn pager_links() {
        let first = page(1, 3 * PAGE_SIZE);
        assert!(!first.has_prev());
        assert!(first.has_next());
        assert_eq!(first.next(), 2);

        let last = page(3, 3 * PAGE_SIZE);
        assert!(last.has_prev());
        assert!(!last.has_next());
        assert_eq!(last.prev(), 2);
    }

    #[test]
    fn offsets_clamp_to_first_page() {
        assert_eq!(offset(0), 0);
        assert_eq!(offset(-3), 0);
        assert_eq!(offset(1), 0);
        assert_eq!(offset(2), PAGE_SIZE);
        assert_eq!(offset(5), 4 * PAGE_SIZE);
    }
}
