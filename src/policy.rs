//! Access decisions, as pure functions over plain data.
//!
//! Two questions cover the whole site: may the viewer *see* a post, and may
//! the viewer *change* an entity. Handlers resolve the rows first; a missing
//! row is a not-found condition and never reaches these functions.

use chrono::NaiveDateTime;

use crate::{category::Category, post::Post, user::Session};

/// Whether `viewer` may see `post` in a detail view.
///
/// A post is publicly visible once it is published, its publication date has
/// arrived, and the category it is filed under (if any) is itself published.
/// The author sees their own post regardless, so drafts and future-dated
/// posts can be previewed.
///
/// Feed queries must not use the author exception; they apply the public
/// predicate in SQL (see [`crate::feed`]) so a feed never shows an entry the
/// viewer only sees by virtue of being its author.
pub fn is_visible(
    post: &Post,
    category: Option<&Category>,
    viewer: Option<&Session>,
    now: NaiveDateTime,
) -> bool {
    if viewer.map_or(false, |session| session.user == post.author) {
        return true;
    }
    post.published && post.pub_date <= now && category.map_or(true, |c| c.published)
}

/// Whether `viewer` may edit or delete an entity whose author is `author`.
///
/// True exactly when the viewer is authenticated and is that author.
/// Anonymous viewers get `false`, never an error; a failed check on a
/// mutation is answered with a redirect to the entity's detail page rather
/// than an error page.
pub fn can_mutate(author: &str, viewer: Option<&Session>) -> bool {
    viewer.map_or(false, |session| session.user == author)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    use super::{can_mutate, is_visible};
    use crate::{category::Category, post::Post, user::Session};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd(2024, 5, 18).and_hms(21, 0, 0)
    }

    fn post(author: &str, published: bool, pub_date: NaiveDateTime) -> Post {
        Post {
            id: 1,
            title: String::from("Test post"),
            author: String::from(author),
            content: String::from("body"),
            pub_date,
            image: None,
            published,
            category: None,
            location: None,
        }
    }

    fn category(published: bool) -> Category {
        Category {
            id: 1,
            title: String::from("Travel"),
            slug: String::from("travel"),
            description: String::new(),
            published,
        }
    }

    fn session(user: &str) -> Session {
        Session::new(user)
    }

    #[test]
    fn public_post_is_visible_to_anonymous() {
        let post = post("amanda", true, now() - Duration::hours(1));
        assert!(is_visible(&post, None, None, now()));
        assert!(is_visible(&post, Some(&category(true)), None, now()));
    }

    #[test]
    fn unpublished_post_is_hidden_from_everyone_but_author() {
        let post = post("amanda", false, now() - Duration::hours(1));
        assert!(!is_visible(&post, None, None, now()));
        assert!(!is_visible(&post, None, Some(&session("bertha")), now()));
        assert!(is_visible(&post, None, Some(&session("amanda")), now()));
    }

    #[test]
    fn future_post_is_hidden_until_due() {
        let post = post("amanda", true, now() + Duration::days(1));
        assert!(!is_visible(&post, None, None, now()));
        assert!(is_visible(&post, None, Some(&session("amanda")), now()));
        // Once the date passes it becomes public.
        assert!(is_visible(&post, None, None, now() + Duration::days(2)));
    }

    #[test]
    fn unpublished_category_hides_the_post() {
        let post = post("amanda", true, now() - Duration::hours(1));
        assert!(!is_visible(&post, Some(&category(false)), None, now()));
        assert!(!is_visible(
            &post,
            Some(&category(false)),
            Some(&session("bertha")),
            now(),
        ));
        // The author exception still applies.
        assert!(is_visible(
            &post,
            Some(&category(false)),
            Some(&session("amanda")),
            now(),
        ));
    }

    #[test]
    fn absent_category_applies_no_constraint() {
        let post = post("amanda", true, now() - Duration::hours(1));
        assert!(is_visible(&post, None, None, now()));
    }

    #[test]
    fn only_the_author_may_mutate() {
        assert!(can_mutate("amanda", Some(&session("amanda"))));
        assert!(!can_mutate("amanda", Some(&session("bertha"))));
        assert!(!can_mutate("amanda", None));
    }
}
