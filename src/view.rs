//! Read-only projections over a built [`Catalog`]: the single-post lookup,
//! the full ordered listing, and the static route set.
//!
//! These are the only ways page-level code gets data out of the catalog.
//! Routing is closed: the route set is derived from the catalog, and a
//! lookup outside it is a typed not-found, never a reason to go back to
//! disk.

use crate::catalog::Catalog;
use crate::post::Post;
use std::collections::BTreeSet;
use std::fmt;

/// Looks up one post by its slug.
pub fn post_by_slug<'a>(catalog: &'a Catalog, slug: &str) -> Result<&'a Post, Error> {
    catalog
        .posts
        .iter()
        .find(|post| post.slug == slug)
        .ok_or_else(|| Error::NotFound(slug.to_owned()))
}

/// The full post list, newest first. The catalog is already ordered; this
/// ordering is what index pages and the terminal listing show.
pub fn list_all(catalog: &Catalog) -> &[Post] {
    &catalog.posts
}

/// Every publishable slug. The set is exhaustive: a slug resolves through
/// [`post_by_slug`] exactly when it is in this set, so consumers can treat
/// anything outside it as not-found without consulting the filesystem.
pub fn static_route_slugs(catalog: &Catalog) -> BTreeSet<&str> {
    catalog.posts.iter().map(|post| post.slug.as_str()).collect()
}

/// Represents a failed catalog lookup.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// No post in the catalog has the requested slug.
    NotFound(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound(slug) => write!(f, "no post with slug `{}`", slug),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn post(slug: &str, day: u32) -> Post {
        Post {
            slug: slug.to_owned(),
            title: Some(slug.to_owned()),
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            summary: None,
            author: None,
            reading_time: None,
            tags: Vec::new(),
            body: String::new(),
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            posts: vec![post("newest", 3), post("middle", 2), post("oldest", 1)],
            tag_vocabulary: Vec::new(),
        }
    }

    #[test]
    fn test_post_by_slug_found() {
        let catalog = catalog();
        let found = post_by_slug(&catalog, "middle").unwrap();
        assert_eq!(found.slug, "middle");
    }

    #[test]
    fn test_post_by_slug_not_found() {
        let catalog = catalog();
        assert_eq!(
            post_by_slug(&catalog, "missing-slug"),
            Err(Error::NotFound("missing-slug".to_owned()))
        );
    }

    #[test]
    fn test_list_all_preserves_catalog_order() {
        let catalog = catalog();
        let slugs: Vec<_> = list_all(&catalog).iter().map(|post| post.slug.as_str()).collect();
        assert_eq!(slugs, ["newest", "middle", "oldest"]);
    }

    #[test]
    fn test_routes_are_closed_over_the_catalog() {
        let catalog = catalog();
        let routes = static_route_slugs(&catalog);
        assert_eq!(routes.len(), 3);
        // Everything in the route set resolves...
        for slug in &routes {
            assert!(post_by_slug(&catalog, slug).is_ok());
        }
        // ...and nothing outside it does.
        assert!(!routes.contains("missing-slug"));
        assert!(post_by_slug(&catalog, "missing-slug").is_err());
    }
}
