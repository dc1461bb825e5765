//! Library code for `boc`, a static site generator for a personal markdown
//! blog built around a post catalog.
//!
//! The pipeline has three stages:
//!
//! 1. **Catalog building** ([`crate::catalog`]): scan the posts directory,
//!    parse each file's frontmatter ([`crate::frontmatter`]), normalize
//!    into [`crate::post::Post`] records, order by date (newest first), and
//!    derive the tag vocabulary. Per-post problems degrade to warnings: the
//!    post is skipped and the build carries on.
//! 2. **Projection**: read-only lookups and listings over the catalog
//!    ([`crate::view`]) and the tag filter that partitions a listing by
//!    selected tags ([`crate::filter`]).
//! 3. **Writing** ([`crate::write`], orchestrated by [`crate::build`]):
//!    post pages, the paginated post index, one index per tag, standalone
//!    site pages, static assets, and the Atom feed ([`crate::feed`]).
//!
//! Post bodies stay opaque until the write stage; markdown becomes HTML
//! only there ([`crate::markdown`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod catalog;
pub mod config;
pub mod feed;
pub mod filter;
pub mod frontmatter;
pub mod logger;
pub mod markdown;
pub mod post;
pub mod util;
pub mod view;
pub mod write;
