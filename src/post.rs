//! The [`Post`] record: one blog post's metadata plus its raw body.

use chrono::NaiveDate;

/// One post, as the catalog sees it.
///
/// Everything here comes from the post's file name and frontmatter except
/// `body`, which is the raw text after the closing fence. The catalog never
/// interprets `body`; it's handed to the markdown renderer only when a page
/// is written.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// The file's base name with the content extension stripped. Unique
    /// within a catalog; doubles as the post's URL segment.
    pub slug: String,

    /// Display title. Optional: a post without one still builds, it just
    /// renders with an empty title.
    pub title: Option<String>,

    /// Publication date. Required: ordering depends on it, so a post whose
    /// date is missing or unparseable never reaches the catalog.
    pub date: NaiveDate,

    /// Short description for list views and the feed.
    pub summary: Option<String>,

    pub author: Option<String>,

    /// Estimated reading time in minutes, kept as the numeric string the
    /// frontmatter carried.
    pub reading_time: Option<String>,

    /// Tags as written in the frontmatter. Duplicates within one post are
    /// preserved; deduplication happens in the catalog's vocabulary, not
    /// here.
    pub tags: Vec<String>,

    /// Raw body text, opaque at this layer.
    pub body: String,
}

impl Post {
    /// The date in `YYYY-MM-DD` form, for `<time datetime>` attributes and
    /// the terminal listing.
    pub fn date_iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// The date as readers see it, e.g. `June 1, 2024`.
    pub fn date_display(&self) -> String {
        self.date.format("%B %-d, %Y").to_string()
    }
}
