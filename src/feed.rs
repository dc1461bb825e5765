//! Atom feed generation for the post catalog.
//!
//! The feed carries the same ordered post list as the index pages, with the
//! frontmatter summary as each entry's summary. Bodies are not inlined;
//! entries link to the rendered post pages.

use crate::config::Author;
use crate::post::Post;
use atom_syndication::{Entry, Error as AtomError, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::fmt;
use std::io::Write;
use url::Url;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything the feed needs beyond the posts themselves.
pub struct FeedConfig {
    /// Feed title; the site title.
    pub title: String,

    /// The feed's globally unique identifier. The site root URL serves.
    pub id: String,

    pub author: Option<Author>,

    /// URL the feed's `alternate` link points at.
    pub home_page: Url,

    /// URL of the directory holding post pages, used to build entry links.
    pub posts_url: Url,
}

/// Builds the feed for `posts` and writes it to `w`. This function takes
/// ownership of the provided [`FeedConfig`].
pub fn write_feed<W: Write>(config: FeedConfig, posts: &[Post], w: W) -> Result<()> {
    feed(config, posts)?.write_to(w)?;
    Ok(())
}

fn feed(config: FeedConfig, posts: &[Post]) -> Result<Feed> {
    Ok(Feed {
        entries: feed_entries(&config, posts)?,
        title: config.title.into(),
        id: config.id,
        updated: now(),
        authors: author_to_people(config.author),
        categories: Vec::new(),
        contributors: Vec::new(),
        generator: None,
        icon: None,
        logo: None,
        rights: None,
        subtitle: None,
        base: None,
        lang: None,
        extensions: Default::default(),
        namespaces: Default::default(),
        links: vec![alternate_link(config.home_page.as_str())],
    })
}

fn feed_entries(config: &FeedConfig, posts: &[Post]) -> Result<Vec<Entry>> {
    let mut entries: Vec<Entry> = Vec::with_capacity(posts.len());

    for post in posts {
        let url = config.posts_url.join(&format!("{}.html", post.slug))?;
        let date = publication_instant(post);
        entries.push(Entry {
            id: url.to_string(),
            title: post.title.clone().unwrap_or_default().into(),
            updated: date,
            authors: author_to_people(config.author.clone()),
            links: vec![alternate_link(url.as_str())],
            rights: None,
            summary: post.summary.clone().map(Text::from),
            categories: Vec::new(),
            contributors: Vec::new(),
            published: Some(date),
            source: None,
            content: None,
            extensions: Default::default(),
        })
    }
    Ok(entries)
}

/// Feed timestamps need an instant, not a calendar date; posts only carry
/// the date, so entries are stamped at midnight UTC.
fn publication_instant(post: &Post) -> DateTime<FixedOffset> {
    let midnight = NaiveDateTime::new(post.date, NaiveTime::from_hms(0, 0, 0));
    FixedOffset::east(0).from_utc_datetime(&midnight)
}

fn now() -> DateTime<FixedOffset> {
    FixedOffset::east(0).from_utc_datetime(&Utc::now().naive_utc())
}

fn alternate_link(href: &str) -> Link {
    Link {
        href: href.to_owned(),
        rel: "alternate".to_owned(),
        title: None,
        hreflang: None,
        mime_type: None,
        length: None,
    }
}

fn author_to_people(author: Option<Author>) -> Vec<Person> {
    match author {
        Some(author) => vec![Person {
            name: author.name,
            email: author.email,
            uri: None,
        }],
        None => Vec::new(),
    }
}

/// Represents a problem creating the feed.
#[derive(Debug)]
pub enum Error {
    /// The feed could not be serialized or written.
    Atom(AtomError),

    /// An entry link could not be built from the posts URL.
    Url(url::ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Atom(err) => write!(f, "writing feed: {}", err),
            Error::Url(err) => write!(f, "building feed entry url: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Atom(err) => Some(err),
            Error::Url(err) => Some(err),
        }
    }
}

/// Converts an [`AtomError`] into an [`Error`]. This allows us to use the
/// `?` operator in functions which return one of these error types but
/// which call functions that return [`AtomError`]s.
impl From<AtomError> for Error {
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::Url(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn post(slug: &str, title: &str, day: u32) -> Post {
        Post {
            slug: slug.to_owned(),
            title: Some(title.to_owned()),
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            summary: Some(format!("About {}", title)),
            author: None,
            reading_time: None,
            tags: Vec::new(),
            body: String::new(),
        }
    }

    fn config() -> FeedConfig {
        FeedConfig {
            title: "Example".to_owned(),
            id: "https://example.org/".to_owned(),
            author: Some(Author {
                name: "Jamie".to_owned(),
                email: None,
            }),
            home_page: Url::parse("https://example.org/").unwrap(),
            posts_url: Url::parse("https://example.org/posts/").unwrap(),
        }
    }

    #[test]
    fn test_feed_entries_match_posts() {
        let posts = vec![post("newer", "Newer", 2), post("older", "Older", 1)];
        let feed = feed(config(), &posts).unwrap();
        assert_eq!(feed.title.as_str(), "Example");
        assert_eq!(feed.entries.len(), 2);
        assert_eq!(feed.entries[0].id, "https://example.org/posts/newer.html");
        assert_eq!(feed.entries[0].title.as_str(), "Newer");
        assert_eq!(feed.entries[0].summary.as_deref(), Some("About Newer"));
        assert_eq!(feed.entries[0].authors[0].name, "Jamie");
    }

    #[test]
    fn test_entries_stamped_at_midnight_utc() {
        let posts = vec![post("solo", "Solo", 1)];
        let feed = feed(config(), &posts).unwrap();
        assert_eq!(
            feed.entries[0].updated.to_rfc3339(),
            "2024-06-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_feed_without_author() {
        let mut config = config();
        config.author = None;
        let feed = feed(config, &[]).unwrap();
        assert!(feed.authors.is_empty());
        assert!(feed.entries.is_empty());
    }

    #[test]
    fn test_feed_serializes() {
        let posts = vec![post("solo", "Solo", 1)];
        let mut buffer = Vec::new();
        write_feed(config(), &posts, &mut buffer).unwrap();
        let xml = String::from_utf8(buffer).unwrap();
        assert!(xml.contains("<feed"));
        assert!(xml.contains("Solo"));
    }
}
