//! Builds the post catalog: scans the posts directory, parses each content
//! file, and materializes an ordered [`Catalog`] plus the warnings for the
//! posts that had to be skipped.
//!
//! The builder's policy is skip-and-continue: a posts directory that cannot
//! be listed at all is fatal, but a single unreadable or malformed post only
//! produces a [`Warning`] and is absent from the catalog. The catalog is
//! materialized in full before any caller proceeds; there is no partial
//! result.

use crate::frontmatter;
use crate::post::Post;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

pub type Result<T> = std::result::Result<T, Error>;

/// File extensions recognized as post sources. Anything else in the posts
/// directory is ignored without comment.
const CONTENT_EXTENSIONS: [&str; 2] = [".md", ".mdx"];

/// An ordered collection of posts plus the tag vocabulary derived from them.
///
/// `posts` is sorted by date, newest first; posts with equal dates keep
/// their discovery order (the directory listing sorted by file name, so
/// builds come out the same on every platform). `tag_vocabulary` is the
/// deduplicated union of every post's tags in first-seen order over that
/// sorted list. Both are produced by the same build pass and never drift
/// apart.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub posts: Vec<Post>,
    pub tag_vocabulary: Vec<String>,
}

/// The outcome of one full build pass: the catalog plus the warnings for
/// the posts that were skipped along the way.
#[derive(Debug)]
pub struct Scan {
    pub catalog: Catalog,
    pub warnings: Vec<Warning>,
}

/// Scans a posts directory into a [`Scan`].
#[derive(Debug, Clone)]
pub struct Builder {
    directory: PathBuf,
    threads: usize,
}

impl Builder {
    /// Creates a builder over `directory` that parses files serially.
    pub fn new<P: Into<PathBuf>>(directory: P) -> Builder {
        Builder {
            directory: directory.into(),
            threads: 1,
        }
    }

    /// Sets the number of parser threads. Anything below two keeps the
    /// serial path.
    pub fn threads(mut self, threads: usize) -> Builder {
        self.threads = threads;
        self
    }

    /// Builds the catalog.
    ///
    /// Fails only if the posts directory itself cannot be listed; every
    /// per-file problem becomes a [`Warning`] in the returned [`Scan`] and
    /// the offending file is skipped.
    pub fn build(&self) -> Result<Scan> {
        let entries = self.discover()?;
        let outcomes: Vec<_> = if self.threads < 2 {
            entries
                .iter()
                .map(|entry| load_post(&entry.slug, &entry.path))
                .collect()
        } else {
            parse_parallel(&entries, self.threads)
        };
        Ok(assemble(outcomes))
    }

    /// Lists the posts directory and returns the recognized content files
    /// in discovery order.
    fn discover(&self) -> Result<Vec<Entry>> {
        let listing = fs::read_dir(&self.directory).map_err(|err| Error::ReadDir {
            path: self.directory.clone(),
            err,
        })?;

        let mut entries = Vec::new();
        for result in listing {
            let entry = result.map_err(|err| Error::ReadDir {
                path: self.directory.clone(),
                err,
            })?;
            let is_file = entry.file_type().map(|kind| kind.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            let os_file_name = entry.file_name();
            let file_name = os_file_name.to_string_lossy();
            if let Some(slug) = strip_content_extension(&file_name) {
                entries.push(Entry {
                    slug: slug.to_owned(),
                    path: entry.path(),
                });
            }
        }
        entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
        Ok(entries)
    }
}

/// A content file found by discovery, not yet read.
struct Entry {
    slug: String,
    path: PathBuf,
}

/// Returns the slug for a recognized content file name (`welcome.md`
/// yields `welcome`) or `None` for everything else.
fn strip_content_extension(file_name: &str) -> Option<&str> {
    CONTENT_EXTENSIONS
        .iter()
        .find_map(|extension| file_name.strip_suffix(extension))
        .filter(|slug| !slug.is_empty())
}

/// Reads and normalizes one content file. Any failure is a [`Warning`]
/// naming the slug; the caller skips the post and carries on.
fn load_post(slug: &str, path: &Path) -> std::result::Result<Post, Warning> {
    let input = fs::read_to_string(path).map_err(|err| Warning::Read {
        slug: slug.to_owned(),
        err,
    })?;
    let (frontmatter, body) = frontmatter::parse(&input).map_err(|err| Warning::Parse {
        slug: slug.to_owned(),
        err,
    })?;
    let raw_date = match frontmatter.date {
        Some(raw) => raw,
        None => {
            return Err(Warning::MissingDate {
                slug: slug.to_owned(),
            })
        }
    };
    let date = match parse_date(&raw_date) {
        Some(date) => date,
        None => {
            return Err(Warning::BadDate {
                slug: slug.to_owned(),
                date: raw_date,
            })
        }
    };
    Ok(Post {
        slug: slug.to_owned(),
        title: frontmatter.title,
        date,
        summary: frontmatter.summary,
        author: frontmatter.author,
        reading_time: frontmatter.reading_time,
        tags: frontmatter.tags,
        body: body.to_owned(),
    })
}

/// Parses a frontmatter date. Posts write plain dates (`2024-06-01`); a
/// full RFC 3339 timestamp is accepted too and truncated to its date.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|timestamp| timestamp.naive_local().date())
}

/// Fans the discovered files out to a worker pool and restores discovery
/// order before returning. The fan-in matters: the final sort's tie-break
/// depends on discovery order, which must not vary with thread scheduling.
fn parse_parallel(entries: &[Entry], threads: usize) -> Vec<std::result::Result<Post, Warning>> {
    let (tx, rx) = crossbeam_channel::unbounded::<(usize, String, PathBuf)>();
    for (index, entry) in entries.iter().enumerate() {
        // The receiver is still open, so the send cannot fail.
        let _ = tx.send((index, entry.slug.clone(), entry.path.clone()));
    }
    drop(tx);

    let mut handles = Vec::with_capacity(threads);
    for _ in 0..threads {
        let rx = rx.clone();
        handles.push(thread::spawn(move || {
            let mut outcomes = Vec::new();
            for (index, slug, path) in rx {
                outcomes.push((index, load_post(&slug, &path)));
            }
            outcomes
        }));
    }
    drop(rx);

    let mut indexed = Vec::with_capacity(entries.len());
    for handle in handles {
        indexed.extend(handle.join().expect("post parser thread panicked"));
    }
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, outcome)| outcome).collect()
}

/// Merges per-file outcomes into a [`Scan`]: drops duplicate slugs (the
/// first file discovered wins), sorts by date descending (the sort is
/// stable, so equal dates keep discovery order), and derives the tag
/// vocabulary.
fn assemble(outcomes: Vec<std::result::Result<Post, Warning>>) -> Scan {
    let mut posts: Vec<Post> = Vec::new();
    let mut warnings = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for outcome in outcomes {
        match outcome {
            Ok(post) => {
                if seen.insert(post.slug.clone()) {
                    posts.push(post);
                } else {
                    warnings.push(Warning::DuplicateSlug { slug: post.slug });
                }
            }
            Err(warning) => warnings.push(warning),
        }
    }

    posts.sort_by(|a, b| b.date.cmp(&a.date));

    let mut tag_vocabulary: Vec<String> = Vec::new();
    let mut seen_tags: HashSet<&str> = HashSet::new();
    for post in &posts {
        for tag in &post.tags {
            if seen_tags.insert(tag.as_str()) {
                tag_vocabulary.push(tag.clone());
            }
        }
    }

    Scan {
        catalog: Catalog {
            posts,
            tag_vocabulary,
        },
        warnings,
    }
}

/// A lazily-built cache in front of a [`Builder`].
///
/// Rebuilding an unchanged posts directory is wasted work, but a shared
/// catalog must never survive a content change unnoticed, so the cache is
/// explicit about both halves: [`Cache::get_or_build`] reuses the last
/// [`Scan`] until [`Cache::invalidate`] is called, and the posts and tag
/// vocabulary live inside that single cached value, so one can never go
/// stale relative to the other.
pub struct Cache {
    builder: Builder,
    scan: Option<Scan>,
}

impl Cache {
    pub fn new(builder: Builder) -> Cache {
        Cache {
            builder,
            scan: None,
        }
    }

    /// Returns the cached scan, building it first if there isn't one.
    pub fn get_or_build(&mut self) -> Result<&Scan> {
        if self.scan.is_none() {
            self.scan = Some(self.builder.build()?);
        }
        Ok(self.scan.as_ref().expect("scan was just built"))
    }

    /// Drops the cached scan. Call this when the posts directory has
    /// changed; the next [`Cache::get_or_build`] rebuilds from disk.
    pub fn invalidate(&mut self) {
        self.scan = None;
    }
}

/// Represents a fatal catalog error. Unlike [`Warning`]s, these abort the
/// build: if the posts directory itself cannot be listed there is no
/// catalog to degrade to.
#[derive(Debug)]
pub enum Error {
    /// The posts directory could not be listed.
    ReadDir { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ReadDir { path, err } => {
                write!(f, "listing posts directory `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ReadDir { err, .. } => Some(err),
        }
    }
}

/// A per-post problem the builder skipped over. The post named by
/// [`Warning::slug`] is absent from the catalog; nothing else about the
/// build is affected.
#[derive(Debug)]
pub enum Warning {
    /// The file could not be read.
    Read { slug: String, err: std::io::Error },

    /// The frontmatter could not be parsed.
    Parse {
        slug: String,
        err: frontmatter::Error,
    },

    /// The frontmatter has no `date`, and ordering depends on one.
    MissingDate { slug: String },

    /// The `date` field isn't a date the catalog can order by.
    BadDate { slug: String, date: String },

    /// An earlier file already produced this slug; this one is shadowed.
    DuplicateSlug { slug: String },
}

impl Warning {
    /// The slug of the post this warning skipped.
    pub fn slug(&self) -> &str {
        match self {
            Warning::Read { slug, .. }
            | Warning::Parse { slug, .. }
            | Warning::MissingDate { slug }
            | Warning::BadDate { slug, .. }
            | Warning::DuplicateSlug { slug } => slug,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Warning::Read { slug, err } => write!(f, "skipping `{}`: {}", slug, err),
            Warning::Parse { slug, err } => write!(f, "skipping `{}`: {}", slug, err),
            Warning::MissingDate { slug } => {
                write!(f, "skipping `{}`: no `date` in frontmatter", slug)
            }
            Warning::BadDate { slug, date } => write!(
                f,
                "skipping `{}`: `{}` is not a date (expected e.g. 2024-06-01)",
                slug, date
            ),
            Warning::DuplicateSlug { slug } => write!(
                f,
                "skipping duplicate slug `{}`: an earlier file already claimed it",
                slug
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    fn post_file(title: &str, date: &str, tags: &[&str]) -> String {
        format!(
            "---\ntitle: {}\ndate: {}\ntags: [{}]\n---\nBody of {}.\n",
            title,
            date,
            tags.join(", "),
            title
        )
    }

    fn build(dir: &Path) -> Scan {
        Builder::new(dir).build().unwrap()
    }

    fn titles(scan: &Scan) -> Vec<&str> {
        scan.catalog
            .posts
            .iter()
            .map(|post| post.title.as_deref().unwrap_or(""))
            .collect()
    }

    #[test]
    fn test_sorts_newest_first() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "intro.md",
            &post_file("Intro", "2024-01-01", &["intro"]),
        );
        write_file(
            dir.path(),
            "advanced.md",
            &post_file("Advanced", "2024-06-01", &["advanced", "intro"]),
        );
        let scan = build(dir.path());
        assert_eq!(titles(&scan), ["Advanced", "Intro"]);
        assert!(scan.warnings.is_empty());
    }

    #[test]
    fn test_vocabulary_deduplicated_first_seen() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "intro.md",
            &post_file("Intro", "2024-01-01", &["intro"]),
        );
        write_file(
            dir.path(),
            "advanced.md",
            &post_file("Advanced", "2024-06-01", &["advanced", "intro"]),
        );
        let scan = build(dir.path());
        // First-seen order over the sorted posts: "Advanced" is newest, so
        // its tags come first, and the second "intro" doesn't repeat.
        assert_eq!(scan.catalog.tag_vocabulary, ["advanced", "intro"]);
    }

    #[test]
    fn test_duplicate_tags_within_a_post_are_kept() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "doubled.md",
            &post_file("Doubled", "2024-04-04", &["data", "data", "sql"]),
        );
        let scan = build(dir.path());
        // The post's own list stays as written; only the vocabulary dedups.
        assert_eq!(scan.catalog.posts[0].tags, ["data", "data", "sql"]);
        assert_eq!(scan.catalog.tag_vocabulary, ["data", "sql"]);
    }

    #[test]
    fn test_equal_dates_keep_discovery_order() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "b.md", &post_file("B", "2024-03-03", &[]));
        write_file(dir.path(), "a.md", &post_file("A", "2024-03-03", &[]));
        write_file(dir.path(), "c.md", &post_file("C", "2024-05-05", &[]));
        let scan = build(dir.path());
        // Discovery order is the file-name-sorted listing, and the date
        // sort is stable, so `a` stays ahead of `b`.
        assert_eq!(titles(&scan), ["C", "A", "B"]);
    }

    #[test]
    fn test_missing_date_skips_post_and_warns() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "dated.md", &post_file("Dated", "2024-02-02", &[]));
        write_file(dir.path(), "draft.md", "---\ntitle: Draft\n---\nSoon.\n");
        let scan = build(dir.path());
        assert_eq!(titles(&scan), ["Dated"]);
        assert_eq!(scan.warnings.len(), 1);
        match &scan.warnings[0] {
            Warning::MissingDate { slug } => assert_eq!(slug, "draft"),
            other => panic!("expected MissingDate, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_date_skips_post_and_warns() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "someday.md",
            "---\ntitle: Someday\ndate: next tuesday\n---\n",
        );
        let scan = build(dir.path());
        assert!(scan.catalog.posts.is_empty());
        match &scan.warnings[0] {
            Warning::BadDate { slug, date } => {
                assert_eq!(slug, "someday");
                assert_eq!(date, "next tuesday");
            }
            other => panic!("expected BadDate, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_frontmatter_skips_post_and_warns() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "broken.md", "# No frontmatter here\n");
        write_file(dir.path(), "fine.md", &post_file("Fine", "2024-02-02", &[]));
        let scan = build(dir.path());
        assert_eq!(titles(&scan), ["Fine"]);
        assert_eq!(scan.warnings.len(), 1);
        match &scan.warnings[0] {
            Warning::Parse { slug, .. } => assert_eq!(slug, "broken"),
            other => panic!("expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_rfc3339_date_accepted() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "stamped.md",
            "---\ntitle: Stamped\ndate: 2024-04-16T09:30:00+02:00\n---\n",
        );
        let scan = build(dir.path());
        assert_eq!(
            scan.catalog.posts[0].date,
            NaiveDate::from_ymd_opt(2024, 4, 16).unwrap()
        );
    }

    #[test]
    fn test_ignores_unrecognized_files() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "notes.txt", "not a post");
        write_file(dir.path(), "image.png", "binary-ish");
        write_file(dir.path(), "post.md", &post_file("Post", "2024-02-02", &[]));
        fs::create_dir(dir.path().join("drafts")).unwrap();
        let scan = build(dir.path());
        assert_eq!(titles(&scan), ["Post"]);
        assert!(scan.warnings.is_empty());
    }

    #[test]
    fn test_mdx_files_recognized() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "mixed.mdx", &post_file("Mixed", "2024-02-02", &[]));
        let scan = build(dir.path());
        assert_eq!(scan.catalog.posts[0].slug, "mixed");
    }

    #[test]
    fn test_duplicate_slug_first_discovered_wins() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "welcome.md", &post_file("First", "2024-02-02", &[]));
        write_file(dir.path(), "welcome.mdx", &post_file("Second", "2024-03-03", &[]));
        let scan = build(dir.path());
        // `welcome.md` sorts ahead of `welcome.mdx`, so it wins.
        assert_eq!(titles(&scan), ["First"]);
        match &scan.warnings[0] {
            Warning::DuplicateSlug { slug } => assert_eq!(slug, "welcome"),
            other => panic!("expected DuplicateSlug, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_title_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "untitled.md", "---\ndate: 2024-02-02\n---\nBody.\n");
        let scan = build(dir.path());
        assert_eq!(scan.catalog.posts[0].title, None);
        assert!(scan.warnings.is_empty());
    }

    #[test]
    fn test_empty_directory_builds_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let scan = build(dir.path());
        assert!(scan.catalog.posts.is_empty());
        assert!(scan.catalog.tag_vocabulary.is_empty());
        assert!(scan.warnings.is_empty());
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        match Builder::new(dir.path().join("nope")).build() {
            Err(Error::ReadDir { .. }) => (),
            other => panic!("expected ReadDir error, got {:?}", other),
        }
    }

    #[test]
    fn test_parallel_build_matches_serial() {
        let dir = TempDir::new().unwrap();
        for (name, title, date) in [
            ("a.md", "A", "2024-01-01"),
            ("b.md", "B", "2024-03-03"),
            ("c.md", "C", "2024-03-03"),
            ("d.md", "D", "2024-02-02"),
            ("e.md", "E", "2024-05-05"),
            ("f.md", "F", "2024-03-03"),
        ] {
            write_file(dir.path(), name, &post_file(title, date, &["shared"]));
        }
        let serial = Builder::new(dir.path()).build().unwrap();
        let parallel = Builder::new(dir.path()).threads(4).build().unwrap();
        assert_eq!(serial.catalog.posts, parallel.catalog.posts);
        assert_eq!(serial.catalog.tag_vocabulary, parallel.catalog.tag_vocabulary);
    }

    #[test]
    fn test_builds_testdata_posts() {
        let scan = Builder::new("testdata/posts").build().unwrap();
        let slugs: Vec<_> = scan
            .catalog
            .posts
            .iter()
            .map(|post| post.slug.as_str())
            .collect();
        assert_eq!(
            slugs,
            [
                "sql-window-functions",
                "visualizing-sleep-data",
                "getting-started-with-polars",
            ]
        );
        assert_eq!(scan.warnings.len(), 1);
        assert_eq!(scan.warnings[0].slug(), "draft-no-date");
    }

    #[test]
    fn test_cache_reuses_scan_until_invalidated() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "one.md", &post_file("One", "2024-01-01", &[]));
        let mut cache = Cache::new(Builder::new(dir.path()));
        assert_eq!(cache.get_or_build().unwrap().catalog.posts.len(), 1);

        write_file(dir.path(), "two.md", &post_file("Two", "2024-02-02", &[]));
        // Still the cached scan; the new file isn't visible yet.
        assert_eq!(cache.get_or_build().unwrap().catalog.posts.len(), 1);

        cache.invalidate();
        assert_eq!(cache.get_or_build().unwrap().catalog.posts.len(), 2);
    }
}
