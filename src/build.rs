//! Site assembly: the pipeline from posts directory to output tree.
//!
//! [`build_site`] stitches the stages together: build the catalog (logging
//! any per-post warnings), parse the theme templates, reset the output
//! directories this build owns, render every page, copy static assets,
//! promote the first index page to the site root, and write the Atom feed.

use crate::catalog::{Builder, Scan};
use crate::config::Config;
use crate::feed::{self, FeedConfig};
use crate::frontmatter;
use crate::write::{SitePage, Writer};
use crate::{debug, log, warn};
use gtmpl::Template;
use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

/// Builds the whole site described by `config`.
pub fn build_site(config: &Config) -> Result<()> {
    let scan = Builder::new(&config.posts_source_directory)
        .threads(config.threads)
        .build()?;
    report(&scan);

    let index_template = parse_template(&config.index_template)?;
    let post_template = parse_template(&config.post_template)?;
    let page_template = parse_template(&config.page_template)?;

    let site_pages = collect_site_pages(&config.pages_source_directory)?;

    // Start from clean output directories so posts deleted from the source
    // don't linger in the output. Only the directories this build owns are
    // cleared, never the whole output root.
    remove_dir(&config.posts_output_directory)?;
    remove_dir(&config.index_output_directory)?;
    remove_dir(&config.static_output_directory)?;
    fs::create_dir_all(&config.root_output_directory)?;

    let writer = Writer {
        post_template: &post_template,
        index_template: &index_template,
        page_template: &page_template,
        site_title: &config.title,
        site_root: &config.site_root,
        posts_url: &config.posts_url,
        index_url: &config.index_url,
        static_url: &config.static_url,
        root_output_directory: &config.root_output_directory,
        posts_output_directory: &config.posts_output_directory,
        index_output_directory: &config.index_output_directory,
        index_page_size: config.index_page_size,
    };
    writer.write_catalog(&scan.catalog)?;
    writer.write_site_pages(&site_pages)?;
    log!(
        "build";
        "rendered {} posts and {} pages",
        scan.catalog.posts.len(),
        site_pages.len()
    );

    copy_static(
        &config.static_source_directory,
        &config.static_output_directory,
    )?;

    // The homepage is the first page of the post index.
    fs::copy(
        config.index_output_directory.join("index.html"),
        config.root_output_directory.join("index.html"),
    )?;

    let feed_file = File::create(config.root_output_directory.join("feed.atom"))?;
    feed::write_feed(
        FeedConfig {
            title: config.title.clone(),
            id: config.site_root.to_string(),
            author: config.author.clone(),
            home_page: config.site_root.clone(),
            posts_url: config.posts_url.clone(),
        },
        &scan.catalog.posts,
        feed_file,
    )?;

    Ok(())
}

/// Surfaces the catalog's warning list. Warnings never fail the build; the
/// posts they name are simply absent from the output.
fn report(scan: &Scan) {
    for warning in &scan.warnings {
        warn!("catalog"; "{}", warning);
    }
    debug!(
        "catalog";
        "{} posts, {} tags",
        scan.catalog.posts.len(),
        scan.catalog.tag_vocabulary.len()
    );
}

/// Collects standalone pages (`pages/*.md`). The directory is optional; a
/// project without one just has no extra pages. Frontmatter is optional
/// here too: a bare markdown file is all body.
fn collect_site_pages(directory: &Path) -> Result<Vec<SitePage>> {
    let mut pages = Vec::new();
    let listing = match fs::read_dir(directory) {
        Ok(listing) => listing,
        Err(ref err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(pages),
        Err(err) => return Err(Error::Io(err)),
    };
    for result in listing {
        let entry = result?;
        let os_file_name = entry.file_name();
        let file_name = os_file_name.to_string_lossy();
        let name = match file_name.strip_suffix(".md") {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => continue,
        };
        let input = fs::read_to_string(entry.path())?;
        let (matter, body) = frontmatter::parse_lenient(&input).map_err(|err| Error::Page {
            name: name.clone(),
            err,
        })?;
        pages.push(SitePage {
            name,
            title: matter.title,
            body: body.to_owned(),
        });
    }
    pages.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(pages)
}

/// Reads and concatenates the template files, then parses the result.
/// Themes split shared `define` blocks across files; concatenating is what
/// lets every page template see them.
fn parse_template(files: &[PathBuf]) -> Result<Template> {
    let mut contents = String::new();
    for file in files {
        File::open(file)
            .map_err(|err| Error::OpenTemplate {
                path: file.clone(),
                err,
            })?
            .read_to_string(&mut contents)?;
        contents.push('\n');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

/// Removes `directory` and everything under it, tolerating a directory
/// that doesn't exist yet.
fn remove_dir(directory: &Path) -> Result<()> {
    match fs::remove_dir_all(directory) {
        Ok(()) => Ok(()),
        Err(ref err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Error::Clean {
            path: directory.to_owned(),
            err,
        }),
    }
}

/// Copies the static source tree verbatim. A missing source directory
/// means the project has no static assets, which is not an error.
fn copy_static(source: &Path, destination: &Path) -> Result<()> {
    if !source.is_dir() {
        return Ok(());
    }
    for result in walkdir::WalkDir::new(source) {
        let entry = result?;
        if !entry.file_type().is_file() {
            continue;
        }
        // The walk is rooted at `source`, so strip_prefix cannot fail.
        let relative = entry
            .path()
            .strip_prefix(source)
            .expect("walked path outside its root");
        let target = destination.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &target)?;
    }
    Ok(())
}

/// Represents a failed site build.
#[derive(Debug)]
pub enum Error {
    /// The catalog could not be built at all.
    Catalog(crate::catalog::Error),

    /// Rendering or writing pages failed.
    Write(crate::write::Error),

    /// A standalone site page's frontmatter is malformed.
    Page {
        name: String,
        err: frontmatter::Error,
    },

    /// Clearing an output directory failed.
    Clean { path: PathBuf, err: std::io::Error },

    /// A theme template file could not be opened.
    OpenTemplate { path: PathBuf, err: std::io::Error },

    /// A theme template could not be parsed.
    ParseTemplate(String),

    /// The feed could not be generated.
    Feed(feed::Error),

    /// Walking the static assets failed.
    Walk(walkdir::Error),

    /// Any other I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Catalog(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Page { name, err } => write!(f, "page `{}`: {}", name, err),
            Error::Clean { path, err } => write!(f, "cleaning `{}`: {}", path.display(), err),
            Error::OpenTemplate { path, err } => {
                write!(f, "opening template `{}`: {}", path.display(), err)
            }
            Error::ParseTemplate(err) => write!(f, "parsing templates: {}", err),
            Error::Feed(err) => err.fmt(f),
            Error::Walk(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Catalog(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Page { err, .. } => Some(err),
            Error::Clean { err, .. } => Some(err),
            Error::OpenTemplate { err, .. } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Feed(err) => Some(err),
            Error::Walk(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

/// Converts a [`crate::catalog::Error`] into an [`Error`]. This allows us
/// to use the `?` operator in functions which return one of these error
/// types but which call functions that return catalog errors.
impl From<crate::catalog::Error> for Error {
    fn from(err: crate::catalog::Error) -> Error {
        Error::Catalog(err)
    }
}

impl From<crate::write::Error> for Error {
    fn from(err: crate::write::Error) -> Error {
        Error::Write(err)
    }
}

impl From<feed::Error> for Error {
    fn from(err: feed::Error) -> Error {
        Error::Feed(err)
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Error {
        Error::Walk(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
