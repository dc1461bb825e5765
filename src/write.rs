//! Renders the catalog into HTML files: one page per post, the paginated
//! post index, one index per vocabulary tag, and standalone site pages.
//!
//! Templating is Go-template syntax via `gtmpl`. Every page is rendered
//! from a [`gtmpl::Value`] tree assembled here, and post bodies become HTML
//! here and nowhere earlier. The set of files written is closed over the
//! catalog: every post page corresponds to a catalog entry and nothing else
//! is enumerated.

use crate::catalog::Catalog;
use crate::markdown;
use crate::post::Post;
use crate::view;
use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs::{create_dir_all, File};
use std::io;
use std::path::Path;
use url::Url;

pub type Result<T> = std::result::Result<T, Error>;

/// Writes rendered pages under the output directories. All fields borrow
/// from the loaded [`crate::config::Config`], which owns the directory and
/// URL layout.
pub struct Writer<'a> {
    pub post_template: &'a Template,
    pub index_template: &'a Template,
    pub page_template: &'a Template,
    pub site_title: &'a str,
    pub site_root: &'a Url,
    pub posts_url: &'a Url,
    pub index_url: &'a Url,
    pub static_url: &'a Url,
    pub root_output_directory: &'a Path,
    pub posts_output_directory: &'a Path,
    pub index_output_directory: &'a Path,
    pub index_page_size: usize,
}

/// A standalone site page (`pages/about.md`): not a post, no date, rendered
/// through the page template straight into the output root.
#[derive(Debug)]
pub struct SitePage {
    /// File base name; the output file is `{name}.html` in the output root.
    pub name: String,
    pub title: Option<String>,
    pub body: String,
}

impl Writer<'_> {
    /// Renders every page derived from the catalog: post pages, the main
    /// index, and one index per vocabulary tag. Tags that slugify the same
    /// way ("Data Viz", "data viz") share one index directory, labeled with
    /// the first-seen spelling.
    pub fn write_catalog(&self, catalog: &Catalog) -> Result<()> {
        self.write_post_pages(catalog)?;

        let everything: Vec<&Post> = view::list_all(catalog).iter().collect();
        self.write_paginated(None, &everything, self.index_output_directory, self.index_url)?;

        let mut tag_groups: Vec<(String, &str)> = Vec::new();
        for tag in &catalog.tag_vocabulary {
            let slug = tag_slug(tag);
            if !tag_groups.iter().any(|(existing, _)| *existing == slug) {
                tag_groups.push((slug, tag.as_str()));
            }
        }
        for (slug, tag) in tag_groups {
            let tagged: Vec<&Post> = catalog
                .posts
                .iter()
                .filter(|post| post.tags.iter().any(|t| tag_slug(t) == slug))
                .collect();
            let directory = self.index_output_directory.join(&slug);
            let base_url = join(self.index_url, &format!("{}/", slug))?;
            self.write_paginated(Some(tag), &tagged, &directory, &base_url)?;
        }
        Ok(())
    }

    /// Renders standalone pages to `{name}.html` in the output root.
    pub fn write_site_pages(&self, pages: &[SitePage]) -> Result<()> {
        for page in pages {
            let mut object = self.shell();
            object.insert(
                "title".to_owned(),
                Value::String(page.title.clone().unwrap_or_default()),
            );
            object.insert(
                "body".to_owned(),
                Value::String(markdown::to_html(&page.body)),
            );
            let path = self
                .root_output_directory
                .join(format!("{}.html", page.name));
            self.render(self.page_template, &path, Value::Object(object))?;
        }
        Ok(())
    }

    fn write_post_pages(&self, catalog: &Catalog) -> Result<()> {
        let posts = view::list_all(catalog);
        for (position, post) in posts.iter().enumerate() {
            let mut object = self.shell();
            object.extend(self.post_object(post, true)?);
            // "prev" is the newer neighbor in catalog order, "next" the
            // older, same as the index pages read.
            object.insert(
                "prev".to_owned(),
                match position {
                    0 => Value::Nil,
                    _ => url_value(&self.post_url(&posts[position - 1].slug)?),
                },
            );
            object.insert(
                "next".to_owned(),
                if position + 1 < posts.len() {
                    url_value(&self.post_url(&posts[position + 1].slug)?)
                } else {
                    Value::Nil
                },
            );
            let path = self
                .posts_output_directory
                .join(format!("{}.html", post.slug));
            self.render(self.post_template, &path, Value::Object(object))?;
        }
        Ok(())
    }

    /// Renders one run of index pages into `directory`. Page zero is
    /// `index.html`, later pages are `1.html`, `2.html`, and so on. An
    /// empty post list still gets its first page: readers see the empty
    /// state, not a missing file.
    fn write_paginated(
        &self,
        tag: Option<&str>,
        posts: &[&Post],
        directory: &Path,
        base_url: &Url,
    ) -> Result<()> {
        let page_size = self.index_page_size.max(1);
        let mut chunks: Vec<&[&Post]> = posts.chunks(page_size).collect();
        if chunks.is_empty() {
            chunks.push(&[]);
        }
        let total = chunks.len();

        for (number, chunk) in chunks.iter().enumerate() {
            let items = chunk
                .iter()
                .map(|post| Ok(Value::Object(self.post_object(post, false)?)))
                .collect::<Result<Vec<Value>>>()?;

            let mut object = self.shell();
            object.insert("posts".to_owned(), Value::Array(items));
            object.insert(
                "tag".to_owned(),
                match tag {
                    Some(tag) => Value::String(tag.to_owned()),
                    None => Value::Nil,
                },
            );
            object.insert(
                "prev".to_owned(),
                match number {
                    0 => Value::Nil,
                    1 => url_value(&join(base_url, "index.html")?),
                    _ => url_value(&join(base_url, &format!("{}.html", number - 1))?),
                },
            );
            object.insert(
                "next".to_owned(),
                if number + 1 < total {
                    url_value(&join(base_url, &format!("{}.html", number + 1))?)
                } else {
                    Value::Nil
                },
            );

            let file_name = match number {
                0 => "index.html".to_owned(),
                _ => format!("{}.html", number),
            };
            self.render(self.index_template, &directory.join(file_name), Value::Object(object))?;
        }
        Ok(())
    }

    /// Fields every page shell gets: the site title and the chrome URLs.
    fn shell(&self) -> HashMap<String, Value> {
        let mut object = HashMap::new();
        object.insert(
            "site_title".to_owned(),
            Value::String(self.site_title.to_owned()),
        );
        object.insert("home_url".to_owned(), url_value(self.site_root));
        object.insert("static_url".to_owned(), url_value(self.static_url));
        object
    }

    /// Builds the template fields for one post. Body HTML is rendered only
    /// for the post's own page; list views show the frontmatter summary.
    /// Absent optional fields become [`Value::Nil`] so templates can gate
    /// on them; an absent title renders as the empty string.
    fn post_object(&self, post: &Post, with_body: bool) -> Result<HashMap<String, Value>> {
        let mut object = HashMap::new();
        object.insert("slug".to_owned(), Value::String(post.slug.clone()));
        object.insert(
            "title".to_owned(),
            Value::String(post.title.clone().unwrap_or_default()),
        );
        object.insert("date".to_owned(), Value::String(post.date_iso()));
        object.insert(
            "date_display".to_owned(),
            Value::String(post.date_display()),
        );
        object.insert("url".to_owned(), url_value(&self.post_url(&post.slug)?));
        object.insert("summary".to_owned(), optional(&post.summary));
        object.insert("author".to_owned(), optional(&post.author));
        object.insert("reading_time".to_owned(), optional(&post.reading_time));
        object.insert(
            "tags".to_owned(),
            Value::Array(
                post.tags
                    .iter()
                    .map(|tag| self.tag_object(tag))
                    .collect::<Result<Vec<Value>>>()?,
            ),
        );
        if with_body {
            object.insert(
                "body".to_owned(),
                Value::String(markdown::to_html(&post.body)),
            );
        }
        Ok(object)
    }

    /// A tag's template fields: its display name and the URL of its index.
    fn tag_object(&self, tag: &str) -> Result<Value> {
        let mut object = HashMap::new();
        object.insert("name".to_owned(), Value::String(tag.to_owned()));
        object.insert(
            "url".to_owned(),
            url_value(&join(self.index_url, &format!("{}/index.html", tag_slug(tag)))?),
        );
        Ok(Value::Object(object))
    }

    fn post_url(&self, slug: &str) -> Result<Url> {
        join(self.posts_url, &format!("{}.html", slug))
    }

    /// Applies `template` to `value` and writes the result to `path`,
    /// creating parent directories as needed.
    fn render(&self, template: &Template, path: &Path, value: Value) -> Result<()> {
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        template.execute(
            &mut File::create(path)?,
            &Context::from(value).unwrap(),
        )?;
        Ok(())
    }
}

/// Tag index directories are slugified so arbitrary tag text maps onto the
/// filesystem and URLs (`Data Viz` becomes `data-viz`).
fn tag_slug(tag: &str) -> String {
    slug::slugify(tag)
}

/// Joins `segment` onto `base`. The trailing slash on `base` matters: a
/// base URL without one treats its last segment as a file and drops it.
fn join(base: &Url, segment: &str) -> Result<Url> {
    base.join(segment).map_err(|err| Error::Url {
        segment: segment.to_owned(),
        err,
    })
}

fn url_value(url: &Url) -> Value {
    Value::String(url.to_string())
}

fn optional(field: &Option<String>) -> Value {
    match field {
        Some(text) => Value::String(text.clone()),
        None => Value::Nil,
    }
}

/// Represents an error while rendering or writing pages.
#[derive(Debug)]
pub enum Error {
    /// Templating failed. Template syntax problems surface earlier, at
    /// parse time; this is a render-time failure such as a missing field.
    Template(String),

    /// A URL for a page or tag index could not be built.
    Url {
        segment: String,
        err: url::ParseError,
    },

    /// Writing an output file failed.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => write!(f, "rendering template: {}", err),
            Error::Url { segment, err } => write!(f, "building url for `{}`: {}", segment, err),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Url { err, .. } => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

/// Converts a template error message ([`String`]) into an [`Error`]. This
/// allows us to use the `?` operator for fallible template operations.
impl From<String> for Error {
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

/// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
/// `?` operator in functions which return one of these error types but
/// which call functions that return [`io::Error`]s.
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}
