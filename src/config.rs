//! Project configuration: the `boc.yaml` project file plus the theme
//! manifest, resolved into the directory and URL layout the build uses.
//!
//! Commands may run from anywhere inside a project; discovery walks parent
//! directories until it finds `boc.yaml`, and the directory holding that
//! file is the project root. Everything else hangs off the root: `posts/`
//! and `pages/` for content, `static/` for assets, and `theme/` for the
//! theme manifest and its templates.

use crate::util::open;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// The project file name searched for by [`Project::from_directory`].
pub const PROJECT_FILE: &str = "boc.yaml";

/// Number of posts per index page when `boc.yaml` doesn't say.
#[derive(Deserialize)]
struct PageSize(usize);

impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

/// The author block of `boc.yaml`, reused verbatim in the Atom feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// The raw contents of `boc.yaml`.
#[derive(Deserialize)]
pub struct Project {
    /// Site title, shown in every page shell and in the feed.
    pub title: String,

    /// Absolute root URL the site will be served under. Its path must end
    /// with `/` so URL joins treat it as a directory.
    pub site_root: Url,

    #[serde(default)]
    pub author: Option<Author>,

    #[serde(default)]
    index_page_size: PageSize,
}

impl Project {
    /// Finds and loads the project file, searching `dir` and then each of
    /// its parents. Returns the project root alongside the parsed project.
    pub fn from_directory(dir: &Path) -> Result<(PathBuf, Project)> {
        let dir = dir
            .canonicalize()
            .map_err(|err| anyhow!("resolving project directory `{}`: {}", dir.display(), err))?;
        Project::search_up(&dir)
    }

    fn search_up(dir: &Path) -> Result<(PathBuf, Project)> {
        let path = dir.join(PROJECT_FILE);
        if path.is_file() {
            let project = serde_yaml::from_reader(open(&path, "project")?)
                .map_err(|err| anyhow!("loading `{}`: {}", path.display(), err))?;
            Ok((dir.to_owned(), project))
        } else {
            match dir.parent() {
                Some(parent) => Project::search_up(parent),
                None => Err(anyhow!(
                    "no `{}` found in this directory or any parent",
                    PROJECT_FILE
                )),
            }
        }
    }
}

/// The theme manifest, `theme/theme.yaml` under the project root. Each
/// template is a list of files relative to the theme directory; the build
/// concatenates each list before parsing, which is how templates share
/// `define` blocks.
#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
    post_template: Vec<PathBuf>,

    /// Template for standalone site pages. Optional; themes without one
    /// render site pages through the post template.
    #[serde(default)]
    page_template: Vec<PathBuf>,
}

/// Everything the build pipeline needs, resolved against the project root
/// and the output directory.
pub struct Config {
    pub title: String,
    pub author: Option<Author>,

    /// Root URL of the published site.
    pub site_root: Url,
    /// URL of the directory holding post pages.
    pub posts_url: Url,
    /// URL of the directory holding index pages.
    pub index_url: Url,
    /// URL of the copied static assets.
    pub static_url: Url,

    pub posts_source_directory: PathBuf,
    pub pages_source_directory: PathBuf,
    pub static_source_directory: PathBuf,

    pub root_output_directory: PathBuf,
    pub posts_output_directory: PathBuf,
    pub index_output_directory: PathBuf,
    pub static_output_directory: PathBuf,

    pub index_template: Vec<PathBuf>,
    pub post_template: Vec<PathBuf>,
    pub page_template: Vec<PathBuf>,

    pub index_page_size: usize,
    pub threads: usize,
}

impl Config {
    /// Loads the full build configuration: the project file found from
    /// `dir`, the theme manifest under the project root, and the output
    /// layout under `output_directory`. `threads` falls back to the number
    /// of CPUs.
    pub fn load(dir: &Path, output_directory: &Path, threads: Option<usize>) -> Result<Config> {
        let (root, project) = Project::from_directory(dir)?;

        if !project.site_root.path().ends_with('/') {
            return Err(anyhow!(
                "`site_root` must end with `/` (got `{}`)",
                project.site_root
            ));
        }

        let theme_directory = root.join("theme");
        let theme: Theme =
            serde_yaml::from_reader(open(&theme_directory.join("theme.yaml"), "theme")?)
                .map_err(|err| anyhow!("loading theme manifest: {}", err))?;

        let join = |segment: &str| -> Result<Url> {
            project
                .site_root
                .join(segment)
                .map_err(|err| anyhow!("building `{}` url: {}", segment, err))
        };
        let posts_url = join("posts/")?;
        let index_url = join("pages/")?;
        let static_url = join("static/")?;

        let resolve = |templates: &[PathBuf]| -> Vec<PathBuf> {
            templates.iter().map(|path| theme_directory.join(path)).collect()
        };
        let post_template = resolve(&theme.post_template);
        let page_template = if theme.page_template.is_empty() {
            post_template.clone()
        } else {
            resolve(&theme.page_template)
        };

        Ok(Config {
            title: project.title,
            author: project.author,
            site_root: project.site_root,
            posts_url,
            index_url,
            static_url,
            posts_source_directory: root.join("posts"),
            pages_source_directory: root.join("pages"),
            static_source_directory: root.join("static"),
            root_output_directory: output_directory.to_owned(),
            posts_output_directory: output_directory.join("posts"),
            index_output_directory: output_directory.join("pages"),
            static_output_directory: output_directory.join("static"),
            index_template: resolve(&theme.index_template),
            post_template,
            page_template,
            index_page_size: project.index_page_size.0,
            threads: threads.unwrap_or_else(num_cpus::get),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PROJECT: &str =
        "title: Example\nsite_root: https://example.org/\nauthor:\n  name: Jamie\n";
    const THEME: &str = "index_template: [index.html]\npost_template: [post.html]\n";

    fn project_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_FILE), PROJECT).unwrap();
        fs::create_dir(dir.path().join("theme")).unwrap();
        fs::write(dir.path().join("theme").join("theme.yaml"), THEME).unwrap();
        dir
    }

    #[test]
    fn test_finds_project_in_parent() {
        let dir = project_fixture();
        let nested = dir.path().join("posts").join("drafts");
        fs::create_dir_all(&nested).unwrap();

        let (root, project) = Project::from_directory(&nested).unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());
        assert_eq!(project.title, "Example");
        assert_eq!(project.author.unwrap().name, "Jamie");
    }

    #[test]
    fn test_missing_project_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(Project::from_directory(dir.path()).is_err());
    }

    #[test]
    fn test_load_resolves_layout() {
        let dir = project_fixture();
        let out = TempDir::new().unwrap();
        let config = Config::load(dir.path(), out.path(), Some(2)).unwrap();

        assert_eq!(config.posts_url.as_str(), "https://example.org/posts/");
        assert_eq!(config.index_url.as_str(), "https://example.org/pages/");
        assert_eq!(config.static_url.as_str(), "https://example.org/static/");
        assert_eq!(
            config.posts_source_directory,
            dir.path().canonicalize().unwrap().join("posts")
        );
        assert_eq!(config.posts_output_directory, out.path().join("posts"));
        assert_eq!(config.index_page_size, 10);
        assert_eq!(config.threads, 2);
        assert!(config.index_template[0].ends_with("index.html"));
        // No page template in the manifest: site pages fall back to the
        // post template.
        assert_eq!(config.page_template, config.post_template);
    }

    #[test]
    fn test_explicit_page_size() {
        let dir = project_fixture();
        fs::write(
            dir.path().join(PROJECT_FILE),
            format!("{}index_page_size: 3\n", PROJECT),
        )
        .unwrap();
        let out = TempDir::new().unwrap();
        let config = Config::load(dir.path(), out.path(), Some(1)).unwrap();
        assert_eq!(config.index_page_size, 3);
    }

    #[test]
    fn test_site_root_requires_trailing_slash() {
        let dir = project_fixture();
        fs::write(
            dir.path().join(PROJECT_FILE),
            "title: Example\nsite_root: https://example.org/blog\n",
        )
        .unwrap();
        let out = TempDir::new().unwrap();
        assert!(Config::load(dir.path(), out.path(), Some(1)).is_err());
    }
}
