//! Splits a post source file into its YAML frontmatter and body, and
//! deserializes the frontmatter into a typed [`Frontmatter`] record.
//!
//! A post file looks like this:
//!
//! ```text
//! ---
//! title: Hello, world!
//! date: 2024-04-16
//! tags: [greeting]
//! ---
//! # Hello
//! ```
//!
//! The YAML between the fences is untyped on disk; it becomes typed here,
//! and nothing downstream ever sees the raw mapping. Unknown keys are
//! ignored so a stray field in an old post can't break a build.

use serde::{Deserialize, Deserializer};
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

const FENCE: &str = "---";

/// The frontmatter keys the catalog recognizes. Every field is optional at
/// this boundary; the catalog builder decides which absences it can live
/// with (a missing `date` skips the post, a missing `summary` is just an
/// absent summary).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: Option<String>,

    /// Publication date as written. Validated and parsed by the catalog
    /// builder, not here.
    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    /// Estimated reading time in minutes. Posts write it as a string
    /// (`readingTime: "8"`) or a bare number (`readingTime: 8`); both forms
    /// deserialize to the string form.
    #[serde(
        default,
        rename = "readingTime",
        deserialize_with = "number_or_string"
    )]
    pub reading_time: Option<String>,

    /// Tags as written. A missing key and an explicit `tags: null` both
    /// normalize to an empty list.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

/// Splits `input` into frontmatter and body and deserializes the
/// frontmatter. Returns the typed record and the body (everything after the
/// closing fence, leading newline included). A fence pair with nothing but
/// whitespace between them is an empty frontmatter, not an error.
pub fn parse(input: &str) -> Result<(Frontmatter, &str)> {
    let (yaml, body) = split(input)?;
    let frontmatter = if yaml.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };
    Ok((frontmatter, body))
}

/// Like [`parse`], but a file that doesn't open with a fence is treated as
/// all body with empty frontmatter. Standalone site pages use this; posts
/// don't.
pub fn parse_lenient(input: &str) -> Result<(Frontmatter, &str)> {
    if input.starts_with(FENCE) {
        parse(input)
    } else {
        Ok((Frontmatter::default(), input))
    }
}

fn split(input: &str) -> Result<(&str, &str)> {
    if !input.starts_with(FENCE) {
        return Err(Error::MissingStartFence);
    }
    match input[FENCE.len()..].find(FENCE) {
        None => Err(Error::MissingEndFence),
        Some(offset) => {
            let yaml_stop = FENCE.len() + offset;
            Ok((
                &input[FENCE.len()..yaml_stop],
                &input[yaml_stop + FENCE.len()..],
            ))
        }
    }
}

fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Int(minutes)) => Some(minutes.to_string()),
        Some(Raw::Float(minutes)) => Some(minutes.to_string()),
        Some(Raw::Text(minutes)) => Some(minutes),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(tags.unwrap_or_default())
}

/// Represents errors encountered while parsing a frontmatter block.
#[derive(Debug)]
pub enum Error {
    /// The file doesn't begin with the opening `---` fence.
    MissingStartFence,

    /// The opening fence was found but never closed.
    MissingEndFence,

    /// The text between the fences isn't valid frontmatter YAML.
    Yaml(serde_yaml::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingStartFence => {
                write!(f, "missing opening `{}` frontmatter fence", FENCE)
            }
            Error::MissingEndFence => {
                write!(f, "missing closing `{}` frontmatter fence", FENCE)
            }
            Error::Yaml(err) => write!(f, "parsing frontmatter: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingStartFence | Error::MissingEndFence => None,
            Error::Yaml(err) => Some(err),
        }
    }
}

/// Converts a [`serde_yaml::Error`] into an [`Error`]. This allows us to use
/// the `?` operator in functions which return one of these error types but
/// which call functions that return [`serde_yaml::Error`]s.
impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::Yaml(err)
    }
}
