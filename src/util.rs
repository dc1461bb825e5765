//! Small filesystem helpers shared by the configuration layer.

use anyhow::{anyhow, Result};
use std::fs::File;
use std::path::Path;

/// Opens `path` for reading, labeling failures with the role the file plays
/// (`"project"`, `"theme"`) so the operator can tell which configuration
/// file was the problem.
pub fn open(path: &Path, kind: &str) -> Result<File> {
    File::open(path).map_err(|err| anyhow!("opening {} file `{}`: {}", kind, path.display(), err))
}
