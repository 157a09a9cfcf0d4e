//! A common path shared by every file one run writes. The `.with_extension()`
//! method lets each writer pick its own file suffix under a single
//! timestamped, prefix-qualified output directory.

use crate::errors::*;
use std::fs::DirBuilder;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct OutputPath {
    path: PathBuf,
    id: String,
}

impl OutputPath {
    pub fn new<'a>(root: &'a Path, prefix: &str) -> OutputPath {
        let id = create_output_id(prefix);

        OutputPath {
            path: root.join(&id).join(format!("{}.ext", id)),
            id,
        }
    }

    pub fn create(&self) -> Result<()> {
        create_output_dir(self.path.parent().ok_or("cannot create output directory")?)
    }

    /// Returns the path with the given file extension.
    pub fn with_extension(&self, ext: &str) -> PathBuf {
        self.path.with_extension(ext)
    }

    /// Directory every file under this `OutputPath` shares.
    pub fn dir(&self) -> &Path {
        self.path.parent().expect("output path always has a parent directory")
    }

    #[allow(dead_code)]
    pub fn get_id(&self) -> &str {
        &self.id
    }
}

/// Returns an ID based on prefix, time and crate version for a run's output.
fn create_output_id(prefix: &str) -> String {
    let v = env!("CARGO_PKG_VERSION").replace(".", "_");
    format!(
        "{prefix}-{time}_v{version}",
        prefix = prefix,
        time = &time::now().strftime("%Y-%m-%d_%H%M%S").unwrap().to_string(),
        version = v
    )
}

/// Creates the output directory, including any missing parent directories.
fn create_output_dir(path: &Path) -> Result<()> {
    DirBuilder::new()
        .recursive(true)
        .create(&path)
        .chain_err(|| format!("unable to create output directory '{}'", &path.display()))
}
