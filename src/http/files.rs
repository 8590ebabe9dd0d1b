use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Result of a create-only write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
    /// The name does not map to a path inside the root.
    Rejected,
}

/// Flat blob store backed by one directory.
///
/// Names are single relative paths under the root; anything that would
/// resolve outside of it is treated as absent.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves `name` against the root, refusing `..`, absolute paths and
    /// empty names.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let mut components = relative.components().peekable();
        components.peek()?;

        if components.all(|c| matches!(c, Component::Normal(_))) {
            Some(self.root.join(relative))
        } else {
            None
        }
    }

    /// Reads the whole file.
    ///
    /// Returns `Ok(None)` when the name is invalid, the path is missing, or
    /// it is not a regular file.
    pub async fn read(&self, name: &str) -> std::io::Result<Option<Vec<u8>>> {
        let Some(path) = self.resolve(name) else {
            return Ok(None);
        };

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        }

        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Creates the file and writes `contents`, never overwriting.
    ///
    /// The existence check and the create are one `create_new` open, so two
    /// writers racing on the same name cannot both succeed.
    pub async fn create(&self, name: &str, contents: &[u8]) -> std::io::Result<CreateOutcome> {
        let Some(path) = self.resolve(name) else {
            return Ok(CreateOutcome::Rejected);
        };

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Ok(CreateOutcome::AlreadyExists);
            }
            Err(e) => return Err(e),
        };

        file.write_all(contents).await?;
        file.flush().await?;

        Ok(CreateOutcome::Created)
    }
}
