//! Directory operations

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::errors::CommandError;
use crate::filesys::file::File;

/// A directory wrapper with path
#[derive(Debug, Clone)]
pub struct Dir {
    path: PathBuf,
}

impl Dir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Create the directory (and parents)
    pub async fn create(&self) -> Result<(), CommandError> {
        fs::create_dir_all(&self.path).await?;
        Ok(())
    }

    /// Get a file within this directory
    pub fn file(&self, name: &str) -> File {
        File::new(self.path.join(name))
    }

    /// Get a subdirectory
    pub fn subdir(&self, name: &str) -> Dir {
        Dir::new(self.path.join(name))
    }

    /// Recursively copy the contents of this directory into `dest`.
    ///
    /// Entries named in `skip` are ignored at every level. Returns the number
    /// of files copied.
    pub async fn copy_into(&self, dest: &Dir, skip: &[&str]) -> Result<usize, CommandError> {
        let mut copied = 0;
        let mut pending = vec![(self.path.clone(), dest.path.clone())];

        while let Some((from, to)) = pending.pop() {
            fs::create_dir_all(&to).await?;
            let mut entries = fs::read_dir(&from).await?;

            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name();
                if skip.iter().any(|s| name == **s) {
                    continue;
                }

                let file_type = entry.file_type().await?;
                let target = to.join(&name);
                if file_type.is_dir() {
                    pending.push((entry.path(), target));
                } else if file_type.is_file() {
                    fs::copy(entry.path(), &target).await?;
                    copied += 1;
                }
            }
        }

        Ok(copied)
    }

    /// All files below this directory, relative to it, in sorted order
    pub async fn walk_files(&self) -> Result<Vec<PathBuf>, CommandError> {
        let mut files = Vec::new();
        let mut pending = vec![self.path.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if let Ok(relative) = path.strip_prefix(&self.path) {
                    files.push(relative.to_path_buf());
                }
            }
        }

        files.sort();
        Ok(files)
    }
}
