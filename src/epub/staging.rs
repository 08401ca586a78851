//! Scoped staging directory for one render.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const TEMP_DIR_PREFIX: &str = "bindery-";

/// A fresh, uniquely named temporary directory that is removed when dropped.
///
/// Removal failures are logged and never reported to the caller.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    pub fn create() -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir()
            .map_err(Error::Staging)?
            .keep();
        log::debug!("staging EPUB in {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            log::warn!("error removing staging directory {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_unique_and_removed() {
        let a = StagingDir::create().unwrap();
        let b = StagingDir::create().unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().is_dir());

        std::fs::write(a.path().join("file"), b"x").unwrap();
        let path = a.path().to_path_buf();
        drop(a);
        assert!(!path.exists());
    }

    #[test]
    fn test_removed_on_unwind() {
        let staged = std::panic::catch_unwind(|| {
            let staging = StagingDir::create().unwrap();
            let path = staging.path().to_path_buf();
            std::panic::panic_any(path);
        });
        let path = staged
            .unwrap_err()
            .downcast::<std::path::PathBuf>()
            .unwrap();
        assert!(!path.exists());
    }
}
