use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A thread-safe source of media bytes.
///
/// The locator is opaque to the packager: implementations decide whether it
/// names a path, a URL, or a key in some store.
pub trait ByteSource: Send + Sync {
    /// Fetch the complete contents behind `locator`.
    fn fetch(&self, locator: &str) -> io::Result<Vec<u8>>;

    /// Returns a human-readable name for this source (for logging).
    fn name(&self) -> &'static str;
}

// --- Implementation: Local File ---

/// Reads locators as filesystem paths.
///
/// Relative paths are resolved against the base directory when one is set,
/// otherwise against the process working directory.
#[derive(Debug, Default, Clone)]
pub struct FileSource {
    base: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self { base: None }
    }

    pub fn with_base<P: AsRef<Path>>(base: P) -> Self {
        Self {
            base: Some(base.as_ref().to_path_buf()),
        }
    }

    fn resolve(&self, locator: &str) -> PathBuf {
        let path = Path::new(locator);
        match &self.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ByteSource for FileSource {
    fn fetch(&self, locator: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(locator))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

// --- Implementation: In-Memory ---

/// An in-memory source backed by a locator → bytes map.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    data: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `data` under `locator`, replacing any previous value.
    pub fn insert(&mut self, locator: impl Into<String>, data: Vec<u8>) {
        self.data.insert(locator.into(), data);
    }

    pub fn with(mut self, locator: impl Into<String>, data: Vec<u8>) -> Self {
        self.insert(locator, data);
        self
    }
}

impl ByteSource for MemorySource {
    fn fetch(&self, locator: &str) -> io::Result<Vec<u8>> {
        self.data.get(locator).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no data for locator {locator:?}"),
            )
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_fetch() {
        let source = MemorySource::new().with("a.png", b"hello".to_vec());
        assert_eq!(source.fetch("a.png").unwrap(), b"hello");
    }

    #[test]
    fn test_memory_source_missing() {
        let source = MemorySource::new();
        let err = source.fetch("missing.png").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_file_source_resolves_against_base() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("font.otf"), b"OTTO").unwrap();

        let source = FileSource::with_base(dir.path());
        assert_eq!(source.fetch("font.otf").unwrap(), b"OTTO");

        let absolute = dir.path().join("font.otf");
        let source = FileSource::new();
        assert_eq!(source.fetch(absolute.to_str().unwrap()).unwrap(), b"OTTO");
    }
}
