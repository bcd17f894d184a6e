//! # Discovery Module
//!
//! Finds query files below a root directory.
//!
//! A file qualifies if its extension is a recognised query-file extension
//! and, when a suffix filter is set, its name without extension ends with
//! that suffix (`views_w.cql` matches suffix `_w`).

use crate::CymodError;
use crate::primitives::QUERY_FILE_EXTENSIONS;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Searcher for query files in a directory hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFileFinder {
    root: PathBuf,
    extensions: Vec<String>,
    suffix: Option<String>,
}

impl QueryFileFinder {
    /// Search `root` for files with the default query-file extensions.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: QUERY_FILE_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            suffix: None,
        }
    }

    /// Only accept files whose stem ends with `suffix`.
    #[must_use]
    pub fn with_suffix(mut self, suffix: Option<String>) -> Self {
        self.suffix = suffix.filter(|s| !s.is_empty());
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Check whether a path names a qualifying query file.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let has_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)));
        if !has_extension {
            return false;
        }

        match &self.suffix {
            Some(suffix) => path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| stem.ends_with(suffix.as_str())),
            None => true,
        }
    }

    /// All qualifying files, sorted by path.
    ///
    /// Any directory-walk failure (including a missing root) is returned as
    /// `CymodError::UnreadableFile`.
    pub fn find(&self) -> Result<Vec<PathBuf>, CymodError> {
        let mut paths = Vec::new();

        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(|e| {
                let path = e.path().map_or_else(|| self.root.clone(), Path::to_path_buf);
                tracing::error!("Could not search {}: {}", path.display(), e);
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
                CymodError::UnreadableFile { path, source }
            })?;

            if entry.file_type().is_file() && self.matches(entry.path()) {
                tracing::debug!("Discovered query file {}", entry.path().display());
                paths.push(entry.into_path());
            }
        }

        paths.sort();
        Ok(paths)
    }
}
