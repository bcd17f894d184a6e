//! # File Record Module
//!
//! One parsed query file: its priority, its parameters and its queries.
//!
//! Parsing is explicit and happens once. `FileRecord::parse` reads the file
//! and returns an immutable record; there is no hidden cache.

use crate::parser::{extract_parameter_block, resolve_placeholders, split_statements, strip_comments};
use crate::primitives::{MAX_QUERY_FILE_SIZE, PRIORITY_KEY};
use crate::{CymodError, ParameterSet, Query, QuerySource};
use std::path::{Path, PathBuf};

/// A parsed query file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    path: PathBuf,
    priority: Option<i64>,
    parameters: Option<ParameterSet>,
    queries: Vec<Query>,
}

impl FileRecord {
    /// Read and parse a query file.
    ///
    /// Parsing is all-or-nothing: either every statement is produced or an
    /// error is returned.
    pub fn parse(path: impl AsRef<Path>) -> Result<Self, CymodError> {
        let path = path.as_ref();
        let text = read_query_file(path)?;
        Self::from_text(path, &text)
    }

    /// Parse query-file text that was already read from `path`.
    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Result<Self, CymodError> {
        let path = path.into();
        let origin = path.display().to_string();

        let processed = strip_comments(text);
        let (parameters, body) = extract_parameter_block(&processed, &origin)?;

        let (priority, parameters) = match parameters {
            Some(mut params) => {
                let priority = match params.remove(PRIORITY_KEY) {
                    Some(value) => Some(value.as_integer().ok_or_else(|| {
                        CymodError::MalformedParameterBlock {
                            path: origin.clone(),
                            reason: format!("'{}' must be an integer, found {}", PRIORITY_KEY, value),
                        }
                    })?),
                    None => None,
                };
                (priority, Some(params))
            }
            None => (None, None),
        };

        let queries = split_statements(body)
            .into_iter()
            .enumerate()
            .map(|(index, statement)| {
                let params = resolve_placeholders(&statement, parameters.as_ref());
                Query::new(statement, params, QuerySource::file(&path, index))
            })
            .collect();

        Ok(Self {
            path,
            priority,
            parameters,
            queries,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load priority. Files without an explicit priority report 0.
    #[must_use]
    pub fn priority(&self) -> i64 {
        self.priority.unwrap_or(0)
    }

    /// The priority given in the parameter block, if any.
    #[must_use]
    pub const fn explicit_priority(&self) -> Option<i64> {
        self.priority
    }

    /// File parameters, without the `priority` key. `None` if the file has
    /// no parameter block.
    #[must_use]
    pub fn parameters(&self) -> Option<&ParameterSet> {
        self.parameters.as_ref()
    }

    #[must_use]
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    #[must_use]
    pub fn into_queries(self) -> Vec<Query> {
        self.queries
    }
}

/// Read a whole query file, logging context before propagating failures.
fn read_query_file(path: &Path) -> Result<String, CymodError> {
    let unreadable = |source: std::io::Error| {
        tracing::error!("Could not open query file {}: {}", path.display(), source);
        CymodError::UnreadableFile {
            path: path.to_path_buf(),
            source,
        }
    };

    let metadata = std::fs::metadata(path).map_err(unreadable)?;
    if metadata.len() > MAX_QUERY_FILE_SIZE {
        return Err(unreadable(std::io::Error::other(format!(
            "file size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_QUERY_FILE_SIZE
        ))));
    }

    std::fs::read_to_string(path).map_err(unreadable)
}

// =============================================================================
// TESTS
// =============================================================================
