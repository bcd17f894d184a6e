//! # Query Sinks
//!
//! Destinations for a query stream. The core never talks to a graph store;
//! a sink is the seam where a caller plugs one in.
//!
//! - `MemorySink` keeps every query and its inline rendering in memory.
//! - `JournalSink` appends every query to a `redb` journal, one write
//!   transaction per query.
//! - `load_into` drains a stream into any sink and reports what it did.

mod journal;

pub use journal::{JournalEntry, JournalSink};

use crate::canonical::StreamDigest;
use crate::{CymodError, Query, SourceKind};
use serde::Serialize;

/// A destination for queries.
pub trait QuerySink {
    /// Accept one query. An error stops the load.
    fn submit(&mut self, query: &Query) -> Result<(), CymodError>;
}

// =============================================================================
// MEMORY SINK
// =============================================================================

/// Connectionless sink holding queries and their concrete statements.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    queries: Vec<Query>,
    rendered: Vec<String>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// Statements with every placeholder replaced by its literal value.
    #[must_use]
    pub fn rendered(&self) -> &[String] {
        &self.rendered
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl QuerySink for MemorySink {
    fn submit(&mut self, query: &Query) -> Result<(), CymodError> {
        let rendered = query.render_inline()?;
        self.queries.push(query.clone());
        self.rendered.push(rendered);
        Ok(())
    }
}

// =============================================================================
// LOAD DRIVER
// =============================================================================

/// Summary of a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LoadReport {
    pub submitted: usize,
    pub file_queries: usize,
    pub tabular_queries: usize,
    /// FNV-1a checksum of the submitted stream.
    pub checksum: u64,
}

/// Drain `stream` into `sink`, stopping at the first error.
///
/// Queries submitted before the error stay submitted.
pub fn load_into<I, S>(stream: I, sink: &mut S) -> Result<LoadReport, CymodError>
where
    I: IntoIterator<Item = Result<Query, CymodError>>,
    S: QuerySink + ?Sized,
{
    let mut report = LoadReport::default();
    let mut digest = StreamDigest::new();

    for query in stream {
        let query = query?;
        sink.submit(&query)?;
        digest.update(&query);

        report.submitted += 1;
        match query.source.kind() {
            SourceKind::File => report.file_queries += 1,
            SourceKind::Tabular => report.tabular_queries += 1,
        }
    }

    report.checksum = digest.checksum();
    tracing::info!(
        "Loaded {} queries ({} from files, {} from tables)",
        report.submitted,
        report.file_queries,
        report.tabular_queries
    );
    Ok(report)
}
