//! # cymod-core
//!
//! The translation and ordering engine for cymod.
//!
//! This crate turns two kinds of graph-modelling input into one ordered
//! stream of parameterized Cypher statements:
//! - hand-written query files (`.cql`, `.cypher`) with an optional leading
//!   parameter block, and
//! - transition tables, where each row becomes a State/Transition/Condition
//!   pattern.
//!
//! ## Architectural Constraints
//!
//! The core:
//! - Never talks to a graph store; callers drain the stream into a sink
//! - Is single-threaded and pull-based: nothing is produced ahead of demand
//!   except one job's file set, which must be parsed to be priority-sorted
//! - Is deterministic: the same inputs yield byte-identical statements
//! - Never panics; every failure is a `CymodError`

// =============================================================================
// MODULES
// =============================================================================

pub mod canonical;
pub mod discovery;
pub mod file_record;
pub mod loader;
pub mod parser;
pub mod primitives;
pub mod sink;
pub mod tabular;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    CymodError, ParamValue, ParameterSet, Query, QueryParams, QuerySource, SourceKind,
};

// =============================================================================
// RE-EXPORTS: Translation
// =============================================================================

pub use canonical::{StreamDigest, canonical_line, refresh_statement};
pub use discovery::QueryFileFinder;
pub use file_record::FileRecord;
pub use tabular::{CustomLabels, Row, Table, TransitionTable};

// =============================================================================
// RE-EXPORTS: Orchestration
// =============================================================================

pub use loader::{GraphLoader, LoadJob, PlannedFile, PlannedJob, QueryStream};
pub use sink::{JournalEntry, JournalSink, LoadReport, MemorySink, QuerySink, load_into};
