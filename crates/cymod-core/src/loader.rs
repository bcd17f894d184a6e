//! # Load Orchestrator
//!
//! `GraphLoader` keeps a FIFO queue of load jobs and turns it into one lazy,
//! load-ordered stream of queries.
//!
//! ## Ordering
//!
//! - Jobs are visited in registration order.
//! - Within a cypher job, files load in descending priority. A file without
//!   an explicit priority is ranked as if its priority equalled the number of
//!   files in the job, so it loads ahead of low explicit priorities.
//! - Equal ranks are broken by ascending path.
//! - Within a file, statements keep their textual order; within a table,
//!   rows keep theirs.
//!
//! ## Parameter layers
//!
//! A placeholder is resolved from, in order: its file's parameter block, the
//! job's extra global parameters, the loader-wide global parameters. A
//! placeholder left unresolved aborts the stream.

use crate::canonical::refresh_statement;
use crate::discovery::QueryFileFinder;
use crate::file_record::FileRecord;
use crate::tabular::{CustomLabels, Table, TransitionTable};
use crate::{CymodError, ParameterSet, Query};
use serde::Serialize;
use std::path::PathBuf;

// =============================================================================
// LOAD JOBS
// =============================================================================

/// One registered unit of work.
#[derive(Debug, Clone)]
pub enum LoadJob {
    /// Scan a directory for query files.
    Cypher {
        finder: QueryFileFinder,
        global_params: Option<ParameterSet>,
    },
    /// Generate statements from a transition table.
    Tabular(TransitionTable),
}

impl LoadJob {
    /// Short description used in logs and plans.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Cypher { finder, .. } => format!("cypher:{}", finder.root().display()),
            Self::Tabular(table) => format!("tabular:{}", table.table().name()),
        }
    }
}

// =============================================================================
// LOAD PLAN
// =============================================================================

/// One file of a cypher job, in load order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedFile {
    pub path: PathBuf,
    /// Rank used for ordering (the sentinel for unspecified priorities).
    pub priority: i64,
    pub explicit_priority: Option<i64>,
    pub statement_count: usize,
}

/// One job of the load plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlannedJob {
    Cypher { root: PathBuf, files: Vec<PlannedFile> },
    Tabular { table: String, rows: usize },
}

// =============================================================================
// GRAPH LOADER
// =============================================================================

/// Registry of load jobs and producer of the query stream.
#[derive(Debug, Clone, Default)]
pub struct GraphLoader {
    jobs: Vec<LoadJob>,
    global_params: Option<ParameterSet>,
    refresh_first: bool,
}

impl GraphLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader-wide fallback parameters, consulted after job-level ones.
    #[must_use]
    pub fn with_global_params(mut self, params: ParameterSet) -> Self {
        self.global_params = Some(params);
        self
    }

    /// Start the stream with a statement deleting every node that carries
    /// all loader-wide global parameters.
    ///
    /// Has no effect when there are no loader-wide global parameters.
    #[must_use]
    pub fn refresh_first(mut self, enabled: bool) -> Self {
        self.refresh_first = enabled;
        self
    }

    #[must_use]
    pub fn global_params(&self) -> Option<&ParameterSet> {
        self.global_params.as_ref()
    }

    /// Queue a directory of query files.
    ///
    /// `suffix` keeps only files whose name (without extension) ends with it.
    /// `extra_params` fill placeholders the files leave unresolved.
    pub fn register_file_source(
        &mut self,
        root: impl Into<PathBuf>,
        suffix: Option<String>,
        extra_params: Option<ParameterSet>,
    ) -> &mut Self {
        let finder = QueryFileFinder::new(root).with_suffix(suffix);
        tracing::debug!(
            "Registered cypher job {} (suffix: {:?})",
            finder.root().display(),
            finder.suffix()
        );
        self.jobs.push(LoadJob::Cypher {
            finder,
            global_params: extra_params.filter(|p| !p.is_empty()),
        });
        self
    }

    /// Queue a transition table.
    ///
    /// Returns `CymodError::MissingColumn` if either state column is absent.
    pub fn register_tabular_source(
        &mut self,
        table: Table,
        start_col: &str,
        end_col: &str,
        labels: Option<CustomLabels>,
        global_params: Option<ParameterSet>,
    ) -> Result<&mut Self, CymodError> {
        let mut transitions = TransitionTable::new(table, start_col, end_col)?;
        if let Some(labels) = labels {
            transitions = transitions.with_labels(labels);
        }
        if let Some(params) = global_params {
            transitions = transitions.with_global_params(params);
        }
        tracing::debug!(
            "Registered tabular job {} ({} rows)",
            transitions.table().name(),
            transitions.len()
        );
        self.jobs.push(LoadJob::Tabular(transitions));
        Ok(self)
    }

    /// Registered jobs in queue order.
    #[must_use]
    pub fn jobs(&self) -> &[LoadJob] {
        &self.jobs
    }

    /// Resolve the load order of every job without producing the stream.
    pub fn plan(&self) -> Result<Vec<PlannedJob>, CymodError> {
        let mut plan = Vec::with_capacity(self.jobs.len());
        for job in &self.jobs {
            let planned = match job {
                LoadJob::Cypher { finder, .. } => {
                    let files = ranked_files(finder)?
                        .into_iter()
                        .map(|(priority, record)| PlannedFile {
                            path: record.path().to_path_buf(),
                            priority,
                            explicit_priority: record.explicit_priority(),
                            statement_count: record.queries().len(),
                        })
                        .collect();
                    PlannedJob::Cypher {
                        root: finder.root().to_path_buf(),
                        files,
                    }
                }
                LoadJob::Tabular(table) => PlannedJob::Tabular {
                    table: table.table().name().to_string(),
                    rows: table.len(),
                },
            };
            plan.push(planned);
        }
        Ok(plan)
    }

    /// Lazy stream over every query of every job, in load order.
    ///
    /// Each call starts a fresh traversal. The first error ends the stream.
    pub fn iter_queries(&self) -> QueryStream<'_> {
        let refresh = if self.refresh_first {
            self.global_params.as_ref().and_then(refresh_statement)
        } else {
            None
        };
        QueryStream {
            loader: self,
            refresh,
            next_job: 0,
            state: StreamState::Idle,
        }
    }
}

/// Parse every file of a job and sort by effective priority.
fn ranked_files(finder: &QueryFileFinder) -> Result<Vec<(i64, FileRecord)>, CymodError> {
    let records = finder
        .find()?
        .iter()
        .map(FileRecord::parse)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(order_by_priority(records))
}

/// Effective priority descending, then path ascending.
fn order_by_priority(records: Vec<FileRecord>) -> Vec<(i64, FileRecord)> {
    let sentinel = i64::try_from(records.len()).unwrap_or(i64::MAX);
    let mut ranked: Vec<(i64, FileRecord)> = records
        .into_iter()
        .map(|record| (record.explicit_priority().unwrap_or(sentinel), record))
        .collect();
    ranked.sort_by(|(pa, ra), (pb, rb)| pb.cmp(pa).then_with(|| ra.path().cmp(rb.path())));
    ranked
}

// =============================================================================
// QUERY STREAM
// =============================================================================

enum StreamState<'a> {
    Idle,
    Files {
        queries: std::vec::IntoIter<Query>,
        job_params: Option<&'a ParameterSet>,
    },
    Table(Box<dyn Iterator<Item = Query> + 'a>),
    Done,
}

/// Iterator returned by [`GraphLoader::iter_queries`].
///
/// Yields `Ok(query)` in load order. After the first `Err` it is exhausted.
pub struct QueryStream<'a> {
    loader: &'a GraphLoader,
    refresh: Option<Query>,
    next_job: usize,
    state: StreamState<'a>,
}

impl<'a> QueryStream<'a> {
    /// Move to the next job. Returns `false` once the queue is exhausted.
    fn advance_job(&mut self) -> Result<bool, CymodError> {
        let Some(job) = self.loader.jobs.get(self.next_job) else {
            self.state = StreamState::Done;
            return Ok(false);
        };
        self.next_job += 1;
        tracing::info!("Loading job {}", job.describe());

        self.state = match job {
            LoadJob::Cypher { finder, global_params } => {
                let ranked = ranked_files(finder)?;
                for (priority, record) in &ranked {
                    tracing::debug!("Queued {} (priority {})", record.path().display(), priority);
                }
                let queries: Vec<Query> = ranked
                    .into_iter()
                    .flat_map(|(_, record)| record.into_queries())
                    .collect();
                StreamState::Files {
                    queries: queries.into_iter(),
                    job_params: global_params.as_ref(),
                }
            }
            LoadJob::Tabular(table) => StreamState::Table(Box::new(table.iter_queries())),
        };
        Ok(true)
    }

    /// Fill unresolved slots from the global layers, then demand completeness.
    fn resolve(&self, mut query: Query, job_params: Option<&ParameterSet>) -> Result<Query, CymodError> {
        if let Some(params) = query.params.as_mut() {
            let missing: Vec<String> = params.unresolved().map(str::to_string).collect();
            for name in missing {
                let value = job_params
                    .and_then(|p| p.get(&name))
                    .or_else(|| self.loader.global_params.as_ref().and_then(|p| p.get(&name)));
                if let Some(value) = value {
                    params.fill(&name, value.clone());
                }
            }
        }

        let missing = query.unresolved().next().map(str::to_string);
        match missing {
            Some(placeholder) => Err(query.unresolved_error(&placeholder)),
            None => Ok(query),
        }
    }

    fn fail(&mut self, err: CymodError) -> Option<Result<Query, CymodError>> {
        tracing::error!("Query stream aborted: {}", err);
        self.state = StreamState::Done;
        Some(Err(err))
    }
}

impl Iterator for QueryStream<'_> {
    type Item = Result<Query, CymodError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(refresh) = self.refresh.take() {
            return Some(Ok(refresh));
        }

        loop {
            match &mut self.state {
                StreamState::Done => return None,
                StreamState::Idle => match self.advance_job() {
                    Ok(true) => {}
                    Ok(false) => return None,
                    Err(err) => return self.fail(err),
                },
                StreamState::Files { queries, job_params } => {
                    let job_params = *job_params;
                    match queries.next() {
                        Some(query) => {
                            return match self.resolve(query, job_params) {
                                Ok(query) => Some(Ok(query)),
                                Err(err) => self.fail(err),
                            };
                        }
                        None => self.state = StreamState::Idle,
                    }
                }
                StreamState::Table(rows) => match rows.next() {
                    Some(query) => return Some(Ok(query)),
                    None => self.state = StreamState::Idle,
                },
            }
        }
    }
}

impl std::iter::FusedIterator for QueryStream<'_> {}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn record(path: &str, text: &str) -> FileRecord {
        FileRecord::from_text(path, text).unwrap()
    }

    #[test]
    fn unspecified_priority_sorts_above_low_explicit() {
        let records = vec![
            record("a.cql", "{\"priority\": 2} MATCH (a);"),
            record("b.cql", "{\"priority\": 0} MATCH (b);"),
            record("c.cql", "MATCH (c);"),
        ];
        let order: Vec<(i64, String)> = order_by_priority(records)
            .into_iter()
            .map(|(p, r)| (p, r.path().display().to_string()))
            .collect();
        assert_eq!(
            order,
            vec![(3, "c.cql".to_string()), (2, "a.cql".to_string()), (0, "b.cql".to_string())]
        );
    }

    #[test]
    fn equal_priorities_break_by_path() {
        let records = vec![
            record("z.cql", "{\"priority\": 1} MATCH (z);"),
            record("m.cql", "{\"priority\": 1} MATCH (m);"),
        ];
        let order: Vec<PathBuf> = order_by_priority(records)
            .into_iter()
            .map(|(_, r)| r.path().to_path_buf())
            .collect();
        assert_eq!(order, vec![PathBuf::from("m.cql"), PathBuf::from("z.cql")]);
    }

    #[test]
    fn empty_loader_yields_nothing() {
        let loader = GraphLoader::new();
        assert_eq!(loader.iter_queries().count(), 0);
    }

    #[test]
    fn refresh_requires_global_params() {
        let loader = GraphLoader::new().refresh_first(true);
        assert_eq!(loader.iter_queries().count(), 0);

        let globals: ParameterSet = [("project", "gredos")].into_iter().collect();
        let loader = GraphLoader::new().with_global_params(globals).refresh_first(true);
        let first = loader.iter_queries().next().unwrap().unwrap();
        assert!(first.statement.starts_with("MATCH (n) WHERE n.project=\"gredos\""));
    }

    #[test]
    fn missing_directory_aborts_stream() {
        let mut loader = GraphLoader::new();
        loader.register_file_source("/definitely/not/here", None, None);
        let mut stream = loader.iter_queries();
        assert!(matches!(stream.next(), Some(Err(CymodError::UnreadableFile { .. }))));
        assert!(stream.next().is_none());
    }
}
