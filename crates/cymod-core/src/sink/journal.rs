//! redb-backed query journal.

use super::QuerySink;
use crate::{CymodError, Query};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Table for entries: sequence(u64) -> serialized JournalEntry bytes
const ENTRIES: TableDefinition<u64, &[u8]> = TableDefinition::new("entries");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_SEQUENCE_KEY: &str = "next_sequence";

/// One journaled query.
///
/// Parameters are stored as JSON text since postcard cannot carry
/// self-describing values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    pub statement: String,
    pub params_json: Option<String>,
    pub source_kind: String,
    pub source_ref: String,
    pub source_index: u64,
}

impl JournalEntry {
    fn from_query(sequence: u64, query: &Query) -> Result<Self, CymodError> {
        let params_json = query
            .params
            .as_ref()
            .map(|p| serde_json::to_string(&p.to_json()))
            .transpose()
            .map_err(|e| CymodError::SerializationError(e.to_string()))?;

        Ok(Self {
            sequence,
            statement: query.statement.clone(),
            params_json,
            source_kind: query.source.kind().as_str().to_string(),
            source_ref: query.source.reference().to_string(),
            source_index: u64::try_from(query.source.index())
                .map_err(|e| CymodError::SerializationError(e.to_string()))?,
        })
    }
}

/// A durable, append-only journal of submitted queries.
pub struct JournalSink {
    db: Database,
    next_sequence: u64,
}

impl std::fmt::Debug for JournalSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalSink")
            .field("next_sequence", &self.next_sequence)
            .finish_non_exhaustive()
    }
}

impl JournalSink {
    /// Open or create a journal at the given path.
    ///
    /// Reopening an existing journal continues its sequence.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CymodError> {
        let db = Database::create(path.as_ref()).map_err(|e| CymodError::StorageError(e.to_string()))?;

        {
            let write_txn = db
                .begin_write()
                .map_err(|e| CymodError::StorageError(e.to_string()))?;
            let _ = write_txn
                .open_table(ENTRIES)
                .map_err(|e| CymodError::StorageError(e.to_string()))?;
            let _ = write_txn
                .open_table(METADATA)
                .map_err(|e| CymodError::StorageError(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| CymodError::StorageError(e.to_string()))?;
        }

        let next_sequence = {
            let read_txn = db
                .begin_read()
                .map_err(|e| CymodError::StorageError(e.to_string()))?;
            let table = read_txn
                .open_table(METADATA)
                .map_err(|e| CymodError::StorageError(e.to_string()))?;
            table
                .get(NEXT_SEQUENCE_KEY)
                .map_err(|e| CymodError::StorageError(e.to_string()))?
                .map_or(0, |v| v.value())
        };

        tracing::debug!(
            "Opened journal {} at sequence {}",
            path.as_ref().display(),
            next_sequence
        );
        Ok(Self { db, next_sequence })
    }

    /// Every entry in sequence order.
    pub fn entries(&self) -> Result<Vec<JournalEntry>, CymodError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| CymodError::StorageError(e.to_string()))?;
        let table = read_txn
            .open_table(ENTRIES)
            .map_err(|e| CymodError::StorageError(e.to_string()))?;

        let mut entries = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| CymodError::StorageError(e.to_string()))?
        {
            let (_, value) = entry.map_err(|e| CymodError::StorageError(e.to_string()))?;
            let decoded: JournalEntry = postcard::from_bytes(value.value())
                .map_err(|e| CymodError::SerializationError(e.to_string()))?;
            entries.push(decoded);
        }
        Ok(entries)
    }

    /// Number of journaled queries.
    pub fn len(&self) -> Result<u64, CymodError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| CymodError::StorageError(e.to_string()))?;
        let table = read_txn
            .open_table(ENTRIES)
            .map_err(|e| CymodError::StorageError(e.to_string()))?;
        table
            .len()
            .map_err(|e| CymodError::StorageError(e.to_string()))
    }

    pub fn is_empty(&self) -> Result<bool, CymodError> {
        Ok(self.len()? == 0)
    }
}

impl QuerySink for JournalSink {
    fn submit(&mut self, query: &Query) -> Result<(), CymodError> {
        let sequence = self.next_sequence;
        let entry = JournalEntry::from_query(sequence, query)?;
        let bytes =
            postcard::to_allocvec(&entry).map_err(|e| CymodError::SerializationError(e.to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| CymodError::StorageError(e.to_string()))?;
        {
            let mut entries = write_txn
                .open_table(ENTRIES)
                .map_err(|e| CymodError::StorageError(e.to_string()))?;
            entries
                .insert(sequence, bytes.as_slice())
                .map_err(|e| CymodError::StorageError(e.to_string()))?;

            let mut metadata = write_txn
                .open_table(METADATA)
                .map_err(|e| CymodError::StorageError(e.to_string()))?;
            metadata
                .insert(NEXT_SEQUENCE_KEY, sequence + 1)
                .map_err(|e| CymodError::StorageError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| CymodError::StorageError(e.to_string()))?;

        self.next_sequence = sequence + 1;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{ParamValue, QueryParams, QuerySource};
    use tempfile::TempDir;

    fn sample(statement: &str) -> Query {
        let params: QueryParams = [("v", Some(ParamValue::from(1)))].into_iter().collect();
        Query::new(statement, Some(params), QuerySource::tabular("t", 3))
    }

    #[test]
    fn entries_come_back_in_order() {
        let dir = TempDir::new().unwrap();
        let mut sink = JournalSink::open(dir.path().join("journal.redb")).unwrap();
        sink.submit(&sample("MATCH (a);")).unwrap();
        sink.submit(&sample("MATCH (b);")).unwrap();

        let entries = sink.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].statement, "MATCH (a);");
        assert_eq!(entries[1].sequence, 1);
        assert_eq!(entries[0].params_json.as_deref(), Some("{\"v\":1}"));
        assert_eq!(entries[0].source_kind, "tabular");
        assert_eq!(entries[0].source_index, 3);
    }

    #[test]
    fn reopen_continues_sequence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.redb");
        {
            let mut sink = JournalSink::open(&path).unwrap();
            sink.submit(&sample("MATCH (a);")).unwrap();
        }
        let mut sink = JournalSink::open(&path).unwrap();
        sink.submit(&sample("MATCH (b);")).unwrap();

        assert_eq!(sink.len().unwrap(), 2);
        let sequences: Vec<u64> = sink.entries().unwrap().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1]);
    }
}
