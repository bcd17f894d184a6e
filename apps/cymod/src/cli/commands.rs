//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::SourceArgs;
use crate::config::{DEFAULT_CONFIG_FILE, LoadPlan};
use cymod_core::{
    CustomLabels, CymodError, GraphLoader, JournalSink, ParamValue, ParameterSet, PlannedJob,
    Query, StreamDigest, Table, load_into,
};
use std::path::{Path, PathBuf};

/// Journal used when neither `--journal` nor the load plan names one.
const DEFAULT_JOURNAL_FILE: &str = "cymod.redb";

// =============================================================================
// SOURCE ASSEMBLY
// =============================================================================

/// Build a loader from the command-line sources.
///
/// With no `--config`, `--dir` or `--table`, `./cymod.toml` is used.
pub fn build_loader(source: &SourceArgs) -> Result<(GraphLoader, Option<LoadPlan>), CymodError> {
    let config_path = match (&source.config, &source.dir, &source.table) {
        (Some(path), _, _) => Some(path.clone()),
        (None, None, None) => Some(PathBuf::from(DEFAULT_CONFIG_FILE)),
        _ => None,
    };
    let plan = config_path.map(LoadPlan::from_path).transpose()?;

    let globals = match (&source.globals, &plan) {
        (Some(path), _) => Some(ParameterSet::from_path(path)?),
        (None, Some(plan)) => plan.global_params()?,
        (None, None) => None,
    };
    let refresh = source.refresh || plan.as_ref().is_some_and(|p| p.refresh);

    let mut loader = GraphLoader::new().refresh_first(refresh);
    if let Some(globals) = globals {
        loader = loader.with_global_params(globals);
    }

    if let Some(plan) = &plan {
        plan.register_jobs(&mut loader, read_table)?;
    }

    if let Some(dir) = &source.dir {
        let params = source.params.as_ref().map(ParameterSet::from_path).transpose()?;
        loader.register_file_source(dir.clone(), source.suffix.clone(), params);
    }

    if let Some(table_path) = &source.table {
        let table = read_table(table_path)?;
        let labels = CustomLabels::from_overrides(
            source
                .labels
                .iter()
                .map(String::as_str)
                .map(parse_label)
                .collect::<Result<Vec<_>, _>>()?,
        )?;
        loader.register_tabular_source(table, &source.start_col, &source.end_col, Some(labels), None)?;
    }

    tracing::info!("Registered {} load jobs", loader.jobs().len());
    Ok((loader, plan))
}

/// Split a `Label=Override` argument.
pub fn parse_label(raw: &str) -> Result<(String, String), CymodError> {
    match raw.split_once('=') {
        Some((label, value)) if !value.is_empty() => Ok((label.to_string(), value.to_string())),
        _ => Err(CymodError::UnknownLabel(raw.to_string())),
    }
}

/// Read a transition table, choosing the format by extension.
///
/// `.json` files hold an array of flat records; anything else is CSV.
pub fn read_table(path: &Path) -> Result<Table, CymodError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        read_json_table(path)
    } else {
        read_csv_table(path)
    }
}

/// Read a JSON array of flat records into a table.
pub fn read_json_table(path: &Path) -> Result<Table, CymodError> {
    let text = std::fs::read_to_string(path).map_err(|source| CymodError::UnreadableFile {
        path: path.to_path_buf(),
        source,
    })?;
    let records: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| CymodError::SerializationError(format!("Invalid JSON {}: {}", path.display(), e)))?;
    let table = Table::from_json_records(path.display().to_string(), &records)?;

    tracing::debug!("Read {} rows from {}", table.len(), path.display());
    Ok(table)
}

/// Read a CSV file with a header row into a table.
///
/// Cells are typed with [`ParamValue::infer`].
pub fn read_csv_table(path: &Path) -> Result<Table, CymodError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| csv_error(path, e))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = Table::new(path.display().to_string(), headers);
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        table.push_row(record.iter().map(ParamValue::infer).collect())?;
    }

    tracing::debug!("Read {} rows from {}", table.len(), path.display());
    Ok(table)
}

fn csv_error(path: &Path, err: csv::Error) -> CymodError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => {
            tracing::error!("Could not read {}: {}", path.display(), message);
            CymodError::UnreadableFile {
                path: path.to_path_buf(),
                source,
            }
        }
        _ => CymodError::SerializationError(format!("Invalid CSV {}: {}", path.display(), message)),
    }
}

fn to_json_line<T: serde::Serialize>(value: &T) -> Result<String, CymodError> {
    serde_json::to_string(value).map_err(|e| CymodError::SerializationError(e.to_string()))
}

// =============================================================================
// PLAN COMMAND
// =============================================================================

/// Show the resolved load order of every job.
pub fn cmd_plan(source: &SourceArgs, json_mode: bool) -> Result<(), CymodError> {
    let (loader, _) = build_loader(source)?;
    let plan = loader.plan()?;

    if json_mode {
        let output = serde_json::to_string_pretty(&plan)
            .map_err(|e| CymodError::SerializationError(e.to_string()))?;
        println!("{}", output);
        return Ok(());
    }

    for (position, job) in plan.iter().enumerate() {
        match job {
            PlannedJob::Cypher { root, files } => {
                println!("Job {}: cypher {} ({} files)", position + 1, root.display(), files.len());
                for file in files {
                    let explicit = match file.explicit_priority {
                        Some(_) => "",
                        None => " (unspecified)",
                    };
                    println!(
                        "  priority {:>4}{}  {:>4} statements  {}",
                        file.priority,
                        explicit,
                        file.statement_count,
                        file.path.display()
                    );
                }
            }
            PlannedJob::Tabular { table, rows } => {
                println!("Job {}: tabular {} ({} rows)", position + 1, table, rows);
            }
        }
    }
    Ok(())
}

// =============================================================================
// RENDER COMMAND
// =============================================================================

/// Print every query of the stream.
pub fn cmd_render(source: &SourceArgs, json_mode: bool, inline: bool) -> Result<(), CymodError> {
    let (loader, _) = build_loader(source)?;

    for query in loader.iter_queries() {
        let query = query?;
        if json_mode {
            println!("{}", to_json_line(&render_json(&query, inline)?)?);
        } else if inline {
            println!("{}", query.render_inline()?);
        } else {
            match &query.params {
                Some(params) => println!("{}  {}", query.statement, params.to_json()),
                None => println!("{}", query.statement),
            }
        }
    }
    Ok(())
}

/// JSON form of one query.
pub fn render_json(query: &Query, inline: bool) -> Result<serde_json::Value, CymodError> {
    let statement = if inline {
        query.render_inline()?
    } else {
        query.statement.clone()
    };
    Ok(serde_json::json!({
        "statement": statement,
        "params": query.params.as_ref().map(|p| p.to_json()),
        "source": {
            "kind": query.source.kind().as_str(),
            "ref": query.source.reference(),
            "index": query.source.index(),
        },
    }))
}

// =============================================================================
// HASH COMMAND
// =============================================================================

/// Compute checksums of the query stream.
pub fn cmd_hash(source: &SourceArgs, json_mode: bool) -> Result<(), CymodError> {
    let (loader, _) = build_loader(source)?;
    let digest = digest_stream(&loader)?;

    if json_mode {
        let output = serde_json::json!({
            "queries": digest.count(),
            "checksum": format!("{:016x}", digest.checksum()),
            "blake3": digest.crypto_hash(),
        });
        println!("{}", output);
    } else {
        println!("Queries:  {}", digest.count());
        println!("Checksum: {:016x}", digest.checksum());
        println!("BLAKE3:   {}", digest.crypto_hash());
    }
    Ok(())
}

/// Digest every query of the stream.
pub fn digest_stream(loader: &GraphLoader) -> Result<StreamDigest, CymodError> {
    let mut digest = StreamDigest::new();
    for query in loader.iter_queries() {
        digest.update(&query?);
    }
    Ok(digest)
}

// =============================================================================
// LOAD COMMAND
// =============================================================================

/// Write the query stream into a journal.
pub fn cmd_load(
    source: &SourceArgs,
    json_mode: bool,
    quiet: bool,
    journal: Option<PathBuf>,
) -> Result<(), CymodError> {
    let (loader, plan) = build_loader(source)?;
    let journal = journal
        .or_else(|| {
            plan.as_ref()
                .and_then(|p| p.journal.as_ref().map(|j| p.resolve_path(j)))
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_JOURNAL_FILE));

    tracing::info!("Loading into journal {}", journal.display());
    let mut sink = JournalSink::open(&journal)?;
    let report = load_into(loader.iter_queries(), &mut sink)?;

    if json_mode {
        println!("{}", to_json_line(&report)?);
    } else if !quiet {
        println!("Loaded {} queries into {}", report.submitted, journal.display());
        println!("  From files:  {}", report.file_queries);
        println!("  From tables: {}", report.tabular_queries);
        println!("  Checksum:    {:016x}", report.checksum);
    }
    Ok(())
}

// =============================================================================
// JOURNAL COMMAND
// =============================================================================

/// List the entries of a journal.
pub fn cmd_journal(journal: &Path, json_mode: bool) -> Result<(), CymodError> {
    let sink = JournalSink::open(journal)?;

    for entry in sink.entries()? {
        if json_mode {
            println!("{}", to_json_line(&entry)?);
        } else {
            println!(
                "{:>6}  {}:{}#{}  {}",
                entry.sequence, entry.source_kind, entry.source_ref, entry.source_index, entry.statement
            );
        }
    }
    Ok(())
}
