//! Tests for the cymod command-line layer: argument parsing, source
//! assembly, CSV tables and load plans.

#![allow(clippy::unwrap_used, clippy::panic)]

use clap::Parser;
use cymod::cli::{
    Cli, Commands, SourceArgs, build_loader, digest_stream, parse_label, read_csv_table,
    read_table, render_json,
};
use cymod::config::LoadPlan;
use cymod_core::{CymodError, JournalSink, ParamValue, load_into};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
}

fn dir_source(dir: &Path) -> SourceArgs {
    SourceArgs {
        dir: Some(dir.to_path_buf()),
        start_col: "start".to_string(),
        end_col: "end".to_string(),
        ..SourceArgs::default()
    }
}

// =============================================================================
// ARGUMENT PARSING
// =============================================================================

#[test]
fn test_parse_render_with_inline() {
    let cli = Cli::try_parse_from(["cymod", "render", "--dir", "model", "--inline"]).unwrap();
    match cli.command {
        Commands::Render { source, inline } => {
            assert!(inline);
            assert_eq!(source.dir.as_deref(), Some(Path::new("model")));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_parse_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["cymod", "plan", "--dir", "m", "--json-mode", "-q"]).unwrap();
    assert!(cli.json_mode);
    assert!(cli.quiet);
}

#[test]
fn test_suffix_requires_dir() {
    assert!(Cli::try_parse_from(["cymod", "plan", "--suffix", "_w"]).is_err());
}

#[test]
fn test_table_columns_default() {
    let cli = Cli::try_parse_from(["cymod", "hash", "--table", "t.csv"]).unwrap();
    match cli.command {
        Commands::Hash { source } => {
            assert_eq!(source.start_col, "start");
            assert_eq!(source.end_col, "end");
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_parse_label() {
    assert_eq!(
        parse_label("State=LandCover").unwrap(),
        ("State".to_string(), "LandCover".to_string())
    );
    assert!(matches!(parse_label("State"), Err(CymodError::UnknownLabel(_))));
}

// =============================================================================
// CSV TABLES
// =============================================================================

#[test]
fn test_read_csv_infers_cell_types() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "t.csv",
        "start,end,cond,weight,active\nstate1,state2,low,3,true\n",
    );

    let table = read_csv_table(&path).unwrap();
    assert_eq!(table.len(), 1);
    let row = table.rows().next().unwrap();
    assert_eq!(row.get("weight"), Some(&ParamValue::from(3)));
    assert_eq!(row.get("active"), Some(&ParamValue::from(true)));
    assert_eq!(row.get("cond"), Some(&ParamValue::from("low")));
}

#[test]
fn test_read_csv_missing_file() {
    let result = read_csv_table(Path::new("/definitely/not/here.csv"));
    assert!(matches!(result, Err(CymodError::UnreadableFile { .. })));
}

#[test]
fn test_read_json_table_keeps_cell_types() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "t.json",
        r#"[{"start": "state1", "end": "state2", "weight": 3, "active": true}]"#,
    );

    let table = read_table(&path).unwrap();
    assert_eq!(table.columns(), ["start", "end", "weight", "active"]);
    let row = table.rows().next().unwrap();
    assert_eq!(row.get("weight"), Some(&ParamValue::from(3)));
    assert_eq!(row.get("active"), Some(&ParamValue::from(true)));
}

#[test]
fn test_json_table_source_generates_transitions() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "t.json",
        r#"[{"start": "state1", "end": "state2", "cond": "low"}]"#,
    );

    let source = SourceArgs {
        table: Some(path),
        start_col: "start".to_string(),
        end_col: "end".to_string(),
        ..SourceArgs::default()
    };
    let (loader, _) = build_loader(&source).unwrap();
    let queries: Vec<_> = loader.iter_queries().collect::<Result<_, _>>().unwrap();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].statement.contains("{cond:\"low\"}"));
}

#[test]
fn test_table_source_generates_transitions() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "t.csv", "start,end,cond\nstate1,state2,low\n");

    let source = SourceArgs {
        table: Some(path),
        start_col: "start".to_string(),
        end_col: "end".to_string(),
        labels: vec!["State=LandCover".to_string()],
        ..SourceArgs::default()
    };
    let (loader, plan) = build_loader(&source).unwrap();
    assert!(plan.is_none());

    let statements: Vec<String> = loader
        .iter_queries()
        .map(|q| q.unwrap().statement)
        .collect();
    assert_eq!(
        statements,
        vec![
            "MERGE (start:LandCover {code:\"state1\"}) MERGE (end:LandCover {code:\"state2\"}) \
             MERGE (start)<-[:SOURCE]-(trans:Transition)-[:TARGET]->(end) \
             MERGE (cond:Condition {cond:\"low\"})-[:CAUSES]->(trans);"
                .to_string()
        ]
    );
}

// =============================================================================
// SOURCE ASSEMBLY
// =============================================================================

#[test]
fn test_dir_source_with_params_file() {
    let dir = TempDir::new().unwrap();
    let model = dir.path().join("model");
    write(&model, "a.cql", "MERGE (n:Test {v: $paramval});");
    let params = write(dir.path(), "params.yaml", "paramval: 7\n");

    let mut source = dir_source(&model);
    source.params = Some(params);
    let (loader, _) = build_loader(&source).unwrap();

    let query = loader.iter_queries().next().unwrap().unwrap();
    assert_eq!(query.render_inline().unwrap(), "MERGE (n:Test {v: 7});");
}

#[test]
fn test_render_json_shape() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.cql", "{\"x\": \"Sue\"} MERGE (n {v:$x});");

    let (loader, _) = build_loader(&dir_source(dir.path())).unwrap();
    let query = loader.iter_queries().next().unwrap().unwrap();
    let json = render_json(&query, true).unwrap();

    assert_eq!(json["statement"], "MERGE (n {v:\"Sue\"});");
    assert_eq!(json["params"], serde_json::json!({"x": "Sue"}));
    assert_eq!(json["source"]["kind"], "file");
    assert_eq!(json["source"]["index"], 0);
}

#[test]
fn test_hash_is_stable_across_runs() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.cql", "{\"priority\": 1} MATCH (a);");
    write(dir.path(), "b.cql", "MATCH (b); MATCH (c);");

    let (loader, _) = build_loader(&dir_source(dir.path())).unwrap();
    let first = digest_stream(&loader).unwrap();
    let second = digest_stream(&loader).unwrap();

    assert_eq!(first.count(), 3);
    assert_eq!(first.checksum(), second.checksum());
    assert_eq!(first.crypto_hash(), second.crypto_hash());
}

// =============================================================================
// LOAD PLANS
// =============================================================================

#[test]
fn test_load_plan_end_to_end() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "model/a.cql", "MERGE (n:Node {project: $project});");
    write(dir.path(), "t.csv", "from,to,cond\ns1,s2,wet\n");
    let config = write(
        dir.path(),
        "cymod.toml",
        r#"
        journal = "out.redb"
        refresh = true
        global_params = { project = "gredos" }

        [[job]]
        kind = "cypher"
        dir = "model"

        [[job]]
        kind = "tabular"
        table = "t.csv"
        start_col = "from"
        end_col = "to"
        "#,
    );

    let source = SourceArgs {
        config: Some(config),
        ..SourceArgs::default()
    };
    let (loader, plan) = build_loader(&source).unwrap();
    let plan: LoadPlan = plan.unwrap();
    assert_eq!(loader.jobs().len(), 2);

    let journal_path = plan.resolve_path(plan.journal.as_deref().unwrap());
    let mut sink = JournalSink::open(&journal_path).unwrap();
    let report = load_into(loader.iter_queries(), &mut sink).unwrap();

    assert_eq!(report.submitted, 3);
    assert_eq!(report.file_queries, 2);
    assert_eq!(report.tabular_queries, 1);

    let entries = sink.entries().unwrap();
    assert_eq!(
        entries[0].statement,
        "MATCH (n) WHERE n.project=\"gredos\" DETACH DELETE n;"
    );
    assert_eq!(entries[1].params_json.as_deref(), Some("{\"project\":\"gredos\"}"));
    assert_eq!(entries[2].source_kind, "tabular");
}

#[test]
fn test_missing_default_config_is_unreadable() {
    let source = SourceArgs {
        config: Some("/definitely/not/here/cymod.toml".into()),
        ..SourceArgs::default()
    };
    assert!(matches!(
        build_loader(&source),
        Err(CymodError::UnreadableFile { .. })
    ));
}
