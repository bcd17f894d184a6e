//! # Property-Based Tests
//!
//! Determinism and structural invariants of the translator.

use cymod_core::parser::{placeholder_names, split_statements, strip_comments};
use cymod_core::{FileRecord, ParamValue, ParameterSet, Table, TransitionTable, canonical_line};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = ParamValue> {
    prop_oneof![
        any::<bool>().prop_map(ParamValue::from),
        any::<i64>().prop_map(ParamValue::from),
        "[a-zA-Z0-9 _\"\\\\]{0,12}".prop_map(ParamValue::from),
    ]
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// N terminated fragments split into exactly N statements.
    #[test]
    fn split_count_matches_fragments(
        fragments in vec("[A-Za-z (){}:]{1,20}", 1..10)
    ) {
        let fragments: Vec<String> = fragments
            .into_iter()
            .filter(|f| !f.trim().is_empty())
            .collect();
        let body: String = fragments.iter().map(|f| format!("{};", f)).collect();

        let statements = split_statements(&body);
        prop_assert_eq!(statements.len(), fragments.len());
        for statement in &statements {
            prop_assert!(statement.ends_with(';'));
        }
    }

    /// Full-line comments contribute nothing to the processed text.
    #[test]
    fn comment_lines_vanish(comment in "[a-zA-Z0-9 ;{}$]{0,30}") {
        let text = format!("// {}\nMATCH (n);", comment);
        let stripped = strip_comments(&text);
        prop_assert_eq!(stripped.trim(), "MATCH (n);");
    }

    /// Priority is extracted and removed from the exposed parameters.
    #[test]
    fn priority_is_extracted(priority in -1000i64..1000, key in "[a-z]{1,8}") {
        prop_assume!(key != "priority");
        let text = format!("{{\"priority\": {}, \"{}\": 1}} MATCH (n);", priority, key);
        let record = FileRecord::from_text("p.cql", &text).expect("parse");

        prop_assert_eq!(record.explicit_priority(), Some(priority));
        let params = record.parameters().expect("params");
        prop_assert!(!params.contains_key("priority"));
        prop_assert!(params.contains_key(&key));
    }

    /// Every placeholder name is reported once, in first-seen order.
    #[test]
    fn placeholder_names_are_unique(names in vec("[a-z]{1,6}", 1..8)) {
        let statement: String = names.iter().map(|n| format!("${} ", n)).collect();
        let found = placeholder_names(&statement);

        let mut expected: Vec<&str> = Vec::new();
        for name in &names {
            if !expected.contains(&name.as_str()) {
                expected.push(name);
            }
        }
        prop_assert_eq!(found, expected);
    }

    /// Condition properties come out in key order whatever the column order.
    #[test]
    fn tabular_output_ignores_column_order(
        conditions in btree_map("c[a-z]{1,6}", scalar(), 1..6)
    ) {
        let mut entries: Vec<(String, ParamValue)> = conditions.into_iter().collect();

        let build = |entries: &[(String, ParamValue)]| {
            let mut columns = vec!["start".to_string(), "end".to_string()];
            columns.extend(entries.iter().map(|(k, _)| k.clone()));
            let mut cells = vec![ParamValue::from("s1"), ParamValue::from("s2")];
            cells.extend(entries.iter().map(|(_, v)| v.clone()));

            let mut table = Table::new("t", columns);
            table.push_row(cells).expect("row");
            let transitions = TransitionTable::new(table, "start", "end").expect("columns");
            transitions
                .iter_queries()
                .map(|q| canonical_line(&q))
                .collect::<Vec<_>>()
        };

        let forward = build(&entries);
        entries.reverse();
        let backward = build(&entries);
        prop_assert_eq!(forward, backward);
    }

    /// Global properties are appended to all four node patterns.
    #[test]
    fn globals_reach_all_nodes(globals in btree_map("g[a-z]{1,6}", scalar(), 1..4)) {
        let globals: ParameterSet = globals.into_iter().collect();
        let mut table = Table::new("t", ["start", "end", "cond"]);
        table
            .push_row(vec!["a".into(), "b".into(), "x".into()])
            .expect("row");
        let transitions = TransitionTable::new(table, "start", "end")
            .expect("columns")
            .with_global_params(globals.clone());
        let statement = transitions.iter_queries().next().expect("query").statement;

        let rendered: Vec<String> = globals
            .iter()
            .map(|(k, v)| format!("{}:{}", k, v.literal()))
            .collect();
        let needle = format!("{}}}", rendered.join(", "));
        prop_assert_eq!(statement.matches(&needle).count(), 4);
    }
}
