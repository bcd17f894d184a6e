//! # Tabular Generation Module
//!
//! Turns a transition table into one `MERGE` statement per row.
//!
//! Each row describes a transition from a start state to an end state
//! caused by a condition:
//!
//! ```text
//! MERGE (start:State {code:"s1"}) MERGE (end:State {code:"s2"})
//! MERGE (start)<-[:SOURCE]-(trans:Transition)-[:TARGET]->(end)
//! MERGE (cond:Condition {..})-[:CAUSES]->(trans);
//! ```
//!
//! Output is a pure function of the table: condition properties are sorted
//! by key and global properties are appended in key order to every node.

mod labels;
mod table;

pub use labels::CustomLabels;
pub use table::{Row, Table};

use crate::canonical::node_pattern;
use crate::primitives::{
    CAUSES_RELATIONSHIP, SOURCE_RELATIONSHIP, STATE_CODE_PROPERTY, STATEMENT_TERMINATOR,
    TARGET_RELATIONSHIP,
};
use crate::{CymodError, ParamValue, ParameterSet, Query, QuerySource};

/// A table bound to its start/end state columns.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    table: Table,
    start_col: String,
    end_col: String,
    labels: CustomLabels,
    global_params: Option<ParameterSet>,
}

impl TransitionTable {
    /// Bind `table` to its state columns.
    ///
    /// Returns `CymodError::MissingColumn` if either column is absent.
    pub fn new(
        table: Table,
        start_col: impl Into<String>,
        end_col: impl Into<String>,
    ) -> Result<Self, CymodError> {
        let start_col = start_col.into();
        let end_col = end_col.into();

        for column in [&start_col, &end_col] {
            if !table.has_column(column) {
                return Err(CymodError::MissingColumn {
                    column: column.clone(),
                    table: table.name().to_string(),
                });
            }
        }

        Ok(Self {
            table,
            start_col,
            end_col,
            labels: CustomLabels::default(),
            global_params: None,
        })
    }

    #[must_use]
    pub fn with_labels(mut self, labels: CustomLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Properties added to every node of every generated statement.
    ///
    /// An empty set is treated as absent.
    #[must_use]
    pub fn with_global_params(mut self, params: ParameterSet) -> Self {
        self.global_params = (!params.is_empty()).then_some(params);
        self
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn labels(&self) -> &CustomLabels {
        &self.labels
    }

    /// Number of statements this table generates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Generated statements, one per row, in row order.
    pub fn iter_queries(&self) -> impl Iterator<Item = Query> + '_ {
        self.table.rows().enumerate().map(move |(index, row)| {
            Query::new(
                self.statement_for(row),
                None,
                QuerySource::tabular(self.table.name(), index),
            )
        })
    }

    fn statement_for(&self, row: Row<'_>) -> String {
        let globals: Vec<(&str, &ParamValue)> = self
            .global_params
            .iter()
            .flat_map(ParameterSet::iter)
            .collect();

        let state_node = |variable: &str, column: &str| {
            let code = row.get(column).map(|value| (STATE_CODE_PROPERTY, value));
            node_pattern(
                variable,
                self.labels.state(),
                code.into_iter().chain(globals.iter().copied()),
            )
        };

        let mut conditions: Vec<(&str, &ParamValue)> = row
            .iter()
            .filter(|(column, _)| *column != self.start_col && *column != self.end_col)
            .collect();
        conditions.sort_by(|a, b| a.0.cmp(b.0));

        let start = state_node("start", &self.start_col);
        let end = state_node("end", &self.end_col);
        let transition = node_pattern("trans", self.labels.transition(), globals.iter().copied());
        let condition = node_pattern(
            "cond",
            self.labels.condition(),
            conditions.into_iter().chain(globals.iter().copied()),
        );

        format!(
            "MERGE {start} MERGE {end} MERGE (start)<-[:{source}]-{transition}-[:{target}]->(end) \
             MERGE {condition}-[:{causes}]->(trans){terminator}",
            source = SOURCE_RELATIONSHIP,
            target = TARGET_RELATIONSHIP,
            causes = CAUSES_RELATIONSHIP,
            terminator = STATEMENT_TERMINATOR,
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::SourceKind;

    fn demo_table() -> Table {
        let mut table = Table::new("demo", ["start", "end", "cond"]);
        table
            .push_row(vec!["state1".into(), "state2".into(), "low".into()])
            .unwrap();
        table
            .push_row(vec!["state2".into(), "state3".into(), "high".into()])
            .unwrap();
        table
    }

    #[test]
    fn missing_state_column_rejected() {
        let result = TransitionTable::new(demo_table(), "start", "finish");
        assert!(matches!(result, Err(CymodError::MissingColumn { column, .. }) if column == "finish"));
    }

    #[test]
    fn row_generates_transition_pattern() {
        let tt = TransitionTable::new(demo_table(), "start", "end").unwrap();
        let first = tt.iter_queries().next().unwrap();
        assert_eq!(
            first.statement,
            "MERGE (start:State {code:\"state1\"}) MERGE (end:State {code:\"state2\"}) \
             MERGE (start)<-[:SOURCE]-(trans:Transition)-[:TARGET]->(end) \
             MERGE (cond:Condition {cond:\"low\"})-[:CAUSES]->(trans);"
        );
        assert!(first.params.is_none());
        assert_eq!(first.source.kind(), SourceKind::Tabular);
        assert_eq!(first.source.reference(), "demo");
        assert_eq!(first.source.index(), 0);
    }

    #[test]
    fn one_query_per_row_in_order() {
        let tt = TransitionTable::new(demo_table(), "start", "end").unwrap();
        let indices: Vec<usize> = tt.iter_queries().map(|q| q.source.index()).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn condition_properties_sorted_by_key() {
        let mut table = Table::new("t", ["cond2", "start", "cond1", "end", "cond3"]);
        table
            .push_row(vec![
                3.into(),
                "a".into(),
                "high".into(),
                "b".into(),
                false.into(),
            ])
            .unwrap();
        let tt = TransitionTable::new(table, "start", "end").unwrap();
        let statement = tt.iter_queries().next().unwrap().statement;
        assert!(statement.contains("(cond:Condition {cond1:\"high\", cond2:3, cond3:false})"));
    }

    #[test]
    fn global_params_reach_every_node() {
        let globals: ParameterSet = [("project", ParamValue::from("gredos")), ("model", 2.into())]
            .into_iter()
            .collect();
        let tt = TransitionTable::new(demo_table(), "start", "end")
            .unwrap()
            .with_global_params(globals);
        let statement = tt.iter_queries().next().unwrap().statement;

        assert!(statement.contains("(start:State {code:\"state1\", model:2, project:\"gredos\"})"));
        assert!(statement.contains("(end:State {code:\"state2\", model:2, project:\"gredos\"})"));
        assert!(statement.contains("(trans:Transition {model:2, project:\"gredos\"})"));
        assert!(statement.contains("(cond:Condition {cond:\"low\", model:2, project:\"gredos\"})"));
    }

    #[test]
    fn custom_labels_used() {
        let labels = CustomLabels::from_overrides([("State", "LandCover"), ("Condition", "Cause")]).unwrap();
        let tt = TransitionTable::new(demo_table(), "start", "end")
            .unwrap()
            .with_labels(labels);
        let statement = tt.iter_queries().next().unwrap().statement;
        assert!(statement.starts_with("MERGE (start:LandCover {code:\"state1\"})"));
        assert!(statement.contains("(trans:Transition)"));
        assert!(statement.contains("(cond:Cause {cond:\"low\"})"));
    }

    #[test]
    fn output_is_deterministic() {
        let tt = TransitionTable::new(demo_table(), "start", "end").unwrap();
        let a: Vec<String> = tt.iter_queries().map(|q| q.statement).collect();
        let b: Vec<String> = tt.iter_queries().map(|q| q.statement).collect();
        assert_eq!(a, b);
    }
}
