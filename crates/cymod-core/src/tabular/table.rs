//! In-memory row-oriented tables.

use crate::{CymodError, ParamValue};

/// A named, rectangular table of scalar cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<ParamValue>>,
}

/// A borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    cells: &'a [ParamValue],
}

impl Table {
    /// Create an empty table with the given column names.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. It must have exactly one cell per column.
    pub fn push_row(&mut self, cells: Vec<ParamValue>) -> Result<(), CymodError> {
        if cells.len() != self.columns.len() {
            return Err(CymodError::SerializationError(format!(
                "row {} of table '{}' has {} cells, expected {}",
                self.rows.len(),
                self.name,
                cells.len(),
                self.columns.len()
            )));
        }
        self.rows.push(cells);
        Ok(())
    }

    /// Build a table from a JSON array of flat objects.
    ///
    /// Columns are taken from the first record; every record must carry
    /// the same keys.
    pub fn from_json_records(name: impl Into<String>, records: &serde_json::Value) -> Result<Self, CymodError> {
        let name = name.into();
        let records = records.as_array().ok_or_else(|| {
            CymodError::SerializationError(format!("table '{}' must be a JSON array", name))
        })?;

        let columns: Vec<String> = match records.first().and_then(|r| r.as_object()) {
            Some(first) => first.keys().cloned().collect(),
            None => Vec::new(),
        };
        let mut table = Self::new(name, columns);

        for (index, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or_else(|| {
                CymodError::SerializationError(format!("row {} of table '{}' is not an object", index, table.name))
            })?;
            if object.len() != table.columns.len() {
                return Err(CymodError::SerializationError(format!(
                    "row {} of table '{}' has {} cells, expected {}",
                    index,
                    table.name,
                    object.len(),
                    table.columns.len()
                )));
            }

            let mut cells = Vec::with_capacity(table.columns.len());
            for column in &table.columns {
                let value = object.get(column).ok_or_else(|| CymodError::MissingColumn {
                    column: column.clone(),
                    table: table.name.clone(),
                })?;
                let cell = ParamValue::from_json(value).ok_or_else(|| CymodError::UnsupportedValue {
                    key: column.clone(),
                    reason: format!("expected string, number or boolean, found {}", value),
                })?;
                cells.push(cell);
            }
            table.rows.push(cells);
        }

        Ok(table)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row {
            columns: &self.columns,
            cells,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a> Row<'a> {
    /// Cell of the named column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a ParamValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.cells.get(i))
    }

    /// `(column, cell)` pairs in column order.
    pub fn iter(self) -> impl Iterator<Item = (&'a str, &'a ParamValue)> + 'a {
        self.columns.iter().map(String::as_str).zip(self.cells.iter())
    }
}
