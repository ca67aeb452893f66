//! Keyed tables of floating point values.
//!
//! A [`Table`] is a small column store keyed by a string index (congener names or years).
//! Absent values are represented as `NaN`,
//! which is distinct from zero and is written back to disk as an empty field.

use crate::errors::{PcddfError, PcddfResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A named column of a [`Table`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Array1<f64>,
}

/// A collection of named columns sharing a common string index.
///
/// Column order is insertion order and is preserved when the table is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Where the table came from, used in error messages
    source: String,
    index_label: String,
    index: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    /// Create an empty table (no columns) with the given index
    pub fn new(index_label: &str, index: Vec<String>) -> Self {
        Self {
            source: "<memory>".to_string(),
            index_label: index_label.to_string(),
            index,
            columns: vec![],
        }
    }

    /// Label a table with where it was loaded from
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn index_label(&self) -> &str {
        &self.index_label
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Get a column by name if it exists
    pub fn get(&self, name: &str) -> Option<&Array1<f64>> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.values)
    }

    /// Get a column by name
    ///
    /// Fails with [`PcddfError::MissingColumn`] naming the source of the table.
    pub fn column(&self, name: &str) -> PcddfResult<&Array1<f64>> {
        self.get(name).ok_or_else(|| PcddfError::MissingColumn {
            column: name.to_string(),
            table: self.source.clone(),
        })
    }

    /// Value at a given row key and column, if both exist
    pub fn value(&self, key: &str, column: &str) -> Option<f64> {
        let row = self.index.iter().position(|k| k == key)?;
        self.get(column).map(|values| values[row])
    }

    /// Add a column, replacing any existing column of the same name in place
    ///
    /// # Panics
    /// Panics if the number of values does not match the number of rows.
    pub fn insert_column(&mut self, name: &str, values: Array1<f64>) {
        assert_eq!(
            values.len(),
            self.index.len(),
            "column {} must have one value per row",
            name
        );
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
    }

    /// Builder-style variant of [`Table::insert_column`]
    pub fn with_column(mut self, name: &str, values: Array1<f64>) -> Self {
        self.insert_column(name, values);
        self
    }

    /// Keys which are requested but are not present in this table
    pub fn missing_keys(&self, keys: &[String]) -> Vec<String> {
        keys.iter()
            .filter(|k| !self.index.contains(k))
            .cloned()
            .collect()
    }

    /// Conform the table to a new index.
    ///
    /// Rows are reordered to follow `keys`.
    /// Keys which are not present in the table are filled with `NaN` in every column
    /// and rows whose key is not in `keys` are dropped.
    pub fn reindex(&self, keys: &[String]) -> Table {
        let positions: Vec<Option<usize>> = keys
            .iter()
            .map(|k| self.index.iter().position(|existing| existing == k))
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|column| Column {
                name: column.name.clone(),
                values: positions
                    .iter()
                    .map(|p| p.map_or(f64::NAN, |i| column.values[i]))
                    .collect(),
            })
            .collect();

        Table {
            source: self.source.clone(),
            index_label: self.index_label.clone(),
            index: keys.to_vec(),
            columns,
        }
    }
}
