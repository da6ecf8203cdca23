//! Tabular result decoded from API JSON.
//!
//! Every read endpoint answers with rows of a flat shape. A [`Table`] keeps
//! them untyped (`serde_json::Value` cells) with an ordered column list, so
//! that arbitrary custom-query answers fit the same structure as the
//! per-country listings.

use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Errors building or normalising a table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("cannot build a table from a JSON {0}")]
    UnsupportedShape(&'static str),

    #[error("column '{column}' has {found} values, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("column '{column}' holds a non-numeric value: {value}")]
    NotNumeric { column: String, value: String },
}

/// Ordered rows with named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. Missing trailing cells are filled with null, extra cells dropped.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Build a table from a decoded JSON body.
    ///
    /// - array of objects: one row per element, columns are the union of keys
    ///   in first-seen order
    /// - array of scalars: a single column named `0`
    /// - object of arrays: one column per key, scalars broadcast
    /// - object of objects: one column per outer key, one row per inner key
    /// - object of scalars: a single row
    pub fn from_json(value: Value) -> Result<Self, TableError> {
        match value {
            Value::Array(items) => Self::from_array(items),
            Value::Object(obj) => Self::from_object(obj),
            Value::Null => Err(TableError::UnsupportedShape("null")),
            Value::Bool(_) => Err(TableError::UnsupportedShape("boolean")),
            Value::Number(_) => Err(TableError::UnsupportedShape("number")),
            Value::String(_) => Err(TableError::UnsupportedShape("string")),
        }
    }

    fn from_array(items: Vec<Value>) -> Result<Self, TableError> {
        if items.is_empty() {
            return Ok(Self::default());
        }

        if items.iter().all(Value::is_object) {
            let mut columns: Vec<String> = Vec::new();
            for item in &items {
                if let Value::Object(obj) = item {
                    for key in obj.keys() {
                        if !columns.contains(key) {
                            columns.push(key.clone());
                        }
                    }
                }
            }
            let mut table = Self::new(columns);
            for item in items {
                if let Value::Object(mut obj) = item {
                    let row = table
                        .columns
                        .iter()
                        .map(|c| obj.remove(c).unwrap_or(Value::Null))
                        .collect();
                    table.rows.push(row);
                }
            }
            return Ok(table);
        }

        if items.iter().any(Value::is_object) {
            return Err(TableError::UnsupportedShape("array mixing objects and scalars"));
        }

        let mut table = Self::new(vec!["0".to_string()]);
        for item in items {
            table.rows.push(vec![item]);
        }
        Ok(table)
    }

    fn from_object(obj: Map<String, Value>) -> Result<Self, TableError> {
        if obj.is_empty() {
            return Ok(Self::default());
        }

        let columns: Vec<String> = obj.keys().cloned().collect();

        if obj.values().any(Value::is_array) {
            let expected = obj
                .values()
                .find_map(|v| v.as_array().map(Vec::len))
                .unwrap_or(0);
            for (column, value) in &obj {
                if let Value::Array(values) = value {
                    if values.len() != expected {
                        return Err(TableError::RaggedColumns {
                            column: column.clone(),
                            expected,
                            found: values.len(),
                        });
                    }
                }
            }
            let mut table = Self::new(columns);
            for idx in 0..expected {
                let row = obj
                    .values()
                    .map(|v| match v {
                        Value::Array(values) => values[idx].clone(),
                        scalar => scalar.clone(),
                    })
                    .collect();
                table.rows.push(row);
            }
            return Ok(table);
        }

        if obj.values().all(Value::is_object) {
            let mut index: Vec<String> = Vec::new();
            for value in obj.values() {
                if let Value::Object(inner) = value {
                    for key in inner.keys() {
                        if !index.contains(key) {
                            index.push(key.clone());
                        }
                    }
                }
            }
            let mut table = Self::new(columns);
            for key in &index {
                let row = obj
                    .values()
                    .map(|v| v.get(key).cloned().unwrap_or(Value::Null))
                    .collect();
                table.rows.push(row);
            }
            return Ok(table);
        }

        if obj.values().any(Value::is_object) {
            return Err(TableError::UnsupportedShape("object mixing objects and scalars"));
        }

        let mut table = Self::new(columns);
        table.rows.push(obj.into_iter().map(|(_, v)| v).collect());
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell of `row` in column `name`; `None` if either is out of range.
    pub fn cell(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// All values of a column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Numeric values of a column, skipping nulls and non-numeric cells.
    pub fn numeric_column(&self, name: &str) -> Vec<f64> {
        self.column(name)
            .unwrap_or_default()
            .into_iter()
            .filter_map(numeric_value)
            .collect()
    }

    /// Distinct values of a column in first-seen order.
    pub fn unique(&self, name: &str) -> Vec<Value> {
        let mut seen: Vec<Value> = Vec::new();
        for value in self.column(name).unwrap_or_default() {
            if !seen.contains(value) {
                seen.push(value.clone());
            }
        }
        seen
    }

    /// Coerce a column to floating point.
    ///
    /// Skipped when the column is absent or holds only nulls, so an empty
    /// listing never fails the conversion. Nulls stay null.
    pub fn coerce_float(&mut self, name: &str) -> Result<(), TableError> {
        let Some(idx) = self.column_index(name) else {
            return Ok(());
        };
        if self.rows.iter().all(|r| r[idx].is_null()) {
            return Ok(());
        }
        for row in &mut self.rows {
            let cell = &mut row[idx];
            if cell.is_null() {
                continue;
            }
            let float = match &*cell {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                _ => None,
            };
            let number = float.and_then(Number::from_f64).ok_or_else(|| TableError::NotNumeric {
                column: name.to_string(),
                value: cell.to_string(),
            })?;
            *cell = Value::Number(number);
        }
        Ok(())
    }

    /// Rows at the given indices, in the order given.
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Projection onto the named columns, in the order given. Unknown names are skipped.
    pub fn select_columns(&self, names: &[String]) -> Self {
        let picked: Vec<(String, usize)> = names
            .iter()
            .filter_map(|n| self.column_index(n).map(|i| (n.clone(), i)))
            .collect();
        Self {
            columns: picked.iter().map(|(n, _)| n.clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| picked.iter().map(|(_, i)| r[*i].clone()).collect())
                .collect(),
        }
    }
}

/// Numeric reading of a cell: numbers, and strings holding a number.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Text of a cell as shown in tables and used as a selection key.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
