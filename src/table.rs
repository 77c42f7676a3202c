//! Typed columnar table for experiment data.
//!
//! The inference engine needs two things from tabular input: a column as a
//! numeric sequence, and the row split by a binary group indicator. Rows with
//! group key `0`/`false` are the control arm, `1`/`true` the treatment arm.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum Column {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn type_name(&self) -> &'static str {
        match self {
            Column::Float(_) => "float",
            Column::Int(_) => "int",
            Column::Bool(_) => "bool",
        }
    }
}

impl From<Vec<f64>> for Column {
    fn from(v: Vec<f64>) -> Self {
        Column::Float(v)
    }
}

impl From<Vec<i64>> for Column {
    fn from(v: Vec<i64>) -> Self {
        Column::Int(v)
    }
}

impl From<Vec<bool>> for Column {
    fn from(v: Vec<bool>) -> Self {
        Column::Bool(v)
    }
}

/// Ordered set of equally long named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Table {
    columns: IndexMap<String, Column>,
}

/// Row indices of each arm, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPartition {
    pub control: Vec<usize>,
    pub treatment: Vec<usize>,
}

impl GroupPartition {
    /// Split `values` (one per table row) into (control, treatment).
    pub fn split<T: Copy>(&self, values: &[T]) -> (Vec<T>, Vec<T>) {
        let pick = |rows: &[usize]| rows.iter().map(|&i| values[i]).collect::<Vec<T>>();
        (pick(self.control.as_slice()), pick(self.treatment.as_slice()))
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, column)` pairs.
    ///
    /// # Errors
    ///
    /// [`StatsError::ShapeMismatch`] if the columns differ in length,
    /// [`StatsError::InvalidColumn`] on a duplicate name.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, column) in columns {
            table.insert(name, column)?;
        }
        Ok(table)
    }

    /// Parse `{"name": {"type": "float", "values": [...]}, ...}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let columns: IndexMap<String, Column> = serde_json::from_str(json)?;
        Self::from_columns(columns)
    }

    pub fn with_column(mut self, name: impl Into<String>, column: impl Into<Column>) -> Result<Self> {
        self.insert(name, column.into())?;
        Ok(self)
    }

    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(StatsError::InvalidColumn {
                column: name,
                reason: "duplicate column name".to_string(),
            });
        }
        if let Some(rows) = self.num_rows() {
            if column.len() != rows {
                return Err(StatsError::ShapeMismatch {
                    left: rows,
                    right: column.len(),
                });
            }
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Row count, or `None` for a table without columns.
    pub fn num_rows(&self) -> Option<usize> {
        self.columns.values().next().map(Column::len)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| StatsError::ColumnNotFound(name.to_string()))
    }

    /// Select a column as a numeric sequence. Booleans map to 0/1.
    pub fn numeric(&self, name: &str) -> Result<Vec<f64>> {
        let values = match self.column(name)? {
            Column::Float(v) => v.clone(),
            Column::Int(v) => v.iter().map(|&x| x as f64).collect(),
            Column::Bool(v) => v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect(),
        };
        Ok(values)
    }

    /// Select a 0/1 (or boolean) column as booleans.
    ///
    /// # Errors
    ///
    /// [`StatsError::InvalidColumn`] if any value is not 0 or 1.
    pub fn binary(&self, name: &str) -> Result<Vec<bool>> {
        let column = self.column(name)?;
        let not_binary = |row: usize, value: String| StatsError::InvalidColumn {
            column: name.to_string(),
            reason: format!(
                "expected binary {} values (0/1), found {} at row {}",
                column.type_name(),
                value,
                row
            ),
        };
        match column {
            Column::Bool(v) => Ok(v.clone()),
            Column::Int(v) => v
                .iter()
                .enumerate()
                .map(|(row, &x)| match x {
                    0 => Ok(false),
                    1 => Ok(true),
                    other => Err(not_binary(row, other.to_string())),
                })
                .collect(),
            Column::Float(v) => v
                .iter()
                .enumerate()
                .map(|(row, &x)| {
                    if x == 0.0 {
                        Ok(false)
                    } else if x == 1.0 {
                        Ok(true)
                    } else {
                        Err(not_binary(row, x.to_string()))
                    }
                })
                .collect(),
        }
    }

    /// Partition rows by a binary group indicator column.
    pub fn partition(&self, group_column: &str) -> Result<GroupPartition> {
        let keys = self.binary(group_column)?;
        let mut partition = GroupPartition {
            control: Vec::new(),
            treatment: Vec::new(),
        };
        for (row, is_treatment) in keys.into_iter().enumerate() {
            if is_treatment {
                partition.treatment.push(row);
            } else {
                partition.control.push(row);
            }
        }
        Ok(partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table::new()
            .with_column("revenue", vec![1.0, 2.5, 3.0, 0.0, 4.5])
            .unwrap()
            .with_column("clicks", vec![1i64, 0, 3, 2, 1])
            .unwrap()
            .with_column("group", vec![false, true, true, false, true])
            .unwrap()
    }

    #[test]
    fn numeric_converts_all_column_types() {
        let t = sample_table();
        assert_eq!(t.numeric("revenue").unwrap(), vec![1.0, 2.5, 3.0, 0.0, 4.5]);
        assert_eq!(t.numeric("clicks").unwrap(), vec![1.0, 0.0, 3.0, 2.0, 1.0]);
        assert_eq!(t.numeric("group").unwrap(), vec![0.0, 1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn missing_column_is_reported() {
        let err = sample_table().numeric("nope").unwrap_err();
        assert_eq!(err, StatsError::ColumnNotFound("nope".into()));
    }

    #[test]
    fn column_length_mismatch_is_rejected() {
        let err = sample_table()
            .with_column("short", vec![1.0, 2.0])
            .unwrap_err();
        assert_eq!(err, StatsError::ShapeMismatch { left: 5, right: 2 });
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let err = sample_table().with_column("group", vec![1i64; 5]).unwrap_err();
        assert_eq!(err.code(), "invalid_column");
    }

    #[test]
    fn partition_splits_rows_in_order() {
        let t = sample_table();
        let p = t.partition("group").unwrap();
        assert_eq!(p.control, vec![0, 3]);
        assert_eq!(p.treatment, vec![1, 2, 4]);
        let (c, tr) = p.split(&t.numeric("revenue").unwrap());
        assert_eq!(c, vec![1.0, 0.0]);
        assert_eq!(tr, vec![2.5, 3.0, 4.5]);
    }

    #[test]
    fn partition_accepts_int_and_float_indicators() {
        let t = Table::new()
            .with_column("g_int", vec![0i64, 1, 1])
            .unwrap()
            .with_column("g_float", vec![1.0, 0.0, 1.0])
            .unwrap();
        assert_eq!(t.partition("g_int").unwrap().treatment, vec![1, 2]);
        assert_eq!(t.partition("g_float").unwrap().control, vec![1]);
    }

    #[test]
    fn partition_rejects_non_binary_group() {
        let err = sample_table().partition("clicks").unwrap_err();
        match err {
            StatsError::InvalidColumn { column, reason } => {
                assert_eq!(column, "clicks");
                assert!(reason.contains("row 2"), "reason={}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn column_names_keep_insertion_order() {
        let table = sample_table();
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names, vec!["revenue", "clicks", "group"]);
    }

    #[test]
    fn from_json_str_parses_typed_columns() {
        let json = r#"{
            "metric": {"type": "float", "values": [1.5, 2.5]},
            "group": {"type": "int", "values": [0, 1]}
        }"#;
        let t = Table::from_json_str(json).unwrap();
        assert_eq!(t.num_rows(), Some(2));
        assert_eq!(t.partition("group").unwrap().treatment, vec![1]);
    }

    #[test]
    fn from_json_str_rejects_ragged_columns() {
        let json = r#"{
            "metric": {"type": "float", "values": [1.5, 2.5, 3.5]},
            "group": {"type": "bool", "values": [true]}
        }"#;
        assert_eq!(
            Table::from_json_str(json).unwrap_err().code(),
            "shape_mismatch"
        );
    }

    #[test]
    fn empty_table_has_no_rows() {
        assert_eq!(Table::new().num_rows(), None);
    }
}
