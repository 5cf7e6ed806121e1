//! In-memory table
//!
//! A `DataFrame` is an ordered set of rows addressed two ways: by position
//! (for pagination windows) and by integer label (for record lookups).
//! Cells are JSON values; a missing cell is `null`.

use std::collections::HashSet;
use std::ops::Range;

use serde_json::{Map, Value};
use thiserror::Error;

/// Row label
pub type Label = i64;

/// Column name used for the row label in the split orientation
pub const INDEX_COLUMN: &str = "index";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameError {
    #[error("row {row} has {actual} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("index has {index} labels but there are {rows} rows")]
    IndexLength { index: usize, rows: usize },

    #[error("duplicate row label {0}")]
    DuplicateLabel(Label),

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("row label {0} not found")]
    LabelNotFound(Label),

    #[error("arrays must all be same length")]
    RaggedColumns,

    #[error("invalid row label '{0}'")]
    InvalidLabel(String),

    #[error("{0}")]
    Shape(String),

    #[error("no row labels left after {0}")]
    LabelsExhausted(Label),
}

pub type FrameResult<T> = Result<T, FrameError>;

/// Ordered, labelled rows of JSON cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    columns: Vec<String>,
    index: Vec<Label>,
    rows: Vec<Vec<Value>>,
}

impl DataFrame {
    /// Build a frame, checking that labels and columns are unique and every
    /// row is as wide as the column list.
    pub fn new(columns: Vec<String>, index: Vec<Label>, rows: Vec<Vec<Value>>) -> FrameResult<Self> {
        if index.len() != rows.len() {
            return Err(FrameError::IndexLength {
                index: index.len(),
                rows: rows.len(),
            });
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(FrameError::DuplicateColumn(column.clone()));
            }
        }

        let mut labels = HashSet::with_capacity(index.len());
        for label in &index {
            if !labels.insert(*label) {
                return Err(FrameError::DuplicateLabel(*label));
            }
        }

        for (row, values) in rows.iter().enumerate() {
            if values.len() != columns.len() {
                return Err(FrameError::RowWidth {
                    row,
                    expected: columns.len(),
                    actual: values.len(),
                });
            }
        }

        Ok(Self { columns, index, rows })
    }

    /// Frame with labels `0..rows.len()`
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> FrameResult<Self> {
        let index = (0..rows.len() as Label).collect();
        Self::new(columns, index, rows)
    }

    /// Empty frame with the given columns
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            index: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> &[Label] {
        &self.index
    }

    pub fn rows(&self) -> impl Iterator<Item = (Label, &[Value])> {
        self.index
            .iter()
            .copied()
            .zip(self.rows.iter().map(Vec::as_slice))
    }

    fn position(&self, label: Label) -> Option<usize> {
        self.index.iter().position(|l| *l == label)
    }

    fn column_position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn contains_label(&self, label: Label) -> bool {
        self.position(label).is_some()
    }

    /// Cell value by label and column name
    pub fn get(&self, label: Label, column: &str) -> Option<&Value> {
        let row = self.position(label)?;
        let col = self.column_position(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Rows at positions `range`, clamped to the frame length
    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Self {
            columns: self.columns.clone(),
            index: self.index[start..end].to_vec(),
            rows: self.rows[start..end].to_vec(),
        }
    }

    /// Single-row frame for `label`
    pub fn loc(&self, label: Label) -> Option<Self> {
        let row = self.position(label)?;
        Some(self.slice(row..row + 1))
    }

    /// Rows of `self` followed by rows of `other`.
    ///
    /// Columns are the union of both, in `self`'s order first. Labels are kept
    /// and must not collide.
    pub fn append(&self, other: &DataFrame) -> FrameResult<Self> {
        for label in &other.index {
            if self.contains_label(*label) {
                return Err(FrameError::DuplicateLabel(*label));
            }
        }
        self.concat(other, other.index.clone())
    }

    /// Like [`append`](Self::append), but rows of `other` get fresh labels
    /// following the current maximum.
    pub fn append_relabeled(&self, other: &DataFrame) -> FrameResult<Self> {
        let start = self.next_label()?;
        let labels = (0..other.len() as Label)
            .map(|i| start.checked_add(i).ok_or(FrameError::LabelsExhausted(Label::MAX)))
            .collect::<FrameResult<_>>()?;
        self.concat(other, labels)
    }

    pub fn next_label(&self) -> FrameResult<Label> {
        match self.index.iter().max() {
            Some(&max) => max.checked_add(1).ok_or(FrameError::LabelsExhausted(max)),
            None => Ok(0),
        }
    }

    fn concat(&self, other: &DataFrame, other_labels: Vec<Label>) -> FrameResult<Self> {
        let mut columns = self.columns.clone();
        for column in &other.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }

        let widen = |frame: &DataFrame, row: &[Value]| -> Vec<Value> {
            columns
                .iter()
                .map(|c| {
                    frame
                        .column_position(c)
                        .and_then(|i| row.get(i).cloned())
                        .unwrap_or(Value::Null)
                })
                .collect()
        };

        let mut rows: Vec<Vec<Value>> = self.rows.iter().map(|r| widen(self, r)).collect();
        rows.extend(other.rows.iter().map(|r| widen(other, r)));

        let mut index = self.index.clone();
        index.extend(other_labels);

        Self::new(columns, index, rows)
    }

    /// Frame without the rows labelled `labels`
    pub fn drop(&self, labels: &[Label]) -> FrameResult<Self> {
        if let Some(missing) = labels.iter().find(|l| !self.contains_label(**l)) {
            return Err(FrameError::LabelNotFound(*missing));
        }

        let (index, rows) = self
            .index
            .iter()
            .zip(&self.rows)
            .filter(|(label, _)| !labels.contains(*label))
            .map(|(label, row)| (*label, row.clone()))
            .unzip();

        Ok(Self {
            columns: self.columns.clone(),
            index,
            rows,
        })
    }

    /// Write the first row of `values` into row `label`.
    ///
    /// Only the columns present in `values` change. Columns the table does
    /// not have yet are added, `null` in every other row.
    pub fn update_row(&mut self, label: Label, values: &DataFrame) -> FrameResult<()> {
        let row = self.position(label).ok_or(FrameError::LabelNotFound(label))?;
        let Some(source) = values.rows.first() else {
            return Ok(());
        };

        for (column, value) in values.columns.iter().zip(source) {
            let col = match self.column_position(column) {
                Some(col) => col,
                None => {
                    self.columns.push(column.clone());
                    for r in &mut self.rows {
                        r.push(Value::Null);
                    }
                    self.columns.len() - 1
                }
            };
            self.rows[row][col] = value.clone();
        }
        Ok(())
    }

    /// Keep only rows for which `keep` returns true
    pub fn filter<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(Label, &[Value]) -> bool,
    {
        let (index, rows) = self
            .index
            .iter()
            .zip(&self.rows)
            .filter(|(label, row)| keep(**label, row))
            .map(|(label, row)| (*label, row.clone()))
            .unzip();

        Self {
            columns: self.columns.clone(),
            index,
            rows,
        }
    }

    fn record(&self, row: &[Value]) -> Map<String, Value> {
        self.columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect()
    }

    // ── Dict conversions ───────────────────────────────────────

    /// `[{column: value}, ...]`
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| Value::Object(self.record(row)))
            .collect()
    }

    /// `{column: [value, ...]}`
    pub fn to_columns(&self) -> Map<String, Value> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let values = self.rows.iter().map(|row| row[i].clone()).collect();
                (column.clone(), Value::Array(values))
            })
            .collect()
    }

    /// `{"label": {column: value}}`
    pub fn to_index(&self) -> Map<String, Value> {
        self.rows()
            .map(|(label, row)| (label.to_string(), Value::Object(self.record(row))))
            .collect()
    }

    /// Column names led by `"index"` and rows led by their label
    pub fn to_split(&self) -> (Vec<String>, Vec<Vec<Value>>) {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(INDEX_COLUMN.to_string());
        columns.extend(self.columns.iter().cloned());

        let data = self
            .rows()
            .map(|(label, row)| {
                let mut values = Vec::with_capacity(row.len() + 1);
                values.push(Value::from(label));
                values.extend(row.iter().cloned());
                values
            })
            .collect();

        (columns, data)
    }

    /// Inverse of [`to_columns`](Self::to_columns).
    ///
    /// Each column is either an array (positional, labels `0..n`) or an object
    /// keyed by label. Arrays must all have the same length.
    pub fn from_columns(data: &Map<String, Value>) -> FrameResult<Self> {
        let columns: Vec<String> = data.keys().cloned().collect();
        if columns.is_empty() {
            return Ok(Self::default());
        }

        let keyed = data.values().any(Value::is_object);
        if keyed {
            return Self::from_keyed_columns(data);
        }

        let mut height = None;
        let mut arrays = Vec::with_capacity(columns.len());
        for value in data.values() {
            let Value::Array(values) = value else {
                return Err(FrameError::Shape(
                    "If using all scalar values, you must pass an index".to_string(),
                ));
            };
            match height {
                None => height = Some(values.len()),
                Some(h) if h != values.len() => return Err(FrameError::RaggedColumns),
                Some(_) => {}
            }
            arrays.push(values);
        }

        let height = height.unwrap_or(0);
        let rows = (0..height)
            .map(|r| arrays.iter().map(|values| values[r].clone()).collect())
            .collect();
        Self::from_rows(columns, rows)
    }

    fn from_keyed_columns(data: &Map<String, Value>) -> FrameResult<Self> {
        let mut labels: Vec<Label> = Vec::new();
        for value in data.values() {
            let Value::Object(cells) = value else {
                return Err(FrameError::Shape(
                    "mixing dicts with non-Series may lead to ambiguous ordering".to_string(),
                ));
            };
            for key in cells.keys() {
                let label = parse_label(key)?;
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
        }

        let columns: Vec<String> = data.keys().cloned().collect();
        let rows = labels
            .iter()
            .map(|label| {
                data.values()
                    .map(|value| {
                        value
                            .get(label.to_string())
                            .cloned()
                            .unwrap_or(Value::Null)
                    })
                    .collect()
            })
            .collect();
        Self::new(columns, labels, rows)
    }

    /// Inverse of [`to_index`](Self::to_index); keys must parse as integers
    pub fn from_index(data: &Map<String, Value>) -> FrameResult<Self> {
        let mut columns: Vec<String> = Vec::new();
        let mut index = Vec::with_capacity(data.len());
        for (key, record) in data {
            index.push(parse_label(key)?);
            let Value::Object(record) = record else {
                return Err(FrameError::Shape(format!(
                    "row '{}' must be an object of column values",
                    key
                )));
            };
            for column in record.keys() {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let rows = data
            .values()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self::new(columns, index, rows)
    }

    /// Inverse of [`to_split`](Self::to_split); one column must be `"index"`
    pub fn from_split(columns: &[String], data: &[Vec<Value>]) -> FrameResult<Self> {
        let label_col = columns
            .iter()
            .position(|c| c == INDEX_COLUMN)
            .ok_or_else(|| FrameError::Shape(format!("'{}' column is required", INDEX_COLUMN)))?;

        let value_columns: Vec<String> = columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != label_col)
            .map(|(_, c)| c.clone())
            .collect();

        let mut index = Vec::with_capacity(data.len());
        let mut rows = Vec::with_capacity(data.len());
        for (r, values) in data.iter().enumerate() {
            if values.len() != columns.len() {
                return Err(FrameError::RowWidth {
                    row: r,
                    expected: columns.len(),
                    actual: values.len(),
                });
            }
            index.push(label_value(&values[label_col])?);
            rows.push(
                values
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != label_col)
                    .map(|(_, v)| v.clone())
                    .collect(),
            );
        }

        Self::new(value_columns, index, rows)
    }
}

/// Parse a row label from a URL segment or object key
pub fn parse_label(raw: &str) -> FrameResult<Label> {
    raw.trim()
        .parse()
        .map_err(|_| FrameError::InvalidLabel(raw.to_string()))
}

fn label_value(value: &Value) -> FrameResult<Label> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| FrameError::InvalidLabel(n.to_string())),
        Value::String(s) => parse_label(s),
        other => Err(FrameError::InvalidLabel(other.to_string())),
    }
}
