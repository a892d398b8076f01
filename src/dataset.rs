//! Tabular dataset handed between stages
//!
//! Rows are positional: every row holds one [`Value`] per column, in the
//! dataset's column order. The order of rows and columns is never changed
//! by any stage.

use serde::{Deserialize, Serialize};

/// A single cell
///
/// `Null` is the canonical null: after the transform stage it is the only
/// representation of a missing value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// Per-column facts derived once during transform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// At least one non-null value, and every non-null value is an integer
    pub integral: bool,
}

/// Ordered rows sharing one fixed column order
///
/// Deserializing runs the same checks as [`Dataset::new`], and also
/// requires any descriptors to name the columns in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    descriptors: Vec<ColumnDescriptor>,
}

/// Unchecked wire form of a [`Dataset`]
#[derive(Deserialize)]
struct RawDataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    #[serde(default)]
    descriptors: Vec<ColumnDescriptor>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = String;

    fn try_from(raw: RawDataset) -> Result<Self, Self::Error> {
        let mut dataset = Self::new(raw.columns, raw.rows)?;
        dataset.descriptors = raw.descriptors;

        if !dataset.descriptors.is_empty() && !dataset.is_described() {
            return Err(format!(
                "descriptors {:?} do not match columns {:?}",
                dataset
                    .descriptors
                    .iter()
                    .map(|d| d.name.as_str())
                    .collect::<Vec<_>>(),
                dataset.columns
            ));
        }
        Ok(dataset)
    }
}

impl Dataset {
    /// Build a dataset, rejecting rows whose width differs from the header
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, String> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(format!(
                "row {} has {} values but the header has {} columns",
                index + 1,
                row.len(),
                columns.len()
            ));
        }

        Ok(Self {
            columns,
            rows,
            descriptors: Vec::new(),
        })
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

    /// Column descriptors; empty until the dataset has been transformed
    pub fn descriptors(&self) -> &[ColumnDescriptor] {
        &self.descriptors
    }

    pub fn is_described(&self) -> bool {
        self.descriptors.len() == self.columns.len()
            && self
                .descriptors
                .iter()
                .zip(&self.columns)
                .all(|(d, c)| &d.name == c)
    }

    /// Iterate one column's values in row order
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Look up a cell by row position and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|r| &r[index])
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<String> {
        // Renaming invalidates descriptors computed for the old names
        self.descriptors.clear();
        &mut self.columns
    }

    pub(crate) fn column_values_mut(&mut self, index: usize) -> impl Iterator<Item = &mut Value> {
        self.rows.iter_mut().map(move |row| &mut row[index])
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.rows.iter_mut().flat_map(|row| row.iter_mut())
    }

    pub(crate) fn set_descriptors(&mut self, descriptors: Vec<ColumnDescriptor>) {
        self.descriptors = descriptors;
    }
}
