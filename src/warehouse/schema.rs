//! Destination schema contract and identifier handling
//!
//! The contract is stored as YAML and lists, per table, the columns a run
//! is allowed to insert into.
//!
//! Example format:
//! ```yaml
//! tables:
//!   sales: [deal_id, deal_date, product_id, market, sale_price, discount, profit]
//!   orders:
//!     - row_id
//!     - deal_id
//!     - customer_id
//!     - order_priority
//! ```

use crate::error::{EtlError, Result, Stage};
use eyre::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

static TABLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").expect("valid regex")
});

/// Table name to ordered column list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaContract {
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<String>>,
}

impl SchemaContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a contract from a YAML file
    pub fn read(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema contract: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse schema contract: {}", path.display()))
    }

    /// Add or replace a table's column list
    pub fn with_table<I, S>(mut self, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables
            .insert(table.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    /// Check that a dataset's columns may be inserted into `table`
    ///
    /// # Errors
    /// Returns a load error if the table is not in the contract or if any
    /// column is not among the table's columns.
    pub fn validate(&self, table: &str, columns: &[String]) -> Result<()> {
        let allowed = self.columns(table).ok_or_else(|| {
            EtlError::load(
                Stage::Load,
                format!("table {} is not in the schema contract", table),
            )
        })?;

        let unknown: Vec<&str> = columns
            .iter()
            .filter(|c| !allowed.contains(*c))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(EtlError::load(
                Stage::Load,
                format!(
                    "columns not present in table {}: {}",
                    table,
                    unknown.join(", ")
                ),
            ));
        }
        Ok(())
    }
}

/// Check a destination table name
///
/// Accepts `table` or `schema.table` made of ASCII letters, digits and
/// underscores. The name is emitted unquoted so the database applies its
/// usual case folding.
pub fn validate_table_name(table: &str) -> Result<()> {
    if TABLE_NAME.is_match(table) {
        Ok(())
    } else {
        Err(EtlError::configuration(
            Stage::Load,
            format!("invalid target table name: {:?}", table),
        ))
    }
}

/// Quote a column name as an SQL identifier
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
