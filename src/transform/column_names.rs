//! Column name normalizer
//!
//! Makes header names usable as destination column names.

use crate::dataset::Dataset;
use crate::error::{EtlError, Result, Stage};
use crate::etl::Transformer;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s").expect("valid regex"));

/// Normalize a single column name
///
/// Trims, lowercases, then replaces every remaining whitespace character
/// with `_`. Applying it twice gives the same result as applying it once.
///
/// ```
/// use tabload::transform::normalize_column_name;
///
/// assert_eq!(normalize_column_name("  Sale Price "), "sale_price");
/// assert_eq!(normalize_column_name("sale_price"), "sale_price");
/// ```
pub fn normalize_column_name(name: &str) -> String {
    WHITESPACE
        .replace_all(&name.trim().to_lowercase(), "_")
        .into_owned()
}

/// Transformer that renames every column to its normalized form
///
/// Fails if a name normalizes to nothing or if two names collapse into one.
#[derive(Debug, Default, Clone, Copy)]
pub struct ColumnNameNormalizer;

impl ColumnNameNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for ColumnNameNormalizer {
    fn transform(&self, mut input: Dataset) -> Result<Dataset> {
        let normalized: Vec<String> = input
            .columns()
            .iter()
            .map(|c| normalize_column_name(c))
            .collect();

        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (original, name) in input.columns().iter().zip(&normalized) {
            if name.is_empty() {
                return Err(EtlError::configuration(
                    Stage::Transform,
                    format!("column {:?} has an empty name after normalization", original),
                ));
            }
            if let Some(previous) = seen.insert(name.as_str(), original.as_str()) {
                return Err(EtlError::configuration(
                    Stage::Transform,
                    format!(
                        "columns {:?} and {:?} both normalize to {:?}",
                        previous, original, name
                    ),
                ));
            }
        }

        *input.columns_mut() = normalized;
        Ok(input)
    }
}
