//! Null canonicalizer
//!
//! Collapses every spelling of a missing value into [`Value::Null`].

use crate::config::DEFAULT_NULL_MARKERS;
use crate::dataset::{Dataset, Value};
use crate::error::Result;
use crate::etl::Transformer;
use std::collections::HashSet;

/// Transformer that replaces missing-value spellings with the canonical null
///
/// A cell becomes [`Value::Null`] when it is:
/// - an empty string
/// - one of the configured null markers (exact match)
/// - a not-a-number marker (`nan` or `-nan`, any case, surrounding
///   whitespace ignored)
/// - a floating point NaN
///
/// # Example
/// ```
/// use tabload::dataset::{Dataset, Value};
/// use tabload::etl::Transformer;
/// use tabload::transform::NullCanonicalizer;
///
/// let input = Dataset::new(
///     vec!["price".into()],
///     vec![vec![Value::from("NaN")], vec![Value::from("")], vec![Value::from("7")]],
/// )
/// .unwrap();
///
/// let output = NullCanonicalizer::default().transform(input).unwrap();
/// assert!(output.get(0, "price").unwrap().is_null());
/// assert!(output.get(1, "price").unwrap().is_null());
/// assert_eq!(output.get(2, "price"), Some(&Value::from("7")));
/// ```
#[derive(Debug, Clone)]
pub struct NullCanonicalizer {
    markers: HashSet<String>,
}

impl NullCanonicalizer {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a cell spells a missing value
    pub fn is_missing(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            Value::Text(s) => s.is_empty() || self.markers.contains(s) || is_nan_marker(s),
            Value::Integer(_) => false,
        }
    }
}

impl Default for NullCanonicalizer {
    fn default() -> Self {
        Self::new(DEFAULT_NULL_MARKERS.iter().copied())
    }
}

fn is_nan_marker(s: &str) -> bool {
    let s = s.trim();
    let s = s.strip_prefix('-').unwrap_or(s);
    s.eq_ignore_ascii_case("nan")
}

impl Transformer for NullCanonicalizer {
    fn transform(&self, mut input: Dataset) -> Result<Dataset> {
        let mut replaced = 0usize;
        for value in input.values_mut() {
            if !value.is_null() && self.is_missing(value) {
                *value = Value::Null;
                replaced += 1;
            }
        }
        log::debug!("Canonicalized {} missing values", replaced);
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: Vec<Value>) -> Dataset {
        Dataset::new(
            vec!["v".into()],
            values.into_iter().map(|v| vec![v]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_every_missing_spelling_becomes_null() {
        let input = column(vec![
            Value::from(""),
            Value::from("NULL"),
            Value::from("NaN"),
            Value::from("nan"),
            Value::from(" -NAN "),
            Value::Float(f64::NAN),
            Value::Null,
        ]);

        let output = NullCanonicalizer::default().transform(input).unwrap();
        assert!(output.rows().iter().all(|row| row[0] == Value::Null));
    }

    #[test]
    fn test_real_values_untouched() {
        let values = vec![
            Value::from("0"),
            Value::from("banana"),
            Value::from("Nancy"),
            Value::from(1),
            Value::from(2.5),
        ];
        let output = NullCanonicalizer::default()
            .transform(column(values.clone()))
            .unwrap();

        let got: Vec<Value> = output.rows().iter().map(|row| row[0].clone()).collect();
        assert_eq!(got, values);
    }

    #[test]
    fn test_configured_markers() {
        let canonicalizer = NullCanonicalizer::new(["missing"]);
        assert!(canonicalizer.is_missing(&Value::from("missing")));
        assert!(!canonicalizer.is_missing(&Value::from("NULL")));
    }
}
