//! The transform stage's standard chain

use super::{ColumnNameNormalizer, NullCanonicalizer, TypeInferrer};
use crate::config::Settings;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::etl::Transformer;

/// Transformer run by the transform stage
///
/// Applies, in order:
/// 1. [`ColumnNameNormalizer`]
/// 2. [`NullCanonicalizer`]
/// 3. [`TypeInferrer`], which also attaches the column descriptors the
///    load stage relies on
///
/// # Example
/// ```
/// use tabload::dataset::{Dataset, Value};
/// use tabload::etl::Transformer;
/// use tabload::transform::Normalizer;
///
/// let raw = Dataset::new(
///     vec!["Deal ID".into(), "Sale Price".into()],
///     vec![
///         vec![Value::from("1"), Value::from("100")],
///         vec![Value::from("2"), Value::Null],
///     ],
/// )
/// .unwrap();
///
/// let clean = Normalizer::default().transform(raw).unwrap();
/// assert_eq!(clean.columns(), &["deal_id", "sale_price"]);
/// assert_eq!(clean.get(0, "sale_price"), Some(&Value::Integer(100)));
/// assert!(clean.get(1, "sale_price").unwrap().is_null());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    names: ColumnNameNormalizer,
    nulls: NullCanonicalizer,
    types: TypeInferrer,
}

impl Normalizer {
    pub fn new(nulls: NullCanonicalizer) -> Self {
        Self {
            names: ColumnNameNormalizer,
            nulls,
            types: TypeInferrer,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(NullCanonicalizer::new(settings.null_markers.iter().cloned()))
    }
}

impl Transformer for Normalizer {
    fn transform(&self, input: Dataset) -> Result<Dataset> {
        let renamed = self.names.transform(input)?;
        let canonical = self.nulls.transform(renamed)?;
        self.types.transform(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;

    #[test]
    fn test_row_order_preserved() {
        let rows: Vec<Vec<Value>> = (0..50)
            .rev()
            .map(|i| vec![Value::Text(i.to_string())])
            .collect();
        let raw = Dataset::new(vec!["N".into()], rows).unwrap();

        let clean = Normalizer::default().transform(raw).unwrap();
        let got: Vec<i64> = clean
            .column_values(0)
            .map(|v| match v {
                Value::Integer(i) => *i,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(got, (0..50).rev().collect::<Vec<i64>>());
    }

    #[test]
    fn test_only_canonical_null_remains() {
        let raw = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![Value::from("NULL"), Value::from("nan")],
                vec![Value::from(""), Value::from("3.5")],
            ],
        )
        .unwrap();

        let clean = Normalizer::default().transform(raw).unwrap();
        assert_eq!(clean.rows()[0], vec![Value::Null, Value::Null]);
        assert_eq!(clean.rows()[1], vec![Value::Null, Value::Float(3.5)]);
        // Column "a" is all null, so not integral
        assert!(!clean.descriptors()[0].integral);
    }

    #[test]
    fn test_custom_markers_from_settings() {
        let settings = Settings {
            null_markers: vec!["?".into()],
            ..Settings::default()
        };
        let raw = Dataset::new(vec!["a".into()], vec![vec![Value::from("?")]]).unwrap();

        let clean = Normalizer::from_settings(&settings).transform(raw).unwrap();
        assert!(clean.rows()[0][0].is_null());
    }
}
