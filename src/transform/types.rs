//! Type inference and column descriptors
//!
//! Types are decided per column: a cell is only converted when its whole
//! column agrees, so text columns are never partially rewritten.

use crate::dataset::{ColumnDescriptor, Dataset, Value};
use crate::error::Result;
use crate::etl::Transformer;

/// Type a column takes after inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

/// Decide the type of one column from all of its cells
///
/// A column is `Integer` when every non-null cell parses as an `i64`, and
/// `Float` when every non-null cell is a finite float. An integer-shaped
/// cell that overflows `i64` keeps the column as `Text`, as does any cell
/// that is not a number. A column with no non-null cell is `Text`.
/// Surrounding whitespace is ignored when parsing.
///
/// ```
/// use tabload::dataset::Value;
/// use tabload::transform::{ColumnType, infer_column};
///
/// let codes = [Value::from("007"), Value::from("ABC")];
/// assert_eq!(infer_column(&codes), ColumnType::Text);
///
/// let prices = [Value::from("3"), Value::Null, Value::from("2.5")];
/// assert_eq!(infer_column(&prices), ColumnType::Float);
/// ```
pub fn infer_column<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
    let mut integer = true;
    let mut float = true;
    let mut seen = false;

    for value in values {
        match value {
            Value::Null => continue,
            Value::Integer(_) => {}
            Value::Float(f) => {
                integer = false;
                float &= f.is_finite();
            }
            Value::Text(text) => {
                let text = text.trim();
                if text.parse::<i64>().is_err() {
                    integer = false;
                    float &= !is_integer_shaped(text)
                        && text.parse::<f64>().is_ok_and(f64::is_finite);
                }
            }
        }
        seen = true;
        if !integer && !float {
            return ColumnType::Text;
        }
    }

    match (seen, integer, float) {
        (false, _, _) => ColumnType::Text,
        (true, true, _) => ColumnType::Integer,
        (true, false, true) => ColumnType::Float,
        _ => ColumnType::Text,
    }
}

/// Optional sign followed by digits only
fn is_integer_shaped(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn convert(value: &mut Value, column_type: ColumnType) {
    let converted = match (&*value, column_type) {
        (Value::Text(text), ColumnType::Integer) => text.trim().parse().ok().map(Value::Integer),
        (Value::Text(text), ColumnType::Float) => text.trim().parse().ok().map(Value::Float),
        (Value::Integer(i), ColumnType::Float) => Some(Value::Float(*i as f64)),
        _ => None,
    };
    if let Some(converted) = converted {
        *value = converted;
    }
}

/// Describe every column of a dataset
///
/// A column is integral when it has at least one non-null value and all
/// of its non-null values are integers.
pub fn describe(dataset: &Dataset) -> Vec<ColumnDescriptor> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let mut non_null = dataset.column_values(index).filter(|v| !v.is_null()).peekable();
            let integral = non_null.peek().is_some()
                && non_null.all(|v| matches!(v, Value::Integer(_)));
            ColumnDescriptor {
                name: name.clone(),
                integral,
            }
        })
        .collect()
}

/// Transformer that types text cells and attaches column descriptors
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeInferrer;

impl Transformer for TypeInferrer {
    fn transform(&self, mut input: Dataset) -> Result<Dataset> {
        let mut descriptors = Vec::with_capacity(input.columns().len());

        for (index, name) in input.columns().to_vec().into_iter().enumerate() {
            let column_type = infer_column(input.column_values(index));
            if column_type != ColumnType::Text {
                for value in input.column_values_mut(index) {
                    convert(value, column_type);
                }
            }
            log::debug!("Column {} inferred as {:?}", name, column_type);

            descriptors.push(ColumnDescriptor {
                name,
                integral: column_type == ColumnType::Integer,
            });
        }

        input.set_descriptors(descriptors);
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_column(cells: &[&str]) -> Vec<Value> {
        cells
            .iter()
            .map(|c| if c.is_empty() { Value::Null } else { Value::from(*c) })
            .collect()
    }

    #[test]
    fn test_infer_column() {
        assert_eq!(infer_column(&text_column(&["100", " -7 ", ""])), ColumnType::Integer);
        assert_eq!(infer_column(&text_column(&["2.50", "1e3", "4"])), ColumnType::Float);
        assert_eq!(infer_column(&text_column(&["1", "inf"])), ColumnType::Text);
        assert_eq!(infer_column(&text_column(&["2024-01-01"])), ColumnType::Text);
        assert_eq!(infer_column(&text_column(&["", ""])), ColumnType::Text);
        // Too large for i64: kept verbatim rather than rounded to a float
        assert_eq!(
            infer_column(&text_column(&["1", "99999999999999999999"])),
            ColumnType::Text
        );
    }

    #[test]
    fn test_mixed_columns_keep_their_text() {
        let input = Dataset::new(
            vec!["code".into(), "big".into()],
            vec![
                vec![Value::from("007"), Value::from("99999999999999999999")],
                vec![Value::from("ABC"), Value::from("x")],
            ],
        )
        .unwrap();

        let output = TypeInferrer.transform(input).unwrap();
        assert_eq!(output.get(0, "code"), Some(&Value::from("007")));
        assert_eq!(output.get(0, "big"), Some(&Value::from("99999999999999999999")));
        assert_eq!(output.get(1, "code"), Some(&Value::from("ABC")));
        assert!(output.descriptors().iter().all(|d| !d.integral));
    }

    #[test]
    fn test_float_column_widens_integers() {
        let input = Dataset::new(
            vec!["price".into()],
            vec![vec![Value::from("3")], vec![Value::from("2.5")], vec![Value::Null]],
        )
        .unwrap();

        let output = TypeInferrer.transform(input).unwrap();
        let prices: Vec<&Value> = output.column_values(0).collect();
        assert_eq!(prices, vec![&Value::Float(3.0), &Value::Float(2.5), &Value::Null]);
        assert!(!output.descriptors()[0].integral);
    }

    #[test]
    fn test_describe() {
        let dataset = Dataset::new(
            vec!["id".into(), "price".into(), "note".into(), "empty".into()],
            vec![
                vec![Value::from(1), Value::from(1.5), Value::from("a"), Value::Null],
                vec![Value::from(2), Value::from(2), Value::Null, Value::Null],
                vec![Value::Null, Value::Null, Value::from(3), Value::Null],
            ],
        )
        .unwrap();

        let integral: Vec<bool> = describe(&dataset).iter().map(|d| d.integral).collect();
        assert_eq!(integral, vec![true, false, false, false]);
    }

    #[test]
    fn test_transform_attaches_descriptors() {
        let input = Dataset::new(
            vec!["deal_id".into(), "market".into()],
            vec![
                vec![Value::from("1"), Value::from("EU")],
                vec![Value::from("2"), Value::Null],
            ],
        )
        .unwrap();

        let output = TypeInferrer.transform(input).unwrap();
        assert!(output.is_described());
        assert!(output.descriptors()[0].integral);
        assert!(!output.descriptors()[1].integral);
        assert_eq!(output.get(1, "deal_id"), Some(&Value::Integer(2)));
    }
}
