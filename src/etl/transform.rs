//! Transformer trait for dataset normalization

use crate::dataset::Dataset;
use crate::error::Result;

/// Transformer trait for reshaping a [`Dataset`]
///
/// Transformers consume their input and hand back the transformed dataset.
/// They never reorder rows.
///
/// # Example
/// ```
/// use tabload::dataset::{Dataset, Value};
/// use tabload::error::Result;
/// use tabload::etl::Transformer;
///
/// struct Passthrough;
///
/// impl Transformer for Passthrough {
///     fn transform(&self, input: Dataset) -> Result<Dataset> {
///         Ok(input)
///     }
/// }
///
/// let dataset = Dataset::new(vec!["a".into()], vec![vec![Value::Null]]).unwrap();
/// assert_eq!(Passthrough.transform(dataset.clone()).unwrap(), dataset);
/// ```
pub trait Transformer: Send + Sync {
    /// Transform a dataset
    ///
    /// # Errors
    /// Returns an error if the dataset cannot be normalized (e.g. two columns
    /// collapse to the same name).
    fn transform(&self, input: Dataset) -> Result<Dataset>;
}

/// Identity transformer that passes datasets through unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTransformer;

impl Transformer for IdentityTransformer {
    fn transform(&self, input: Dataset) -> Result<Dataset> {
        Ok(input)
    }
}
