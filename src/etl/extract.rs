//! Extractor trait for reading a run's source data

use crate::config::RunConfig;
use crate::dataset::Dataset;
use crate::error::Result;

/// Extractor trait for turning a run's source into a [`Dataset`]
///
/// Implementors read the whole source or fail; a partially read source is
/// never returned.
///
/// # Example
/// ```no_run
/// use tabload::config::RunConfig;
/// use tabload::dataset::Dataset;
/// use tabload::error::Result;
/// use tabload::etl::Extractor;
///
/// struct EmptySource;
///
/// impl Extractor for EmptySource {
///     async fn extract(&self, config: &RunConfig) -> Result<Dataset> {
///         config.validate()?;
///         Ok(Dataset::new(vec![], vec![]).expect("no rows"))
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// Extract the dataset named by the run configuration
    ///
    /// # Errors
    /// Returns a configuration error if the run configuration is incomplete
    /// or the source cannot be read as configured.
    fn extract(
        &self,
        config: &RunConfig,
    ) -> impl std::future::Future<Output = Result<Dataset>> + Send;
}
