//! Loader trait for writing datasets to a destination

use crate::dataset::Dataset;
use crate::error::Result;
use async_trait::async_trait;

/// Loader trait for writing a [`Dataset`] into a named destination table
///
/// # Example
/// ```no_run
/// use async_trait::async_trait;
/// use tabload::dataset::Dataset;
/// use tabload::error::Result;
/// use tabload::etl::Loader;
///
/// struct CountingLoader;
///
/// #[async_trait]
/// impl Loader for CountingLoader {
///     async fn load(&self, dataset: &Dataset, _table: &str) -> Result<usize> {
///         Ok(dataset.len())
///     }
/// }
/// ```
#[async_trait]
pub trait Loader: Send + Sync {
    /// Load every row of the dataset into `table`
    ///
    /// Returns the number of rows committed. Implementations either commit
    /// every row or none.
    ///
    /// # Errors
    /// Returns a load error if the destination rejects the data and a
    /// transport error if it cannot be reached.
    async fn load(&self, dataset: &Dataset, table: &str) -> Result<usize>;
}
