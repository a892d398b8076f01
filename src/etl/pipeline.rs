//! Pipeline orchestration for ETL runs

use super::{Extractor, Loader, Transformer};
use crate::config::{RunConfig, RunId};
use crate::error::{EtlError, Result, Stage};
use crate::storage::{
    CLEAN_DATA_KEY, IntermediateStore, IntermediateStoreExt, RAW_DATA_KEY, TABLE_KEY,
};
use std::sync::Arc;

/// ETL Pipeline that runs Extract, Transform and Load for one run at a time
///
/// Stages hand their results to each other through the intermediate store,
/// keyed by run id, so an external orchestrator can call [`extract`],
/// [`transform`] and [`load`] as separate steps (even from separate
/// processes when the store is shared). [`run`] performs all three in order
/// and discards the run's intermediate state afterwards.
///
/// No stage retries. Retrying is the orchestrator's job, for whole runs.
///
/// [`extract`]: Pipeline::extract
/// [`transform`]: Pipeline::transform
/// [`load`]: Pipeline::load
/// [`run`]: Pipeline::run
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
    store: Arc<dyn IntermediateStore>,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    T: Transformer,
    L: Loader,
{
    /// Create a new pipeline
    pub fn new(extractor: E, transformer: T, loader: L, store: Arc<dyn IntermediateStore>) -> Self {
        Self {
            extractor,
            transformer,
            loader,
            store,
        }
    }

    /// Extract stage: read the source and store it with the target table
    ///
    /// Returns the number of rows extracted.
    pub async fn extract(&self, run: &RunId, config: &RunConfig) -> Result<usize> {
        log::info!("[{}] Extracting", run);
        let table = config.target_table()?.to_string();
        let dataset = self.extractor.extract(config).await?;

        let stored = self
            .store
            .put_dataset(run, RAW_DATA_KEY, &dataset)
            .and_then(|_| self.store.put_text(run, TABLE_KEY, &table));
        if let Err(e) = stored {
            // Leave nothing behind from a half-stored extract
            if let Err(discard) = self.store.discard(run) {
                log::warn!("[{}] Failed to discard partial extract: {:#}", run, discard);
            }
            return Err(EtlError::store(Stage::Extract, e));
        }

        log::info!(
            "[{}] Extracted {} rows, {} columns for table {}",
            run,
            dataset.len(),
            dataset.columns().len(),
            table
        );
        Ok(dataset.len())
    }

    /// Transform stage: normalize the extracted dataset and store the result
    pub async fn transform(&self, run: &RunId) -> Result<usize> {
        log::info!("[{}] Transforming", run);
        let raw = self
            .store
            .get_dataset(run, RAW_DATA_KEY)
            .map_err(|e| EtlError::store(Stage::Transform, e))?;

        let clean = self.transformer.transform(raw)?;

        self.store
            .put_dataset(run, CLEAN_DATA_KEY, &clean)
            .map_err(|e| EtlError::store(Stage::Transform, e))?;

        log::info!("[{}] Transformed {} rows", run, clean.len());
        Ok(clean.len())
    }

    /// Load stage: write the normalized dataset into the target table
    pub async fn load(&self, run: &RunId) -> Result<usize> {
        log::info!("[{}] Loading", run);
        let clean = self
            .store
            .get_dataset(run, CLEAN_DATA_KEY)
            .map_err(|e| EtlError::store(Stage::Load, e))?;
        let table = self
            .store
            .get_text(run, TABLE_KEY)
            .map_err(|e| EtlError::store(Stage::Load, e))?;

        let count = self.loader.load(&clean, &table).await?;
        log::info!("[{}] Loaded {} rows into {}", run, count, table);
        Ok(count)
    }

    /// Run the complete ETL pipeline
    ///
    /// Steps:
    /// 1. Extract
    /// 2. Transform
    /// 3. Load
    ///
    /// Each step starts only after the previous one succeeded. The run's
    /// intermediate state is discarded afterwards whether or not it
    /// succeeded.
    ///
    /// Returns the number of rows committed to the destination
    ///
    /// # Errors
    /// Returns the first stage error, unchanged
    pub async fn run(&self, run: &RunId, config: &RunConfig) -> Result<usize> {
        log::info!("Starting ETL run {}", run);

        let result = self.run_stages(run, config).await;

        if let Err(e) = self.store.discard(run) {
            log::warn!("[{}] Failed to discard intermediate state: {:#}", run, e);
        }

        match &result {
            Ok(count) => log::info!("Run {} complete: {} rows loaded", run, count),
            Err(e) => log::error!("Run {} failed: {}", run, e),
        }
        result
    }

    async fn run_stages(&self, run: &RunId, config: &RunConfig) -> Result<usize> {
        self.extract(run, config).await?;
        self.transform(run).await?;
        self.load(run).await
    }
}
