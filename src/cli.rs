//! CLI helper functions
//!
//! Each command builds the pipeline pieces it needs from [`Settings`] and
//! runs one stage (or the whole run) against the directory store, so an
//! external orchestrator can invoke the stages as separate processes.

use crate::{
    config::{RunConfig, RunId, Settings},
    dataset::Dataset,
    error::{EtlError, Result, Stage},
    etl::{Loader, Pipeline},
    storage::{CsvReader, DirectoryStore, IntermediateStore},
    transform::Normalizer,
    warehouse::TableLoader,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Open the directory store configured in `settings`
pub fn open_store(settings: &Settings, stage: Stage) -> Result<Arc<DirectoryStore>> {
    DirectoryStore::new(&settings.store_dir)
        .map(Arc::new)
        .map_err(|e| EtlError::store(stage, e))
}

/// Loader for commands that stop before the load stage
struct Unconnected;

#[async_trait]
impl Loader for Unconnected {
    async fn load(&self, _dataset: &Dataset, _table: &str) -> Result<usize> {
        Err(EtlError::configuration(
            Stage::Load,
            "no database connection for this command",
        ))
    }
}

fn pipeline<L: Loader>(
    settings: &Settings,
    loader: L,
    store: Arc<dyn IntermediateStore>,
) -> Pipeline<CsvReader, Normalizer, L> {
    Pipeline::new(
        CsvReader::from_settings(settings),
        Normalizer::from_settings(settings),
        loader,
        store,
    )
}

/// Run all three stages in order; intermediate state is discarded afterwards
pub async fn run(settings: &Settings, run: &RunId, config: &RunConfig) -> Result<usize> {
    // Reject a bad configuration before connecting anywhere
    config.validate()?;
    let loader = TableLoader::from_settings(settings).await?;
    let store = open_store(settings, Stage::Extract)?;

    pipeline(settings, loader, store).run(run, config).await
}

/// Extract stage only
pub async fn extract(settings: &Settings, run: &RunId, config: &RunConfig) -> Result<usize> {
    let store = open_store(settings, Stage::Extract)?;
    pipeline(settings, Unconnected, store)
        .extract(run, config)
        .await
}

/// Transform stage only
pub async fn transform(settings: &Settings, run: &RunId) -> Result<usize> {
    let store = open_store(settings, Stage::Transform)?;
    pipeline(settings, Unconnected, store).transform(run).await
}

/// Load stage only
pub async fn load(settings: &Settings, run: &RunId) -> Result<usize> {
    let store = open_store(settings, Stage::Load)?;
    let loader = TableLoader::from_settings(settings).await?;
    pipeline(settings, loader, store).load(run).await
}

/// Drop the intermediate state of a run
pub fn discard(settings: &Settings, run: &RunId) -> Result<()> {
    let store = open_store(settings, Stage::Load)?;
    store
        .discard(run)
        .map_err(|e| EtlError::store(Stage::Load, e))
}

/// Check the destination database is reachable, returning its redacted URL
pub async fn check_database(settings: &Settings) -> Result<String> {
    let loader = TableLoader::from_settings(settings).await?;
    loader.client().test_connection().await?;
    Ok(loader.client().display_url())
}
