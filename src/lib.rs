//! tabload
//!
//! Loads a delimited file into a pre-existing database table through three
//! stages: extract, transform, load. Stages hand data to each other through
//! a run-scoped intermediate store.

pub mod cli;
pub mod client;
pub mod config;
pub mod dataset;
pub mod error;
pub mod etl;
pub mod storage;
pub mod transform;
pub mod warehouse;

// Re-exports for convenience
pub use client::DatabaseClient;
pub use config::{RunConfig, RunId, Settings};
pub use dataset::{ColumnDescriptor, Dataset, Value};
pub use error::{EtlError, Stage};
pub use etl::{Extractor, IdentityTransformer, Loader, Pipeline, Transformer};
pub use storage::{CsvReader, DirectoryStore, IntermediateStore, MemoryStore};
pub use transform::Normalizer;
pub use warehouse::{SchemaContract, TableLoader};
