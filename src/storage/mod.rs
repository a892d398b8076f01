//! Source files and intermediate state
//!
//! This module handles the file I/O of a run:
//! - Reading delimited source files from the staging directory
//! - The intermediate store contract shared by all stages
//! - In-memory and directory-backed store implementations

mod delimited;
mod directory;
mod store;

pub use delimited::CsvReader;
pub use directory::DirectoryStore;
pub use store::{
    CLEAN_DATA_KEY, IntermediateStore, IntermediateStoreExt, MemoryStore, RAW_DATA_KEY, TABLE_KEY,
};
