//! Destination table handling for the load stage
//!
//! - Schema contract and identifier checks
//! - Opportunistic integer column widening
//! - Transactional bulk insert

mod loader;
mod reconcile;
mod schema;

pub use loader::{TableLoader, insert_statement};
pub use reconcile::{ReconcileReport, SkipReason, widen_integer_columns, widen_statement};
pub use schema::{SchemaContract, quote_identifier, validate_table_name};
