//! Destination database client.
//!
//! This module provides the [`DatabaseClient`] used by the load stage to
//! reach the warehouse.

mod database;

pub use database::{DatabaseClient, redact_url};
