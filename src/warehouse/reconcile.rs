//! Opportunistic widening of destination integer columns
//!
//! Before inserting, every column the dataset holds only integers in is
//! widened to `BIGINT`. This is advisory: a failure is logged and ignored,
//! and the insert proceeds regardless.

use super::schema::quote_identifier;
use crate::dataset::ColumnDescriptor;
use sqlx::{AnyPool, Executor};
use std::fmt;

/// Why a widening statement did not apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The role may not alter the table
    InsufficientPrivilege,
    /// Existing data or the current type cannot be converted
    IncompatibleData,
    /// The destination has no such column
    UnknownColumn,
    /// The backend has no `ALTER COLUMN ... TYPE`
    Unsupported,
    /// The database could not be reached
    Unreachable,
    Other,
}

impl SkipReason {
    fn classify(err: &sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => {
                match db.code().as_deref() {
                    Some("42501") => return Self::InsufficientPrivilege,
                    Some("42703") => return Self::UnknownColumn,
                    Some("42804" | "22003" | "22P02" | "42846") => return Self::IncompatibleData,
                    Some("42601") => return Self::Unsupported,
                    _ => {}
                }
                if db.message().contains("syntax error") {
                    Self::Unsupported
                } else {
                    Self::Other
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => Self::Unreachable,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InsufficientPrivilege => "insufficient privilege",
            Self::IncompatibleData => "incompatible data",
            Self::UnknownColumn => "unknown column",
            Self::Unsupported => "unsupported by backend",
            Self::Unreachable => "database unreachable",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// What schema reconciliation did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Columns whose widening statement succeeded
    pub widened: Vec<String>,
    /// Columns whose widening statement failed, with the classified reason
    pub skipped: Vec<(String, SkipReason)>,
}

impl ReconcileReport {
    pub fn attempted(&self) -> usize {
        self.widened.len() + self.skipped.len()
    }
}

/// Statement widening one column
pub fn widen_statement(table: &str, column: &str) -> String {
    format!(
        "ALTER TABLE {} ALTER COLUMN {} TYPE BIGINT",
        table,
        quote_identifier(column)
    )
}

/// Widen every integral column of `table` to `BIGINT`
///
/// Each statement runs on its own, outside any transaction, so one failure
/// does not undo another column's widening. Failures are never returned and
/// never retried. No rows are read or written.
pub async fn widen_integer_columns(
    pool: &AnyPool,
    table: &str,
    descriptors: &[ColumnDescriptor],
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for descriptor in descriptors.iter().filter(|d| d.integral) {
        let sql = widen_statement(table, &descriptor.name);
        log::debug!("{}", sql);

        match pool.execute(sql.as_str()).await {
            Ok(_) => report.widened.push(descriptor.name.clone()),
            Err(e) => {
                let reason = SkipReason::classify(&e);
                log::warn!(
                    "Could not widen {}.{} to BIGINT ({}), continuing: {}",
                    table,
                    descriptor.name,
                    reason,
                    e
                );
                report.skipped.push((descriptor.name.clone(), reason));
            }
        }
    }

    log::info!(
        "Schema reconciliation on {}: {} widened, {} skipped",
        table,
        report.widened.len(),
        report.skipped.len()
    );
    report
}
