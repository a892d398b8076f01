//! Typed failures surfaced to the orchestrator
//!
//! Every error names the [`Stage`] that raised it so a failed run can be
//! reported as "stage + original cause".

use std::fmt;
use thiserror::Error;

/// Pipeline stage that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extract,
    Transform,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extract => write!(f, "extract"),
            Self::Transform => write!(f, "transform"),
            Self::Load => write!(f, "load"),
        }
    }
}

/// Failure taxonomy for a run
///
/// - `Configuration`: missing, duplicate or invalid configuration and column names,
///   or an input file that cannot be read as configured
/// - `Load`: the destination rejected the data (unknown column, type mismatch, ...)
/// - `Transport`: the intermediate store or the database could not be reached
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("{stage} stage failed: configuration error: {message}")]
    Configuration { stage: Stage, message: String },

    #[error("{stage} stage failed: load error: {message}")]
    Load { stage: Stage, message: String },

    #[error("{stage} stage failed: transport error: {message}")]
    Transport { stage: Stage, message: String },
}

impl EtlError {
    pub fn configuration(stage: Stage, message: impl Into<String>) -> Self {
        Self::Configuration {
            stage,
            message: message.into(),
        }
    }

    pub fn load(stage: Stage, message: impl Into<String>) -> Self {
        Self::Load {
            stage,
            message: message.into(),
        }
    }

    pub fn transport(stage: Stage, message: impl Into<String>) -> Self {
        Self::Transport {
            stage,
            message: message.into(),
        }
    }

    /// Wrap a store failure; the store is a transport dependency of every stage
    pub fn store(stage: Stage, report: eyre::Report) -> Self {
        Self::transport(stage, format!("{:#}", report))
    }

    /// Classify a database error raised while loading
    ///
    /// Connectivity problems become `Transport`, everything the server
    /// answered with becomes `Load`.
    pub fn database(stage: Stage, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::transport(stage, err.to_string()),
            other => Self::load(stage, other.to_string()),
        }
    }

    /// Stage the failure belongs to
    pub fn stage(&self) -> Stage {
        match self {
            Self::Configuration { stage, .. }
            | Self::Load { stage, .. }
            | Self::Transport { stage, .. } => *stage,
        }
    }

    /// Human readable cause without the stage prefix
    pub fn cause(&self) -> &str {
        match self {
            Self::Configuration { message, .. }
            | Self::Load { message, .. }
            | Self::Transport { message, .. } => message,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    pub fn is_load(&self) -> bool {
        matches!(self, Self::Load { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
