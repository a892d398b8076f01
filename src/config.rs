//! Run configuration and process settings
//!
//! [`RunConfig`] is what the orchestrator hands to a run. [`Settings`] holds
//! the connection string, folders and null tokens, and is passed explicitly
//! into every stage.

use crate::error::{EtlError, Result, Stage};
use eyre::{Context, eyre};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Tokens read as a missing value in addition to the empty cell
///
/// The `nan` spellings are left to [`crate::transform::NullCanonicalizer`],
/// which matches them in any case.
pub const DEFAULT_NULL_MARKERS: &[&str] = &[
    "NULL", "null", "NA", "#NA", "N/A", "n/a", "#N/A", "#N/A N/A", "<NA>", "None", "-1.#IND",
    "1.#IND", "-1.#QNAN", "1.#QNAN",
];

pub const DEFAULT_STAGING_DIR: &str = "uploads";
pub const DEFAULT_STORE_DIR: &str = ".tabload/runs";
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Parameters of one run, as supplied by the orchestrator
///
/// Both fields are optional at the type level so that a missing field is
/// reported as a configuration error by the extract stage rather than as a
/// deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, alias = "table")]
    pub target_table: Option<String>,
}

impl RunConfig {
    pub fn new(filename: impl Into<String>, target_table: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            target_table: Some(target_table.into()),
        }
    }

    /// Parse the orchestrator's JSON `conf` mapping
    pub fn from_json(conf: &str) -> Result<Self> {
        serde_json::from_str(conf).map_err(|e| {
            EtlError::configuration(Stage::Extract, format!("invalid run configuration: {}", e))
        })
    }

    /// The source file name, which must be a bare file name
    pub fn filename(&self) -> Result<&str> {
        let filename = required(self.filename.as_deref(), "filename")?;

        let path = Path::new(filename);
        let bare = path.components().count() == 1
            && matches!(path.components().next(), Some(Component::Normal(_)));
        if !bare {
            return Err(EtlError::configuration(
                Stage::Extract,
                format!("filename must not contain a directory: {}", filename),
            ));
        }
        Ok(filename)
    }

    pub fn target_table(&self) -> Result<&str> {
        required(self.target_table.as_deref(), "target table")
    }

    /// Check both fields at once
    pub fn validate(&self) -> Result<()> {
        self.filename()?;
        self.target_table()?;
        Ok(())
    }
}

fn required<'a>(value: Option<&'a str>, what: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(EtlError::configuration(
            Stage::Extract,
            format!("{} not specified in run configuration", what),
        )),
    }
}

/// Identifier scoping intermediate state to one run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// Accept an orchestrator supplied id
    ///
    /// Only `[A-Za-z0-9_.:+-]` is allowed, and `.`/`..` are rejected, since the
    /// id doubles as a directory name in [`crate::storage::DirectoryStore`].
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let valid_chars = id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_.:+-".contains(c));
        if id.is_empty() || !valid_chars || id == "." || id == ".." {
            return Err(EtlError::configuration(
                Stage::Extract,
                format!("invalid run id: {:?}", id),
            ));
        }
        Ok(Self(id))
    }

    /// Fresh random run id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process level settings shared by all stages of a run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// sqlx connection URL; only required by the load stage
    pub database_url: Option<String>,
    pub staging_dir: PathBuf,
    pub store_dir: PathBuf,
    pub null_markers: Vec<String>,
    pub delimiter: u8,
    pub page_size: usize,
    pub schema_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
            delimiter: b',',
            page_size: DEFAULT_PAGE_SIZE,
            schema_file: None,
        }
    }
}

impl Settings {
    /// Read settings from the process environment
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `DATABASE_URL` | unset |
    /// | `TABLOAD_STAGING_DIR` | `uploads` |
    /// | `TABLOAD_STORE_DIR` | `.tabload/runs` |
    /// | `TABLOAD_NULL_MARKERS` | [`DEFAULT_NULL_MARKERS`] |
    /// | `TABLOAD_DELIMITER` | `,` |
    /// | `TABLOAD_PAGE_SIZE` | `100` |
    /// | `TABLOAD_SCHEMA_FILE` | unset |
    pub fn from_env() -> eyre::Result<Self> {
        let mut settings = Self::default();

        settings.database_url = env_var("DATABASE_URL");

        if let Some(dir) = env_var("TABLOAD_STAGING_DIR") {
            settings.staging_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env_var("TABLOAD_STORE_DIR") {
            settings.store_dir = PathBuf::from(dir);
        }
        if let Some(markers) = env_var("TABLOAD_NULL_MARKERS") {
            settings.null_markers = markers
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
        }
        if let Some(delimiter) = env_var("TABLOAD_DELIMITER") {
            settings.delimiter = parse_delimiter(&delimiter)
                .with_context(|| "Invalid TABLOAD_DELIMITER")?;
        }
        if let Some(page_size) = env_var("TABLOAD_PAGE_SIZE") {
            settings.page_size = page_size
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    eyre!("TABLOAD_PAGE_SIZE must be a positive integer, got {:?}", page_size)
                })?;
        }
        settings.schema_file = env_var("TABLOAD_SCHEMA_FILE").map(PathBuf::from);

        Ok(settings)
    }

    /// The connection URL, or a configuration error for the load stage
    pub fn database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            EtlError::configuration(Stage::Load, "DATABASE_URL environment variable not set")
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_delimiter(value: &str) -> eyre::Result<u8> {
    let value = match value {
        "\\t" | "tab" => "\t",
        other => other,
    };
    match value.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(eyre!("delimiter must be a single ASCII character, got {:?}", value)),
    }
}
