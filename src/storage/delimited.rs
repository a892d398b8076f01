//! Delimited file reader, the extract stage's source

use crate::config::{RunConfig, Settings};
use crate::dataset::{Dataset, Value};
use crate::error::{EtlError, Result, Stage};
use crate::etl::Extractor;
use csv::{ReaderBuilder, Trim};
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Read delimited files from a staging directory
///
/// The first row is the header. Empty cells and the configured null markers
/// become [`Value::Null`]; every other cell is kept verbatim as
/// [`Value::Text`]. Header names are not normalized here.
///
/// # Example
/// ```no_run
/// use tabload::config::{RunConfig, Settings};
/// use tabload::etl::Extractor;
/// use tabload::storage::CsvReader;
///
/// # async fn example() -> tabload::error::Result<()> {
/// let reader = CsvReader::from_settings(&Settings::default());
/// let dataset = reader.extract(&RunConfig::new("sales.csv", "sales")).await?;
/// println!("{} rows", dataset.len());
/// # Ok(())
/// # }
/// ```
pub struct CsvReader {
    staging_dir: PathBuf,
    delimiter: u8,
    null_markers: HashSet<String>,
}

impl CsvReader {
    pub fn new(staging_dir: impl AsRef<Path>) -> Self {
        Self::from_settings(&Settings {
            staging_dir: staging_dir.as_ref().to_path_buf(),
            ..Settings::default()
        })
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            staging_dir: settings.staging_dir.clone(),
            delimiter: settings.delimiter,
            null_markers: settings.null_markers.iter().cloned().collect(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_null_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Parse delimited content into a dataset
    pub fn read_from(&self, source: impl Read) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(Trim::None)
            .flexible(false)
            .from_reader(source);

        let headers = reader
            .headers()
            .map_err(|e| invalid_input(format!("Failed to read header row: {}", e)))?
            .clone();
        if headers.is_empty() {
            return Err(invalid_input("File has no header row"));
        }
        let columns: Vec<String> = headers.iter().map(str::to_string).collect();

        let mut rows: Vec<Vec<Value>> = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record
                .map_err(|e| invalid_input(format!("Failed to parse row {}: {}", index + 1, e)))?;
            rows.push(record.iter().map(|cell| self.cell(cell)).collect());
        }

        Dataset::new(columns, rows).map_err(invalid_input)
    }

    /// Parse a file from the staging directory
    pub fn read_file(&self, filename: &str) -> Result<Dataset> {
        let path = self.staging_dir.join(filename);
        log::debug!("Reading {}", path.display());

        let file = std::fs::File::open(&path)
            .map_err(|e| invalid_input(format!("Failed to open {}: {}", path.display(), e)))?;
        self.read_from(std::io::BufReader::new(file))
    }

    fn cell(&self, raw: &str) -> Value {
        if raw.is_empty() || self.null_markers.contains(raw) {
            Value::Null
        } else {
            Value::Text(raw.to_string())
        }
    }
}

fn invalid_input(message: impl Into<String>) -> EtlError {
    EtlError::configuration(Stage::Extract, message)
}

impl Extractor for CsvReader {
    async fn extract(&self, config: &RunConfig) -> Result<Dataset> {
        config.validate()?;
        self.read_file(config.filename()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn reader() -> CsvReader {
        CsvReader::new(".")
    }

    #[test]
    fn test_reads_header_and_rows() {
        let dataset = reader()
            .read_from("Deal ID,Sale Price\n1,100\n2,\n".as_bytes())
            .unwrap();

        assert_eq!(dataset.columns(), &["Deal ID", "Sale Price"]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.get(0, "Sale Price"), Some(&Value::from("100")));
        assert_eq!(dataset.get(1, "Sale Price"), Some(&Value::Null));
    }

    #[test]
    fn test_null_markers() {
        let dataset = reader()
            .read_from("a,b,c\nNULL,NA, NULL\n".as_bytes())
            .unwrap();

        assert_eq!(dataset.get(0, "a"), Some(&Value::Null));
        assert_eq!(dataset.get(0, "b"), Some(&Value::Null));
        // Markers match whole, untrimmed cells only
        assert_eq!(dataset.get(0, "c"), Some(&Value::from(" NULL")));
    }

    #[test]
    fn test_spreadsheet_error_markers() {
        let dataset = reader()
            .read_from("a,b,c,d\n#N/A N/A,1.#QNAN,-1.#IND,#NA\n".as_bytes())
            .unwrap();

        assert!(dataset.rows()[0].iter().all(Value::is_null));
    }

    #[test]
    fn test_custom_markers_and_delimiter() {
        let dataset = reader()
            .with_delimiter(b';')
            .with_null_markers(["-"])
            .read_from("a;b\n-;NULL\n".as_bytes())
            .unwrap();

        assert_eq!(dataset.get(0, "a"), Some(&Value::Null));
        assert_eq!(dataset.get(0, "b"), Some(&Value::from("NULL")));
    }

    #[test]
    fn test_ragged_row_fails_whole_file() {
        let err = reader().read_from("a,b\n1,2\n3\n".as_bytes()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.cause().contains("row 2"));
    }

    #[test]
    fn test_empty_file_fails() {
        let err = reader().read_from("".as_bytes()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_header_only_file_is_empty_dataset() {
        let dataset = reader().read_from("a,b\n".as_bytes()).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.columns().len(), 2);
    }

    #[tokio::test]
    async fn test_extract_from_staging_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("sales.csv"), "id\n1\n2\n3\n").unwrap();

        let dataset = CsvReader::new(temp.path())
            .extract(&RunConfig::new("sales.csv", "sales"))
            .await
            .unwrap();
        assert_eq!(dataset.len(), 3);
    }

    #[tokio::test]
    async fn test_extract_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = CsvReader::new(temp.path())
            .extract(&RunConfig::new("nope.csv", "sales"))
            .await
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.stage(), Stage::Extract);
    }

    #[tokio::test]
    async fn test_extract_requires_filename() {
        let err = reader()
            .extract(&RunConfig {
                filename: Some(String::new()),
                target_table: Some("sales".into()),
            })
            .await
            .unwrap_err();
        assert!(err.cause().contains("filename"));
    }
}
