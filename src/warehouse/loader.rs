//! Table loader, the load stage's destination

use super::reconcile::{ReconcileReport, widen_integer_columns};
use super::schema::{SchemaContract, quote_identifier, validate_table_name};
use crate::client::DatabaseClient;
use crate::config::{DEFAULT_PAGE_SIZE, Settings};
use crate::dataset::{Dataset, Value};
use crate::error::{EtlError, Result, Stage};
use crate::etl::Loader;
use async_trait::async_trait;
use sqlx::{Any, QueryBuilder};
use std::fmt;

/// Load datasets into pre-existing tables
///
/// Loading a dataset:
/// 1. Validates the table name and, when a [`SchemaContract`] is set, the
///    dataset's columns against it
/// 2. Widens integral columns to `BIGINT`, ignoring failures
/// 3. Inserts every row inside one transaction, `page_size` rows per
///    statement, then commits
///
/// Either every row is committed or none is. An empty dataset still goes
/// through validation and then commits nothing.
///
/// # Example
/// ```no_run
/// use tabload::client::DatabaseClient;
/// use tabload::warehouse::TableLoader;
///
/// # async fn example() -> tabload::error::Result<()> {
/// let client = DatabaseClient::connect("postgres://etl@localhost/warehouse").await?;
/// let loader = TableLoader::new(client).with_page_size(500);
/// # Ok(())
/// # }
/// ```
pub struct TableLoader {
    client: DatabaseClient,
    contract: Option<SchemaContract>,
    page_size: usize,
}

impl TableLoader {
    pub fn new(client: DatabaseClient) -> Self {
        Self {
            client,
            contract: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Connect using the database URL and options in `settings`
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let client = DatabaseClient::connect(settings.database_url()?).await?;
        let mut loader = Self::new(client).with_page_size(settings.page_size);

        if let Some(path) = &settings.schema_file {
            let contract = SchemaContract::read(path)
                .map_err(|e| EtlError::configuration(Stage::Load, format!("{:#}", e)))?;
            loader = loader.with_contract(contract);
        }
        Ok(loader)
    }

    pub fn with_contract(mut self, contract: SchemaContract) -> Self {
        self.contract = Some(contract);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn client(&self) -> &DatabaseClient {
        &self.client
    }

    /// Check the dataset and table before any statement is sent
    pub fn validate(&self, dataset: &Dataset, table: &str) -> Result<()> {
        validate_table_name(table)?;

        if !dataset.is_described() {
            return Err(EtlError::configuration(
                Stage::Load,
                "dataset has no column descriptors; run the transform stage first",
            ));
        }
        if dataset.columns().is_empty() {
            return Err(EtlError::configuration(Stage::Load, "dataset has no columns"));
        }

        if let Some(contract) = &self.contract {
            contract.validate(table, dataset.columns())?;
        }
        Ok(())
    }

    /// Widen integral columns, see [`widen_integer_columns`]
    pub async fn reconcile(&self, dataset: &Dataset, table: &str) -> ReconcileReport {
        widen_integer_columns(self.client.pool(), table, dataset.descriptors()).await
    }

    /// Insert every row in one transaction
    ///
    /// Returns the number of rows committed.
    pub async fn insert(&self, dataset: &Dataset, table: &str) -> Result<usize> {
        if dataset.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .client
            .pool()
            .begin()
            .await
            .map_err(|e| EtlError::database(Stage::Load, e))?;

        let mut inserted = 0usize;
        for page in dataset.rows().chunks(self.page_size) {
            let mut query = insert_statement(table, dataset.columns(), page);
            let result = query.build().persistent(false).execute(&mut *tx).await;

            match result {
                Ok(done) => inserted += done.rows_affected() as usize,
                Err(e) => {
                    log::warn!("Insert into {} failed, rolling back: {}", table, e);
                    if let Err(rollback) = tx.rollback().await {
                        log::warn!("Rollback failed: {}", rollback);
                    }
                    return Err(EtlError::database(Stage::Load, e));
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| EtlError::database(Stage::Load, e))?;
        Ok(inserted)
    }
}

#[async_trait]
impl Loader for TableLoader {
    async fn load(&self, dataset: &Dataset, table: &str) -> Result<usize> {
        self.validate(dataset, table)?;
        if dataset.is_empty() {
            log::warn!("No rows to load into {}", table);
            return Ok(0);
        }

        log::info!(
            "Loading {} rows into {} at {}",
            dataset.len(),
            table,
            self.client.display_url()
        );

        self.reconcile(dataset, table).await;
        self.insert(dataset, table).await
    }
}

/// Build one multi-row insert for a page of rows
///
/// Values are rendered as SQL literals so that the destination coerces
/// them to each column's type, as it would for hand-written SQL. Text is
/// single-quoted with embedded quotes doubled.
pub fn insert_statement<'a>(
    table: &str,
    columns: &[String],
    rows: &'a [Vec<Value>],
) -> QueryBuilder<'a, Any> {
    let column_list = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");

    let mut builder = QueryBuilder::new(format!("INSERT INTO {} ({}) ", table, column_list));
    builder.push_values(rows, |mut row_builder, row| {
        for value in row {
            row_builder.push(SqlLiteral(value));
        }
    });
    builder
}

/// SQL literal form of a cell
struct SqlLiteral<'a>(&'a Value);

impl fmt::Display for SqlLiteral<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) if x.is_finite() => write!(f, "{}", x),
            Value::Float(_) => f.write_str("NULL"),
            Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}
