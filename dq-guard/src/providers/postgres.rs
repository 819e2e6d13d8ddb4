//! PostgreSQL source provider.

use super::SourceProvider;
use crate::config::PostgresConfig;
use crate::error::{ProviderError, Result};
use crate::table::Table;
use async_trait::async_trait;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion_table_providers::sql::db_connection_pool::postgrespool::PostgresConnectionPool;
use datafusion_table_providers::sql::db_connection_pool::DbConnectionPool;
use datafusion_table_providers::util::secrets::to_secret_map;
use futures::TryStreamExt;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Runs SQL against a PostgreSQL database through a pooled connection.
///
/// # Examples
///
/// ```rust,ignore
/// use dq_guard::config::PostgresConfig;
/// use dq_guard::providers::{PostgresSource, SourceProvider};
///
/// # async fn example() -> dq_guard::error::Result<()> {
/// let config = PostgresConfig::from_env()?;
/// let source = PostgresSource::connect(&config).await?;
/// let table = source.fetch("SELECT facility_type, COUNT(*) FROM src_generated_facilities GROUP BY 1").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresSource {
    pool: Arc<PostgresConnectionPool>,
    target: String,
}

impl fmt::Debug for PostgresSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresSource")
            .field("target", &self.target)
            .finish()
    }
}

impl PostgresSource {
    /// Creates the connection pool for `config`.
    #[instrument(skip(config), fields(target = %config.describe()))]
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let target = config.describe();
        let params = to_secret_map(config.connection_params());
        let pool = PostgresConnectionPool::new(params).await.map_err(|e| {
            let message = format!("Unable to connect to PostgreSQL: {e}");
            ProviderError::connection_with_source(target.clone(), message, e.into())
        })?;
        info!(target = %target, "Connected to PostgreSQL");

        Ok(Self {
            pool: Arc::new(pool),
            target,
        })
    }
}

#[async_trait]
impl SourceProvider for PostgresSource {
    #[instrument(skip(self, query), fields(target = %self.target, query.len = query.len()))]
    async fn fetch(&self, query: &str) -> Result<Table> {
        let conn = self.pool.connect().await.map_err(|e| {
            let message = format!("Unable to acquire a connection: {e}");
            ProviderError::connection_with_source(self.target.clone(), message, e.into())
        })?;
        let conn = conn.as_async().ok_or_else(|| ProviderError::Connection {
            target: self.target.clone(),
            message: "PostgreSQL connection does not support async queries".to_string(),
            source: None,
        })?;

        let stream = conn.query_arrow(query, &[], None).await.map_err(|e| {
            let message = format!("Failed to execute SQL query: {e}");
            ProviderError::query_with_source(message, e.into())
        })?;
        let schema = stream.schema();
        let batches: Vec<RecordBatch> = stream.try_collect().await.map_err(|e| {
            let message = format!("Failed to read query results: {e}");
            ProviderError::query_with_source(message, e.into())
        })?;

        let table = Table::from_arrow(&schema, &batches)?;
        debug!(rows = table.len(), columns = table.num_columns(), "Fetched source data");
        Ok(table)
    }

    fn description(&self) -> String {
        format!("PostgreSQL {}", self.target)
    }
}
