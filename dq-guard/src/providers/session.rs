//! SQL source backed by a DataFusion session.

use super::SourceProvider;
use crate::error::{ProviderError, Result};
use crate::table::Table;
use async_trait::async_trait;
use datafusion::prelude::SessionContext;
use std::fmt;
use tracing::{debug, instrument};

/// Runs SQL against the tables registered in a DataFusion session.
///
/// Useful for sources held in memory, CSV or Parquet files registered with the
/// session, or any other DataFusion table provider.
///
/// # Examples
///
/// ```rust,no_run
/// use dq_guard::providers::{SessionSource, SourceProvider};
/// use datafusion::prelude::*;
///
/// # async fn example() -> dq_guard::error::Result<()> {
/// let ctx = SessionContext::new();
/// ctx.register_csv("visits", "data/visits.csv", CsvReadOptions::new()).await?;
///
/// let source = SessionSource::new(ctx);
/// let table = source.fetch("SELECT facility_id, COUNT(*) AS visits FROM visits GROUP BY facility_id").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SessionSource {
    ctx: SessionContext,
}

impl SessionSource {
    pub fn new(ctx: SessionContext) -> Self {
        Self { ctx }
    }

    /// The underlying session, e.g. for registering more tables.
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }
}

impl fmt::Debug for SessionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSource")
            .field("session_id", &self.ctx.session_id())
            .finish()
    }
}

#[async_trait]
impl SourceProvider for SessionSource {
    #[instrument(skip(self, query), fields(query.len = query.len()))]
    async fn fetch(&self, query: &str) -> Result<Table> {
        let df = self.ctx.sql(query).await.map_err(|e| {
            let message = format!("Failed to execute SQL query: {e}");
            ProviderError::query_with_source(message, e.into())
        })?;
        let schema = df.schema().inner().clone();
        let batches = df.collect().await.map_err(|e| {
            let message = format!("Failed to collect query results: {e}");
            ProviderError::query_with_source(message, e.into())
        })?;

        let table = Table::from_arrow(&schema, &batches)?;
        debug!(rows = table.len(), columns = table.num_columns(), "Fetched source data");
        Ok(table)
    }

    fn description(&self) -> String {
        format!("DataFusion session {}", self.ctx.session_id())
    }
}
