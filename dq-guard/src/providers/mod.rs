//! Table providers for source and target data.
//!
//! Providers sit upstream of validation: they turn a query or a dataset path
//! into a [`Table`]. Their failures are reported as
//! [`ProviderError`](crate::error::ProviderError)s and are never mixed up with
//! validation failures.
//!
//! - [`SessionSource`]: runs SQL against a DataFusion [`SessionContext`](datafusion::prelude::SessionContext).
//! - [`PostgresSource`] (feature `postgres`): runs SQL against PostgreSQL.
//! - [`ParquetReader`]: combines the Parquet files of a dataset directory.

use crate::error::Result;
use crate::table::Table;
use async_trait::async_trait;

mod parquet;
mod session;

#[cfg(feature = "postgres")]
mod postgres;

pub use parquet::{DatasetLoad, FailedFile, ParquetReader, DEFAULT_BASE_PATH};
pub use session::SessionSource;

#[cfg(feature = "postgres")]
pub use postgres::PostgresSource;

/// Produces the authoritative (source) table from a query.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Executes `query` and returns its result as a table.
    async fn fetch(&self, query: &str) -> Result<Table>;

    /// A human-readable description of the provider.
    fn description(&self) -> String;
}

/// Produces the materialised (target) table for a dataset.
#[async_trait]
pub trait TargetProvider: Send + Sync {
    /// Loads the named dataset, descending into sub-directories when
    /// `recursive` is set.
    async fn load(&self, dataset: &str, recursive: bool) -> Result<Table>;

    /// A human-readable description of the provider.
    fn description(&self) -> String;
}
