//! Parquet dataset reader for target data.

use super::TargetProvider;
use crate::error::{ProviderError, Result};
use crate::table::Table;
use async_trait::async_trait;
use datafusion::prelude::{ParquetReadOptions, SessionContext};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Default root directory for Parquet datasets.
pub const DEFAULT_BASE_PATH: &str = "/parquet_data";

/// A Parquet file that could not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

/// The outcome of loading a dataset directory.
#[derive(Debug, Clone)]
pub struct DatasetLoad {
    /// Rows of every readable file, combined
    pub table: Table,
    /// Files that were read
    pub files_read: Vec<PathBuf>,
    /// Files that could not be read
    pub files_failed: Vec<FailedFile>,
}

/// Reads datasets stored as directories of Parquet files under a base path.
///
/// # Examples
///
/// ```rust,no_run
/// use dq_guard::providers::ParquetReader;
///
/// # async fn example() -> dq_guard::error::Result<()> {
/// let reader = ParquetReader::new("/parquet_data");
/// let target = reader
///     .process("patient_sum_treatment_cost_per_facility_type", true)
///     .await?;
/// println!("{} rows", target.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ParquetReader {
    base_path: PathBuf,
}

impl Default for ParquetReader {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_PATH)
    }
}

impl ParquetReader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Reads every Parquet file of a dataset and combines their rows.
    ///
    /// Only files directly inside `base_path/relative_path` are read unless
    /// `include_subfolders` is set. Unreadable files are skipped as long as at
    /// least one file could be read.
    pub async fn process(&self, relative_path: &str, include_subfolders: bool) -> Result<Table> {
        self.load_detailed(relative_path, include_subfolders)
            .await
            .map(|load| load.table)
    }

    /// Like [`process`](Self::process), but also reports which files were read
    /// and which failed.
    #[instrument(skip(self), fields(base_path = %self.base_path.display()))]
    pub async fn load_detailed(
        &self,
        relative_path: &str,
        include_subfolders: bool,
    ) -> Result<DatasetLoad> {
        let full_path = self.base_path.join(relative_path);
        let files = find_parquet_files(&full_path, include_subfolders)?;
        if files.is_empty() {
            return Err(ProviderError::NotFound {
                path: full_path.display().to_string(),
            }
            .into());
        }
        info!(files = files.len(), path = %full_path.display(), "Found parquet files");

        let ctx = SessionContext::new();
        let mut tables = Vec::with_capacity(files.len());
        let mut files_read = Vec::with_capacity(files.len());
        let mut files_failed = Vec::new();

        for file in files {
            match read_file(&ctx, &file).await {
                Ok(table) => {
                    debug!(file = %file.display(), rows = table.len(), "Read parquet file");
                    tables.push(table);
                    files_read.push(file);
                }
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "Could not read parquet file");
                    files_failed.push(FailedFile {
                        path: file,
                        error: e.to_string(),
                    });
                }
            }
        }

        if tables.is_empty() {
            let message = files_failed
                .first()
                .map(|f| f.error.clone())
                .unwrap_or_default();
            return Err(ProviderError::Read {
                path: full_path.display().to_string(),
                read: 0,
                failed: files_failed.len(),
                message,
            }
            .into());
        }

        let table = Table::concat(tables);
        info!(
            rows = table.len(),
            columns = table.num_columns(),
            files_read = files_read.len(),
            files_failed = files_failed.len(),
            "Combined parquet dataset"
        );
        Ok(DatasetLoad {
            table,
            files_read,
            files_failed,
        })
    }

    /// Reads a single Parquet file.
    #[instrument(skip(self))]
    pub async fn read_single_file(&self, path: impl AsRef<Path> + std::fmt::Debug) -> Result<Table> {
        let path = path.as_ref();
        read_file(&SessionContext::new(), path).await.map_err(|e| {
            ProviderError::Read {
                path: path.display().to_string(),
                read: 0,
                failed: 1,
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Names of the dataset directories under the base path, sorted.
    ///
    /// Returns an empty list when the base path does not exist or cannot be
    /// listed.
    pub fn available_datasets(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.base_path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(base_path = %self.base_path.display(), error = %e, "Cannot list datasets");
                return Vec::new();
            }
        };

        let mut datasets: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        datasets.sort();
        datasets
    }
}

#[async_trait]
impl TargetProvider for ParquetReader {
    async fn load(&self, dataset: &str, recursive: bool) -> Result<Table> {
        self.process(dataset, recursive).await
    }

    fn description(&self) -> String {
        format!("Parquet datasets under {}", self.base_path.display())
    }
}

fn find_parquet_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let dir_str = dir
        .to_str()
        .ok_or_else(|| ProviderError::Configuration("Path contains invalid UTF-8".to_string()))?;
    let escaped = glob::Pattern::escape(dir_str);
    let pattern = if recursive {
        format!("{escaped}/**/*.parquet")
    } else {
        format!("{escaped}/*.parquet")
    };

    let matches = glob::glob(&pattern).map_err(|e| {
        ProviderError::Configuration(format!("Invalid glob pattern '{pattern}': {e}"))
    })?;

    let mut files = Vec::new();
    for entry in matches {
        let path = entry.map_err(|e| ProviderError::Io(e.into()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

async fn read_file(ctx: &SessionContext, path: &Path) -> Result<Table> {
    let path_str = path
        .to_str()
        .ok_or_else(|| ProviderError::Configuration("Path contains invalid UTF-8".to_string()))?;
    let df = ctx
        .read_parquet(path_str, ParquetReadOptions::default())
        .await?;
    let schema = df.schema().inner().clone();
    let batches = df.collect().await?;
    Table::from_arrow(&schema, &batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_files_respects_recursion() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.parquet"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("part=1")).unwrap();
        std::fs::write(dir.path().join("part=1").join("b.parquet"), b"").unwrap();

        let flat = find_parquet_files(dir.path(), false).unwrap();
        assert_eq!(flat, vec![dir.path().join("a.parquet")]);

        let nested = find_parquet_files(dir.path(), true).unwrap();
        assert_eq!(nested.len(), 2);
    }

    #[test]
    fn test_available_datasets() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("visits")).unwrap();
        std::fs::create_dir(dir.path().join("facilities")).unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"").unwrap();

        let reader = ParquetReader::new(dir.path());
        assert_eq!(reader.available_datasets(), vec!["facilities", "visits"]);

        let missing = ParquetReader::new(dir.path().join("nope"));
        assert!(missing.available_datasets().is_empty());
    }

    #[tokio::test]
    async fn test_empty_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();

        let err = ParquetReader::new(dir.path())
            .process("empty", true)
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_provider(),
            Some(ProviderError::NotFound { .. })
        ));
    }

    #[test]
    fn test_default_base_path() {
        assert_eq!(ParquetReader::default().base_path(), Path::new(DEFAULT_BASE_PATH));
    }
}
