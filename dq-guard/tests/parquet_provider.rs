//! Integration tests for the Parquet target provider.

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use dq_guard::error::ProviderError;
use dq_guard::providers::{ParquetReader, TargetProvider};
use dq_guard::table::Value;
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Writes a facility-cost Parquet file with the given rows.
fn write_costs(path: &Path, rows: &[(i64, &str, Option<f64>)]) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("facility_id", DataType::Int64, false),
        Field::new("facility_type", DataType::Utf8, false),
        Field::new("total_cost", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            )) as ArrayRef,
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.2).collect::<Vec<_>>(),
            )),
        ],
    )
    .unwrap();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn write_corrupt(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"this is not a parquet file").unwrap();
}

#[tokio::test]
async fn combines_files_of_a_dataset() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("costs");
    write_costs(&dataset.join("part-0.parquet"), &[(1, "clinic", Some(10.5))]);
    write_costs(
        &dataset.join("part-1.parquet"),
        &[(2, "hospital", Some(99.0)), (3, "clinic", None)],
    );

    let reader = ParquetReader::new(dir.path());
    let table = reader.process("costs", false).await.unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(
        table.columns(),
        &["facility_id", "facility_type", "total_cost"]
    );
    let ids: Vec<&Value> = table.column_values("facility_id").unwrap().collect();
    assert_eq!(ids, vec![&Value::Int(1), &Value::Int(2), &Value::Int(3)]);
    assert_eq!(table.row(2).unwrap().get("total_cost"), Some(&Value::Null));
    assert_eq!(
        table.row(1).unwrap().get("facility_type"),
        Some(&Value::from("hospital"))
    );
}

#[tokio::test]
async fn subfolders_only_when_recursive() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("costs");
    write_costs(&dataset.join("top.parquet"), &[(1, "clinic", Some(1.0))]);
    write_costs(
        &dataset.join("year=2024").join("nested.parquet"),
        &[(2, "clinic", Some(2.0))],
    );

    let reader = ParquetReader::new(dir.path());
    assert_eq!(reader.process("costs", false).await.unwrap().len(), 1);
    assert_eq!(reader.process("costs", true).await.unwrap().len(), 2);

    let only_nested = dir.path().join("nested_only");
    write_costs(
        &only_nested.join("a").join("x.parquet"),
        &[(1, "clinic", Some(1.0))],
    );
    let err = reader.process("nested_only", false).await.unwrap_err();
    assert!(matches!(
        err.as_provider(),
        Some(ProviderError::NotFound { .. })
    ));
}

#[tokio::test]
async fn corrupt_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("costs");
    write_costs(&dataset.join("a.parquet"), &[(1, "clinic", Some(1.0))]);
    write_corrupt(&dataset.join("b.parquet"));
    write_costs(&dataset.join("c.parquet"), &[(2, "hospital", Some(2.0))]);

    let reader = ParquetReader::new(dir.path());
    let load = reader.load_detailed("costs", false).await.unwrap();

    assert_eq!(load.table.len(), 2);
    assert_eq!(load.files_read.len(), 2);
    assert_eq!(load.files_failed.len(), 1);
    assert_eq!(load.files_failed[0].path, dataset.join("b.parquet"));
    assert!(!load.files_failed[0].error.is_empty());

    let table = reader.load("costs", false).await.unwrap();
    assert_eq!(table, load.table);
}

#[tokio::test]
async fn only_corrupt_files_is_read_error() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("broken");
    write_corrupt(&dataset.join("a.parquet"));
    write_corrupt(&dataset.join("b.parquet"));

    let err = ParquetReader::new(dir.path())
        .process("broken", false)
        .await
        .unwrap_err();
    match err.as_provider() {
        Some(ProviderError::Read { read, failed, .. }) => {
            assert_eq!(*read, 0);
            assert_eq!(*failed, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_dataset_is_not_found() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("empty")).unwrap();
    let reader = ParquetReader::new(dir.path());

    for dataset in ["empty", "does_not_exist"] {
        let err = reader.process(dataset, true).await.unwrap_err();
        assert!(err.to_string().starts_with("No parquet files found at:"));
    }
}

#[tokio::test]
async fn read_single_file() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("single.parquet");
    let bad = dir.path().join("bad.parquet");
    write_costs(&good, &[(7, "lab", Some(3.25))]);
    write_corrupt(&bad);

    let reader = ParquetReader::default();
    let table = reader.read_single_file(&good).await.unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(
        table.row(0).unwrap().get("total_cost"),
        Some(&Value::Float(3.25))
    );

    let err = reader.read_single_file(&bad).await.unwrap_err();
    assert!(matches!(
        err.as_provider(),
        Some(ProviderError::Read { failed: 1, .. })
    ));
}

#[test]
fn lists_datasets() {
    let dir = TempDir::new().unwrap();
    write_costs(
        &dir.path().join("visits").join("a.parquet"),
        &[(1, "clinic", None)],
    );
    std::fs::create_dir(dir.path().join("facilities")).unwrap();

    let reader = ParquetReader::new(dir.path());
    assert_eq!(reader.available_datasets(), vec!["facilities", "visits"]);
    assert!(reader.description().contains(&dir.path().display().to_string()));
}
