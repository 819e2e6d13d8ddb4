//! Null checks.

use super::{fail, pass, resolve_columns};
use crate::error::Result;
use crate::table::Table;
use crate::verdict::{ColumnNulls, Sample, Violation};
use tracing::instrument;

const CHECK: &str = "check_not_null";

/// Fails when any listed column holds a null (or NaN) value.
///
/// `None` checks every column; `Some(&[])` checks nothing and passes. Every
/// listed column must exist, otherwise a schema error is returned before any
/// data is inspected.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn check_not_null(table: &Table, columns: Option<&[&str]>) -> Result<()> {
    let indices = match columns {
        Some([]) => Vec::new(),
        other => resolve_columns(table, other)?,
    };

    let findings: Vec<ColumnNulls> = indices
        .iter()
        .filter_map(|&index| {
            let rows = Sample::collect(
                table
                    .rows()
                    .iter()
                    .enumerate()
                    .filter(|(_, row)| row[index].is_missing())
                    .map(|(i, _)| i),
            );
            (!rows.is_empty()).then(|| ColumnNulls {
                column: table.columns()[index].clone(),
                rows,
            })
        })
        .collect();

    if findings.is_empty() {
        return pass(CHECK);
    }

    let message = findings
        .iter()
        .map(|f| format!("Column '{}' has {} null values", f.column, f.rows.total))
        .collect::<Vec<_>>()
        .join("; ");
    fail(CHECK, message, Violation::Nulls { columns: findings })
}
