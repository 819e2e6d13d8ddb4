//! Duplicate detection.

use super::{fail, pass, resolve_columns};
use crate::error::Result;
use crate::table::{Table, Value};
use crate::verdict::{DuplicateGroup, Sample, Violation};
use std::collections::HashMap;
use tracing::instrument;

const CHECK: &str = "check_duplicates";

/// Fails when any row shares its values on `columns` with another row.
///
/// `None` (or an empty list) compares rows on every column. Every member of a
/// duplicate group is counted: rows `[A, A, B]` report 2 duplicates, not 1.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn check_duplicates(table: &Table, columns: Option<&[&str]>) -> Result<()> {
    let indices = resolve_columns(table, columns)?;

    let mut group_of: HashMap<Vec<&Value>, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (row_index, row) in table.rows().iter().enumerate() {
        let key: Vec<&Value> = indices.iter().map(|&i| &row[i]).collect();
        match group_of.get(&key) {
            Some(&group) => groups[group].push(row_index),
            None => {
                group_of.insert(key, groups.len());
                groups.push(vec![row_index]);
            }
        }
    }

    let duplicated: Vec<Vec<usize>> = groups.into_iter().filter(|g| g.len() > 1).collect();
    if duplicated.is_empty() {
        return pass(CHECK);
    }

    let duplicate_rows: usize = duplicated.iter().map(Vec::len).sum();
    let column_names: Vec<String> = indices
        .iter()
        .map(|&i| table.columns()[i].clone())
        .collect();
    let groups = Sample::collect(duplicated.into_iter().map(|rows| DuplicateGroup {
        key: indices.iter().map(|&i| table.rows()[rows[0]][i].clone()).collect(),
        rows,
    }));

    let message = match columns {
        Some(names) if !names.is_empty() => format!(
            "Found {duplicate_rows} duplicate records on columns [{}]",
            names.join(", ")
        ),
        _ => format!("Found {duplicate_rows} duplicate records"),
    };

    fail(
        CHECK,
        message,
        Violation::Duplicates {
            columns: column_names,
            duplicate_rows,
            groups,
        },
    )
}
