//! Source-to-target consistency checks.

use super::{fail, pass};
use crate::error::Result;
use crate::table::{Table, Value};
use crate::verdict::{Sample, UnmatchedRow, Violation};
use std::collections::{HashMap, HashSet};
use tracing::instrument;

/// Fails unless both tables hold the same rows, in any order.
///
/// Rows are compared as positional tuples, so column names need not match.
/// Multiplicity matters: a row appearing twice in `left` and once in `right`
/// is a mismatch.
#[instrument(skip_all, fields(left_rows = left.len(), right_rows = right.len()))]
pub fn check_full_data_match(left: &Table, right: &Table) -> Result<()> {
    const CHECK: &str = "check_full_data_match";

    let left_counts = row_counts(left);
    let right_counts = row_counts(right);

    let only_in_left = unmatched(left, &left_counts, &right_counts);
    let only_in_right = unmatched(right, &right_counts, &left_counts);

    if only_in_left.is_empty() && only_in_right.is_empty() {
        return pass(CHECK);
    }

    let message = format!(
        "Data does not match: {} row(s) only in left, {} row(s) only in right",
        only_in_left.total, only_in_right.total
    );
    fail(
        CHECK,
        message,
        Violation::DataMismatch {
            only_in_left,
            only_in_right,
        },
    )
}

fn row_counts(table: &Table) -> HashMap<&[Value], usize> {
    let mut counts = HashMap::new();
    for row in table.rows() {
        *counts.entry(row.as_slice()).or_insert(0) += 1;
    }
    counts
}

/// Rows of `table` that occur more often in `ours` than in `theirs`, in
/// first-occurrence order.
fn unmatched(
    table: &Table,
    ours: &HashMap<&[Value], usize>,
    theirs: &HashMap<&[Value], usize>,
) -> Sample<UnmatchedRow> {
    let mut seen: HashSet<&[Value]> = HashSet::new();
    let mut items = Vec::new();
    let mut total = 0;

    for row in table.rows() {
        let key = row.as_slice();
        if !seen.insert(key) {
            continue;
        }
        let excess = ours[key].saturating_sub(theirs.get(key).copied().unwrap_or(0));
        if excess > 0 {
            total += excess;
            items.push(UnmatchedRow {
                values: row.clone(),
                excess,
            });
        }
    }

    Sample::with_total(items, total)
}

/// Fails unless the table has exactly the expected columns, in any order.
pub fn check_column_structure(table: &Table, expected: &[&str]) -> Result<()> {
    const CHECK: &str = "check_column_structure";

    match structure_mismatch(table, expected) {
        Some((message, violation)) => fail(CHECK, message, violation),
        None => pass(CHECK),
    }
}

/// Fails unless the table has exactly the expected columns, in the expected
/// order. A differing column set is reported as a structure mismatch.
pub fn check_column_order(table: &Table, expected: &[&str]) -> Result<()> {
    const CHECK: &str = "check_column_order";

    if let Some((message, violation)) = structure_mismatch(table, expected) {
        return fail(CHECK, message, violation);
    }
    if table.columns().iter().map(String::as_str).eq(expected.iter().copied()) {
        return pass(CHECK);
    }

    let expected: Vec<String> = expected.iter().map(|name| name.to_string()).collect();
    let actual = table.columns().to_vec();
    fail(
        CHECK,
        format!(
            "Column order mismatch: expected [{}], got [{}]",
            expected.join(", "),
            actual.join(", ")
        ),
        Violation::ColumnOrder { expected, actual },
    )
}

fn structure_mismatch(table: &Table, expected: &[&str]) -> Option<(String, Violation)> {
    let missing: Vec<String> = expected
        .iter()
        .filter(|name| !table.has_column(name))
        .map(|name| name.to_string())
        .collect();
    let unexpected: Vec<String> = table
        .columns()
        .iter()
        .filter(|name| !expected.contains(&name.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        return None;
    }

    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing columns [{}]", missing.join(", ")));
    }
    if !unexpected.is_empty() {
        parts.push(format!("unexpected columns [{}]", unexpected.join(", ")));
    }
    Some((
        format!("Column structure mismatch: {}", parts.join("; ")),
        Violation::ColumnStructure {
            missing,
            unexpected,
        },
    ))
}
