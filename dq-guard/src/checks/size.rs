//! Row-count checks.

use super::{fail, pass};
use crate::error::Result;
use crate::table::Table;
use crate::verdict::Violation;

/// Fails when the two tables have different row counts. Columns are ignored.
pub fn check_count(left: &Table, right: &Table) -> Result<()> {
    const CHECK: &str = "check_count";

    let (left, right) = (left.len(), right.len());
    if left == right {
        return pass(CHECK);
    }
    fail(
        CHECK,
        format!("Count mismatch: {left} vs {right}"),
        Violation::CountMismatch { left, right },
    )
}

/// Fails when the table has no rows.
pub fn check_not_empty(table: &Table) -> Result<()> {
    const CHECK: &str = "check_not_empty";

    if !table.is_empty() {
        return pass(CHECK);
    }
    fail(CHECK, "Table is empty".to_string(), Violation::Empty)
}
