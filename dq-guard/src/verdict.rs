//! Outcomes of a single check and the structured details of a failure.

use crate::error::{GuardError, Result, ValidationError};
use crate::table::Value;
use serde::Serialize;

/// Maximum number of offending items kept in a [`Sample`].
pub const SAMPLE_LIMIT: usize = 5;

/// A bounded sample of offending items together with the total count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample<T> {
    /// Total number of offending items, including those not sampled
    pub total: usize,
    /// The first `SAMPLE_LIMIT` items
    pub items: Vec<T>,
    /// Whether items were left out of the sample
    pub truncated: bool,
}

impl<T> Sample<T> {
    /// Keeps the first [`SAMPLE_LIMIT`] items and counts the rest.
    pub fn collect(items: impl IntoIterator<Item = T>) -> Self {
        let mut kept = Vec::new();
        let mut total = 0;
        for item in items {
            if kept.len() < SAMPLE_LIMIT {
                kept.push(item);
            }
            total += 1;
        }
        Self::with_total(kept, total)
    }

    /// Builds a sample whose total is counted separately from its items
    /// (e.g. when one item stands for several rows).
    pub fn with_total(mut items: Vec<T>, total: usize) -> Self {
        items.truncate(SAMPLE_LIMIT);
        let truncated = total > items.len();
        Self {
            total,
            items,
            truncated,
        }
    }

    /// Returns true when nothing offended.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// A group of rows sharing the same key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    /// Values of the considered columns
    pub key: Vec<Value>,
    /// Zero-based indices of every row in the group
    pub rows: Vec<usize>,
}

/// A row present more often on one side of a comparison than the other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedRow {
    /// The row's values in column order
    pub values: Vec<Value>,
    /// How many more times the row occurs on this side
    pub excess: usize,
}

/// A single offending cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffendingValue {
    /// Zero-based row index
    pub row: usize,
    /// The cell value
    pub value: Value,
}

/// Null findings for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnNulls {
    pub column: String,
    /// Row indices holding nulls; `total` is the column's null count
    pub rows: Sample<usize>,
}

/// Structured details of a failed check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Rows repeated on the considered columns. Every member of a group counts.
    Duplicates {
        columns: Vec<String>,
        duplicate_rows: usize,
        groups: Sample<DuplicateGroup>,
    },
    /// Row counts differ.
    CountMismatch { left: usize, right: usize },
    /// Row multisets differ.
    DataMismatch {
        only_in_left: Sample<UnmatchedRow>,
        only_in_right: Sample<UnmatchedRow>,
    },
    /// The table has no rows.
    Empty,
    /// Columns containing nulls.
    Nulls { columns: Vec<ColumnNulls> },
    /// Values outside the permitted range.
    OutOfRange {
        column: String,
        min: Option<Value>,
        max: Option<Value>,
        below_min: usize,
        above_max: usize,
        values: Sample<OffendingValue>,
    },
    /// Values not in the allowed list.
    DisallowedValues {
        column: String,
        values: Sample<OffendingValue>,
    },
    /// Values not matching a regular expression.
    PatternMismatch {
        column: String,
        pattern: String,
        values: Sample<OffendingValue>,
    },
    /// The column set differs from the expected one.
    ColumnStructure {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    /// The expected columns are present but in another order.
    ColumnOrder {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

/// Pass or fail outcome of a single check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail(ValidationError),
}

impl Verdict {
    /// Turns a check's result into a verdict.
    ///
    /// Validation failures become [`Verdict::Fail`]; schema and provider
    /// errors are not verdicts and are returned as errors.
    pub fn from_result(result: Result<()>) -> Result<Verdict> {
        match result {
            Ok(()) => Ok(Verdict::Pass),
            Err(GuardError::Validation(e)) => Ok(Verdict::Fail(e)),
            Err(other) => Err(other),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}
