//! The data-quality check catalogue.
//!
//! Every check is a free function over one or two [`Table`]s. A check returns
//! `Ok(())` when the data satisfies the rule and a [`GuardError::Validation`]
//! carrying a structured [`Violation`](crate::verdict::Violation) when it does
//! not. Checks that are pointed at a missing column, or given malformed
//! parameters, return a [`GuardError::Schema`] instead.
//!
//! Checks hold no state and never mutate their inputs, so they can run in any
//! order and from any number of threads.
//!
//! # Examples
//!
//! ```rust
//! use dq_guard::checks::{check_duplicates, check_not_empty};
//! use dq_guard::table::{Table, Value};
//!
//! let table = Table::builder(vec!["id"])
//!     .row(vec![Value::Int(1)])
//!     .row(vec![Value::Int(1)])
//!     .row(vec![Value::Int(2)])
//!     .build()
//!     .unwrap();
//!
//! assert!(check_not_empty(&table).is_ok());
//!
//! let err = check_duplicates(&table, Some(&["id"])).unwrap_err();
//! assert_eq!(err.as_validation().unwrap().message, "Found 2 duplicate records on columns [id]");
//! ```

mod completeness;
mod consistency;
mod format;
mod size;
mod uniqueness;
mod values;

pub use completeness::check_not_null;
pub use consistency::{check_column_order, check_column_structure, check_full_data_match};
pub use format::{check_pattern, EMAIL_PATTERN};
pub use size::{check_count, check_not_empty};
pub use uniqueness::check_duplicates;
pub use values::{check_allowed_values, check_value_range, parse_allowed_values};

use crate::error::{GuardError, Result, SchemaError, ValidationError};
use crate::table::{Table, Value};
use crate::verdict::Violation;
use tracing::{debug, warn};

fn pass(check: &'static str) -> Result<()> {
    debug!(check, "Data quality check passed");
    Ok(())
}

fn fail(check: &'static str, message: String, violation: Violation) -> Result<()> {
    warn!(check, %message, "Data quality check failed");
    Err(GuardError::Validation(ValidationError::new(
        check, message, violation,
    )))
}

/// Resolves column names to indices. `None` or an empty list selects every
/// column.
fn resolve_columns(
    table: &Table,
    columns: Option<&[&str]>,
) -> std::result::Result<Vec<usize>, SchemaError> {
    match columns {
        Some(names) if !names.is_empty() => names
            .iter()
            .map(|name| table.require_column(name))
            .collect(),
        _ => Ok((0..table.num_columns()).collect()),
    }
}

fn format_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> String {
    let rendered: Vec<String> = values.into_iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_columns() {
        let table = Table::empty(vec!["a", "b", "c"]).unwrap();
        assert_eq!(resolve_columns(&table, None).unwrap(), vec![0, 1, 2]);
        assert_eq!(resolve_columns(&table, Some(&[])).unwrap(), vec![0, 1, 2]);
        assert_eq!(resolve_columns(&table, Some(&["c", "a"])).unwrap(), vec![2, 0]);
        assert_eq!(
            resolve_columns(&table, Some(&["z"])).unwrap_err(),
            SchemaError::column_not_found("z")
        );
    }

    #[test]
    fn test_format_values() {
        let values = [Value::from("OPEN"), Value::Int(3), Value::Null];
        assert_eq!(format_values(&values), "['OPEN', 3, null]");
    }
}
