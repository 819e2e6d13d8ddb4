//! Format checks over string columns.

use super::{fail, format_values, pass};
use crate::error::{Result, SchemaError};
use crate::table::{Table, Value};
use crate::verdict::{OffendingValue, Sample, Violation};
use regex::Regex;
use tracing::instrument;

/// A permissive email address pattern: local part, `@`, domain and a
/// top-level domain of at least two letters.
pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

/// Fails when a value of `column` does not match `pattern`.
///
/// The pattern is anchored at the start of the value but not at the end; add
/// `$` to require a full match. Nulls and non-string values never match. The
/// failure carries the total count and the first five offending values.
///
/// # Examples
///
/// ```rust
/// use dq_guard::checks::{check_pattern, EMAIL_PATTERN};
/// use dq_guard::table::{Table, Value};
///
/// let table = Table::builder(vec!["email"])
///     .row(vec![Value::from("ada@example.org")])
///     .row(vec![Value::from("not-an-email")])
///     .build()
///     .unwrap();
///
/// let err = check_pattern(&table, "email", EMAIL_PATTERN).unwrap_err();
/// assert!(err.as_validation().unwrap().message.starts_with("Column 'email' has 1 values not matching"));
/// ```
#[instrument(skip(table), fields(rows = table.len()))]
pub fn check_pattern(table: &Table, column: &str, pattern: &str) -> Result<()> {
    const CHECK: &str = "check_pattern";

    let index = table.require_column(column)?;
    let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
        SchemaError::InvalidArgument {
            argument: "pattern".to_string(),
            expected: "a valid regular expression".to_string(),
            found: format!("'{pattern}' ({e})"),
        }
    })?;

    let values = Sample::collect(
        table
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| match &row[index] {
                Value::String(s) => !regex.is_match(s),
                _ => true,
            })
            .map(|(row, values)| OffendingValue {
                row,
                value: values[index].clone(),
            }),
    );

    if values.is_empty() {
        return pass(CHECK);
    }

    let message = format!(
        "Column '{column}' has {} values not matching pattern '{pattern}': {}{}",
        values.total,
        format_values(values.items.iter().map(|o| &o.value)),
        if values.truncated { "..." } else { "" },
    );

    fail(
        CHECK,
        message,
        Violation::PatternMismatch {
            column: column.to_string(),
            pattern: pattern.to_string(),
            values,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emails(values: Vec<Value>) -> Table {
        Table::builder(vec!["email"])
            .rows(values.into_iter().map(|v| vec![v]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_valid_emails_pass() {
        let table = emails(vec![
            "ada@example.org".into(),
            "first.last+tag@mail.example.co.uk".into(),
        ]);
        assert!(check_pattern(&table, "email", EMAIL_PATTERN).is_ok());
    }

    #[test]
    fn test_invalid_emails_are_reported() {
        let table = emails(vec![
            "ada@example.org".into(),
            "no-at-sign.org".into(),
            "bob@host".into(),
        ]);
        let err = check_pattern(&table, "email", EMAIL_PATTERN).unwrap_err();
        let failure = err.as_validation().unwrap();
        assert_eq!(failure.check, "check_pattern");
        match &failure.violation {
            Violation::PatternMismatch {
                column,
                pattern,
                values,
            } => {
                assert_eq!(column, "email");
                assert_eq!(pattern, EMAIL_PATTERN);
                assert_eq!(values.total, 2);
                assert_eq!(values.items[0].row, 1);
                assert_eq!(values.items[1].value, Value::from("bob@host"));
            }
            other => panic!("unexpected violation: {other:?}"),
        }
        assert!(failure.message.ends_with(": ['no-at-sign.org', 'bob@host']"));
    }

    #[test]
    fn test_nulls_and_non_strings_do_not_match() {
        let table = emails(vec![Value::Null, Value::Int(7), "ada@example.org".into()]);
        let err = check_pattern(&table, "email", EMAIL_PATTERN).unwrap_err();
        match &err.as_validation().unwrap().violation {
            Violation::PatternMismatch { values, .. } => {
                assert_eq!(values.total, 2);
                assert_eq!(values.items[0].value, Value::Null);
            }
            other => panic!("unexpected violation: {other:?}"),
        }
    }

    #[test]
    fn test_pattern_is_anchored_at_start() {
        let table = emails(vec!["AB1234-extra".into()]);
        assert!(check_pattern(&table, "email", r"[A-Z]{2}\d{4}").is_ok());
        assert!(check_pattern(&table, "email", r"\d{4}").is_err());
        assert!(check_pattern(&table, "email", r"[A-Z]{2}\d{4}$").is_err());
    }

    #[test]
    fn test_sample_is_bounded() {
        let table = emails((0..7).map(|i| Value::from(format!("user{i}"))).collect());
        let err = check_pattern(&table, "email", EMAIL_PATTERN).unwrap_err();
        let failure = err.as_validation().unwrap();
        assert!(failure.message.starts_with("Column 'email' has 7 values not matching"));
        assert!(failure.message.ends_with("'user4']..."));
    }

    #[test]
    fn test_invalid_regex_is_schema_error() {
        let table = emails(vec!["ada@example.org".into()]);
        let err = check_pattern(&table, "email", "([a-z").unwrap_err();
        match err.as_schema() {
            Some(SchemaError::InvalidArgument {
                argument, expected, ..
            }) => {
                assert_eq!(argument, "pattern");
                assert_eq!(expected, "a valid regular expression");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_column() {
        let err = check_pattern(&emails(vec![]), "mail", EMAIL_PATTERN).unwrap_err();
        assert_eq!(err.as_schema(), Some(&SchemaError::column_not_found("mail")));
    }
}
