//! Value-based checks: ranges and allowed values.

use super::{fail, format_values, pass};
use crate::error::{Result, SchemaError};
use crate::table::{Table, Value};
use crate::verdict::{OffendingValue, Sample, Violation};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::instrument;

/// Fails when a non-null value of `column` lies outside `[min, max]`.
///
/// An omitted bound leaves that side unbounded. Null and NaN values are
/// skipped. A value that cannot be ordered against a bound (e.g. a string
/// against a numeric bound) is a schema error.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn check_value_range(
    table: &Table,
    column: &str,
    min: Option<Value>,
    max: Option<Value>,
) -> Result<()> {
    const CHECK: &str = "check_value_range";

    let index = table.require_column(column)?;
    for (name, bound) in [("min_value", &min), ("max_value", &max)] {
        if let Some(bound) = bound.as_ref().filter(|b| b.is_missing()) {
            return Err(SchemaError::InvalidArgument {
                argument: name.to_string(),
                expected: "a comparable value".to_string(),
                found: bound.to_string(),
            }
            .into());
        }
    }

    let compare = |value: &Value, bound: &Value| {
        value
            .partial_cmp(bound)
            .ok_or_else(|| SchemaError::TypeMismatch {
                column: column.to_string(),
                value: value.to_string(),
                bound: bound.to_string(),
            })
    };

    let mut below_min = 0;
    let mut above_max = 0;
    let mut offending = Vec::new();
    for (row, values) in table.rows().iter().enumerate() {
        let value = &values[index];
        if value.is_missing() {
            continue;
        }
        let below = match &min {
            Some(min) => compare(value, min)? == Ordering::Less,
            None => false,
        };
        let above = match &max {
            Some(max) => compare(value, max)? == Ordering::Greater,
            None => false,
        };
        if below {
            below_min += 1;
        }
        if above {
            above_max += 1;
        }
        if below || above {
            offending.push(OffendingValue {
                row,
                value: value.clone(),
            });
        }
    }

    if offending.is_empty() {
        return pass(CHECK);
    }

    let values = Sample::collect(offending);
    let render = |bound: &Option<Value>| {
        bound
            .as_ref()
            .map_or_else(|| "unbounded".to_string(), ToString::to_string)
    };
    let message = format!(
        "Column '{column}' has {} values out of range [{}, {}] ({below_min} below minimum, {above_max} above maximum): {}{}",
        values.total,
        render(&min),
        render(&max),
        format_values(values.items.iter().map(|o| &o.value)),
        if values.truncated { "..." } else { "" },
    );

    fail(
        CHECK,
        message,
        Violation::OutOfRange {
            column: column.to_string(),
            min,
            max,
            below_min,
            above_max,
            values,
        },
    )
}

/// Fails when `column` holds a value that is not in `allowed`.
///
/// `Null` is only allowed when `allowed` contains `Null`. The failure carries
/// the total count and the first five offending values.
#[instrument(skip(table, allowed), fields(rows = table.len(), allowed = allowed.len()))]
pub fn check_allowed_values(table: &Table, column: &str, allowed: &[Value]) -> Result<()> {
    const CHECK: &str = "check_allowed_values";

    let index = table.require_column(column)?;
    let allowed: HashSet<&Value> = allowed.iter().collect();

    let values = Sample::collect(
        table
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| !allowed.contains(&row[index]))
            .map(|(row, values)| OffendingValue {
                row,
                value: values[index].clone(),
            }),
    );

    if values.is_empty() {
        return pass(CHECK);
    }

    let sample = format_values(values.items.iter().map(|o| &o.value));
    let message = if values.truncated {
        format!(
            "Column '{column}' has {} invalid values (sample: {sample}...)",
            values.total
        )
    } else {
        format!("Column '{column}' has {} invalid values: {sample}", values.total)
    };

    fail(
        CHECK,
        message,
        Violation::DisallowedValues {
            column: column.to_string(),
            values,
        },
    )
}

/// Reads an allowed-values argument from JSON.
///
/// The argument must be an array of scalars; anything else is a
/// [`SchemaError::InvalidArgument`].
pub fn parse_allowed_values(
    raw: &serde_json::Value,
) -> std::result::Result<Vec<Value>, SchemaError> {
    let invalid = |found: &str| SchemaError::InvalidArgument {
        argument: "allowed_values".to_string(),
        expected: "a list of scalar values".to_string(),
        found: found.to_string(),
    };

    let items = raw.as_array().ok_or_else(|| invalid(json_type(raw)))?;
    items
        .iter()
        .map(|item| {
            Value::from_json(item)
                .ok_or_else(|| invalid(&format!("a list containing {}", json_type(item))))
        })
        .collect()
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column(name: &str, values: Vec<Value>) -> Table {
        Table::builder(vec![name])
            .rows(values.into_iter().map(|v| vec![v]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_value_range_reports_offenders() {
        let ages = column("age", vec![10.into(), 50.into(), 150.into()]);
        let err = check_value_range(&ages, "age", Some(0.into()), Some(120.into())).unwrap_err();
        let failure = err.as_validation().unwrap();
        match &failure.violation {
            Violation::OutOfRange {
                below_min,
                above_max,
                values,
                ..
            } => {
                assert_eq!(*below_min, 0);
                assert_eq!(*above_max, 1);
                assert_eq!(values.total, 1);
                assert_eq!(values.items[0].value, Value::Int(150));
                assert_eq!(values.items[0].row, 2);
            }
            other => panic!("unexpected violation: {other:?}"),
        }
        assert!(failure.message.starts_with("Column 'age' has 1 values out of range [0, 120]"));
    }

    #[test]
    fn test_value_range_open_bounds() {
        let costs = column("cost", vec![0.5.into(), 1e9.into(), Value::Null]);
        assert!(check_value_range(&costs, "cost", Some(0.into()), None).is_ok());
        assert!(check_value_range(&costs, "cost", None, Some(Value::Float(f64::INFINITY))).is_ok());
        assert!(check_value_range(&costs, "cost", None, None).is_ok());
        assert!(check_value_range(&costs, "cost", Some(1.into()), None).is_err());
    }

    #[test]
    fn test_value_range_type_mismatch() {
        let names = column("name", vec!["a".into()]);
        let err = check_value_range(&names, "name", Some(0.into()), None).unwrap_err();
        assert!(matches!(err.as_schema(), Some(SchemaError::TypeMismatch { .. })));
    }

    #[test]
    fn test_value_range_missing_column() {
        let err = check_value_range(&Table::default(), "age", None, None).unwrap_err();
        assert_eq!(err.as_schema(), Some(&SchemaError::column_not_found("age")));
    }

    #[test]
    fn test_value_range_rejects_null_bound() {
        let ages = column("age", vec![1.into()]);
        let err = check_value_range(&ages, "age", Some(Value::Null), None).unwrap_err();
        assert!(matches!(err.as_schema(), Some(SchemaError::InvalidArgument { .. })));
    }

    #[test]
    fn test_allowed_values() {
        let status = column("status", vec!["OPEN".into(), "CLOSED".into(), "PENDING".into()]);
        let err = check_allowed_values(&status, "status", &["OPEN".into(), "CLOSED".into()])
            .unwrap_err();
        let failure = err.as_validation().unwrap();
        assert_eq!(failure.message, "Column 'status' has 1 invalid values: ['PENDING']");
        match &failure.violation {
            Violation::DisallowedValues { values, .. } => {
                assert_eq!(values.items[0].value, Value::from("PENDING"));
                assert!(!values.truncated);
            }
            other => panic!("unexpected violation: {other:?}"),
        }
    }

    #[test]
    fn test_allowed_values_sample_is_bounded() {
        let codes = column("code", (0..8).map(Value::from).collect());
        let err = check_allowed_values(&codes, "code", &[Value::Int(0)]).unwrap_err();
        let failure = err.as_validation().unwrap();
        assert_eq!(
            failure.message,
            "Column 'code' has 7 invalid values (sample: [1, 2, 3, 4, 5]...)"
        );
    }

    #[test]
    fn test_null_needs_to_be_allowed() {
        let status = column("status", vec![Value::Null]);
        assert!(check_allowed_values(&status, "status", &["OPEN".into()]).is_err());
        assert!(check_allowed_values(&status, "status", &[Value::Null]).is_ok());
    }

    #[test]
    fn test_parse_allowed_values() {
        assert_eq!(
            parse_allowed_values(&json!(["OPEN", 1])).unwrap(),
            vec![Value::from("OPEN"), Value::Int(1)]
        );
        assert_eq!(
            parse_allowed_values(&json!("OPEN")).unwrap_err(),
            SchemaError::InvalidArgument {
                argument: "allowed_values".to_string(),
                expected: "a list of scalar values".to_string(),
                found: "string".to_string(),
            }
        );
        assert!(parse_allowed_values(&json!([["nested"]])).is_err());
    }
}
