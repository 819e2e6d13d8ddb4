//! Declarative check suites over a source and a target table.
//!
//! A [`DatasetSuite`] bundles [`CheckSpec`]s that are run together against a
//! source (authoritative) table and a target (materialised) table. Every check
//! runs even when an earlier one fails, and each outcome is recorded in a
//! [`SuiteReport`].
//!
//! Suites can be built in code or read from JSON:
//!
//! ```rust
//! use dq_guard::suite::DatasetSuite;
//! use dq_guard::table::{Table, Value};
//!
//! let suite = DatasetSuite::from_json(r#"{
//!     "name": "facility_costs",
//!     "checks": [
//!         {"check": "not_empty"},
//!         {"check": "count"},
//!         {"check": "duplicates", "columns": ["facility_type"]},
//!         {"check": "allowed_values", "column": "facility_type", "allowed_values": ["clinic", "hospital"]}
//!     ]
//! }"#).unwrap();
//!
//! let table = Table::builder(vec!["facility_type"])
//!     .row(vec![Value::from("clinic")])
//!     .build()
//!     .unwrap();
//!
//! let report = suite.run(&table, &table);
//! assert!(report.is_success());
//! ```

use crate::checks::{self, parse_allowed_values};
use crate::error::{ErrorKind, GuardError, Result, SchemaError, ValidationError};
use crate::providers::{SourceProvider, TargetProvider};
use crate::table::{Table, Value};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Which of the two tables a single-table check inspects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Source,
    #[default]
    Target,
}

impl Dataset {
    fn select<'a>(self, source: &'a Table, target: &'a Table) -> &'a Table {
        match self {
            Dataset::Source => source,
            Dataset::Target => target,
        }
    }
}

/// The allowed-values argument as written in a suite definition.
///
/// Anything other than a list of scalars is kept as-is and rejected with a
/// schema error when the check runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AllowedValues {
    List(Vec<Value>),
    Other(serde_json::Value),
}

impl AllowedValues {
    fn resolve(&self) -> std::result::Result<Vec<Value>, SchemaError> {
        match self {
            AllowedValues::List(values) => Ok(values.clone()),
            AllowedValues::Other(raw) => parse_allowed_values(raw),
        }
    }
}

impl From<Vec<Value>> for AllowedValues {
    fn from(values: Vec<Value>) -> Self {
        AllowedValues::List(values)
    }
}

/// One check of a suite, with its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum CheckSpec {
    NotEmpty {
        #[serde(default)]
        dataset: Dataset,
    },
    Count,
    FullDataMatch,
    Duplicates {
        #[serde(default)]
        dataset: Dataset,
        #[serde(default)]
        columns: Option<Vec<String>>,
    },
    NotNull {
        #[serde(default)]
        dataset: Dataset,
        #[serde(default)]
        columns: Option<Vec<String>>,
    },
    ValueRange {
        #[serde(default)]
        dataset: Dataset,
        column: String,
        #[serde(default)]
        min: Option<Value>,
        #[serde(default)]
        max: Option<Value>,
    },
    AllowedValues {
        #[serde(default)]
        dataset: Dataset,
        column: String,
        allowed_values: AllowedValues,
    },
    Pattern {
        #[serde(default)]
        dataset: Dataset,
        column: String,
        pattern: String,
    },
    /// Set `ordered` to also require the expected column order.
    ColumnStructure {
        #[serde(default)]
        dataset: Dataset,
        expected: Vec<String>,
        #[serde(default)]
        ordered: bool,
    },
}

impl CheckSpec {
    /// Name of the check function this runs.
    pub fn name(&self) -> &'static str {
        match self {
            CheckSpec::NotEmpty { .. } => "check_not_empty",
            CheckSpec::Count => "check_count",
            CheckSpec::FullDataMatch => "check_full_data_match",
            CheckSpec::Duplicates { .. } => "check_duplicates",
            CheckSpec::NotNull { .. } => "check_not_null",
            CheckSpec::ValueRange { .. } => "check_value_range",
            CheckSpec::AllowedValues { .. } => "check_allowed_values",
            CheckSpec::Pattern { .. } => "check_pattern",
            CheckSpec::ColumnStructure { ordered: false, .. } => "check_column_structure",
            CheckSpec::ColumnStructure { ordered: true, .. } => "check_column_order",
        }
    }

    /// Runs the check against the source and target tables.
    pub fn run(&self, source: &Table, target: &Table) -> Result<()> {
        match self {
            CheckSpec::NotEmpty { dataset } => {
                checks::check_not_empty(dataset.select(source, target))
            }
            CheckSpec::Count => checks::check_count(source, target),
            CheckSpec::FullDataMatch => checks::check_full_data_match(source, target),
            CheckSpec::Duplicates { dataset, columns } => {
                let columns = as_strs(columns.as_deref());
                checks::check_duplicates(dataset.select(source, target), columns.as_deref())
            }
            CheckSpec::NotNull { dataset, columns } => {
                let columns = as_strs(columns.as_deref());
                checks::check_not_null(dataset.select(source, target), columns.as_deref())
            }
            CheckSpec::ValueRange {
                dataset,
                column,
                min,
                max,
            } => checks::check_value_range(
                dataset.select(source, target),
                column,
                min.clone(),
                max.clone(),
            ),
            CheckSpec::AllowedValues {
                dataset,
                column,
                allowed_values,
            } => {
                let allowed = allowed_values.resolve()?;
                checks::check_allowed_values(dataset.select(source, target), column, &allowed)
            }
            CheckSpec::Pattern {
                dataset,
                column,
                pattern,
            } => checks::check_pattern(dataset.select(source, target), column, pattern),
            CheckSpec::ColumnStructure {
                dataset,
                expected,
                ordered,
            } => {
                let table = dataset.select(source, target);
                let expected: Vec<&str> = expected.iter().map(String::as_str).collect();
                if *ordered {
                    checks::check_column_order(table, &expected)
                } else {
                    checks::check_column_structure(table, &expected)
                }
            }
        }
    }
}

fn as_strs(columns: Option<&[String]>) -> Option<Vec<&str>> {
    columns.map(|cols| cols.iter().map(String::as_str).collect())
}

/// A named collection of checks run together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSuite {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    checks: Vec<CheckSpec>,
}

impl DatasetSuite {
    /// Creates a new builder for a suite called `name`.
    pub fn builder(name: impl Into<String>) -> DatasetSuiteBuilder {
        DatasetSuiteBuilder::new(name)
    }

    /// Reads a suite definition from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            SchemaError::InvalidArgument {
                argument: "suite".to_string(),
                expected: "a valid suite definition".to_string(),
                found: e.to_string(),
            }
            .into()
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn checks(&self) -> &[CheckSpec] {
        &self.checks
    }

    /// Runs every check against already fetched tables.
    ///
    /// A failing or misconfigured check never stops the suite; its outcome is
    /// recorded and the next check runs.
    #[instrument(skip(self, source, target), fields(
        suite.name = %self.name,
        suite.checks = self.checks.len(),
        source.rows = source.len(),
        target.rows = target.len()
    ))]
    pub fn run(&self, source: &Table, target: &Table) -> SuiteReport {
        info!(
            suite.name = %self.name,
            suite.checks = self.checks.len(),
            suite.description = ?self.description,
            "Starting check suite"
        );
        let start_time = Instant::now();
        let mut report = SuiteReport::new(&self.name);

        for spec in &self.checks {
            let status = match spec.run(source, target) {
                Ok(()) => {
                    debug!(check = spec.name(), "Check passed");
                    CheckStatus::Passed
                }
                Err(GuardError::Validation(error)) => CheckStatus::Failed { error },
                Err(e) => {
                    warn!(check = spec.name(), kind = %e.kind(), error = %e, "Check could not run");
                    CheckStatus::Errored {
                        kind: e.kind(),
                        message: e.to_string(),
                    }
                }
            };
            report.record(CheckOutcome {
                name: spec.name().to_string(),
                status,
            });
        }

        report.execution_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            suite.name = %self.name,
            report.passed = report.passed,
            report.failed = report.failed,
            report.errored = report.errored,
            "Check suite completed"
        );
        report
    }

    /// Fetches both tables through their providers, then runs the suite.
    ///
    /// Provider failures are returned as errors rather than recorded in the
    /// report, since no check could have run.
    #[instrument(skip(self, source, target), fields(
        suite.name = %self.name,
        source = %source.description(),
        target = %target.description()
    ))]
    pub async fn run_with(
        &self,
        source: &dyn SourceProvider,
        query: &str,
        target: &dyn TargetProvider,
        dataset: &str,
        recursive: bool,
    ) -> Result<SuiteReport> {
        let source_table = source.fetch(query).await?;
        let target_table = target.load(dataset, recursive).await?;
        Ok(self.run(&source_table, &target_table))
    }
}

/// Builder for [`DatasetSuite`].
#[derive(Debug)]
pub struct DatasetSuiteBuilder {
    name: String,
    description: Option<String>,
    checks: Vec<CheckSpec>,
}

impl DatasetSuiteBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            checks: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn check(mut self, check: CheckSpec) -> Self {
        self.checks.push(check);
        self
    }

    pub fn checks<I>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = CheckSpec>,
    {
        self.checks.extend(checks);
        self
    }

    pub fn build(self) -> DatasetSuite {
        DatasetSuite {
            name: self.name,
            description: self.description,
            checks: self.checks,
        }
    }
}

/// How a single check of a suite ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    /// The data violated the rule.
    Failed { error: ValidationError },
    /// The check was misconfigured and did not produce a verdict.
    Errored { kind: ErrorKind, message: String },
}

/// The outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub name: String,
    #[serde(flatten)]
    pub status: CheckStatus,
}

impl CheckOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self.status, CheckStatus::Passed)
    }

    /// The failure or error message, if the check did not pass.
    pub fn message(&self) -> Option<&str> {
        match &self.status {
            CheckStatus::Passed => None,
            CheckStatus::Failed { error } => Some(&error.message),
            CheckStatus::Errored { message, .. } => Some(message),
        }
    }
}

/// Results of a suite run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteReport {
    pub suite_name: String,
    /// RFC 3339 timestamp of the run
    pub timestamp: String,
    pub outcomes: Vec<CheckOutcome>,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub execution_time_ms: u64,
}

impl SuiteReport {
    pub fn new(suite_name: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            outcomes: Vec::new(),
            passed: 0,
            failed: 0,
            errored: 0,
            execution_time_ms: 0,
        }
    }

    fn record(&mut self, outcome: CheckOutcome) {
        match outcome.status {
            CheckStatus::Passed => self.passed += 1,
            CheckStatus::Failed { .. } => self.failed += 1,
            CheckStatus::Errored { .. } => self.errored += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// True when every check passed.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    /// Outcomes of the checks that did not pass, in run order.
    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.is_passed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::Violation;

    fn orders() -> Table {
        Table::builder(vec!["order_id", "status"])
            .row(vec![Value::Int(1), Value::from("OPEN")])
            .row(vec![Value::Int(2), Value::from("CLOSED")])
            .row(vec![Value::Int(2), Value::from("CLOSED")])
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_runs_all_checks() {
        let suite = DatasetSuite::builder("orders")
            .description("order export")
            .check(CheckSpec::NotEmpty {
                dataset: Dataset::Target,
            })
            .check(CheckSpec::Duplicates {
                dataset: Dataset::Target,
                columns: Some(vec!["order_id".to_string()]),
            })
            .check(CheckSpec::NotNull {
                dataset: Dataset::Target,
                columns: Some(vec!["missing".to_string()]),
            })
            .check(CheckSpec::Count)
            .build();

        let table = orders();
        let report = suite.run(&table, &table);

        assert_eq!(report.total(), 4);
        assert_eq!((report.passed, report.failed, report.errored), (2, 1, 1));
        assert!(!report.is_success());

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures[0].name, "check_duplicates");
        assert_eq!(
            failures[0].message(),
            Some("Found 2 duplicate records on columns [order_id]")
        );
        assert!(matches!(
            &failures[1].status,
            CheckStatus::Errored { kind: ErrorKind::Schema, .. }
        ));
        assert_eq!(
            failures[1].message(),
            Some("Column 'missing' not found in table")
        );
    }

    #[test]
    fn test_dataset_selection() {
        let source = orders();
        let target = Table::empty(vec!["order_id", "status"]).unwrap();

        let check = CheckSpec::NotEmpty {
            dataset: Dataset::Source,
        };
        assert!(check.run(&source, &target).is_ok());

        let check = CheckSpec::NotEmpty {
            dataset: Dataset::Target,
        };
        let err = check.run(&source, &target).unwrap_err();
        assert_eq!(
            err.as_validation().map(|e| &e.violation),
            Some(&Violation::Empty)
        );
    }

    #[test]
    fn test_from_json_defaults_to_target() {
        let suite = DatasetSuite::from_json(
            r#"{
                "name": "orders",
                "checks": [
                    {"check": "value_range", "column": "order_id", "min": 1, "max": 10},
                    {"check": "column_structure", "dataset": "source", "expected": ["order_id", "status"]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(suite.name(), "orders");
        assert_eq!(suite.description(), None);
        assert_eq!(
            suite.checks()[0],
            CheckSpec::ValueRange {
                dataset: Dataset::Target,
                column: "order_id".to_string(),
                min: Some(Value::Int(1)),
                max: Some(Value::Int(10)),
            }
        );

        let table = orders();
        assert!(suite.run(&table, &table).is_success());
    }

    #[test]
    fn test_pattern_and_ordered_columns_from_json() {
        let suite = DatasetSuite::from_json(
            r#"{
                "name": "orders",
                "checks": [
                    {"check": "pattern", "column": "status", "pattern": "^[A-Z]+$"},
                    {"check": "pattern", "column": "status", "pattern": "(OPEN"},
                    {"check": "column_structure", "expected": ["status", "order_id"]},
                    {"check": "column_structure", "expected": ["status", "order_id"], "ordered": true}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            suite.checks()[2],
            CheckSpec::ColumnStructure {
                dataset: Dataset::Target,
                expected: vec!["status".to_string(), "order_id".to_string()],
                ordered: false,
            }
        );

        let table = orders();
        let report = suite.run(&table, &table);
        let names: Vec<&str> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "check_pattern",
                "check_pattern",
                "check_column_structure",
                "check_column_order"
            ]
        );
        assert_eq!((report.passed, report.failed, report.errored), (2, 1, 1));
        assert!(matches!(
            &report.outcomes[1].status,
            CheckStatus::Errored { kind: ErrorKind::Schema, .. }
        ));
        assert!(matches!(report.outcomes[3].status, CheckStatus::Failed { .. }));
    }

    #[test]
    fn test_scalar_allowed_values_is_schema_error() {
        let suite = DatasetSuite::from_json(
            r#"{
                "name": "orders",
                "checks": [
                    {"check": "allowed_values", "column": "status", "allowed_values": "OPEN"}
                ]
            }"#,
        )
        .unwrap();

        let table = orders();
        let report = suite.run(&table, &table);
        assert_eq!(report.errored, 1);
        assert_eq!(
            report.outcomes[0].message(),
            Some("allowed_values must be a list of scalar values, got string")
        );
    }

    #[test]
    fn test_invalid_suite_json() {
        let err = DatasetSuite::from_json(r#"{"name": "x", "checks": [{"check": "nope"}]}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_report_serializes_status() {
        let suite = DatasetSuite::builder("orders")
            .check(CheckSpec::Count)
            .build();
        let table = orders();
        let report = suite.run(&table, &table);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][0]["name"], "check_count");
        assert_eq!(json["outcomes"][0]["status"], "passed");
        assert!(chrono::DateTime::parse_from_rfc3339(&report.timestamp).is_ok());
    }
}
