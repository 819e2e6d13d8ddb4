//! Rendering of suite reports.
//!
//! # Examples
//!
//! ```rust
//! use dq_guard::formatters::{HumanFormatter, JsonFormatter, ReportFormatter};
//! use dq_guard::suite::{CheckSpec, DatasetSuite};
//! use dq_guard::table::Table;
//!
//! let table = Table::empty(vec!["id"]).unwrap();
//! let report = DatasetSuite::builder("ids")
//!     .check(CheckSpec::Count)
//!     .build()
//!     .run(&table, &table);
//!
//! println!("{}", HumanFormatter::new().format(&report));
//! println!("{}", JsonFormatter::new().with_pretty(false).format(&report));
//! ```

use crate::logging::truncate_field;
use crate::suite::{CheckOutcome, CheckStatus, SuiteReport};
use serde::Serialize;
use std::fmt::Write;

/// Options controlling what a formatter includes.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// List passing checks as well as failures
    pub show_passed: bool,
    /// Maximum number of failures listed; `None` lists all
    pub max_failures: Option<usize>,
    /// Messages longer than this many characters are truncated
    pub max_message_length: usize,
    /// Whether to use ANSI colours (human formatter)
    pub use_colors: bool,
    pub include_timestamps: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            show_passed: true,
            max_failures: None,
            max_message_length: 1024,
            use_colors: true,
            include_timestamps: true,
        }
    }
}

impl FormatterConfig {
    /// Summary and failures only, without colours or timestamps.
    pub fn minimal() -> Self {
        Self {
            show_passed: false,
            max_failures: None,
            max_message_length: 256,
            use_colors: false,
            include_timestamps: false,
        }
    }

    /// A configuration suitable for CI logs.
    pub fn ci() -> Self {
        Self {
            show_passed: false,
            max_failures: Some(50),
            max_message_length: 512,
            use_colors: false,
            include_timestamps: true,
        }
    }

    pub fn with_show_passed(mut self, show: bool) -> Self {
        self.show_passed = show;
        self
    }

    pub fn with_max_failures(mut self, max: usize) -> Self {
        self.max_failures = Some(max);
        self
    }

    pub fn with_max_message_length(mut self, max: usize) -> Self {
        self.max_message_length = max;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn visible<'a>(&self, report: &'a SuiteReport) -> (Vec<&'a CheckOutcome>, usize) {
        let mut shown = Vec::new();
        let mut hidden = 0;
        let mut failures = 0;
        for outcome in &report.outcomes {
            if outcome.is_passed() {
                if self.show_passed {
                    shown.push(outcome);
                }
                continue;
            }
            failures += 1;
            if self.max_failures.is_some_and(|max| failures > max) {
                hidden += 1;
            } else {
                shown.push(outcome);
            }
        }
        (shown, hidden)
    }
}

/// Turns a [`SuiteReport`] into text.
pub trait ReportFormatter {
    /// Formats `report` with the formatter's own configuration.
    fn format(&self, report: &SuiteReport) -> String;

    /// Formats `report` with a custom configuration.
    fn format_with_config(&self, report: &SuiteReport, _config: &FormatterConfig) -> String {
        self.format(report)
    }
}

/// Formats reports as JSON for programmatic consumption.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ReportView<'a> {
    suite_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<&'a str>,
    success: bool,
    total: usize,
    passed: usize,
    failed: usize,
    errored: usize,
    execution_time_ms: u64,
    outcomes: Vec<&'a CheckOutcome>,
    #[serde(skip_serializing_if = "is_zero")]
    omitted_failures: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &SuiteReport) -> String {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &SuiteReport, config: &FormatterConfig) -> String {
        let (outcomes, omitted_failures) = config.visible(report);
        let view = ReportView {
            suite_name: &report.suite_name,
            timestamp: config
                .include_timestamps
                .then_some(report.timestamp.as_str()),
            success: report.is_success(),
            total: report.total(),
            passed: report.passed,
            failed: report.failed,
            errored: report.errored,
            execution_time_ms: report.execution_time_ms,
            outcomes,
            omitted_failures,
        };

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&view)
        } else {
            serde_json::to_string(&view)
        };
        rendered.unwrap_or_else(|e| {
            serde_json::json!({ "error": format!("Failed to serialize report: {e}") }).to_string()
        })
    }
}

/// Formats reports for console output.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn paint(&self, config: &FormatterConfig, code: &str, text: &str) -> String {
        if config.use_colors {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn render(
        &self,
        report: &SuiteReport,
        config: &FormatterConfig,
        out: &mut String,
    ) -> std::fmt::Result {
        writeln!(out)?;
        if report.is_success() {
            writeln!(out, "{}", self.paint(config, "32", "Validation PASSED"))?;
        } else {
            writeln!(out, "{}", self.paint(config, "31", "Validation FAILED"))?;
        }
        writeln!(out)?;
        writeln!(out, "Suite: {}", report.suite_name)?;
        if config.include_timestamps {
            writeln!(out, "Timestamp: {}", report.timestamp)?;
        }

        writeln!(out)?;
        writeln!(out, "Summary:")?;
        writeln!(out, "   Total Checks: {}", report.total())?;
        writeln!(out, "   Passed: {}", self.paint(config, "32", &report.passed.to_string()))?;
        writeln!(out, "   Failed: {}", self.paint(config, "31", &report.failed.to_string()))?;
        writeln!(out, "   Errored: {}", self.paint(config, "33", &report.errored.to_string()))?;
        writeln!(out, "   Execution Time: {}ms", report.execution_time_ms)?;

        let (outcomes, hidden) = config.visible(report);
        if !outcomes.is_empty() {
            writeln!(out)?;
            writeln!(out, "Checks:")?;
        }
        for outcome in outcomes {
            match &outcome.status {
                CheckStatus::Passed => {
                    writeln!(out, "   {} {}", self.paint(config, "32", "PASS"), outcome.name)?;
                }
                CheckStatus::Failed { error } => {
                    writeln!(out, "   {} {}", self.paint(config, "31", "FAIL"), outcome.name)?;
                    let message = truncate_field(&error.message, config.max_message_length);
                    writeln!(out, "      {message}")?;
                }
                CheckStatus::Errored { kind, message } => {
                    writeln!(out, "   {} {}", self.paint(config, "33", "ERROR"), outcome.name)?;
                    let message = truncate_field(message, config.max_message_length);
                    writeln!(out, "      [{kind}] {message}")?;
                }
            }
        }
        if hidden > 0 {
            writeln!(out)?;
            writeln!(out, "   ... and {hidden} more failures")?;
        }
        writeln!(out)
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &SuiteReport) -> String {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &SuiteReport, config: &FormatterConfig) -> String {
        let mut output = String::new();
        // Writing to a String cannot fail.
        let _ = self.render(report, config, &mut output);
        output
    }
}
