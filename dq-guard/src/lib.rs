//! # dq-guard - data-quality checks for pipeline outputs
//!
//! dq-guard verifies that a materialised dataset (the *target*, typically a
//! directory of Parquet files) is consistent with the authoritative *source*
//! it was derived from (typically a SQL query), and that individual tables
//! satisfy common data-quality rules.
//!
//! ## Quick Start
//!
//! ```rust
//! use dq_guard::prelude::*;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let source = Table::builder(vec!["facility_type", "total_cost"])
//!     .row(vec![Value::from("clinic"), Value::from(120.5)])
//!     .row(vec![Value::from("hospital"), Value::from(990.0)])
//!     .build()?;
//! let target = source.clone();
//!
//! check_count(&source, &target)?;
//! check_full_data_match(&source, &target)?;
//! check_not_null(&target, None)?;
//! check_value_range(&target, "total_cost", Some(Value::Int(0)), None)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Every check returns `Ok(())` or a [`GuardError`](error::GuardError):
//!
//! - `Validation`: the data is wrong. The error carries a message and a
//!   structured [`Violation`](verdict::Violation).
//! - `Schema`: the check was pointed at a missing column or given malformed
//!   arguments.
//! - `Provider`: a table could not be produced.
//!
//! ## Architecture
//!
//! - **`table`**: the in-memory [`Table`](table::Table) and its cell [`Value`](table::Value)s
//! - **`checks`**: the check functions
//! - **`providers`**: source and target table providers (DataFusion SQL,
//!   PostgreSQL behind the `postgres` feature, Parquet directories)
//! - **`suite`**: declarative check suites and their reports
//! - **`formatters`**: human and JSON report rendering
//! - **`config`**: environment-driven connection settings
//! - **`logging`**: `tracing` subscriber setup

pub mod checks;
pub mod config;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod providers;
pub mod security;
pub mod suite;
pub mod table;
pub mod verdict;
