//! Prelude for commonly used types and functions in dq-guard.

pub use crate::checks::{
    check_allowed_values, check_column_order, check_column_structure, check_count,
    check_duplicates, check_full_data_match, check_not_empty, check_not_null, check_pattern,
    check_value_range, EMAIL_PATTERN,
};
pub use crate::error::{ErrorKind, GuardError, ProviderError, Result, SchemaError, ValidationError};
pub use crate::formatters::{FormatterConfig, ReportFormatter};
pub use crate::providers::{ParquetReader, SessionSource, SourceProvider, TargetProvider};
pub use crate::suite::{CheckSpec, Dataset, DatasetSuite, SuiteReport};
pub use crate::table::{Table, Value};
pub use crate::verdict::{Verdict, Violation};
