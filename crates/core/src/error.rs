use polars::prelude::PolarsError;
use thiserror::Error;

use crate::attributes::DataSource;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Error taxonomy for the attribute and operation layer.
///
/// A registered attribute that happens to be absent from a particular table is
/// not an error for aggregation or normalization; those skip it. The
/// `MissingColumn` variant covers the fatal case where a formula or operation
/// references a column the table must contain.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("attribute '{name}' is already registered from source {existing_source:?}")]
    DuplicateAttribute {
        name: String,
        existing_source: DataSource,
    },

    #[error("missing column '{column}' ({context})")]
    MissingColumn { column: String, context: String },

    #[error("column '{column}' is required by {operation} but is not in the table")]
    MissingDependency { column: String, operation: String },

    #[error("invalid filter: {message}")]
    InvalidFilter { message: String },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl CoreError {
    pub fn missing_column(column: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            context: context.into(),
        }
    }

    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter {
            message: message.into(),
        }
    }
}
