//! Validation related error types

use thiserror::Error;

/// Validation and configuration errors
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Invalid input parameter
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A data row is too short to hold a required column
    #[error("Row has {width} field(s), column {column} ({name}) is out of range")]
    MissingColumn {
        name: String,
        column: usize,
        width: usize,
    },
}

impl ValidationError {
    /// Create an invalid configuration error
    pub fn invalid_configuration(message: &str) -> Self {
        Self::InvalidConfiguration {
            message: message.to_string(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: &str, reason: &str) -> Self {
        Self::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }

    /// Create a missing column error for a short row
    pub fn missing_column(name: &str, column: usize, width: usize) -> Self {
        Self::MissingColumn {
            name: name.to_string(),
            column,
            width,
        }
    }
}
