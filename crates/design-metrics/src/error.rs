//! Error types for design-metrics.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

use std::path::PathBuf;

/// Errors raised by the analytics functions.
#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    /// Input validation failed
    #[error("Validation error: {message}")]
    Validation {
        /// Argument or field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// A table lacks a column the operation needs
    #[error("Column '{column}' missing from {table}")]
    MissingColumn {
        /// Logical table name (papers, authorships, ...)
        table: String,
        /// Name of the missing column
        column: String,
    },

    /// The statistic has no defined value for this input (e.g. zero variance)
    #[error("Undefined result: {0}")]
    Undefined(String),

    /// Malformed BibTeX input
    #[error("Malformed BibTeX at line {line}: {message}")]
    BibTex {
        /// 1-based line of the offending token
        line: usize,
        /// Parser message
        message: String,
    },

    /// A PDF could not be opened or decoded
    #[error("Failed to read PDF {}: {message}", path.display())]
    Pdf {
        /// Path of the document
        path: PathBuf,
        /// Decoder message
        message: String,
    },

    /// Input file or directory not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Option or format recognised but not supported
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Optional backend is not available
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML configuration error
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Directory traversal error
    #[error("Directory walk error: {0}")]
    Walk(#[from] ignore::Error),
}

impl MetricsError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    /// Create a missing column error.
    #[must_use]
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn { table: table.into(), column: column.into() }
    }

    /// Create an undefined-result error.
    #[must_use]
    pub fn undefined(message: impl Into<String>) -> Self {
        Self::Undefined(message.into())
    }

    /// Create a BibTeX parse error.
    #[must_use]
    pub fn bibtex(line: usize, message: impl Into<String>) -> Self {
        Self::BibTex { line, message: message.into() }
    }

    /// Create a PDF error.
    #[must_use]
    pub fn pdf(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Pdf { path: path.into(), message: message.into() }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create an unsupported error.
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Returns true if the caller supplied bad input (as opposed to an environment failure).
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::MissingColumn { .. }
                | Self::Undefined(_)
                | Self::BibTex { .. }
                | Self::Unsupported(_)
        )
    }

    /// Convert to a user-friendly error message for CLI output.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::Validation { field, message } => {
                format!("Invalid input for '{field}': {message}")
            }
            Self::MissingColumn { table, column } => {
                format!("The {table} table has no '{column}' column. Check the export headers.")
            }
            Self::BibTex { line, message } => {
                format!("Could not parse the BibTeX file (line {line}): {message}")
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias for library operations.
pub type MetricsResult<T> = Result<T, MetricsError>;
