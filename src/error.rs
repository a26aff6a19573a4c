use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// SchemaError – a required column is absent or has the wrong kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    Missing,
    NotNumeric,
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaErrorKind::Missing => write!(f, "is missing"),
            SchemaErrorKind::NotNumeric => write!(f, "must be numeric"),
        }
    }
}

/// Always fatal to the render that raised it. Names both the offending
/// column and the operation that required it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation}: column '{column}' {kind}")]
pub struct SchemaError {
    pub column: String,
    pub operation: String,
    pub kind: SchemaErrorKind,
}

impl SchemaError {
    pub fn missing(column: &str, operation: &str) -> Self {
        SchemaError {
            column: column.to_string(),
            operation: operation.to_string(),
            kind: SchemaErrorKind::Missing,
        }
    }

    pub fn not_numeric(column: &str, operation: &str) -> Self {
        SchemaError {
            column: column.to_string(),
            operation: operation.to_string(),
            kind: SchemaErrorKind::NotNumeric,
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetError – structural problems while assembling a dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
}

// ---------------------------------------------------------------------------
// PlotError – everything a single render call can fail with
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PlotError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("{operation}: {message}")]
    InvalidRequest {
        operation: &'static str,
        message: String,
    },

    #[error("drawing failed: {0}")]
    Render(String),

    #[error("writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PlotError {
    pub fn invalid(operation: &'static str, message: impl Into<String>) -> Self {
        PlotError::InvalidRequest {
            operation,
            message: message.into(),
        }
    }
}

pub type Result<T, E = PlotError> = std::result::Result<T, E>;

/// Plotters reports backend failures through a generic error type; collapse
/// it into a message.
pub(crate) fn render_err(err: impl fmt::Display) -> PlotError {
    PlotError::Render(err.to_string())
}
