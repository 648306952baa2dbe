//! Error types and path context for pipeline operations

use std::fmt;
use std::path::{Path, PathBuf};

/// Main error type for all pipeline operations
#[derive(Debug)]
pub enum PipelineError {
    /// Failed to load a NIfTI image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying NIfTI error
        source: nifti::NiftiError,
    },

    /// Failed to save an image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying NIfTI error
        source: nifti::NiftiError,
    },

    /// Delimited table could not be read or written
    Table {
        /// Path of the table
        path: PathBuf,
        /// Underlying CSV error
        source: csv::Error,
    },

    /// JSON document could not be parsed or written
    Json {
        /// Path of the document
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// Confound strategy name is not one of the supported strategies
    UnknownStrategy {
        /// Name that was requested
        name: String,
    },

    /// Neither known global signal column was found, so the schema is unknown
    SchemaNotDetected {
        /// Columns that were available in the table
        available: usize,
    },

    /// A column required by the requested operation is absent
    MissingColumn {
        /// Name of the missing column
        column: String,
        /// What needed the column
        context: String,
    },

    /// Input data doesn't meet pipeline requirements
    InvalidData {
        /// Description of what's wrong with the data
        reason: String,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Connectivity matrix is not symmetric within tolerance
    NotSymmetric {
        /// Row of the first offending entry
        row: usize,
        /// Column of the first offending entry
        col: usize,
        /// Absolute difference between the mirrored entries
        difference: f64,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Numerical computation produced invalid result
    Computation {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::Table { path, source } => {
                write!(f, "Table error in '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON error in '{}': {source}", path.display())
            }
            Self::UnknownStrategy { name } => {
                write!(f, "Confound type unknown: '{name}'")
            }
            Self::SchemaNotDetected { available } => {
                write!(
                    f,
                    "Could not detect confound naming scheme: neither 'GlobalSignal' nor \
                     'global_signal' among {available} columns"
                )
            }
            Self::MissingColumn { column, context } => {
                write!(f, "Missing column '{column}' required by {context}")
            }
            Self::InvalidData { reason } => {
                write!(f, "Invalid data: {reason}")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::NotSymmetric {
                row,
                col,
                difference,
            } => {
                write!(
                    f,
                    "Matrix not symmetrical: entries ({row}, {col}) and ({col}, {row}) differ by {difference:e}"
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Computation { operation, reason } => {
                write!(f, "Computation error in {operation}: {reason}")
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::Table { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for pipeline results
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Attaches the offending file path to errors raised by third-party readers
pub trait WithPath<T> {
    /// Replace the placeholder path of a converted error with `path`
    ///
    /// # Errors
    ///
    /// Propagates the original error with the path applied
    fn with_path(self, path: &Path) -> Result<T>;
}

impl<T, E> WithPath<T> for std::result::Result<T, E>
where
    E: Into<PipelineError>,
{
    fn with_path(self, path: &Path) -> Result<T> {
        self.map_err(|e| {
            let mut error = e.into();
            match &mut error {
                PipelineError::ImageLoad { path: p, .. }
                | PipelineError::ImageExport { path: p, .. }
                | PipelineError::Table { path: p, .. }
                | PipelineError::Json { path: p, .. }
                | PipelineError::FileSystem { path: p, .. } => {
                    *p = path.to_path_buf();
                }
                _ => {}
            }
            error
        })
    }
}

impl From<nifti::NiftiError> for PipelineError {
    fn from(err: nifti::NiftiError) -> Self {
        Self::ImageLoad {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        Self::Table {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> PipelineError {
    PipelineError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create an invalid data error
pub fn invalid_data(reason: &impl ToString) -> PipelineError {
    PipelineError::InvalidData {
        reason: reason.to_string(),
    }
}

/// Create a missing column error
pub fn missing_column(column: &str, context: &impl ToString) -> PipelineError {
    PipelineError::MissingColumn {
        column: column.to_string(),
        context: context.to_string(),
    }
}

/// Create a computation error
pub fn computation_error(operation: &'static str, reason: &impl ToString) -> PipelineError {
    PipelineError::Computation {
        operation,
        reason: reason.to_string(),
    }
}

/// Wrap an I/O error with the path and operation that produced it
pub fn fs_error(path: &Path, operation: &'static str, source: std::io::Error) -> PipelineError {
    PipelineError::FileSystem {
        path: path.to_path_buf(),
        operation,
        source,
    }
}
