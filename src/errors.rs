//! Boundary error taxonomy
//!
//! Every failure that leaves the library is one of three kinds: the
//! declared media type is not accepted, the bytes cannot be decoded, or
//! something else went wrong. Callers map these to their own transport
//! codes; the CLI maps them to process exit codes.

use std::fmt;
use std::io;

use crate::config::ConfigError;

/// Failure surfaced by the raster pipeline
#[derive(Debug)]
pub enum CarbonError {
    /// Declared media type (or, when ambiguous, the file extension) is not
    /// a geo-raster, JPEG or PNG
    UnsupportedFormat {
        /// Media type as declared by the caller, if any
        declared: Option<String>,
        /// Original file name
        filename: String,
    },
    /// Bytes decode neither as a geo-raster nor as a 2D image
    CorruptInput {
        /// Decoder message(s) describing why
        reason: String,
    },
    /// Any other unexpected failure
    InternalFault {
        /// Human-readable detail
        message: String,
    },
}

impl CarbonError {
    /// Builds a `CorruptInput` error
    pub fn corrupt(reason: impl Into<String>) -> Self {
        CarbonError::CorruptInput { reason: reason.into() }
    }

    /// Builds an `InternalFault` error
    pub fn internal(message: impl Into<String>) -> Self {
        CarbonError::InternalFault { message: message.into() }
    }

    /// Short stable identifier of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            CarbonError::UnsupportedFormat { .. } => "unsupported_format",
            CarbonError::CorruptInput { .. } => "corrupt_input",
            CarbonError::InternalFault { .. } => "internal_fault",
        }
    }

    /// Whether the caller can fix the failure by changing its input
    pub fn is_user_error(&self) -> bool {
        !matches!(self, CarbonError::InternalFault { .. })
    }

    /// Process exit code used by the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            CarbonError::UnsupportedFormat { .. } => 2,
            CarbonError::CorruptInput { .. } => 3,
            CarbonError::InternalFault { .. } => 1,
        }
    }
}

impl fmt::Display for CarbonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarbonError::UnsupportedFormat { declared: Some(declared), filename } => {
                write!(f, "Unsupported media type '{}' for file '{}' (expected GeoTIFF, JPEG or PNG)",
                       declared, filename)
            },
            CarbonError::UnsupportedFormat { declared: None, filename } => {
                write!(f, "Cannot determine a supported media type for file '{}' (expected GeoTIFF, JPEG or PNG)",
                       filename)
            },
            CarbonError::CorruptInput { reason } => write!(f, "Corrupt input: {}", reason),
            CarbonError::InternalFault { message } => write!(f, "Internal fault: {}", message),
        }
    }
}

impl std::error::Error for CarbonError {}

impl From<io::Error> for CarbonError {
    fn from(error: io::Error) -> Self {
        CarbonError::internal(format!("I/O error: {}", error))
    }
}

impl From<ConfigError> for CarbonError {
    fn from(error: ConfigError) -> Self {
        CarbonError::internal(error.to_string())
    }
}

impl From<serde_json::Error> for CarbonError {
    fn from(error: serde_json::Error) -> Self {
        CarbonError::internal(format!("Failed to serialize result: {}", error))
    }
}

/// Result type for the raster pipeline
pub type CarbonResult<T> = Result<T, CarbonError>;
