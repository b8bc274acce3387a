//! Error types for TIFF container decoding

use std::fmt;
use std::io;

/// Errors raised while parsing a TIFF container or decoding its first band
#[derive(Debug)]
pub enum TiffError {
    /// I/O error, usually a read past the end of a truncated buffer
    IoError(io::Error),
    /// Invalid TIFF header
    InvalidHeader,
    /// Invalid byte order marker
    InvalidByteOrder(u16),
    /// Invalid BigTIFF header
    InvalidBigTIFFHeader,
    /// Unsupported TIFF version
    UnsupportedVersion(u16),
    /// Tag not found
    TagNotFound(u16),
    /// Unsupported field type
    UnsupportedFieldType(u16),
    /// Unsupported compression method
    UnsupportedCompression(u64),
    /// Image dimensions not found
    MissingDimensions,
    /// Sample layout this reader does not decode (bit depth, predictor, format)
    UnsupportedLayout(String),
    /// Segment data inconsistent with the declared image structure
    CorruptData(String),
    /// Generic error with message
    GenericError(String),
}

impl TiffError {
    /// Whether the container is well-formed but uses a layout this reader
    /// does not implement, as opposed to being damaged
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            TiffError::UnsupportedCompression(_)
                | TiffError::UnsupportedLayout(_)
                | TiffError::UnsupportedFieldType(_)
        )
    }
}

impl fmt::Display for TiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiffError::IoError(e) => write!(f, "I/O error: {}", e),
            TiffError::InvalidHeader => write!(f, "Invalid TIFF header"),
            TiffError::InvalidByteOrder(v) => write!(f, "Invalid byte order marker: {:#06x}", v),
            TiffError::InvalidBigTIFFHeader => write!(f, "Invalid BigTIFF header"),
            TiffError::UnsupportedVersion(v) => write!(f, "Unsupported TIFF version: {}", v),
            TiffError::TagNotFound(tag) => write!(f, "Tag not found: {}", tag),
            TiffError::UnsupportedFieldType(ft) => write!(f, "Unsupported field type: {}", ft),
            TiffError::UnsupportedCompression(c) => write!(f, "Unsupported compression method: {}", c),
            TiffError::MissingDimensions => write!(f, "Image dimensions not found"),
            TiffError::UnsupportedLayout(msg) => write!(f, "Unsupported sample layout: {}", msg),
            TiffError::CorruptData(msg) => write!(f, "Corrupt raster data: {}", msg),
            TiffError::GenericError(msg) => write!(f, "TIFF error: {}", msg),
        }
    }
}

impl std::error::Error for TiffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TiffError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TiffError {
    fn from(error: io::Error) -> Self {
        TiffError::IoError(error)
    }
}

/// Result type for TIFF operations
pub type TiffResult<T> = Result<T, TiffError>;
