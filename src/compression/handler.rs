//! Compression handler trait definition

use crate::tiff::errors::TiffResult;

/// Strategy trait for decoding one compressed strip or tile
pub trait CompressionHandler: Send + Sync {
    /// Decompress a segment
    ///
    /// `expected_len` is the decoded size implied by the image structure;
    /// handlers stop producing output past it, so a malformed segment
    /// cannot expand without bound. Shorter output is returned as-is and
    /// judged by the caller.
    fn decompress(&self, data: &[u8], expected_len: usize) -> TiffResult<Vec<u8>>;

    /// Get the name of this compression method
    fn name(&self) -> &'static str;

    /// Get the compression code
    fn code(&self) -> u64;
}
