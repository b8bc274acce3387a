//! Raster payloads as received from callers

use crate::errors::CarbonResult;
use super::media_type::MediaType;

/// Raw raster bytes together with how they were declared
///
/// The media type is resolved when the payload is built, so an
/// unsupported declaration fails before any decoding starts.
#[derive(Debug, Clone)]
pub struct RasterPayload {
    bytes: Vec<u8>,
    declared: Option<String>,
    filename: String,
    media_type: MediaType,
}

impl RasterPayload {
    /// Wraps bytes after checking the declared media type
    ///
    /// # Arguments
    /// * `bytes` - Encoded raster
    /// * `declared` - Content type given by the caller, if any
    /// * `filename` - Original file name
    pub fn new(bytes: Vec<u8>, declared: Option<&str>, filename: &str) -> CarbonResult<Self> {
        let media_type = MediaType::resolve(declared, filename)?;
        Ok(RasterPayload {
            bytes,
            declared: declared.map(str::to_string),
            filename: filename.to_string(),
            media_type,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn declared(&self) -> Option<&str> {
        self.declared.as_deref()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
