//! Handler for ZSTD compressed data

use std::io::Read;
use log::{debug, warn};

use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

/// ZSTD compression handler (compression code 14)
pub struct ZstdHandler;

impl CompressionHandler for ZstdHandler {
    fn decompress(&self, data: &[u8], expected_len: usize) -> TiffResult<Vec<u8>> {
        debug!("ZSTD decompressing {} bytes", data.len());
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let decoder = zstd::stream::read::Decoder::new(data)
            .map_err(|e| TiffError::CorruptData(format!("ZSTD decompression error: {}", e)))?;
        let mut decompressed_data = Vec::with_capacity(expected_len);

        match decoder.take(expected_len as u64).read_to_end(&mut decompressed_data) {
            Ok(_) => Ok(decompressed_data),
            Err(e) => {
                warn!("ZSTD decompression error: {}", e);
                Err(TiffError::CorruptData(format!("ZSTD decompression error: {}", e)))
            }
        }
    }

    fn name(&self) -> &'static str {
        "ZSTD"
    }

    fn code(&self) -> u64 {
        14
    }
}
