//! Factory for creating compression handlers

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::deflate::AdobeDeflateHandler;
use super::zstd::ZstdHandler;
use super::packbits::PackBitsHandler;

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a decompression handler for the given TIFF compression code
    ///
    /// Codes without a handler (LZW, JPEG, ...) yield
    /// `TiffError::UnsupportedCompression`.
    pub fn create_handler(code: u64) -> TiffResult<Box<dyn CompressionHandler>> {
        match u16::try_from(code) {
            Ok(compression::NONE) => Ok(Box::new(UncompressedHandler)),
            Ok(compression::DEFLATE) | Ok(compression::DEFLATE_OLD) => Ok(Box::new(AdobeDeflateHandler)),
            Ok(compression::ZSTD) => Ok(Box::new(ZstdHandler)),
            Ok(compression::PACKBITS) => Ok(Box::new(PackBitsHandler)),
            _ => Err(TiffError::UnsupportedCompression(code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(CompressionFactory::create_handler(1).unwrap().name(), "Uncompressed");
        assert_eq!(CompressionFactory::create_handler(8).unwrap().code(), 8);
        assert_eq!(CompressionFactory::create_handler(32946).unwrap().code(), 8);
        assert_eq!(CompressionFactory::create_handler(14).unwrap().name(), "ZSTD");
        assert_eq!(CompressionFactory::create_handler(32773).unwrap().name(), "PackBits");
    }

    #[test]
    fn test_lzw_unsupported() {
        let result = CompressionFactory::create_handler(5);
        assert!(matches!(result, Err(TiffError::UnsupportedCompression(5))));
    }
}
