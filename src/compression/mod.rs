//! Decompression of TIFF pixel segments
//!
//! Each supported TIFF compression code maps to a `CompressionHandler`
//! strategy, selected through `CompressionFactory`.

mod handler;
mod uncompressed;
mod deflate;
mod factory;
mod zstd;
mod packbits;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use deflate::AdobeDeflateHandler;
pub use factory::CompressionFactory;
pub use self::zstd::ZstdHandler;
pub use packbits::PackBitsHandler;
