//! TIFF container parsing
//!
//! Reads the header and IFD chain of TIFF and BigTIFF containers held in
//! memory. Sample decoding of the first band lives in `raster`.

pub mod errors;
pub mod ifd;
pub mod types;
pub mod reader;
pub(crate) mod constants;
pub(crate) mod validation;
#[cfg(test)]
pub(crate) mod tests;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use errors::{TiffError, TiffResult};
pub use ifd::{IFD, IFDEntry};
pub use reader::TiffReader;
pub use types::TIFF;
