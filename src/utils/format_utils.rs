//! Container format utilities
//!
//! Header sniffing and TIFF flavour detection.

use log::debug;

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::header;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::validation;

/// Whether `bytes` start with a TIFF or BigTIFF signature in either byte order
pub fn looks_like_tiff(bytes: &[u8]) -> bool {
    if bytes.len() < 4 {
        return false;
    }

    let marker = [bytes[0], bytes[1]];
    let version = if marker == header::LITTLE_ENDIAN_MARKER {
        u16::from_le_bytes([bytes[2], bytes[3]])
    } else if marker == header::BIG_ENDIAN_MARKER {
        u16::from_be_bytes([bytes[2], bytes[3]])
    } else {
        return false;
    };

    version == header::TIFF_VERSION || version == header::BIG_TIFF_VERSION
}

/// Detects and returns the byte order handler for a TIFF container
pub fn detect_byte_order(reader: &mut dyn SeekableReader) -> TiffResult<Box<dyn ByteOrderHandler>> {
    let byte_order = ByteOrder::detect(reader)?;
    debug!("Detected byte order: {}", byte_order.name());

    Ok(byte_order.create_handler())
}

/// Detects whether a container is TIFF or BigTIFF from its version number
///
/// # Returns
/// A tuple with (is_big_tiff, version_number)
pub fn detect_tiff_format(
    reader: &mut dyn SeekableReader,
    byte_order_handler: &dyn ByteOrderHandler
) -> TiffResult<(bool, u16)> {
    let version = byte_order_handler.read_u16(reader)?;

    let is_big_tiff = match version {
        header::BIG_TIFF_VERSION => {
            validation::validate_bigtiff_header(reader, byte_order_handler)?;
            true
        },
        header::TIFF_VERSION => false,
        _ => return Err(TiffError::UnsupportedVersion(version)),
    };

    Ok((is_big_tiff, version))
}
