//! TIFF validation utilities
//!
//! Bounds checks applied before following offsets found in a container,
//! so a damaged or hostile header surfaces as an error instead of a huge
//! allocation or a read past the end of the buffer.

use log::{debug, error, warn};
use std::io::SeekFrom;

use crate::io::byte_order::ByteOrderHandler;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::header;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFDEntry;

/// Validates an IFD offset: past the header and inside the data
pub fn validate_ifd_offset(offset: u64, file_size: u64) -> TiffResult<()> {
    if offset >= file_size || offset < 8 {
        return Err(TiffError::CorruptData(format!(
            "Invalid IFD offset: {} (data size: {})",
            offset, file_size
        )));
    }

    Ok(())
}

/// Validates that an out-of-line tag value array lies inside the data
pub fn validate_array_extent(entry: &IFDEntry, file_size: u64) -> TiffResult<()> {
    let byte_len = (entry.get_field_type_size() as u64).saturating_mul(entry.count);
    let end = entry.value_offset.saturating_add(byte_len);

    if end > file_size {
        return Err(TiffError::CorruptData(format!(
            "Values of tag {} ({} bytes at offset {}) extend past end of data ({} bytes)",
            entry.tag, byte_len, entry.value_offset, file_size
        )));
    }

    Ok(())
}

/// Validates that a pixel segment lies inside the data
pub fn validate_segment(index: usize, offset: u64, byte_count: u64, file_size: u64) -> TiffResult<()> {
    if offset.saturating_add(byte_count) > file_size {
        return Err(TiffError::CorruptData(format!(
            "Segment {} ({} bytes at offset {}) extends past end of data ({} bytes)",
            index, byte_count, offset, file_size
        )));
    }

    Ok(())
}

/// Gets the total size of the underlying data, restoring the position
pub fn get_file_size(reader: &mut dyn SeekableReader) -> TiffResult<u64> {
    let current_position = reader.stream_position()?;
    let file_size = match reader.seek(SeekFrom::End(0)) {
        Ok(size) => size,
        Err(e) => {
            warn!("Could not determine data size: {}", e);
            u64::MAX
        }
    };
    reader.seek(SeekFrom::Start(current_position))?;

    Ok(file_size)
}

/// Validates the BigTIFF header
///
/// After the version number (43) BigTIFF stores the offset size, which
/// must be 8, followed by a reserved zero.
pub fn validate_bigtiff_header(
    reader: &mut dyn SeekableReader,
    byte_order_handler: &dyn ByteOrderHandler
) -> TiffResult<()> {
    let offset_size = byte_order_handler.read_u16(reader)?;
    let zeros = byte_order_handler.read_u16(reader)?;

    debug!("BigTIFF offset size: {}, reserved: {}", offset_size, zeros);

    if offset_size != header::BIGTIFF_OFFSET_SIZE || zeros != 0 {
        error!("Invalid BigTIFF header: offset_size={}, zeros={}", offset_size, zeros);
        return Err(TiffError::InvalidBigTIFFHeader);
    }

    Ok(())
}
