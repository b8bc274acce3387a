//! TIFF/BigTIFF container reader
//!
//! Parses the header and the IFD chain of an in-memory TIFF container and
//! gives typed access to tag payloads (integer arrays, doubles, ASCII).
//! Byte order is resolved once from the header and applied through a
//! `ByteOrderHandler` strategy for every later read.

use log::{debug, info, warn};
use std::io::SeekFrom;

use crate::io::byte_order::ByteOrderHandler;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::field_types;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::types::TIFF;
use crate::tiff::validation;
use crate::utils::format_utils;
use crate::utils::string_utils;
use crate::utils::tag_utils;

/// Upper bound on IFDs followed in one chain, guards against offset loops
const MAX_IFDS: usize = 256;

/// Reader for TIFF and BigTIFF containers
pub struct TiffReader {
    /// Byte order handler, set once the header has been read
    pub(crate) byte_order_handler: Option<Box<dyn ByteOrderHandler>>,
    /// Whether the container is BigTIFF
    pub(crate) is_big_tiff: bool,
}

impl Default for TiffReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TiffReader {
    /// Creates a new TIFF reader
    pub fn new() -> Self {
        TiffReader {
            byte_order_handler: None,
            is_big_tiff: false,
        }
    }

    /// Returns the byte order handler, failing if no header was read yet
    pub fn handler(&self) -> TiffResult<&dyn ByteOrderHandler> {
        self.byte_order_handler.as_deref()
            .ok_or_else(|| TiffError::GenericError("Byte order not yet determined".to_string()))
    }

    /// Returns whether the current container is a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Reads the container structure
    ///
    /// 1. Detect byte order (little/big endian)
    /// 2. Check for TIFF or BigTIFF format
    /// 3. Read the IFD chain
    pub fn read(&mut self, reader: &mut dyn SeekableReader) -> TiffResult<TIFF> {
        reader.seek(SeekFrom::Start(0))?;

        let handler = format_utils::detect_byte_order(reader)?;
        let byte_order = handler.byte_order();
        let (is_big_tiff, version) = format_utils::detect_tiff_format(reader, handler.as_ref())?;
        debug!("TIFF version {} ({})", version, byte_order.name());

        self.is_big_tiff = is_big_tiff;
        self.byte_order_handler = Some(handler);

        let first_ifd_offset = self.read_offset(reader)?;
        debug!("First IFD offset: {}", first_ifd_offset);

        let file_size = validation::get_file_size(reader)?;
        validation::validate_ifd_offset(first_ifd_offset, file_size)?;

        let mut tiff = TIFF::new(is_big_tiff, byte_order);
        tiff.ifds = self.read_ifd_chain(reader, first_ifd_offset, file_size)?;

        if tiff.ifds.is_empty() {
            return Err(TiffError::CorruptData("No IFDs found in TIFF container".to_string()));
        }

        info!("Read {} IFD(s) from {} container",
              tiff.ifds.len(), if is_big_tiff { "BigTIFF" } else { "TIFF" });
        Ok(tiff)
    }

    /// Reads an offset field: 4 bytes in TIFF, 8 bytes in BigTIFF
    fn read_offset(&self, reader: &mut dyn SeekableReader) -> TiffResult<u64> {
        let handler = self.handler()?;
        if self.is_big_tiff {
            Ok(handler.read_u64(reader)?)
        } else {
            Ok(handler.read_u32(reader)? as u64)
        }
    }

    /// Size in bytes of an IFD with `entry_count` entries, including the
    /// count field and the trailing next-IFD offset
    fn ifd_byte_size(&self, entry_count: u64) -> u64 {
        let (count_size, entry_size, offset_size): (u64, u64, u64) =
            if self.is_big_tiff { (8, 20, 8) } else { (2, 12, 4) };
        entry_size.saturating_mul(entry_count)
            .saturating_add(count_size)
            .saturating_add(offset_size)
    }

    /// Follows the IFD chain starting at `first_ifd_offset`
    ///
    /// The first IFD must parse; a damaged link further down the chain only
    /// truncates the chain, since only the full-resolution image is decoded.
    fn read_ifd_chain(&self, reader: &mut dyn SeekableReader,
                      first_ifd_offset: u64, file_size: u64) -> TiffResult<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut ifd_offset = first_ifd_offset;

        while ifd_offset != 0 && ifds.len() < MAX_IFDS {
            let number = ifds.len();
            let ifd = match self.read_ifd(reader, ifd_offset, number) {
                Ok(ifd) => ifd,
                Err(e) if number == 0 => return Err(e),
                Err(e) => {
                    warn!("Error reading IFD {}: {}, stopping IFD chain", number, e);
                    break;
                }
            };

            let next_offset_position = ifd_offset + self.ifd_byte_size(ifd.entry_count() as u64)
                - if self.is_big_tiff { 8 } else { 4 };
            reader.seek(SeekFrom::Start(next_offset_position))?;
            let next_ifd_offset = match self.read_offset(reader) {
                Ok(offset) => offset,
                Err(e) => {
                    warn!("Error reading next IFD offset: {}", e);
                    ifds.push(ifd);
                    break;
                }
            };

            ifds.push(ifd);

            if next_ifd_offset != 0 && validation::validate_ifd_offset(next_ifd_offset, file_size).is_err() {
                warn!("Invalid next IFD offset: {}, stopping IFD chain", next_ifd_offset);
                break;
            }
            if next_ifd_offset == ifd_offset {
                warn!("IFD at offset {} links to itself, stopping IFD chain", ifd_offset);
                break;
            }
            ifd_offset = next_ifd_offset;
        }

        Ok(ifds)
    }

    /// Reads an IFD located at `offset`
    pub fn read_ifd(&self, reader: &mut dyn SeekableReader, offset: u64, number: usize) -> TiffResult<IFD> {
        reader.seek(SeekFrom::Start(offset))?;

        let handler = self.handler()?;
        let entry_count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u16(reader)? as u64
        };
        debug!("IFD #{} at offset {} has {} entries", number, offset, entry_count);

        let file_size = validation::get_file_size(reader)?;
        if offset.saturating_add(self.ifd_byte_size(entry_count)) > file_size {
            return Err(TiffError::CorruptData(format!(
                "IFD at offset {} with {} entries extends past end of data ({} bytes)",
                offset, entry_count, file_size)));
        }

        let mut ifd = IFD::new(number, offset);
        for _ in 0..entry_count {
            ifd.add_entry(self.read_ifd_entry(reader)?);
        }

        Ok(ifd)
    }

    /// Reads a single IFD entry, keeping the raw value field
    fn read_ifd_entry(&self, reader: &mut dyn SeekableReader) -> TiffResult<IFDEntry> {
        let handler = self.handler()?;

        let tag = handler.read_u16(reader)?;
        let field_type = handler.read_u16(reader)?;
        let count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u32(reader)? as u64
        };

        let field_len = if self.is_big_tiff { 8 } else { 4 };
        let mut inline_bytes = [0u8; 8];
        reader.read_exact(&mut inline_bytes[..field_len])?;

        let type_size = tag_utils::field_type_size(field_type) as u64;
        let is_single_inline = count == 1 && type_size <= field_len as u64;

        let value_offset = if is_single_inline {
            match type_size {
                1 => inline_bytes[0] as u64,
                2 => handler.u16_from(&inline_bytes) as u64,
                4 => handler.u32_from(&inline_bytes) as u64,
                _ => handler.u64_from(&inline_bytes),
            }
        } else if self.is_big_tiff {
            handler.u64_from(&inline_bytes)
        } else {
            handler.u32_from(&inline_bytes) as u64
        };

        Ok(IFDEntry::with_inline_bytes(tag, field_type, count, value_offset, inline_bytes))
    }

    /// Reads an integer tag's values as u64
    ///
    /// Used for offsets, byte counts and per-sample codes (BitsPerSample,
    /// SampleFormat).
    pub fn read_tag_values(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Vec<u64>> {
        let entry = ifd.get_entry(tag)
            .ok_or(TiffError::TagNotFound(tag))?;

        if !entry.is_integer_type() {
            return Err(TiffError::UnsupportedFieldType(entry.field_type));
        }

        let handler = self.handler()?;
        if entry.count == 1 {
            return Ok(vec![entry.value_offset]);
        }
        if entry.is_value_inline(self.is_big_tiff) {
            return Ok(tag_utils::decode_inline_values(entry, handler));
        }

        let file_size = validation::get_file_size(reader)?;
        validation::validate_array_extent(entry, file_size)?;

        reader.seek(SeekFrom::Start(entry.value_offset))?;
        let mut values = Vec::with_capacity(entry.count as usize);
        tag_utils::read_tag_value_array(reader, entry, handler, &mut values)?;
        Ok(values)
    }

    /// Reads a floating point tag (DOUBLE or FLOAT) as f64 values
    ///
    /// GeoTIFF stores ModelPixelScale, ModelTiepoint and ModelTransformation
    /// as DOUBLE arrays.
    pub fn read_f64_values(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Vec<f64>> {
        let entry = ifd.get_entry(tag)
            .ok_or(TiffError::TagNotFound(tag))?;
        let handler = self.handler()?;

        if entry.field_type != field_types::DOUBLE && entry.field_type != field_types::FLOAT {
            return Err(TiffError::UnsupportedFieldType(entry.field_type));
        }

        let type_size = entry.get_field_type_size();
        let raw = self.read_entry_bytes(reader, entry)?;

        let values = raw.chunks_exact(type_size)
            .map(|chunk| if type_size == 8 {
                f64::from_bits(handler.u64_from(chunk))
            } else {
                f32::from_bits(handler.u32_from(chunk)) as f64
            })
            .collect();

        Ok(values)
    }

    /// Reads an ASCII tag, without its trailing NUL terminator(s)
    pub fn read_ascii(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<String> {
        let entry = ifd.get_entry(tag)
            .ok_or(TiffError::TagNotFound(tag))?;

        if entry.field_type != field_types::ASCII {
            return Err(TiffError::UnsupportedFieldType(entry.field_type));
        }

        let mut buffer = self.read_entry_bytes(reader, entry)?;
        string_utils::trim_trailing_nulls(&mut buffer);

        String::from_utf8(buffer)
            .map_err(|e| TiffError::GenericError(format!("Invalid UTF-8 string: {}", e)))
    }

    /// Reads the raw bytes of an entry's value, inline or at its offset
    fn read_entry_bytes(&self, reader: &mut dyn SeekableReader, entry: &IFDEntry) -> TiffResult<Vec<u8>> {
        let byte_len = (entry.get_field_type_size() as u64).saturating_mul(entry.count);

        if entry.is_value_inline(self.is_big_tiff) {
            return Ok(entry.inline_bytes[..byte_len as usize].to_vec());
        }

        let file_size = validation::get_file_size(reader)?;
        validation::validate_array_extent(entry, file_size)?;

        reader.seek(SeekFrom::Start(entry.value_offset))?;
        let mut buffer = vec![0u8; byte_len as usize];
        reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }
}
