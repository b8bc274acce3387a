//! Sample layouts of TIFF pixel data
//!
//! Turns raw decompressed bytes into `f64` values according to
//! BitsPerSample and SampleFormat, and reverses horizontal differencing.

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::tiff::constants::sample_format;
use crate::tiff::errors::{TiffError, TiffResult};

/// Numeric interpretation of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Unsigned,
    Signed,
    Float,
}

/// Width and interpretation of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLayout {
    bits: u16,
    kind: SampleKind,
}

impl SampleLayout {
    /// Validates BitsPerSample / SampleFormat of the first band
    ///
    /// Integers of 8, 16, 32 or 64 bits and IEEE floats of 32 or 64 bits
    /// are decoded; anything else is an unsupported layout.
    pub fn from_tags(bits: u64, format: u64) -> TiffResult<Self> {
        let kind = match u16::try_from(format).unwrap_or(0) {
            sample_format::UNSIGNED | sample_format::VOID => SampleKind::Unsigned,
            sample_format::SIGNED => SampleKind::Signed,
            sample_format::IEEEFP => SampleKind::Float,
            other => return Err(TiffError::UnsupportedLayout(format!("SampleFormat {}", other))),
        };

        let supported = match kind {
            SampleKind::Float => matches!(bits, 32 | 64),
            _ => matches!(bits, 8 | 16 | 32 | 64),
        };
        if !supported {
            return Err(TiffError::UnsupportedLayout(format!(
                "{} bits per sample with {:?} samples", bits, kind)));
        }

        Ok(SampleLayout { bits: bits as u16, kind })
    }

    pub fn bits(&self) -> u16 {
        self.bits
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bits as usize / 8
    }

    /// Decodes the sample stored at the start of `bytes`
    pub fn decode(&self, bytes: &[u8], handler: &dyn ByteOrderHandler) -> f64 {
        match (self.kind, self.bits) {
            (SampleKind::Unsigned, 8) => bytes[0] as f64,
            (SampleKind::Signed, 8) => bytes[0] as i8 as f64,
            (SampleKind::Unsigned, 16) => handler.u16_from(bytes) as f64,
            (SampleKind::Signed, 16) => handler.u16_from(bytes) as i16 as f64,
            (SampleKind::Unsigned, 32) => handler.u32_from(bytes) as f64,
            (SampleKind::Signed, 32) => handler.u32_from(bytes) as i32 as f64,
            (SampleKind::Float, 32) => f32::from_bits(handler.u32_from(bytes)) as f64,
            (SampleKind::Unsigned, _) => handler.u64_from(bytes) as f64,
            (SampleKind::Signed, _) => handler.u64_from(bytes) as i64 as f64,
            (SampleKind::Float, _) => f64::from_bits(handler.u64_from(bytes)),
        }
    }
}

/// Reverses horizontal differencing (Predictor = 2) in place
///
/// # Arguments
/// * `buffer` - Decompressed segment
/// * `row_width` - Pixels per segment row
/// * `stride` - Samples per pixel stored in the segment
/// * `layout` - Integer sample layout
/// * `handler` - Byte order of the samples
pub fn undo_horizontal_predictor(buffer: &mut [u8], row_width: usize, stride: usize,
                                 layout: &SampleLayout, handler: &dyn ByteOrderHandler) -> TiffResult<()> {
    if layout.kind == SampleKind::Float {
        return Err(TiffError::UnsupportedLayout(
            "horizontal predictor on floating point samples".to_string()));
    }

    let width = layout.bytes_per_sample();
    let row_samples = row_width * stride;
    let row_bytes = row_samples * width;
    if row_bytes == 0 {
        return Ok(());
    }
    let order = handler.byte_order();

    for row in buffer.chunks_exact_mut(row_bytes) {
        for i in stride..row_samples {
            let (prev, cur) = ((i - stride) * width, i * width);
            match width {
                1 => row[cur] = row[cur].wrapping_add(row[prev]),
                2 => {
                    let sum = handler.u16_from(&row[cur..]).wrapping_add(handler.u16_from(&row[prev..]));
                    let encoded = match order {
                        ByteOrder::LittleEndian => sum.to_le_bytes(),
                        ByteOrder::BigEndian => sum.to_be_bytes(),
                    };
                    row[cur..cur + 2].copy_from_slice(&encoded);
                },
                4 => {
                    let sum = handler.u32_from(&row[cur..]).wrapping_add(handler.u32_from(&row[prev..]));
                    let encoded = match order {
                        ByteOrder::LittleEndian => sum.to_le_bytes(),
                        ByteOrder::BigEndian => sum.to_be_bytes(),
                    };
                    row[cur..cur + 4].copy_from_slice(&encoded);
                },
                _ => {
                    let sum = handler.u64_from(&row[cur..]).wrapping_add(handler.u64_from(&row[prev..]));
                    let encoded = match order {
                        ByteOrder::LittleEndian => sum.to_le_bytes(),
                        ByteOrder::BigEndian => sum.to_be_bytes(),
                    };
                    row[cur..cur + 8].copy_from_slice(&encoded);
                },
            }
        }
    }

    Ok(())
}
