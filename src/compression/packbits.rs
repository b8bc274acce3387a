//! Handler for PackBits run-length encoded data

use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

/// PackBits compression handler (compression code 32773)
///
/// Each run starts with a signed header byte `n`: `0..=127` copies the
/// next `n + 1` bytes literally, `-127..=-1` repeats the next byte
/// `1 - n` times, and `-128` is a no-op.
pub struct PackBitsHandler;

impl CompressionHandler for PackBitsHandler {
    fn decompress(&self, data: &[u8], expected_len: usize) -> TiffResult<Vec<u8>> {
        let mut output = Vec::with_capacity(expected_len);
        let mut pos = 0;

        while pos < data.len() && output.len() < expected_len {
            let header = data[pos] as i8;
            pos += 1;

            if header >= 0 {
                let run = header as usize + 1;
                let literal = data.get(pos..pos + run)
                    .ok_or_else(|| TiffError::CorruptData("PackBits literal run past end of segment".to_string()))?;
                output.extend_from_slice(literal);
                pos += run;
            } else if header != -128 {
                let run = 1 - header as isize;
                let value = *data.get(pos)
                    .ok_or_else(|| TiffError::CorruptData("PackBits repeat run past end of segment".to_string()))?;
                output.extend(std::iter::repeat(value).take(run as usize));
                pos += 1;
            }
        }

        output.truncate(expected_len);
        Ok(output)
    }

    fn name(&self) -> &'static str {
        "PackBits"
    }

    fn code(&self) -> u64 {
        32773
    }
}
