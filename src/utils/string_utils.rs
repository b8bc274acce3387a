//! String utility functions

/// Trims trailing NUL bytes from a byte buffer
pub fn trim_trailing_nulls(buffer: &mut Vec<u8>) {
    while buffer.last() == Some(&0) {
        buffer.pop();
    }
}

/// Parses a GDAL no-data tag value such as "-9999", " 0 " or "nan"
pub fn parse_nodata(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}
