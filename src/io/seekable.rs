//! Seekable reader trait
//!
//! Raster payloads arrive as in-memory byte buffers, so in practice the
//! reader is a `Cursor<&[u8]>`; the trait keeps the container parser
//! independent of where the bytes live.

use std::io::{Cursor, Read, Seek};

/// Trait for readers that can both read and seek
pub trait SeekableReader: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> SeekableReader for T {}

/// Wraps a borrowed byte buffer in a seekable reader
pub fn from_bytes(bytes: &[u8]) -> Cursor<&[u8]> {
    Cursor::new(bytes)
}
