//! I/O utilities for reading raster containers
//!
//! Traits and byte-order strategies shared by the TIFF container parser.

pub mod seekable;
pub mod byte_order;
