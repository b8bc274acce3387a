//! Container-level tests and the in-memory TIFF fixture shared with the
//! raster tests

pub(crate) mod test_utils;
