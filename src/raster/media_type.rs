//! Media type resolution for uploaded rasters
//!
//! A payload's declared content type decides whether it is accepted. When
//! the declaration is missing or generic (`application/octet-stream`), the
//! file extension decides instead.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::fmt;
use std::path::Path;

use crate::errors::{CarbonError, CarbonResult};

lazy_static! {
    /// `type/subtype` essence followed by optional `; parameters`
    static ref MEDIA_TYPE_RE: Regex = Regex::new(
        r"^\s*([A-Za-z0-9][A-Za-z0-9!#$&^_.+-]*/[A-Za-z0-9][A-Za-z0-9!#$&^_.+-]*)\s*(?:;.*)?$"
    ).expect("media type pattern is valid");
}

/// Declared types accepted as geo-rasters
const GEO_RASTER_TYPES: &[&str] = &[
    "image/tiff",
    "image/tif",
    "image/geotiff",
    "image/x-tiff",
    "image/x-geotiff",
    "application/geotiff",
    "application/x-geotiff",
];

const JPEG_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/pjpeg"];

const PNG_TYPES: &[&str] = &["image/png", "image/x-png"];

/// Declarations that carry no format information
const AMBIGUOUS_TYPES: &[&str] = &["application/octet-stream", "binary/octet-stream"];

/// Accepted raster formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// TIFF or GeoTIFF container
    GeoRaster,
    /// JPEG image
    Jpeg,
    /// PNG image
    Png,
}

/// Outcome of classifying a declared content type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declared {
    Known(MediaType),
    Ambiguous,
    Unsupported,
}

impl MediaType {
    /// Resolves the media type of a payload
    ///
    /// # Arguments
    /// * `declared` - Content type given by the caller, if any
    /// * `filename` - Original file name, consulted when the declaration is
    ///   missing or ambiguous
    ///
    /// # Returns
    /// The accepted media type, or `UnsupportedFormat`
    pub fn resolve(declared: Option<&str>, filename: &str) -> CarbonResult<Self> {
        let verdict = match declared {
            Some(text) => Self::classify(text),
            None => Declared::Ambiguous,
        };

        let resolved = match verdict {
            Declared::Known(media_type) => Some(media_type),
            Declared::Ambiguous => Self::from_extension(filename),
            Declared::Unsupported => None,
        };

        match resolved {
            Some(media_type) => {
                debug!("Resolved media type of '{}' to {}", filename, media_type);
                Ok(media_type)
            },
            None => Err(CarbonError::UnsupportedFormat {
                declared: declared.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
                filename: filename.to_string(),
            }),
        }
    }

    /// Classifies a declared content type, ignoring case and parameters
    pub fn classify(declared: &str) -> Declared {
        if declared.trim().is_empty() {
            return Declared::Ambiguous;
        }

        let essence = match MEDIA_TYPE_RE.captures(declared).and_then(|c| c.get(1)) {
            Some(m) => m.as_str().to_ascii_lowercase(),
            None => return Declared::Unsupported,
        };

        if GEO_RASTER_TYPES.contains(&essence.as_str()) {
            Declared::Known(MediaType::GeoRaster)
        } else if JPEG_TYPES.contains(&essence.as_str()) {
            Declared::Known(MediaType::Jpeg)
        } else if PNG_TYPES.contains(&essence.as_str()) {
            Declared::Known(MediaType::Png)
        } else if AMBIGUOUS_TYPES.contains(&essence.as_str()) {
            Declared::Ambiguous
        } else {
            Declared::Unsupported
        }
    }

    /// Media type implied by a file extension
    pub fn from_extension(filename: &str) -> Option<Self> {
        let extension = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "tif" | "tiff" | "gtiff" | "gtif" => Some(MediaType::GeoRaster),
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "png" => Some(MediaType::Png),
            _ => None,
        }
    }

    /// Canonical MIME type
    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::GeoRaster => "image/tiff",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}
