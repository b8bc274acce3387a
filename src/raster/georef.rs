//! Georeferencing of normalized grids
//!
//! A GeoTIFF anchors its raster in map space either with a pixel scale
//! plus one tie point or with a full model transformation matrix. Plain
//! images carry neither and get a placeholder identity transform, which
//! is kept apart from real georeferencing at the type level.

use serde::Serialize;
use std::fmt;

/// Affine raster to map transform, in the usual six-coefficient order
///
/// `x = origin_x + col * pixel_width + row * row_rotation`
/// `y = origin_y + col * column_rotation + row * pixel_height`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub column_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Unit pixels, origin at (0, 0), y growing downward with the rows
    pub fn identity() -> Self {
        GeoTransform {
            origin_x: 0.0,
            pixel_width: 1.0,
            row_rotation: 0.0,
            origin_y: 0.0,
            column_rotation: 0.0,
            pixel_height: 1.0,
        }
    }

    /// Builds a transform from ModelPixelScale and the first ModelTiepoint
    ///
    /// # Arguments
    /// * `scale` - `[sx, sy, sz]`
    /// * `tiepoint` - `[i, j, k, x, y, z]`, raster point (i, j) maps to (x, y)
    ///
    /// # Returns
    /// `None` when either array is too short or a value is not finite
    pub fn from_scale_and_tiepoint(scale: &[f64], tiepoint: &[f64]) -> Option<Self> {
        if scale.len() < 2 || tiepoint.len() < 6 {
            return None;
        }
        let (sx, sy) = (scale[0], scale[1]);
        let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);

        let transform = GeoTransform {
            origin_x: x - i * sx,
            pixel_width: sx,
            row_rotation: 0.0,
            origin_y: y + j * sy,
            column_rotation: 0.0,
            pixel_height: -sy,
        };
        transform.is_finite().then_some(transform)
    }

    /// Builds a transform from a row-major 4x4 ModelTransformation matrix
    pub fn from_model_transformation(matrix: &[f64]) -> Option<Self> {
        if matrix.len() < 16 {
            return None;
        }

        let transform = GeoTransform {
            origin_x: matrix[3],
            pixel_width: matrix[0],
            row_rotation: matrix[1],
            origin_y: matrix[7],
            column_rotation: matrix[4],
            pixel_height: matrix[5],
        };
        transform.is_finite().then_some(transform)
    }

    /// Map coordinates of a raster position (pixel corner at integers)
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.column_rotation + row * self.pixel_height,
        )
    }

    /// Extent covered by a `cols` x `rows` raster
    pub fn bounds(&self, cols: usize, rows: usize) -> Bounds {
        let corners = [
            self.pixel_to_world(0.0, 0.0),
            self.pixel_to_world(cols as f64, 0.0),
            self.pixel_to_world(0.0, rows as f64),
            self.pixel_to_world(cols as f64, rows as f64),
        ];

        let mut bounds = Bounds {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for (x, y) in corners {
            bounds.min_x = bounds.min_x.min(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_x = bounds.max_x.max(x);
            bounds.max_y = bounds.max_y.max(y);
        }
        bounds
    }

    /// Coefficients as `[origin_x, pixel_width, row_rotation, origin_y, column_rotation, pixel_height]`
    pub fn as_array(&self) -> [f64; 6] {
        [self.origin_x, self.pixel_width, self.row_rotation,
         self.origin_y, self.column_rotation, self.pixel_height]
    }

    fn is_finite(&self) -> bool {
        self.as_array().iter().all(|v| v.is_finite())
    }
}

/// Axis-aligned extent in map units
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Embedded,
    Placeholder,
}

/// Georeferencing attached to a grid
///
/// Only `Embedded` georeferencing, read from the raster itself, is exposed
/// as a map transform. The placeholder exists so every grid has a
/// structural transform, but it must not be mistaken for map coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Georeference {
    transform: GeoTransform,
    source: Source,
}

impl Georeference {
    pub fn embedded(transform: GeoTransform) -> Self {
        Georeference { transform, source: Source::Embedded }
    }

    pub fn placeholder() -> Self {
        Georeference { transform: GeoTransform::identity(), source: Source::Placeholder }
    }

    /// The map transform, if the raster carried one
    pub fn transform(&self) -> Option<&GeoTransform> {
        match self.source {
            Source::Embedded => Some(&self.transform),
            Source::Placeholder => None,
        }
    }

    /// The transform backing the grid, placeholder identity included
    ///
    /// Not map geometry for placeholders; use [`Georeference::transform`]
    /// for anything spatial.
    pub fn structural_transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == Source::Placeholder
    }

    /// `"embedded"` or `"placeholder"`
    pub fn kind(&self) -> &'static str {
        match self.source {
            Source::Embedded => "embedded",
            Source::Placeholder => "placeholder",
        }
    }
}

impl fmt::Display for Georeference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.transform() {
            Some(t) => write!(f, "origin ({}, {}), pixel size ({}, {})",
                              t.origin_x, t.origin_y, t.pixel_width, t.pixel_height),
            None => write!(f, "placeholder (no georeferencing)"),
        }
    }
}
