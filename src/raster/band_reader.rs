//! First-band decoding of TIFF/GeoTIFF containers
//!
//! Reads the full-resolution image of a container held in memory and
//! decodes its first band into `f64` samples, together with the metadata
//! the normalizer needs: dimensions, no-data value and georeferencing.
//! Strips and tiles are supported in chunky or planar layout.

use log::{debug, info, warn};
use std::io::Cursor;

use crate::compression::{CompressionFactory, CompressionHandler};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable;
use crate::tiff::constants::{planar_config, predictor, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;
use crate::tiff::types::TIFF;
use crate::tiff::validation;
use crate::utils::progress::ProgressTracker;
use crate::utils::string_utils;
use crate::utils::tag_utils;

use super::georef::GeoTransform;
use super::grid::MAX_GRID_CELLS;
use super::sample::{self, SampleLayout};

/// Largest decompressed strip or tile accepted
const MAX_SEGMENT_BYTES: usize = 1 << 28;

/// Structure and metadata of the full-resolution image
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerInfo {
    pub width: usize,
    pub height: usize,
    pub samples_per_pixel: usize,
    pub byte_order: ByteOrder,
    pub big_tiff: bool,
    pub compression: u64,
    pub tiled: bool,
    pub ifd_count: usize,
    /// Parsed GDAL_NODATA value
    pub nodata: Option<f64>,
    /// Map transform from ModelTransformation or pixel scale + tie point
    pub transform: Option<GeoTransform>,
}

/// Decoded first band, row-major, `width * height` samples
#[derive(Debug, Clone)]
pub struct DecodedBand {
    pub info: ContainerInfo,
    pub samples: Vec<f64>,
}

/// Placement of one strip or tile in the image
#[derive(Debug, Clone, Copy)]
struct Segment {
    index: usize,
    offset: u64,
    byte_count: u64,
    x0: usize,
    y0: usize,
    /// Rows stored in the segment
    stored_rows: usize,
    /// Columns and rows that fall inside the image
    valid_cols: usize,
    valid_rows: usize,
}

/// Decoding parameters shared by every segment
struct SegmentLayout<'h> {
    handler: &'h dyn ByteOrderHandler,
    compression: Box<dyn CompressionHandler>,
    sample: SampleLayout,
    segment_width: usize,
    stride: usize,
    predictor: u16,
}

/// Reads the first band of a TIFF container
pub struct BandReader<'a> {
    bytes: &'a [u8],
    show_progress: bool,
}

impl<'a> BandReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        BandReader { bytes, show_progress: false }
    }

    /// Draws a progress bar over the segments while decoding
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Reads container metadata without decoding samples
    pub fn read_info(&self) -> TiffResult<ContainerInfo> {
        let (reader, tiff) = self.parse()?;
        let ifd = Self::main_ifd(&tiff)?;
        self.container_info(&reader, &tiff, ifd)
    }

    /// Decodes the first band of the full-resolution image
    ///
    /// # Returns
    /// Samples and metadata, or the first decoding error encountered. A
    /// damaged segment fails the whole read.
    pub fn read_band(&self) -> TiffResult<DecodedBand> {
        let (reader, tiff) = self.parse()?;
        let ifd = Self::main_ifd(&tiff)?;
        let info = self.container_info(&reader, &tiff, ifd)?;
        let samples = self.decode_samples(&reader, ifd, &info)?;

        info!("Decoded band 1 of {}x{} {} image ({})",
              info.width, info.height,
              if info.tiled { "tiled" } else { "stripped" },
              tag_utils::get_compression_name(info.compression));
        Ok(DecodedBand { info, samples })
    }

    fn cursor(&self) -> Cursor<&'a [u8]> {
        seekable::from_bytes(self.bytes)
    }

    fn parse(&self) -> TiffResult<(TiffReader, TIFF)> {
        let mut reader = TiffReader::new();
        let tiff = reader.read(&mut self.cursor())?;
        Ok((reader, tiff))
    }

    fn main_ifd(tiff: &TIFF) -> TiffResult<&IFD> {
        tiff.main_ifd()
            .ok_or_else(|| TiffError::CorruptData("Container has no image".to_string()))
    }

    fn container_info(&self, reader: &TiffReader, tiff: &TIFF, ifd: &IFD) -> TiffResult<ContainerInfo> {
        let (width, height) = ifd.get_dimensions().ok_or(TiffError::MissingDimensions)?;
        let width = usize::try_from(width)
            .map_err(|_| TiffError::CorruptData(format!("Image width {} out of range", width)))?;
        let height = usize::try_from(height)
            .map_err(|_| TiffError::CorruptData(format!("Image height {} out of range", height)))?;

        Ok(ContainerInfo {
            width,
            height,
            samples_per_pixel: ifd.get_samples_per_pixel().max(1) as usize,
            byte_order: tiff.byte_order,
            big_tiff: tiff.is_big_tiff,
            compression: ifd.get_tag_value(tags::COMPRESSION).unwrap_or(1),
            tiled: ifd.is_tiled(),
            ifd_count: tiff.ifd_count(),
            nodata: self.read_nodata(reader, ifd),
            transform: self.read_transform(reader, ifd),
        })
    }

    fn read_nodata(&self, reader: &TiffReader, ifd: &IFD) -> Option<f64> {
        if !ifd.has_tag(tags::GDAL_NODATA) {
            return None;
        }

        match reader.read_ascii(&mut self.cursor(), ifd, tags::GDAL_NODATA) {
            Ok(text) => {
                let nodata = string_utils::parse_nodata(&text);
                if nodata.is_none() {
                    warn!("Ignoring unparseable GDAL_NODATA value '{}'", text);
                }
                nodata
            },
            Err(e) => {
                warn!("Ignoring unreadable GDAL_NODATA tag: {}", e);
                None
            },
        }
    }

    fn read_transform(&self, reader: &TiffReader, ifd: &IFD) -> Option<GeoTransform> {
        if !ifd.has_georeference() {
            return None;
        }
        let mut cursor = self.cursor();

        if ifd.has_tag(tags::MODEL_TRANSFORMATION_TAG) {
            match reader.read_f64_values(&mut cursor, ifd, tags::MODEL_TRANSFORMATION_TAG) {
                Ok(matrix) => {
                    if let Some(transform) = GeoTransform::from_model_transformation(&matrix) {
                        return Some(transform);
                    }
                    warn!("Ignoring malformed ModelTransformation ({} values)", matrix.len());
                },
                Err(e) => warn!("Ignoring unreadable ModelTransformation: {}", e),
            }
        }

        if !(ifd.has_tag(tags::MODEL_PIXEL_SCALE_TAG) && ifd.has_tag(tags::MODEL_TIEPOINT_TAG)) {
            return None;
        }

        let scale = reader.read_f64_values(&mut cursor, ifd, tags::MODEL_PIXEL_SCALE_TAG);
        let tiepoint = reader.read_f64_values(&mut cursor, ifd, tags::MODEL_TIEPOINT_TAG);
        match (scale, tiepoint) {
            (Ok(scale), Ok(tiepoint)) => {
                let transform = GeoTransform::from_scale_and_tiepoint(&scale, &tiepoint);
                if transform.is_none() {
                    warn!("Ignoring malformed ModelPixelScale/ModelTiepoint");
                }
                transform
            },
            (Err(e), _) | (_, Err(e)) => {
                warn!("Ignoring unreadable georeferencing tags: {}", e);
                None
            },
        }
    }

    /// First value of an integer tag, or `default` when the tag is absent
    fn first_value(&self, reader: &TiffReader, ifd: &IFD, tag: u16, default: u64) -> TiffResult<u64> {
        match reader.read_tag_values(&mut self.cursor(), ifd, tag) {
            Ok(values) => Ok(values.first().copied().unwrap_or(default)),
            Err(TiffError::TagNotFound(_)) => Ok(default),
            Err(e) => Err(e),
        }
    }

    fn decode_samples(&self, reader: &TiffReader, ifd: &IFD, info: &ContainerInfo) -> TiffResult<Vec<f64>> {
        let (width, height) = (info.width, info.height);
        let cells = width.checked_mul(height)
            .filter(|cells| *cells <= MAX_GRID_CELLS)
            .ok_or_else(|| TiffError::CorruptData(format!(
                "Image of {}x{} exceeds {} cells", width, height, MAX_GRID_CELLS)))?;
        if cells == 0 {
            debug!("Image has no cells");
            return Ok(Vec::new());
        }

        let bits = self.first_value(reader, ifd, tags::BITS_PER_SAMPLE, 1)?;
        let format = self.first_value(reader, ifd, tags::SAMPLE_FORMAT, 1)?;
        let sample = SampleLayout::from_tags(bits, format)?;

        let stride = match ifd.get_tag_value(tags::PLANAR_CONFIGURATION).unwrap_or(1) as u16 {
            planar_config::CHUNKY => info.samples_per_pixel,
            planar_config::PLANAR => 1,
            other => return Err(TiffError::UnsupportedLayout(format!("PlanarConfiguration {}", other))),
        };

        let predictor_code = ifd.get_tag_value(tags::PREDICTOR).unwrap_or(1) as u16;
        match predictor_code {
            predictor::NONE | predictor::HORIZONTAL_DIFFERENCING => {},
            predictor::FLOATING_POINT => {
                return Err(TiffError::UnsupportedLayout("Floating point predictor".to_string()));
            },
            other => return Err(TiffError::UnsupportedLayout(format!("Predictor {}", other))),
        }

        let (segments, segment_width) = self.segments(reader, ifd, width, height)?;
        let layout = SegmentLayout {
            handler: reader.handler()?,
            compression: CompressionFactory::create_handler(info.compression)?,
            sample,
            segment_width,
            stride,
            predictor: predictor_code,
        };
        debug!("Band layout: {} bits {:?}, stride {}, {} segment(s) of width {}, {}",
               sample.bits(), sample.kind(), stride, segments.len(), segment_width,
               layout.compression.name());

        let file_size = self.bytes.len() as u64;
        self.check_segments(&segments, &layout, file_size)?;

        let mut samples = vec![0.0; cells];
        let tracker = ProgressTracker::new(segments.len() as u64, "Decoding raster", self.show_progress);

        for segment in &segments {
            if let Err(e) = self.decode_segment(segment, &layout, width, &mut samples) {
                tracker.abandon();
                return Err(e);
            }
            tracker.increment(1);
        }
        tracker.finish();

        Ok(samples)
    }

    /// Lists the segments holding band 1, in row-major order
    ///
    /// # Returns
    /// The segments and the stored width of each segment row
    fn segments(&self, reader: &TiffReader, ifd: &IFD,
                width: usize, height: usize) -> TiffResult<(Vec<Segment>, usize)> {
        let mut cursor = self.cursor();

        let (segment_width, segment_height, offsets_tag, counts_tag) = if ifd.is_tiled() {
            let tile_width = ifd.get_tag_value(tags::TILE_WIDTH).unwrap_or(0) as usize;
            let tile_height = ifd.get_tag_value(tags::TILE_LENGTH).unwrap_or(0) as usize;
            if tile_width == 0 || tile_height == 0 {
                return Err(TiffError::CorruptData(format!(
                    "Invalid tile size {}x{}", tile_width, tile_height)));
            }
            (tile_width, tile_height, tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
        } else {
            let rows_per_strip = ifd.get_tag_value(tags::ROWS_PER_STRIP)
                .map(|rows| rows.min(height as u64) as usize)
                .filter(|rows| *rows > 0)
                .unwrap_or(height);
            (width, rows_per_strip, tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
        };

        let across = width.div_ceil(segment_width);
        let down = height.div_ceil(segment_height);
        let per_band = across * down;

        let offsets = reader.read_tag_values(&mut cursor, ifd, offsets_tag)?;
        let byte_counts = reader.read_tag_values(&mut cursor, ifd, counts_tag)?;
        if offsets.len() < per_band || byte_counts.len() < per_band {
            return Err(TiffError::CorruptData(format!(
                "Expected {} segments for band 1, found {} offsets and {} byte counts",
                per_band, offsets.len(), byte_counts.len())));
        }

        let segments = (0..per_band)
            .map(|index| {
                let x0 = (index % across) * segment_width;
                let y0 = (index / across) * segment_height;
                let valid_rows = segment_height.min(height - y0);
                Segment {
                    index,
                    offset: offsets[index],
                    byte_count: byte_counts[index],
                    x0,
                    y0,
                    stored_rows: if ifd.is_tiled() { segment_height } else { valid_rows },
                    valid_cols: segment_width.min(width - x0),
                    valid_rows,
                }
            })
            .collect();

        Ok((segments, segment_width))
    }

    /// Decoded size of a segment in bytes
    fn expected_len(segment: &Segment, layout: &SegmentLayout) -> TiffResult<usize> {
        segment.stored_rows
            .checked_mul(layout.segment_width)
            .and_then(|n| n.checked_mul(layout.stride))
            .and_then(|n| n.checked_mul(layout.sample.bytes_per_sample()))
            .filter(|n| *n <= MAX_SEGMENT_BYTES)
            .ok_or_else(|| TiffError::CorruptData(format!(
                "Segment {} is larger than {} bytes when decoded", segment.index, MAX_SEGMENT_BYTES)))
    }

    /// Checks every segment's extent before the sample buffer is allocated
    ///
    /// Uncompressed segments must also hold their full decoded size.
    fn check_segments(&self, segments: &[Segment], layout: &SegmentLayout, file_size: u64) -> TiffResult<()> {
        let uncompressed = layout.compression.code() == 1;
        for segment in segments {
            validation::validate_segment(segment.index, segment.offset, segment.byte_count, file_size)?;
            let expected_len = Self::expected_len(segment, layout)?;
            if uncompressed && segment.byte_count < expected_len as u64 {
                return Err(TiffError::CorruptData(format!(
                    "Segment {} holds {} bytes, expected {}", segment.index, segment.byte_count, expected_len)));
            }
        }
        Ok(())
    }

    fn decode_segment(&self, segment: &Segment, layout: &SegmentLayout,
                      width: usize, samples: &mut [f64]) -> TiffResult<()> {
        let bytes_per_sample = layout.sample.bytes_per_sample();
        let expected_len = Self::expected_len(segment, layout)?;

        let start = segment.offset as usize;
        let end = start + segment.byte_count as usize;
        let mut buffer = layout.compression.decompress(&self.bytes[start..end], expected_len)?;
        if buffer.len() < expected_len {
            return Err(TiffError::CorruptData(format!(
                "Segment {} decoded to {} bytes, expected {}", segment.index, buffer.len(), expected_len)));
        }
        buffer.truncate(expected_len);

        if layout.predictor == predictor::HORIZONTAL_DIFFERENCING {
            sample::undo_horizontal_predictor(&mut buffer, layout.segment_width, layout.stride,
                                              &layout.sample, layout.handler)?;
        }

        for row in 0..segment.valid_rows {
            let target_row = (segment.y0 + row) * width + segment.x0;
            let source_row = row * layout.segment_width;
            for col in 0..segment.valid_cols {
                let at = (source_row + col) * layout.stride * bytes_per_sample;
                samples[target_row + col] = layout.sample.decode(&buffer[at..], layout.handler);
            }
        }

        debug!("Decoded segment {} at ({}, {})", segment.index, segment.x0, segment.y0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::tests::test_utils::{self, TiffFixture};

    fn band(bytes: &[u8]) -> TiffResult<DecodedBand> {
        BandReader::new(bytes).read_band()
    }

    #[test]
    fn test_single_strip_u8() {
        let bytes = TiffFixture::new(3, 2).segment(vec![1, 2, 3, 4, 5, 6]).build();
        let decoded = band(&bytes).unwrap();

        assert_eq!((decoded.info.width, decoded.info.height), (3, 2));
        assert_eq!(decoded.samples, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(decoded.info.transform.is_none());
        assert!(decoded.info.nodata.is_none());
    }

    #[test]
    fn test_strips_default_to_image_height() {
        // Width 4, height 2, no RowsPerStrip: one strip with all eight samples
        let bytes = TiffFixture::new(4, 2).segment((1..=8).collect()).build();
        assert_eq!(band(&bytes).unwrap().samples.len(), 8);
    }

    #[test]
    fn test_multiple_strips_with_short_last_strip() {
        let bytes = TiffFixture::new(2, 3)
            .rows_per_strip(2)
            .segment(vec![1, 2, 3, 4])
            .segment(vec![5, 6])
            .build();
        assert_eq!(band(&bytes).unwrap().samples, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_big_endian_signed_16() {
        let values = [-3i16, 7, 300, -32768];
        let bytes = TiffFixture::new(2, 2)
            .big_endian()
            .sample_type(16, 2)
            .segment(test_utils::i16_bytes(&values, true))
            .build();
        assert_eq!(band(&bytes).unwrap().samples, vec![-3.0, 7.0, 300.0, -32768.0]);
    }

    #[test]
    fn test_float32_keeps_nan() {
        let bytes = TiffFixture::new(3, 1)
            .sample_type(32, 3)
            .segment(test_utils::f32_bytes(&[0.5, f32::NAN, -1.25], false))
            .build();
        let samples = band(&bytes).unwrap().samples;
        assert_eq!(samples[0], 0.5);
        assert!(samples[1].is_nan());
        assert_eq!(samples[2], -1.25);
    }

    #[test]
    fn test_bigtiff_float64() {
        let bytes = TiffFixture::new(2, 1)
            .big_tiff()
            .sample_type(64, 3)
            .segment(test_utils::f64_bytes(&[1.0e-3, 42.5], false))
            .build();
        let decoded = band(&bytes).unwrap();
        assert!(decoded.info.big_tiff);
        assert_eq!(decoded.samples, vec![1.0e-3, 42.5]);
    }

    #[test]
    fn test_compressed_strips() {
        let raw: Vec<u8> = (0..16).collect();
        let expected: Vec<f64> = raw.iter().map(|v| *v as f64).collect();

        let deflated = TiffFixture::new(4, 4).compression(8).segment(test_utils::deflate(&raw)).build();
        assert_eq!(band(&deflated).unwrap().samples, expected);

        let zstd = TiffFixture::new(4, 4).compression(14).segment(test_utils::zstd_compress(&raw)).build();
        assert_eq!(band(&zstd).unwrap().samples, expected);

        // Literal run of 16 bytes
        let mut packed = vec![15u8];
        packed.extend_from_slice(&raw);
        let packbits = TiffFixture::new(4, 4).compression(32773).segment(packed).build();
        assert_eq!(band(&packbits).unwrap().samples, expected);
    }

    #[test]
    fn test_horizontal_predictor() {
        let deltas = test_utils::u16_bytes(&[100, 1, 1, 200, 0, 5], false);
        let bytes = TiffFixture::new(3, 2)
            .sample_type(16, 1)
            .compression(8)
            .predictor(2)
            .segment(test_utils::deflate(&deltas))
            .build();
        assert_eq!(band(&bytes).unwrap().samples, vec![100.0, 101.0, 102.0, 200.0, 200.0, 205.0]);
    }

    #[test]
    fn test_tiles_are_cropped_to_image() {
        // 3x3 image in 2x2 tiles; padding is 0xEE
        let bytes = TiffFixture::new(3, 3)
            .tiles(2, 2)
            .segment(vec![1, 2, 4, 5])
            .segment(vec![3, 0xEE, 6, 0xEE])
            .segment(vec![7, 8, 0xEE, 0xEE])
            .segment(vec![9, 0xEE, 0xEE, 0xEE])
            .build();
        let decoded = band(&bytes).unwrap();
        assert!(decoded.info.tiled);
        assert_eq!(decoded.samples, (1..=9).map(|v| v as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_chunky_multiband_takes_first_band() {
        let bytes = TiffFixture::new(2, 1)
            .samples_per_pixel(3)
            .segment(vec![10, 20, 30, 11, 21, 31])
            .build();
        assert_eq!(band(&bytes).unwrap().samples, vec![10.0, 11.0]);
    }

    #[test]
    fn test_planar_multiband_takes_first_plane() {
        let bytes = TiffFixture::new(2, 1)
            .samples_per_pixel(2)
            .planar()
            .segment(vec![10, 11])
            .segment(vec![20, 21])
            .build();
        assert_eq!(band(&bytes).unwrap().samples, vec![10.0, 11.0]);
    }

    #[test]
    fn test_reads_georeferencing_and_nodata() {
        let bytes = TiffFixture::new(2, 2)
            .segment(vec![0; 4])
            .geo(500000.0, 4100000.0, 30.0, 30.0)
            .nodata("-9999")
            .build();
        let info = BandReader::new(&bytes).read_info().unwrap();

        assert_eq!(info.nodata, Some(-9999.0));
        let transform = info.transform.unwrap();
        assert_eq!(transform.as_array(), [500000.0, 30.0, 0.0, 4100000.0, 0.0, -30.0]);
    }

    #[test]
    fn test_model_transformation_takes_precedence() {
        let mut matrix = [0.0; 16];
        matrix[0] = 10.0;
        matrix[3] = 1.0;
        matrix[5] = -10.0;
        matrix[7] = 2.0;
        matrix[15] = 1.0;
        let bytes = TiffFixture::new(1, 1)
            .segment(vec![0])
            .geo(0.0, 0.0, 30.0, 30.0)
            .model_transformation(matrix)
            .build();
        let transform = BandReader::new(&bytes).read_info().unwrap().transform.unwrap();
        assert_eq!(transform.as_array(), [1.0, 10.0, 0.0, 2.0, 0.0, -10.0]);
    }

    #[test]
    fn test_truncated_segment_is_corrupt() {
        let bytes = TiffFixture::new(4, 4).segment(vec![1; 8]).build();
        assert!(matches!(band(&bytes), Err(TiffError::CorruptData(_))));
    }

    #[test]
    fn test_oversized_header_fails_before_decoding() {
        // 16384x16384 cells declared, one byte of strip data
        let bytes = TiffFixture::new(16384, 16384).segment(vec![1]).build();
        match band(&bytes) {
            Err(TiffError::CorruptData(msg)) => assert!(msg.contains("Segment 0 holds 1 bytes")),
            other => panic!("expected CorruptData, got {:?}", other.map(|b| b.samples.len())),
        }
    }

    #[test]
    fn test_truncated_container_fails() {
        let mut bytes = TiffFixture::new(2, 1).segment(vec![1, 2]).build();
        // Cutting into the strip also drops the IFD written after it
        bytes.truncate(9);
        assert!(band(&bytes).is_err());
    }

    #[test]
    fn test_missing_segments_is_corrupt() {
        let bytes = TiffFixture::new(2, 4).rows_per_strip(1).segment(vec![1, 2]).build();
        assert!(matches!(band(&bytes), Err(TiffError::CorruptData(_))));
    }

    #[test]
    fn test_unsupported_layouts() {
        let lzw = TiffFixture::new(1, 1).compression(5).segment(vec![0]).build();
        assert!(matches!(band(&lzw), Err(TiffError::UnsupportedCompression(5))));

        let twelve_bit = TiffFixture::new(1, 1).sample_type(12, 1).segment(vec![0, 0]).build();
        assert!(matches!(band(&twelve_bit), Err(TiffError::UnsupportedLayout(_))));

        let float_predictor = TiffFixture::new(1, 1).sample_type(32, 3).predictor(3)
            .segment(vec![0; 4]).build();
        assert!(band(&float_predictor).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_empty_image() {
        let bytes = TiffFixture::new(0, 0).build();
        let decoded = band(&bytes).unwrap();
        assert!(decoded.samples.is_empty());
    }
}
