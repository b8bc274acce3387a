//! End-to-end tests of the raster to sequestration pipeline

use std::io::{Cursor, Write};

use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Luma, Rgb, RgbImage};

use carbonkit::raster::GridSource;
use carbonkit::{CarbonError, CarbonKit, ModelParameters, NormalizerOptions, RasterPayload};

fn kit() -> CarbonKit {
    CarbonKit::new(ModelParameters::default(), NormalizerOptions::default()).unwrap()
}

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

fn uniform_gray(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([value])))
}

/// Little-endian single-strip 8-bit TIFF, georeferenced at (1000, 2000)
/// with 30 m pixels
fn georeferenced_tiff(width: u16, height: u16, samples: &[u8]) -> Vec<u8> {
    let mut buffer = Vec::new();
    let entry_count: u16 = 10;
    let ifd_offset: u32 = 8;
    let ifd_len = 2 + entry_count as u32 * 12 + 4;
    let scale_offset = ifd_offset + ifd_len;
    let tiepoint_offset = scale_offset + 24;
    let strip_offset = tiepoint_offset + 48;

    buffer.extend_from_slice(b"II");
    buffer.extend_from_slice(&42u16.to_le_bytes());
    buffer.extend_from_slice(&ifd_offset.to_le_bytes());

    buffer.extend_from_slice(&entry_count.to_le_bytes());
    let mut entry = |tag: u16, field_type: u16, count: u32, value: u32| {
        buffer.extend_from_slice(&tag.to_le_bytes());
        buffer.extend_from_slice(&field_type.to_le_bytes());
        buffer.extend_from_slice(&count.to_le_bytes());
        buffer.extend_from_slice(&value.to_le_bytes());
    };
    entry(256, 3, 1, width as u32);                   // ImageWidth
    entry(257, 3, 1, height as u32);                  // ImageLength
    entry(258, 3, 1, 8);                              // BitsPerSample
    entry(259, 3, 1, 1);                              // Compression: none
    entry(262, 3, 1, 1);                              // BlackIsZero
    entry(273, 4, 1, strip_offset);                   // StripOffsets
    entry(277, 3, 1, 1);                              // SamplesPerPixel
    entry(279, 4, 1, samples.len() as u32);           // StripByteCounts
    entry(33550, 12, 3, scale_offset);                // ModelPixelScale
    entry(33922, 12, 6, tiepoint_offset);             // ModelTiepoint
    buffer.extend_from_slice(&0u32.to_le_bytes());

    for v in [30.0f64, 30.0, 0.0] {
        buffer.extend_from_slice(&v.to_le_bytes());
    }
    for v in [0.0f64, 0.0, 0.0, 1000.0, 2000.0, 0.0] {
        buffer.extend_from_slice(&v.to_le_bytes());
    }
    buffer.write_all(samples).unwrap();
    buffer
}

#[test]
fn test_uniform_png_reference_value() {
    let bytes = encode(uniform_gray(4, 3, 10), ImageFormat::Png);
    let result = kit().assess_bytes(bytes, Some("image/png"), "uniform.png").unwrap();

    assert_eq!(result.total_co2_sequestered_tonnes, 480.09);
    assert_eq!(result.carbon_credits, 480.09);
}

#[test]
fn test_all_zero_grid_counts_intercept() {
    let bytes = encode(uniform_gray(2, 2, 0), ImageFormat::Png);
    let result = kit().assess_bytes(bytes, None, "zeros.png").unwrap();

    assert_eq!(result.total_co2_sequestered_tonnes, 3.14);
    assert_eq!(result.carbon_credits, 3.14);
}

#[test]
fn test_georeferenced_tiff() {
    let bytes = georeferenced_tiff(4, 3, &[10; 12]);
    let payload = RasterPayload::new(bytes, Some("image/tiff"), "plot.tif").unwrap();

    let report = kit().inspect(&payload).unwrap();
    assert_eq!(report.source, GridSource::GeoRaster);
    assert_eq!(report.georeference, "embedded");
    let bounds = report.bounds.unwrap();
    assert_eq!((bounds.min_x, bounds.max_y), (1000.0, 2000.0));
    assert_eq!((bounds.max_x, bounds.min_y), (1120.0, 1910.0));

    let result = kit().assess(&payload).unwrap();
    assert_eq!(result.total_co2_sequestered_tonnes, 480.09);
}

#[test]
fn test_sixteen_bit_tiff_through_image_encoder() {
    let wide: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_pixel(3, 2, Luma([1000]));
    let bytes = encode(DynamicImage::ImageLuma16(wide), ImageFormat::Tiff);
    let payload = RasterPayload::new(bytes, Some("image/tiff"), "wide.tif").unwrap();

    let grid = kit().normalize(&payload).unwrap();
    assert!(grid.georeference().is_placeholder());
    assert!(grid.samples().iter().all(|v| *v == 1000.0));
}

#[test]
fn test_rgb_png_is_reduced_to_luminance() {
    let rgb = RgbImage::from_pixel(2, 2, Rgb([10, 10, 10]));
    let bytes = encode(DynamicImage::ImageRgb8(rgb), ImageFormat::Png);
    let grid = kit().normalize(&RasterPayload::new(bytes, None, "rgb.png").unwrap()).unwrap();

    assert_eq!((grid.rows(), grid.cols()), (2, 2));
    assert!(grid.samples().iter().all(|v| *v == 10.0));
}

#[test]
fn test_jpeg_is_accepted() {
    let bytes = encode(uniform_gray(8, 8, 10), ImageFormat::Jpeg);
    let result = kit().assess_bytes(bytes, Some("image/jpeg"), "photo.jpg").unwrap();

    // Lossy decode: allow a couple of intensity levels per cell
    let expected = 64.0 * 40.0075875;
    assert!((result.total_co2_sequestered_tonnes - expected).abs() < 64.0 * 8.0);
    assert_eq!(result.carbon_credits, result.total_co2_sequestered_tonnes);
}

#[test]
fn test_unsupported_format() {
    let err = kit().assess_bytes(b"%PDF-1.4".to_vec(), Some("application/pdf"), "report.pdf").unwrap_err();
    assert!(matches!(err, CarbonError::UnsupportedFormat { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_corrupt_input() {
    let err = kit().assess_bytes(vec![0x13, 0x37, 0x00, 0xFF, 0x42], Some("image/tiff"), "noise.tif")
        .unwrap_err();
    assert!(matches!(err, CarbonError::CorruptInput { .. }));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_tiff_with_short_strip_is_corrupt() {
    // Valid header and IFD, but 5 of 12 strip bytes
    let bytes = georeferenced_tiff(4, 3, &[10; 5]);
    let err = kit().assess_bytes(bytes, Some("image/tiff"), "short.tif").unwrap_err();
    assert!(matches!(err, CarbonError::CorruptInput { .. }));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_overflowing_total_is_internal_fault() {
    let params = ModelParameters { biomass_coef_a: 1e305, ..ModelParameters::default() };
    let kit = CarbonKit::new(params, NormalizerOptions::default()).unwrap();
    // Each cell is finite (about 1.6e304 t); 16384 of them overflow f64
    let bytes = encode(uniform_gray(128, 128, 1), ImageFormat::Png);

    let err = kit.assess_bytes(bytes, Some("image/png"), "dense.png").unwrap_err();
    assert!(matches!(err, CarbonError::InternalFault { .. }));
}

#[test]
fn test_truncated_png_is_corrupt() {
    let mut bytes = encode(uniform_gray(16, 16, 200), ImageFormat::Png);
    bytes.truncate(bytes.len() / 2);
    let err = kit().assess_bytes(bytes, Some("image/png"), "cut.png").unwrap_err();
    assert!(matches!(err, CarbonError::CorruptInput { .. }));
}

#[test]
fn test_assess_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("field.png");
    std::fs::write(&path, encode(uniform_gray(4, 3, 10), ImageFormat::Png)).unwrap();

    let result = kit().assess_file(&path, None).unwrap();
    assert_eq!(result.total_co2_sequestered_tonnes, 480.09);

    let missing = kit().assess_file(dir.path().join("absent.png"), None).unwrap_err();
    assert!(matches!(missing, CarbonError::InternalFault { .. }));
}

#[test]
fn test_invalid_parameters_are_internal_fault() {
    let params = ModelParameters { pixel_area_ha: 0.0, ..ModelParameters::default() };
    let result = CarbonKit::new(params, NormalizerOptions::default());
    assert!(matches!(result, Err(CarbonError::InternalFault { .. })));
}

#[test]
fn test_result_json_shape() {
    let bytes = encode(uniform_gray(4, 3, 10), ImageFormat::Png);
    let result = kit().assess_bytes(bytes, None, "uniform.png").unwrap();
    let json: serde_json::Value = serde_json::to_value(result).unwrap();

    assert_eq!(json["total_CO2_sequestered_tonnes"], 480.09);
    assert_eq!(json["carbon_credits"], 480.09);
    assert_eq!(json.as_object().unwrap().len(), 2);
}
