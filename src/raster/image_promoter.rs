//! Promotion of plain 2D images to single-channel samples
//!
//! JPEG and PNG uploads, and TIFFs the band reader cannot handle, are
//! decoded with the `image` crate and reduced to luminance. The sample
//! precision follows the source: 8-bit images give 0-255, 16-bit images
//! 0-65535 and float images their luminance as stored.

use image::DynamicImage;
use log::debug;

/// Single-channel samples of a decoded image
#[derive(Debug, Clone)]
pub struct PromotedImage {
    pub width: usize,
    pub height: usize,
    /// Row-major luminance
    pub samples: Vec<f64>,
}

/// Decodes `bytes` with format sniffing and reduces them to one channel
pub fn promote(bytes: &[u8]) -> image::ImageResult<PromotedImage> {
    let image = image::load_from_memory(bytes)?;
    debug!("Decoded {}x{} image as {:?}", image.width(), image.height(), image.color());
    Ok(to_luminance(&image))
}

/// Reduces an already-decoded image to luminance samples
pub fn to_luminance(image: &DynamicImage) -> PromotedImage {
    let (width, height) = (image.width() as usize, image.height() as usize);

    let samples: Vec<f64> = match image {
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => {
            image.to_luma16().into_raw().into_iter().map(f64::from).collect()
        },
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            image.to_luma32f().into_raw().into_iter().map(f64::from).collect()
        },
        _ => image.to_luma8().into_raw().into_iter().map(f64::from).collect(),
    };

    PromotedImage { width, height, samples }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, ImageFormat, Luma, Rgb, RgbImage};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    #[test]
    fn test_gray_png_keeps_values() {
        let gray = GrayImage::from_raw(3, 2, vec![0, 10, 20, 30, 40, 255]).unwrap();
        let promoted = promote(&encode(DynamicImage::ImageLuma8(gray), ImageFormat::Png)).unwrap();

        assert_eq!((promoted.width, promoted.height), (3, 2));
        assert_eq!(promoted.samples, vec![0.0, 10.0, 20.0, 30.0, 40.0, 255.0]);
    }

    #[test]
    fn test_rgb_reduces_to_one_channel() {
        let rgb = RgbImage::from_pixel(2, 2, Rgb([200, 200, 200]));
        let promoted = promote(&encode(DynamicImage::ImageRgb8(rgb), ImageFormat::Png)).unwrap();

        assert_eq!(promoted.samples.len(), 4);
        assert!(promoted.samples.iter().all(|v| *v == 200.0));
    }

    #[test]
    fn test_sixteen_bit_precision_is_kept() {
        let wide: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(2, 1, vec![1000, 65535]).unwrap();
        let promoted = promote(&encode(DynamicImage::ImageLuma16(wide), ImageFormat::Png)).unwrap();

        assert_eq!(promoted.samples, vec![1000.0, 65535.0]);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(promote(b"definitely not an image").is_err());
        assert!(promote(&[]).is_err());
    }
}
