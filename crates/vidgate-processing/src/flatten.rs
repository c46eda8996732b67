//! Image re-encoding
//!
//! Accepted images are decoded, composited onto an opaque background and written
//! back as baseline JPEG at a fixed quality.

use image::codecs::jpeg::JpegEncoder;
use image::{ImageReader, Rgb, RgbImage};
use std::io::Cursor;
use vidgate_core::IngestError;

/// JPEG quality for flattened images.
pub const JPEG_QUALITY: u8 = 90;

/// Background transparent pixels are composited onto.
pub const FLATTEN_BACKGROUND: [u8; 3] = [255, 255, 255];

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode JPEG: {0}")]
    Encode(String),
}

impl From<TransformError> for IngestError {
    fn from(e: TransformError) -> Self {
        IngestError::Transform(e.to_string())
    }
}

/// Decode any supported image and re-encode it as an opaque JPEG.
///
/// CPU-bound; callers on the async runtime should use `spawn_blocking`.
pub fn flatten_to_jpeg(data: &[u8]) -> Result<Vec<u8>, TransformError> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| TransformError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| TransformError::Decode(e.to_string()))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut flat = RgbImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let blend = |channel: usize| -> u8 {
            let fg = pixel[channel] as u32 * alpha;
            let bg = FLATTEN_BACKGROUND[channel] as u32 * (255 - alpha);
            ((fg + bg + 127) / 255) as u8
        };
        flat.put_pixel(x, y, Rgb([blend(0), blend(1), blend(2)]));
    }

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder
        .encode_image(&flat)
        .map_err(|e| TransformError::Encode(e.to_string()))?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};

    fn png_with_transparency() -> Vec<u8> {
        let mut img = RgbaImage::from_pixel(16, 16, Rgba([200, 0, 0, 255]));
        for x in 0..8 {
            for y in 0..16 {
                img.put_pixel(x, y, Rgba([0, 0, 0, 0]));
            }
        }
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_flatten_produces_opaque_jpeg() {
        let jpeg = flatten_to_jpeg(&png_with_transparency()).unwrap();
        assert_eq!(&jpeg[..3], &[0xFF, 0xD8, 0xFF]);

        let decoded = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (16, 16));

        let transparent_side = decoded.get_pixel(2, 8);
        assert!(transparent_side[0] > 240 && transparent_side[1] > 240 && transparent_side[2] > 240);

        let opaque_side = decoded.get_pixel(13, 8);
        assert!(opaque_side[0] > 150 && opaque_side[1] < 60);
    }

    #[test]
    fn test_flatten_rejects_garbage() {
        let result = flatten_to_jpeg(b"definitely not an image");
        assert!(matches!(result, Err(TransformError::Decode(_))));
    }

    #[test]
    fn test_transform_error_converts() {
        let err: IngestError = TransformError::Encode("boom".to_string()).into();
        assert!(matches!(err, IngestError::Transform(_)));
    }
}
