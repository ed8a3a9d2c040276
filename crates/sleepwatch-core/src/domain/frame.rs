//! Input frame type.

use image::{ImageFormat, RgbImage};

use crate::error::{PipelineError, PipelineResult};

/// MIME types accepted by the pipeline.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Returns true if `content_type` names a format the pipeline accepts.
///
/// Parameters such as `; charset=...` are ignored.
#[must_use]
pub fn is_accepted_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ACCEPTED_CONTENT_TYPES.contains(&essence.as_str())
}

/// A single RGB frame, owned by one pipeline invocation.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    /// Decodes JPEG or PNG bytes into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInputType`] when the bytes are not JPEG/PNG,
    /// and [`PipelineError::UndecodableImage`] when decoding fails.
    pub fn decode(bytes: &[u8]) -> PipelineResult<Self> {
        let format = image::guess_format(bytes).map_err(|_| PipelineError::InvalidInputType)?;
        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            return Err(PipelineError::InvalidInputType);
        }

        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| PipelineError::UndecodableImage(e.to_string()))?;
        Ok(Self::from_dynamic(&image))
    }

    /// Wraps an already decoded image, converting it to RGB.
    #[must_use]
    pub fn from_dynamic(image: &image::DynamicImage) -> Self {
        Self {
            image: image.to_rgb8(),
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The underlying raster.
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        Self { image }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(format: ImageFormat) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 6, image::Rgb([10, 20, 30])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_content_types() {
        assert!(is_accepted_content_type("image/jpeg"));
        assert!(is_accepted_content_type("image/png"));
        assert!(is_accepted_content_type("IMAGE/PNG; foo=bar"));
        assert!(!is_accepted_content_type("image/gif"));
        assert!(!is_accepted_content_type("text/plain"));
        assert!(!is_accepted_content_type(""));
    }

    #[test]
    fn test_decode_png() {
        let frame = Frame::decode(&encode(ImageFormat::Png)).unwrap();
        assert_eq!(frame.width(), 8);
        assert_eq!(frame.height(), 6);
        assert_eq!(frame.image().get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_decode_jpeg() {
        let frame = Frame::decode(&encode(ImageFormat::Jpeg)).unwrap();
        assert_eq!((frame.width(), frame.height()), (8, 6));
    }

    #[test]
    fn test_decode_rejects_unknown_bytes() {
        let result = Frame::decode(b"definitely not an image");
        assert!(matches!(result, Err(PipelineError::InvalidInputType)));
    }

    #[test]
    fn test_decode_rejects_truncated_png() {
        let mut bytes = encode(ImageFormat::Png);
        bytes.truncate(24);
        let result = Frame::decode(&bytes);
        assert!(matches!(result, Err(PipelineError::UndecodableImage(_))));
    }
}
