//! Signature bitmaps captured by the signing pad.
//!
//! The client submits signatures as base64 PNG (occasionally JPEG), usually as a data URL
//! (`data:image/png;base64,...`). PDF image XObjects cannot carry PNG directly, so the bitmap is
//! decoded and split into 8-bit RGB samples plus an optional DeviceGray soft mask for the alpha
//! channel.

use crate::{PdfError, PdfResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// A decoded signature ready for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl SignatureImage {
    /// Decodes base64 image data, with or without a data-URL prefix.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Signature`] if the data URL is malformed, the payload is not valid
    /// base64, or the bytes are not a decodable PNG/JPEG image.
    pub fn decode(input: &str) -> PdfResult<Self> {
        let payload = strip_data_url(input.trim())?;
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(PdfError::Signature("empty image data".into()));
        }

        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| PdfError::Signature(format!("invalid base64: {e}")))?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| PdfError::Signature(format!("undecodable image: {e}")))?;

        Self::from_rgba(image.to_rgba8())
    }

    /// Splits an RGBA buffer into RGB samples and a soft mask. The mask is omitted when every
    /// pixel is fully opaque.
    pub fn from_rgba(image: image::RgbaImage) -> PdfResult<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PdfError::Signature("image has no pixels".into()));
        }

        let pixels = (width as usize) * (height as usize);
        let mut rgb = Vec::with_capacity(pixels * 3);
        let mut alpha = Vec::with_capacity(pixels);
        for px in image.pixels() {
            let [r, g, b, a] = px.0;
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }
        let opaque = alpha.iter().all(|&a| a == u8::MAX);

        Ok(Self {
            width,
            height,
            rgb,
            alpha: (!opaque).then_some(alpha),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    pub fn alpha(&self) -> Option<&[u8]> {
        self.alpha.as_deref()
    }

    /// Largest size with this image's aspect ratio that fits inside `max_width` x `max_height`.
    pub fn fit_within(&self, max_width: f32, max_height: f32) -> (f32, f32) {
        let scale = (max_width / self.width as f32).min(max_height / self.height as f32);
        (self.width as f32 * scale, self.height as f32 * scale)
    }
}

fn strip_data_url(input: &str) -> PdfResult<&str> {
    let Some(rest) = input.strip_prefix("data:") else {
        return Ok(input);
    };
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| PdfError::Signature("data URL has no payload".into()))?;
    if !meta.ends_with(";base64") {
        return Err(PdfError::Signature(
            "data URL must be base64 encoded".into(),
        ));
    }
    Ok(payload)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    /// Base64 PNG of a `width` x `height` image: transparent except for a dark diagonal.
    pub(crate) fn signature_png_base64(width: u32, height: u32) -> String {
        let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
        for i in 0..width.min(height) {
            img.put_pixel(i, i, Rgba([10, 10, 60, 255]));
        }
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .expect("encode png");
        STANDARD.encode(buf.into_inner())
    }

    #[test]
    fn test_decode_plain_base64() {
        let sig = SignatureImage::decode(&signature_png_base64(40, 20)).unwrap();
        assert_eq!(sig.width(), 40);
        assert_eq!(sig.height(), 20);
        assert_eq!(sig.rgb().len(), 40 * 20 * 3);
        assert_eq!(sig.alpha().map(<[u8]>::len), Some(40 * 20));
    }

    #[test]
    fn test_decode_data_url() {
        let url = format!("data:image/png;base64,{}", signature_png_base64(8, 8));
        assert!(SignatureImage::decode(&url).is_ok());
    }

    #[test]
    fn test_opaque_image_has_no_mask() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let sig = SignatureImage::from_rgba(img).unwrap();
        assert!(sig.alpha().is_none());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            SignatureImage::decode("not base64!!"),
            Err(PdfError::Signature(_))
        ));
        assert!(matches!(
            SignatureImage::decode("aGVsbG8gd29ybGQ="),
            Err(PdfError::Signature(_))
        ));
        assert!(matches!(
            SignatureImage::decode("data:image/png,abcd"),
            Err(PdfError::Signature(_))
        ));
        assert!(matches!(
            SignatureImage::decode("data:image/png;base64,"),
            Err(PdfError::Signature(_))
        ));
    }

    #[test]
    fn test_fit_within_preserves_aspect() {
        let sig = SignatureImage::decode(&signature_png_base64(200, 50)).unwrap();
        let (w, h) = sig.fit_within(150.0, 40.0);
        assert!((w - 150.0).abs() < 1e-3);
        assert!((h - 37.5).abs() < 1e-3);

        let (w, h) = sig.fit_within(400.0, 25.0);
        assert!((w - 100.0).abs() < 1e-3);
        assert!((h - 25.0).abs() < 1e-3);
    }
}
