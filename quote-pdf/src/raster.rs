//! Raster images for embedding as PDF image XObjects

use crate::error::{PdfError, PdfResult};
use lopdf::{Stream, dictionary};

/// 8-bit RGB raster, row-major, no alpha
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl RasterImage {
    /// Wrap raw RGB pixels, checking the buffer matches the dimensions
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> PdfResult<Self> {
        if width == 0 || height == 0 {
            return Err(PdfError::InvalidImage(format!(
                "empty image ({width}x{height})"
            )));
        }
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(PdfError::InvalidImage(format!(
                "expected {expected} bytes for {width}x{height} RGB, got {}",
                rgb.len()
            )));
        }
        Ok(Self { width, height, rgb })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Height/width ratio, used to size the image inside a box
    pub fn aspect_ratio(&self) -> f32 {
        self.height as f32 / self.width as f32
    }

    pub(crate) fn to_stream(&self) -> Stream {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => self.width as i64,
                "Height" => self.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
            },
            self.rgb.clone(),
        )
    }
}

/// Decode a PNG/JPEG/WebP image from memory
///
/// Transparent pixels are composited over white, since the document
/// background is white and PDF RGB images carry no alpha.
#[cfg(feature = "image")]
pub fn decode_image(bytes: &[u8]) -> PdfResult<RasterImage> {
    let img =
        image::load_from_memory(bytes).map_err(|e| PdfError::InvalidImage(e.to_string()))?;
    from_dynamic(img)
}

/// Load an image file from disk
#[cfg(feature = "image")]
#[tracing::instrument]
pub fn load_image(path: &std::path::Path) -> PdfResult<RasterImage> {
    let img = image::open(path).map_err(|e| PdfError::InvalidImage(e.to_string()))?;
    tracing::debug!(width = img.width(), height = img.height(), "image decoded");
    from_dynamic(img)
}

#[cfg(feature = "image")]
fn from_dynamic(img: image::DynamicImage) -> PdfResult<RasterImage> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let a = a as u16;
        for channel in [r, g, b] {
            let blended = (channel as u16 * a + 255 * (255 - a)) / 255;
            rgb.push(blended as u8);
        }
    }

    RasterImage::from_rgb(width, height, rgb)
}
