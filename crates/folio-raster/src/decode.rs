//! Image XObject samples to RGBA pixels.

use folio_parse::{ImageData, ImageEncoding};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};

use crate::error::RasterError;

/// Decode the samples of an image XObject.
///
/// JPEG payloads go through the `image` decoder. Raw payloads must be 8 bits
/// per component in Gray, RGB or CMYK.
pub fn decode_image(data: &ImageData) -> Result<RgbaImage, RasterError> {
    match data.encoding {
        ImageEncoding::Jpeg => {
            let img = image::load_from_memory_with_format(&data.data, ImageFormat::Jpeg)?;
            Ok(img.to_rgba8())
        }
        ImageEncoding::Raw => decode_raw(data),
    }
}

fn decode_raw(data: &ImageData) -> Result<RgbaImage, RasterError> {
    if data.bits_per_component != 8 {
        return Err(RasterError::Image(format!(
            "unsupported bits per component {}",
            data.bits_per_component
        )));
    }
    let (w, h) = (data.width, data.height);
    let pixels = w as usize * h as usize;
    let needed = pixels * usize::from(data.components);
    if pixels == 0 || data.data.len() < needed {
        return Err(RasterError::Image(format!(
            "sample data too short: {} bytes for {w}x{h}x{}",
            data.data.len(),
            data.components
        )));
    }
    let samples = data.data[..needed].to_vec();

    let dynamic = match data.components {
        1 => GrayImage::from_raw(w, h, samples).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(w, h, samples).map(DynamicImage::ImageRgb8),
        4 => RgbImage::from_raw(w, h, cmyk_to_rgb(&samples)).map(DynamicImage::ImageRgb8),
        n => {
            return Err(RasterError::Image(format!("unsupported component count {n}")));
        }
    };
    dynamic
        .map(|img| img.to_rgba8())
        .ok_or_else(|| RasterError::Image(format!("cannot build {w}x{h} image buffer")))
}

fn cmyk_to_rgb(samples: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() / 4 * 3);
    for px in samples.chunks_exact(4) {
        let k = 255 - u16::from(px[3]);
        for &ink in &px[..3] {
            out.push(((255 - u16::from(ink)) * k / 255) as u8);
        }
    }
    out
}
