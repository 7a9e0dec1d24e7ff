//! Fingerprint images
//!
//! One pixel per SRAM bit, row-major, MSB of each byte first.

use anyhow::{anyhow, bail, Context, Result};
use image::{GrayImage, ImageFormat, Luma};
use std::path::Path;

const WHITE: u8 = 255;
const BLACK: u8 = 0;

/// Render a fingerprint as black and white pixels, 1 bits white.
///
/// Every byte yields eight pixels, so `bits.len() * 8` must equal
/// `width * height`.
pub fn render_bits(bits: &[u8], width: u32, height: u32) -> Result<GrayImage> {
    if width == 0 || height == 0 {
        bail!("width and height must be positive");
    }
    let pixels = width as usize * height as usize;
    if bits.len() * 8 != pixels {
        bail!(
            "{} bytes give {} pixels, image has {}x{}",
            bits.len(),
            bits.len() * 8,
            width,
            height
        );
    }

    let data: Vec<u8> = bits
        .iter()
        .flat_map(|byte| (0..8u32).rev().map(move |i| if byte >> i & 1 == 1 { WHITE } else { BLACK }))
        .collect();
    GrayImage::from_raw(width, height, data).ok_or_else(|| anyhow!("Failed to create image buffer"))
}

/// Render per-bit set counts as a gray heatmap.
///
/// A bit set in every one of `samples` readings is white, a bit never set is
/// black.
pub fn render_heatmap(counts: &[u32], samples: u32, width: u32, height: u32) -> Result<GrayImage> {
    if samples == 0 {
        bail!("samples must be at least 1");
    }
    if width == 0 || height == 0 {
        bail!("width and height must be positive");
    }
    if counts.len() != width as usize * height as usize {
        bail!(
            "{} counts do not fill a {}x{} image",
            counts.len(),
            width,
            height
        );
    }
    if let Some(max) = counts.iter().copied().max().filter(|&max| max > samples) {
        bail!("count {} exceeds sample count {}", max, samples);
    }

    let mut img = GrayImage::new(width, height);
    for (pixel, &count) in img.pixels_mut().zip(counts) {
        let value = (count as f64 / samples as f64 * WHITE as f64).round() as u8;
        *pixel = Luma([value]);
    }
    Ok(img)
}

/// Save an image as PNG
pub fn save_png<P: AsRef<Path>>(img: &GrayImage, path: P) -> Result<()> {
    let path = path.as_ref();
    img.save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to write PNG to {:?}", path))?;

    tracing::debug!(
        path = ?path,
        dimensions = format!("{}x{}", img.width(), img.height()),
        "wrote PNG"
    );
    Ok(())
}
