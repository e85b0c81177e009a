use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context as _;

use crate::data_uri::DataUri;
use crate::foundation::error::{LatexError, LatexResult};

/// Options for rasterizing decoded SVG documents.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DecodeOpts {
    /// Pixels per SVG user unit.
    pub scale: f32,
    /// Largest raster width or height accepted.
    pub max_dim: u32,
}

impl Default for DecodeOpts {
    fn default() -> Self {
        Self {
            scale: 1.0,
            max_dim: 16_384,
        }
    }
}

/// A fully decoded image: the SVG's intrinsic size plus its rasterization.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    /// Intrinsic size in SVG user units.
    pub natural_size: kurbo::Size,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl DecodedImage {
    /// Encode the raster as PNG (straight alpha).
    pub fn to_png(&self) -> LatexResult<Vec<u8>> {
        let mut rgba = self.rgba8_premul.as_ref().clone();
        unpremultiply_rgba8_in_place(&mut rgba);
        let img = image::RgbaImage::from_raw(self.width, self.height, rgba)
            .ok_or_else(|| LatexError::decode("raster buffer does not match its dimensions"))?;

        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode png")?;
        Ok(buf)
    }
}

pub fn decode_data_uri(uri: &DataUri, opts: &DecodeOpts) -> LatexResult<DecodedImage> {
    if !opts.scale.is_finite() || opts.scale <= 0.0 {
        return Err(LatexError::validation("decode scale must be finite and > 0"));
    }

    let bytes = uri.svg_bytes()?;
    let tree = usvg::Tree::from_data(&bytes, &usvg::Options::default())
        .context("parse svg tree")
        .map_err(|e| LatexError::decode(format!("{e:#}")))?;

    let size = tree.size();
    let width = raster_dim(size.width(), opts)?;
    let height = raster_dim(size.height(), opts)?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| LatexError::decode("failed to allocate svg pixmap"))?;
    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    Ok(DecodedImage {
        natural_size: kurbo::Size::new(f64::from(size.width()), f64::from(size.height())),
        width,
        height,
        rgba8_premul: Arc::new(pixmap.take()),
    })
}

fn raster_dim(v: f32, opts: &DecodeOpts) -> LatexResult<u32> {
    if !v.is_finite() || v <= 0.0 {
        return Err(LatexError::decode("svg has invalid width/height"));
    }
    let px = (v * opts.scale).ceil().max(1.0);
    if px > opts.max_dim as f32 {
        return Err(LatexError::decode(format!(
            "svg raster size too large: {px} (max {})",
            opts.max_dim
        )));
    }
    Ok(px as u32)
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}
