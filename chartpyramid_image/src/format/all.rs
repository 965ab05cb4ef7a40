//! Unified image format interface for the tile engine.
//!
//! This module abstracts over the individual format modules (`jpeg`, `png`, `webp`) and
//! exposes two central functions — [`encode`] and [`decode`] — that dispatch to the correct codec
//! implementation based on [`TileFormat`].
//!
//! ### Supported formats
//! - **JPEG** — lossy 8‑bit RGB/L images, no alpha support.
//! - **PNG** — lossless 8‑bit L/LA/RGB/RGBA, optional speed tuning.
//! - **WebP** — lossy or lossless 8‑bit RGB/RGBA.
use crate::{jpeg, png, webp};
use anyhow::Result;
use chartpyramid_core::{Blob, TileFormat};
use image::DynamicImage;

/// Encode a [`DynamicImage`] into the given [`TileFormat`].
///
/// Dispatches to the corresponding codec module based on `format`.
/// - `JPG` uses only `quality`.
/// - `PNG` uses only `speed`.
/// - `WEBP` uses only `quality`.
pub fn encode(image: &DynamicImage, format: TileFormat, quality: Option<u8>, speed: Option<u8>) -> Result<Blob> {
	match format {
		TileFormat::Jpeg => jpeg::encode(image, quality),
		TileFormat::Png => png::encode(image, speed),
		TileFormat::Webp => webp::encode(image, quality),
	}
}

/// Decode an image [`Blob`] back into a [`DynamicImage`] given its [`TileFormat`].
///
/// Dispatches to the format‑specific `blob2image()` implementation.
pub fn decode(blob: &Blob, format: TileFormat) -> Result<DynamicImage> {
	match format {
		TileFormat::Jpeg => jpeg::blob2image(blob),
		TileFormat::Png => png::blob2image(blob),
		TileFormat::Webp => webp::blob2image(blob),
	}
}
