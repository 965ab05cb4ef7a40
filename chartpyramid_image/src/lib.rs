//! Tile image encoding/decoding and compositing utilities.
//!
//! This crate provides utilities and trait extensions built around the
//! [`image::DynamicImage`] type, used by the tile engine to produce 256×256 RGBA tile
//! images and by Phase 2 to composite and downsample them into lower-zoom overviews.
//!
//! ### Features
//! - Unified access to the three supported tile codecs (`PNG`, `JPEG`, `WEBP`).
//! - Trait extensions for:
//!   - Conversion and encoding (`traits::convert`)
//!   - Metadata and pixel introspection (`traits::info`)
//!   - Common transformations (scaling, flattening, cropping; `traits::operation`)
//!   - Deterministic test image generation (`traits::test`)

pub mod format;
#[cfg(any(test, feature = "test"))]
pub mod helper;
#[path = "image.rs"]
mod raw_image;
pub mod traits;

pub use format::*;
pub use image::{DynamicImage, GenericImageView, ImageBuffer, Luma, LumaA, Rgb, Rgba};
pub use raw_image::{Image, PixelValueType};
pub use traits::*;
