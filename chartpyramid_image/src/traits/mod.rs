//! Core image trait extensions for the tile pipeline.
//!
//! This module aggregates several traits that extend [`image::DynamicImage`] with additional
//! functionality used throughout the tile-image pipeline:
//!
//! - [`DynamicImageTraitConvert`] — conversion between formats, raw buffers, and iteration over pixel bytes.
//! - [`DynamicImageTraitInfo`] — lightweight metadata, comparison, and introspection helpers.
//! - [`DynamicImageTraitOperation`] — higher‑level image manipulation (flattening, scaling, cropping, etc.).
//! - [`resize_with_kernel`] — exact-size resizing keyed to the catalog's resampling kernel vocabulary.

mod convert;
mod info;
mod operation;
mod resize;
#[cfg(any(test, feature = "test"))]
mod test;

pub use convert::*;
pub use info::*;
pub use operation::*;
pub use resize::resize_with_kernel;
#[cfg(any(test, feature = "test"))]
pub use test::*;
