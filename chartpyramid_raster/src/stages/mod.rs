//! The seven fixed pipeline stages, applied in sequence to one dataset.
//!
//! Each stage takes ownership of the `gdal::Dataset` produced by the previous
//! one and returns its replacement; a stage with nothing to do returns its
//! input unchanged. Offset-tracking stages additionally return the pixel
//! offset accumulated so far, relative to the original source image.

pub mod clip;
pub mod expand;
pub mod gcp;
pub mod mask;
pub mod open;
pub mod persist;
pub mod warp;

pub use clip::clip_to_geobound;
pub use expand::expand_and_window;
pub use gcp::fit_gcp_affine;
pub use mask::rasterize_mask;
pub use open::open_from_archive;
pub use persist::persist_with_overviews;
pub use warp::warp_latitude_normalized;
