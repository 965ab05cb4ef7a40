//! Coordinates, bounding boxes, geodetic constants, and the closed format/kernel vocabularies.

mod blob;
pub use blob::*;

mod geo_bbox;
pub use geo_bbox::*;

mod resample_kernel;
pub use resample_kernel::*;

mod tile_coord;
pub use tile_coord::*;

mod tile_format;
pub use tile_format::*;

pub mod constants;
pub use constants::equatorial_resolution;
