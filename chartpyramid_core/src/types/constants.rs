//! Web Mercator (EPSG:3857) geodetic constants shared across the crate.

use std::f64::consts::PI;

/// WGS84 semi-major axis (equatorial radius) in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Earth circumference in meters at the equator (`2 * PI * EARTH_RADIUS`).
pub const WORLD_SIZE: f64 = 2.0 * PI * EARTH_RADIUS;

/// Half the Web Mercator world extent in meters (`PI * EARTH_RADIUS`). Coordinates
/// in EPSG:3857 range `[-ORIGIN_SHIFT, ORIGIN_SHIFT]` on both axes.
pub const ORIGIN_SHIFT: f64 = PI * EARTH_RADIUS;

/// Maximum latitude in degrees for the Web Mercator projection (EPSG:3857).
pub const MAX_LAT: f64 = 85.051_128_779_806_59;

/// Maximum longitude in degrees for the Web Mercator projection (EPSG:3857).
pub const MAX_LON: f64 = 180.0;

/// Ground resolution in meters/pixel of one equatorial 256px tile at zoom `z`.
///
/// `equatorial_resolution(z) = 2 * ORIGIN_SHIFT / (256 * 2^z)`
#[must_use]
pub fn equatorial_resolution(z: u8) -> f64 {
	2.0 * ORIGIN_SHIFT / (256.0 * 2.0f64.powi(i32::from(z)))
}
