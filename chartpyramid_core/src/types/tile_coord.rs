//! Three-dimensional tile coordinates in a Web Mercator pyramid.
//!
//! [`TileCoord`] represents a single `(z, x, y)` address in the XYZ tiling
//! scheme used throughout this crate: zoom increases resolution, and `x`/`y`
//! range over `[0, 2^z)` with the origin at the top-left.

use crate::{
	GeoBBox,
	types::constants::{ORIGIN_SHIFT, equatorial_resolution},
};
use anyhow::{Result, ensure};
use chartpyramid_derive::context;
use std::fmt::{self, Debug};

/// A tile address at a given zoom level.
#[derive(Eq, PartialEq, Clone, Hash, Copy)]
pub struct TileCoord {
	pub level: u8,
	pub x: u32,
	pub y: u32,
}

impl TileCoord {
	/// Creates a new `TileCoord`, validating `0 <= x,y < 2^level` and `level <= 31`.
	pub fn new(level: u8, x: u32, y: u32) -> Result<TileCoord> {
		ensure!(level <= 31, "level ({level}) must be <= 31");
		let max = 2u32.pow(u32::from(level));
		ensure!(x < max, "x ({x}) out of bounds for level {level}");
		ensure!(y < max, "y ({y}) out of bounds for level {level}");
		Ok(TileCoord { level, x, y })
	}

	/// Creates a `TileCoord` from geographic coordinates (longitude, latitude) at a given zoom level.
	#[context("Failed to convert geo coordinates ({x}, {y}, {z}) to TileCoord")]
	pub fn from_geo(x: f64, y: f64, z: u8) -> Result<TileCoord> {
		ensure!(z <= 31, "z ({z}) must be <= 31");
		ensure!((-180. ..=180.).contains(&x), "x ({x}) must be in [-180,180]");
		ensure!((-90. ..=90.).contains(&y), "y ({y}) must be in [-90,90]");

		let zoom = 2.0f64.powi(i32::from(z));
		let px = zoom * (x / 360.0 + 0.5);
		let py = zoom * (0.5 - 0.5 * (y * std::f64::consts::PI / 360.0 + std::f64::consts::PI / 4.0).tan().ln() / std::f64::consts::PI);

		TileCoord::new(
			z,
			px.min(zoom - 1.0).max(0.0).floor() as u32,
			py.min(zoom - 1.0).max(0.0).floor() as u32,
		)
	}

	/// Converts `(level, x, y)` to the longitude/latitude of the tile's northwest corner.
	#[must_use]
	pub fn coord_to_geo(level: u8, x: u32, y: u32) -> [f64; 2] {
		let zoom = 2.0f64.powi(i32::from(level));
		let pi = std::f64::consts::PI;
		[
			(f64::from(x) / zoom - 0.5) * 360.0,
			((pi * (1.0 - 2.0 * f64::from(y) / zoom)).exp().atan() / pi - 0.25) * 360.0,
		]
	}

	#[must_use]
	pub fn as_geo(&self) -> [f64; 2] {
		TileCoord::coord_to_geo(self.level, self.x, self.y)
	}

	/// The geographic bounding box `[west, south, east, north]` covered by this tile.
	pub fn to_geo_bbox(&self) -> Result<GeoBBox> {
		let [w, n] = self.as_geo();
		let [e, s] = TileCoord::coord_to_geo(self.level, self.x + 1, self.y + 1);
		GeoBBox::new(w, s, e, n)
	}

	/// The tile's extent in EPSG:3857 meters, per `tile_extent(z,x,y)`.
	#[must_use]
	pub fn to_mercator_extent(&self) -> [f64; 4] {
		let res = equatorial_resolution(self.level) * 256.0;
		let min_x = -ORIGIN_SHIFT + f64::from(self.x) * res;
		let max_x = -ORIGIN_SHIFT + f64::from(self.x + 1) * res;
		let tms_y = (1u64 << self.level) as f64 - 1.0 - f64::from(self.y);
		let min_y = -ORIGIN_SHIFT + tms_y * res;
		let max_y = -ORIGIN_SHIFT + (tms_y + 1.0) * res;
		[min_x, min_y, max_x, max_y]
	}

	/// Highest valid `x`/`y` value at this zoom level (`2^level - 1`).
	#[must_use]
	pub fn max_value(&self) -> u32 {
		(1u32 << self.level) - 1
	}

	/// Returns the XYZ tile at the given zoom, scaling `x`/`y` up or down from this one.
	#[must_use]
	pub fn at_level(&self, level: u8) -> TileCoord {
		assert!(level <= 31, "level ({level}) must be <= 31");
		if level > self.level {
			let scale = 2u32.pow(u32::from(level - self.level));
			TileCoord { x: self.x * scale, y: self.y * scale, level }
		} else if level < self.level {
			let scale = 2u32.pow(u32::from(self.level - level));
			TileCoord { x: self.x / scale, y: self.y / scale, level }
		} else {
			*self
		}
	}

	/// The parent tile at `level - 1`, per the XYZ convention (`x/2, y/2`).
	pub fn parent(&self) -> Result<TileCoord> {
		ensure!(self.level > 0, "cannot decrease level below 0");
		TileCoord::new(self.level - 1, self.x / 2, self.y / 2)
	}

	/// The packed 32-bit key `(x << 16) | y` used by the tile manifest (§3 "Packed tile").
	#[must_use]
	pub fn packed_xy(&self) -> u32 {
		(self.x << 16) | self.y
	}

	/// Flips `y` between the XYZ and TMS tile schemes.
	pub fn flip_y(&mut self) {
		self.y = self.max_value() - self.y;
	}
}

impl Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!("TileCoord({}, [{}, {}])", &self.level, &self.x, &self.y))
	}
}

/// Lexicographic ordering: first by zoom `level`, then `y`, then `x`.
impl PartialOrd for TileCoord {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		match self.level.partial_cmp(&other.level) {
			Some(core::cmp::Ordering::Equal) => {}
			ord => return ord,
		}
		match self.y.partial_cmp(&other.y) {
			Some(core::cmp::Ordering::Equal) => {}
			ord => return ord,
		}
		self.x.partial_cmp(&other.x)
	}
}
