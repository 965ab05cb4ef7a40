//! Tile manifest: the set of `(z, x, y)` triples a tileset must produce.
//!
//! Derived per contributing dataset from its processed raster's geographic
//! extent (read back from the GeoTIFF's geotransform, converted Web Mercator
//! meters -> lon/lat) and its `max_lod`, clamped to the tileset's own zoom
//! range. Antimeridian-crossing extents are split into two tile-coordinate
//! queries rather than rejected.

use anyhow::{Context, Result};
use chartpyramid_core::{Dataset as CatalogDataset, PipelineErrorKind, TileCoord, Tileset, constants::ORIGIN_SHIFT};
use chartpyramid_derive::context;
use gdal::Dataset as GdalDataset;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// The `(x, y)` tiles present at one zoom level of a manifest, packed and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoomTiles {
	packed: Vec<u32>,
}

impl ZoomTiles {
	#[must_use]
	pub fn contains(&self, x: u32, y: u32) -> bool {
		self.packed.binary_search(&((x << 16) | y)).is_ok()
	}

	pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
		self.packed.iter().map(|&p| (p >> 16, p & 0xFFFF))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.packed.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.packed.is_empty()
	}
}

/// The full set of `(z, x, y)` triples a tileset must produce.
#[derive(Debug, Clone, Default)]
pub struct TileManifest {
	pub zoom_min: u8,
	pub zoom_max: u8,
	by_zoom: BTreeMap<u8, Vec<u32>>,
}

impl TileManifest {
	#[must_use]
	pub fn zoom(&self, z: u8) -> ZoomTiles {
		ZoomTiles { packed: self.by_zoom.get(&z).cloned().unwrap_or_default() }
	}

	#[must_use]
	pub fn total_tiles(&self) -> usize {
		self.by_zoom.values().map(Vec::len).sum()
	}

	/// Flattens the manifest into one ordered `(z, x, y)` vector, lowest zoom
	/// first. Phase 1 dispatches jobs against this order via a shared atomic
	/// counter, so workers always claim indices, never ranges.
	#[must_use]
	pub fn flatten(&self) -> Vec<(u8, u32, u32)> {
		let mut out = Vec::with_capacity(self.total_tiles());
		for (&z, packed) in &self.by_zoom {
			for &p in packed {
				out.push((z, p >> 16, p & 0xFFFF));
			}
		}
		out
	}
}

/// A geographic bbox that may extend past `±180°` longitude before
/// normalization; used internally to detect antimeridian crossings.
#[derive(Debug, Clone, Copy)]
struct RawLonLatBBox {
	lon_min: f64,
	lat_min: f64,
	lon_max: f64,
	lat_max: f64,
}

fn normalize_lon(lon: f64) -> f64 {
	let mut l = lon % 360.0;
	if l < -180.0 {
		l += 360.0;
	}
	if l > 180.0 {
		l -= 360.0;
	}
	l
}

/// Builds the manifest for `tileset`: for every dataset whose processed raster
/// exists under `tmppath`, reads its geographic extent and, for every zoom in
/// `[tileset.zoom_min(), min(dataset.max_lod, tileset.zoom_max())]`, inserts
/// every tile the extent covers.
#[context("building tile manifest for tileset {tileset_name:?}")]
pub fn build_manifest(
	tileset_name: &str,
	tileset: &Tileset,
	datasets: &HashMap<String, CatalogDataset>,
	tmppath: &Path,
) -> Result<TileManifest> {
	let mut by_zoom: BTreeMap<u8, Vec<u32>> = BTreeMap::new();

	for name in &tileset.datasets {
		let Some(dataset) = datasets.get(name) else { continue };
		let path = tmppath.join(dataset.tmp_filename(name));
		if !path.exists() {
			continue;
		}
		let bbox = dataset_geo_bbox(&path)
			.with_context(|| format!("reading geographic extent of {path:?}"))
			.map_err(|err| err.context(PipelineErrorKind::ManifestReadFailed))?;

		let ds_max_zoom = dataset.max_lod.min(tileset.zoom_max());
		if tileset.zoom_min() > ds_max_zoom {
			continue;
		}
		for z in tileset.zoom_min()..=ds_max_zoom {
			insert_bbox_tiles(&mut by_zoom, z, &bbox)
				.map_err(|err| err.context(PipelineErrorKind::ManifestReadFailed))?;
		}
	}

	for packed in by_zoom.values_mut() {
		packed.sort_unstable();
		packed.dedup();
	}

	Ok(TileManifest { zoom_min: tileset.zoom_min(), zoom_max: tileset.zoom_max(), by_zoom })
}

fn dataset_geo_bbox(path: &Path) -> Result<RawLonLatBBox> {
	let ds = GdalDataset::open(path)?;
	let gt = ds.geo_transform().context("processed raster has no geotransform")?;
	let (width, height) = ds.raster_size();

	let min_x = gt[0];
	let max_x = gt[0] + gt[1] * width as f64;
	let max_y = gt[3];
	let min_y = gt[3] + gt[5] * height as f64;

	let lon = |mx: f64| mx * 180.0 / ORIGIN_SHIFT;
	let lat = |my: f64| (my * std::f64::consts::PI / ORIGIN_SHIFT).sinh().atan() * 180.0 / std::f64::consts::PI;

	Ok(RawLonLatBBox { lon_min: lon(min_x), lat_min: lat(min_y), lon_max: lon(max_x), lat_max: lat(max_y) })
}

/// Inserts every `(x, y)` tile at zoom `z` covered by `bbox` into `by_zoom`.
/// When the normalized longitude range wraps past `±180°`, splits into the
/// `[lon_min, 180]` and `[-180, lon_max]` sub-ranges (§4.5 antimeridian rule).
fn insert_bbox_tiles(by_zoom: &mut BTreeMap<u8, Vec<u32>>, z: u8, bbox: &RawLonLatBBox) -> Result<()> {
	let lat_min = bbox.lat_min.clamp(-90.0, 90.0);
	let lat_max = bbox.lat_max.clamp(-90.0, 90.0);
	let lon_min_n = normalize_lon(bbox.lon_min);
	let lon_max_n = normalize_lon(bbox.lon_max);

	let ranges: &[(f64, f64)] =
		if lon_min_n <= lon_max_n { &[(lon_min_n, lon_max_n)] } else { &[(lon_min_n, 180.0), (-180.0, lon_max_n)] };

	let packed = by_zoom.entry(z).or_default();
	for &(lo, hi) in ranges {
		let top_left = TileCoord::from_geo(lo, lat_max, z)?;
		let bottom_right = TileCoord::from_geo(hi, lat_min, z)?;
		for x in top_left.x..=bottom_right.x {
			for y in top_left.y..=bottom_right.y {
				packed.push((x << 16) | y);
			}
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn single_zoom_bbox_covers_expected_tile_range() {
		let mut by_zoom = BTreeMap::new();
		let bbox = RawLonLatBBox { lon_min: -0.5, lat_min: 51.3, lon_max: 0.5, lat_max: 51.7 };
		insert_bbox_tiles(&mut by_zoom, 10, &bbox).unwrap();
		let tiles = &by_zoom[&10];
		assert!(!tiles.is_empty());
		for &p in tiles {
			let (x, y) = (p >> 16, p & 0xFFFF);
			let top_left = TileCoord::from_geo(-0.5, 51.7, 10).unwrap();
			let bottom_right = TileCoord::from_geo(0.5, 51.3, 10).unwrap();
			assert!((top_left.x..=bottom_right.x).contains(&x));
			assert!((top_left.y..=bottom_right.y).contains(&y));
		}
	}

	#[test]
	fn antimeridian_crossing_bbox_splits_into_two_ranges() {
		// Scenario B: a dataset spanning 170°E to 170°W.
		let mut by_zoom = BTreeMap::new();
		let bbox = RawLonLatBBox { lon_min: 170.0, lat_min: 50.0, lon_max: -170.0, lat_max: 55.0 };
		insert_bbox_tiles(&mut by_zoom, 6, &bbox).unwrap();
		let tiles = &by_zoom[&6];

		let far_east = TileCoord::from_geo(175.0, 52.0, 6).unwrap();
		let far_west = TileCoord::from_geo(-175.0, 52.0, 6).unwrap();
		assert!(tiles.contains(&far_east.packed_xy()));
		assert!(tiles.contains(&far_west.packed_xy()));

		// Nothing from the excluded middle of the globe should appear.
		let antipodal = TileCoord::from_geo(0.0, 52.0, 6).unwrap();
		assert!(!tiles.contains(&antipodal.packed_xy()));
	}

	#[test]
	fn empty_by_zoom_when_no_dataset_qualifies() {
		let datasets = HashMap::new();
		let tileset = Tileset { tile_path: "t".to_string(), zoom: [0, 10], datasets: vec!["missing".to_string()] };
		let dir = tempfile::tempdir().unwrap();
		let manifest = build_manifest("t", &tileset, &datasets, dir.path()).unwrap();
		assert_eq!(manifest.total_tiles(), 0);
	}
}
