//! Catalog loader: the fixed JSON schema describing datasets and tilesets.
//!
//! ## JSON shape
//!
//! ```json
//! {
//!   "datasets": {
//!     "sectional_seattle": {
//!       "zip_file": "sectional_seattle",
//!       "input_file": "sectional_seattle.tif",
//!       "mask": [[[1000, 500], [7000, 500], [7000, 5500], [1000, 5500]]],
//!       "geobound": [-125.0, 47.0, -120.0, null],
//!       "gcps": [[100, 200, -124.9, 49.1], [7900, 200, -120.1, 49.1], [4000, 5900, -122.5, 46.9]],
//!       "max_lod": 11
//!     }
//!   },
//!   "tilesets": {
//!     "sectionals": {
//!       "tile_path": "sectionals",
//!       "zoom": [0, 11],
//!       "datasets": ["sectional_seattle"]
//!     }
//!   }
//! }
//! ```
//!
//! Reading from a file and resolving dataset references:
//! ```no_run
//! use std::path::Path;
//! use chartpyramid_core::Catalog;
//! let catalog = Catalog::from_path(Path::new("catalog.json")).expect("catalog");
//! ```

use anyhow::{Result, bail, ensure};
use chartpyramid_derive::context;
use serde::Deserialize;
use std::{
	collections::HashMap,
	fs::File,
	io::{BufReader, Read},
	path::Path,
};

/// A ground control point: a correspondence between a source-image pixel and a
/// geographic (longitude, latitude) coordinate, expressed as a 4-element JSON array
/// `[pixel_x, pixel_y, lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Gcp(pub f64, pub f64, pub f64, pub f64);

impl Gcp {
	#[must_use]
	pub fn pixel_x(self) -> f64 {
		self.0
	}
	#[must_use]
	pub fn pixel_y(self) -> f64 {
		self.1
	}
	#[must_use]
	pub fn lon(self) -> f64 {
		self.2
	}
	#[must_use]
	pub fn lat(self) -> f64 {
		self.3
	}
}

/// A pixel-space polygon mask: an ordered list of rings, the first being the outer
/// boundary (counter-clockwise) and the remainder holes (clockwise).
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct Mask(pub Vec<Vec<[f64; 2]>>);

impl Mask {
	/// The outer boundary ring, or an error if the mask has no rings.
	pub fn outer_ring(&self) -> Result<&[[f64; 2]]> {
		self.0.first().map(Vec::as_slice).ok_or_else(|| anyhow::anyhow!("mask has no rings"))
	}

	/// The hole rings (everything after the outer ring).
	#[must_use]
	pub fn holes(&self) -> &[Vec<[f64; 2]>] {
		if self.0.is_empty() { &[] } else { &self.0[1..] }
	}

	/// Axis-aligned bounding box of the outer ring, as `(min_x, min_y, max_x, max_y)`.
	#[context("computing mask bounding box")]
	pub fn outer_bbox(&self) -> Result<(f64, f64, f64, f64)> {
		let ring = self.outer_ring()?;
		ensure!(!ring.is_empty(), "mask outer ring has no vertices");
		let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
		let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
		for &[x, y] in ring {
			min_x = min_x.min(x);
			min_y = min_y.min(y);
			max_x = max_x.max(x);
			max_y = max_y.max(y);
		}
		let area = (max_x - min_x) * (max_y - min_y);
		ensure!(area > 0.0, "mask outer ring has zero-area bounding box");
		Ok((min_x, min_y, max_x, max_y))
	}
}

/// Optional geographic clip bounds; any of the four sides may be absent (`null`),
/// meaning "do not clip that side". Order is `[lon_min, lat_min, lon_max, lat_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Default)]
pub struct GeoBound(pub [Option<f64>; 4]);

impl GeoBound {
	#[must_use]
	pub fn lon_min(self) -> Option<f64> {
		self.0[0]
	}
	#[must_use]
	pub fn lat_min(self) -> Option<f64> {
		self.0[1]
	}
	#[must_use]
	pub fn lon_max(self) -> Option<f64> {
		self.0[2]
	}
	#[must_use]
	pub fn lat_max(self) -> Option<f64> {
		self.0[3]
	}

	/// `true` if at least one side constrains the bounds.
	#[must_use]
	pub fn is_any_set(self) -> bool {
		self.0.iter().any(Option::is_some)
	}
}

/// One chart definition: a source archive member plus optional georeferencing aids.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
	/// Archive stem; the source file is opened at `/vsizip/{zippath}/{zip_file}.zip/{input_file}`.
	pub zip_file: String,

	/// Member name inside the archive. Defaults to `"{zip_file}.tif"` when omitted.
	pub input_file: Option<String>,

	/// Pixel-space polygon mask; absent means no masking stage.
	pub mask: Option<Mask>,

	/// Optional geographic clip bounds.
	pub geobound: Option<GeoBound>,

	/// Ground control points (3-16) used to derive the georeferencing affine.
	pub gcps: Option<Vec<Gcp>>,

	/// Target zoom level determining this dataset's native processed resolution.
	pub max_lod: u8,
}

impl Dataset {
	/// Name of the member inside `{zip_file}.zip`, defaulting to `"{zip_file}.tif"`.
	#[must_use]
	pub fn input_file_name(&self) -> String {
		self.input_file.clone().unwrap_or_else(|| format!("{}.tif", self.zip_file))
	}

	/// The GDAL `/vsizip/` virtual-filesystem path for this dataset's source raster.
	#[must_use]
	pub fn vsizip_path(&self, zip_dir: &Path) -> String {
		format!(
			"/vsizip/{}/{}.zip/{}",
			zip_dir.display(),
			self.zip_file,
			self.input_file_name()
		)
	}

	/// Output filename of this dataset's processed raster, relative to `tmppath`.
	#[must_use]
	pub fn tmp_filename(&self, name: &str) -> String {
		format!("{name}.tif")
	}
}

/// A named mosaic: an ordered group of datasets rendered together into one tile tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tileset {
	/// Output subdirectory under `outpath`.
	pub tile_path: String,

	/// `[zoom_min, zoom_max]`.
	pub zoom: [u8; 2],

	/// Names of datasets contributing to this tileset, in manifest/VRT ordering.
	pub datasets: Vec<String>,
}

impl Tileset {
	#[must_use]
	pub fn zoom_min(&self) -> u8 {
		self.zoom[0]
	}
	#[must_use]
	pub fn zoom_max(&self) -> u8 {
		self.zoom[1]
	}
}

/// The root of the JSON catalog file: every known dataset and tileset.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
	pub datasets: HashMap<String, Dataset>,
	pub tilesets: HashMap<String, Tileset>,
}

impl Catalog {
	/// Parses a catalog from a string slice. Convenience for tests.
	#[context("parsing catalog from string (JSON)")]
	pub fn from_str(text: &str) -> Result<Catalog> {
		Ok(serde_json::from_str(text)?)
	}

	/// Parses a catalog from any `Read` implementor.
	#[context("parsing catalog from reader (JSON)")]
	pub fn from_reader<R: Read>(reader: R) -> Result<Catalog> {
		Ok(serde_json::from_reader(reader)?)
	}

	/// Parses a catalog from a file path.
	#[context("reading catalog file '{}'", path.display())]
	pub fn from_path(path: &Path) -> Result<Catalog> {
		let file = File::open(path)?;
		Catalog::from_reader(BufReader::new(file))
	}

	/// Looks up a tileset by name, or all tilesets when `names` is empty.
	pub fn select_tilesets<'a>(&'a self, names: &[String]) -> Result<Vec<(&'a str, &'a Tileset)>> {
		if names.is_empty() {
			return Ok(self.tilesets.iter().map(|(k, v)| (k.as_str(), v)).collect());
		}
		names
			.iter()
			.map(|name| {
				self
					.tilesets
					.get_key_value(name)
					.map(|(k, v)| (k.as_str(), v))
					.ok_or_else(|| anyhow::anyhow!("unknown tileset \"{name}\""))
			})
			.collect()
	}

	/// Looks up a dataset by name.
	pub fn dataset(&self, name: &str) -> Result<&Dataset> {
		self.datasets.get(name).ok_or_else(|| anyhow::anyhow!("unknown dataset \"{name}\""))
	}

	/// The union of dataset names referenced by the given tilesets, de-duplicated.
	#[must_use]
	pub fn dataset_union<'a>(&self, tilesets: &[(&'a str, &'a Tileset)]) -> Vec<String> {
		let mut seen = std::collections::HashSet::new();
		let mut out = Vec::new();
		for (_, tileset) in tilesets {
			for name in &tileset.datasets {
				if seen.insert(name.clone()) {
					out.push(name.clone());
				}
			}
		}
		out
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn sample_json() -> &'static str {
		r#"{
			"datasets": {
				"a": {
					"zip_file": "a",
					"input_file": "a.tif",
					"mask": [[[0,0],[10,0],[10,10],[0,10]]],
					"geobound": [-125.0, 47.0, null, null],
					"gcps": [[0,0,-125.0,49.0],[10,0,-120.0,49.0],[0,10,-125.0,45.0]],
					"max_lod": 11
				}
			},
			"tilesets": {
				"t": { "tile_path": "t", "zoom": [0, 11], "datasets": ["a"] }
			}
		}"#
	}

	#[test]
	fn parses_well_formed_catalog() {
		let catalog = Catalog::from_str(sample_json()).unwrap();
		assert_eq!(catalog.datasets.len(), 1);
		let ds = catalog.dataset("a").unwrap();
		assert_eq!(ds.zip_file, "a");
		assert_eq!(ds.max_lod, 11);
		assert_eq!(ds.gcps.as_ref().unwrap().len(), 3);
		let tileset = &catalog.tilesets["t"];
		assert_eq!(tileset.zoom_min(), 0);
		assert_eq!(tileset.zoom_max(), 11);
	}

	#[test]
	fn rejects_unknown_top_level_field() {
		let text = r#"{"datasets": {}, "tilesets": {}, "bogus": 1}"#;
		assert!(Catalog::from_str(text).is_err());
	}

	#[test]
	fn rejects_unknown_dataset_field() {
		let text = r#"{
			"datasets": { "a": { "zip_file": "a", "max_lod": 3, "bogus": true } },
			"tilesets": {}
		}"#;
		assert!(Catalog::from_str(text).is_err());
	}

	#[test]
	fn input_file_defaults_to_zip_file_stem() {
		let catalog = Catalog::from_str(
			r#"{"datasets": {"a": {"zip_file": "chart", "max_lod": 5}}, "tilesets": {}}"#,
		)
		.unwrap();
		assert_eq!(catalog.dataset("a").unwrap().input_file_name(), "chart.tif");
	}

	#[test]
	fn mask_outer_bbox_matches_vertices() {
		let mask = Mask(vec![vec![[1.0, 2.0], [5.0, 2.0], [5.0, 6.0], [1.0, 6.0]]]);
		assert_eq!(mask.outer_bbox().unwrap(), (1.0, 2.0, 5.0, 6.0));
	}

	#[test]
	fn mask_with_zero_area_outer_ring_is_rejected() {
		let mask = Mask(vec![vec![[1.0, 2.0], [1.0, 6.0]]]);
		assert!(mask.outer_bbox().is_err());
	}

	#[test]
	fn dataset_union_deduplicates_across_tilesets() {
		let catalog = Catalog::from_str(sample_json()).unwrap();
		let selected = catalog.select_tilesets(&[]).unwrap();
		let union = catalog.dataset_union(&selected);
		assert_eq!(union, vec!["a".to_string()]);
	}

	#[test]
	fn select_tilesets_rejects_unknown_name() {
		let catalog = Catalog::from_str(sample_json()).unwrap();
		assert!(catalog.select_tilesets(&["missing".to_string()]).is_err());
	}
}
