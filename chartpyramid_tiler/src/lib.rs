//! Zoom-VRT mosaics, tile manifests, and the two-phase tile pyramid engine.
//!
//! [`run_tileset`] wires the three together for one catalog tileset: build the
//! tile manifest, build a zoom-VRT for every zoom level the manifest actually
//! touches, then run Phase 1 (parallel base tiles) followed by Phase 2
//! (sequential overview synthesis).

mod ffi;
pub mod engine;
pub mod manifest;
pub mod vrt;

pub use engine::{TileEngineConfig, TileEngineReport};
pub use manifest::{TileManifest, ZoomTiles, build_manifest};
pub use vrt::build_zoom_vrt;

use anyhow::Result;
use chartpyramid_core::{Dataset as CatalogDataset, Tileset};
use chartpyramid_derive::context;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Builds the manifest and per-zoom VRTs for `tileset`, then renders every tile
/// into `{outpath}/{tileset.tile_path}/`. Zoom levels with an empty manifest
/// entry are skipped rather than producing a pointless single-source VRT.
#[context("generating tiles for tileset {tileset_name:?}")]
pub fn run_tileset(
	tileset_name: &str,
	tileset: &Tileset,
	datasets: &HashMap<String, CatalogDataset>,
	tmppath: &Path,
	outpath: &Path,
	max_workers: usize,
	config: &TileEngineConfig,
) -> Result<TileEngineReport> {
	let manifest = manifest::build_manifest(tileset_name, tileset, datasets, tmppath)?;

	let mut vrt_paths: HashMap<u8, PathBuf> = HashMap::new();
	for z in tileset.zoom_min()..=tileset.zoom_max() {
		if manifest.zoom(z).is_empty() {
			continue;
		}
		if let Some(path) = vrt::build_zoom_vrt(tmppath, tileset_name, tileset, datasets, z)? {
			vrt_paths.insert(z, path);
		}
	}

	let mut report = engine::run_phase1(&manifest, &vrt_paths, outpath, &tileset.tile_path, max_workers, config);
	let phase2_report = engine::run_phase2(outpath, &tileset.tile_path, tileset.zoom_min(), tileset.zoom_max(), config);
	report.merge(phase2_report);

	Ok(report)
}
