//! Zoom-VRT builder.
//!
//! For a tileset and a single zoom level, builds a virtual mosaic referencing
//! every processed raster whose `max_lod` qualifies at that zoom. GDAL's
//! `BuildVRT` paints sources in argument order with later entries on top, so
//! sources are sorted by descending `max_lod`: the highest-detail charts are
//! placed first (painted first, underneath), and the lower-LOD charts end up
//! last in the list, i.e. on top.

use crate::ffi::build_vrt;
use anyhow::Result;
use chartpyramid_core::{Dataset as CatalogDataset, PipelineErrorKind, Tileset};
use chartpyramid_derive::context;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

struct Candidate {
	path: PathBuf,
	max_lod: u8,
}

/// Builds (or skips) the zoom-VRT for `tileset_name` at zoom `z`. Returns
/// `None` if no dataset in the tileset qualifies at this zoom (either its
/// `max_lod` is below `z`, or its processed raster was never written).
#[context("building zoom-VRT for tileset {tileset_name:?} at z={z}")]
pub fn build_zoom_vrt(
	tmppath: &Path,
	tileset_name: &str,
	tileset: &Tileset,
	datasets: &HashMap<String, CatalogDataset>,
	z: u8,
) -> Result<Option<PathBuf>> {
	let mut candidates: Vec<Candidate> = tileset
		.datasets
		.iter()
		.filter_map(|name| {
			let dataset = datasets.get(name)?;
			if dataset.max_lod < z {
				return None;
			}
			let path = tmppath.join(dataset.tmp_filename(name));
			path.exists().then_some(Candidate { path, max_lod: dataset.max_lod })
		})
		.collect();

	if candidates.is_empty() {
		return Ok(None);
	}

	candidates.sort_by_key(|c| std::cmp::Reverse(c.max_lod));

	let vrt_path = tmppath.join(format!("__{tileset_name}__z{z}.vrt"));
	let sources: Vec<PathBuf> = candidates.into_iter().map(|c| c.path).collect();
	build_vrt(&vrt_path, &sources).map_err(|err| err.context(PipelineErrorKind::VrtBuildFailed))?;

	Ok(Some(vrt_path))
}
