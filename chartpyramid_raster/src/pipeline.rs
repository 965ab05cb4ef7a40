//! Orchestrates the seven pipeline stages for one dataset, in sequence.

use crate::stages::{
	clip_to_geobound, expand_and_window, fit_gcp_affine, open_from_archive, persist_with_overviews,
	rasterize_mask, warp_latitude_normalized,
};
use anyhow::Result;
use chartpyramid_core::{Dataset as CatalogDataset, ResampleKernel};
use chartpyramid_derive::context;
use std::path::{Path, PathBuf};

/// A pixel offset accumulated across windowing stages, relative to the
/// original source image, so later stages (GCP fitting) can translate
/// original-image pixel coordinates into the current raster's own grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelOffset {
	pub x: f64,
	pub y: f64,
}

impl PixelOffset {
	#[must_use]
	pub fn translated(self, dx: f64, dy: f64) -> PixelOffset {
		PixelOffset { x: self.x + dx, y: self.y + dy }
	}
}

/// Runs the full pipeline for one dataset and writes the processed raster to
/// `tmppath/{tmp_file}`. Returns the output path on success.
#[context("processing dataset {name:?}")]
pub fn process_dataset(
	name: &str,
	dataset: &CatalogDataset,
	zip_dir: &Path,
	tmppath: &Path,
	kernel: ResampleKernel,
	threads_per_job: u32,
) -> Result<PathBuf> {
	log::info!("processing dataset {name}");

	let src = open_from_archive(zip_dir, dataset)?;
	let (src, window_offset) = expand_and_window(src, dataset.mask.as_ref())?;

	let (src, cumulative_offset) = if let Some(mask) = &dataset.mask {
		rasterize_mask(src, mask, window_offset)?
	} else {
		(src, window_offset)
	};

	let src = if let Some(gcps) = &dataset.gcps {
		fit_gcp_affine(src, gcps, cumulative_offset)?
	} else {
		src
	};

	let src = warp_latitude_normalized(src, dataset.max_lod, kernel, threads_per_job)?;

	let src = if let Some(geobound) = &dataset.geobound {
		clip_to_geobound(src, geobound)?
	} else {
		src
	};

	let out_path = tmppath.join(dataset.tmp_filename(name));
	persist_with_overviews(&src, &out_path)?;

	log::info!("finished dataset {name} -> {}", out_path.display());
	Ok(out_path)
}

/// Work estimate used to sort jobs before dispatch: the mask's outer-ring
/// bounding-box area, or `0.0` when the dataset has no mask. Larger charts
/// run first so stragglers don't extend the tail of the job queue.
#[must_use]
pub fn work_estimate(dataset: &CatalogDataset) -> f64 {
	dataset
		.mask
		.as_ref()
		.and_then(|mask| mask.outer_bbox().ok())
		.map(|(min_x, min_y, max_x, max_y)| (max_x - min_x) * (max_y - min_y))
		.unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chartpyramid_core::Mask;

	#[test]
	fn work_estimate_is_zero_without_mask() {
		let dataset = CatalogDataset {
			zip_file: "a".into(),
			input_file: None,
			mask: None,
			geobound: None,
			gcps: None,
			max_lod: 8,
		};
		assert_eq!(work_estimate(&dataset), 0.0);
	}

	#[test]
	fn work_estimate_matches_mask_bbox_area() {
		let dataset = CatalogDataset {
			zip_file: "a".into(),
			input_file: None,
			mask: Some(Mask(vec![vec![[0.0, 0.0], [10.0, 0.0], [10.0, 5.0], [0.0, 5.0]]])),
			geobound: None,
			gcps: None,
			max_lod: 8,
		};
		assert_eq!(work_estimate(&dataset), 50.0);
	}
}
