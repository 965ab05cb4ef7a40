//! Phase 1: renders base tiles directly from the zoom-VRTs.
//!
//! Work is dispatched across up to `max_workers` OS threads via a shared
//! atomic counter into the manifest's flattened `(z, x, y)` vector, rather
//! than through [`chartpyramid_core::run_job_queue`]'s push dispatcher: each
//! worker keeps a private `zoom -> open VRT dataset` cache that must survive
//! across many claimed tiles, which the job queue's per-call closures don't
//! give a natural home for.

use super::{TILE_SIZE, TileEngineConfig, TileEngineReport, TileOutcome, tile_file_path};
use crate::manifest::TileManifest;
use anyhow::{Context, Result};
use chartpyramid_core::{PipelineErrorKind, TileCoord};
use chartpyramid_image::Image;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Renders every base tile in `manifest`, reading from the zoom-VRT registered
/// for each zoom in `vrt_paths`. Skips tiles whose output file already exists.
pub fn run_phase1(
	manifest: &TileManifest,
	vrt_paths: &HashMap<u8, PathBuf>,
	outpath: &Path,
	tile_path: &str,
	max_workers: usize,
	config: &TileEngineConfig,
) -> TileEngineReport {
	let tiles = manifest.flatten();
	if tiles.is_empty() {
		return TileEngineReport::default();
	}

	let worker_count = max_workers.max(1).min(tiles.len());
	let counter = Arc::new(AtomicUsize::new(0));
	let tiles = Arc::new(tiles);
	let vrt_paths = Arc::new(vrt_paths.clone());
	let outpath = Arc::new(outpath.to_path_buf());
	let tile_path = Arc::new(tile_path.to_string());
	let config = Arc::new(config.clone());

	let handles: Vec<_> = (0..worker_count)
		.map(|worker_id| {
			let counter = counter.clone();
			let tiles = tiles.clone();
			let vrt_paths = vrt_paths.clone();
			let outpath = outpath.clone();
			let tile_path = tile_path.clone();
			let config = config.clone();
			thread::spawn(move || {
				let mut open_vrts: HashMap<u8, gdal::Dataset> = HashMap::new();
				let mut report = TileEngineReport::default();
				loop {
					let index = counter.fetch_add(1, Ordering::SeqCst);
					if index >= tiles.len() {
						break;
					}
					let (z, x, y) = tiles[index];
					match produce_base_tile(&mut open_vrts, &vrt_paths, z, x, y, &outpath, &tile_path, &config) {
						Ok(outcome) => report.record(outcome),
						Err(err) => {
							log::error!("worker {worker_id} failed producing base tile z{z}/{x}/{y}: {err:#}");
							report.failed += 1;
						}
					}
				}
				report
			})
		})
		.collect();

	let mut total = TileEngineReport::default();
	for handle in handles {
		match handle.join() {
			Ok(report) => total.merge(report),
			Err(_) => {
				log::error!("phase 1 worker thread panicked");
				total.failed += 1;
			}
		}
	}
	total
}

#[allow(clippy::too_many_arguments)]
fn produce_base_tile(
	open_vrts: &mut HashMap<u8, gdal::Dataset>,
	vrt_paths: &HashMap<u8, PathBuf>,
	z: u8,
	x: u32,
	y: u32,
	outpath: &Path,
	tile_path: &str,
	config: &TileEngineConfig,
) -> Result<TileOutcome> {
	let file_path = tile_file_path(outpath, tile_path, config.format, z, x, y);
	if file_path.exists() {
		return Ok(TileOutcome::Existing);
	}

	let coord = TileCoord::new(z, x, y)?;
	let [tile_min_x, tile_min_y, tile_max_x, tile_max_y] = coord.to_mercator_extent();

	let ds = match open_vrts.entry(z) {
		Entry::Occupied(e) => e.into_mut(),
		Entry::Vacant(e) => {
			let path = vrt_paths
				.get(&z)
				.ok_or_else(|| anyhow::anyhow!("no zoom-VRT registered for z={z}"))
				.map_err(|err| err.context(PipelineErrorKind::VrtBuildFailed))?;
			let opened = gdal::Dataset::open(path)
				.with_context(|| format!("opening zoom-VRT {path:?}"))
				.map_err(|err| err.context(PipelineErrorKind::VrtBuildFailed))?;
			e.insert(opened)
		}
	};

	let ds_gt = ds.geo_transform().context("zoom-VRT has no geotransform")?;
	let (ds_w, ds_h) = ds.raster_size();
	let ds_min_x = ds_gt[0];
	let ds_max_x = ds_gt[0] + ds_gt[1] * ds_w as f64;
	let ds_max_y = ds_gt[3];
	let ds_min_y = ds_gt[3] + ds_gt[5] * ds_h as f64;

	let inter_min_x = tile_min_x.max(ds_min_x);
	let inter_max_x = tile_max_x.min(ds_max_x);
	let inter_min_y = tile_min_y.max(ds_min_y);
	let inter_max_y = tile_max_y.min(ds_max_y);
	if inter_min_x >= inter_max_x || inter_min_y >= inter_max_y {
		return Ok(TileOutcome::Skipped);
	}

	let px_x = |mx: f64| (mx - ds_gt[0]) / ds_gt[1];
	let px_y = |my: f64| (ds_gt[3] - my) / -ds_gt[5];

	let src_x0 = px_x(inter_min_x).floor().clamp(0.0, ds_w as f64) as usize;
	let src_x1 = px_x(inter_max_x).ceil().clamp(0.0, ds_w as f64) as usize;
	let src_y0 = px_y(inter_max_y).floor().clamp(0.0, ds_h as f64) as usize;
	let src_y1 = px_y(inter_min_y).ceil().clamp(0.0, ds_h as f64) as usize;
	if src_x1 <= src_x0 || src_y1 <= src_y0 {
		return Ok(TileOutcome::Skipped);
	}
	let (src_w, src_h) = (src_x1 - src_x0, src_y1 - src_y0);

	let scale_x = TILE_SIZE as f64 / (tile_max_x - tile_min_x);
	let scale_y = TILE_SIZE as f64 / (tile_max_y - tile_min_y);
	let dest_x0 = ((inter_min_x - tile_min_x) * scale_x).round().clamp(0.0, TILE_SIZE as f64) as usize;
	let dest_x1 = ((inter_max_x - tile_min_x) * scale_x).round().clamp(0.0, TILE_SIZE as f64) as usize;
	let dest_y0 = ((tile_max_y - inter_max_y) * scale_y).round().clamp(0.0, TILE_SIZE as f64) as usize;
	let dest_y1 = ((tile_max_y - inter_min_y) * scale_y).round().clamp(0.0, TILE_SIZE as f64) as usize;
	if dest_x1 <= dest_x0 || dest_y1 <= dest_y0 {
		return Ok(TileOutcome::Skipped);
	}
	let (dest_w, dest_h) = (dest_x1 - dest_x0, dest_y1 - dest_y0);

	let mut tile = Image::new_empty(TILE_SIZE, TILE_SIZE, 4, chartpyramid_image::PixelValueType::U8);
	let band_count = ds.raster_count();
	let resample = Some(config.resampling.as_gdal());

	for band_index in 1..=band_count.min(3) {
		let band = ds.rasterband(band_index)?;
		let buffer = band.read_as::<u8>((src_x0 as isize, src_y0 as isize), (src_w, src_h), (dest_w, dest_h), resample)?;
		blit_channel(&mut tile.data, dest_x0, dest_y0, dest_w, dest_h, band_index - 1, &buffer.data);
	}

	if band_count >= 4 {
		let band = ds.rasterband(4)?;
		let buffer = band.read_as::<u8>((src_x0 as isize, src_y0 as isize), (src_w, src_h), (dest_w, dest_h), resample)?;
		blit_channel(&mut tile.data, dest_x0, dest_y0, dest_w, dest_h, 3, &buffer.data);
	} else {
		fill_channel(&mut tile.data, dest_x0, dest_y0, dest_w, dest_h, 3, 255);
	}

	if tile.data.iter().skip(3).step_by(4).all(|&a| a == 0) {
		return Ok(TileOutcome::Skipped);
	}

	write_tile(&file_path, tile, config).map_err(|err| err.context(PipelineErrorKind::TileWriteFailed))?;
	Ok(TileOutcome::Generated)
}

pub(crate) fn write_tile(file_path: &Path, image: Image, config: &TileEngineConfig) -> Result<()> {
	std::fs::create_dir_all(file_path.parent().context("tile path has no parent directory")?)?;
	let dyn_image: image::DynamicImage = image.try_into()?;
	let blob = chartpyramid_image::encode(&dyn_image, config.format, config.quality, config.speed)?;
	std::fs::write(file_path, blob.as_bytes())?;
	Ok(())
}

fn blit_channel(dst: &mut [u8], dest_x0: usize, dest_y0: usize, w: usize, h: usize, channel: usize, src: &[u8]) {
	for row in 0..h {
		for col in 0..w {
			let dst_idx = ((dest_y0 + row) * TILE_SIZE + (dest_x0 + col)) * 4 + channel;
			dst[dst_idx] = src[row * w + col];
		}
	}
}

fn fill_channel(dst: &mut [u8], dest_x0: usize, dest_y0: usize, w: usize, h: usize, channel: usize, value: u8) {
	for row in 0..h {
		for col in 0..w {
			let dst_idx = ((dest_y0 + row) * TILE_SIZE + (dest_x0 + col)) * 4 + channel;
			dst[dst_idx] = value;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::manifest::build_manifest;
	use chartpyramid_core::{Dataset as CatalogDataset, ResampleKernel, TileFormat, Tileset};
	use gdal::DriverManager;
	use std::collections::HashMap;
	use tempfile::tempdir;

	fn write_rgba_tif(path: &Path, w: usize, h: usize, gt: [f64; 6]) {
		let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
		let mut ds = driver.create_with_band_type::<u8, _>(path.to_str().unwrap(), w, h, 4).unwrap();
		ds.set_geo_transform(&gt).unwrap();
		for band_index in 1..=4 {
			let mut band = ds.rasterband(band_index).unwrap();
			let value = if band_index == 4 { 255 } else { 128 };
			band.write((0, 0), (w, h), &gdal::raster::Buffer::new((w, h), vec![value; w * h])).unwrap();
		}
	}

	#[test]
	fn produces_tile_intersecting_vrt_and_skips_on_second_run() {
		let dir = tempdir().unwrap();
		let raster_path = dir.path().join("chart.tif");
		// A raster that exactly covers level-0 tile (0,0,0)'s mercator extent.
		let coord = TileCoord::new(0, 0, 0).unwrap();
		let [min_x, min_y, max_x, max_y] = coord.to_mercator_extent();
		let res = (max_x - min_x) / 512.0;
        write_rgba_tif(&raster_path, 512, 512, [min_x, res, 0.0, max_y, 0.0, -res]);

		let mut datasets = HashMap::new();
		datasets.insert(
			"chart".to_string(),
			CatalogDataset { zip_file: "chart".to_string(), input_file: None, mask: None, geobound: None, gcps: None, max_lod: 0 },
		);
		let tileset = Tileset { tile_path: "t".to_string(), zoom: [0, 0], datasets: vec!["chart".to_string()] };
		let manifest = build_manifest("t", &tileset, &datasets, dir.path()).unwrap();
		assert_eq!(manifest.total_tiles(), 1);

		let mut vrt_paths = HashMap::new();
		vrt_paths.insert(0u8, raster_path.clone());

		let outpath = dir.path().join("out");
		let config =
			TileEngineConfig { format: TileFormat::Png, resampling: ResampleKernel::Bilinear, quality: None, speed: None };

		let report = run_phase1(&manifest, &vrt_paths, &outpath, "t", 2, &config);
		assert_eq!(report.generated, 1);
		assert_eq!(report.failed, 0);
		assert!(outpath.join("t/0/0/0.png").exists());

		let report2 = run_phase1(&manifest, &vrt_paths, &outpath, "t", 2, &config);
		assert_eq!(report2.existing, 1);
		assert_eq!(report2.generated, 0);
	}
}
