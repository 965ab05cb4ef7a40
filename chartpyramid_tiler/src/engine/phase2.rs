//! Phase 2: synthesizes every coarser zoom by compositing and downsampling the
//! zoom directly below it, one level at a time (each level depends on the one
//! rendered before it, so unlike Phase 1 this phase is sequential).

use super::{TILE_SIZE, TileEngineConfig, TileEngineReport, TileOutcome, tile_file_path};
use crate::engine::phase1::write_tile;
use anyhow::{Context, Result};
use chartpyramid_core::{Blob, PipelineErrorKind, TileFormat};
use chartpyramid_image::{Image, PixelValueType, decode, resize_with_kernel};
use image::{DynamicImage, GenericImageView};
use std::collections::BTreeSet;
use std::path::Path;

/// Synthesizes every zoom from `zoom_max - 1` down to `zoom_min` by compositing
/// 2x2 blocks of the zoom below and downsampling to 256x256. Zoom levels are
/// processed strictly in descending order: each one reads the children that
/// either Phase 1 or the previous iteration of this function just wrote.
pub fn run_phase2(outpath: &Path, tile_path: &str, zoom_min: u8, zoom_max: u8, config: &TileEngineConfig) -> TileEngineReport {
	let mut total = TileEngineReport::default();
	if zoom_max == 0 {
		return total;
	}

	for z in (zoom_min..zoom_max).rev() {
		let parents = match child_parents(outpath, tile_path, z + 1) {
			Ok(parents) => parents,
			Err(err) => {
				log::error!("phase 2 failed scanning z{} children: {err:#}", z + 1);
				total.failed += 1;
				continue;
			}
		};
		for (px, py) in parents {
			match synthesize_parent_tile(outpath, tile_path, z, px, py, config) {
				Ok(outcome) => total.record(outcome),
				Err(err) => {
					log::error!("failed synthesizing overview tile z{z}/{px}/{py}: {err:#}");
					total.failed += 1;
				}
			}
		}
	}

	total
}

/// Scans `{outpath}/{tile_path}/{child_z}/` for existing tile files and returns the
/// de-duplicated set of their XYZ parents `(x/2, y/2)`.
fn child_parents(outpath: &Path, tile_path: &str, child_z: u8) -> Result<BTreeSet<(u32, u32)>> {
	let mut parents = BTreeSet::new();
	let zoom_dir = outpath.join(tile_path).join(child_z.to_string());
	if !zoom_dir.is_dir() {
		return Ok(parents);
	}

	for x_entry in std::fs::read_dir(&zoom_dir).with_context(|| format!("reading {zoom_dir:?}"))? {
		let x_entry = x_entry?;
		if !x_entry.file_type()?.is_dir() {
			continue;
		}
		let Some(x) = x_entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) else {
			continue;
		};
		for y_entry in std::fs::read_dir(x_entry.path())? {
			let y_entry = y_entry?;
			let stem = y_entry.path();
			let Some(stem) = stem.file_stem().and_then(|s| s.to_str()) else { continue };
			if stem.parse::<u32>().is_err() {
				continue;
			}
			let Some(y) = stem.parse::<u32>().ok() else { continue };
			parents.insert((x / 2, y / 2));
		}
	}

	Ok(parents)
}

fn synthesize_parent_tile(outpath: &Path, tile_path: &str, z: u8, px: u32, py: u32, config: &TileEngineConfig) -> Result<TileOutcome> {
	let file_path = tile_file_path(outpath, tile_path, config.format, z, px, py);
	if file_path.exists() {
		// Base tiles written by Phase 1 at this zoom must never be overwritten by a
		// downsampled synthesis from the zoom below.
		return Ok(TileOutcome::Existing);
	}

	let composite_size = TILE_SIZE * 2;
	let mut composite = Image::new_empty(composite_size, composite_size, 4, PixelValueType::U8);
	let mut any_child = false;

	for qy in 0..2u32 {
		for qx in 0..2u32 {
			let child_path = tile_file_path(outpath, tile_path, config.format, z + 1, 2 * px + qx, 2 * py + qy);
			let Some(child) = read_tile(&child_path, config.format)? else { continue };
			any_child = true;
			blit_quadrant(&mut composite.data, composite_size, qx as usize, qy as usize, &child);
		}
	}

	if !any_child {
		return Ok(TileOutcome::Skipped);
	}

	let composite_image: DynamicImage = composite.try_into().context("converting overview composite buffer")?;
	let downsampled = resize_with_kernel(&composite_image, TILE_SIZE as u32, TILE_SIZE as u32, config.resampling)
		.context("downsampling overview composite")?;

	let rgba = downsampled.to_rgba8();
	if rgba.pixels().all(|p| p[3] == 0) {
		return Ok(TileOutcome::Skipped);
	}

	let tile = Image::try_from(DynamicImage::ImageRgba8(rgba)).context("converting downsampled overview tile")?;
	write_tile(&file_path, tile, config).map_err(|err| err.context(PipelineErrorKind::TileWriteFailed))?;
	Ok(TileOutcome::Generated)
}

/// Reads and decodes an existing tile file, or `None` if it does not exist.
fn read_tile(path: &Path, format: TileFormat) -> Result<Option<DynamicImage>> {
	if !path.exists() {
		return Ok(None);
	}
	let bytes = std::fs::read(path).with_context(|| format!("reading tile {path:?}"))?;
	let image = decode(&Blob::new(bytes), format).with_context(|| format!("decoding tile {path:?}"))?;
	Ok(Some(image.to_rgba8().into()))
}

/// Blits a 256x256 RGBA child image into quadrant `(qx, qy)` of the `composite_size`
/// square RGBA buffer `dst`.
fn blit_quadrant(dst: &mut [u8], composite_size: usize, qx: usize, qy: usize, child: &DynamicImage) {
	let rgba = child.to_rgba8();
	let (w, h) = rgba.dimensions();
	let (w, h) = (w as usize, h as usize);
	let origin_x = qx * TILE_SIZE;
	let origin_y = qy * TILE_SIZE;
	for y in 0..h.min(TILE_SIZE) {
		for x in 0..w.min(TILE_SIZE) {
			let pixel = rgba.get_pixel(x as u32, y as u32);
			let dst_idx = ((origin_y + y) * composite_size + (origin_x + x)) * 4;
			dst[dst_idx..dst_idx + 4].copy_from_slice(&pixel.0);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chartpyramid_core::ResampleKernel;
	use image::{Rgba, RgbaImage};
	use tempfile::tempdir;

	fn config() -> TileEngineConfig {
		TileEngineConfig { format: TileFormat::Png, resampling: ResampleKernel::Bilinear, quality: None, speed: None }
	}

	fn write_opaque_child(outpath: &Path, tile_path: &str, z: u8, x: u32, y: u32) {
		let file_path = tile_file_path(outpath, tile_path, TileFormat::Png, z, x, y);
		std::fs::create_dir_all(file_path.parent().unwrap()).unwrap();
		let img = RgbaImage::from_pixel(TILE_SIZE as u32, TILE_SIZE as u32, Rgba([10, 20, 30, 255]));
		let blob = chartpyramid_image::encode(&DynamicImage::ImageRgba8(img), TileFormat::Png, None, None).unwrap();
		std::fs::write(&file_path, blob.as_bytes()).unwrap();
	}

	#[test]
	fn synthesizes_overview_from_single_child() {
		let dir = tempdir().unwrap();
		write_opaque_child(dir.path(), "t", 5, 10, 20);

		let report = run_phase2(dir.path(), "t", 0, 5, &config());
		assert_eq!(report.generated, 1);
		assert_eq!(report.failed, 0);

		let parent_path = tile_file_path(dir.path(), "t", TileFormat::Png, 4, 5, 10);
		assert!(parent_path.exists());
	}

	#[test]
	fn does_not_overwrite_existing_base_tile() {
		let dir = tempdir().unwrap();
		write_opaque_child(dir.path(), "t", 5, 10, 20);
		write_opaque_child(dir.path(), "t", 4, 5, 10);
		let parent_path = tile_file_path(dir.path(), "t", TileFormat::Png, 4, 5, 10);
		let base_mtime = std::fs::metadata(&parent_path).unwrap().modified().unwrap();

		let report = run_phase2(dir.path(), "t", 0, 5, &config());
		assert_eq!(report.existing, 1);
		assert_eq!(std::fs::metadata(&parent_path).unwrap().modified().unwrap(), base_mtime);
	}

	#[test]
	fn skips_parent_with_no_children() {
		let dir = tempdir().unwrap();
		let report = run_phase2(dir.path(), "t", 0, 5, &config());
		assert_eq!(report.generated, 0);
		assert_eq!(report.skipped, 0);
		assert_eq!(report.existing, 0);
	}
}
