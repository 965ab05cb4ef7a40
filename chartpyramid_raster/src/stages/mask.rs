//! Stage 3: mask rasterization.
//!
//! Windows the current raster down to the mask's outer-ring bounding box,
//! ensures an RGBA band layout (adding a zeroed alpha band if the source
//! lacked one), and burns 255 into the alpha band wherever the polygon
//! (outer ring minus holes) covers a pixel.

use crate::ffi::{mask_polygon, rasterize_alpha, translate};
use crate::pipeline::PixelOffset;
use anyhow::Result;
use chartpyramid_core::{Mask, PipelineErrorKind};
use chartpyramid_derive::context;
use gdal::raster::ColorInterpretation;
use gdal::{Dataset, DriverManager};

/// Rasterizes `mask` against `src`, returning the windowed RGBA dataset and
/// the cumulative pixel offset of the window's origin in the original
/// source image's coordinate space.
#[context("rasterizing mask")]
pub fn rasterize_mask(
	src: Dataset,
	mask: &Mask,
	window_offset: PixelOffset,
) -> Result<(Dataset, PixelOffset)> {
	let outer = mask.outer_ring().map_err(|err| err.context(PipelineErrorKind::MaskInvalid))?;
	let shifted: Vec<[f64; 2]> =
		outer.iter().map(|&[x, y]| [x - window_offset.x, y - window_offset.y]).collect();

	let (width, height) = src.raster_size();
	let (min_x, min_y, max_x, max_y) = ring_bbox(&shifted);
	let x0 = min_x.floor().max(0.0) as i64;
	let y0 = min_y.floor().max(0.0) as i64;
	let x1 = max_x.ceil().min(width as f64) as i64;
	let y1 = max_y.ceil().min(height as f64) as i64;
	if x1 <= x0 || y1 <= y0 {
		return Err(anyhow::anyhow!("mask outer ring has zero area within source bounds")
			.context(PipelineErrorKind::MaskInvalid));
	}
	let win_w = (x1 - x0) as usize;
	let win_h = (y1 - y0) as usize;

	log::trace!("windowing mask to srcwin ({x0},{y0},{win_w},{win_h})");
	let windowed = translate(
		&src,
		&[
			"-of".to_string(),
			"MEM".to_string(),
			"-srcwin".to_string(),
			x0.to_string(),
			y0.to_string(),
			win_w.to_string(),
			win_h.to_string(),
		],
	)
	.map_err(|err| err.context(PipelineErrorKind::MaskInvalid))?;

	let mut rgba = ensure_rgba(windowed)?;

	let original_gt = rgba.geo_transform()?;
	rgba.set_geo_transform(&[0.0, 1.0, 0.0, 0.0, 0.0, 1.0])?;

	let mut rings = Vec::with_capacity(1 + mask.holes().len());
	rings.push(outer.to_vec());
	rings.extend(mask.holes().iter().cloned());
	let rings: Vec<Vec<[f64; 2]>> = rings
		.into_iter()
		.map(|ring| {
			ring
				.iter()
				.map(|&[x, y]| [x - window_offset.x - x0 as f64, y - window_offset.y - y0 as f64])
				.collect()
		})
		.collect();

	let polygon = mask_polygon(&rings).map_err(|err| err.context(PipelineErrorKind::MaskInvalid))?;
	rasterize_alpha(&rgba, rgba.raster_count(), &[polygon])
		.map_err(|err| err.context(PipelineErrorKind::MaskInvalid))?;

	rgba.set_geo_transform(&original_gt)?;

	let cumulative = PixelOffset { x: window_offset.x + x0 as f64, y: window_offset.y + y0 as f64 };
	Ok((rgba, cumulative))
}

fn ring_bbox(ring: &[[f64; 2]]) -> (f64, f64, f64, f64) {
	let mut min_x = f64::INFINITY;
	let mut min_y = f64::INFINITY;
	let mut max_x = f64::NEG_INFINITY;
	let mut max_y = f64::NEG_INFINITY;
	for &[x, y] in ring {
		min_x = min_x.min(x);
		min_y = min_y.min(y);
		max_x = max_x.max(x);
		max_y = max_y.max(y);
	}
	(min_x, min_y, max_x, max_y)
}

/// Returns `src` unchanged if it already has 4 bands, otherwise copies its
/// existing bands into a fresh RGBA MEM dataset with a zeroed alpha band.
fn ensure_rgba(src: Dataset) -> Result<Dataset> {
	if src.raster_count() == 4 {
		// Still zero the alpha band: it must start fully transparent so only
		// pixels the polygon burns into become visible.
		let mut band = src.rasterband(4)?;
		let (w, h) = src.raster_size();
		band.write((0, 0), (w, h), &gdal::raster::Buffer::new((w, h), vec![0u8; w * h]))?;
		return Ok(src);
	}

	let (width, height) = src.raster_size();
	let band_count = src.raster_count();
	let driver = DriverManager::get_driver_by_name("MEM")?;
	let mut dst = driver.create_with_band_type::<u8, _>("", width, height, 4)?;
	dst.set_geo_transform(&src.geo_transform()?)?;
	if let Some(srs) = src.spatial_ref() {
		dst.set_spatial_ref(&srs)?;
	}

	let interps = [
		ColorInterpretation::RedBand,
		ColorInterpretation::GreenBand,
		ColorInterpretation::BlueBand,
		ColorInterpretation::AlphaBand,
	];
	for band_index in 1..=band_count.min(3) {
		let src_band = src.rasterband(band_index)?;
		let data = src_band.read_as::<u8>((0, 0), (width, height), (width, height), None)?;
		let mut dst_band = dst.rasterband(band_index)?;
		dst_band.write((0, 0), (width, height), &data)?;
		dst_band.set_color_interpretation(interps[band_index - 1])?;
	}
	dst.rasterband(4)?.set_color_interpretation(ColorInterpretation::AlphaBand)?;

	Ok(dst)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn mem_dataset(w: usize, h: usize, bands: usize) -> Dataset {
		let driver = DriverManager::get_driver_by_name("MEM").unwrap();
		driver.create_with_band_type::<u8, _>("", w, h, bands).unwrap()
	}

	#[test]
	fn windows_to_outer_ring_bbox_and_tracks_offset() {
		let ds = mem_dataset(100, 100, 3);
		let mask = Mask(vec![vec![[10.0, 20.0], [60.0, 20.0], [60.0, 70.0], [10.0, 70.0]]]);
		let (out, offset) = rasterize_mask(ds, &mask, PixelOffset::default()).unwrap();
		assert_eq!(out.raster_size(), (50, 50));
		assert_eq!(out.raster_count(), 4);
		assert_eq!(offset, PixelOffset { x: 10.0, y: 20.0 });
	}

	#[test]
	fn zero_area_outer_ring_is_mask_invalid() {
		let ds = mem_dataset(100, 100, 3);
		let mask = Mask(vec![vec![[10.0, 20.0], [10.0, 20.0], [10.0, 20.0]]]);
		let err = rasterize_mask(ds, &mask, PixelOffset::default()).unwrap_err();
		assert!(
			err
				.chain()
				.any(|e| e.downcast_ref::<PipelineErrorKind>() == Some(&PipelineErrorKind::MaskInvalid))
		);
	}

	#[test]
	fn accounts_for_existing_cumulative_offset() {
		let ds = mem_dataset(40, 40, 3);
		let mask = Mask(vec![vec![[110.0, 120.0], [130.0, 120.0], [130.0, 140.0], [110.0, 140.0]]]);
		let (out, offset) = rasterize_mask(ds, &mask, PixelOffset { x: 100.0, y: 100.0 }).unwrap();
		assert_eq!(out.raster_size(), (20, 20));
		assert_eq!(offset, PixelOffset { x: 110.0, y: 120.0 });
	}
}
