//! Stage 2: palette expansion fused with source windowing.
//!
//! Only runs when band 1 carries a palette; everything else is a no-op. The
//! window (when a mask is present) and the `-expand rgb` recoloring are
//! issued as a single `GDALTranslate` call so the library only reads the
//! source once.

use crate::ffi::translate;
use crate::pipeline::PixelOffset;
use anyhow::Result;
use chartpyramid_core::{Mask, PipelineErrorKind};
use chartpyramid_derive::context;
use gdal::Dataset;
use gdal::raster::ColorInterpretation;

/// Expands an indexed-palette band 1 to RGB, windowed to `mask`'s bounding box
/// when present. Returns the (possibly unchanged) dataset and the pixel
/// offset of its window origin relative to the original source image.
#[context("expanding palette and windowing source raster")]
pub fn expand_and_window(src: Dataset, mask: Option<&Mask>) -> Result<(Dataset, PixelOffset)> {
	let has_palette = src.rasterband(1)?.color_interpretation() == ColorInterpretation::PaletteIndex;
	if !has_palette {
		log::trace!("band 1 has no palette; expand/window stage is a no-op");
		return Ok((src, PixelOffset::default()));
	}

	let mut args = vec!["-of".to_string(), "MEM".to_string(), "-expand".to_string(), "rgb".to_string()];
	let mut offset = PixelOffset::default();

	if let Some(mask) = mask {
		let (min_x, min_y, max_x, max_y) =
			mask.outer_bbox().map_err(|err| err.context(PipelineErrorKind::MaskInvalid))?;
		let (width, height) = src.raster_size();
		let x0 = min_x.floor().max(0.0) as i64;
		let y0 = min_y.floor().max(0.0) as i64;
		let x1 = max_x.ceil().min(width as f64) as i64;
		let y1 = max_y.ceil().min(height as f64) as i64;
		let win_w = (x1 - x0).max(1);
		let win_h = (y1 - y0).max(1);

		log::trace!("windowing source to srcwin ({x0},{y0},{win_w},{win_h})");
		args.extend([
			"-srcwin".to_string(),
			x0.to_string(),
			y0.to_string(),
			win_w.to_string(),
			win_h.to_string(),
		]);
		offset = PixelOffset { x: x0 as f64, y: y0 as f64 };
	}

	let dst = translate(&src, &args).map_err(|err| err.context(PipelineErrorKind::PaletteExpandFailed))?;
	Ok((dst, offset))
}

#[cfg(test)]
mod tests {
	use super::*;
	use gdal::DriverManager;
	use gdal::raster::ColorInterpretation;

	fn mem_dataset(w: usize, h: usize) -> Dataset {
		let driver = DriverManager::get_driver_by_name("MEM").unwrap();
		driver.create_with_band_type::<u8, _>("", w, h, 1).unwrap()
	}

	#[test]
	fn non_palette_source_is_unchanged() {
		let ds = mem_dataset(10, 10);
		let (out, offset) = expand_and_window(ds, None).unwrap();
		assert_eq!(out.raster_size(), (10, 10));
		assert_eq!(offset, PixelOffset::default());
	}

	#[test]
	fn palette_without_mask_expands_without_window() {
		let ds = mem_dataset(10, 10);
		ds.rasterband(1).unwrap().set_color_interpretation(ColorInterpretation::PaletteIndex).unwrap();
		let (out, offset) = expand_and_window(ds, None).unwrap();
		assert_eq!(out.raster_size(), (10, 10));
		assert_eq!(out.raster_count(), 3);
		assert_eq!(offset, PixelOffset::default());
	}

	#[test]
	fn palette_with_mask_windows_to_outer_bbox() {
		let ds = mem_dataset(100, 100);
		ds.rasterband(1).unwrap().set_color_interpretation(ColorInterpretation::PaletteIndex).unwrap();
		let mask = Mask(vec![vec![[10.0, 20.0], [60.0, 20.0], [60.0, 70.0], [10.0, 70.0]]]);
		let (out, offset) = expand_and_window(ds, Some(&mask)).unwrap();
		assert_eq!(out.raster_size(), (50, 50));
		assert_eq!(offset, PixelOffset { x: 10.0, y: 20.0 });
	}
}
