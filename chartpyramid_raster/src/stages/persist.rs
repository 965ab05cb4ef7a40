//! Stage 7: persist the processed raster as a tiled, overview-built GeoTIFF.

use crate::ffi::last_error;
use anyhow::{Context, Result, ensure};
use chartpyramid_core::PipelineErrorKind;
use chartpyramid_derive::context;
use gdal::raster::RasterCreationOptions;
use gdal::{Dataset, DriverManager};
use std::path::Path;

/// Overview decimation factors embedded in every processed raster. Matches
/// the factors the tile engine relies on for fast low-zoom reads.
const OVERVIEW_FACTORS: [i32; 6] = [2, 4, 8, 16, 32, 64];

/// Writes `src` to `out_path` as an LZW-compressed, tiled GeoTIFF (BIGTIFF
/// enabled when GDAL judges it safe), then builds in-file overviews.
#[context("persisting processed raster to {out_path:?}")]
pub fn persist_with_overviews(src: &Dataset, out_path: &Path) -> Result<()> {
	let (width, height) = src.raster_size();
	let band_count = src.raster_count();

	let driver = DriverManager::get_driver_by_name("GTiff").context("GTiff driver not available")?;
	let options = RasterCreationOptions::from_iter([
		"TILED=YES",
		"BLOCKXSIZE=256",
		"BLOCKYSIZE=256",
		"COMPRESS=LZW",
		"BIGTIFF=IF_SAFER",
	]);

	let path_str = out_path.to_str().context("output path is not valid UTF-8")?;
	let dst = driver
		.create_with_band_type_with_options::<u8, _>(path_str, width, height, band_count, &options)
		.map_err(|err| anyhow::Error::from(err).context(PipelineErrorKind::SaveFailed))?;

	(|| -> Result<()> {
		dst.set_geo_transform(&src.geo_transform().context("source raster has no geotransform")?)?;
		if let Some(srs) = src.spatial_ref() {
			dst.set_spatial_ref(&srs)?;
		}

		for band_index in 1..=band_count {
			let src_band = src.rasterband(band_index)?;
			let data = src_band.read_as::<u8>((0, 0), (width, height), (width, height), None)?;
			let mut dst_band = dst.rasterband(band_index)?;
			dst_band.write((0, 0), (width, height), &data)?;
			dst_band.set_color_interpretation(src_band.color_interpretation())?;
		}

		dst.flush_cache()?;
		Ok(())
	})()
	.map_err(|err| err.context(PipelineErrorKind::SaveFailed))?;

	build_overviews(&dst).map_err(|err| err.context(PipelineErrorKind::OverviewBuildFailed))?;
	dst.flush_cache().map_err(|err| anyhow::Error::from(err).context(PipelineErrorKind::SaveFailed))?;

	Ok(())
}

fn build_overviews(dst: &Dataset) -> Result<()> {
	unsafe {
		let resampling = std::ffi::CString::new("AVERAGE")?;
		let rv = gdal_sys::GDALBuildOverviews(
			dst.c_dataset(),
			resampling.as_ptr(),
			OVERVIEW_FACTORS.len() as i32,
			OVERVIEW_FACTORS.as_ptr(),
			0,
			std::ptr::null(),
			None,
			std::ptr::null_mut(),
		);
		ensure!(rv == gdal_sys::CPLErr::CE_None, "GDALBuildOverviews failed: {}", last_error());
	}
	Ok(())
}
