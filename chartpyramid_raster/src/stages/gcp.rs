//! Stage 4: ground-control-point affine fit.
//!
//! Re-projects each GCP's (lon, lat) into the source CRS before fitting —
//! a least-squares affine fit directly in lon/lat space distorts badly at
//! high latitudes under conic projections — then fits a best-fit affine
//! from the CRS-adjusted, offset-adjusted correspondences.

use crate::ffi::gcps_to_geotransform;
use crate::pipeline::PixelOffset;
use anyhow::{Context, Result};
use chartpyramid_core::{Gcp, PipelineErrorKind};
use chartpyramid_derive::context;
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::{Dataset, DriverManager};

fn get_spatial_ref(epsg: u32) -> Result<SpatialRef> {
	let mut srs =
		SpatialRef::from_epsg(epsg).map_err(|err| anyhow::anyhow!("failed to load EPSG:{epsg}: {err}"))?;
	srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
	Ok(srs)
}

/// Fits and assigns a geotransform from `gcps`, whose pixel coordinates refer
/// to the *original* source image; `cumulative_offset` is subtracted from
/// each before fitting so they land on `src`'s current pixel grid.
#[context("fitting GCP-derived affine")]
pub fn fit_gcp_affine(src: Dataset, gcps: &[Gcp], cumulative_offset: PixelOffset) -> Result<Dataset> {
	if gcps.len() < 3 {
		return Err(
			anyhow::anyhow!("need at least 3 GCPs, found {}", gcps.len())
				.context(PipelineErrorKind::InsufficientGcps),
		);
	}

	let target_srs = match src.spatial_ref() {
		Some(srs) => srs,
		None => get_spatial_ref(4326)?,
	};

	let wgs84 = get_spatial_ref(4326)?;
	let transform_needed = target_srs.to_wkt().ok() != wgs84.to_wkt().ok();
	let coord_transform = transform_needed
		.then(|| CoordTransform::new(&wgs84, &target_srs))
		.transpose()
		.context("failed to build WGS84 -> source-CRS transform for GCPs")
		.map_err(|err| err.context(PipelineErrorKind::CrsTransformFailed))?;

	let mut points: Vec<(f64, f64, f64, f64)> = Vec::with_capacity(gcps.len());
	for gcp in gcps {
		let (x, y) = if let Some(transform) = &coord_transform {
			let mut xs = [gcp.lon()];
			let mut ys = [gcp.lat()];
			let mut zs = [0.0];
			transform
				.transform_coords(&mut xs, &mut ys, &mut zs)
				.context("failed to transform GCP coordinate")
				.map_err(|err| err.context(PipelineErrorKind::CrsTransformFailed))?;
			(xs[0], ys[0])
		} else {
			(gcp.lon(), gcp.lat())
		};
		points.push((
			gcp.pixel_x() - cumulative_offset.x,
			gcp.pixel_y() - cumulative_offset.y,
			x,
			y,
		));
	}

	let geotransform = gcps_to_geotransform(&points, true)
		.map_err(|err| err.context(PipelineErrorKind::InsufficientGcps))?;

	let (width, height) = src.raster_size();
	let band_count = src.raster_count();
	let driver = DriverManager::get_driver_by_name("MEM")?;
	let mut dst = driver.create_with_band_type::<u8, _>("", width, height, band_count)?;
	for band_index in 1..=band_count {
		let data = src.rasterband(band_index)?.read_as::<u8>((0, 0), (width, height), (width, height), None)?;
		let mut dst_band = dst.rasterband(band_index)?;
		dst_band.write((0, 0), (width, height), &data)?;
		dst_band.set_color_interpretation(src.rasterband(band_index)?.color_interpretation())?;
	}

	dst.set_geo_transform(&geotransform)?;
	dst.set_spatial_ref(&target_srs)?;

	Ok(dst)
}
