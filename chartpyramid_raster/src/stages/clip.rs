//! Stage 6: optional geographic clip.
//!
//! Each non-null side of `geobound` is transformed into the target CRS using
//! a "dummy" coordinate equal to the source dataset's own center (projected
//! back to WGS84) for the other axis — this keeps tall or skewed projections
//! clipping on the correct side instead of degenerating at the poles.

use crate::ffi::translate;
use anyhow::{Context, Result};
use chartpyramid_core::{GeoBound, PipelineErrorKind};
use chartpyramid_derive::context;
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::Dataset;

fn get_spatial_ref(epsg: u32) -> Result<SpatialRef> {
	let mut srs =
		SpatialRef::from_epsg(epsg).map_err(|err| anyhow::anyhow!("failed to load EPSG:{epsg}: {err}"))?;
	srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
	Ok(srs)
}

/// Clips `src` to `geobound`'s non-null sides, intersected with its current
/// extent. A no-op if no side tightens the extent.
#[context("clipping to geographic bound")]
pub fn clip_to_geobound(src: Dataset, geobound: &GeoBound) -> Result<Dataset> {
	if !geobound.is_any_set() {
		return Ok(src);
	}

	let gt = src.geo_transform().context("source raster has no geotransform")?;
	let (width, height) = src.raster_size();
	let src_srs = src
		.spatial_ref()
		.context("source raster has no spatial reference")
		.map_err(|err| err.context(PipelineErrorKind::CrsTransformFailed))?;

	let cur_min_x = gt[0];
	let cur_max_x = gt[0] + gt[1] * width as f64;
	let cur_min_y = gt[3] + gt[5] * height as f64;
	let cur_max_y = gt[3];

	let center_x = (cur_min_x + cur_max_x) / 2.0;
	let center_y = (cur_min_y + cur_max_y) / 2.0;

	let wgs84 = get_spatial_ref(4326)?;
	let to_wgs84 = CoordTransform::new(&src_srs, &wgs84)
		.context("failed to build source-CRS -> WGS84 transform")
		.map_err(|err| err.context(PipelineErrorKind::CrsTransformFailed))?;
	let mut cx = [center_x];
	let mut cy = [center_y];
	let mut cz = [0.0];
	to_wgs84
		.transform_coords(&mut cx, &mut cy, &mut cz)
		.context("failed to transform dataset center to WGS84")
		.map_err(|err| err.context(PipelineErrorKind::CrsTransformFailed))?;
	let (dummy_lon, dummy_lat) = (cx[0], cy[0]);

	let to_target = CoordTransform::new(&wgs84, &src_srs)
		.context("failed to build WGS84 -> source-CRS transform")
		.map_err(|err| err.context(PipelineErrorKind::CrsTransformFailed))?;

	let project = |lon: f64, lat: f64| -> Result<(f64, f64)> {
		let mut xs = [lon];
		let mut ys = [lat];
		let mut zs = [0.0];
		to_target
			.transform_coords(&mut xs, &mut ys, &mut zs)
			.context("failed to transform geobound side to source CRS")
			.map_err(|err| err.context(PipelineErrorKind::CrsTransformFailed))?;
		Ok((xs[0], ys[0]))
	};

	let mut min_x = cur_min_x;
	let mut max_x = cur_max_x;
	let mut min_y = cur_min_y;
	let mut max_y = cur_max_y;
	let mut tightened = false;

	if let Some(lon_min) = geobound.lon_min() {
		let (x, _) = project(lon_min, dummy_lat)?;
		if x > min_x {
			min_x = x;
			tightened = true;
		}
	}
	if let Some(lon_max) = geobound.lon_max() {
		let (x, _) = project(lon_max, dummy_lat)?;
		if x < max_x {
			max_x = x;
			tightened = true;
		}
	}
	if let Some(lat_min) = geobound.lat_min() {
		let (_, y) = project(dummy_lon, lat_min)?;
		if y > min_y {
			min_y = y;
			tightened = true;
		}
	}
	if let Some(lat_max) = geobound.lat_max() {
		let (_, y) = project(dummy_lon, lat_max)?;
		if y < max_y {
			max_y = y;
			tightened = true;
		}
	}

	if !tightened {
		return Ok(src);
	}
	if min_x >= max_x || min_y >= max_y {
		return Err(anyhow::anyhow!("geobound clip leaves an empty extent")
			.context(PipelineErrorKind::ClipFailed));
	}

	translate(
		&src,
		&[
			"-of".to_string(),
			"MEM".to_string(),
			"-projwin".to_string(),
			min_x.to_string(),
			max_y.to_string(),
			max_x.to_string(),
			min_y.to_string(),
		],
	)
	.map_err(|err| err.context(PipelineErrorKind::ClipFailed))
}
