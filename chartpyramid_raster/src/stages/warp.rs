//! Stage 5: latitude-normalized warp to the target EPSG (Web Mercator).
//!
//! Web Mercator's pixel scale grows as `1/cos(latitude)` away from the
//! equator; warping every chart to a single zoom-derived resolution would
//! upsample high-latitude charts by `1/cos²(φ)`. Instead the target pixel
//! size is derived from the chart's own center latitude, so each processed
//! raster keeps native resolution at its own latitude.

use crate::ffi::last_error;
use anyhow::{Context, Result, bail, ensure};
use chartpyramid_core::{PipelineErrorKind, ResampleKernel, equatorial_resolution};
use chartpyramid_derive::context;
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::{Dataset, DriverManager, GeoTransform};

fn get_spatial_ref(epsg: u32) -> Result<SpatialRef> {
	let mut srs =
		SpatialRef::from_epsg(epsg).map_err(|err| anyhow::anyhow!("failed to load EPSG:{epsg}: {err}"))?;
	srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
	Ok(srs)
}

/// Warps `src` to EPSG:3857 at a pixel size adjusted for its own center
/// latitude, using `kernel` and `threads_per_job` GDAL warp threads.
#[context("warping to latitude-normalized Web Mercator")]
pub fn warp_latitude_normalized(
	src: Dataset,
	max_lod: u8,
	kernel: ResampleKernel,
	threads_per_job: u32,
) -> Result<Dataset> {
	let gt = src.geo_transform().context("source raster has no geotransform")?;
	ensure!(gt[2] == 0.0 && gt[4] == 0.0, "source raster must not be rotated");

	let src_srs = src
		.spatial_ref()
		.context("source raster has no spatial reference")
		.map_err(|err| err.context(PipelineErrorKind::CrsTransformFailed))?;

	let (width, height) = src.raster_size();
	let center_x = gt[0] + gt[1] * (width as f64 / 2.0);
	let center_y = gt[3] + gt[5] * (height as f64 / 2.0);

	let wgs84 = get_spatial_ref(4326)?;
	let to_wgs84 = CoordTransform::new(&src_srs, &wgs84)
		.context("failed to build source-CRS -> WGS84 transform")
		.map_err(|err| err.context(PipelineErrorKind::CrsTransformFailed))?;
	let mut xs = [center_x];
	let mut ys = [center_y];
	let mut zs = [0.0];
	to_wgs84
		.transform_coords(&mut xs, &mut ys, &mut zs)
		.context("failed to transform raster center to WGS84")
		.map_err(|err| err.context(PipelineErrorKind::CrsTransformFailed))?;
	let center_lat = ys[0];

	let adjusted_resolution = equatorial_resolution(max_lod) / center_lat.to_radians().cos();
	ensure!(
		adjusted_resolution.is_finite() && adjusted_resolution > 0.0,
		"invalid latitude-adjusted resolution at center latitude {center_lat}"
	);

	let target_srs = get_spatial_ref(3857)?;
	let to_mercator = CoordTransform::new(&src_srs, &target_srs)
		.context("failed to build source-CRS -> Web Mercator transform")
		.map_err(|err| err.context(PipelineErrorKind::CrsTransformFailed))?;

	let corners_x = [gt[0], gt[0] + gt[1] * width as f64];
	let corners_y = [gt[3], gt[3] + gt[5] * height as f64];
	let mut mx = [corners_x[0], corners_x[1]];
	let mut my = [corners_y[0], corners_y[1]];
	let mut mz = [0.0, 0.0];
	to_mercator
		.transform_coords(&mut mx, &mut my, &mut mz)
		.context("failed to transform raster extent to Web Mercator")
		.map_err(|err| err.context(PipelineErrorKind::CrsTransformFailed))?;
	let min_x = mx[0].min(mx[1]);
	let max_x = mx[0].max(mx[1]);
	let min_y = my[0].min(my[1]);
	let max_y = my[0].max(my[1]);

	let dst_width = ((max_x - min_x) / adjusted_resolution).ceil().max(1.0) as usize;
	let dst_height = ((max_y - min_y) / adjusted_resolution).ceil().max(1.0) as usize;

	let band_count = 4usize;
	let driver = DriverManager::get_driver_by_name("MEM")?;
	let mut dst = driver
		.create_with_band_type::<u8, _>("", dst_width, dst_height, band_count)?;
	dst.set_spatial_ref(&target_srs)?;
	let dst_gt: GeoTransform = [min_x, adjusted_resolution, 0.0, max_y, 0.0, -adjusted_resolution];
	dst.set_geo_transform(&dst_gt)?;

	use gdal::raster::ColorInterpretation::{AlphaBand, BlueBand, GreenBand, RedBand};
	dst.rasterband(1)?.set_color_interpretation(RedBand)?;
	dst.rasterband(2)?.set_color_interpretation(GreenBand)?;
	dst.rasterband(3)?.set_color_interpretation(BlueBand)?;
	dst.rasterband(4)?.set_color_interpretation(AlphaBand)?;

	let h_src_ds = src.c_dataset();
	let h_dst_ds = dst.c_dataset();

	unsafe {
		use gdal_sys::*;

		let mut options: GDALWarpOptions = *GDALCreateWarpOptions();
		options.hSrcDS = h_src_ds;
		options.hDstDS = h_dst_ds;

		let threads = threads_per_job.max(1).to_string();
		let threads_c = std::ffi::CString::new(threads)?;
		options.papszWarpOptions =
			CSLSetNameValue(options.papszWarpOptions, c"NUM_THREADS".as_ptr(), threads_c.as_ptr());
		options.papszWarpOptions =
			CSLSetNameValue(options.papszWarpOptions, c"INIT_DEST".as_ptr(), c"0".as_ptr());

		// Map only the source's real color bands explicitly; when the source
		// has no alpha band, leave dst band 4 out of the mapped list entirely
		// so the warp operation synthesizes it as a coverage mask instead.
		let src_band_count = src.raster_count();
		let mapped_bands = src_band_count.min(band_count);
		options.nBandCount = mapped_bands as i32;
		let n = std::mem::size_of::<i32>() * mapped_bands;
		options.panSrcBands = CPLMalloc(n) as *mut i32;
		options.panDstBands = CPLMalloc(n) as *mut i32;
		for i in 0..mapped_bands {
			options.panSrcBands.add(i).write((i + 1) as i32);
			options.panDstBands.add(i).write((i + 1) as i32);
		}
		options.nSrcAlphaBand = if src_band_count >= band_count { src_band_count as i32 } else { 0 };
		options.nDstAlphaBand = band_count as i32;

		options.eResampleAlg = kernel.as_gdal_sys();
		options.dfWarpMemoryLimit = 512.0 * 1024.0 * 1024.0;

		options.pTransformerArg = GDALCreateGenImgProjTransformer2(h_src_ds, h_dst_ds, core::ptr::null_mut());
		if options.pTransformerArg.is_null() {
			bail!("failed to create warp transformer: {}", last_error());
		}
		options.pfnTransformer = Some(GDALGenImgProjTransform);

		let operation: GDALWarpOperationH = GDALCreateWarpOperation(&options);
		let rv = GDALChunkAndWarpMulti(operation, 0, 0, dst_width as i32, dst_height as i32);

		GDALDestroyWarpOperation(operation);
		GDALDestroyGenImgProjTransformer(options.pTransformerArg);

		if rv != CPLErr::CE_None {
			return Err(anyhow::anyhow!("GDALChunkAndWarpMulti failed: {}", last_error())
				.context(PipelineErrorKind::WarpFailed));
		}
	}

	Ok(dst)
}

trait AsGdalSysResampleAlg {
	fn as_gdal_sys(self) -> u32;
}

impl AsGdalSysResampleAlg for ResampleKernel {
	fn as_gdal_sys(self) -> u32 {
		use gdal_sys::GDALResampleAlg::{
			GRA_Average, GRA_Bilinear, GRA_Cubic, GRA_CubicSpline, GRA_Lanczos, GRA_Mode, GRA_NearestNeighbour,
		};
		match self {
			ResampleKernel::Nearest => GRA_NearestNeighbour,
			ResampleKernel::Bilinear => GRA_Bilinear,
			ResampleKernel::Cubic => GRA_Cubic,
			ResampleKernel::CubicSpline => GRA_CubicSpline,
			ResampleKernel::Lanczos => GRA_Lanczos,
			ResampleKernel::Average => GRA_Average,
			ResampleKernel::Mode => GRA_Mode,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use gdal::DriverManager;

	#[test]
	fn warps_equatorial_raster_to_expected_resolution() {
		let driver = DriverManager::get_driver_by_name("MEM").unwrap();
		let mut src = driver.create_with_band_type::<u8, _>("", 100, 100, 3).unwrap();
		src.set_spatial_ref(&get_spatial_ref(4326).unwrap()).unwrap();
		src.set_geo_transform(&[-1.0, 0.02, 0.0, 1.0, 0.0, -0.02]).unwrap();

		let out = warp_latitude_normalized(src, 8, ResampleKernel::Bilinear, 1).unwrap();
		let gt = out.geo_transform().unwrap();
		let expected = equatorial_resolution(8);
		assert!((gt[1] - expected).abs() / expected < 1e-6);
		assert_eq!(out.raster_count(), 4);
	}
}
