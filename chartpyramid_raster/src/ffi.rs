//! Raw `gdal_sys` escape hatches for operations the high-level `gdal` crate
//! doesn't wrap: translate (window reads, palette expansion, `-projwin` clip),
//! polygon rasterization, and GCP-to-affine fitting. Mirrors the warp FFI
//! pattern used for the reprojection stage — build an options struct, call
//! the C entry point, check `CPLErr`/return codes, free what we allocated.

use anyhow::{Result, bail, ensure};
use gdal::Dataset;
use gdal::vector::Geometry;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// The last GDAL error message, or a placeholder when none was recorded.
pub(crate) fn last_error() -> String {
	unsafe {
		let msg = gdal_sys::CPLGetLastErrorMsg();
		if msg.is_null() {
			"<no GDAL error message>".to_string()
		} else {
			CStr::from_ptr(msg).to_string_lossy().into_owned()
		}
	}
}

/// Runs `GDALTranslate` with the given argv-style options against `src`,
/// producing a new in-memory dataset. Used for `-expand rgb`, `-srcwin`, and
/// `-projwin` operations that the high-level crate has no wrapper for.
pub(crate) fn translate(src: &Dataset, args: &[String]) -> Result<Dataset> {
	unsafe {
		let mut cstrings = Vec::with_capacity(args.len());
		let mut argv: *mut *mut c_char = std::ptr::null_mut();
		for arg in args {
			let cstr = CString::new(arg.as_str())?;
			argv = gdal_sys::CSLAddString(argv, cstr.as_ptr());
			cstrings.push(cstr);
		}

		let options = gdal_sys::GDALTranslateOptionsNew(argv, std::ptr::null_mut());
		gdal_sys::CSLDestroy(argv);
		ensure!(!options.is_null(), "GDALTranslateOptionsNew failed: {}", last_error());

		let dest_name = CString::new("")?;
		let mut usage_err: i32 = 0;
		let h_dst = gdal_sys::GDALTranslate(dest_name.as_ptr(), src.c_dataset(), options, &mut usage_err);
		gdal_sys::GDALTranslateOptionsFree(options);

		if h_dst.is_null() || usage_err != 0 {
			bail!("GDALTranslate failed: {}", last_error());
		}

		Ok(Dataset::from_c_dataset(h_dst))
	}
}

/// Builds an OGR polygon geometry from a mask's rings (outer boundary first,
/// holes after), in whatever coordinate space the rings are currently
/// expressed in (pixel space, relative to the dataset's current offset).
pub(crate) fn mask_polygon(rings: &[Vec<[f64; 2]>]) -> Result<Geometry> {
	ensure!(!rings.is_empty(), "mask has no rings");
	let mut polygon = Geometry::empty(gdal_sys::OGRwkbGeometryType::wkbPolygon)?;
	for ring in rings {
		let mut linear_ring = Geometry::empty(gdal_sys::OGRwkbGeometryType::wkbLinearRing)?;
		for &[x, y] in ring {
			linear_ring.add_point((x, y, 0.0));
		}
		// Closed rings: add_geometry doesn't require an explicit repeated first point,
		// but GDAL rasterizers are happier when rings are explicitly closed.
		if let Some(&[x0, y0]) = ring.first() {
			if ring.last() != Some(&[x0, y0]) {
				linear_ring.add_point((x0, y0, 0.0));
			}
		}
		polygon.add_geometry(linear_ring)?;
	}
	Ok(polygon)
}

/// Burns `geometries` into band 1 of `dst` (alpha band, value 255) using the
/// dataset's *current* geotransform to map geometry coordinates to pixels —
/// callers set that transform to identity first so pixel-space mask
/// coordinates land directly on the matching raster cells.
pub(crate) fn rasterize_alpha(dst: &Dataset, band: i32, geometries: &[Geometry]) -> Result<()> {
	unsafe {
		let mut band_list = [band];
		let mut geom_handles: Vec<_> = geometries.iter().map(Geometry::c_geometry).collect();
		let mut burn_values = vec![255.0_f64; geometries.len()];

		let result = gdal_sys::GDALRasterizeGeometries(
			dst.c_dataset(),
			1,
			band_list.as_mut_ptr(),
			geom_handles.len() as i32,
			geom_handles.as_mut_ptr(),
			None,
			std::ptr::null_mut(),
			burn_values.as_mut_ptr(),
			std::ptr::null_mut(),
			None,
			std::ptr::null_mut(),
		);

		ensure!(
			result == gdal_sys::CPLErr::CE_None,
			"GDALRasterizeGeometries failed: {}",
			last_error()
		);
	}
	Ok(())
}

/// Fits a best-fit affine geotransform from pixel/geo correspondences via
/// `GDALGCPsToGeoTransform`. Requires at least 3 non-collinear points; GDAL
/// reports collinearity itself by returning `FALSE` (mapped to the `approx`
/// failure case below).
pub(crate) fn gcps_to_geotransform(
	gcps: &[(f64, f64, f64, f64)],
	approx_ok: bool,
) -> Result<gdal::GeoTransform> {
	ensure!(gcps.len() >= 3, "need at least 3 GCPs to fit an affine, got {}", gcps.len());

	let ids: Vec<CString> = (0..gcps.len()).map(|i| CString::new(format!("gcp{i}")).unwrap()).collect();
	let infos: Vec<CString> = gcps.iter().map(|_| CString::new("").unwrap()).collect();

	let raw_gcps: Vec<gdal_sys::GDAL_GCP> = gcps
		.iter()
		.zip(ids.iter())
		.zip(infos.iter())
		.map(|(((px, py, x, y), id), info)| gdal_sys::GDAL_GCP {
			pszId: id.as_ptr() as *mut c_char,
			pszInfo: info.as_ptr() as *mut c_char,
			dfGCPPixel: *px,
			dfGCPLine: *py,
			dfGCPX: *x,
			dfGCPY: *y,
			dfGCPZ: 0.0,
		})
		.collect();

	let mut geotransform: gdal::GeoTransform = [0.0; 6];
	let ok = unsafe {
		gdal_sys::GDALGCPsToGeoTransform(
			raw_gcps.len() as i32,
			raw_gcps.as_ptr(),
			geotransform.as_mut_ptr(),
			i32::from(approx_ok),
		)
	};
	ensure!(ok != 0, "GDALGCPsToGeoTransform could not fit an affine (points may be collinear)");
	Ok(geotransform)
}
