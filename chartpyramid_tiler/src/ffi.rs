//! Raw `gdal_sys` escape hatch for `GDALBuildVRT`, which the high-level `gdal`
//! crate doesn't wrap. Mirrors the FFI pattern used by the raster pipeline's
//! `translate`/`rasterize_alpha` helpers: build an options struct, call the C
//! entry point, check the return value, free what we allocated.

use anyhow::{Result, bail, ensure};
use gdal::Dataset;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;

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

/// Builds a VRT mosaic at `dest` referencing `sources` in order (earlier entries
/// painted first, later entries on top), via `GDALBuildVRT`. The VRT is written
/// to disk as a side effect of the call; the returned handle is closed
/// immediately since callers only need the file.
pub(crate) fn build_vrt(dest: &Path, sources: &[impl AsRef<Path>]) -> Result<()> {
	ensure!(!sources.is_empty(), "no source rasters to mosaic");

	unsafe {
		let dest_c = CString::new(dest.to_str().ok_or_else(|| anyhow::anyhow!("VRT path is not valid UTF-8"))?)?;

		let source_cstrings: Vec<CString> = sources
			.iter()
			.map(|p| {
				let p = p.as_ref();
				CString::new(p.to_str().ok_or_else(|| anyhow::anyhow!("source path {p:?} is not valid UTF-8"))?)
					.map_err(anyhow::Error::from)
			})
			.collect::<Result<_>>()?;
		let source_ptrs: Vec<*const c_char> = source_cstrings.iter().map(|c| c.as_ptr()).collect();

		let options = gdal_sys::GDALBuildVRTOptionsNew(std::ptr::null_mut(), std::ptr::null_mut());
		ensure!(!options.is_null(), "GDALBuildVRTOptionsNew failed: {}", last_error());

		let mut usage_err: i32 = 0;
		let h_dst = gdal_sys::GDALBuildVRT(
			dest_c.as_ptr(),
			source_ptrs.len() as i32,
			std::ptr::null_mut(),
			source_ptrs.as_ptr().cast_mut(),
			options,
			&mut usage_err,
		);
		gdal_sys::GDALBuildVRTOptionsFree(options);

		if h_dst.is_null() || usage_err != 0 {
			bail!("GDALBuildVRT failed: {}", last_error());
		}

		// Dropping flushes and closes the VRT dataset; the file on disk is what callers want.
		drop(Dataset::from_c_dataset(h_dst));
	}
	Ok(())
}
