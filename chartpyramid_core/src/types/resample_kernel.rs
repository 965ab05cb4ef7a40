//! Resampling kernel selection, shared by the warp stage and the tile engine.

use gdal::raster::ResampleAlg;

/// The closed vocabulary of resampling kernels accepted on the command line and in
/// the catalog. Unrecognized names fall back to [`ResampleKernel::Bilinear`] rather
/// than erroring, matching the donor tool's permissive kernel-name parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleKernel {
	Nearest,
	#[default]
	Bilinear,
	Cubic,
	CubicSpline,
	Lanczos,
	Average,
	Mode,
}

impl ResampleKernel {
	/// Parses a kernel name. Any name not in the closed vocabulary yields `Bilinear`.
	#[must_use]
	pub fn parse(name: &str) -> ResampleKernel {
		use ResampleKernel::{Average, Bilinear, Cubic, CubicSpline, Lanczos, Mode, Nearest};
		match name.to_ascii_lowercase().as_str() {
			"nearest" => Nearest,
			"bilinear" => Bilinear,
			"cubic" => Cubic,
			"cubicspline" => CubicSpline,
			"lanczos" => Lanczos,
			"average" => Average,
			"mode" => Mode,
			_ => Bilinear,
		}
	}

	/// Converts to the corresponding [`gdal::raster::ResampleAlg`] value used by
	/// both `Dataset::read_as` window reads and `GDALAutoCreateWarpedVRT`/warp options.
	#[must_use]
	pub fn as_gdal(self) -> ResampleAlg {
		use ResampleKernel::{Average, Bilinear, Cubic, CubicSpline, Lanczos, Mode, Nearest};
		match self {
			Nearest => ResampleAlg::NearestNeighbour,
			Bilinear => ResampleAlg::Bilinear,
			Cubic => ResampleAlg::Cubic,
			CubicSpline => ResampleAlg::CubicSpline,
			Lanczos => ResampleAlg::Lanczos,
			Average => ResampleAlg::Average,
			Mode => ResampleAlg::Mode,
		}
	}
}
