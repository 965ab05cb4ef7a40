//! Resizing an arbitrary `DynamicImage` to an exact target size using one of the
//! closed-vocabulary [`ResampleKernel`] values, for the tile engine's Phase 2
//! overview synthesis (which has no raster library handle to delegate to, unlike
//! the warp stage and Phase 1's windowed reads).

use anyhow::Result;
use chartpyramid_core::ResampleKernel;
use chartpyramid_derive::context;
use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::DynamicImage;

/// Maps the closed resampling vocabulary onto `fast_image_resize`'s algorithm set.
/// `Mode` (most-common-value) has no convolution equivalent here and falls back to
/// nearest-neighbor, the closest non-interpolating behavior available.
fn resize_alg(kernel: ResampleKernel) -> ResizeAlg {
	use ResampleKernel::{Average, Bilinear, Cubic, CubicSpline, Lanczos, Mode, Nearest};
	match kernel {
		Nearest | Mode => ResizeAlg::Nearest,
		Bilinear => ResizeAlg::Convolution(FilterType::Bilinear),
		Cubic => ResizeAlg::Convolution(FilterType::CatmullRom),
		CubicSpline => ResizeAlg::Convolution(FilterType::Mitchell),
		Lanczos => ResizeAlg::Convolution(FilterType::Lanczos3),
		Average => ResizeAlg::Convolution(FilterType::Box),
	}
}

/// Resizes `src` to exactly `width_dst x height_dst` using `kernel`.
#[context("resizing {}x{} image to {}x{} with {:?}", src.width(), src.height(), width_dst, height_dst, kernel)]
pub fn resize_with_kernel(src: &DynamicImage, width_dst: u32, height_dst: u32, kernel: ResampleKernel) -> Result<DynamicImage> {
	let mut dst_image = DynamicImage::new(width_dst, height_dst, src.color());
	Resizer::new().resize(src, &mut dst_image, &ResizeOptions::default().resize_alg(resize_alg(kernel)))?;
	Ok(dst_image)
}
