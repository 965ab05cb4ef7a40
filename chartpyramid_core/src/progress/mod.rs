//! Progress indicators for long-running CLI operations (raster pipeline, tile engine).
//!
//! The module conditionally selects between a real terminal progress bar and a no-op
//! drain based on the build configuration: tests and non-CLI consumers get the drain,
//! everything else gets the bar. The `ProgressTrait` trait defines the common interface.
//!
//! # Examples
//!
//! ```rust
//! use chartpyramid_core::progress::get_progress_bar;
//!
//! let mut progress = get_progress_bar("Processing", 100);
//! progress.set_position(50);
//! progress.inc(10);
//! progress.finish();
//! ```

mod progress_bar;
mod progress_drain;
mod traits;

pub use progress_bar::ProgressBar;
pub use progress_drain::ProgressDrain;
pub use traits::ProgressTrait;

/// Factory function returning a real progress bar in normal CLI builds, or a no-op
/// drain under `cfg(test)`/the `test` feature so test output stays quiet.
#[must_use]
pub fn get_progress_bar(message: &str, max_value: u64) -> Box<dyn ProgressTrait> {
	#[cfg(any(test, feature = "test"))]
	let mut progress: Box<dyn ProgressTrait> = Box::new(ProgressDrain::new());
	#[cfg(not(any(test, feature = "test")))]
	let mut progress: Box<dyn ProgressTrait> = Box::new(ProgressBar::new());

	progress.init(message, max_value);
	progress
}
