//! Stable failure-kind taxonomy for the raster pipeline and tile engine.
//!
//! Every stage that can fail reports one of these kinds via [`anyhow::Error::context`],
//! so tests (and eventually operators) can match on *which* stage failed without
//! parsing the full error chain.

use std::fmt;

/// The abstract failure kinds a dataset or tileset run can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
	SourceNotFound,
	PaletteExpandFailed,
	MaskInvalid,
	InsufficientGcps,
	CrsTransformFailed,
	WarpFailed,
	ClipFailed,
	SaveFailed,
	OverviewBuildFailed,
	VrtBuildFailed,
	ManifestReadFailed,
	TileWriteFailed,
	WorkerDied,
}

impl PipelineErrorKind {
	/// The stable, kebab-case name used in `Display` output and test assertions.
	#[must_use]
	pub fn as_str(self) -> &'static str {
		use PipelineErrorKind::{
			ClipFailed, CrsTransformFailed, InsufficientGcps, ManifestReadFailed, MaskInvalid,
			OverviewBuildFailed, PaletteExpandFailed, SaveFailed, SourceNotFound, TileWriteFailed,
			VrtBuildFailed, WarpFailed, WorkerDied,
		};
		match self {
			SourceNotFound => "source-not-found",
			PaletteExpandFailed => "palette-expand-failed",
			MaskInvalid => "mask-invalid",
			InsufficientGcps => "insufficient-gcps",
			CrsTransformFailed => "crs-transform-failed",
			WarpFailed => "warp-failed",
			ClipFailed => "clip-failed",
			SaveFailed => "save-failed",
			OverviewBuildFailed => "overview-build-failed",
			VrtBuildFailed => "vrt-build-failed",
			ManifestReadFailed => "manifest-read-failed",
			TileWriteFailed => "tile-write-failed",
			WorkerDied => "worker-died",
		}
	}
}

impl fmt::Display for PipelineErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::error::Error for PipelineErrorKind {}
