//! The two-phase tile pyramid engine: Phase 1 renders base tiles directly
//! from the zoom-VRTs in parallel; Phase 2 synthesizes every coarser zoom by
//! compositing and downsampling the zoom below, sequentially, zoom by zoom.

mod phase1;
mod phase2;

pub use phase1::run_phase1;
pub use phase2::run_phase2;

use chartpyramid_core::{ResampleKernel, TileFormat};

/// Tile-rendering options shared by both phases.
#[derive(Debug, Clone)]
pub struct TileEngineConfig {
	pub format: TileFormat,
	pub resampling: ResampleKernel,
	pub quality: Option<u8>,
	pub speed: Option<u8>,
}

/// Outcome of producing a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TileOutcome {
	Generated,
	Existing,
	Skipped,
}

/// Aggregate counts across one phase's run, per the run summary's per-phase breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileEngineReport {
	pub generated: usize,
	pub existing: usize,
	pub skipped: usize,
	pub failed: usize,
}

impl TileEngineReport {
	#[must_use]
	pub fn is_success(self) -> bool {
		self.failed == 0
	}

	pub(crate) fn record(&mut self, outcome: TileOutcome) {
		match outcome {
			TileOutcome::Generated => self.generated += 1,
			TileOutcome::Existing => self.existing += 1,
			TileOutcome::Skipped => self.skipped += 1,
		}
	}

	pub fn merge(&mut self, other: TileEngineReport) {
		self.generated += other.generated;
		self.existing += other.existing;
		self.skipped += other.skipped;
		self.failed += other.failed;
	}
}

const TILE_SIZE: usize = 256;

fn tile_file_path(outpath: &std::path::Path, tile_path: &str, format: TileFormat, z: u8, x: u32, y: u32) -> std::path::PathBuf {
	outpath.join(tile_path).join(z.to_string()).join(x.to_string()).join(format!("{y}.{}", format.extension()))
}
