//! Drives one `chartpyramid build` invocation end to end: load the catalog,
//! run the raster pipeline once over every dataset the selected tilesets
//! reference, then build each tileset's manifest, zoom-VRTs, and tiles.

use crate::cli::BuildArgs;
use anyhow::{Context, Result};
use chartpyramid_core::{Catalog, Dataset as CatalogDataset, ResampleKernel, TileFormat};
use chartpyramid_raster::run_raster_pipeline;
use chartpyramid_tiler::{TileEngineConfig, run_tileset};
use std::fmt;
use std::path::Path;

/// Per-phase tallies accumulated across every selected tileset, printed at the
/// end of a run and used to decide the process exit code.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
	pub datasets_succeeded: usize,
	pub datasets_failed: usize,
	pub tiles_generated: usize,
	pub tiles_existing: usize,
	pub tiles_skipped: usize,
	pub tiles_failed: usize,
	pub failed_tilesets: usize,
}

impl RunSummary {
	/// A run is successful overall iff no tileset had a fatal error, per the
	/// exit-code rule: the raster pipeline's own per-dataset failures are
	/// tolerated and already reflected in a thinner zoom-VRT, not a fatal error.
	#[must_use]
	pub fn is_success(self) -> bool {
		self.failed_tilesets == 0
	}
}

impl fmt::Display for RunSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "datasets: {} succeeded, {} failed", self.datasets_succeeded, self.datasets_failed)?;
		writeln!(
			f,
			"tiles: {} generated, {} existing, {} skipped, {} failed",
			self.tiles_generated, self.tiles_existing, self.tiles_skipped, self.tiles_failed
		)?;
		write!(f, "tilesets: {} failed", self.failed_tilesets)
	}
}

pub fn run_build(args: &BuildArgs) -> Result<RunSummary> {
	let catalog = Catalog::from_path(&args.catalog).context("loading catalog")?;
	let selected = catalog.select_tilesets(&args.tilesets)?;
	let dataset_names = catalog.dataset_union(&selected);

	std::fs::create_dir_all(&args.tmppath).context("creating temp directory")?;
	std::fs::create_dir_all(&args.outpath).context("creating output directory")?;

	let kernel = ResampleKernel::parse(&args.resampling);
	let format: TileFormat = args.format.parse()?;
	let zip_dir: &Path = args.catalog.parent().unwrap_or_else(|| Path::new("."));

	let datasets_to_run: Vec<(String, CatalogDataset)> = dataset_names
		.iter()
		.filter_map(|name| catalog.dataset(name).ok().map(|dataset| (name.clone(), dataset.clone())))
		.collect();

	log::info!("running raster pipeline over {} dataset(s)", datasets_to_run.len());
	let queue_report =
		run_raster_pipeline(datasets_to_run, zip_dir, &args.tmppath, kernel, args.threads_per_job, args.workers);

	let mut summary = RunSummary {
		datasets_succeeded: queue_report.succeeded,
		datasets_failed: queue_report.failed,
		..RunSummary::default()
	};

	let config = TileEngineConfig { format, resampling: kernel, quality: None, speed: None };

	for (name, tileset) in &selected {
		log::info!("building tileset {name:?}");
		match run_tileset(name, tileset, &catalog.datasets, &args.tmppath, &args.outpath, args.workers, &config) {
			Ok(report) => {
				summary.tiles_generated += report.generated;
				summary.tiles_existing += report.existing;
				summary.tiles_skipped += report.skipped;
				summary.tiles_failed += report.failed;
				if !report.is_success() {
					summary.failed_tilesets += 1;
				}
			}
			Err(err) => {
				log::error!("tileset {name:?} failed: {err:#}");
				summary.failed_tilesets += 1;
			}
		}
	}

	if !args.keep_temp {
		if let Err(err) = std::fs::remove_dir_all(&args.tmppath) {
			log::warn!("failed to remove temp directory {:?}: {err}", args.tmppath);
		}
	}

	Ok(summary)
}
