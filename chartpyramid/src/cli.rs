//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "chartpyramid", about = "Converts aeronautical raster charts into XYZ web-map tile pyramids.")]
pub struct Cli {
	#[command(subcommand)]
	pub command: Commands,

	#[command(flatten)]
	pub verbose: Verbosity<ErrorLevel>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
	/// Processes every referenced dataset and renders the requested tilesets.
	Build(BuildArgs),
}

#[derive(Debug, Parser)]
pub struct BuildArgs {
	/// Path to the JSON catalog file.
	pub catalog: PathBuf,

	/// Tileset name to build. Repeatable; omit to build every tileset in the catalog.
	#[arg(long = "tileset")]
	pub tilesets: Vec<String>,

	/// Directory the output tile tree is written under.
	#[arg(long)]
	pub outpath: PathBuf,

	/// Directory processed rasters and zoom-VRTs are written to.
	#[arg(long)]
	pub tmppath: PathBuf,

	/// Maximum concurrent raster-pipeline jobs and tile-engine workers.
	#[arg(long, default_value_t = num_cpus::get())]
	pub workers: usize,

	/// GDAL-internal worker threads used for each dataset's warp stage.
	#[arg(long = "threads-per-job", default_value_t = 1)]
	pub threads_per_job: u32,

	/// Output tile image format.
	#[arg(long, default_value = "png")]
	pub format: String,

	/// Resampling kernel used by both the warp stage and the tile engine.
	#[arg(long, default_value = "bilinear")]
	pub resampling: String,

	/// Keep processed rasters and zoom-VRTs in `tmppath` instead of deleting them on completion.
	#[arg(long)]
	pub keep_temp: bool,
}
