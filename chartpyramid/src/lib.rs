//! Command-line front end for the chart-to-tile-pyramid converter.
//!
//! Parses the catalog, runs the raster pipeline once over the union of
//! datasets referenced by the selected tilesets, then builds each tileset's
//! manifest, zoom-VRTs, and tiles in turn, accumulating a [`RunSummary`].

mod cli;
mod run;

pub use cli::{BuildArgs, Cli, Commands};
pub use run::{RunSummary, run_build};
