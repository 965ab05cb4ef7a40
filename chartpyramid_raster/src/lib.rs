//! Per-dataset raster processing pipeline.
//!
//! Turns one catalog [`Dataset`](chartpyramid_core::Dataset) into a reprojected,
//! overview-built GeoTIFF ready for the tile engine. The pipeline is a fixed
//! sequence of stages (see [`pipeline::process_dataset`]); parallelism is across
//! datasets, driven by [`runner::run_raster_pipeline`].

mod ffi;
pub mod pipeline;
pub mod runner;
pub mod stages;

pub use pipeline::{PixelOffset, process_dataset};
pub use runner::run_raster_pipeline;
