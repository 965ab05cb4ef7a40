//! Stage 1: open a chart raster from inside its ZIP archive.

use anyhow::{Context, Result};
use chartpyramid_core::{Dataset as CatalogDataset, PipelineErrorKind};
use chartpyramid_derive::context;
use gdal::Dataset;
use std::path::Path;

/// Opens `dataset`'s source raster at `/vsizip/{zip_dir}/{zip_file}.zip/{input_file}`.
#[context("opening archive member for dataset at {zip_dir:?}")]
pub fn open_from_archive(zip_dir: &Path, dataset: &CatalogDataset) -> Result<Dataset> {
	let path = dataset.vsizip_path(zip_dir);
	log::debug!("opening source raster {path}");

	let ds = Dataset::open(&path)
		.with_context(|| format!("source raster not found at {path}"))
		.map_err(|err| err.context(PipelineErrorKind::SourceNotFound))?;

	log::trace!(
		"opened {path} ({}x{}, bands={})",
		ds.raster_size().0,
		ds.raster_size().1,
		ds.raster_count()
	);
	Ok(ds)
}
