//! Wires the seven-stage pipeline into the generic job queue, one job per
//! dataset, sorted by work estimate descending so large charts start first.

use crate::pipeline::{process_dataset, work_estimate};
use anyhow::Result;
use chartpyramid_core::job_queue::{JobQueueReport, run_job_queue};
use chartpyramid_core::{Dataset as CatalogDataset, ResampleKernel};
use std::path::{Path, PathBuf};
use std::sync::Arc;

struct RunnerData {
	jobs: Vec<(String, CatalogDataset)>,
	zip_dir: PathBuf,
	tmppath: PathBuf,
	kernel: ResampleKernel,
	threads_per_job: u32,
}

/// Runs the raster pipeline over every `(name, dataset)` pair in `datasets`,
/// across up to `max_workers` concurrent jobs, sorted so the largest (by
/// mask-bbox work estimate) dataset starts first.
pub fn run_raster_pipeline(
	datasets: Vec<(String, CatalogDataset)>,
	zip_dir: &Path,
	tmppath: &Path,
	kernel: ResampleKernel,
	threads_per_job: u32,
	max_workers: usize,
) -> JobQueueReport {
	let mut jobs = datasets;
	jobs.sort_by(|(_, a), (_, b)| work_estimate(b).total_cmp(&work_estimate(a)));

	let job_count = jobs.len();
	let data = Arc::new(RunnerData {
		jobs,
		zip_dir: zip_dir.to_path_buf(),
		tmppath: tmppath.to_path_buf(),
		kernel,
		threads_per_job,
	});

	let init = Arc::new(|worker_id: usize, _: &RunnerData| -> Result<()> {
		log::debug!("raster worker {worker_id} starting");
		Ok(())
	});

	let job = Arc::new(|index: usize, data: &RunnerData| -> Result<()> {
		let (name, dataset) = &data.jobs[index];
		process_dataset(name, dataset, &data.zip_dir, &data.tmppath, data.kernel, data.threads_per_job)
			.map(|_| ())
	});

	run_job_queue(job_count, max_workers, data, init, job)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chartpyramid_core::Mask;

	#[test]
	fn sorts_largest_work_estimate_first() {
		let small = CatalogDataset {
			zip_file: "small".into(),
			input_file: None,
			mask: Some(Mask(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]])),
			geobound: None,
			gcps: None,
			max_lod: 5,
		};
		let large = CatalogDataset {
			zip_file: "large".into(),
			input_file: None,
			mask: Some(Mask(vec![vec![[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0]]])),
			geobound: None,
			gcps: None,
			max_lod: 5,
		};
		let mut jobs = vec![("small".to_string(), small), ("large".to_string(), large)];
		jobs.sort_by(|(_, a), (_, b)| {
			crate::pipeline::work_estimate(b).partial_cmp(&crate::pipeline::work_estimate(a)).unwrap()
		});
		assert_eq!(jobs[0].0, "large");
	}
}
