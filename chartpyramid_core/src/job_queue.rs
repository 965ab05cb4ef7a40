//! A generic, thread-backed parallel job executor.
//!
//! Configured with a job count `N`, a worker cap `W`, and two callbacks — a per-worker
//! initializer and a per-job function — this dispatches opaque job indices `0..N` across
//! up to `W` OS threads and collects `(succeeded, failed)` totals. Both the raster
//! pipeline (one job per dataset) and the tile engine's Phase 1 (one "job" per claimed
//! tile index, via its own atomic counter rather than this dispatcher) build on the same
//! shape described here; this module provides the dataset-pipeline flavor, where the
//! parent actively dispatches the next pending index to whichever worker just freed up.
//!
//! Workers communicate with the parent over two `std::sync::mpsc` channels: one carrying
//! job indices down to each worker (a negative index is the shutdown sentinel), one
//! carrying `(worker_id, success)` completions back up. This stands in for the
//! process-plus-pipe model described in the design notes: OS threads are cheap here and
//! the raster library's handles are never shared across threads, so per-thread state
//! gives the same isolation a separate address space would.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Poll interval used to notice a worker thread that died without sending a completion
/// (e.g. a job panicked). Short enough to keep dead-worker detection responsive without
/// meaningfully increasing CPU use between genuine completions.
const DEAD_WORKER_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Outcome of a job queue run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobQueueReport {
	pub succeeded: usize,
	pub failed: usize,
}

impl JobQueueReport {
	/// A run is successful overall iff no job failed.
	#[must_use]
	pub fn is_success(self) -> bool {
		self.failed == 0
	}
}

/// Runs `job_count` jobs across up to `max_workers` threads.
///
/// `init` runs once per worker before its first job (library registration, CRS policy).
/// `job` runs once per job index and returns `Ok(())` on success. Both receive a shared
/// `&D` reference to `data`, which is read-only for the duration of the run.
///
/// Jobs whose worker thread dies (job panic, channel failure) before reporting back are
/// counted as failed; if every worker dies, the run returns early with any remaining
/// unattempted jobs excluded from both totals.
pub fn run_job_queue<D>(
	job_count: usize,
	max_workers: usize,
	data: Arc<D>,
	init: Arc<dyn Fn(usize, &D) -> anyhow::Result<()> + Send + Sync>,
	job: Arc<dyn Fn(usize, &D) -> anyhow::Result<()> + Send + Sync>,
) -> JobQueueReport
where
	D: Send + Sync + 'static,
{
	if job_count == 0 {
		return JobQueueReport::default();
	}
	let worker_count = max_workers.max(1).min(job_count);

	let (completion_tx, completion_rx) = mpsc::channel::<(usize, bool)>();
	let mut job_txs: Vec<mpsc::Sender<i64>> = Vec::with_capacity(worker_count);
	let mut handles = Vec::with_capacity(worker_count);

	for worker_id in 0..worker_count {
		let (job_tx, job_rx) = mpsc::channel::<i64>();
		job_txs.push(job_tx);
		let completion_tx = completion_tx.clone();
		let data = data.clone();
		let init = init.clone();
		let job = job.clone();
		handles.push(thread::spawn(move || {
			if let Err(err) = init(worker_id, &data) {
				log::error!("worker {worker_id} failed to initialize: {err:#}");
				return;
			}
			while let Ok(index) = job_rx.recv() {
				if index < 0 {
					break;
				}
				let index = index as usize;
				log::trace!("worker {worker_id} starting job {index}");
				let result = job(index, &data);
				if let Err(err) = &result {
					log::error!("job {index} failed: {err:#}");
				}
				if completion_tx.send((worker_id, result.is_ok())).is_err() {
					break;
				}
			}
		}));
	}
	drop(completion_tx);

	let mut next_job = worker_count.min(job_count);
	let mut in_flight: HashMap<usize, usize> = HashMap::with_capacity(worker_count);
	for worker_id in 0..next_job {
		in_flight.insert(worker_id, worker_id);
		let _ = job_txs[worker_id].send(worker_id as i64);
	}

	let mut report = JobQueueReport::default();
	let mut completed = 0usize;
	let mut dead_workers: HashSet<usize> = HashSet::new();

	while completed < job_count {
		match completion_rx.recv_timeout(DEAD_WORKER_POLL_INTERVAL) {
			Ok((worker_id, success)) => {
				in_flight.remove(&worker_id);
				completed += 1;
				if success {
					report.succeeded += 1;
				} else {
					report.failed += 1;
				}
				if next_job < job_count {
					let index = next_job;
					next_job += 1;
					in_flight.insert(worker_id, index);
					if job_txs[worker_id].send(index as i64).is_err() {
						dead_workers.insert(worker_id);
					}
				} else {
					let _ = job_txs[worker_id].send(-1);
				}
			}
			Err(RecvTimeoutError::Disconnected) => break,
			Err(RecvTimeoutError::Timeout) => {
				for (worker_id, handle) in handles.iter().enumerate() {
					if handle.is_finished() && dead_workers.insert(worker_id) && let Some(_index) = in_flight.remove(&worker_id) {
						log::warn!("worker {worker_id} died with a job in flight");
						completed += 1;
						report.failed += 1;
					}
				}
				if dead_workers.len() == worker_count {
					break;
				}
			}
		}
	}

	for handle in handles {
		let _ = handle.join();
	}

	report
}
