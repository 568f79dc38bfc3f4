//! Fan-out of independent, side-effect-free jobs over a fixed worker pool.

use rayon::prelude::*;
use tracing::debug;

use crate::error::{MapError, Result};

/// Number of workers: the machine's available parallelism, at least one.
pub fn worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Run every job on a pool sized to the hardware and block until all finish.
///
/// Results come back in job order. A failing job aborts the whole batch and
/// its error is returned; results of jobs that did succeed are dropped.
pub fn process_in_parallel<T, F>(jobs: Vec<F>) -> Result<Vec<T>>
where
    T: Send,
    F: FnOnce() -> Result<T> + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count())
        .build()
        .map_err(|e| MapError::Configuration(format!("failed to start worker pool: {e}")))?;

    debug!(jobs = jobs.len(), workers = pool.current_num_threads(), "fanning out jobs");
    pool.install(|| jobs.into_par_iter().map(|job| job()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_keep_job_order() {
        let jobs: Vec<_> = (0..32u64).map(|i| move || Ok(i * i)).collect();
        let results = process_in_parallel(jobs).unwrap();
        assert_eq!(results.len(), 32);
        assert_eq!(results[5], 25);
        assert_eq!(results[31], 961);
    }

    #[test]
    fn test_failure_aborts_batch() {
        let jobs: Vec<Box<dyn FnOnce() -> Result<u32> + Send>> = vec![
            Box::new(|| Ok(1)),
            Box::new(|| Err(MapError::Configuration("job two failed".into()))),
            Box::new(|| Ok(3)),
        ];
        let err = process_in_parallel(jobs).unwrap_err();
        assert!(err.to_string().contains("job two failed"));
    }
}
