//! Running independent checks concurrently.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;
use tracing::debug;

use crate::errors::PipelineError;
use crate::module::Module;
use crate::solver::{Solver, Verdict};

/// A unit of work submitted to an [`Executor`].
pub type Job<T> = Box<dyn FnOnce() -> Result<T, PipelineError> + Send + 'static>;

enum Pending<T> {
    Done(Result<T, PipelineError>),
    Thread(JoinHandle<Result<T, PipelineError>>),
}

/// Handle to a submitted job. Dropping it abandons the result.
pub struct JobHandle<T> {
    pending: Pending<T>,
}

impl<T> JobHandle<T> {
    pub fn ready(result: Result<T, PipelineError>) -> Self {
        JobHandle {
            pending: Pending::Done(result),
        }
    }

    /// Block until the job finishes.
    pub fn wait(self) -> Result<T, PipelineError> {
        match self.pending {
            Pending::Done(result) => result,
            Pending::Thread(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(PipelineError::Job("job panicked".to_string()))),
        }
    }
}

/// Schedules jobs.
pub trait Executor: Send + Sync {
    fn submit<T: Send + 'static>(&self, job: Job<T>) -> JobHandle<T>;
}

/// Runs every job on its own OS thread.
#[derive(Debug, Default)]
pub struct ThreadExecutor {
    spawned: AtomicUsize,
}

impl ThreadExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs submitted so far.
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::Relaxed)
    }
}

impl Executor for ThreadExecutor {
    fn submit<T: Send + 'static>(&self, job: Job<T>) -> JobHandle<T> {
        let n = self.spawned.fetch_add(1, Ordering::Relaxed);
        match std::thread::Builder::new()
            .name(format!("ltlsat-job-{n}"))
            .spawn(job)
        {
            Ok(handle) => JobHandle {
                pending: Pending::Thread(handle),
            },
            Err(e) => JobHandle::ready(Err(PipelineError::Job(e.to_string()))),
        }
    }
}

/// Runs each job immediately on the submitting thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn submit<T: Send + 'static>(&self, job: Job<T>) -> JobHandle<T> {
        JobHandle::ready(job())
    }
}

/// Check every module with `solver`. Results come back in input order.
pub fn check_all(
    solver: &Solver,
    modules: &[Module],
    executor: &impl Executor,
) -> Vec<Result<Verdict, PipelineError>> {
    debug!(jobs = modules.len(), "submitting checks");
    let handles: Vec<_> = modules
        .iter()
        .map(|module| {
            let solver = solver.clone();
            let module = module.clone();
            executor.submit(Box::new(move || solver.check(&module)))
        })
        .collect();
    handles.into_iter().map(JobHandle::wait).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_executor_returns_results() {
        let executor = ThreadExecutor::new();
        let handles: Vec<_> = (0..4)
            .map(|i| executor.submit(Box::new(move || Ok(i * 2))))
            .collect();
        let results: Vec<i32> = handles.into_iter().map(|h| h.wait().unwrap()).collect();
        assert_eq!(results, vec![0, 2, 4, 6]);
        assert_eq!(executor.spawned(), 4);
    }

    #[test]
    fn panics_become_job_errors() {
        let executor = ThreadExecutor::new();
        let handle: JobHandle<()> = executor.submit(Box::new(|| panic!("boom")));
        assert!(matches!(handle.wait(), Err(PipelineError::Job(_))));
    }

    #[test]
    fn inline_executor_runs_eagerly() {
        let handle = InlineExecutor.submit(Box::new(|| Err::<(), _>(PipelineError::Solver("x".into()))));
        assert!(matches!(handle.wait(), Err(PipelineError::Solver(_))));
    }
}
