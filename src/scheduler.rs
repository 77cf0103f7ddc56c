// polar-cartgrid/src/scheduler.rs

use crate::params::InterpParams;
use log::debug;
use ndarray::parallel::prelude::*;
use ndarray::{ArrayViewMut, Axis, Dimension, RemoveAxis};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// Fixed-size worker pool. A pool of one thread runs the same code path as a
/// larger pool, only without concurrency.
pub struct TaskScheduler {
    pool: ThreadPool,
}

impl TaskScheduler {
    pub fn new(n_threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads.max(1))
            .thread_name(|i| format!("cartgrid-worker-{}", i))
            .build()?;
        debug!("thread pool ready with {} threads", pool.current_num_threads());
        Ok(Self { pool })
    }

    pub fn from_params(params: &InterpParams) -> Result<Self, ThreadPoolBuildError> {
        Self::new(params.n_threads())
    }

    pub fn n_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `op(iz, iy, row)` once for every row of the two leading axes of
    /// `data`. Rows are disjoint so no locking is involved; the call returns
    /// once every row is done.
    pub fn for_each_row<A, D, F>(&self, mut data: ArrayViewMut<'_, A, D>, op: F)
    where
        A: Send + Sync,
        D: RemoveAxis,
        D::Smaller: RemoveAxis,
        F: Fn(usize, usize, ArrayViewMut<'_, A, <D::Smaller as Dimension>::Smaller>) + Sync + Send,
    {
        let op = &op;
        self.pool.install(|| {
            data.axis_iter_mut(Axis(0))
                .into_par_iter()
                .enumerate()
                .for_each(|(iz, mut plane)| {
                    plane
                        .axis_iter_mut(Axis(0))
                        .into_par_iter()
                        .enumerate()
                        .for_each(|(iy, row)| op(iz, iy, row));
                });
        });
    }

    /// Runs `op` on every task, each on its own worker when threads allow.
    pub fn for_each_task<T, F>(&self, tasks: &mut [T], op: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync + Send,
    {
        self.pool.install(|| tasks.par_iter_mut().for_each(|task| op(task)));
    }

    /// Runs two independent jobs and waits for both.
    pub fn join<RA, RB, A, B>(&self, job_a: A, job_b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        self.pool.install(|| rayon::join(job_a, job_b))
    }
}
