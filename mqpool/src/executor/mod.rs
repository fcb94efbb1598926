// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>
//! Executors run jobs asynchronously on some thread.
//!
//! The queues only rely on "accept a job and eventually run it exactly once".
//! [`FixedThreadPool`](fixed_thread_pool::FixedThreadPool) is the pool this crate
//! ships; a `futures::executor::ThreadPool` works just as well.

use std::sync::Arc;

pub mod fixed_thread_pool;
pub mod futures_pool;

/// A nullary unit of work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait Executor: Send + Sync {
    /// Runs `job` asynchronously, exactly once, unless the executor shuts down first.
    /// Must not block until the job has run.
    fn enqueue(&self, job: Job);
}

impl std::fmt::Debug for dyn Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Executor")
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn enqueue(&self, job: Job) {
        (**self).enqueue(job)
    }
}

impl<E: Executor + ?Sized> Executor for &E {
    fn enqueue(&self, job: Job) {
        (**self).enqueue(job)
    }
}
