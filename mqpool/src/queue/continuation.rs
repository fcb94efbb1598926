// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::mem;
use std::sync::Arc;

use crate::executor::Executor;
use crate::queue::job_queue::QueueShared;
use crate::sync;

/// Runs the front job of one queue on an executor worker and, when that job
/// is done, submits a new continuation for the next one.
///
/// The completion bookkeeping lives in `Drop`, so it also happens when the
/// job panics or when the executor discards the continuation without running
/// it. A discarded continuation leaves its job queued and does not chain.
pub(crate) struct Continuation {
    queue: Arc<QueueShared>,
    executor: Arc<dyn Executor>,
    started: bool,
}

impl Continuation {
    /// The caller must have set `job_pending` for `queue`.
    pub(crate) fn new(queue: Arc<QueueShared>, executor: Arc<dyn Executor>) -> Self {
        Self {
            queue,
            executor,
            started: false,
        }
    }

    /// Hands the continuation to the executor. No queue lock may be held here.
    pub(crate) fn submit(self) {
        let executor = self.executor.clone();
        executor.enqueue(Box::new(move || self.run()));
    }

    fn run(mut self) {
        let job = {
            let mut state = sync::lock(&self.queue.state);
            let job = state.jobs.pop_front();
            state.running = job.is_some();
            job
        };
        self.started = true;

        // never under the queue lock: the job may use its own queue
        if let Some(job) = job {
            job();
        }
    }
}

impl Drop for Continuation {
    fn drop(&mut self) {
        let (chain, idle_waiters, empty_waiters) = {
            let mut state = sync::lock(&self.queue.state);
            state.job_pending = false;
            state.running = false;
            // may wake a `stop()` that precedes destroying the queue
            self.queue.current_job_done.notify_all();

            if state.jobs.is_empty() {
                self.queue.empty.notify_all();
                let idle_waiters = mem::take(&mut state.idle_waiters);
                let empty_waiters = mem::take(&mut state.empty_waiters);
                (false, idle_waiters, empty_waiters)
            } else if state.paused || !self.started {
                (false, mem::take(&mut state.idle_waiters), Vec::new())
            } else {
                state.job_pending = true;
                (true, Vec::new(), Vec::new())
            }
        };

        for waiter in idle_waiters.into_iter().chain(empty_waiters) {
            let _ = waiter.try_send(());
        }

        if chain {
            Continuation::new(self.queue.clone(), self.executor.clone()).submit();
        }
    }
}
