// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use async_channel::{Receiver, Sender};
use log::debug;
use std::collections::VecDeque;
use std::future::Future;
use std::mem;
use std::sync::{Arc, Condvar, Mutex};

use crate::error::QueueError;
use crate::executor::{Executor, Job};
use crate::queue::continuation::Continuation;
use crate::sync;

#[derive(Default)]
pub(crate) struct QueueState {
    /// Jobs not yet started. While `job_pending` is set and `running` is not,
    /// the front entry is the job the submitted continuation will run.
    pub(crate) jobs: VecDeque<Job>,
    /// A continuation for this queue sits in the executor or is running.
    pub(crate) job_pending: bool,
    /// The continuation has taken its job out of `jobs` and is executing it.
    pub(crate) running: bool,
    /// Enqueuing is disallowed.
    pub(crate) sealed: bool,
    /// Finishing a job does not submit the next one.
    pub(crate) paused: bool,
    pub(crate) idle_waiters: Vec<Sender<()>>,
    pub(crate) empty_waiters: Vec<Sender<()>>,
}

impl QueueState {
    /// Nothing queued and nothing in flight.
    pub(crate) fn is_drained(&self) -> bool {
        self.jobs.is_empty() && !self.job_pending
    }
}

pub(crate) struct QueueShared {
    pub(crate) state: Mutex<QueueState>,
    pub(crate) current_job_done: Condvar,
    pub(crate) empty: Condvar,
}

/// One ordering domain: jobs run one at a time, in the order they were enqueued.
///
/// The queue is only a state machine; the jobs run on whatever [`Executor`] is
/// passed to [`enqueue`](Self::enqueue) and [`unpause`](Self::unpause).
/// Dropping a queue drops the jobs it still holds without running them, so
/// [`stop`](Self::stop) it first if the job in flight must finish.
pub struct JobQueue {
    shared: Arc<QueueShared>,
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = sync::lock(&self.shared.state);
        f.debug_struct("JobQueue")
            .field("queued", &state.jobs.len())
            .field("job_pending", &state.job_pending)
            .field("sealed", &state.sealed)
            .field("paused", &state.paused)
            .finish()
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(QueueShared {
                state: Mutex::new(QueueState::default()),
                current_job_done: Condvar::new(),
                empty: Condvar::new(),
            }),
        }
    }

    /// Appends `job`. If the queue was empty the job is submitted right away,
    /// otherwise it runs once every earlier job has finished.
    ///
    /// Returns [`QueueError::Sealed`] and drops the job if the queue is sealed.
    pub fn enqueue(&self, job: Job, executor: &Arc<dyn Executor>) -> Result<(), QueueError> {
        let bootstrap = {
            let mut state = sync::lock(&self.shared.state);
            if state.sealed {
                drop(state);
                drop(job);
                return Err(QueueError::Sealed);
            }
            // whoever finished the last job found nothing to chain to
            let bootstrap = state.is_drained();
            state.jobs.push_back(job);
            if bootstrap {
                state.job_pending = true;
            }
            bootstrap
        };

        if bootstrap {
            Continuation::new(self.shared.clone(), executor.clone()).submit();
        }
        Ok(())
    }

    /// Disables enqueue. Jobs already queued still run.
    pub fn seal(&self) {
        sync::lock(&self.shared.state).sealed = true;
    }

    pub fn unseal(&self) {
        sync::lock(&self.shared.state).sealed = false;
    }

    /// Keeps the next job from starting. The job in flight, if any, is not interrupted.
    pub fn pause(&self) {
        sync::lock(&self.shared.state).paused = true;
    }

    /// Re-enables chaining. A paused queue that still holds jobs is restarted here,
    /// since no finishing job is left to submit the next one.
    pub fn unpause(&self, executor: &Arc<dyn Executor>) {
        let resume = {
            let mut state = sync::lock(&self.shared.state);
            state.paused = false;
            let resume = !state.job_pending && !state.jobs.is_empty();
            if resume {
                state.job_pending = true;
            }
            resume
        };

        if resume {
            debug!("Resuming stalled queue");
            Continuation::new(self.shared.clone(), executor.clone()).submit();
        }
    }

    /// Blocks until no job of this queue is submitted or running.
    /// Jobs still queued behind it are not waited for.
    pub fn wait_for_current(&self) {
        let state = sync::lock(&self.shared.state);
        let _state = sync::wait_while(&self.shared.current_job_done, state, |s| s.job_pending);
    }

    /// Blocks until every queued job has run.
    pub fn wait_for_empty(&self) {
        let state = sync::lock(&self.shared.state);
        let _state = sync::wait_while(&self.shared.empty, state, |s| !s.is_drained());
    }

    /// [`seal`](Self::seal), then [`wait_for_empty`](Self::wait_for_empty).
    /// The queue stays sealed afterwards.
    pub fn flush(&self) {
        let mut state = sync::lock(&self.shared.state);
        state.sealed = true;
        let _state = sync::wait_while(&self.shared.empty, state, |s| !s.is_drained());
    }

    /// [`pause`](Self::pause), then [`wait_for_current`](Self::wait_for_current).
    /// Jobs that have not started stay queued.
    pub fn stop(&self) {
        let mut state = sync::lock(&self.shared.state);
        state.paused = true;
        let _state = sync::wait_while(&self.shared.current_job_done, state, |s| s.job_pending);
    }

    /// Like [`flush`](Self::flush), but resolves a future instead of blocking.
    ///
    /// The queue is sealed when this is called, not when the future is first polled.
    pub fn flush_async(&self) -> impl Future<Output = ()> + Send + 'static {
        let rx = {
            let mut state = sync::lock(&self.shared.state);
            state.sealed = true;
            register(state.is_drained(), &mut state.empty_waiters)
        };
        completion(rx)
    }

    /// Like [`stop`](Self::stop), but resolves a future instead of blocking.
    ///
    /// The queue is paused when this is called, not when the future is first polled.
    pub fn stop_async(&self) -> impl Future<Output = ()> + Send + 'static {
        let rx = {
            let mut state = sync::lock(&self.shared.state);
            state.paused = true;
            let idle = !state.job_pending;
            register(idle, &mut state.idle_waiters)
        };
        completion(rx)
    }

    /// Jobs not yet finished, including the one in flight.
    pub fn len(&self) -> usize {
        let state = sync::lock(&self.shared.state);
        state.jobs.len() + usize::from(state.running)
    }

    pub fn is_empty(&self) -> bool {
        sync::lock(&self.shared.state).is_drained()
    }

    pub fn is_sealed(&self) -> bool {
        sync::lock(&self.shared.state).sealed
    }

    pub fn is_paused(&self) -> bool {
        sync::lock(&self.shared.state).paused
    }

    pub fn is_job_pending(&self) -> bool {
        sync::lock(&self.shared.state).job_pending
    }
}

impl JobQueue {
    /// Drops every job that has not started and returns how many there were.
    /// If nothing is in flight the queue is now drained, which releases
    /// anyone blocked in [`flush`](Self::flush) or [`wait_for_empty`](Self::wait_for_empty).
    pub(crate) fn discard_pending(&self) -> usize {
        let (discarded, empty_waiters) = {
            let mut state = sync::lock(&self.shared.state);
            let discarded = mem::take(&mut state.jobs);
            let empty_waiters = if state.job_pending {
                Vec::new()
            } else {
                self.shared.empty.notify_all();
                mem::take(&mut state.empty_waiters)
            };
            (discarded, empty_waiters)
        };

        for waiter in empty_waiters {
            let _ = waiter.try_send(());
        }
        discarded.len()
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        let discarded = self.discard_pending();
        if discarded > 0 {
            debug!("Dropping queue with {discarded} pending jobs");
        }
    }
}

fn register(done: bool, waiters: &mut Vec<Sender<()>>) -> Option<Receiver<()>> {
    if done {
        return None;
    }
    let (tx, rx) = async_channel::bounded(1);
    waiters.push(tx);
    Some(rx)
}

async fn completion(rx: Option<Receiver<()>>) {
    if let Some(rx) = rx {
        // a closed channel means the queue is gone, which is just as final
        let _ = rx.recv().await;
    }
}
