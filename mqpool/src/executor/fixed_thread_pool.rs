// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use log::{debug, warn};
use std::collections::VecDeque;
use std::cell::Cell;
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::executor::{Executor, Job};
use crate::sync;

#[derive(Default)]
struct PoolState {
    jobs: VecDeque<Job>,
    shutting_down: bool,
}

struct Shared {
    state: Mutex<PoolState>,
    not_empty: Condvar,
    /// Signalled by every worker leaving its loop, with `state` held.
    exited: Condvar,
    live_workers: AtomicUsize,
}

impl Shared {
    fn id(&self) -> usize {
        self as *const Shared as usize
    }
}

thread_local! {
    /// The pool a worker thread belongs to, zero on other threads.
    static WORKER_OF: Cell<usize> = const { Cell::new(0) };
}

/// A fixed number of persistent worker threads draining one FIFO job list.
///
/// Jobs still waiting in the list when the pool shuts down are dropped
/// without running. A job that panics takes its worker thread down with it;
/// the pool does not replace it.
pub struct FixedThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl std::fmt::Debug for FixedThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedThreadPool")
            .field("worker_count", &self.worker_count)
            .field("live_workers", &self.live_workers())
            .field("queued_jobs", &self.queued_jobs())
            .finish()
    }
}

impl FixedThreadPool {
    pub fn new(worker_count: usize) -> Result<Self, PoolError> {
        Self::with_config(&PoolConfig::with_workers(worker_count))
    }

    pub fn with_config(config: &PoolConfig) -> Result<Self, PoolError> {
        if config.worker_count == 0 {
            return Err(PoolError::NoWorkers);
        }

        let pool = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(PoolState::default()),
                not_empty: Condvar::new(),
                exited: Condvar::new(),
                live_workers: AtomicUsize::new(0),
            }),
            workers: Mutex::new(Vec::with_capacity(config.worker_count)),
            worker_count: config.worker_count,
        };

        for n in 0..config.worker_count {
            let name = format!("{}-{}", config.thread_name_prefix, n);
            let shared = pool.shared.clone();
            // counted before the thread exists so its exit can never underflow
            pool.shared.live_workers.fetch_add(1, Ordering::SeqCst);
            let spawned = thread::Builder::new()
                .name(name)
                .spawn(move || consume(&shared));
            match spawned {
                Ok(handle) => sync::lock(&pool.workers).push(handle),
                Err(e) => {
                    pool.shared.live_workers.fetch_sub(1, Ordering::SeqCst);
                    // dropping `pool` stops the workers spawned so far
                    return Err(PoolError::Spawn(e));
                }
            }
        }

        debug!("Started pool with {} workers", config.worker_count);
        Ok(pool)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Workers that have not exited yet. Drops below `worker_count` when a job
    /// panics, and to zero after shutdown.
    pub fn live_workers(&self) -> usize {
        self.shared.live_workers.load(Ordering::SeqCst)
    }

    /// Jobs accepted but not yet picked up by a worker.
    pub fn queued_jobs(&self) -> usize {
        sync::lock(&self.shared.state).jobs.len()
    }

    /// Stops the workers and waits for them to exit. Jobs that are currently
    /// running finish; jobs still queued are dropped unrun. Idempotent, and
    /// every concurrent caller returns only once all workers are gone.
    ///
    /// Called from one of the pool's own workers, it waits for the others
    /// only; the calling worker exits when its job returns.
    pub fn shutdown(&self) {
        let discarded = {
            let mut state = sync::lock(&self.shared.state);
            state.shutting_down = true;
            mem::take(&mut state.jobs)
        };
        self.shared.not_empty.notify_all();

        if !discarded.is_empty() {
            debug!("Discarding {} queued jobs on shutdown", discarded.len());
        }
        drop(discarded);

        let workers = mem::take(&mut *sync::lock(&self.workers));
        let current = thread::current().id();
        for worker in workers {
            // a job may drop the last reference to the pool from inside a worker
            if worker.thread().id() == current {
                continue;
            }
            // a worker killed by a panicking job already logged its exit
            let _ = worker.join();
        }

        // an earlier caller may hold the join handles and still be joining
        let on_worker = WORKER_OF.with(Cell::get) == self.shared.id();
        if !on_worker {
            let state = sync::lock(&self.shared.state);
            let _state = sync::wait_while(&self.shared.exited, state, |_| {
                self.shared.live_workers.load(Ordering::SeqCst) > 0
            });
        }
    }
}

impl Executor for FixedThreadPool {
    fn enqueue(&self, job: Job) {
        let was_empty = {
            let mut state = sync::lock(&self.shared.state);
            if state.shutting_down {
                drop(state);
                debug!("Pool is shut down, discarding job");
                drop(job);
                return;
            }
            let was_empty = state.jobs.is_empty();
            state.jobs.push_back(job);
            was_empty
        };
        if was_empty {
            self.shared.not_empty.notify_one();
        }
    }
}

impl Drop for FixedThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Logs and accounts for a worker leaving its loop, including by panic.
struct WorkerExit<'a> {
    shared: &'a Shared,
}

impl Drop for WorkerExit<'_> {
    fn drop(&mut self) {
        {
            // under the lock so a waiting `shutdown` cannot miss the wake-up
            let _state = sync::lock(&self.shared.state);
            self.shared.live_workers.fetch_sub(1, Ordering::SeqCst);
            self.shared.exited.notify_all();
        }
        let current = thread::current();
        let name = current.name().unwrap_or("<unnamed>");
        if thread::panicking() {
            warn!("Worker {name} terminated by a panicking job, pool capacity reduced");
        } else {
            debug!("Worker {name} exiting");
        }
    }
}

fn consume(shared: &Shared) {
    WORKER_OF.with(|pool| pool.set(shared.id()));
    // `state` is never held when this guard drops
    let _exit = WorkerExit { shared };
    loop {
        let (job, more) = {
            let state = sync::lock(&shared.state);
            let mut state = sync::wait_while(&shared.not_empty, state, |s| {
                !s.shutting_down && s.jobs.is_empty()
            });
            if state.shutting_down {
                return;
            }
            let Some(job) = state.jobs.pop_front() else {
                continue;
            };
            (job, !state.jobs.is_empty())
        };
        // only the empty -> non-empty transition signals, so pass the wake on
        if more {
            shared.not_empty.notify_one();
        }
        job();
    }
}
