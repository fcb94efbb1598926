// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use futures::executor::ThreadPool;

use super::{Executor, Job};

/// Lets a `futures` thread pool stand in for the fixed pool, e.g. when an
/// application already runs one process-wide.
impl Executor for ThreadPool {
    fn enqueue(&self, job: Job) {
        self.spawn_ok(async move { job() });
    }
}
