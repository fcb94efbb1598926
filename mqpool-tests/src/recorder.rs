// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::{Arc, Mutex};

/// Collects the indices jobs report, in completion order.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<usize>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A job body that appends `index`.
    pub fn job(&self, index: usize) -> impl FnOnce() + Send + 'static {
        let entries = self.entries.clone();
        move || entries.lock().unwrap().push(index)
    }

    pub fn entries(&self) -> Vec<usize> {
        self.entries.lock().unwrap().clone()
    }

    /// Jobs created by [`job`](Self::job) that still exist (queued or running).
    pub fn outstanding_jobs(&self) -> usize {
        Arc::strong_count(&self.entries) - 1
    }
}
