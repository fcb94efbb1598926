// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Records the peak number of its jobs running at the same time.
#[derive(Debug, Clone, Default)]
pub struct OverlapMeter {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

impl OverlapMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A job body that stays active for `busy`.
    pub fn job(&self, busy: Duration) -> impl FnOnce() + Send + 'static {
        let meter = self.clone();
        move || {
            let now = meter.active.fetch_add(1, Ordering::SeqCst) + 1;
            meter.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(busy);
            meter.active.fetch_sub(1, Ordering::SeqCst);
            meter.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}
