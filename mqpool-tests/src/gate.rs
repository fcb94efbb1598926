// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct GateState {
    open: bool,
    entered: usize,
}

/// Holds jobs inside their body until the test opens it.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    inner: Arc<(Mutex<GateState>, Condvar)>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// A job body that blocks until the gate opens.
    pub fn job(&self) -> impl FnOnce() + Send + 'static {
        let gate = self.clone();
        move || gate.pass()
    }

    pub fn pass(&self) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock().unwrap();
        state.entered += 1;
        cvar.notify_all();
        while !state.open {
            state = cvar.wait(state).unwrap();
        }
    }

    /// Waits until `n` jobs are blocked in (or have passed) the gate.
    pub fn wait_entered(&self, n: usize, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let state = lock.lock().unwrap();
        let (state, _) = cvar
            .wait_timeout_while(state, timeout, |s| s.entered < n)
            .unwrap();
        state.entered >= n
    }

    pub fn open(&self) {
        let (lock, cvar) = &*self.inner;
        lock.lock().unwrap().open = true;
        cvar.notify_all();
    }
}
