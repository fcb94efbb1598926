// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use crate::registry::slots::SlotKey;

/// Names one queue of a [`MultiQueueThreadPool`](crate::MultiQueueThreadPool).
///
/// Handles are plain values: copying one does not keep the queue alive, and
/// a handle is valid from `create_queue` until `destroy_queue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueHandle {
    key: SlotKey,
}

impl QueueHandle {
    pub(crate) fn new(key: SlotKey) -> Self {
        Self { key }
    }

    pub(crate) fn key(self) -> SlotKey {
        self.key
    }
}

impl std::fmt::Display for QueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "queue#{}v{}", self.key.index, self.key.generation)
    }
}
