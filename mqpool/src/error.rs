// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use thiserror::Error;

use crate::registry::handle::QueueHandle;

/// Errors reported by queue and registry operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue is sealed. The job was dropped without being scheduled.
    #[error("queue is sealed, job rejected")]
    Sealed,

    /// The handle does not refer to a live queue, e.g. it was already destroyed.
    #[error("{0} does not refer to a live queue")]
    UnknownQueue(QueueHandle),
}

/// Errors raised while building a worker pool.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("a worker pool needs at least one thread")]
    NoWorkers,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
