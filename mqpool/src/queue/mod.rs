// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>
//! # Ordering domains
//!
//! A [`JobQueue`](job_queue::JobQueue) never owns a thread. It has at most one
//! job submitted to the executor at any time; the continuation that runs that
//! job submits the queue's next job when it is done.
//!
//! ```text
//!   enqueue (queue was empty) ──► submit continuation ──► executor worker
//!                                        ▲                     │
//!                                        │   run front job     │
//!                                        └── next job? ◄───────┘
//!                                             (not paused, not empty)
//! ```
//!
//! States: idle and empty, idle with dormant jobs (paused), active (one job
//! submitted or running).

pub(crate) mod continuation;
pub mod job_queue;
