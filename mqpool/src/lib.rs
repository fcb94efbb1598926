// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>
//! # mqpool: ordered job queues on a shared worker pool
//!
//! ## Overview
//! Many independent FIFO queues ("ordering domains") share a small, fixed set of
//! worker threads. Within one queue jobs run strictly one after another in
//! enqueue order. Different queues make progress independently.
//!
//! - The registry ([`MultiQueueThreadPool`]) owns the queues and hands out
//!   [`QueueHandle`]s.
//! - A [`JobQueue`] submits work to the [`Executor`] only while nothing of its
//!   own is in flight.
//! - When a job finishes, its continuation submits the next job of the same
//!   queue (auto-chaining). No queue owns a thread.
//!
//! ```text
//!         +--------------------------------------+
//!         |          MultiQueueThreadPool        |
//!         +----+------------+------------+-------+
//!              |            |            |
//!         +----v----+  +----v----+  +----v----+
//!         | Queue A |  | Queue B |  | Queue C |   at most one job each
//!         +----+----+  +----+----+  +----+----+
//!              |            |            |
//!         +----v------------v------------v-------+
//!         |      Executor (FixedThreadPool)      |
//!         +--------------------------------------+
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mqpool::{FixedThreadPool, MultiQueueThreadPool};
//!
//! let pool = Arc::new(FixedThreadPool::new(4).expect("worker threads"));
//! let queues = MultiQueueThreadPool::new(pool);
//!
//! let connection = queues.create_queue();
//! for i in 0..3 {
//!     queues
//!         .enqueue(connection, move || println!("message {i}"))
//!         .expect("queue accepts jobs");
//! }
//! queues.flush(connection).expect("queue is registered");
//! queues.destroy_queue(connection).expect("queue is registered");
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod queue;
pub mod registry;

pub(crate) mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::PoolConfig;
pub use error::{PoolError, QueueError};
pub use executor::{fixed_thread_pool::FixedThreadPool, Executor, Job};
pub use queue::job_queue::JobQueue;
pub use registry::handle::QueueHandle;
pub use registry::multi_queue_thread_pool::MultiQueueThreadPool;
