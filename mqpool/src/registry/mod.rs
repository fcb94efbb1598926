// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>
//! The registry owns every queue and forwards handle-keyed calls to them.
//!
//! Queues live in a generational slot arena. A [`QueueHandle`](handle::QueueHandle)
//! names a slot and the generation it was issued for, so a handle that
//! outlives its queue is reported as [`QueueError::UnknownQueue`](crate::QueueError)
//! even after the slot has been reused.

pub mod handle;
pub mod multi_queue_thread_pool;
pub(crate) mod slots;
