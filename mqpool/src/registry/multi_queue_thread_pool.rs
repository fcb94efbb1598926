// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use log::debug;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::PoolConfig;
use crate::error::{PoolError, QueueError};
use crate::executor::fixed_thread_pool::FixedThreadPool;
use crate::executor::Executor;
use crate::queue::job_queue::JobQueue;
use crate::registry::handle::QueueHandle;
use crate::registry::slots::Slots;
use crate::sync;

/// Ordered job queues sharing one executor.
///
/// Jobs of one queue run one at a time in enqueue order. Jobs of different
/// queues run independently of each other on the shared executor.
///
/// The registry lock is only held to look a queue up; every queue operation,
/// including the blocking ones, runs after it is released.
pub struct MultiQueueThreadPool {
    queues: RwLock<Slots<Arc<JobQueue>>>,
    executor: Arc<dyn Executor>,
}

impl std::fmt::Debug for MultiQueueThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiQueueThreadPool")
            .field("queues", &self.queue_count())
            .finish()
    }
}

impl MultiQueueThreadPool {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            queues: RwLock::new(Slots::default()),
            executor,
        }
    }

    /// Builds a [`FixedThreadPool`] from `config` and uses it as the shared executor.
    pub fn with_fixed_pool(config: &PoolConfig) -> Result<Self, PoolError> {
        let pool = FixedThreadPool::with_config(config)?;
        Ok(Self::new(Arc::new(pool)))
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /// Creates an empty, unsealed, unpaused queue.
    ///
    /// # Panics
    ///
    /// If `u32::MAX` queues are alive at the same time. Slots of destroyed
    /// queues are reused, so only live queues count towards the limit.
    pub fn create_queue(&self) -> QueueHandle {
        let key = sync::write(&self.queues).insert(Arc::new(JobQueue::new()));
        let handle = QueueHandle::new(key);
        debug!("Created {handle}");
        handle
    }

    /// Stops the queue (waiting for its running job), then removes it. Jobs that
    /// had not started are dropped unrun. The handle is invalid afterwards.
    ///
    /// Must not be called from a job of the same queue: the stop would wait for itself.
    pub fn destroy_queue(&self, handle: QueueHandle) -> Result<(), QueueError> {
        let queue = self.queue(handle)?;
        queue.stop();

        let removed = sync::write(&self.queues).remove(handle.key());
        let Some(removed) = removed else {
            // destroyed concurrently by someone else
            return Err(QueueError::UnknownQueue(handle));
        };

        // other holders of the queue, e.g. a running `flush_all`, must not wait
        // for jobs that will never run
        let discarded = removed.discard_pending();
        if discarded > 0 {
            debug!("Destroyed {handle}, {discarded} pending jobs will not run");
        } else {
            debug!("Destroyed {handle}");
        }
        Ok(())
    }

    /// Appends `job` to the queue. Fails with [`QueueError::Sealed`] if the queue
    /// is sealed, in which case the job is dropped.
    pub fn enqueue<F>(&self, handle: QueueHandle, job: F) -> Result<(), QueueError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue(handle)?.enqueue(Box::new(job), &self.executor)
    }

    pub fn seal(&self, handle: QueueHandle) -> Result<(), QueueError> {
        self.queue(handle)?.seal();
        Ok(())
    }

    pub fn unseal(&self, handle: QueueHandle) -> Result<(), QueueError> {
        self.queue(handle)?.unseal();
        Ok(())
    }

    pub fn pause(&self, handle: QueueHandle) -> Result<(), QueueError> {
        self.queue(handle)?.pause();
        Ok(())
    }

    pub fn unpause(&self, handle: QueueHandle) -> Result<(), QueueError> {
        self.queue(handle)?.unpause(&self.executor);
        Ok(())
    }

    /// Pauses the queue and waits for the job in flight, if any.
    pub fn stop(&self, handle: QueueHandle) -> Result<(), QueueError> {
        self.queue(handle)?.stop();
        Ok(())
    }

    /// Seals the queue and waits until all of its jobs have run.
    pub fn flush(&self, handle: QueueHandle) -> Result<(), QueueError> {
        self.queue(handle)?.flush();
        Ok(())
    }

    pub fn flush_async(
        &self,
        handle: QueueHandle,
    ) -> Result<impl Future<Output = ()> + Send + 'static, QueueError> {
        Ok(self.queue(handle)?.flush_async())
    }

    pub fn stop_async(
        &self,
        handle: QueueHandle,
    ) -> Result<impl Future<Output = ()> + Send + 'static, QueueError> {
        Ok(self.queue(handle)?.stop_async())
    }

    /// Flushes every queue that exists when the call starts. Queues created
    /// while it runs may or may not be included.
    pub fn flush_all(&self) {
        let queues: Vec<Arc<JobQueue>> = sync::read(&self.queues).values().cloned().collect();
        for queue in queues {
            queue.flush();
        }
    }

    /// Jobs of the queue not yet finished, including the running one.
    pub fn queue_len(&self, handle: QueueHandle) -> Result<usize, QueueError> {
        Ok(self.queue(handle)?.len())
    }

    pub fn queue_count(&self) -> usize {
        sync::read(&self.queues).len()
    }

    fn queue(&self, handle: QueueHandle) -> Result<Arc<JobQueue>, QueueError> {
        sync::read(&self.queues)
            .get(handle.key())
            .cloned()
            .ok_or(QueueError::UnknownQueue(handle))
    }
}

impl Drop for MultiQueueThreadPool {
    fn drop(&mut self) {
        let queues = self
            .queues
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for queue in queues.values() {
            queue.stop();
        }
    }
}
