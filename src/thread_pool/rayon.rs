use std::sync::{PoisonError, RwLock};

use crate::thread_pool::{CompletionHandle, Task, ThreadPool};
use crate::{Result, SegintError};

/// RayonThreadPool
///
/// Backed by `rayon::ThreadPool`. Unlike `SharedQueueThreadPool`, jobs already handed
/// to rayon still run after `shutdown`; only new spawns are refused.
pub struct RayonThreadPool {
    size: u32,
    pool: RwLock<Option<::rayon::ThreadPool>>,
}

impl ThreadPool for RayonThreadPool {
    fn new(threads: u32) -> Result<Self>
    where
        Self: Sized,
    {
        if threads == 0 {
            return Err(SegintError::InvalidThreadCount(threads));
        }
        let pool = ::rayon::ThreadPoolBuilder::new()
            .num_threads(threads as usize)
            .thread_name(|i| format!("segint-rayon-{}", i))
            .build()
            .map_err(|e| SegintError::ThreadPoolBuild(e.to_string()))?;
        debug!("rayon pool started with {} threads", threads);
        Ok(Self {
            size: threads,
            pool: RwLock::new(Some(pool)),
        })
    }

    fn spawn<F>(&self, job: F) -> Result<CompletionHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = self.pool.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(pool) => {
                let (task, handle) = Task::new(job);
                pool.spawn(move || task.run());
                Ok(handle)
            }
            None => Err(SegintError::PoolClosed),
        }
    }

    /// Refuses new spawns and drops the rayon pool. Does not wait for rayon's threads:
    /// jobs already accepted keep running and fulfil their handles.
    fn shutdown(&self) {
        let pool = self
            .pool
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if pool.is_some() {
            debug!("shutting down rayon pool");
        }
    }

    fn thread_count(&self) -> u32 {
        self.size
    }
}
