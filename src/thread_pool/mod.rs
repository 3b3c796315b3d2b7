use crate::Result;

/// The ThreadPool contain new, spawn and shutdown functions
pub trait ThreadPool {
    /// Creates a new thread pool, immediately spawning the specified number of threads.
    /// Returns an error if `threads` is zero or if any thread fails to spawn.
    /// All previously-spawned threads are terminated.
    fn new(threads: u32) -> Result<Self>
    where
        Self: Sized;

    /// Creates a pool sized to the hardware concurrency of this machine.
    fn with_default_threads() -> Result<Self>
    where
        Self: Sized,
    {
        Self::new(num_cpus::get() as u32)
    }

    /// Spawn a function into the threadpool.
    ///
    /// The returned handle is fulfilled once the job has run. If the job panics the
    /// panic is captured, reported through the handle as `TaskOutcome::Failure`, and the
    /// pool keeps the same number of threads.
    ///
    /// Fails with `SegintError::PoolClosed` once `shutdown` has begun; the job is not queued.
    fn spawn<F>(&self, job: F) -> Result<CompletionHandle>
    where
        F: FnOnce() + Send + 'static;

    /// Closes the pool so later spawns fail with `SegintError::PoolClosed`.
    ///
    /// Pools that own their threads block until every worker has exited and discard jobs
    /// still waiting in the queue; `RayonThreadPool` only closes, see its docs.
    /// Calling it more than once, or from several threads, is harmless.
    fn shutdown(&self);

    /// Number of worker threads the pool was built with.
    fn thread_count(&self) -> u32;
}

mod handle;
mod naive;
mod rayon;
mod shared_queue;

pub use self::rayon::RayonThreadPool;
pub use handle::{CompletionHandle, TaskOutcome};
pub use naive::NaiveThreadPool;
pub use shared_queue::SharedQueueThreadPool;

pub(crate) use handle::Task;
