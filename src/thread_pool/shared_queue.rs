use std::{
    collections::VecDeque,
    mem,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
};

use crate::thread_pool::{CompletionHandle, Task, ThreadPool};
use crate::{Result, SegintError};

struct Worker {
    id: u32,
    handle: JoinHandle<()>,
}

impl Worker {
    fn new(id: u32, shared: Arc<Shared>) -> Result<Self> {
        let handle = thread::Builder::new()
            .name(format!("segint-worker-{}", id))
            .spawn(move || run_worker(id, shared))?;
        Ok(Self { id, handle })
    }
}

struct Queue {
    tasks: VecDeque<Task>,
    closed: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    available: Condvar,
}

impl Shared {
    // Jobs never run while the queue lock is held, so a poisoned lock still guards a
    // consistent queue.
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn run_worker(id: u32, shared: Arc<Shared>) {
    trace!("worker {} started", id);
    loop {
        let task = {
            let mut queue = shared.lock();
            while queue.tasks.is_empty() && !queue.closed {
                queue = shared
                    .available
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if queue.closed {
                break;
            }
            queue.tasks.pop_front()
        };
        if let Some(task) = task {
            trace!("worker {} running task", id);
            task.run();
        }
    }
    trace!("worker {} exited", id);
}

/// A fixed set of long-lived workers consuming one FIFO queue.
///
/// Workers sleep on a condition variable while the queue is empty. `shutdown` (also run
/// on drop) wakes every worker and joins them without draining the queue: jobs still
/// queued at that point never run and their handles report `SegintError::TaskDropped`.
pub struct SharedQueueThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<Worker>>,
    size: u32,
}

impl ThreadPool for SharedQueueThreadPool {
    fn new(threads: u32) -> Result<Self>
    where
        Self: Sized,
    {
        if threads == 0 {
            return Err(SegintError::InvalidThreadCount(threads));
        }
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                tasks: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        });
        let pool = Self {
            shared,
            workers: Mutex::new(Vec::with_capacity(threads as usize)),
            size: threads,
        };
        for id in 0..threads {
            match Worker::new(id, Arc::clone(&pool.shared)) {
                Ok(worker) => pool
                    .workers
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(worker),
                Err(e) => {
                    error!("failed to spawn worker {}: {}", id, e);
                    pool.shutdown();
                    return Err(e);
                }
            }
        }
        debug!("shared queue pool started with {} workers", threads);
        Ok(pool)
    }

    fn spawn<F>(&self, job: F) -> Result<CompletionHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let (task, handle) = Task::new(job);
        {
            let mut queue = self.shared.lock();
            if queue.closed {
                return Err(SegintError::PoolClosed);
            }
            queue.tasks.push_back(task);
            trace!("queued task, {} pending", queue.tasks.len());
        }
        self.shared.available.notify_one();
        Ok(handle)
    }

    fn shutdown(&self) {
        {
            let mut queue = self.shared.lock();
            if !queue.closed {
                queue.closed = true;
                debug!("shutting down shared queue pool");
            }
        }
        self.shared.available.notify_all();

        // Held while joining so a concurrent shutdown waits for the same workers.
        // Workers never take this lock.
        let mut workers = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for worker in workers.drain(..) {
            if worker.handle.join().is_err() {
                warn!("worker {} exited abnormally", worker.id);
            }
        }
        drop(workers);

        let dropped = mem::take(&mut self.shared.lock().tasks);
        if !dropped.is_empty() {
            warn!("discarding {} queued tasks", dropped.len());
        }
    }

    fn thread_count(&self) -> u32 {
        self.size
    }
}

impl Drop for SharedQueueThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
