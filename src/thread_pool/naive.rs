use std::{
    mem,
    sync::{Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
};

use crate::thread_pool::{CompletionHandle, Task, ThreadPool};
use crate::{Result, SegintError};

struct State {
    closed: bool,
    spawned: u64,
    handles: Vec<JoinHandle<()>>,
}

/// NaiveThreadPool starts a fresh OS thread for every job.
///
/// `threads` is only recorded; there is no bound on how many jobs run at once.
/// `shutdown` joins every thread the pool has started.
pub struct NaiveThreadPool {
    size: u32,
    state: Mutex<State>,
    joining: Mutex<()>,
}

impl NaiveThreadPool {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ThreadPool for NaiveThreadPool {
    fn new(threads: u32) -> Result<Self>
    where
        Self: Sized,
    {
        if threads == 0 {
            return Err(SegintError::InvalidThreadCount(threads));
        }
        Ok(Self {
            size: threads,
            state: Mutex::new(State {
                closed: false,
                spawned: 0,
                handles: Vec::new(),
            }),
            joining: Mutex::new(()),
        })
    }

    fn spawn<F>(&self, job: F) -> Result<CompletionHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.lock();
        if state.closed {
            return Err(SegintError::PoolClosed);
        }
        // finished threads need no join
        state.handles.retain(|h| !h.is_finished());
        let (task, handle) = Task::new(job);
        let join = thread::Builder::new()
            .name(format!("segint-naive-{}", state.spawned))
            .spawn(move || task.run())?;
        state.spawned += 1;
        state.handles.push(join);
        Ok(handle)
    }

    fn shutdown(&self) {
        // Held across the joins so a concurrent shutdown returns only once they are done.
        // `state` is released first, since running jobs may still call `spawn`.
        let _joining = self.joining.lock().unwrap_or_else(PoisonError::into_inner);
        let handles = {
            let mut state = self.lock();
            if !state.closed {
                state.closed = true;
                debug!("shutting down naive pool, {} threads started", state.spawned);
            }
            mem::take(&mut state.handles)
        };
        for handle in handles {
            if handle.join().is_err() {
                warn!("naive pool thread exited abnormally");
            }
        }
    }

    fn thread_count(&self) -> u32 {
        self.size
    }
}

impl Drop for NaiveThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
