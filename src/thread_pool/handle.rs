use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    time::Duration,
};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::{Result, SegintError};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// What happened to a job once a worker ran it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The job returned normally.
    Success,
    /// The job panicked; the panic message is kept.
    Failure(String),
}

impl TaskOutcome {
    /// Returns true for `TaskOutcome::Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }

    /// Turns a failure into `SegintError::TaskFailed`.
    pub fn into_result(self) -> Result<()> {
        match self {
            TaskOutcome::Success => Ok(()),
            TaskOutcome::Failure(reason) => Err(SegintError::TaskFailed(reason)),
        }
    }
}

/// One-shot signal returned by `ThreadPool::spawn`.
///
/// The outcome is written at most once by the worker; after it has been observed it
/// is cached, so the handle can be queried any number of times.
#[derive(Debug)]
pub struct CompletionHandle {
    receiver: Receiver<TaskOutcome>,
    outcome: Option<TaskOutcome>,
}

impl CompletionHandle {
    /// Blocks until the job has run.
    ///
    /// Returns `SegintError::TaskDropped` if the job was discarded without running,
    /// which happens to jobs still queued when their pool shuts down.
    pub fn wait(&mut self) -> Result<TaskOutcome> {
        if let Some(outcome) = &self.outcome {
            return Ok(outcome.clone());
        }
        let outcome = self
            .receiver
            .recv()
            .map_err(|_| SegintError::TaskDropped)?;
        self.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Like `wait`, but gives up after `timeout` and returns `Ok(None)`.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<TaskOutcome>> {
        if let Some(outcome) = &self.outcome {
            return Ok(Some(outcome.clone()));
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => {
                self.outcome = Some(outcome.clone());
                Ok(Some(outcome))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(SegintError::TaskDropped),
        }
    }

    /// Non-blocking check. `Ok(None)` means the job has not finished yet.
    pub fn try_wait(&mut self) -> Result<Option<TaskOutcome>> {
        if let Some(outcome) = &self.outcome {
            return Ok(Some(outcome.clone()));
        }
        match self.receiver.try_recv() {
            Ok(outcome) => {
                self.outcome = Some(outcome.clone());
                Ok(Some(outcome))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SegintError::TaskDropped),
        }
    }
}

/// A queued job together with the sending half of its completion handle.
pub(crate) struct Task {
    job: Job,
    completion: Sender<TaskOutcome>,
}

impl Task {
    pub(crate) fn new<F>(job: F) -> (Task, CompletionHandle)
    where
        F: FnOnce() + Send + 'static,
    {
        let (completion, receiver) = channel::bounded(1);
        let task = Task {
            job: Box::new(job),
            completion,
        };
        let handle = CompletionHandle {
            receiver,
            outcome: None,
        };
        (task, handle)
    }

    /// Runs the job behind a panic boundary and fulfils the handle.
    pub(crate) fn run(self) {
        let Task { job, completion } = self;
        let outcome = match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(()) => TaskOutcome::Success,
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!("task panicked: {}", reason);
                TaskOutcome::Failure(reason)
            }
        };
        // the submitter may have dropped its handle
        let _ = completion.send(outcome);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        String::from("unknown panic payload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_fulfils_handle() {
        let (task, mut handle) = Task::new(|| {});
        assert_eq!(handle.try_wait().unwrap(), None);
        task.run();
        assert_eq!(handle.wait().unwrap(), TaskOutcome::Success);
        // cached after the first read
        assert_eq!(handle.wait().unwrap(), TaskOutcome::Success);
        assert_eq!(handle.try_wait().unwrap(), Some(TaskOutcome::Success));
    }

    #[test]
    fn panic_becomes_failure() {
        let (task, mut handle) = Task::new(|| {
            panic_control::disable_hook_in_current_thread();
            panic!("boom");
        });
        task.run();
        let outcome = handle.wait().unwrap();
        assert_eq!(outcome, TaskOutcome::Failure("boom".to_string()));
        assert!(matches!(
            outcome.into_result(),
            Err(SegintError::TaskFailed(ref reason)) if reason == "boom"
        ));
    }

    #[test]
    fn formatted_panic_message_is_kept() {
        let (task, mut handle) = Task::new(|| {
            panic_control::disable_hook_in_current_thread();
            panic!("segment {} failed", 3);
        });
        task.run();
        assert_eq!(
            handle.wait().unwrap(),
            TaskOutcome::Failure("segment 3 failed".to_string())
        );
    }

    #[test]
    fn dropped_task_reports_dropped() {
        let (task, mut handle) = Task::new(|| {});
        drop(task);
        assert!(matches!(handle.wait(), Err(SegintError::TaskDropped)));
        assert!(matches!(handle.try_wait(), Err(SegintError::TaskDropped)));
    }

    #[test]
    fn wait_timeout_on_pending_task() {
        let (task, mut handle) = Task::new(|| {});
        assert_eq!(
            handle.wait_timeout(Duration::from_millis(10)).unwrap(),
            None
        );
        task.run();
        assert_eq!(
            handle.wait_timeout(Duration::from_millis(10)).unwrap(),
            Some(TaskOutcome::Success)
        );
    }
}
