use std::io;

use thiserror::Error;

/// Segint Error
#[derive(Error, Debug)]
pub enum SegintError {
    /// A job was spawned after the pool began shutting down
    #[error("thread pool is closed")]
    PoolClosed,
    /// A pool needs at least one worker
    #[error("invalid thread count: {0}")]
    InvalidThreadCount(u32),
    /// Bad interval, segment or step configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A task panicked while running on the pool
    #[error("task failed: {0}")]
    TaskFailed(String),
    /// A queued task was discarded before it ever ran
    #[error("task dropped before it was executed")]
    TaskDropped,
    /// Building the rayon pool failed
    #[error("{0}")]
    ThreadPoolBuild(String),
    /// IO Error
    #[error("{0}")]
    Io(#[from] io::Error),
    /// Serialization error.
    #[error("{0}")]
    Serde(#[from] serde_json::Error),
}

/// Segint Error Result
pub type Result<T> = std::result::Result<T, SegintError>;
