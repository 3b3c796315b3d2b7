//! Segment-parallel min, max and rectangle-rule integral.

use std::{convert::TryFrom, str::FromStr, sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};

use crate::function::DomainFn;
use crate::report::{Executor, NullSink, ReportSink, RunReport};
use crate::thread_pool::{NaiveThreadPool, ThreadPool};
use crate::{Result, SegintError};

mod aggregate;
mod segment;
mod task;

pub use aggregate::{Aggregate, IntegrationContext};
pub use segment::{partition, Segment, SegmentStats};
pub use task::SegmentTask;

/// What to do with steps left over when `total_steps` is not a multiple of `segments`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemainderPolicy {
    /// Give the first `total_steps % segments` segments one extra step each.
    Distribute,
    /// Every segment gets `total_steps / segments` steps; the rest are dropped.
    Truncate,
    /// Reject configurations with a remainder.
    Strict,
}

impl Default for RemainderPolicy {
    fn default() -> Self {
        RemainderPolicy::Distribute
    }
}

impl FromStr for RemainderPolicy {
    type Err = SegintError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "distribute" => Ok(RemainderPolicy::Distribute),
            "truncate" => Ok(RemainderPolicy::Truncate),
            "strict" => Ok(RemainderPolicy::Strict),
            other => Err(SegintError::InvalidConfig(format!(
                "unknown remainder policy: {}",
                other
            ))),
        }
    }
}

/// Interval, segment count and resolution of a run.
///
/// The default is the interval [-25, 5] in 4 segments with 1000 steps in total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Left bound A.
    pub left: f64,
    /// Right bound B.
    pub right: f64,
    /// Number of segments N.
    pub segments: usize,
    /// Rectangles across the whole interval.
    pub total_steps: usize,
    /// How leftover steps are handled.
    pub remainder: RemainderPolicy,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            left: -25.0,
            right: 5.0,
            segments: 4,
            total_steps: 1000,
            remainder: RemainderPolicy::default(),
        }
    }
}

impl IntegrationConfig {
    /// set the interval
    pub fn interval(mut self, left: f64, right: f64) -> Self {
        self.left = left;
        self.right = right;
        self
    }
    /// set the segment count
    pub fn segments(mut self, segments: usize) -> Self {
        self.segments = segments;
        self
    }
    /// set the total step count
    pub fn total_steps(mut self, total_steps: usize) -> Self {
        self.total_steps = total_steps;
        self
    }
    /// set the remainder policy
    pub fn remainder(mut self, remainder: RemainderPolicy) -> Self {
        self.remainder = remainder;
        self
    }
}

/// Runs one integration: partitions the interval, hands all segments but the last to a
/// pool, evaluates the last one on the calling thread, and waits for the rest.
pub struct Integrator {
    config: IntegrationConfig,
    function: DomainFn,
    sink: Arc<dyn ReportSink>,
}

impl Integrator {
    /// Integrator for `function` that reports nowhere.
    pub fn new<F>(config: IntegrationConfig, function: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            config,
            function: Arc::new(function),
            sink: Arc::new(NullSink),
        }
    }

    /// Sends segment reports and the final summary to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The configuration this integrator runs.
    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    /// Runs on `pool`. The pool size does not need to match the segment count.
    ///
    /// Fails with `SegintError::PoolClosed` if the pool is shut down, with `TaskFailed` if
    /// any segment panicked, and with `TaskDropped` if the pool discarded a segment.
    pub fn run_with<P: ThreadPool>(&self, pool: &P) -> Result<RunReport> {
        let start = Instant::now();
        let segments = partition(&self.config)?;
        let initial = Aggregate::starting_at((*self.function)(self.config.left));
        let context = Arc::new(IntegrationContext::new(
            Arc::clone(&self.function),
            initial,
            Arc::clone(&self.sink),
        ));

        let (last, rest) = match segments.split_last() {
            Some(split) => split,
            None => return Err(SegintError::InvalidConfig("no segments".to_string())),
        };
        let mut handles = Vec::with_capacity(rest.len());
        for segment in rest {
            let task = SegmentTask::new(*segment, Arc::clone(&context), Executor::PoolThread);
            handles.push(pool.spawn(move || {
                task.run();
            })?);
        }
        debug!(
            "submitted {} segments to a pool of {} threads",
            handles.len(),
            pool.thread_count()
        );

        SegmentTask::new(*last, Arc::clone(&context), Executor::MainThread).run();

        for handle in handles.iter_mut() {
            handle.wait()?.into_result()?;
        }

        let report = RunReport {
            config: self.config,
            aggregate: context.snapshot(),
            segments: segments.len(),
            elapsed_us: start.elapsed().as_micros() as u64,
        };
        self.sink.summary(&report)?;
        Ok(report)
    }

    /// Runs with one dedicated OS thread per pooled segment.
    pub fn run_threads(&self) -> Result<RunReport> {
        let pool = NaiveThreadPool::new(pooled_thread_count(self.config.segments))?;
        self.run_with(&pool)
    }
}

/// One thread per segment except the one run by the caller, at least one, capped at `u32::MAX`.
fn pooled_thread_count(segments: usize) -> u32 {
    u32::try_from(segments.saturating_sub(1).max(1)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_thread_count_bounds() {
        assert_eq!(pooled_thread_count(0), 1);
        assert_eq!(pooled_thread_count(1), 1);
        assert_eq!(pooled_thread_count(4), 3);
        if cfg!(target_pointer_width = "64") {
            assert_eq!(pooled_thread_count(usize::MAX), u32::MAX);
        }
    }

    #[test]
    fn remainder_policy_names() {
        assert_eq!(
            "truncate".parse::<RemainderPolicy>().unwrap(),
            RemainderPolicy::Truncate
        );
        assert!("sometimes".parse::<RemainderPolicy>().is_err());
    }
}
