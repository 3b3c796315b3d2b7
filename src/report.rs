//! Side-channel output of a run.
//!
//! Every sink serializes its own output; reporting never happens under the aggregate lock.

use std::{
    fmt,
    io::{self, Write},
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::integrate::{Aggregate, IntegrationConfig, Segment, SegmentStats};
use crate::Result;

const SEGMENT_DELIMITER: &str = "---------------------------------------------";
const SUMMARY_DELIMITER: &str = "-------------------------------------------";

/// Which kind of thread evaluated a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Executor {
    /// The thread that called the integrator.
    MainThread,
    /// A worker of the pool.
    PoolThread,
}

impl fmt::Display for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Executor::MainThread => write!(f, "Main thread"),
            Executor::PoolThread => write!(f, "Pool thread"),
        }
    }
}

/// Result of one segment, as handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentReport {
    /// The segment that was evaluated.
    pub segment: Segment,
    /// Its local min, max and integral.
    pub stats: SegmentStats,
    /// Main thread or pool thread.
    pub executor: Executor,
    /// Name (or id) of the thread that ran it.
    pub thread: String,
    /// Wall-clock time spent on the segment, in microseconds.
    pub elapsed_us: u64,
}

/// Result of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Configuration the run used.
    pub config: IntegrationConfig,
    /// Merged min, max and integral.
    pub aggregate: Aggregate,
    /// Number of segments merged.
    pub segments: usize,
    /// Wall-clock time of the whole run, in microseconds.
    pub elapsed_us: u64,
}

/// Receives reports as a run progresses. Implementations serialize their own output.
pub trait ReportSink: Send + Sync {
    /// Called once per finished segment, from whichever thread ran it.
    fn segment(&self, report: &SegmentReport) -> Result<()>;

    /// Called once at the end of a run.
    fn summary(&self, report: &RunReport) -> Result<()>;
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn segment(&self, _report: &SegmentReport) -> Result<()> {
        Ok(())
    }

    fn summary(&self, _report: &RunReport) -> Result<()> {
        Ok(())
    }
}

/// Writes plain-text reports to any writer, one whole report at a time.
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl WriterSink<io::Stdout> {
    /// A sink printing to stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> WriterSink<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Gives the writer back.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, W> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> ReportSink for WriterSink<W> {
    fn segment(&self, report: &SegmentReport) -> Result<()> {
        let text = format_segment(report);
        let mut writer = self.lock();
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn summary(&self, report: &RunReport) -> Result<()> {
        let text = format_summary(report);
        let mut writer = self.lock();
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    segments: Mutex<Vec<SegmentReport>>,
    summary: Mutex<Option<RunReport>>,
}

impl CollectingSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Segment reports in arrival order.
    pub fn segments(&self) -> Vec<SegmentReport> {
        self.segments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The summary, once the run has finished.
    pub fn run_report(&self) -> Option<RunReport> {
        self.summary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ReportSink for CollectingSink {
    fn segment(&self, report: &SegmentReport) -> Result<()> {
        self.segments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }

    fn summary(&self, report: &RunReport) -> Result<()> {
        *self.summary.lock().unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        Ok(())
    }
}

/// Text block printed for one segment.
pub fn format_segment(report: &SegmentReport) -> String {
    format!(
        "{}\n{} ({})\nProcessed range: [{}, {}]\nmin = {:.6}\nmax = {:.6}\nintegral = {:.6}\nelapsed: {} us\n",
        SEGMENT_DELIMITER,
        report.executor,
        report.thread,
        report.segment.left,
        report.segment.right,
        report.stats.min,
        report.stats.max,
        report.stats.integral,
        report.elapsed_us,
    )
}

/// Text block printed at the end of a run.
pub fn format_summary(report: &RunReport) -> String {
    format!(
        "{}\nFinal result:\nmin = {:.6}\nmax = {:.6}\nintegral = {:.6}\ntotal elapsed: {} us\n",
        SUMMARY_DELIMITER,
        report.aggregate.min,
        report.aggregate.max,
        report.aggregate.integral,
        report.elapsed_us,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment_report() -> SegmentReport {
        SegmentReport {
            segment: Segment {
                index: 3,
                left: -2.5,
                right: 5.0,
                steps: 250,
            },
            stats: SegmentStats {
                min: -1.0,
                max: 2.0 / 3.0,
                integral: 12.0,
            },
            executor: Executor::PoolThread,
            thread: "segint-worker-1".to_string(),
            elapsed_us: 42,
        }
    }

    #[test]
    fn segment_text() {
        let text = format_segment(&segment_report());
        assert!(text.starts_with(SEGMENT_DELIMITER));
        assert!(text.contains("Pool thread (segint-worker-1)"));
        assert!(text.contains("Processed range: [-2.5, 5]"));
        assert!(text.contains("min = -1.000000"));
        assert!(text.contains("max = 0.666667"));
        assert!(text.contains("integral = 12.000000"));
        assert!(text.contains("elapsed: 42 us"));
    }

    #[test]
    fn writer_sink_writes_whole_blocks() {
        let sink = WriterSink::new(Vec::new());
        sink.segment(&segment_report()).unwrap();
        sink.segment(&segment_report()).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out.matches(SEGMENT_DELIMITER).count(), 2);
        assert_eq!(out, format_segment(&segment_report()).repeat(2));
    }

    #[test]
    fn summary_text() {
        let report = RunReport {
            config: IntegrationConfig::default(),
            aggregate: Aggregate {
                min: 0.0,
                max: 3.0,
                integral: 6.0,
            },
            segments: 4,
            elapsed_us: 7,
        };
        let text = format_summary(&report);
        assert!(text.contains("Final result:"));
        assert!(text.contains("min = 0.000000"));
        assert!(text.contains("max = 3.000000"));
        assert!(text.contains("integral = 6.000000"));
        assert!(text.contains("total elapsed: 7 us"));
    }

    #[test]
    fn collecting_sink_keeps_reports() {
        let sink = CollectingSink::new();
        assert!(sink.run_report().is_none());
        sink.segment(&segment_report()).unwrap();
        assert_eq!(sink.segments(), vec![segment_report()]);
    }
}
