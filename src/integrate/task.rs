use std::{sync::Arc, thread, time::Instant};

use crate::integrate::{IntegrationContext, Segment};
use crate::report::{Executor, SegmentReport};

/// One segment's worth of work: evaluate, merge, report.
pub struct SegmentTask {
    segment: Segment,
    context: Arc<IntegrationContext>,
    executor: Executor,
}

impl SegmentTask {
    /// Creates a task for `segment` that will merge into `context`.
    pub fn new(segment: Segment, context: Arc<IntegrationContext>, executor: Executor) -> Self {
        Self {
            segment,
            context,
            executor,
        }
    }

    /// Runs the task on the current thread.
    ///
    /// The rectangle sum runs without any lock held; only the merge takes the aggregate
    /// lock, and the report is written after that lock is released.
    pub fn run(self) -> SegmentReport {
        let start = Instant::now();
        let function = self.context.function();
        let stats = self.segment.evaluate(&**function);
        self.context.merge(&stats);

        let current = thread::current();
        let report = SegmentReport {
            segment: self.segment,
            stats,
            executor: self.executor,
            thread: current
                .name()
                .map(String::from)
                .unwrap_or_else(|| format!("{:?}", current.id())),
            elapsed_us: start.elapsed().as_micros() as u64,
        };
        trace!(
            "segment {} merged on {}",
            report.segment.index,
            report.thread
        );
        if let Err(e) = self.context.sink().segment(&report) {
            warn!("failed to report segment {}: {}", report.segment.index, e);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrate::Aggregate;
    use crate::report::CollectingSink;

    #[test]
    fn run_merges_and_reports() {
        let sink = Arc::new(CollectingSink::new());
        let context = Arc::new(IntegrationContext::new(
            Arc::new(|x: f64| 2.0 * x),
            Aggregate::starting_at(0.0),
            sink.clone(),
        ));
        let segment = Segment {
            index: 1,
            left: 1.0,
            right: 2.0,
            steps: 2,
        };
        let report = SegmentTask::new(segment, Arc::clone(&context), Executor::MainThread).run();

        // 0.5 * (2.0 + 3.0)
        assert!((report.stats.integral - 2.5).abs() < 1e-12);
        assert_eq!(report.executor, Executor::MainThread);

        let agg = context.snapshot();
        assert_eq!(agg.min, 0.0);
        assert_eq!(agg.max, 3.0);
        assert!((agg.integral - 2.5).abs() < 1e-12);

        let reports = sink.segments();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].segment, segment);
    }
}
