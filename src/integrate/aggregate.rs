use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::function::DomainFn;
use crate::integrate::SegmentStats;
use crate::report::ReportSink;

/// Running min, max and integral reduced over every finished segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Smallest value seen so far.
    pub min: f64,
    /// Largest value seen so far.
    pub max: f64,
    /// Sum of the segment integrals merged so far.
    pub integral: f64,
}

impl Aggregate {
    /// Starting point of a run: min and max are the value at the left bound.
    pub fn starting_at(value: f64) -> Self {
        Self {
            min: value,
            max: value,
            integral: 0.0,
        }
    }

    /// Folds one segment in. Commutative and associative, so merge order does not matter.
    pub fn merge(&mut self, local: &SegmentStats) {
        if local.min < self.min {
            self.min = local.min;
        }
        if local.max > self.max {
            self.max = local.max;
        }
        self.integral += local.integral;
    }
}

/// State shared by every segment task of one run.
///
/// Owns the function, the aggregate behind its own lock, and the report sink.
/// Tasks hold it through an `Arc`, so it outlives all of them.
pub struct IntegrationContext {
    function: DomainFn,
    aggregate: Mutex<Aggregate>,
    sink: Arc<dyn ReportSink>,
}

impl IntegrationContext {
    /// Creates a context whose aggregate starts at `initial`.
    pub fn new(function: DomainFn, initial: Aggregate, sink: Arc<dyn ReportSink>) -> Self {
        Self {
            function,
            aggregate: Mutex::new(initial),
            sink,
        }
    }

    /// The function being integrated.
    pub fn function(&self) -> &DomainFn {
        &self.function
    }

    /// Where segment reports go.
    pub fn sink(&self) -> &dyn ReportSink {
        self.sink.as_ref()
    }

    /// Merges one segment into the aggregate under the aggregate lock.
    pub fn merge(&self, local: &SegmentStats) {
        self.aggregate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(local);
    }

    /// Copy of the current aggregate.
    pub fn snapshot(&self) -> Aggregate {
        *self.aggregate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
