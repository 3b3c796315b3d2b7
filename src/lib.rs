#![deny(missing_docs)]
//! Min, max and rectangle-rule integral of a function over an interval, computed
//! segment by segment on a worker pool

#[macro_use]
extern crate log;

mod error;
mod function;
/// Segment integration
pub mod integrate;
/// Report sinks
pub mod report;
/// Thread Pool
pub mod thread_pool;

pub use error::{Result, SegintError};
pub use function::{piecewise, DomainFn};
pub use integrate::{
    Aggregate, IntegrationConfig, IntegrationContext, Integrator, RemainderPolicy, Segment,
    SegmentStats, SegmentTask,
};
pub use report::{
    CollectingSink, Executor, NullSink, ReportSink, RunReport, SegmentReport, WriterSink,
};
