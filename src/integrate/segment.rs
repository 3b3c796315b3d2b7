use serde::{Deserialize, Serialize};

use crate::integrate::{IntegrationConfig, RemainderPolicy};
use crate::{Result, SegintError};

/// A contiguous piece `[left, right)` of the integration interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Position of the segment in its partition, starting at zero.
    pub index: usize,
    /// Left edge, included.
    pub left: f64,
    /// Right edge.
    pub right: f64,
    /// Number of rectangles used on this segment.
    pub steps: usize,
}

/// Min, max and integral of the function over one segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentStats {
    /// Smallest sampled value.
    pub min: f64,
    /// Largest sampled value.
    pub max: f64,
    /// Left-endpoint rectangle sum.
    pub integral: f64,
}

impl Segment {
    /// Width of the segment.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Evaluates the segment with the left-endpoint rectangle rule.
    ///
    /// Samples `left + i * dx` for `i` in `0..steps`. Min and max start from `f(left)`.
    /// NaN samples are not filtered.
    pub fn evaluate<F>(&self, f: F) -> SegmentStats
    where
        F: Fn(f64) -> f64,
    {
        let dx = self.width() / self.steps as f64;
        let first = f(self.left);
        let mut stats = SegmentStats {
            min: first,
            max: first,
            integral: 0.0,
        };
        for i in 0..self.steps {
            let y = f(self.left + i as f64 * dx);
            if y < stats.min {
                stats.min = y;
            }
            if y > stats.max {
                stats.max = y;
            }
            stats.integral += y * dx;
        }
        stats
    }
}

/// Splits `[config.left, config.right]` into `config.segments` equal-width segments.
///
/// Adjacent segments share their boundary value exactly and the last one ends exactly at
/// `config.right`. Steps are handed out according to `config.remainder`; every segment must
/// end up with at least one step.
pub fn partition(config: &IntegrationConfig) -> Result<Vec<Segment>> {
    let IntegrationConfig {
        left,
        right,
        segments,
        total_steps,
        remainder,
    } = *config;

    if !left.is_finite() || !right.is_finite() {
        return Err(SegintError::InvalidConfig(format!(
            "interval bounds must be finite, got [{}, {}]",
            left, right
        )));
    }
    if left >= right {
        return Err(SegintError::InvalidConfig(format!(
            "left bound {} must be smaller than right bound {}",
            left, right
        )));
    }
    if segments == 0 {
        return Err(SegintError::InvalidConfig(
            "segment count must be at least 1".to_string(),
        ));
    }

    let base = total_steps / segments;
    let extra = total_steps % segments;
    if extra != 0 && remainder == RemainderPolicy::Strict {
        return Err(SegintError::InvalidConfig(format!(
            "{} steps do not divide evenly into {} segments",
            total_steps, segments
        )));
    }
    if base == 0 {
        return Err(SegintError::InvalidConfig(format!(
            "{} steps are not enough for {} segments",
            total_steps, segments
        )));
    }
    if extra != 0 && remainder == RemainderPolicy::Truncate {
        warn!("dropping {} remainder steps", extra);
    }

    let span = right - left;
    if !span.is_finite() {
        return Err(SegintError::InvalidConfig(format!(
            "interval [{}, {}] is too wide",
            left, right
        )));
    }
    let width = span / segments as f64;
    let edge = |i: usize| {
        if i == 0 {
            left
        } else if i == segments {
            right
        } else {
            left + i as f64 * width
        }
    };
    let parts = (0..segments)
        .map(|i| {
            let steps = match remainder {
                RemainderPolicy::Distribute if i < extra => base + 1,
                _ => base,
            };
            Segment {
                index: i,
                left: edge(i),
                right: edge(i + 1),
                steps,
            }
        })
        .collect();
    debug!(
        "partitioned [{}, {}] into {} segments of width {}",
        left, right, segments, width
    );
    Ok(parts)
}
