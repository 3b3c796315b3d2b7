use std::sync::Arc;

/// A pure scalar function shared by every segment of a run.
pub type DomainFn = Arc<dyn Fn(f64) -> f64 + Send + Sync + 'static>;

/// The piecewise function the `segint` binary integrates by default.
///
/// Linear below -20, a mix of sine and cosine on [-20, -5), and a quintic from -5 on.
pub fn piecewise(x: f64) -> f64 {
    if x < -20.0 {
        0.1 * x
    } else if x < -5.0 {
        0.5 * (0.25 * x).sin() + 2.2 * (0.01 * x).cos()
    } else {
        x.powi(5) - x.powi(4) + x.powi(2) - x + 1.0
    }
}
