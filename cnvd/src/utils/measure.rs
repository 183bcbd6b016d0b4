//! Measuring the time of operations

use std::time::{Duration, Instant};

/// Logs the elapsed wall-clock time of a named operation when dropped.
pub struct MeasureTime {
    operation: &'static str,
    start: Instant,
}

impl MeasureTime {
    pub fn new(operation: &'static str) -> Self {
        log::debug!("{operation} started");
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for MeasureTime {
    fn drop(&mut self) {
        log::info!(
            "{} took {}",
            self.operation,
            humantime::format_duration(truncate(self.start.elapsed()))
        );
    }
}

/// Truncate to full seconds, sub-second noise is not worth reporting.
fn truncate(duration: Duration) -> Duration {
    Duration::from_secs(duration.as_secs())
}
