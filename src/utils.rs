use std::time::{Duration, Instant};

/// Logs the time spent in `l_step` since `_elapsed` and returns the new elapsed mark.
pub(crate) fn trace(l_type: &str, l_step: &str, start: Instant, _elapsed: Duration) -> Duration {
    log::trace!("{} | Total={:.2?} | {}={:.2?}", l_type, start.elapsed(), l_step, start.elapsed() - _elapsed);
    start.elapsed()
}
