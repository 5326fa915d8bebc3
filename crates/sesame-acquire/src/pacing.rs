//! Frame pacing with drop-not-delay semantics: a late tick is never made up.

use sesame_core::FrameRate;
use std::time::{Duration, Instant};

/// Time left in the current period, or `None` if the tick already overran.
pub fn pacing_delay(started_at: Instant, period: Duration, now: Instant) -> Option<Duration> {
    let elapsed = now.saturating_duration_since(started_at);
    period.checked_sub(elapsed).filter(|d| !d.is_zero())
}

/// Block until one period at `target_rate_hz` has passed since `started_at`.
/// The rate is clamped into the supported range. Returns the time slept.
pub fn wait_to_pace(started_at: Instant, target_rate_hz: f64) -> Duration {
    let period = FrameRate::clamped(target_rate_hz).period();
    match pacing_delay(started_at, period, Instant::now()) {
        Some(remaining) => {
            std::thread::sleep(remaining);
            remaining
        }
        None => Duration::ZERO,
    }
}
