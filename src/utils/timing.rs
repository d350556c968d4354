use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Upper bound on how long a cancellable sleep may overrun a stop request.
pub const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(50);

// Stand-in deadline for durations too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Sleep for `duration` unless `token` is cancelled first.
///
/// The wait is sliced into chunks of at most [`CANCEL_CHECK_INTERVAL`], and each
/// chunk also races the token, so a stop request is observed well within the bound.
/// Returns `true` if the full duration elapsed, `false` if cancelled.
pub async fn cancellable_sleep(duration: Duration, token: &CancellationToken) -> bool {
    let start = Instant::now();
    let end = start
        .checked_add(duration)
        .unwrap_or_else(|| start + FAR_FUTURE);
    loop {
        if token.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= end {
            return true;
        }
        let slice_end = (now + CANCEL_CHECK_INTERVAL).min(end);
        tokio::select! {
            _ = token.cancelled() => return false,
            _ = sleep_until(slice_end) => {}
        }
    }
}

/// Convert seconds (possibly fractional, possibly invalid) into a `Duration`.
/// Negative, NaN and infinite inputs map to zero.
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

/// Round a duration to whole milliseconds, expressed in seconds.
pub fn round_to_millis(d: Duration) -> f64 {
    let ms = (d.as_secs_f64() * 1000.0).round();
    ms / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn full_sleep_elapses() {
        let token = CancellationToken::new();
        let start = Instant::now();
        assert!(cancellable_sleep(Duration::from_millis(230), &token).await);
        assert_eq!(start.elapsed(), Duration::from_millis(230));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_sleep() {
        let token = CancellationToken::new();
        let child = token.clone();
        let start = Instant::now();
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            child.cancel();
        });
        assert!(!cancellable_sleep(Duration::from_secs(60), &token).await);
        assert!(start.elapsed() < Duration::from_millis(120) + CANCEL_CHECK_INTERVAL);
        stopper.await.unwrap();
    }

    #[test]
    fn rounding_and_conversion() {
        assert_eq!(round_to_millis(Duration::from_micros(1_234_567)), 1.235);
        assert_eq!(secs_to_duration(-1.0), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::NAN), Duration::ZERO);
        assert_eq!(secs_to_duration(0.25), Duration::from_millis(250));
    }
}
