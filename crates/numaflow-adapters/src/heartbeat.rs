//! In-flight heartbeat: keeps a long-processing message from being
//! redelivered by re-signalling "still working" to the broker before its
//! ack-wait window expires.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Tick interval for an in-flight heartbeat: two-thirds of the ack-wait
/// window, floored at one second. Per-tick heartbeats are suppressed
/// entirely when that floor would exceed the ack-wait window itself (an
/// ack-wait of one second or less leaves no room for a mid-flight nudge).
#[must_use]
pub fn tick_interval(ack_wait: Duration) -> Option<Duration> {
    if ack_wait <= Duration::from_secs(1) {
        return None;
    }
    let two_thirds = ack_wait.mul_f64(2.0 / 3.0);
    Some(two_thirds.max(Duration::from_secs(1)))
}

/// Spawn a background task that calls `nudge` on a fixed interval until the
/// returned token is cancelled. The caller must cancel it once the in-flight
/// message has been acked or abandoned; dropping the token without
/// cancelling leaves the heartbeat running until the parent task is itself
/// aborted.
pub fn spawn<F, Fut>(ack_wait: Duration, nudge: F) -> CancellationToken
where
    F: Fn() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<(), String>> + Send,
{
    let token = CancellationToken::new();
    let Some(interval) = tick_interval(ack_wait) else {
        return token;
    };

    let child = token.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately; discard it
        loop {
            tokio::select! {
                _ = child.cancelled() => {
                    debug!("in-flight heartbeat cancelled");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(err) = nudge().await {
                        warn!(error = %err, "in-flight heartbeat tick failed");
                    }
                }
            }
        }
    });

    token
}
