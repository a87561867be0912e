// Request pacing for remote classifiers.
//
// A caller only advances `next_slot` at the moment it is allowed through.
// Until then it sleeps until the currently reserved slot and checks again,
// holding no reservation. A waiter that gets cancelled (a classify timeout,
// a dropped request) therefore leaves nothing behind, and an idle limiter
// always lets the next caller straight through.

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

pub struct RateLimiter {
    interval: Duration,
    /// Earliest instant the next request may go out.
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Allow at most `requests_per_second` requests per second.
    pub fn new(requests_per_second: f64) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / requests_per_second),
            next_slot: Mutex::new(None),
        }
    }

    /// Wait until a request is allowed. Returns immediately when idle.
    pub async fn acquire(&self) {
        loop {
            let wait_until = {
                let mut next = self.next_slot.lock().await;
                let now = Instant::now();
                match *next {
                    Some(at) if at > now => at,
                    _ => {
                        *next = Some(now + self.interval);
                        return;
                    }
                }
            };
            tokio::time::sleep_until(wait_until).await;
        }
    }
}
