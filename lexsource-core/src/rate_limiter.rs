use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use lexsource_actors::KillSwitch;

/// A token-bucket gate shared by every Fetcher (and Discovery's pagination,
/// §4.5) of one source (§4.2). `acquire()` suspends the caller until a
/// token is available, or returns `Err(Cancelled)` without consuming one if
/// the shared `KillSwitch` fires first.
///
/// Fairness is FIFO: `tokio::sync::Semaphore` hands permits to waiters in
/// the order they called `acquire`, so there are no priority lanes.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    requests_per_second: f64,
    stopped: Arc<AtomicBool>,
}

#[derive(Clone, Copy, Debug, thiserror::Error, PartialEq, Eq)]
#[error("rate limiter acquire was cancelled")]
pub struct Cancelled;

impl RateLimiter {
    /// `requests_per_second = 0` yields a bucket with zero capacity: every
    /// `acquire()` suspends forever until cancelled (§8 boundary: "Rate
    /// limit with R=0 blocks all fetches until cancelled").
    pub fn new(requests_per_second: f64) -> Self {
        let capacity = requests_per_second.max(0.0).ceil() as usize;
        let semaphore = Arc::new(Semaphore::new(capacity));
        let stopped = Arc::new(AtomicBool::new(false));

        if requests_per_second > 0.0 {
            let refill_interval = Duration::from_secs_f64(1.0 / requests_per_second);
            let semaphore = semaphore.clone();
            let stopped = stopped.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(refill_interval.max(Duration::from_millis(1)));
                loop {
                    ticker.tick().await;
                    if stopped.load(Ordering::Acquire) {
                        return;
                    }
                    if semaphore.available_permits() < capacity {
                        semaphore.add_permits(1);
                    }
                }
            });
        }

        RateLimiter {
            semaphore,
            capacity,
            requests_per_second,
            stopped,
        }
    }

    pub fn requests_per_second(&self) -> f64 {
        self.requests_per_second
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn acquire(&self, kill_switch: &KillSwitch) -> Result<(), Cancelled> {
        tokio::select! {
            biased;
            _ = kill_switch.wait() => Err(Cancelled),
            permit = self.semaphore.acquire() => {
                permit.expect("the rate limiter's semaphore is never closed").forget();
                Ok(())
            }
        }
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_succeeds_immediately_up_to_capacity() {
        let limiter = RateLimiter::new(2.0);
        let kill_switch = KillSwitch::default();
        assert!(limiter.acquire(&kill_switch).await.is_ok());
        assert!(limiter.acquire(&kill_switch).await.is_ok());
    }

    #[tokio::test]
    async fn zero_rps_blocks_until_cancelled() {
        let limiter = RateLimiter::new(0.0);
        let kill_switch = KillSwitch::default();
        let killer = kill_switch.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            killer.kill();
        });
        let result = tokio::time::timeout(Duration::from_secs(1), limiter.acquire(&kill_switch))
            .await
            .expect("acquire should return once cancelled, not hang forever");
        assert_eq!(result, Err(Cancelled));
    }

    #[tokio::test]
    async fn refill_eventually_admits_more_than_capacity() {
        let limiter = RateLimiter::new(50.0);
        let kill_switch = KillSwitch::default();
        for _ in 0..60 {
            tokio::time::timeout(Duration::from_secs(2), limiter.acquire(&kill_switch))
                .await
                .expect("refill should keep admitting requests")
                .unwrap();
        }
    }
}
