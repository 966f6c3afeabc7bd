use std::time::Duration;

use rand::Rng;

/// Exponential backoff with full jitter (§4.4, §9): `sleep = random(0,
/// base*2^attempt)`, capped at `cap`. `attempt` is zero-based (the delay
/// before the *first* retry uses `attempt = 0`).
///
/// Full jitter (rather than deterministic backoff) is used deliberately to
/// avoid a thundering herd of retries against a source that just recovered.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub factor: u32,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy {
            base: Duration::from_secs(1),
            factor: 2,
            cap: Duration::from_secs(30),
            max_attempts: 3,
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.factor.saturating_pow(attempt);
        let upper = self.base.saturating_mul(exp).min(self.cap);
        if upper.is_zero() {
            return Duration::ZERO;
        }
        let jittered_nanos = rand::thread_rng().gen_range(0..=upper.as_nanos().max(1));
        Duration::from_nanos(jittered_nanos.min(u64::MAX as u128) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_never_exceeds_cap() {
        let policy = BackoffPolicy::default();
        for attempt in 0..10 {
            let delay = policy.delay_for_attempt(attempt);
            assert!(delay <= policy.cap);
        }
    }

    #[test]
    fn zero_base_never_sleeps() {
        let policy = BackoffPolicy {
            base: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
    }
}
