//! Per-client cooldown for anonymous write endpoints.

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

/// Accepts one request per `(spam key, client ip)` within the timeout window.
pub struct SpamGuard {
    limiter: Option<DefaultKeyedRateLimiter<(String, String)>>,
    timeout_seconds: u64,
}

impl SpamGuard {
    /// A zero timeout disables the guard.
    #[must_use]
    pub fn new(timeout_seconds: u64) -> Self {
        let limiter = Quota::with_period(Duration::from_secs(timeout_seconds))
            .map(|quota| quota.allow_burst(NonZeroU32::MIN))
            .map(RateLimiter::keyed);

        Self {
            limiter,
            timeout_seconds,
        }
    }

    /// Returns `false` while the client is still cooling down.
    pub fn check(&self, spam_key: &str, ip: &str) -> bool {
        let Some(limiter) = &self.limiter else {
            return true;
        };
        limiter
            .check_key(&(spam_key.to_string(), ip.to_string()))
            .is_ok()
    }

    #[must_use]
    pub fn message(&self) -> String {
        format!("Try again in {} seconds", self.timeout_seconds)
    }

    /// Drops keys whose window has passed.
    pub fn prune(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.retain_recent();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_request_is_rejected_per_key_and_ip() {
        let guard = SpamGuard::new(30);
        assert!(guard.check("help", "10.0.0.1"));
        assert!(!guard.check("help", "10.0.0.1"));

        assert!(guard.check("rightholder", "10.0.0.1"));
        assert!(guard.check("help", "10.0.0.2"));
        assert_eq!(guard.message(), "Try again in 30 seconds");
    }

    #[test]
    fn zero_timeout_disables() {
        let guard = SpamGuard::new(0);
        assert!(guard.check("help", "ip"));
        assert!(guard.check("help", "ip"));
    }
}
