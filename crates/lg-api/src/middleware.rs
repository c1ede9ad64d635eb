//! lumen-gallery/crates/lg-api/src/middleware.rs Middleware
//!
//! Custom middleware for security, logging, and traffic control.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use lg_core::error::{AppError, Result};

// Returns a standard set of middleware for the Lumen-Gallery API.
pub fn standard_middleware() -> Logger {
    // The 'default' logger outputs:
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

// Configures CORS (Cross-Origin Resource Sharing)
// Important if the UI and API ever live on different subdomains.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_header()
        .allowed_methods(vec!["GET", "POST", "PATCH", "PUT", "DELETE"])
        .max_age(3600)
}

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket limiter for the auth endpoints, keyed per identity so one
/// account being hammered does not lock out everyone else.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    capacity: f64,
    refill_per_sec: f64,
}

impl RateLimiter {
    pub fn new(capacity: f64, refill_per_sec: f64) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            capacity,
            refill_per_sec,
        }
    }

    /// Takes one token for `key`, or fails with RateLimitExceeded once the
    /// bucket is drained.
    pub fn check(&self, key: &str) -> Result<()> {
        let now = Instant::now();
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let bucket = buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: self.capacity,
            last_refill: now,
        });
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            Err(AppError::RateLimitExceeded(
                "too many attempts, slow down".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_drains_per_key() {
        let limiter = RateLimiter::new(2.0, 0.0);
        assert!(limiter.check("login:a@example.com").is_ok());
        assert!(limiter.check("login:a@example.com").is_ok());
        assert!(matches!(
            limiter.check("login:a@example.com"),
            Err(AppError::RateLimitExceeded(_))
        ));
        // A different identity still has a full bucket.
        assert!(limiter.check("login:b@example.com").is_ok());
    }

    #[test]
    fn bucket_refills_over_time() {
        // One token per 20ms: back-to-back calls drain it, a pause refills it.
        let limiter = RateLimiter::new(1.0, 50.0);
        assert!(limiter.check("k").is_ok());
        assert!(limiter.check("k").is_err());
        std::thread::sleep(std::time::Duration::from_millis(40));
        assert!(limiter.check("k").is_ok());
    }
}
