// SPDX-License-Identifier: MIT OR Apache-2.0
//! Token-bucket rate limiting keyed by `(scope, identity)`.
//!
//! Buckets refill lazily on access; nothing runs in the background. The map
//! is guarded by a single mutex and every touch is O(1) with no I/O under
//! the lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// Scopes
// ---------------------------------------------------------------------------

/// Rate-limit scope. Each scope carries its own budget and window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateScope {
    /// Pre-auth login attempts, keyed by remote address.
    Login,
    /// Pre-auth OAuth redirects, keyed by remote address.
    Oauth,
    /// Authenticated reads (GET).
    ApiRead,
    /// Authenticated mutations (POST/PUT/PATCH/DELETE).
    ApiMutation,
    /// Discovery snapshot composition.
    Discovery,
}

impl RateScope {
    /// Requests allowed per window.
    #[must_use]
    pub fn limit(&self) -> u32 {
        match self {
            Self::Login => 5,
            Self::Oauth => 10,
            Self::ApiRead => 300,
            Self::ApiMutation => 60,
            Self::Discovery => 10,
        }
    }

    /// Window the budget refills over.
    #[must_use]
    pub fn window(&self) -> Duration {
        match self {
            Self::Login | Self::Oauth => Duration::from_secs(15 * 60),
            Self::ApiRead | Self::ApiMutation | Self::Discovery => Duration::from_secs(60),
        }
    }

    /// Stable scope tag for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Oauth => "oauth",
            Self::ApiRead => "api-read",
            Self::ApiMutation => "api-mutation",
            Self::Discovery => "discovery",
        }
    }
}

// ---------------------------------------------------------------------------
// Limiter
// ---------------------------------------------------------------------------

/// Outcome of one rate check, including what the response headers report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// The scope's configured budget.
    pub limit: u32,
    /// Whole tokens left after this request.
    pub remaining: u32,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Shared token-bucket limiter.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<(RateScope, String), Bucket>>>,
}

impl RateLimiter {
    /// Create an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Take one token from `(scope, identity)`, refilling lazily first.
    pub async fn check(&self, scope: RateScope, identity: &str) -> RateDecision {
        let limit = scope.limit();
        let window = scope.window();
        let now = Instant::now();

        let mut buckets = self.buckets.lock().await;
        let bucket = buckets
            .entry((scope, identity.to_string()))
            .or_insert(Bucket {
                tokens: f64::from(limit),
                last_refill: now,
            });

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let refill = elapsed.as_secs_f64() * f64::from(limit) / window.as_secs_f64();
        bucket.tokens = (bucket.tokens + refill).min(f64::from(limit));
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            RateDecision {
                allowed: true,
                limit,
                remaining: bucket.tokens.floor() as u32,
            }
        } else {
            RateDecision {
                allowed: false,
                limit,
                remaining: 0,
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_up_to_limit_then_denied() {
        let limiter = RateLimiter::new();
        for i in 0..RateScope::Login.limit() {
            let decision = limiter.check(RateScope::Login, "10.0.0.1").await;
            assert!(decision.allowed, "request {i} should pass");
        }
        let denied = limiter.check(RateScope::Login, "10.0.0.1").await;
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.limit, 5);
    }

    #[tokio::test]
    async fn identities_do_not_share_buckets() {
        let limiter = RateLimiter::new();
        for _ in 0..RateScope::Login.limit() {
            limiter.check(RateScope::Login, "10.0.0.1").await;
        }
        let other = limiter.check(RateScope::Login, "10.0.0.2").await;
        assert!(other.allowed);
    }

    #[tokio::test]
    async fn scopes_do_not_share_buckets() {
        let limiter = RateLimiter::new();
        for _ in 0..RateScope::Discovery.limit() {
            limiter.check(RateScope::Discovery, "alice").await;
        }
        assert!(!limiter.check(RateScope::Discovery, "alice").await.allowed);
        assert!(limiter.check(RateScope::ApiRead, "alice").await.allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn tokens_refill_lazily_over_the_window() {
        let limiter = RateLimiter::new();
        for _ in 0..RateScope::Discovery.limit() {
            limiter.check(RateScope::Discovery, "alice").await;
        }
        assert!(!limiter.check(RateScope::Discovery, "alice").await.allowed);

        // A tenth of the window buys one token back (10/min scope).
        tokio::time::advance(Duration::from_secs(6)).await;
        let decision = limiter.check(RateScope::Discovery, "alice").await;
        assert!(decision.allowed);
        assert!(!limiter.check(RateScope::Discovery, "alice").await.allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn refill_never_exceeds_limit() {
        let limiter = RateLimiter::new();
        limiter.check(RateScope::ApiMutation, "alice").await;
        tokio::time::advance(Duration::from_secs(3600)).await;
        let decision = limiter.check(RateScope::ApiMutation, "alice").await;
        assert_eq!(decision.remaining, RateScope::ApiMutation.limit() - 1);
    }

    #[test]
    fn scope_budgets_match_contract() {
        assert_eq!(RateScope::Login.limit(), 5);
        assert_eq!(RateScope::Oauth.limit(), 10);
        assert_eq!(RateScope::ApiRead.limit(), 300);
        assert_eq!(RateScope::ApiMutation.limit(), 60);
        assert_eq!(RateScope::Discovery.limit(), 10);
        assert_eq!(RateScope::Login.window(), Duration::from_secs(900));
        assert_eq!(RateScope::ApiRead.window(), Duration::from_secs(60));
    }
}
