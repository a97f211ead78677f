//! Rate limiting primitives for auth flows.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_MAX_REQUESTS: u32 = 100;
const DEFAULT_WINDOW_SECONDS: u64 = 15 * 60;

#[derive(Clone, Copy, Debug)]
pub enum RateLimitAction {
    Register,
    VerifyEmail,
    Login,
    OauthLogin,
    ForgotPassword,
    ResetPassword,
    RefreshToken,
    Logout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

pub trait RateLimiter: Send + Sync {
    fn check_ip(&self, ip: Option<&str>, action: RateLimitAction) -> RateLimitDecision;
    fn check_email(&self, email: &str, action: RateLimitAction) -> RateLimitDecision;
}

#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check_ip(&self, _ip: Option<&str>, _action: RateLimitAction) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }

    fn check_email(&self, _email: &str, _action: RateLimitAction) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }
}

struct WindowCounter {
    window_start: Instant,
    count: u32,
}

/// In-process fixed-window limiter: one window per client key shared across
/// all auth routes, 100 requests per 15 minutes by default.
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    counters: Mutex<HashMap<String, WindowCounter>>,
}

impl FixedWindowRateLimiter {
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            counters: Mutex::new(HashMap::new()),
        }
    }

    fn check(&self, key: &str) -> RateLimitDecision {
        // A poisoned lock fails open.
        let Ok(mut counters) = self.counters.lock() else {
            return RateLimitDecision::Allowed;
        };
        let now = Instant::now();

        // Purge stale windows when a new key arrives so the map stays bounded.
        if !counters.contains_key(key) {
            let window = self.window;
            counters.retain(|_, counter| now.duration_since(counter.window_start) < window);
        }

        let counter = counters.entry(key.to_string()).or_insert(WindowCounter {
            window_start: now,
            count: 0,
        });
        if now.duration_since(counter.window_start) >= self.window {
            counter.window_start = now;
            counter.count = 0;
        }
        if counter.count >= self.max_requests {
            return RateLimitDecision::Limited;
        }
        counter.count += 1;
        RateLimitDecision::Allowed
    }
}

impl Default for FixedWindowRateLimiter {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_REQUESTS,
            Duration::from_secs(DEFAULT_WINDOW_SECONDS),
        )
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check_ip(&self, ip: Option<&str>, _action: RateLimitAction) -> RateLimitDecision {
        // No client IP means no key to count against; allow.
        match ip {
            Some(ip) => self.check(&format!("ip:{ip}")),
            None => RateLimitDecision::Allowed,
        }
    }

    fn check_email(&self, email: &str, _action: RateLimitAction) -> RateLimitDecision {
        self.check(&format!("email:{email}"))
    }
}
