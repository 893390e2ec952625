use std::{env, time::Duration};

use crate::use_cases::RetryPolicy;
use crate::use_cases::reservations::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS};

// Runtime settings read from the environment (and `.env` when present).

pub fn backend_url() -> String {
    env::var("BACKEND_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
}

// Optional credential cookie, e.g. `user_id=...`, attached to every call.
pub fn backend_cookie() -> Option<String> {
    env::var("BACKEND_COOKIE")
        .ok()
        .filter(|value| !value.trim().is_empty())
}

pub fn request_timeout() -> Duration {
    let millis = env::var("REQUEST_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(30_000);
    Duration::from_millis(millis)
}

pub fn reservation_retry_policy() -> RetryPolicy {
    let max_attempts = env::var("RESERVATION_MAX_ATTEMPTS")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(DEFAULT_MAX_ATTEMPTS);
    let initial_delay = env::var("RESERVATION_INITIAL_DELAY_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_INITIAL_DELAY);
    RetryPolicy {
        max_attempts,
        initial_delay,
    }
}

// Logical width reported with outside clicks from the terminal.
pub fn viewport_width() -> u32 {
    env::var("VIEWPORT_WIDTH")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(1024)
}

/// Everything the client needs to start, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub backend_url: String,
    pub backend_cookie: Option<String>,
    pub request_timeout: Duration,
    pub retry_policy: RetryPolicy,
    pub viewport_width: u32,
}

impl ClientSettings {
    pub fn from_env() -> Self {
        Self {
            backend_url: backend_url(),
            backend_cookie: backend_cookie(),
            request_timeout: request_timeout(),
            retry_policy: reservation_retry_policy(),
            viewport_width: viewport_width(),
        }
    }
}
