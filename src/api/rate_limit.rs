//! Per-client request throttling
//!
//! Fixed-window counters keyed by client address: a client may make at most
//! `max_requests` requests per `window`. Expired windows are pruned inline
//! once the table grows past a threshold; there is no background sweeper.

use actix_web::HttpRequest;
use log::warn;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::api::error::ApiError;
use crate::config::RateLimitConfig;

const PRUNE_THRESHOLD: usize = 1024;

/// Outcome of a rate limit check
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    RateLimited { retry_after: Duration },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    clients: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    /// Build a limiter from configuration. A zero window is treated as one second.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            window: Duration::from_secs(config.delay_in_seconds.max(1)),
            max_requests: config.max_requests_per_second,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// A limiter that lets everything through
    pub fn disabled() -> Self {
        Self::new(&RateLimitConfig {
            delay_in_seconds: 1,
            max_requests_per_second: 0,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.max_requests > 0
    }

    pub fn check(&self, client: &str) -> RateLimitResult {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> RateLimitResult {
        if !self.is_enabled() {
            return RateLimitResult::Allowed;
        }

        let mut clients = self.clients.lock();
        if clients.len() > PRUNE_THRESHOLD {
            let window = self.window;
            clients.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = clients.entry(client.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count < self.max_requests {
            entry.count += 1;
            RateLimitResult::Allowed
        } else {
            let retry_after = self.window.saturating_sub(now.duration_since(entry.started));
            RateLimitResult::RateLimited { retry_after }
        }
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.clients.lock().len()
    }
}

/// Identify the client by peer IP
pub fn client_key(req: &HttpRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Reject the request if its client exhausted the current window
pub fn enforce(req: &HttpRequest, limiter: &RateLimiter) -> Result<(), ApiError> {
    let client = client_key(req);
    match limiter.check(&client) {
        RateLimitResult::Allowed => Ok(()),
        RateLimitResult::RateLimited { retry_after } => {
            warn!("Rate limit exceeded for client {} on {}", client, req.path());
            Err(ApiError::RateLimited { retry_after })
        }
    }
}
