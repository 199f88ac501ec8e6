use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::config;
use crate::error::ApiError;
use crate::state::AppState;

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request limiter keyed by client IP. Windows live in process
/// memory; restarting the server resets them.
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            window,
            max_requests,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config() -> Self {
        let api = &config::config().api;
        Self::new(
            api.rate_limit_requests,
            Duration::from_secs(api.rate_limit_window_secs),
        )
    }

    /// Record a hit. `Err` carries the seconds until the window resets.
    pub fn check(&self, ip: IpAddr, now: Instant) -> Result<(), u64> {
        let mut windows = self.windows.lock().unwrap();

        // Bound memory under address churn
        if windows.len() > 10_000 {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(ip).or_insert(Window { started: now, count: 0 });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        entry.count += 1;
        if entry.count > self.max_requests {
            let elapsed = now.duration_since(entry.started);
            let retry_after = self.window.saturating_sub(elapsed).as_secs().max(1);
            return Err(retry_after);
        }

        Ok(())
    }
}

pub async fn rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !config::config().api.enable_rate_limiting {
        return Ok(next.run(request).await);
    }

    state
        .limiter
        .check(addr.ip(), Instant::now())
        .map_err(|retry_after| {
            ApiError::too_many_requests("Too many requests, please slow down", retry_after)
        })?;

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip() -> IpAddr {
        "127.0.0.1".parse().unwrap()
    }

    #[test]
    fn allows_up_to_budget_then_rejects() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check(ip(), now).is_ok());
        assert!(limiter.check(ip(), now).is_ok());
        assert!(limiter.check(ip(), now).is_ok());

        let retry_after = limiter.check(ip(), now).unwrap_err();
        assert!(retry_after >= 1 && retry_after <= 60);
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check(ip(), start).is_ok());
        assert!(limiter.check(ip(), start).is_err());

        let later = start + Duration::from_secs(61);
        assert!(limiter.check(ip(), later).is_ok());
    }

    #[test]
    fn addresses_are_tracked_independently() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        let other: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(ip(), now).is_ok());
        assert!(limiter.check(ip(), now).is_err());
        assert!(limiter.check(other, now).is_ok());
    }
}
