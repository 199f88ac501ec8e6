use std::sync::Arc;

use sqlx::PgPool;

use crate::middleware::rate_limit::RateLimiter;
use crate::realtime::Hub;

/// Shared handles injected into every handler. Handlers and services receive
/// the store and the event hub through this state rather than reaching into
/// process-wide globals.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub hub: Arc<Hub>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(pool: PgPool, hub: Arc<Hub>) -> Self {
        Self {
            pool,
            hub,
            limiter: Arc::new(RateLimiter::from_config()),
        }
    }
}
