use std::sync::Arc;
use std::time::Duration;

use comicdex_core::{Auth, ConcurrencyGate, RateLimiter, Scanner, Updater};

/// Shared state threaded through every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Auth>,
    pub scanner: Arc<Scanner>,
    pub updater: Arc<Updater>,
    pub rate_limiter: Arc<RateLimiter>,
    pub concurrency_gate: Arc<ConcurrencyGate>,
    pub scan_timeout: Duration,
    pub scan_limit: usize,
}

/// User role required for admin-only endpoints such as `/update`.
pub const ROLE_ADMIN: i64 = 2;
/// User role required for ordinary query endpoints such as `/pics`.
pub const ROLE_USER: i64 = 1;
