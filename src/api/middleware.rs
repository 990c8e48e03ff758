//! API Middleware (Auth, Rate Limiting, Logging)

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::handlers::AppState;
use crate::models::config::ServerConfig;
use crate::models::errors::AppError;
use crate::store::Store;
use crate::utils::constants::DEFAULT_RATE_LIMIT;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per window
    pub requests_per_window: u32,
    pub window_duration: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: DEFAULT_RATE_LIMIT,
            window_duration: Duration::from_secs(60),
        }
    }
}

impl From<&ServerConfig> for RateLimitConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            requests_per_window: config.rate_limit,
            window_duration: config.rate_limit_window,
        }
    }
}

/// Fixed-window in-memory rate limiter keyed by user id or client address
pub struct RateLimiter {
    requests: DashMap<String, (u32, Instant)>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            requests: DashMap::new(),
            config,
        }
    }

    /// Check if request is allowed, returns (allowed, remaining, reset_seconds)
    pub fn check(&self, key: &str) -> (bool, u32, u64) {
        let now = Instant::now();

        let mut entry = self.requests.entry(key.to_string()).or_insert((0, now));

        // Reset window if expired
        if now.duration_since(entry.1) > self.config.window_duration {
            entry.0 = 0;
            entry.1 = now;
        }

        let reset_secs = self
            .config
            .window_duration
            .saturating_sub(now.duration_since(entry.1))
            .as_secs();

        if entry.0 >= self.config.requests_per_window {
            return (false, 0, reset_secs);
        }

        entry.0 += 1;
        let remaining = self.config.requests_per_window - entry.0;
        (true, remaining, reset_secs)
    }

    /// Drop windows that expired long ago; returns how many were removed
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.requests.len();
        self.requests.retain(|_, (_, started)| {
            now.duration_since(*started) < self.config.window_duration * 2
        });
        before.saturating_sub(self.requests.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.requests.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// Periodically prune the limiter's stale windows
pub fn start_cleanup_task(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let removed = state.rate_limiter.cleanup();
            if removed > 0 {
                debug!(removed, "Rate limiter cleanup");
            }
        }
    })
}

/// `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Bearer-token authentication; attaches the caller's `User` as an extension
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match bearer_token(request.headers()) {
        Some(token) => state.store.user_by_token(token),
        None => return AppError::unauthorized("Not authenticated").into_response(),
    };

    match user {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            warn!("Invalid bearer token attempted");
            AppError::unauthorized("Invalid token").into_response()
        }
    }
}

/// Limiter key: the caller's user id when the bearer token resolves,
/// otherwise the client address. Unknown tokens share the address
/// window, so guessing tokens or doctor codes is throttled like any
/// other anonymous traffic.
fn rate_key(store: &Store, headers: &HeaderMap) -> String {
    if let Some(user) = bearer_token(headers).and_then(|t| store.user_by_token(t)) {
        return format!("user:{}", user.id);
    }

    let ip = headers
        .get("X-Forwarded-For")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown");
    format!("ip:{}", ip)
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let key = rate_key(&state.store, request.headers());
    let (allowed, remaining, reset) = state.rate_limiter.check(&key);

    if !allowed {
        warn!(key = %key, "Rate limit exceeded");
        let mut response = AppError::rate_limited(reset).into_response();
        response.headers_mut().insert(header::RETRY_AFTER, reset.into());
        return response;
    }

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Remaining", remaining.into());
    headers.insert("X-RateLimit-Reset", reset.into());

    response
}

/// Request logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        "Request completed"
    );

    response
}
