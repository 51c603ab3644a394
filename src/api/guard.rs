//! Request guards: bot user agents, origin restriction and a per-IP rate
//! limit on mutating requests.

use std::collections::VecDeque;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use moka::sync::Cache;

use crate::api::{error_response, ApiState};
use crate::config::GuardConfig;

pub const BOT_DETECTED: &str = "Forbidden: Bot detected.";
pub const ACCESS_DENIED: &str = "Access denied. Public API access is blocked.";
pub const RATE_LIMITED: &str = "Too many requests from this IP.";

const MAX_TRACKED_IPS: u64 = 100_000;

/// Sliding-window request counter keyed by client IP.
///
/// Entries idle for a whole window are evicted by the cache, so clients that
/// stop sending requests do not stay in memory.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: Cache<IpAddr, Arc<Mutex<VecDeque<Instant>>>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .field("tracked_ips", &self.hits.entry_count())
            .finish()
    }
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        let hits = Cache::builder()
            .max_capacity(MAX_TRACKED_IPS)
            .time_to_idle(window)
            .build();
        Self {
            max_requests,
            window,
            hits,
        }
    }

    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new(
            config.rate_limit_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        )
    }

    /// Record a request from `ip` at `now`. Returns false when the IP is over
    /// budget; rejected requests are not counted.
    pub fn check(&self, ip: IpAddr, now: Instant) -> bool {
        let entry = self
            .hits
            .get_with(ip, || Arc::new(Mutex::new(VecDeque::new())));
        let mut recent = match entry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        while let Some(&oldest) = recent.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                recent.pop_front();
            } else {
                break;
            }
        }
        if recent.len() >= self.max_requests {
            return false;
        }
        recent.push_back(now);
        true
    }

    /// Number of client IPs currently held, after pending evictions run.
    pub fn tracked_ips(&self) -> u64 {
        self.hits.run_pending_tasks();
        self.hits.entry_count()
    }
}

pub fn is_bot(headers: &HeaderMap, blocked: &[String]) -> bool {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    blocked.iter().any(|fragment| user_agent.contains(fragment.as_str()))
}

/// True when no origins are configured, or the request's `Origin` matches
/// one exactly, or its `Referer` starts with one.
pub fn origin_allowed(headers: &HeaderMap, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    let referer = headers.get(header::REFERER).and_then(|v| v.to_str().ok());
    allowed.iter().any(|a| {
        origin == Some(a.as_str()) || referer.is_some_and(|r| r.starts_with(a.as_str()))
    })
}

fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::DELETE)
}

fn client_ip(request: &Request) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

pub async fn request_guard(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    if is_bot(request.headers(), &state.guard.blocked_user_agents) {
        tracing::warn!(
            user_agent = ?request.headers().get(header::USER_AGENT),
            path = %request.uri().path(),
            "Blocked bot request"
        );
        return error_response(StatusCode::FORBIDDEN, BOT_DETECTED);
    }

    if !origin_allowed(request.headers(), &state.guard.allowed_origins) {
        tracing::warn!(path = %request.uri().path(), "Blocked request from disallowed origin");
        return error_response(StatusCode::FORBIDDEN, ACCESS_DENIED);
    }

    if is_mutating(request.method()) {
        match client_ip(&request) {
            Some(ip) => {
                if !state.rate_limiter.check(ip, Instant::now()) {
                    tracing::warn!(ip = %ip, "Rate limit exceeded");
                    return error_response(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED);
                }
            }
            None => tracing::debug!("No client address on request, rate limit skipped"),
        }
    }

    next.run(request).await
}
