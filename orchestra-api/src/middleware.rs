//! Per-address rate limiting middleware
//!
//! Every client address gets its own governor limiter holding
//! `rate_limit_max` cells that refill evenly across `rate_limit_window`.
//! Requests beyond the quota receive 429 with a `retry-after` header.
//!
//! The address is the TCP peer unless `trust_proxy_headers` is set. A
//! limiter left idle for a whole window is full again, so those are swept
//! from the map every [`RATE_LIMIT_SWEEP_EVERY`] requests.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use governor::{clock::DefaultClock, Quota, RateLimiter};

use crate::config::ApiConfig;
use crate::constants::RATE_LIMIT_SWEEP_EVERY;
use crate::error::ApiError;

/// Type alias for the rate limiter we use.
type DirectRateLimiter =
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, DefaultClock>;

struct ClientLimiter {
    limiter: Arc<DirectRateLimiter>,
    last_seen: Instant,
}

/// State for rate limiting middleware.
#[derive(Clone)]
pub struct RateLimitState {
    config: Arc<ApiConfig>,
    /// One limiter per client address
    limiters: Arc<DashMap<IpAddr, ClientLimiter>>,
    requests: Arc<AtomicU64>,
}

impl RateLimitState {
    /// Create new rate limit state from API configuration.
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config: Arc::new(config),
            limiters: Arc::new(DashMap::new()),
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Drop limiters not used for a whole window. Returns how many went.
    pub fn evict_idle(&self) -> usize {
        let window = self.config.rate_limit_window;
        let before = self.limiters.len();
        self.limiters.retain(|_, client| client.last_seen.elapsed() < window);
        before.saturating_sub(self.limiters.len())
    }

    fn sweep_if_due(&self) {
        let seen = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        if seen % RATE_LIMIT_SWEEP_EVERY == 0 {
            let evicted = self.evict_idle();
            tracing::debug!(
                evicted,
                tracked = self.limiters.len(),
                "Swept idle rate limiters"
            );
        }
    }

    /// Number of addresses seen so far.
    pub fn tracked_clients(&self) -> usize {
        self.limiters.len()
    }

    fn quota(&self) -> Quota {
        let max = NonZeroU32::new(self.config.rate_limit_max).unwrap_or(NonZeroU32::MIN);
        match Quota::with_period(self.config.rate_limit_window / max.get()) {
            Some(quota) => quota.allow_burst(max),
            None => Quota::per_second(max),
        }
    }

    fn limiter_for(&self, ip: IpAddr) -> Arc<DirectRateLimiter> {
        let mut client = self.limiters.entry(ip).or_insert_with(|| ClientLimiter {
            limiter: Arc::new(RateLimiter::direct(self.quota())),
            last_seen: Instant::now(),
        });
        client.last_seen = Instant::now();
        client.limiter.clone()
    }
}

/// Error type for rate limit middleware.
#[derive(Debug)]
pub struct RateLimitError {
    /// Seconds until the next request would be admitted
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut response = ApiError::too_many_requests(Some(self.retry_after)).into_response();
        response.headers_mut().insert(
            HeaderName::from_static("retry-after"),
            HeaderValue::from_str(&self.retry_after.to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("60")),
        );
        response
    }
}

/// Extract the client IP a request is limited under.
///
/// Proxy headers are read only when `trust_proxy_headers` is set; a client
/// talking to the server directly could otherwise pick its own key. Falls
/// back to the connection address when the server was started with connect
/// info, and to `0.0.0.0` otherwise (in-process test harnesses).
pub fn extract_client_ip(request: &Request, trust_proxy_headers: bool) -> IpAddr {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_ip(request) {
            return ip;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn forwarded_ip(request: &Request) -> Option<IpAddr> {
    // X-Forwarded-For can contain multiple IPs, take the first one
    if let Some(first_ip) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
    {
        if let Ok(ip) = first_ip.trim().parse() {
            return Some(ip);
        }
    }

    if let Some(real_ip) = request
        .headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
    {
        if let Ok(ip) = real_ip.trim().parse() {
            return Some(ip);
        }
    }

    None
}

/// Rate limiting middleware.
///
/// When rate limited, returns 429 Too Many Requests with Retry-After header.
/// Admitted responses carry `x-ratelimit-limit`.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    if !state.config.rate_limit_enabled {
        return Ok(next.run(request).await);
    }

    let ip = extract_client_ip(&request, state.config.trust_proxy_headers);
    let limiter = state.limiter_for(ip);
    state.sweep_if_due();

    match limiter.check() {
        Ok(_) => {
            let mut response = next.run(request).await;
            response.headers_mut().insert(
                HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from_str(&state.config.rate_limit_max.to_string())
                    .unwrap_or_else(|_| HeaderValue::from_static("100")),
            );
            Ok(response)
        }
        Err(not_until) => {
            let retry_after = not_until
                .wait_time_from(governor::clock::Clock::now(&DefaultClock::default()))
                .as_secs()
                .max(1);

            tracing::warn!(client_ip = %ip, retry_after, "Rate limit exceeded");
            Err(RateLimitError { retry_after })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{self, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use std::time::Duration;
    use tower::ServiceExt;

    fn limited_config(max: u32, trust_proxy_headers: bool) -> ApiConfig {
        ApiConfig {
            rate_limit_max: max,
            rate_limit_window: Duration::from_secs(900),
            trust_proxy_headers,
            ..ApiConfig::default()
        }
    }

    fn app_with(state: RateLimitState) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(state, rate_limit_middleware))
    }

    fn request_from(ip: &str) -> Request {
        http::Request::builder()
            .uri("/")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_requests_beyond_quota_are_rejected() {
        let app = app_with(RateLimitState::new(limited_config(2, true)));

        for _ in 0..2 {
            let response = app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()["x-ratelimit-limit"], "2");
        }

        let response = app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = response.headers()["retry-after"]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(retry_after >= 1);
    }

    #[tokio::test]
    async fn test_trusted_proxy_addresses_are_limited_independently() {
        let app = app_with(RateLimitState::new(limited_config(1, true)));

        let first = app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let other = app.clone().oneshot(request_from("10.0.0.2")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
        let again = app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
        assert_eq!(again.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_rotating_forwarded_header_does_not_reset_quota() {
        let state = RateLimitState::new(limited_config(2, false));
        let app = app_with(state.clone());

        let mut admitted = 0;
        for i in 0..20 {
            let response = app
                .clone()
                .oneshot(request_from(&format!("203.0.113.{}", i)))
                .await
                .unwrap();
            if response.status() == StatusCode::OK {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 2);
        assert_eq!(state.tracked_clients(), 1);
    }

    #[tokio::test]
    async fn test_idle_limiters_are_evicted() {
        let state = RateLimitState::new(ApiConfig {
            rate_limit_window: Duration::from_millis(40),
            ..limited_config(1, true)
        });
        let app = app_with(state.clone());

        for ip in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            app.clone().oneshot(request_from(ip)).await.unwrap();
        }
        assert_eq!(state.tracked_clients(), 3);
        assert_eq!(state.evict_idle(), 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        app.clone().oneshot(request_from("10.0.0.4")).await.unwrap();

        assert_eq!(state.evict_idle(), 3);
        assert_eq!(state.tracked_clients(), 1);
    }

    #[tokio::test]
    async fn test_disabled_limiter_admits_everything() {
        let state = RateLimitState::new(ApiConfig {
            rate_limit_max: 1,
            ..ApiConfig::unlimited()
        });
        let app = app_with(state.clone());

        for _ in 0..5 {
            let response = app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(state.tracked_clients(), 0);
    }

    #[test]
    fn test_proxy_headers_only_read_when_trusted() {
        let request = http::Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_client_ip(&request, true).to_string(), "203.0.113.7");
        assert_eq!(extract_client_ip(&request, false), IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        let request = http::Request::builder()
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_client_ip(&request, true).to_string(), "198.51.100.2");
    }

    #[test]
    fn test_peer_address_is_used_without_trust() {
        let mut request = request_from("203.0.113.9");
        let peer: SocketAddr = "192.0.2.10:51000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(extract_client_ip(&request, false).to_string(), "192.0.2.10");
        assert_eq!(extract_client_ip(&request, true).to_string(), "203.0.113.9");
    }
}
