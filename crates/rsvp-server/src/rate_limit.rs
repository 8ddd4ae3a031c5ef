use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::RateLimitConfig;
use crate::error::ApiError;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Token bucket for one client.
#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl Bucket {
    fn full(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
            last_seen: now,
        }
    }

    fn refill(&mut self, now: Instant, rate: f64, capacity: f64) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_refill = now;
    }
}

/// Per-client-IP token bucket limiter.
///
/// Each client starts with a full bucket of `burst` tokens that refills at
/// `rps` tokens per second. Clients unseen for `idle_ttl` are evicted by
/// [`RateLimiter::evict_idle`].
#[derive(Debug)]
pub struct RateLimiter {
    visitors: DashMap<IpAddr, Bucket>,
    rate: f64,
    capacity: f64,
    idle_ttl: Duration,
    trust_forwarded_for: bool,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            visitors: DashMap::new(),
            rate: config.rps.max(0.0),
            capacity: f64::from(config.burst),
            idle_ttl: config.idle_ttl(),
            trust_forwarded_for: config.trust_forwarded_for,
        }
    }

    /// Take a token for `ip`. Returns `false` when the bucket is empty.
    pub fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        let mut bucket = self
            .visitors
            .entry(ip)
            .or_insert_with(|| Bucket::full(self.capacity, now));
        bucket.refill(now, self.rate, self.capacity);
        bucket.last_seen = now;
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Forget clients idle for longer than the configured TTL. Returns how
    /// many were removed.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let before = self.visitors.len();
        self.visitors
            .retain(|_, bucket| now.duration_since(bucket.last_seen) <= self.idle_ttl);
        before.saturating_sub(self.visitors.len())
    }

    /// Number of tracked clients.
    pub fn tracked_clients(&self) -> usize {
        self.visitors.len()
    }

    /// Periodically evict idle clients until the task is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = limiter.evict_idle(Instant::now());
                if evicted > 0 {
                    debug!(evicted, "rate limiter evicted idle clients");
                }
            }
        })
    }

    /// Resolve the client address for `request`.
    pub fn client_ip(&self, request: &Request) -> IpAddr {
        if self.trust_forwarded_for {
            let forwarded = request
                .headers()
                .get(FORWARDED_FOR)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse().ok());
            if let Some(ip) = forwarded {
                return ip;
            }
        }
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

/// Middleware that answers 429 once a client's bucket is empty.
pub async fn limit_by_client_ip(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = limiter.client_ip(&request);
    if !limiter.check(ip) {
        warn!(client_ip = %ip, path = request.uri().path(), "rate limit exceeded");
        return ApiError::too_many_requests().into_response();
    }
    next.run(request).await
}
