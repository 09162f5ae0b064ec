//! Per-client token bucket.
//!
//! Clients poll the leaderboard, chat and unread counter every few seconds
//! from every open tab, so the bucket is sized for steady polling and only
//! trips on runaway loops.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::config::ServerConfig;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_seen: Instant,
}

impl Bucket {
    fn full(burst: f64) -> Self {
        Self {
            tokens: burst,
            last_seen: Instant::now(),
        }
    }

    fn take(&mut self, per_sec: f64, burst: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_seen).as_secs_f64();
        self.last_seen = now;
        self.tokens = (self.tokens + elapsed * per_sec).min(burst);

        if self.tokens < 1.0 {
            return false;
        }
        self.tokens -= 1.0;
        true
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<IpAddr, Bucket>>>,
    per_sec: f64,
    burst: f64,
    trusted_proxies: Arc<[IpAddr]>,
}

impl RateLimiter {
    pub fn new(per_sec: f64, burst: f64) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            per_sec,
            burst,
            trusted_proxies: Arc::from(Vec::<IpAddr>::new()),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.rate_limit_per_sec, config.rate_limit_burst)
            .with_trusted_proxies(config.trusted_proxies.clone())
    }

    /// Believe forwarding headers only when the socket peer is one of `proxies`.
    pub fn with_trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = proxies.into();
        self
    }

    /// Spend one token for `ip`. Returns `false` when the bucket is empty.
    pub async fn allow(&self, ip: IpAddr) -> bool {
        let mut buckets = self.buckets.lock().await;
        buckets
            .entry(ip)
            .or_insert_with(|| Bucket::full(self.burst))
            .take(self.per_sec, self.burst)
    }

    /// Forget clients that have been quiet for longer than `max_idle`.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        buckets.retain(|_, bucket| bucket.last_seen.elapsed() < max_idle);
        before - buckets.len()
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(ip) = client_ip(&req, &limiter.trusted_proxies) {
        if !limiter.allow(ip).await {
            warn!(ip = %ip, path = %req.uri().path(), "Rate limit exceeded");
            return Err(StatusCode::TOO_MANY_REQUESTS);
        }
    }

    Ok(next.run(req).await)
}

/// The socket peer identifies the client.  Forwarding headers replace it
/// only when the peer is a trusted proxy.
fn client_ip<B>(req: &Request<B>, trusted_proxies: &[IpAddr]) -> Option<IpAddr> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip())?;

    if !trusted_proxies.contains(&peer) {
        return Some(peer);
    }

    let header_ip = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for")
        .or_else(|| header_ip("x-real-ip"))
        .or(Some(peer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use std::net::SocketAddr;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_burst_then_reject() {
        let limiter = RateLimiter::new(0.001, 3.0);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.allow(ip).await);
        }
        assert!(!limiter.allow(ip).await);
    }

    #[tokio::test]
    async fn test_clients_have_separate_buckets() {
        let limiter = RateLimiter::new(0.001, 1.0);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.allow(a).await);
        assert!(!limiter.allow(a).await);
        assert!(limiter.allow(b).await);
    }

    #[tokio::test]
    async fn test_evict_idle() {
        let limiter = RateLimiter::new(1.0, 5.0);
        let ip: IpAddr = "192.168.1.1".parse().unwrap();
        assert!(limiter.allow(ip).await);

        assert_eq!(limiter.evict_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(limiter.evict_idle(Duration::ZERO).await, 1);
        assert!(limiter.buckets.lock().await.is_empty());
    }

    fn request_from(peer: &str, forwarded_for: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/tasks");
        if let Some(value) = forwarded_for {
            builder = builder.header("x-forwarded-for", value);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        let addr: SocketAddr = format!("{peer}:40000").parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        req
    }

    #[test]
    fn test_client_ip_uses_peer_unless_proxy_is_trusted() {
        let req = request_from("192.0.2.1", Some("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_ip(&req, &[]), Some("192.0.2.1".parse().unwrap()));

        let proxy: IpAddr = "192.0.2.1".parse().unwrap();
        assert_eq!(
            client_ip(&req, &[proxy]),
            Some("203.0.113.7".parse().unwrap())
        );

        let req = request_from("192.0.2.1", None);
        assert_eq!(client_ip(&req, &[proxy]), Some(proxy));

        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .body(())
            .unwrap();
        assert_eq!(client_ip(&req, &[]), None);
    }

    #[tokio::test]
    async fn test_rotating_forwarded_header_shares_one_bucket() {
        let limiter = RateLimiter::new(0.001, 1.0);
        let app = Router::new()
            .route("/api/tasks", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                limiter.clone(),
                rate_limit_middleware,
            ));

        let mut statuses = Vec::new();
        for i in 1..=5 {
            let req = request_from("192.0.2.1", Some(&format!("198.51.100.{i}")));
            statuses.push(app.clone().oneshot(req).await.unwrap().status());
        }

        assert_eq!(statuses[0], StatusCode::OK);
        assert!(statuses[1..]
            .iter()
            .all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(limiter.buckets.lock().await.len(), 1);
    }
}
