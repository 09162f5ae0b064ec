//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use monkey_shared::constants::{
    DEFAULT_DELETE_QUORUM, DEFAULT_HTTP_PORT, DEFAULT_MESSAGE_LIST_LIMIT,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`, or `PORT` to keep the default interface.
    /// Default: `0.0.0.0:3000`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `None` (platform data directory).
    pub database_path: Option<PathBuf>,

    /// Distinct votes needed to delete a task.
    /// Env: `DELETE_QUORUM` (>= 1)
    /// Default: `3`
    pub delete_quorum: usize,

    /// Number of most recent messages returned by the chatroom listing.
    /// Env: `MESSAGE_LIST_LIMIT` (>= 1)
    /// Default: `100`
    pub message_list_limit: usize,

    /// Sustained requests per second allowed per client IP.
    /// Env: `RATE_LIMIT_PER_SEC`
    /// Default: `20`
    pub rate_limit_per_sec: f64,

    /// Burst size of the per-IP token bucket.
    /// Env: `RATE_LIMIT_BURST`
    /// Default: `60`
    pub rate_limit_burst: f64,

    /// Peers whose `X-Forwarded-For` / `X-Real-IP` headers are believed when
    /// identifying the client for rate limiting.
    /// Env: `TRUSTED_PROXIES` (comma-separated IPs)
    /// Default: empty (headers are ignored)
    pub trusted_proxies: Vec<IpAddr>,

    /// Maximum request body size (profile pictures and chat images travel
    /// as data URIs).
    /// Env: `MAX_BODY_BYTES`
    /// Default: 10 MiB
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            delete_quorum: DEFAULT_DELETE_QUORUM,
            message_list_limit: DEFAULT_MESSAGE_LIST_LIMIT,
            rate_limit_per_sec: 20.0,
            rate_limit_burst: 60.0,
            trusted_proxies: Vec::new(),
            max_body_bytes: 10 * 1024 * 1024, // 10 MiB
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => config.http_addr.set_port(port),
                Err(_) => tracing::warn!(value = %port, "Invalid PORT, using default"),
            }
        }

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = lookup("DATABASE_PATH").filter(|p| !p.is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(n) = positive(&lookup, "DELETE_QUORUM") {
            config.delete_quorum = n;
        }

        if let Some(n) = positive(&lookup, "MESSAGE_LIST_LIMIT") {
            config.message_list_limit = n;
        }

        if let Some(n) = positive(&lookup, "MAX_BODY_BYTES") {
            config.max_body_bytes = n;
        }

        if let Some(rate) = positive_f64(&lookup, "RATE_LIMIT_PER_SEC") {
            config.rate_limit_per_sec = rate;
        }

        if let Some(burst) = positive_f64(&lookup, "RATE_LIMIT_BURST") {
            config.rate_limit_burst = burst;
        }

        if let Some(raw) = lookup("TRUSTED_PROXIES") {
            for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                match part.parse::<IpAddr>() {
                    Ok(ip) => config.trusted_proxies.push(ip),
                    Err(_) => {
                        tracing::warn!(value = %part, "Invalid TRUSTED_PROXIES entry, skipping")
                    }
                }
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

fn positive(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let raw = lookup(key)?;
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(key, value = %raw, "expected a positive integer, using default");
            None
        }
    }
}

fn positive_f64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<f64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => Some(n),
        _ => {
            tracing::warn!(key, value = %raw, "expected a positive number, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> ServerConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 3000).into());
        assert_eq!(config.delete_quorum, 3);
        assert_eq!(config.message_list_limit, 100);
        assert!(config.database_path.is_none());
        assert!(config.trusted_proxies.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DATABASE_PATH", "/tmp/monkey.db"),
            ("DELETE_QUORUM", "5"),
            ("MESSAGE_LIST_LIMIT", "50"),
            ("RATE_LIMIT_BURST", "10"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/monkey.db")));
        assert_eq!(config.delete_quorum, 5);
        assert_eq!(config.message_list_limit, 50);
        assert_eq!(config.rate_limit_burst, 10.0);
    }

    #[test]
    fn test_trusted_proxies() {
        let config = from_pairs(&[("TRUSTED_PROXIES", "10.0.0.1, ::1,bogus,")]);
        assert_eq!(
            config.trusted_proxies,
            vec![
                "10.0.0.1".parse::<IpAddr>().unwrap(),
                "::1".parse::<IpAddr>().unwrap()
            ]
        );
    }

    #[test]
    fn test_port_only() {
        let config = from_pairs(&[("PORT", "8081")]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8081).into());
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("DELETE_QUORUM", "0"),
            ("MESSAGE_LIST_LIMIT", "-4"),
            ("RATE_LIMIT_PER_SEC", "fast"),
        ]);
        let defaults = ServerConfig::default();
        assert_eq!(config.http_addr, defaults.http_addr);
        assert_eq!(config.delete_quorum, defaults.delete_quorum);
        assert_eq!(config.message_list_limit, defaults.message_list_limit);
        assert_eq!(config.rate_limit_per_sec, defaults.rate_limit_per_sec);
    }
}
