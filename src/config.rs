// src/config.rs

use std::env;
use std::sync::Arc;

use dotenvy::dotenv;

use crate::utils::client_ip::{ProxyHeader, parse_header_policy};

/// Default lifetime of an autosaved draft (roughly 69 days).
pub const DEFAULT_DRAFT_TTL_SECONDS: u64 = 6_000_000;

/// Key prefix for draft responses in the cache.
pub const DRAFT_KEY_PREFIX: &str = "response";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub rust_log: String,
    pub server_port: u16,
    pub draft_ttl_seconds: u64,
    /// Ordered list of proxy headers consulted when resolving the client address.
    pub proxy_headers: Arc<[ProxyHeader]>,
    /// When set, submissions after the quiz end time are rejected.
    pub enforce_end_time: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let server_port = env::var("SERVER_PORT")
            .ok()
            .map(|port| port.parse().expect("SERVER_PORT must be a valid port number"))
            .unwrap_or(3000);

        let draft_ttl_seconds = env::var("DRAFT_TTL_SECONDS")
            .ok()
            .map(|ttl| ttl.parse().expect("DRAFT_TTL_SECONDS must be a positive integer"))
            .unwrap_or(DEFAULT_DRAFT_TTL_SECONDS);

        let proxy_headers = match env::var("TRUSTED_PROXY_HEADERS") {
            Ok(raw) => parse_header_policy(&raw)
                .unwrap_or_else(|e| panic!("TRUSTED_PROXY_HEADERS is invalid: {}", e)),
            Err(_) => ProxyHeader::DEFAULT_ORDER.to_vec(),
        };

        let enforce_end_time = env::var("ENFORCE_QUIZ_END_TIME")
            .map(|flag| matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            database_url,
            redis_url,
            jwt_secret,
            rust_log,
            server_port,
            draft_ttl_seconds,
            proxy_headers: proxy_headers.into(),
            enforce_end_time,
        }
    }

    /// Configuration suitable for tests and local runs without an environment.
    pub fn for_local(jwt_secret: &str) -> Self {
        Self {
            database_url: String::new(),
            redis_url: None,
            jwt_secret: jwt_secret.to_string(),
            rust_log: "error".to_string(),
            server_port: 0,
            draft_ttl_seconds: DEFAULT_DRAFT_TTL_SECONDS,
            proxy_headers: ProxyHeader::DEFAULT_ORDER.to_vec().into(),
            enforce_end_time: false,
        }
    }
}
