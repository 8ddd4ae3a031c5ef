use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Names written in Cyrillic script: words separated by single spaces,
/// hyphens or apostrophes.
pub const CYRILLIC_NAME_PATTERN: &str = r"^\p{Cyrillic}+(?:[ '\-]\p{Cyrillic}+)*$";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Public API listener.
    pub bind_addr: SocketAddr,
    /// Admin API listener. Treat as a privileged network boundary.
    pub admin_bind_addr: SocketAddr,
    pub db_path: PathBuf,
    /// Initial dataset. A missing file skips seeding.
    pub seed_file: Option<PathBuf>,
    /// How long to wait for another process to release the database lock.
    pub lock_timeout_ms: u64,
    pub rate_limit: RateLimitConfig,
    pub schema: SchemaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            admin_bind_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            db_path: PathBuf::from("/data/rsvp.redb"),
            seed_file: None,
            lock_timeout_ms: 1_000,
            rate_limit: RateLimitConfig::default(),
            schema: SchemaConfig::default(),
        }
    }
}

/// Per-client token bucket settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Steady-state refill rate in requests per second.
    pub rps: f64,
    /// Bucket capacity.
    pub burst: u32,
    /// Clients unseen for this long are forgotten.
    pub idle_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    /// Take the client address from `X-Forwarded-For`. Only enable behind a
    /// proxy that sets it.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rps: 1.0,
            burst: 10,
            idle_ttl_secs: 180,
            sweep_interval_secs: 60,
            trust_forwarded_for: false,
        }
    }
}

impl RateLimitConfig {
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Request contract for the public accept endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Maximum entries in `additional`, independent of any invite's allowance.
    pub max_additional: usize,
    /// Regular expression every guest name must match.
    pub name_pattern: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            max_additional: 5,
            name_pattern: CYRILLIC_NAME_PATTERN.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration: defaults, then the optional TOML file, then the
    /// process environment.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML configuration file.
    pub fn from_file(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("reading {}: {e}", path.display())))?;
        toml::from_str(&text)
            .map_err(|e| ServerError::Config(format!("parsing {}: {e}", path.display())))
    }

    /// Apply `PORT`, `ADMIN_PORT`, `DB_PATH`, `SEED_FILE`, `RATE_LIMIT_RPS`
    /// and `RATE_LIMIT_BURST` overrides. Empty or unparseable values leave
    /// the current setting in place.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(port) = get("PORT").and_then(|v| v.parse().ok()) {
            self.bind_addr.set_port(port);
        }
        if let Some(port) = get("ADMIN_PORT").and_then(|v| v.parse().ok()) {
            self.admin_bind_addr.set_port(port);
        }
        if let Some(path) = get("DB_PATH") {
            self.db_path = PathBuf::from(path);
        }
        if let Some(path) = get("SEED_FILE") {
            self.seed_file = Some(PathBuf::from(path));
        }
        if let Some(rps) = get("RATE_LIMIT_RPS").and_then(|v| v.parse().ok()) {
            self.rate_limit.rps = rps;
        }
        if let Some(burst) = get("RATE_LIMIT_BURST").and_then(|v| v.parse().ok()) {
            self.rate_limit.burst = burst;
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
