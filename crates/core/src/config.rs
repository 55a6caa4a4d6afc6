use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub ingest: IngestConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CINEDB_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CINEDB_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            ingest: IngestConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:  host={}, port={}", self.server.host, self.server.port);
        tracing::info!(
            "  ingest:  batch_size={}, batch_delay_ms={}, bulk_max_items={}",
            self.ingest.batch_size,
            self.ingest.batch_delay_ms,
            self.ingest.bulk_max_items
        );
    }

    /// Return a view safe for API responses and the `config` subcommand.
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": {
                "host": self.server.host,
                "port": self.server.port,
                "cors_origin": self.server.cors_origin,
            },
            "ingest": {
                "batch_size": self.ingest.batch_size,
                "batch_delay_ms": self.ingest.batch_delay_ms,
                "bulk_max_items": self.ingest.bulk_max_items,
            },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 5000),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── Bulk ingestion ────────────────────────────────────────────

/// Tuning for the bulk ingestion queue and the endpoint that feeds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Records handed to the store per sink call.
    pub batch_size: usize,
    /// Pause between consecutive batches while a backlog remains.
    pub batch_delay_ms: u64,
    /// Upper bound on records accepted by a single bulk request.
    pub bulk_max_items: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay_ms: 50,
            bulk_max_items: 100,
        }
    }
}

impl IngestConfig {
    fn from_env_profiled(p: &str) -> Self {
        let defaults = Self::default();
        Self {
            batch_size: profiled_env_usize(p, "QUEUE_BATCH_SIZE", defaults.batch_size).max(1),
            batch_delay_ms: profiled_env_u64(p, "QUEUE_BATCH_DELAY_MS", defaults.batch_delay_ms),
            bulk_max_items: profiled_env_usize(p, "BULK_MAX_ITEMS", defaults.bulk_max_items),
        }
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own profile prefix so parallel tests don't collide.

    #[test]
    fn test_ingest_defaults() {
        let cfg = IngestConfig::from_env_profiled("CINEDB_TEST_DEFAULTS");
        assert_eq!(cfg.batch_size, 10);
        assert_eq!(cfg.batch_delay_ms, 50);
        assert_eq!(cfg.bulk_max_items, 100);
        assert_eq!(cfg.batch_delay(), Duration::from_millis(50));
    }

    #[test]
    fn test_profiled_override() {
        env::set_var("CINEDB_TEST_PROFILED_QUEUE_BATCH_SIZE", "25");
        env::set_var("CINEDB_TEST_PROFILED_QUEUE_BATCH_DELAY_MS", "0");
        let cfg = IngestConfig::from_env_profiled("CINEDB_TEST_PROFILED");
        assert_eq!(cfg.batch_size, 25);
        assert_eq!(cfg.batch_delay_ms, 0);
    }

    #[test]
    fn test_zero_batch_size_clamped() {
        env::set_var("CINEDB_TEST_ZERO_QUEUE_BATCH_SIZE", "0");
        let cfg = IngestConfig::from_env_profiled("CINEDB_TEST_ZERO");
        assert_eq!(cfg.batch_size, 1);
    }

    #[test]
    fn test_unparseable_value_falls_back() {
        env::set_var("CINEDB_TEST_GARBAGE_BULK_MAX_ITEMS", "lots");
        let cfg = IngestConfig::from_env_profiled("CINEDB_TEST_GARBAGE");
        assert_eq!(cfg.bulk_max_items, 100);
    }

    #[test]
    fn test_profile_label() {
        let cfg = Config::for_profile("");
        assert_eq!(cfg.profile_label(), "default");
        let cfg = Config::for_profile("staging");
        assert_eq!(cfg.profile_label(), "STAGING");
    }

    #[test]
    fn test_redacted_summary_shape() {
        let cfg = Config::for_profile("CINEDB_TEST_SUMMARY");
        let summary = cfg.redacted_summary();
        assert!(summary["server"]["port"].is_number());
        assert!(summary["ingest"]["batch_size"].is_number());
    }
}
