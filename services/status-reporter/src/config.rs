//! Configuration for the status reporter.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use statusrep_reconcile::ExponentialBackoff;

/// Default root of the status directory.
pub const DEFAULT_STATUS_DIR: &str = "/var/run/statusrep/endpoint-status";

/// Status reporter configuration (env-driven).
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory; marker files live in its `policy` subdirectory.
    pub status_dir: PathBuf,

    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Retry backoff between failed reconcile passes.
    pub backoff: ExponentialBackoff,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            status_dir: PathBuf::from(DEFAULT_STATUS_DIR),
            log_level: "info".to_string(),
            backoff: ExponentialBackoff::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let status_dir = lookup("STATUSREP_STATUS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.status_dir);

        let log_level = lookup("STATUSREP_LOG_LEVEL").unwrap_or(defaults.log_level);

        let base_ms: u64 = parse_var(&lookup, "STATUSREP_BACKOFF_BASE_MS", 50)?;
        let factor: f64 = parse_var(&lookup, "STATUSREP_BACKOFF_FACTOR", 10.0)?;
        let steps: u32 = parse_var(&lookup, "STATUSREP_BACKOFF_STEPS", 3)?;
        let cap_ms: u64 = parse_var(&lookup, "STATUSREP_BACKOFF_CAP_MS", 5000)?;
        let jitter: f64 = parse_var(&lookup, "STATUSREP_BACKOFF_JITTER", 0.0)?;

        if !factor.is_finite() || (factor != 0.0 && factor < 1.0) {
            anyhow::bail!("STATUSREP_BACKOFF_FACTOR must be 0 (no growth) or at least 1.");
        }
        if !jitter.is_finite() || jitter < 0.0 {
            anyhow::bail!("STATUSREP_BACKOFF_JITTER must be a non-negative number.");
        }

        let backoff = ExponentialBackoff {
            duration: Duration::from_millis(base_ms),
            factor,
            jitter,
            steps,
            cap: Duration::from_millis(cap_ms.max(base_ms)),
        };

        Ok(Self {
            status_dir,
            log_level,
            backoff,
        })
    }
}

fn parse_var<L, T>(lookup: &L, key: &str, default: T) -> Result<T>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|v| v.trim().parse())
        .transpose()
        .with_context(|| format!("{key} must be a number."))
        .map(|v| v.unwrap_or(default))
}
