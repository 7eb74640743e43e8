use anyhow::{Context, Result};
use enrichment_core::{
    SourceCredentials, BENZINGA_API_KEY_VAR, BENZINGA_EDGE_API_KEY_VAR, POLYGON_API_KEY_VAR,
};
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Client timeout applied to every provider call.
    pub upstream_timeout: Duration,
    /// Symbols in flight per batch; unbounded when `None`.
    pub max_concurrency: Option<usize>,
    pub credentials: SourceCredentials,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Provider keys are optional here and
    /// checked when a batch is requested.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let upstream_timeout_secs: u64 = read("UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|| DEFAULT_UPSTREAM_TIMEOUT_SECS.to_string())
            .parse()
            .context("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?;

        let max_concurrency = read("ENRICH_MAX_CONCURRENCY")
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("ENRICH_MAX_CONCURRENCY must be a positive integer")?
            .filter(|n| *n > 0);

        Ok(Self {
            bind_addr: read("API_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
            max_concurrency,
            credentials: SourceCredentials {
                polygon_api_key: read(POLYGON_API_KEY_VAR),
                benzinga_api_key: read(BENZINGA_API_KEY_VAR),
                benzinga_edge_api_key: read(BENZINGA_EDGE_API_KEY_VAR),
            },
        })
    }
}
