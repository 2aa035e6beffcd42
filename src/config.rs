//! Configuration loader for the `agromet-dashboard` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Values are read through a lookup function so the
//! parsing can be exercised without touching the process environment.
//!
use std::{env, time::Duration};

use anyhow::{anyhow, Result};

use crate::models::QueryParams;

/// Parse an optional environment variable into `$ty` with a default value.
macro_rules! parse_env {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string environment variable with a default value.
macro_rules! env_or {
    ($lookup:expr, $var_name:expr, $default:expr) => {
        $lookup($var_name).unwrap_or_else(|| $default.to_string())
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Base URL of the weather/prediction API.
    pub upstream_url: String,

    /// Port the dashboard listens on.
    pub port: u16,

    /// Upstream request timeout.
    pub http_timeout: Duration,

    /// Point and horizon used for the startup prefetch.
    pub default_params: QueryParams,

    /// Submit `default_params` to every page at startup.
    pub prefetch_on_start: bool,
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `UPSTREAM_API_URL` – weather/prediction API (default: `http://localhost:8000`)
/// - `DASHBOARD_PORT` – listen port (default: 8080)
/// - `HTTP_TIMEOUT_SECS` – upstream timeout (default: 30)
/// - `DEFAULT_LATITUDE` / `DEFAULT_LONGITUDE` – default point (default: Dakar)
/// - `DEFAULT_HORIZON_DAYS` – 3, 7 or 14 (default: 7)
/// - `PREFETCH_ON_START` – `true`/`false` (default: true)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    load_with(|name| env::var(name).ok())
}

/// Load configuration from an arbitrary variable lookup.
pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
    // ---
    let upstream_url = env_or!(lookup, "UPSTREAM_API_URL", "http://localhost:8000");
    let port = parse_env!(lookup, "DASHBOARD_PORT", u16, 8080);
    let timeout_secs = parse_env!(lookup, "HTTP_TIMEOUT_SECS", u64, 30);
    let latitude = parse_env!(lookup, "DEFAULT_LATITUDE", f64, 14.7167);
    let longitude = parse_env!(lookup, "DEFAULT_LONGITUDE", f64, -17.4677);
    let horizon_days = parse_env!(lookup, "DEFAULT_HORIZON_DAYS", u32, 7);
    let prefetch_on_start = parse_env!(lookup, "PREFETCH_ON_START", bool, true);

    if upstream_url.trim().is_empty() {
        return Err(anyhow!("UPSTREAM_API_URL must not be empty"));
    }

    let default_params = QueryParams::new(latitude, longitude, horizon_days)
        .map_err(|e| anyhow!("Invalid default query parameters: {}", e))?;

    Ok(Config {
        upstream_url,
        port,
        http_timeout: Duration::from_secs(timeout_secs),
        default_params,
        prefetch_on_start,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  UPSTREAM_API_URL   : {}", self.upstream_url);
        tracing::info!("  DASHBOARD_PORT     : {}", self.port);
        tracing::info!("  HTTP_TIMEOUT_SECS  : {}", self.http_timeout.as_secs());
        tracing::info!("  DEFAULT_PARAMS     : {}", self.default_params);
        tracing::info!("  PREFETCH_ON_START  : {}", self.prefetch_on_start);
    }
}
