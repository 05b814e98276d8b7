//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `PARSER_API_CONFIG`
//! environment variable. A missing file is not an error: every field has a default.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `PARSER_API_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `PARSER_API_LIMITS__MAX_FILE_SIZE=1000000` sets the `limits.max_file_size` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use parser_api::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 8081
//! limits:
//!   max_file_size: 50000000
//!   enforce_read_cap: false
//! fetch:
//!   timeout: 2m
//!   connect_timeout: 10s
//! enable_metrics: true
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "PARSER_API_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Size limits applied to downloaded files
    pub limits: LimitsConfig,
    /// Settings for the HTTP client that downloads files
    pub fetch: FetchConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// Download size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum file size in bytes, compared against the upstream `Content-Length`.
    /// Set to 0 for unlimited (not recommended for production).
    /// Default: 50,000,000
    pub max_file_size: u64,
    /// Also cap the number of bytes actually read from the response body.
    ///
    /// Without this, a response that omits `Content-Length` bypasses `max_file_size`.
    /// Default: false
    pub enforce_read_cap: bool,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50_000_000,
            enforce_read_cap: false,
        }
    }
}

/// HTTP client configuration for downloading files.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Timeout for the whole download, e.g. "2m". Unset means no timeout.
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Timeout for establishing the connection (default: 10s)
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// User-Agent header sent with each download
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            limits: LimitsConfig::default(),
            fetch: FetchConfig::default(),
            enable_metrics: true,
            enable_otel_export: false,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.host.trim().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: host cannot be empty".to_string(),
            });
        }

        if self.fetch.user_agent.trim().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: fetch.user_agent cannot be empty".to_string(),
            });
        }

        if self.fetch.connect_timeout.is_zero() {
            return Err(Error::Internal {
                operation: "Config validation: fetch.connect_timeout must be greater than zero".to_string(),
            });
        }

        if self.fetch.timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(Error::Internal {
                operation: "Config validation: fetch.timeout must be greater than zero when set".to_string(),
            });
        }

        if self.limits.enforce_read_cap && self.limits.max_file_size == 0 {
            return Err(Error::Internal {
                operation: "Config validation: limits.enforce_read_cap requires a non-zero limits.max_file_size".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables override specific values
            .merge(Env::prefixed("PARSER_API_").split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
