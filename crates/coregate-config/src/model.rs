//! Configuration schema.

use crate::ConfigError;
use coregate_core::Backend;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Top-level gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Listen address
    #[serde(default)]
    pub server: ServerConfig,
    /// Downstream core services
    pub backends: Vec<BackendConfig>,
    /// Path-prefix routing rules, evaluated before any other strategy
    #[serde(default)]
    pub routes: Vec<RouteRule>,
    /// Authentication settings
    pub auth: AuthConfig,
    /// Health monitoring settings
    #[serde(default)]
    pub health: HealthConfig,
    /// Forwarding settings
    #[serde(default)]
    pub forward: ForwardConfig,
    /// Metrics retention settings
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl GatewayConfig {
    /// Semantic validation beyond what serde enforces.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] on the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backends.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one backend must be configured".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for backend in &self.backends {
            if !names.insert(backend.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate backend name: {}",
                    backend.name
                )));
            }
            if backend.url.cannot_be_a_base() {
                return Err(ConfigError::Invalid(format!(
                    "backend {} has a non-base URL: {}",
                    backend.name, backend.url
                )));
            }
        }

        for rule in &self.routes {
            if !names.contains(rule.backend.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "route prefix {} references unknown backend {}",
                    rule.prefix, rule.backend
                )));
            }
            if !rule.prefix.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "route prefix must start with '/': {}",
                    rule.prefix
                )));
            }
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.health.opportunistic_probability) {
            return Err(ConfigError::Invalid(format!(
                "health.opportunistic_probability must be in [0, 1], got {}",
                self.health.opportunistic_probability
            )));
        }

        if self.metrics.capacity == 0 {
            return Err(ConfigError::Invalid(
                "metrics.capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Backend descriptors in configuration order.
    #[must_use]
    pub fn backend_descriptors(&self) -> Vec<Backend> {
        self.backends
            .iter()
            .map(|b| Backend {
                name: b.name.clone(),
                url: b.url.clone(),
                health_check: b.health_check.clone(),
                weight: b.weight,
            })
            .collect()
    }
}

/// Listen address configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// One configured backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Stable unique name
    pub name: String,
    /// Absolute base URL
    pub url: Url,
    /// Health-check path
    #[serde(default = "default_health_check")]
    pub health_check: String,
    /// Relative weight (placeholder, not applied by selection)
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_health_check() -> String {
    "/health".to_string()
}

fn default_weight() -> u32 {
    1
}

/// Path-prefix to backend-name mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRule {
    /// Path prefix, e.g. `/api/v1`
    pub prefix: String,
    /// Name of the target backend
    pub backend: String,
}

/// Authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for token signing. Override with `COREGATE_JWT_SECRET`.
    pub jwt_secret: String,
    /// Token lifetime from issue
    #[serde(default = "default_token_ttl", with = "humantime_serde")]
    pub token_ttl: Duration,
    /// Session inactivity timeout
    #[serde(default = "default_session_timeout", with = "humantime_serde")]
    pub session_timeout: Duration,
}

fn default_token_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_session_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

/// Health monitoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Interval between background sweeps
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
    /// Per-probe timeout
    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub probe_timeout: Duration,
    /// Probability that a forwarded request also triggers a sweep
    #[serde(default = "default_opportunistic_probability")]
    pub opportunistic_probability: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            probe_timeout: default_probe_timeout(),
            opportunistic_probability: default_opportunistic_probability(),
        }
    }
}

fn default_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_opportunistic_probability() -> f64 {
    0.1
}

/// Forwarding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardConfig {
    /// Bound on the full request/response cycle against a backend
    #[serde(default = "default_forward_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            timeout: default_forward_timeout(),
        }
    }
}

fn default_forward_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Metrics retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Ring buffer capacity; oldest outcomes are evicted past this
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    1000
}
