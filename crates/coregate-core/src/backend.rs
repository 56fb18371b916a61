//! Backend descriptor for downstream core services.

use serde::{Deserialize, Serialize};
use url::Url;

/// Static description of one downstream core service the gateway can
/// forward requests to.
///
/// The descriptor itself is immutable for the lifetime of the process;
/// the live health flag is owned by the registry, not the descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backend {
    /// Stable unique name (registry key)
    pub name: String,

    /// Absolute base URL of the service
    pub url: Url,

    /// Health-check path, joined onto `url` when probing
    #[serde(default = "default_health_check")]
    pub health_check: String,

    /// Relative weight. Currently a placeholder: selection treats all
    /// backends as equal weight.
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_health_check() -> String {
    "/health".to_string()
}

fn default_weight() -> u32 {
    1
}

impl Backend {
    /// Create a backend descriptor.
    ///
    /// # Errors
    /// Returns [`crate::GatewayError::Internal`] if `url` is not a valid
    /// absolute URL.
    pub fn new(
        name: impl Into<String>,
        url: &str,
        health_check: impl Into<String>,
    ) -> Result<Self, crate::GatewayError> {
        let url = Url::parse(url)
            .map_err(|e| crate::GatewayError::Internal(format!("invalid backend url: {e}")))?;
        Ok(Self {
            name: name.into(),
            url,
            health_check: health_check.into(),
            weight: default_weight(),
        })
    }

    /// Full URL of the health-check endpoint.
    #[must_use]
    pub fn health_check_url(&self) -> String {
        join_path(&self.url, &self.health_check)
    }

    /// Full URL for a proxied request path (path may carry a query string).
    #[must_use]
    pub fn request_url(&self, path_and_query: &str) -> String {
        join_path(&self.url, path_and_query)
    }
}

/// Join a base URL and a path without doubling or dropping slashes.
fn join_path(base: &Url, path: &str) -> String {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
