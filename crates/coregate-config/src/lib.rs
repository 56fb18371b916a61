//! # Coregate Config
//!
//! Configuration loading and validation for the Coregate proxy gateway.
//!
//! Configuration is read from a YAML or TOML file (selected by file
//! extension) and validated before the gateway starts: backend names
//! must be unique, backend URLs absolute, and every route rule must
//! reference a configured backend. The JWT secret can be overridden
//! with the `COREGATE_JWT_SECRET` environment variable so it never has
//! to live in the config file.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod model;

pub use error::ConfigError;
pub use model::{
    AuthConfig, BackendConfig, ForwardConfig, GatewayConfig, HealthConfig, MetricsConfig,
    RouteRule, ServerConfig,
};

use std::path::Path;
use tracing::info;

/// Environment variable overriding `auth.jwt_secret`.
pub const JWT_SECRET_ENV: &str = "COREGATE_JWT_SECRET";

/// Load and validate configuration from a YAML or TOML file.
///
/// # Errors
/// Returns [`ConfigError`] when the file cannot be read, parsed, or
/// fails validation.
pub fn load(path: impl AsRef<Path>) -> Result<GatewayConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;

    let mut config: GatewayConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&raw)?,
        Some("toml") => toml::from_str(&raw)?,
        other => {
            return Err(ConfigError::UnknownFormat(
                other.unwrap_or("<none>").to_string(),
            ))
        }
    };

    if let Ok(secret) = std::env::var(JWT_SECRET_ENV) {
        info!("using JWT secret from {JWT_SECRET_ENV}");
        config.auth.jwt_secret = secret;
    }

    config.validate()?;

    info!(
        backends = config.backends.len(),
        routes = config.routes.len(),
        "configuration loaded"
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(ext: &str, contents: &str) -> tempfile::TempPath {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{ext}"))
            .tempfile()
            .expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file.into_temp_path()
    }

    const YAML: &str = r#"
server:
  host: 127.0.0.1
  port: 8080
backends:
  - name: core-api-1
    url: http://localhost:9001
  - name: core-api-2
    url: http://localhost:9002
    health_check: /healthz
routes:
  - prefix: /api/v1
    backend: core-api-1
auth:
  jwt_secret: test-secret
"#;

    #[test]
    fn test_load_yaml() {
        let path = write_temp("yaml", YAML);
        let config = load(&path).expect("load yaml");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends[1].health_check, "/healthz");
        assert_eq!(config.routes[0].backend, "core-api-1");
    }

    #[test]
    fn test_load_toml() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9090

[[backends]]
name = "core-api-1"
url = "http://localhost:9001"

[auth]
jwt_secret = "test-secret"
"#;
        let path = write_temp("toml", toml);
        let config = load(&path).expect("load toml");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.backends.len(), 1);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let path = write_temp("ini", "whatever");
        assert!(matches!(load(&path), Err(ConfigError::UnknownFormat(_))));
    }

    #[test]
    fn test_duplicate_backend_name_rejected() {
        let yaml = r#"
backends:
  - name: core
    url: http://localhost:9001
  - name: core
    url: http://localhost:9002
auth:
  jwt_secret: s
"#;
        let path = write_temp("yaml", yaml);
        assert!(matches!(load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_route_to_unknown_backend_rejected() {
        let yaml = r#"
backends:
  - name: core
    url: http://localhost:9001
routes:
  - prefix: /api
    backend: missing
auth:
  jwt_secret: s
"#;
        let path = write_temp("yaml", yaml);
        assert!(matches!(load(&path), Err(ConfigError::Invalid(_))));
    }
}
