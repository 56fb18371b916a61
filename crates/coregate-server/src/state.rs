//! Shared application state.

use crate::auth::AuthService;
use crate::forward::Forwarder;
use crate::session::SessionStore;
use crate::token::TokenService;
use crate::users::{StaticUserDirectory, UserDirectory};
use coregate_config::GatewayConfig;
use coregate_core::GatewayError;
use coregate_routing::{BackendRegistry, CoreSelector, HealthMonitor, MetricsStore, PrefixRule};
use std::sync::Arc;

/// Everything the handlers share. Cheap to clone; all components are
/// behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Backend set with live health flags
    pub registry: Arc<BackendRegistry>,
    /// Probe runner shared by all sweep triggers
    pub monitor: Arc<HealthMonitor>,
    /// Per-request backend selection
    pub selector: Arc<CoreSelector>,
    /// Outcome retention
    pub metrics: Arc<MetricsStore>,
    /// Identity resolution and access control
    pub auth: Arc<AuthService>,
    /// Backend round trips
    pub forwarder: Arc<Forwarder>,
    /// Probability that a forwarded request also triggers a sweep
    pub sweep_probability: f64,
}

impl AppState {
    /// Assemble the full state from validated configuration, using the
    /// built-in development user directory.
    ///
    /// # Errors
    /// Returns [`GatewayError::Internal`] if an HTTP client cannot be
    /// constructed.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_users(config, Arc::new(StaticUserDirectory::with_defaults()))
    }

    /// As [`from_config`](Self::from_config) with a caller-supplied
    /// user directory.
    ///
    /// # Errors
    /// Returns [`GatewayError::Internal`] if an HTTP client cannot be
    /// constructed.
    pub fn with_users(
        config: &GatewayConfig,
        users: Arc<dyn UserDirectory>,
    ) -> Result<Self, GatewayError> {
        let registry = Arc::new(BackendRegistry::new(config.backend_descriptors()));
        let monitor = Arc::new(HealthMonitor::new(
            Arc::clone(&registry),
            config.health.probe_timeout,
        )?);

        let rules = config
            .routes
            .iter()
            .map(|r| PrefixRule {
                prefix: r.prefix.clone(),
                backend: r.backend.clone(),
            })
            .collect();
        let selector = Arc::new(CoreSelector::new(Arc::clone(&registry), rules));

        let auth = Arc::new(AuthService::new(
            SessionStore::new(config.auth.session_timeout),
            TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl),
            users,
        ));

        Ok(Self {
            registry,
            monitor,
            selector,
            metrics: Arc::new(MetricsStore::new(config.metrics.capacity)),
            auth,
            forwarder: Arc::new(Forwarder::new(config.forward.timeout)?),
            sweep_probability: config.health.opportunistic_probability,
        })
    }
}
