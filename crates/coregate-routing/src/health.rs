//! Reachability probes for configured backends.

use crate::BackendRegistry;
use coregate_core::Backend;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Probes backends and writes the results into the registry.
///
/// Three triggers share the same [`sweep`](Self::sweep) entry point:
/// the background interval task, the opportunistic per-request roll,
/// and the explicit administrative endpoint. Overlapping sweeps are
/// safe: registry writes are idempotent last-write-wins.
pub struct HealthMonitor {
    registry: Arc<BackendRegistry>,
    client: reqwest::Client,
    probe_timeout: Duration,
}

impl HealthMonitor {
    /// Create a monitor over the given registry.
    ///
    /// # Errors
    /// Returns [`coregate_core::GatewayError::Internal`] if the probe
    /// HTTP client cannot be constructed.
    pub fn new(
        registry: Arc<BackendRegistry>,
        probe_timeout: Duration,
    ) -> Result<Self, coregate_core::GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(probe_timeout)
            .build()
            .map_err(|e| {
                coregate_core::GatewayError::Internal(format!("failed to build probe client: {e}"))
            })?;
        Ok(Self {
            registry,
            client,
            probe_timeout,
        })
    }

    /// Probe one backend: true iff a response arrives before the
    /// timeout and its status is 2xx. Timeouts, connection failures,
    /// and non-2xx statuses all count as unhealthy; there is no
    /// synchronous retry.
    pub async fn probe(&self, backend: &Backend) -> bool {
        let url = backend.health_check_url();
        match self.client.get(&url).send().await {
            Ok(response) => {
                let ok = response.status().is_success();
                debug!(backend = %backend.name, status = %response.status(), "probe completed");
                ok
            }
            Err(e) => {
                debug!(backend = %backend.name, error = %e, "probe failed");
                false
            }
        }
    }

    /// Probe every backend concurrently and commit the results.
    ///
    /// Probes are independent: a hung backend costs at most one probe
    /// timeout and never delays the others.
    pub async fn sweep(&self) {
        let backends = self.registry.list();
        let probes = backends.iter().map(|backend| async {
            let healthy = self.probe(backend).await;
            self.registry.set_healthy(&backend.name, healthy);
            healthy
        });
        let results = futures::future::join_all(probes).await;

        let healthy = results.iter().filter(|h| **h).count();
        if healthy == 0 && !backends.is_empty() {
            warn!(total = backends.len(), "sweep found no healthy backends");
        } else {
            debug!(healthy, total = backends.len(), "sweep completed");
        }
    }

    /// With probability `probability`, kick off a sweep in the
    /// background. Called from the request path, so the sweep must not
    /// delay the caller.
    pub fn maybe_sweep(self: &Arc<Self>, probability: f64) {
        if rand::random::<f64>() < probability {
            let monitor = Arc::clone(self);
            tokio::spawn(async move { monitor.sweep().await });
        }
    }

    /// Spawn the background task that sweeps immediately and then on
    /// every interval tick for the lifetime of the process.
    pub fn spawn_interval(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.sweep().await;
            }
        })
    }

    /// Configured per-probe timeout.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }
}
