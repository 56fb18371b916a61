//! Backend registry with per-backend atomic health flags.

use coregate_core::Backend;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

struct BackendEntry {
    backend: Backend,
    healthy: AtomicBool,
}

/// The fixed set of configured backends and their live health state.
///
/// Membership never changes after construction; only the per-backend
/// health flags mutate, and each flag is an independent atomic so a
/// sweep in progress never blocks routing reads. Iteration order is
/// configuration order throughout.
pub struct BackendRegistry {
    entries: Vec<BackendEntry>,
}

impl BackendRegistry {
    /// Build a registry from backend descriptors. All backends start
    /// healthy; the first sweep corrects any that are not reachable.
    #[must_use]
    pub fn new(backends: Vec<Backend>) -> Self {
        let entries = backends
            .into_iter()
            .map(|backend| BackendEntry {
                backend,
                healthy: AtomicBool::new(true),
            })
            .collect();
        Self { entries }
    }

    /// All configured backends in configuration order.
    #[must_use]
    pub fn list(&self) -> Vec<Backend> {
        self.entries.iter().map(|e| e.backend.clone()).collect()
    }

    /// The healthy subsequence of [`list`](Self::list), preserving order.
    #[must_use]
    pub fn healthy_backends(&self) -> Vec<Backend> {
        self.entries
            .iter()
            .filter(|e| e.healthy.load(Ordering::Acquire))
            .map(|e| e.backend.clone())
            .collect()
    }

    /// Update a backend's health flag. Unknown names are a no-op.
    pub fn set_healthy(&self, name: &str, healthy: bool) {
        if let Some(entry) = self.entries.iter().find(|e| e.backend.name == name) {
            let was = entry.healthy.swap(healthy, Ordering::AcqRel);
            if was != healthy {
                tracing::info!(backend = %name, healthy, "backend health changed");
            }
        }
    }

    /// Whether the named backend is currently healthy. Unknown names
    /// report unhealthy.
    #[must_use]
    pub fn is_healthy(&self, name: &str) -> bool {
        self.entries
            .iter()
            .find(|e| e.backend.name == name)
            .is_some_and(|e| e.healthy.load(Ordering::Acquire))
    }

    /// Look up a backend descriptor by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Backend> {
        self.entries
            .iter()
            .find(|e| e.backend.name == name)
            .map(|e| e.backend.clone())
    }

    /// Number of configured backends.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Point-in-time view of every backend with its health flag, for
    /// the administrative surface.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BackendSnapshot> {
        self.entries
            .iter()
            .map(|e| BackendSnapshot {
                name: e.backend.name.clone(),
                url: e.backend.url.to_string(),
                health_check: e.backend.health_check.clone(),
                weight: e.backend.weight,
                healthy: e.healthy.load(Ordering::Acquire),
            })
            .collect()
    }
}

/// One backend as reported by [`BackendRegistry::snapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct BackendSnapshot {
    /// Backend name
    pub name: String,
    /// Base URL
    pub url: String,
    /// Health-check path
    pub health_check: String,
    /// Configured weight
    pub weight: u32,
    /// Current health flag
    pub healthy: bool,
}
