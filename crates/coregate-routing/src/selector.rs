//! Per-request backend selection.

use crate::BackendRegistry;
use coregate_core::{Backend, GatewayError, Identity};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// A configured path-prefix to backend-name rule.
#[derive(Debug, Clone)]
pub struct PrefixRule {
    /// Path prefix, e.g. `/api/v1`
    pub prefix: String,
    /// Target backend name
    pub backend: String,
}

/// Chooses exactly one healthy backend per request, or signals
/// unavailability.
///
/// Strategy priority per request:
/// 1. path-prefix rule whose target is currently healthy
/// 2. user affinity: stable hash of the identity id over the healthy set
/// 3. shared round-robin counter over the healthy set
///
/// Selection never mutates a backend; the only state written is the
/// round-robin counter, an atomic shared across requests.
pub struct CoreSelector {
    registry: Arc<BackendRegistry>,
    rules: Vec<PrefixRule>,
    counter: AtomicU64,
}

impl CoreSelector {
    /// Create a selector. Rules are checked longest prefix first so a
    /// more specific mapping wins over a broader one.
    #[must_use]
    pub fn new(registry: Arc<BackendRegistry>, mut rules: Vec<PrefixRule>) -> Self {
        rules.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self {
            registry,
            rules,
            counter: AtomicU64::new(0),
        }
    }

    /// Select a backend for the given request path and optional
    /// authenticated identity.
    ///
    /// # Errors
    /// Returns [`GatewayError::ServiceUnavailable`] when the healthy
    /// set is empty. An unhealthy backend is never selected.
    pub fn select(
        &self,
        path: &str,
        identity: Option<&Identity>,
    ) -> Result<Backend, GatewayError> {
        // 1. Path-prefix rule, if its target is healthy right now.
        for rule in &self.rules {
            if path.starts_with(&rule.prefix) && self.registry.is_healthy(&rule.backend) {
                if let Some(backend) = self.registry.get(&rule.backend) {
                    debug!(path, backend = %backend.name, strategy = "prefix", "backend selected");
                    return Ok(backend);
                }
            }
        }

        let healthy = self.registry.healthy_backends();
        if healthy.is_empty() {
            return Err(GatewayError::ServiceUnavailable);
        }

        // 2. User affinity. Stable hash of the identity id, reduced
        // over the *currently healthy* set: the same user keeps the
        // same backend as long as the healthy set is unchanged, and
        // assignments reshuffle whenever membership flips. That is a
        // deliberate consistency/availability tradeoff, not a defect.
        if let Some(identity) = identity {
            let index = affinity_hash(&identity.id) as usize % healthy.len();
            let backend = healthy[index].clone();
            debug!(
                path,
                identity = %identity.id,
                backend = %backend.name,
                strategy = "affinity",
                "backend selected"
            );
            return Ok(backend);
        }

        // 3. Round-robin fallback. fetch_add gives each request a
        // distinct slot; the guarantee is even long-run distribution,
        // not strict request-order fairness.
        let slot = self.counter.fetch_add(1, Ordering::Relaxed);
        let backend = healthy[slot as usize % healthy.len()].clone();
        debug!(path, backend = %backend.name, strategy = "round_robin", "backend selected");
        Ok(backend)
    }
}

/// Polynomial rolling hash over the id's bytes, folded into a `u32`.
///
/// Deterministic across process restarts and independent of the
/// platform default hasher, which is what keeps user affinity stable
/// between deployments.
#[must_use]
pub fn affinity_hash(id: &str) -> u32 {
    let mut hash: u32 = 0;
    for byte in id.as_bytes() {
        hash = hash.wrapping_mul(31).wrapping_add(u32::from(*byte));
    }
    hash
}
