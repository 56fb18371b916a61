//! # Coregate Routing
//!
//! Health-aware backend selection for the Coregate proxy gateway.
//!
//! This crate provides:
//! - [`BackendRegistry`] — the fixed backend set with live health flags
//! - [`HealthMonitor`] — periodic and on-demand reachability probes
//! - [`CoreSelector`] — per-request backend selection under a priority
//!   of strategies (path prefix, user affinity, round robin)
//! - [`MetricsStore`] — bounded retention of per-request outcomes

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod health;
pub mod metrics;
pub mod registry;
pub mod selector;

pub use health::HealthMonitor;
pub use metrics::{MetricsStore, MetricsSummary};
pub use registry::{BackendRegistry, BackendSnapshot};
pub use selector::{CoreSelector, PrefixRule};
