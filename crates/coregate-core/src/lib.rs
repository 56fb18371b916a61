//! # Coregate Core
//!
//! Core types, traits, and error handling for the Coregate proxy gateway.
//!
//! This crate provides:
//! - The [`Backend`] descriptor for downstream core services
//! - The canonical [`Identity`] produced by either credential kind
//! - The [`RequestOutcome`] metric record emitted per forwarded request
//! - The [`GatewayError`] taxonomy shared across all crates

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod identity;
pub mod outcome;

pub use backend::Backend;
pub use error::GatewayError;
pub use identity::{Identity, Role};
pub use outcome::RequestOutcome;
