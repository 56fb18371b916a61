//! # Coregate Server
//!
//! HTTP surface for the Coregate proxy gateway.
//!
//! This crate provides:
//! - Axum-based routes: auth operations, administrative operations,
//!   and the catch-all proxy path
//! - Dual session/token identity resolution
//! - The forwarding engine that delivers requests to selected backends
//! - API error mapping for the shared error taxonomy

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod error;
pub mod extractors;
pub mod forward;
pub mod handlers;
pub mod routes;
pub mod session;
pub mod state;
pub mod token;
pub mod users;

pub use auth::{AuthService, Credentials};
pub use error::ApiError;
pub use extractors::{ClientCredential, SESSION_COOKIE};
pub use forward::{ForwardedResponse, Forwarder};
pub use routes::create_router;
pub use session::{Session, SessionStore};
pub use state::AppState;
pub use token::TokenService;
pub use users::{StaticUserDirectory, UserDirectory};
