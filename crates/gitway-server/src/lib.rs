//! # Gitway Server
//!
//! Axum-based HTTP gateway for the Git smart and dumb transports.
//!
//! Requests are matched against an ordered route table
//! ([`dispatch::ServiceTable`]), checked against the access gate
//! ([`access`]), and then either streamed through a `git` stateless-RPC
//! subprocess or served straight from the repository directory.

pub mod access;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod headers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod state;

// Re-exports
pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use error::GatewayError;
pub use handlers::health::HealthResponse;
pub use server::{create_router, create_router_with_metrics, run_server_with_state};
pub use state::AppState;
