//! Metrics for the Gitway server.

pub mod http;
pub mod setup;

pub use setup::init_metrics;
