//! Application state.

use std::sync::Arc;

use gitway_git::GitRunner;

use crate::config::GatewayConfig;
use crate::dispatch::ServiceTable;

/// State shared across all handlers.
///
/// Everything here is immutable after startup and cloned by reference into
/// each request.
#[derive(Clone)]
pub struct AppState {
    config: Arc<GatewayConfig>,
    services: Arc<ServiceTable>,
    runner: GitRunner,
}

impl AppState {
    /// Creates the state for a gateway configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let mut runner = GitRunner::new(config.git_bin_path().clone());
        if let Some(decorator) = config.command_decorator() {
            runner = runner.with_decorator(decorator.clone());
        }

        Self {
            config: Arc::new(config),
            services: Arc::new(ServiceTable::new()),
            runner,
        }
    }

    /// Returns the gateway configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Returns the ordered route table.
    pub fn services(&self) -> &ServiceTable {
        &self.services
    }

    /// Returns the git runner.
    pub fn runner(&self) -> &GitRunner {
        &self.runner
    }
}
