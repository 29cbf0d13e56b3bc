//! Gateway configuration.

use std::path::PathBuf;

use gitway_git::CommandDecorator;

/// Configuration for the gateway.
///
/// Built once at startup and shared read-only (behind `Arc`) across all
/// concurrently handled requests.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Root directory containing the served repositories.
    repository_root: PathBuf,

    /// Path to the git binary.
    git_bin_path: PathBuf,

    /// Whether `git-upload-pack` (clone/fetch) is globally enabled.
    upload_pack: bool,

    /// Whether `git-receive-pack` (push) is globally enabled.
    receive_pack: bool,

    /// Prefix stripped from request paths before route matching.
    route_prefix: String,

    /// Env var name that receives the Basic-auth username, if forwarding is
    /// wanted.
    auth_user_env_var: Option<String>,

    /// Env var name that receives the Basic-auth password.
    auth_pass_env_var: Option<String>,

    /// Extra `KEY=VALUE` entry added to every RPC subprocess environment.
    default_env_entry: Option<String>,

    /// Hook applied to every git command before it is spawned.
    command_decorator: Option<CommandDecorator>,
}

impl GatewayConfig {
    /// Creates a new builder.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// Returns the repository root directory.
    pub fn repository_root(&self) -> &PathBuf {
        &self.repository_root
    }

    /// Returns the git binary path.
    pub fn git_bin_path(&self) -> &PathBuf {
        &self.git_bin_path
    }

    /// Returns whether upload-pack is globally enabled.
    pub fn upload_pack(&self) -> bool {
        self.upload_pack
    }

    /// Returns whether receive-pack is globally enabled.
    pub fn receive_pack(&self) -> bool {
        self.receive_pack
    }

    /// Returns the route prefix.
    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    /// Returns the env var name receiving the Basic-auth username.
    pub fn auth_user_env_var(&self) -> Option<&str> {
        self.auth_user_env_var.as_deref()
    }

    /// Returns the env var name receiving the Basic-auth password.
    pub fn auth_pass_env_var(&self) -> Option<&str> {
        self.auth_pass_env_var.as_deref()
    }

    /// Returns the extra default environment entry.
    pub fn default_env_entry(&self) -> Option<&str> {
        self.default_env_entry.as_deref()
    }

    /// Returns the command decorator hook.
    pub fn command_decorator(&self) -> Option<&CommandDecorator> {
        self.command_decorator.as_ref()
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("repository_root", &self.repository_root)
            .field("git_bin_path", &self.git_bin_path)
            .field("upload_pack", &self.upload_pack)
            .field("receive_pack", &self.receive_pack)
            .field("route_prefix", &self.route_prefix)
            .field("auth_user_env_var", &self.auth_user_env_var)
            .field("auth_pass_env_var", &self.auth_pass_env_var)
            .field("default_env_entry", &self.default_env_entry)
            .field("command_decorator", &self.command_decorator.is_some())
            .finish()
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Default)]
pub struct GatewayConfigBuilder {
    repository_root: Option<PathBuf>,
    git_bin_path: Option<PathBuf>,
    upload_pack: Option<bool>,
    receive_pack: Option<bool>,
    route_prefix: Option<String>,
    auth_user_env_var: Option<String>,
    auth_pass_env_var: Option<String>,
    default_env_entry: Option<String>,
    command_decorator: Option<CommandDecorator>,
}

impl GatewayConfigBuilder {
    /// Sets the repository root directory (required).
    pub fn repository_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.repository_root = Some(root.into());
        self
    }

    /// Sets the git binary path.
    pub fn git_bin_path(mut self, bin: impl Into<PathBuf>) -> Self {
        self.git_bin_path = Some(bin.into());
        self
    }

    /// Enables or disables upload-pack (clone/fetch).
    pub fn upload_pack(mut self, enabled: bool) -> Self {
        self.upload_pack = Some(enabled);
        self
    }

    /// Enables or disables receive-pack (push).
    pub fn receive_pack(mut self, enabled: bool) -> Self {
        self.receive_pack = Some(enabled);
        self
    }

    /// Sets the prefix stripped from request paths before matching.
    pub fn route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.route_prefix = Some(prefix.into());
        self
    }

    /// Forwards the Basic-auth username into the named env var.
    pub fn auth_user_env_var(mut self, var: impl Into<String>) -> Self {
        self.auth_user_env_var = Some(var.into());
        self
    }

    /// Forwards the Basic-auth password into the named env var.
    pub fn auth_pass_env_var(mut self, var: impl Into<String>) -> Self {
        self.auth_pass_env_var = Some(var.into());
        self
    }

    /// Adds a `KEY=VALUE` entry to every RPC subprocess environment.
    pub fn default_env_entry(mut self, entry: impl Into<String>) -> Self {
        self.default_env_entry = Some(entry.into());
        self
    }

    /// Installs a hook applied to every git command before spawning.
    pub fn command_decorator(mut self, decorator: CommandDecorator) -> Self {
        self.command_decorator = Some(decorator);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<GatewayConfig, &'static str> {
        let repository_root = self.repository_root.ok_or("repository_root is required")?;

        Ok(GatewayConfig {
            repository_root,
            git_bin_path: self
                .git_bin_path
                .unwrap_or_else(|| PathBuf::from("/usr/bin/git")),
            upload_pack: self.upload_pack.unwrap_or(true),
            receive_pack: self.receive_pack.unwrap_or(true),
            route_prefix: self.route_prefix.unwrap_or_default(),
            auth_user_env_var: self.auth_user_env_var,
            auth_pass_env_var: self.auth_pass_env_var,
            default_env_entry: self.default_env_entry,
            command_decorator: self.command_decorator,
        })
    }
}
