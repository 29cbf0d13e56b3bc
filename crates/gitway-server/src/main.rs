//! Gitway server binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gitway_server::{AppState, GatewayConfig, run_server_with_state};

/// Git smart/dumb HTTP gateway over the external git binary.
#[derive(Parser, Debug)]
#[command(name = "gitway-server", version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "GITWAY_LISTEN", default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Root directory containing the served repositories.
    #[arg(long, env = "GITWAY_ROOT")]
    root: PathBuf,

    /// Path to the git binary.
    #[arg(long, env = "GITWAY_GIT_BIN", default_value = "/usr/bin/git")]
    git_bin: PathBuf,

    /// Prefix stripped from request paths before route matching.
    #[arg(long, env = "GITWAY_ROUTE_PREFIX", default_value = "")]
    route_prefix: String,

    /// Disable git-upload-pack (clone/fetch).
    #[arg(long, env = "GITWAY_DISABLE_UPLOAD_PACK")]
    disable_upload_pack: bool,

    /// Disable git-receive-pack (push).
    #[arg(long, env = "GITWAY_DISABLE_RECEIVE_PACK")]
    disable_receive_pack: bool,

    /// Env var that receives the Basic-auth username in RPC subprocesses.
    #[arg(long, env = "GITWAY_AUTH_USER_ENV")]
    auth_user_env: Option<String>,

    /// Env var that receives the Basic-auth password in RPC subprocesses.
    #[arg(long, env = "GITWAY_AUTH_PASS_ENV")]
    auth_pass_env: Option<String>,

    /// Extra KEY=VALUE entry added to every RPC subprocess environment.
    #[arg(long, env = "GITWAY_DEFAULT_ENV")]
    default_env: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut builder = GatewayConfig::builder()
        .repository_root(args.root.clone())
        .git_bin_path(args.git_bin.clone())
        .upload_pack(!args.disable_upload_pack)
        .receive_pack(!args.disable_receive_pack)
        .route_prefix(args.route_prefix);
    if let Some(var) = args.auth_user_env {
        builder = builder.auth_user_env_var(var);
    }
    if let Some(var) = args.auth_pass_env {
        builder = builder.auth_pass_env_var(var);
    }
    if let Some(entry) = args.default_env {
        builder = builder.default_env_entry(entry);
    }

    let config = builder.build()?;

    tracing::info!("Starting Gitway v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Repository root: {}", args.root.display());
    tracing::info!("Git binary: {}", args.git_bin.display());
    tracing::info!(
        "upload-pack: {}, receive-pack: {}",
        config.upload_pack(),
        config.receive_pack()
    );

    let prometheus_handle = gitway_server::metrics::init_metrics();
    let state = AppState::new(config);

    run_server_with_state(args.listen, state, prometheus_handle).await?;

    Ok(())
}
