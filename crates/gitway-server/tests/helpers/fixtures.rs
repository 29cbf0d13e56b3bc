//! On-disk repository fixtures and gateway construction helpers.
//!
//! The dumb-protocol tests need real files, not a real git history, so the
//! fixture lays out a bare-repository skeleton by hand. Smart-protocol tests
//! swap the git binary for a small shell script.

use std::path::{Path, PathBuf};

use axum::Router;
use gitway_server::{AppState, GatewayConfig, GatewayConfigBuilder, create_router};

use super::client::TestClient;

pub const LOOSE_DIR: &str = "aa";
pub const LOOSE_CONTENT: &[u8] = b"loose object bytes";

/// The 38-character remainder of the fixture loose object's hash.
pub fn loose_rest() -> String {
    "b".repeat(38)
}

/// The 40-character hash of the fixture pack.
pub fn pack_hash() -> String {
    "c".repeat(40)
}

/// Lays out a bare-repository skeleton under `root/name`.
pub fn bare_repo(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(dir.join("info")).unwrap();
    std::fs::create_dir_all(dir.join("objects/info")).unwrap();
    std::fs::create_dir_all(dir.join("objects").join(LOOSE_DIR)).unwrap();
    std::fs::create_dir_all(dir.join("objects/pack")).unwrap();

    std::fs::write(dir.join("HEAD"), "ref: refs/heads/main\n").unwrap();
    std::fs::write(
        dir.join("info/refs"),
        format!("{}\trefs/heads/main\n", "d".repeat(40)),
    )
    .unwrap();
    std::fs::write(
        dir.join("objects/info/packs"),
        format!("P pack-{}.pack\n\n", pack_hash()),
    )
    .unwrap();
    std::fs::write(
        dir.join("objects").join(LOOSE_DIR).join(loose_rest()),
        LOOSE_CONTENT,
    )
    .unwrap();
    std::fs::write(
        dir.join(format!("objects/pack/pack-{}.pack", pack_hash())),
        b"PACK fixture bytes",
    )
    .unwrap();
    std::fs::write(
        dir.join(format!("objects/pack/pack-{}.idx", pack_hash())),
        b"IDX fixture bytes",
    )
    .unwrap();

    dir
}

/// Writes an executable shell script standing in for the git binary.
#[cfg(unix)]
pub fn fake_git(dir: &Path, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-git");
    std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A config builder rooted at `root` with a git binary that cannot run.
///
/// Tests that exercise git swap in a [`fake_git`] script.
pub fn config(root: &Path) -> GatewayConfigBuilder {
    GatewayConfig::builder()
        .repository_root(root)
        .git_bin_path("/nonexistent/git")
}

/// Builds the test router for a configuration.
pub fn router(config: GatewayConfig) -> Router {
    create_router(AppState::new(config))
}

/// Builds a [`TestClient`] for a configuration.
pub fn client_for(config: GatewayConfig) -> TestClient {
    TestClient::new(router(config))
}
