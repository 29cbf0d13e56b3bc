//! # Gitway Git
//!
//! Invocation of the external `git` binary for the Gitway gateway.
//!
//! The gateway never parses Git's object model; everything hard is delegated
//! to `git` itself. This crate owns the two invocation shapes the gateway
//! needs:
//!
//! - captured one-shot commands (`--advertise-refs`, `update-server-info`,
//!   `config`), where failures are logged but never abort the caller, and
//! - piped stateless-RPC children (`upload-pack` / `receive-pack`), handed
//!   back to the HTTP layer for streaming.
//!
//! It also resolves repository ids from request paths to directories under
//! the configured root.
//!
//! ## Example
//!
//! ```ignore
//! use gitway_git::GitRunner;
//!
//! let runner = GitRunner::new("/usr/bin/git");
//! let refs = runner
//!     .advertise_refs("upload-pack", repo_dir, Some("version=2"))
//!     .await;
//! ```

pub mod error;
pub mod repository;
pub mod runner;

// Re-exports
pub use error::GitError;
pub use repository::resolve_repository;
pub use runner::{CommandDecorator, GitRunner, RpcChild};
