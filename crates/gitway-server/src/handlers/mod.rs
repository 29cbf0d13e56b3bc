//! Request handlers.
//!
//! Smart-protocol handlers ([`rpc`], [`info_refs`]) stream git subprocess
//! I/O; dumb-protocol handlers ([`files`]) serve repository files straight
//! from disk. [`health`] and [`metrics`] are operational endpoints mounted
//! outside the gateway's route table.

pub mod files;
pub mod health;
pub mod info_refs;
pub mod metrics;
pub mod rpc;
