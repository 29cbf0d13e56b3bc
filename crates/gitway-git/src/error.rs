//! Error types for git subprocess invocation.

/// Errors that can occur when spawning or wiring up a git subprocess.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// The binary could not be spawned at all.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A stdio pipe requested at spawn was not present on the child.
    #[error("subprocess {0} pipe was not captured")]
    MissingPipe(&'static str),
}

impl GitError {
    /// Creates a spawn error for the given program.
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}
