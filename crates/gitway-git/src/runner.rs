//! Git subprocess invocation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::warn;

use crate::error::GitError;

/// Hook applied to every git command before it is spawned.
///
/// Lets the embedding application wrap invocations with sandboxing, resource
/// limits, or tracing without this crate knowing about any of it.
pub type CommandDecorator = Arc<dyn Fn(&mut Command) + Send + Sync>;

/// A spawned stateless-RPC child with its stdio pipes split out.
///
/// All three pipes are verified at spawn time; the caller owns streaming
/// them and reaping the child.
#[derive(Debug)]
pub struct RpcChild {
    pub child: Child,
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

/// Runs the external `git` binary.
///
/// Cheap to clone; holds only the binary path and the optional decorator.
#[derive(Clone)]
pub struct GitRunner {
    bin: PathBuf,
    decorator: Option<CommandDecorator>,
}

impl GitRunner {
    /// Creates a runner for the given git binary.
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            decorator: None,
        }
    }

    /// Installs a decorator applied to every command before spawning.
    pub fn with_decorator(mut self, decorator: CommandDecorator) -> Self {
        self.decorator = Some(decorator);
        self
    }

    /// Returns the configured binary path.
    pub fn bin(&self) -> &Path {
        &self.bin
    }

    fn command(&self, dir: &Path, protocol: Option<&str>, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.args(args).current_dir(dir);
        if let Some(version) = protocol {
            cmd.env("GIT_PROTOCOL", version);
        }
        if let Some(decorate) = &self.decorator {
            decorate(&mut cmd);
        }
        cmd
    }

    /// Runs a command to completion and returns its captured stdout.
    ///
    /// Spawn failures and non-zero exits are logged but never abort the
    /// caller; the (possibly empty) stdout collected so far is returned
    /// either way.
    pub async fn run_captured(&self, dir: &Path, protocol: Option<&str>, args: &[&str]) -> Vec<u8> {
        let mut cmd = self.command(dir, protocol, args);
        match cmd.output().await {
            Ok(output) => {
                if !output.status.success() {
                    warn!(
                        program = %self.bin.display(),
                        args = ?args,
                        status = %output.status,
                        stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                        "git command exited with non-zero status"
                    );
                }
                output.stdout
            },
            Err(err) => {
                warn!(
                    program = %self.bin.display(),
                    args = ?args,
                    error = %err,
                    "failed to run git command"
                );
                Vec::new()
            },
        }
    }

    /// Runs `<op> --stateless-rpc --advertise-refs .` in the repository.
    pub async fn advertise_refs(&self, op: &str, dir: &Path, protocol: Option<&str>) -> Vec<u8> {
        self.run_captured(dir, protocol, &[op, "--stateless-rpc", "--advertise-refs", "."])
            .await
    }

    /// Refreshes the dumb-protocol metadata files (`info/refs`, packs list).
    pub async fn update_server_info(&self, dir: &Path) -> Vec<u8> {
        self.run_captured(dir, None, &["update-server-info"]).await
    }

    /// Reads a single `git config` value from the repository.
    ///
    /// Returns `None` when the key is unset or the lookup fails; the caller
    /// treats that as "no value", not an error.
    pub async fn config_get(&self, dir: &Path, key: &str) -> Option<String> {
        let out = self.run_captured(dir, None, &["config", key]).await;
        let value = String::from_utf8(out).ok()?;
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    /// Spawns `<op> --stateless-rpc <dir>` with all stdio piped.
    ///
    /// `extra_env` entries are layered on top of the inherited process
    /// environment.
    pub fn spawn_rpc(
        &self,
        op: &str,
        dir: &Path,
        extra_env: &[(String, String)],
    ) -> Result<RpcChild, GitError> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg(op)
            .arg("--stateless-rpc")
            .arg(dir)
            .current_dir(dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in extra_env {
            cmd.env(key, value);
        }
        if let Some(decorate) = &self.decorator {
            decorate(&mut cmd);
        }

        let mut child = cmd
            .spawn()
            .map_err(|err| GitError::spawn(self.bin.display().to_string(), err))?;
        let stdin = child.stdin.take().ok_or(GitError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(GitError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(GitError::MissingPipe("stderr"))?;

        Ok(RpcChild {
            child,
            stdin,
            stdout,
            stderr,
        })
    }
}

impl std::fmt::Debug for GitRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRunner")
            .field("bin", &self.bin)
            .field("decorator", &self.decorator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workdir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[tokio::test]
    async fn captured_run_returns_stdout() {
        let dir = workdir();
        let runner = GitRunner::new("echo");

        let out = runner.run_captured(dir.path(), None, &["hello"]).await;
        assert_eq!(out, b"hello\n");
    }

    #[tokio::test]
    async fn captured_run_survives_a_missing_binary() {
        let dir = workdir();
        let runner = GitRunner::new("/nonexistent/gitway-test-binary");

        let out = runner.run_captured(dir.path(), None, &["anything"]).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn captured_run_keeps_output_on_non_zero_exit() {
        let dir = workdir();
        let runner = GitRunner::new("/bin/sh");

        let out = runner
            .run_captured(dir.path(), None, &["-c", "echo partial; exit 3"])
            .await;
        assert_eq!(out, b"partial\n");
    }

    #[tokio::test]
    async fn protocol_version_reaches_the_environment() {
        let dir = workdir();
        let runner = GitRunner::new("/bin/sh");

        let out = runner
            .run_captured(
                dir.path(),
                Some("version=2"),
                &["-c", "printf %s \"$GIT_PROTOCOL\""],
            )
            .await;
        assert_eq!(out, b"version=2");
    }

    #[tokio::test]
    async fn decorator_runs_before_spawn() {
        let dir = workdir();
        let decorator: CommandDecorator = Arc::new(|cmd: &mut Command| {
            cmd.env("GITWAY_MARK", "decorated");
        });
        let runner = GitRunner::new("/bin/sh").with_decorator(decorator);

        let out = runner
            .run_captured(dir.path(), None, &["-c", "printf %s \"$GITWAY_MARK\""])
            .await;
        assert_eq!(out, b"decorated");
    }

    #[cfg(unix)]
    mod rpc {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        fn fake_git(dir: &Path, script: &str) -> PathBuf {
            let path = dir.join("fake-git");
            std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn rpc_child_streams_stdin_to_stdout() {
            let dir = workdir();
            let runner = GitRunner::new(fake_git(dir.path(), "cat"));

            let mut rpc = runner.spawn_rpc("upload-pack", dir.path(), &[]).unwrap();

            rpc.stdin.write_all(b"0009ping").await.unwrap();
            drop(rpc.stdin);

            let mut out = Vec::new();
            rpc.stdout.read_to_end(&mut out).await.unwrap();
            assert_eq!(out, b"0009ping");

            assert!(rpc.child.wait().await.unwrap().success());
        }

        #[tokio::test]
        async fn rpc_child_sees_extra_environment() {
            let dir = workdir();
            let runner = GitRunner::new(fake_git(dir.path(), "printf %s \"$REMOTE_USER\""));

            let env = vec![("REMOTE_USER".to_string(), "alice".to_string())];
            let mut rpc = runner.spawn_rpc("receive-pack", dir.path(), &env).unwrap();
            drop(rpc.stdin);

            let mut out = Vec::new();
            rpc.stdout.read_to_end(&mut out).await.unwrap();
            assert_eq!(out, b"alice");
            rpc.child.wait().await.unwrap();
        }

        #[tokio::test]
        async fn rpc_spawn_failure_is_an_error() {
            let dir = workdir();
            let runner = GitRunner::new("/nonexistent/gitway-test-binary");

            let err = runner.spawn_rpc("upload-pack", dir.path(), &[]).unwrap_err();
            assert!(matches!(err, GitError::Spawn { .. }));
        }
    }
}
