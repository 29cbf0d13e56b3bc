//! Stateless RPC streaming handler for `upload-pack` / `receive-pack`.
//!
//! The request body is fed to the subprocess from its own task while the
//! response streams the subprocess's stdout, so neither side can fill a pipe
//! buffer and stall the other on large transfers. Once response bytes are on
//! the wire a subprocess failure can only abandon the stream; a chunked 200
//! cannot be rolled back.

use std::io::Read;

use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderMap, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use flate2::read::GzDecoder;
use gitway_git::RpcChild;
use http_body_util::BodyExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::access;
use crate::dispatch::ServiceMatch;
use crate::error::GatewayError;
use crate::state::AppState;

/// Chunk size for draining subprocess output into the response.
const CHUNK_SIZE: usize = 1024;

/// Handles `POST <repo>/git-upload-pack` and `POST <repo>/git-receive-pack`.
pub async fn service_rpc(
    state: &AppState,
    ctx: &ServiceMatch,
    req: Request,
) -> Result<Response, GatewayError> {
    let Some(op) = ctx.rpc else {
        return Err(GatewayError::Internal(
            "rpc route registered without an operation".to_string(),
        ));
    };

    let content_type = header_str(req.headers(), "content-type").unwrap_or("");
    if !access::has_access(state, &ctx.dir, op, Some(content_type)).await {
        return Err(GatewayError::Forbidden);
    }

    let env = subprocess_env(state, req.headers());
    let gzipped = matches!(header_str(req.headers(), "content-encoding"), Some("gzip"));

    let RpcChild {
        mut child,
        mut stdin,
        stdout,
        mut stderr,
    } = state
        .runner()
        .spawn_rpc(op, &ctx.dir, &env)
        .map_err(|err| GatewayError::Internal(err.to_string()))?;

    // Feed the request body into the subprocess from its own task. Dropping
    // stdin at the end of the task closes the child's input.
    let mut body = req.into_body();
    let feed = if gzipped {
        let collected = body
            .collect()
            .await
            .map_err(|err| GatewayError::Internal(err.to_string()))?
            .to_bytes();
        let mut decoded = Vec::new();
        GzDecoder::new(collected.as_ref())
            .read_to_end(&mut decoded)
            .map_err(|err| GatewayError::Internal(format!("invalid gzip request body: {err}")))?;

        tokio::spawn(async move {
            if let Err(err) = stdin.write_all(&decoded).await {
                debug!(error = %err, "git rpc stdin closed early");
            }
        })
    } else {
        tokio::spawn(async move {
            while let Some(frame) = body.frame().await {
                let Ok(frame) = frame else { break };
                if let Ok(data) = frame.into_data()
                    && stdin.write_all(&data).await.is_err()
                {
                    break;
                }
            }
        })
    };

    tokio::spawn(async move {
        let mut buf = Vec::new();
        if stderr.read_to_end(&mut buf).await.is_ok() && !buf.is_empty() {
            debug!(rpc = op, stderr = %String::from_utf8_lossy(&buf).trim(), "git rpc stderr");
        }
    });

    // Reap the child after the body feed finishes. A stalled subprocess
    // holds its request until the OS process exits.
    tokio::spawn(async move {
        let _ = feed.await;
        match child.wait().await {
            Ok(status) if !status.success() => {
                warn!(rpc = op, %status, "git rpc exited with non-zero status");
            },
            Err(err) => {
                warn!(rpc = op, error = %err, "failed to reap git rpc subprocess");
            },
            _ => {},
        }
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, format!("application/x-git-{op}-result"))
        .header("X-Content-Type-Options", "nosniff")
        .body(Body::from_stream(ReaderStream::with_capacity(
            stdout, CHUNK_SIZE,
        )))
        .map_err(|err| GatewayError::Internal(err.to_string()))
}

/// Builds the extra environment layered onto the subprocess.
///
/// Basic-auth credentials are forwarded only into the configured variable
/// names; with no names configured they never leave the request.
fn subprocess_env(state: &AppState, headers: &HeaderMap) -> Vec<(String, String)> {
    let config = state.config();
    let mut env = Vec::new();

    if let Some(entry) = config.default_env_entry()
        && let Some((key, value)) = entry.split_once('=')
    {
        env.push((key.to_string(), value.to_string()));
    }

    if let Some((user, password)) = basic_auth(headers) {
        if let Some(var) = config.auth_user_env_var() {
            env.push((var.to_string(), user));
        }
        if let Some(var) = config.auth_pass_env_var() {
            env.push((var.to_string(), password));
        }
    }

    if let Some(version) = header_str(headers, "git-protocol") {
        env.push(("GIT_PROTOCOL".to_string(), version.to_string()));
    }

    env
}

/// Decodes `Authorization: Basic <base64(user:password)>`.
fn basic_auth(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(BASE64.decode(encoded.trim()).ok()?).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}
