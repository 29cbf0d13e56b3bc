//! Smart ref advertisement with dumb fallback.

use axum::{
    body::Body,
    extract::Request,
    http::{StatusCode, header::CONTENT_TYPE},
    response::Response,
};

use crate::access;
use crate::dispatch::ServiceMatch;
use crate::error::GatewayError;
use crate::handlers::files::{CachePolicy, send_file};
use crate::headers;
use crate::state::AppState;

/// Handles `GET <repo>/info/refs`.
///
/// A smart client names its operation in the `service` query parameter and
/// gets a streamed `--advertise-refs` run. Without a grantable operation the
/// request degrades to the dumb protocol: refresh the on-disk metadata and
/// serve the literal `info/refs` file.
pub async fn info_refs(
    state: &AppState,
    ctx: &ServiceMatch,
    req: &Request,
) -> Result<Response, GatewayError> {
    let operation = service_param(req.uri().query());
    let version = git_protocol(req);

    let granted = match &operation {
        Some(op) => access::has_access(state, &ctx.dir, op, None).await,
        None => false,
    };

    let Some(op) = operation.filter(|_| granted) else {
        state.runner().update_server_info(&ctx.dir).await;
        return send_file(ctx, "text/plain; charset=utf-8", CachePolicy::NoCache).await;
    };

    let refs = state.runner().advertise_refs(&op, &ctx.dir, version).await;

    // Protocol v0 clients expect the service announcement ahead of the
    // advertisement; v1/v2 clients negotiated via Git-Protocol and get the
    // raw output.
    let mut body = Vec::with_capacity(refs.len() + 64);
    if version.is_none() {
        body.extend_from_slice(&gitway_protocol::encode(
            format!("# service=git-{op}\n").as_bytes(),
        ));
        body.extend_from_slice(gitway_protocol::flush());
    }
    body.extend_from_slice(&refs);

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(
            CONTENT_TYPE,
            format!("application/x-git-{op}-advertisement"),
        )
        .body(Body::from(body))
        .map_err(|err| GatewayError::Internal(err.to_string()))?;
    headers::no_cache(response.headers_mut());

    Ok(response)
}

/// Extracts the operation from the `service` query parameter.
///
/// Only `git-`-prefixed values name an operation; the prefix is stripped.
fn service_param(query: Option<&str>) -> Option<String> {
    for pair in query?.split('&') {
        if let Some(value) = pair.strip_prefix("service=") {
            return value.strip_prefix("git-").map(str::to_string);
        }
    }
    None
}

fn git_protocol(req: &Request) -> Option<&str> {
    req.headers().get("git-protocol")?.to_str().ok()
}
