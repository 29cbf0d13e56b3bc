//! Dumb-protocol file handlers.
//!
//! One send-file primitive backs them all; the handlers differ only in
//! Content-Type and cache policy.

use axum::{
    body::Body,
    http::{
        StatusCode,
        header::{CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED},
    },
    response::Response,
};
use tokio_util::io::ReaderStream;

use crate::dispatch::ServiceMatch;
use crate::error::GatewayError;
use crate::headers;

/// Cache treatment for a served file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Content-addressed data, cacheable for a year.
    Forever,
    /// Ref metadata that moves with every push.
    NoCache,
}

/// Serves `HEAD`, alternates, and other `objects/info/*` metadata.
pub async fn text_file(ctx: &ServiceMatch) -> Result<Response, GatewayError> {
    send_file(ctx, "text/plain", CachePolicy::NoCache).await
}

/// Serves the `objects/info/packs` listing.
pub async fn info_packs(ctx: &ServiceMatch) -> Result<Response, GatewayError> {
    send_file(ctx, "text/plain; charset=utf-8", CachePolicy::Forever).await
}

/// Serves a loose object.
pub async fn loose_object(ctx: &ServiceMatch) -> Result<Response, GatewayError> {
    send_file(ctx, "application/x-git-loose-object", CachePolicy::Forever).await
}

/// Serves a pack file.
pub async fn pack_file(ctx: &ServiceMatch) -> Result<Response, GatewayError> {
    send_file(ctx, "application/x-git-packed-objects", CachePolicy::Forever).await
}

/// Serves a pack index.
pub async fn idx_file(ctx: &ServiceMatch) -> Result<Response, GatewayError> {
    send_file(ctx, "application/x-git-packed-objects-toc", CachePolicy::Forever).await
}

/// Streams `<dir>/<file>` with the given Content-Type and cache policy.
///
/// Anything that is not a readable regular file is a 404.
pub async fn send_file(
    ctx: &ServiceMatch,
    content_type: &str,
    policy: CachePolicy,
) -> Result<Response, GatewayError> {
    let path = ctx.dir.join(&ctx.file);

    let meta = tokio::fs::metadata(&path)
        .await
        .map_err(|_| GatewayError::NotFound)?;
    if !meta.is_file() {
        return Err(GatewayError::NotFound);
    }

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| GatewayError::NotFound)?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, meta.len());
    if let Ok(modified) = meta.modified() {
        builder = builder.header(LAST_MODIFIED, headers::http_date(modified));
    }

    let mut response = builder
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|err| GatewayError::Internal(err.to_string()))?;

    match policy {
        CachePolicy::Forever => headers::cache_forever(response.headers_mut()),
        CachePolicy::NoCache => headers::no_cache(response.headers_mut()),
    }

    Ok(response)
}
