//! Ordered route matching and dispatch.
//!
//! The gateway's URL space is a fixed table of suffix patterns. Matching is
//! deterministic: patterns are tried in registration order, specific before
//! generic (`objects/info/packs` must win over `objects/info/[^/]*`), so the
//! table below is a list, not a map. Whatever precedes the matched suffix is
//! the repository id; the suffix itself is the relative file path.

use std::path::PathBuf;

use axum::{
    extract::{Request, State},
    http::{Method, Version},
    response::{IntoResponse, Response},
};
use regex::Regex;

use gitway_git::resolve_repository;

use crate::error::GatewayError;
use crate::handlers;
use crate::state::AppState;

/// What a matched route hands the request to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// Stateless `upload-pack` / `receive-pack` RPC.
    Rpc,
    /// Smart ref advertisement with dumb fallback.
    InfoRefs,
    /// Mutable text metadata (`HEAD`, alternates, other `objects/info/*`).
    TextFile,
    /// The `objects/info/packs` listing.
    InfoPacks,
    /// A loose object.
    LooseObject,
    /// A pack file.
    PackFile,
    /// A pack index.
    IdxFile,
}

/// One registered route.
#[derive(Debug, Clone)]
pub struct Service {
    pub method: Method,
    pub kind: ServiceKind,
    /// RPC operation for smart routes, absent for static ones.
    pub rpc: Option<&'static str>,
}

/// A matched route with the extracted repository id and file suffix.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub service: &'a Service,
    pub repo: String,
    pub file: String,
}

/// Resolved per-request handler input.
///
/// Built by the dispatcher once the repository directory is known to exist,
/// consumed by exactly one handler.
#[derive(Debug)]
pub struct ServiceMatch {
    pub rpc: Option<&'static str>,
    pub dir: PathBuf,
    pub file: String,
}

/// Route identity attached to the response as an extension.
///
/// The request-log middleware picks this up so the completion event can
/// name the repository and git operation the request actually hit.
#[derive(Debug, Clone)]
pub struct RouteInfo {
    pub repo: String,
    pub operation: Option<&'static str>,
}

/// The ordered route table.
pub struct ServiceTable {
    routes: Vec<(Regex, Service)>,
}

impl ServiceTable {
    pub fn new() -> Self {
        let table: [(&str, Method, ServiceKind, Option<&'static str>); 11] = [
            (
                r"(.*?)/git-upload-pack$",
                Method::POST,
                ServiceKind::Rpc,
                Some("upload-pack"),
            ),
            (
                r"(.*?)/git-receive-pack$",
                Method::POST,
                ServiceKind::Rpc,
                Some("receive-pack"),
            ),
            (r"(.*?)/info/refs$", Method::GET, ServiceKind::InfoRefs, None),
            (r"(.*?)/HEAD$", Method::GET, ServiceKind::TextFile, None),
            (
                r"(.*?)/objects/info/alternates$",
                Method::GET,
                ServiceKind::TextFile,
                None,
            ),
            (
                r"(.*?)/objects/info/http-alternates$",
                Method::GET,
                ServiceKind::TextFile,
                None,
            ),
            (
                r"(.*?)/objects/info/packs$",
                Method::GET,
                ServiceKind::InfoPacks,
                None,
            ),
            (
                r"(.*?)/objects/info/[^/]*$",
                Method::GET,
                ServiceKind::TextFile,
                None,
            ),
            (
                r"(.*?)/objects/[0-9a-f]{2}/[0-9a-f]{38}$",
                Method::GET,
                ServiceKind::LooseObject,
                None,
            ),
            (
                r"(.*?)/objects/pack/pack-[0-9a-f]{40}\.pack$",
                Method::GET,
                ServiceKind::PackFile,
                None,
            ),
            (
                r"(.*?)/objects/pack/pack-[0-9a-f]{40}\.idx$",
                Method::GET,
                ServiceKind::IdxFile,
                None,
            ),
        ];

        let routes = table
            .into_iter()
            .map(|(pattern, method, kind, rpc)| {
                let regex = Regex::new(pattern).expect("route pattern must compile");
                (regex, Service { method, kind, rpc })
            })
            .collect();

        Self { routes }
    }

    /// Finds the first route matching `path`.
    ///
    /// RPC routes carry no file suffix; the operation is baked into the
    /// route itself.
    pub fn find(&self, path: &str) -> Option<RouteMatch<'_>> {
        for (pattern, service) in &self.routes {
            let Some(captures) = pattern.captures(path) else {
                continue;
            };
            let prefix = captures.get(1)?;

            let repo = prefix.as_str().trim_start_matches('/').to_string();
            let file = match service.kind {
                ServiceKind::Rpc => String::new(),
                _ => path[prefix.end()..].trim_start_matches('/').to_string(),
            };

            return Some(RouteMatch {
                service,
                repo,
                file,
            });
        }
        None
    }
}

impl Default for ServiceTable {
    fn default() -> Self {
        Self::new()
    }
}

/// The gateway entry point, mounted as the router fallback.
///
/// Selects a service by ordered pattern match, verifies the method, resolves
/// the repository directory, and hands the request to the service's handler.
/// Matched routes tag the response with [`RouteInfo`] for the request log.
pub async fn dispatch(State(state): State<AppState>, req: Request) -> Response {
    let path = req.uri().path().to_string();
    let Some(path) = strip_route_prefix(state.config().route_prefix(), &path) else {
        return GatewayError::NotFound.into_response();
    };

    let Some(matched) = state.services().find(path) else {
        return GatewayError::NotFound.into_response();
    };
    let route = RouteInfo {
        repo: matched.repo.clone(),
        operation: matched.service.rpc,
    };

    let mut response = handle_matched(&state, matched, req).await;
    response.extensions_mut().insert(route);
    response
}

/// Runs the matched service once the route is known.
async fn handle_matched(state: &AppState, matched: RouteMatch<'_>, req: Request) -> Response {
    if req.method() != matched.service.method {
        let legacy = req.version() < Version::HTTP_11;
        return GatewayError::MethodNotAllowed { legacy }.into_response();
    }

    let Some(dir) = resolve_repository(state.config().repository_root(), &matched.repo) else {
        return GatewayError::NotFound.into_response();
    };

    let kind = matched.service.kind;
    let ctx = ServiceMatch {
        rpc: matched.service.rpc,
        dir,
        file: matched.file,
    };

    let result = match kind {
        ServiceKind::Rpc => handlers::rpc::service_rpc(state, &ctx, req).await,
        ServiceKind::InfoRefs => handlers::info_refs::info_refs(state, &ctx, &req).await,
        ServiceKind::TextFile => handlers::files::text_file(&ctx).await,
        ServiceKind::InfoPacks => handlers::files::info_packs(&ctx).await,
        ServiceKind::LooseObject => handlers::files::loose_object(&ctx).await,
        ServiceKind::PackFile => handlers::files::pack_file(&ctx).await,
        ServiceKind::IdxFile => handlers::files::idx_file(&ctx).await,
    };

    result.unwrap_or_else(IntoResponse::into_response)
}

/// Strips the configured prefix, requiring a segment boundary after it.
fn strip_route_prefix<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    match path.strip_prefix(prefix) {
        Some("") => Some("/"),
        Some(rest) if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use axum::body::Body;

    #[test]
    fn info_refs_extracts_repo_and_file() {
        let table = ServiceTable::new();

        let m = table.find("/myrepo/info/refs").unwrap();
        assert_eq!(m.service.kind, ServiceKind::InfoRefs);
        assert_eq!(m.repo, "myrepo");
        assert_eq!(m.file, "info/refs");
    }

    #[test]
    fn rpc_routes_have_an_operation_and_no_file() {
        let table = ServiceTable::new();

        let m = table.find("/myrepo/git-upload-pack").unwrap();
        assert_eq!(m.service.kind, ServiceKind::Rpc);
        assert_eq!(m.service.rpc, Some("upload-pack"));
        assert_eq!(m.service.method, Method::POST);
        assert_eq!(m.repo, "myrepo");
        assert_eq!(m.file, "");

        let m = table.find("/myrepo/git-receive-pack").unwrap();
        assert_eq!(m.service.rpc, Some("receive-pack"));
    }

    #[test]
    fn nested_repository_ids_keep_their_slashes() {
        let table = ServiceTable::new();

        let m = table.find("/group/project.git/HEAD").unwrap();
        assert_eq!(m.repo, "group/project.git");
        assert_eq!(m.file, "HEAD");
    }

    #[test]
    fn packs_listing_wins_over_the_generic_info_pattern() {
        let table = ServiceTable::new();

        let m = table.find("/r/objects/info/packs").unwrap();
        assert_eq!(m.service.kind, ServiceKind::InfoPacks);

        let m = table.find("/r/objects/info/commit-graph").unwrap();
        assert_eq!(m.service.kind, ServiceKind::TextFile);
        assert_eq!(m.file, "objects/info/commit-graph");
    }

    #[test]
    fn loose_objects_need_exact_hash_lengths() {
        let table = ServiceTable::new();

        let full = format!("/r/objects/ab/{}", "c".repeat(38));
        let m = table.find(&full).unwrap();
        assert_eq!(m.service.kind, ServiceKind::LooseObject);

        let short = format!("/r/objects/ab/{}", "c".repeat(37));
        assert!(table.find(&short).is_none());
    }

    #[test]
    fn pack_and_idx_files_match_their_extensions() {
        let table = ServiceTable::new();
        let hash = "a".repeat(40);

        let m = table
            .find(&format!("/r/objects/pack/pack-{hash}.pack"))
            .unwrap();
        assert_eq!(m.service.kind, ServiceKind::PackFile);
        assert_eq!(m.file, format!("objects/pack/pack-{hash}.pack"));

        let m = table
            .find(&format!("/r/objects/pack/pack-{hash}.idx"))
            .unwrap();
        assert_eq!(m.service.kind, ServiceKind::IdxFile);

        assert!(
            table
                .find(&format!("/r/objects/pack/pack-{hash}.bitmap"))
                .is_none()
        );
    }

    #[test]
    fn unknown_paths_do_not_match() {
        let table = ServiceTable::new();

        assert!(table.find("/myrepo/unknown").is_none());
        assert!(table.find("/").is_none());
    }

    #[tokio::test]
    async fn matched_routes_tag_the_response_with_route_info() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("myrepo")).unwrap();
        let state = AppState::new(
            GatewayConfig::builder()
                .repository_root(root.path())
                .git_bin_path("/nonexistent/git")
                .build()
                .unwrap(),
        );

        // Denied without a content type, but the route itself is known.
        let req = Request::builder()
            .uri("/myrepo/git-upload-pack")
            .method("POST")
            .body(Body::empty())
            .unwrap();
        let response = dispatch(State(state.clone()), req).await;

        let route = response.extensions().get::<RouteInfo>().unwrap();
        assert_eq!(route.repo, "myrepo");
        assert_eq!(route.operation, Some("upload-pack"));
    }

    #[tokio::test]
    async fn unmatched_requests_carry_no_route_info() {
        let root = tempfile::tempdir().unwrap();
        let state = AppState::new(
            GatewayConfig::builder()
                .repository_root(root.path())
                .build()
                .unwrap(),
        );

        let req = Request::builder()
            .uri("/nowhere")
            .body(Body::empty())
            .unwrap();
        let response = dispatch(State(state), req).await;

        assert!(response.extensions().get::<RouteInfo>().is_none());
    }

    #[test]
    fn route_prefix_requires_a_segment_boundary() {
        assert_eq!(strip_route_prefix("", "/repo/HEAD"), Some("/repo/HEAD"));
        assert_eq!(
            strip_route_prefix("/git", "/git/repo/HEAD"),
            Some("/repo/HEAD")
        );
        assert_eq!(strip_route_prefix("/git", "/git"), Some("/"));
        assert_eq!(strip_route_prefix("/git", "/gitrepo/HEAD"), None);
        assert_eq!(strip_route_prefix("/git", "/repo/HEAD"), None);
    }
}
