//! Operation access gate.
//!
//! The only operations that can ever be granted are `upload-pack`
//! (clone/fetch) and `receive-pack` (push); every other operation string is
//! denied outright. An enabled global flag grants without looking any
//! further. When the flag is off, the repository's own
//! `git config http.uploadpack` / `http.receivepack` value may re-enable the
//! operation for that one repository; an unset or unreadable value means no
//! override.

use std::path::Path;

use crate::state::AppState;

pub const UPLOAD_PACK: &str = "upload-pack";
pub const RECEIVE_PACK: &str = "receive-pack";

/// Decides whether an operation may proceed.
///
/// `content_type` is `Some(header value)` for RPC POSTs, where the body must
/// be declared as `application/x-git-<op>-request`; `None` disables the check
/// for GET ref advertisements.
pub async fn has_access(
    state: &AppState,
    dir: &Path,
    rpc: &str,
    content_type: Option<&str>,
) -> bool {
    if let Some(content_type) = content_type
        && content_type != format!("application/x-git-{rpc}-request")
    {
        return false;
    }

    let enabled = match rpc {
        UPLOAD_PACK => state.config().upload_pack(),
        RECEIVE_PACK => state.config().receive_pack(),
        _ => return false,
    };

    if enabled {
        return true;
    }

    local_override(state, dir, rpc).await
}

/// Repository-local override, consulted only when the global flag is off.
///
/// Grants only on an explicit `true`; lookup failures degrade to "no
/// override" without failing the request.
async fn local_override(state: &AppState, dir: &Path, rpc: &str) -> bool {
    let key = format!("http.{}", rpc.replace('-', ""));
    matches!(
        state.runner().config_get(dir, &key).await.as_deref(),
        Some("true")
    )
}
