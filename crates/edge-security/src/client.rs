//! Client identity derivation for rate limiting and logging.

use edge_core::RequestContext;

/// Shared identity used when no client address can be derived.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Default header a trusted reverse proxy sets to the client address.
pub const DEFAULT_CLIENT_IP_HEADER: &str = "x-real-ip";

/// Derive the client identity of a request.
///
/// Prefers `trusted_header`, then the first entry of `X-Forwarded-For`,
/// then [`UNKNOWN_CLIENT`]. Blank values are skipped.
pub fn client_id(ctx: &RequestContext, trusted_header: &str) -> String {
    let trusted = ctx.header(trusted_header).map(str::trim);
    let forwarded = ctx
        .header("x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .map(str::trim);

    trusted
        .filter(|v| !v.is_empty())
        .or(forwarded.filter(|v| !v.is_empty()))
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}
