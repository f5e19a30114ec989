//! `/api/csp-report`: sink for Content-Security-Policy violation reports.

use serde_json::json;

use edge_sdk::edge_core::{EdgeResponse, Method, RequestContext, RouteConfig, StatusCode};
use edge_sdk::edge_observability::StructuredLogger;
use edge_sdk::edge_security::client_id;

use crate::error::ClientError;

/// Handle one request to the report sink.
///
/// Report bodies are logged verbatim and never parsed; browsers send
/// several formats.
pub fn handle(
    ctx: &RequestContext,
    route: &RouteConfig,
    client_ip_header: &str,
    logger: &StructuredLogger,
) -> EdgeResponse {
    let response = match ctx.method {
        Method::Post => {
            logger
                .warn_builder("CSP violation reported")
                .field("path", ctx.path.as_str())
                .field("client", client_id(ctx, client_ip_header))
                .field_i64("bytes", ctx.body.len() as i64)
                .field("report", String::from_utf8_lossy(&ctx.body))
                .emit();
            EdgeResponse::json(StatusCode::ACCEPTED, &json!({ "ok": true }))
        }
        Method::Get => EdgeResponse::json(StatusCode::OK, &json!({ "ok": true })),
        _ => ClientError::MethodNotAllowed {
            allow: route.allow_header(),
        }
        .into_response(),
    };

    response.with_header("Cache-Control", "no-store")
}
