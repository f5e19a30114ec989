//! Routing, the CSP report sink and the security header middleware.

mod common;

use common::*;
use edge_sdk::edge_core::{Method, StatusCode};
use edge_sdk::edge_data::ScriptedUpstream;
use edge_sdk::edge_observability::LogLevel;

#[tokio::test]
async fn test_nonce_is_generated_per_request() {
    let h = Harness::new(ScriptedUpstream::new());

    let mut first = get("/api/csp-report");
    let mut second = get("/api/csp-report");
    let a = h.app.handle(&mut first, None).await;
    let b = h.app.handle(&mut second, None).await;

    let nonce = first.nonce.clone().unwrap();
    assert_ne!(Some(nonce.clone()), second.nonce);

    let csp = a.header("Content-Security-Policy").unwrap();
    assert!(csp.contains(&format!("'nonce-{}'", nonce)));
    assert!(csp.contains("report-uri /api/csp-report"));
    assert_ne!(
        a.header("Content-Security-Policy"),
        b.header("Content-Security-Policy")
    );
}

#[tokio::test]
async fn test_security_headers_on_every_route() {
    let h = Harness::new(ScriptedUpstream::new());

    for path in ["/api/projects", "/api/csp-report", "/api/missing"] {
        let response = h.send(get(path)).await;
        assert!(response.header("Content-Security-Policy").is_some(), "{path}");
        assert!(response.header("Strict-Transport-Security").is_some(), "{path}");
        assert_eq!(response.header("X-Frame-Options"), Some("DENY"), "{path}");
        assert_eq!(response.header("X-Content-Type-Options"), Some("nosniff"));
        assert!(response.header("Permissions-Policy").is_some(), "{path}");
        assert_eq!(
            response.header("Cross-Origin-Opener-Policy"),
            Some("same-origin")
        );
        assert!(response.header("X-Request-ID").is_some(), "{path}");
    }
}

#[tokio::test]
async fn test_handler_headers_are_not_overwritten() {
    let h = Harness::new(ScriptedUpstream::new());

    let projects = h.send(get("/api/projects")).await;
    assert_eq!(projects.header("Referrer-Policy"), Some("no-referrer"));
    assert_eq!(
        projects.header("Cache-Control"),
        Some("public, max-age=300, s-maxage=900")
    );

    let csp = h.send(get("/api/csp-report")).await;
    assert_eq!(
        csp.header("Referrer-Policy"),
        Some("strict-origin-when-cross-origin")
    );
}

#[tokio::test]
async fn test_request_id_matches_context() {
    let h = Harness::new(ScriptedUpstream::new());

    let mut ctx = get("/api/csp-report");
    let response = h.app.handle(&mut ctx, None).await;

    assert_eq!(
        response.header("X-Request-ID"),
        Some(ctx.request_id.to_string().as_str())
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let h = Harness::new(ScriptedUpstream::new());

    let response = h.send(get("/api/nothing-here")).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body_text(), r#"{"error":"Not Found"}"#);
    assert_eq!(h.upstream.calls(), 0);
}

#[tokio::test]
async fn test_csp_report_statuses() {
    let h = Harness::new(ScriptedUpstream::new());

    let post = h
        .send(request(Method::Post, "/api/csp-report").with_body(r#"{"csp-report":{}}"#))
        .await;
    assert_eq!(post.status, StatusCode::ACCEPTED);
    assert_eq!(post.body_text(), r#"{"ok":true}"#);
    assert_eq!(post.header("Cache-Control"), Some("no-store"));

    let live = h.send(get("/api/csp-report")).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.header("Cache-Control"), Some("no-store"));

    let put = h.send(request(Method::Put, "/api/csp-report")).await;
    assert_eq!(put.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(put.header("Allow"), Some("GET, POST"));
    assert_eq!(put.header("Cache-Control"), Some("no-store"));

    let logs = h.logs.lock().unwrap();
    let report = logs
        .iter()
        .find(|entry| entry.message == "CSP violation reported")
        .unwrap();
    assert_eq!(report.level, LogLevel::Warn);
    assert_eq!(report.route.as_deref(), Some("/api/csp-report"));
    assert_eq!(report.fields["client"], CLIENT_IP);
}

#[tokio::test]
async fn test_completion_is_logged() {
    let h = Harness::new(ScriptedUpstream::new());

    let mut ctx = get("/api/missing");
    h.app.handle(&mut ctx, None).await;

    let logs = h.logs.lock().unwrap();
    let done = logs
        .iter()
        .find(|entry| entry.message == "Request completed")
        .unwrap();
    assert_eq!(done.request_id, ctx.request_id.to_string());
    assert_eq!(done.workload.as_deref(), Some("site-functions"));
    assert_eq!(done.fields["status"], 404);
}
