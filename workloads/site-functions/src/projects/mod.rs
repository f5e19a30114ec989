//! `/api/projects`: cached, rate-limited repository listing.

mod cache;
mod repository;
mod upstream;

pub use cache::*;
pub use repository::*;
pub use upstream::*;

use std::sync::Arc;

use edge_sdk::edge_cache::{etag_matches, generate_etag, CacheHeadersBuilder, RouteCachePolicy};
use edge_sdk::edge_core::{
    Clock, EdgeResponse, Method, RequestContext, RouteConfig, StatusCode, JSON_CONTENT_TYPE,
};
use edge_sdk::edge_executor::BackgroundExecutor;
use edge_sdk::edge_observability::StructuredLogger;
use edge_sdk::edge_security::{client_id, OriginDecision, OriginGuard, RateLimiter};

use crate::error::ClientError;

/// Handler for the projects route.
#[derive(Clone)]
pub struct ProjectsEndpoint {
    guard: OriginGuard,
    limiter: Arc<dyn RateLimiter>,
    cache: ProjectsCache,
    clock: Arc<dyn Clock>,
    policy: RouteCachePolicy,
    client_ip_header: String,
}

impl ProjectsEndpoint {
    pub fn new(
        guard: OriginGuard,
        limiter: Arc<dyn RateLimiter>,
        cache: ProjectsCache,
        clock: Arc<dyn Clock>,
        policy: RouteCachePolicy,
        client_ip_header: impl Into<String>,
    ) -> Self {
        Self {
            guard,
            limiter,
            cache,
            clock,
            policy,
            client_ip_header: client_ip_header.into(),
        }
    }

    pub fn cache(&self) -> &ProjectsCache {
        &self.cache
    }

    /// Handle one request.
    ///
    /// Every request counts against the client's window, rejected ones
    /// included. Rejections are checked in order: origin, method, rate.
    pub async fn handle(
        &self,
        ctx: &RequestContext,
        route: &RouteConfig,
        logger: &StructuredLogger,
        executor: Option<&dyn BackgroundExecutor>,
    ) -> EdgeResponse {
        let now_ms = self.clock.now_ms();
        let client = client_id(ctx, &self.client_ip_header);
        let rate = self.limiter.check(&client, now_ms);
        let decision = self.guard.check(ctx.header("origin"), ctx.header("sec-fetch-site"));

        let rejection = match &decision {
            OriginDecision::Forbidden(reason) => {
                logger
                    .warn_builder("Origin rejected")
                    .field("client", client.as_str())
                    .field("reason", reason.to_string())
                    .emit();
                Some(ClientError::Forbidden)
            }
            OriginDecision::Allowed { .. } if ctx.method != Method::Get => {
                Some(ClientError::MethodNotAllowed {
                    allow: route.allow_header(),
                })
            }
            OriginDecision::Allowed { .. } if rate.blocked => {
                logger
                    .warn_builder("Rate limit exceeded")
                    .field("client", client.as_str())
                    .field_i64("limit", rate.limit as i64)
                    .emit();
                Some(ClientError::RateLimited {
                    retry_after_secs: rate.retry_after_secs(now_ms),
                })
            }
            OriginDecision::Allowed { .. } => None,
        };

        let mut response = match rejection {
            Some(error) => error.into_response(),
            None => {
                let payload = self.cache.serve(logger, executor).await;
                self.listing_response(ctx, payload)
            }
        };

        response = response
            .with_header("Content-Type", JSON_CONTENT_TYPE)
            .with_header("Cache-Control", self.policy.cache_control_header())
            .with_header("X-Content-Type-Options", "nosniff")
            .with_header("Cross-Origin-Resource-Policy", "same-origin")
            .with_header("Referrer-Policy", "no-referrer")
            .with_headers(rate.headers());

        if let OriginDecision::Allowed {
            cors_origin: Some(origin),
        } = decision
        {
            response = response
                .with_header("Access-Control-Allow-Origin", origin)
                .with_header("Vary", "Origin");
        }

        response
    }

    fn listing_response(&self, ctx: &RequestContext, payload: ProjectsPayload) -> EdgeResponse {
        let etag = generate_etag(payload.body.as_bytes());

        let not_modified = ctx
            .header("if-none-match")
            .map(|candidate| etag_matches(candidate, &etag))
            .unwrap_or(false);

        let response = if not_modified {
            EdgeResponse::new(StatusCode::NOT_MODIFIED)
        } else {
            EdgeResponse::raw_json(StatusCode::OK, payload.body.into_bytes())
        };

        response.with_headers(
            CacheHeadersBuilder::new()
                .etag(&etag)
                .status(payload.status)
                .last_updated(&payload.last_updated_iso)
                .build(),
        )
    }
}
