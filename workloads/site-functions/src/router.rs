//! Route dispatch and response middleware.

use std::sync::{Arc, Mutex};

use edge_sdk::edge_cache::EdgeStore;
use edge_sdk::edge_core::{Clock, EdgeResponse, RequestContext, RouteConfig, WorkloadManifest};
use edge_sdk::edge_data::Upstream;
use edge_sdk::edge_executor::BackgroundExecutor;
use edge_sdk::edge_observability::LogEntry;
use edge_sdk::edge_security::{generate_nonce, OriginGuard, RateLimiter, SecurityHeaders};

use crate::config::SiteConfig;
use crate::csp_report;
use crate::error::ClientError;
use crate::projects::{ProjectsCache, ProjectsEndpoint, ProjectsFetcher};
use crate::WORKLOAD_NAME;

pub const PROJECTS_ROUTE: &str = "/api/projects";
pub const CSP_REPORT_ROUTE: &str = "/api/csp-report";

/// Routes served by the component.
pub fn manifest() -> WorkloadManifest {
    WorkloadManifest::new(WORKLOAD_NAME, env!("CARGO_PKG_VERSION"))
        .with_route(RouteConfig::new(PROJECTS_ROUTE, "projects"))
        .with_route(
            RouteConfig::new(CSP_REPORT_ROUTE, "csp_report").with_methods(vec!["GET", "POST"]),
        )
}

/// Host capabilities the handlers run against.
#[derive(Clone)]
pub struct Capabilities {
    pub store: Arc<dyn EdgeStore>,
    pub upstream: Arc<dyn Upstream>,
    pub limiter: Arc<dyn RateLimiter>,
    pub clock: Arc<dyn Clock>,
}

/// The component: configuration, capabilities and routes.
pub struct SiteFunctions {
    config: SiteConfig,
    manifest: WorkloadManifest,
    projects: ProjectsEndpoint,
    security: SecurityHeaders,
    log_capture: Option<Arc<Mutex<Vec<LogEntry>>>>,
}

impl SiteFunctions {
    pub fn new(config: SiteConfig, caps: Capabilities) -> Self {
        let fetcher = ProjectsFetcher::from_config(caps.upstream, &config);
        let cache = ProjectsCache::new(caps.store, fetcher, caps.clock.clone(), config.cache_ttl());
        let projects = ProjectsEndpoint::new(
            OriginGuard::new(&config.site_origin),
            caps.limiter,
            cache,
            caps.clock,
            config.projects_cache_policy(),
            &config.client_ip_header,
        );

        Self {
            manifest: manifest(),
            projects,
            security: SecurityHeaders::default(),
            log_capture: None,
            config,
        }
    }

    /// Send log entries to `buffer` instead of stderr.
    pub fn with_log_capture(mut self, buffer: Arc<Mutex<Vec<LogEntry>>>) -> Self {
        self.log_capture = Some(buffer);
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn manifest(&self) -> &WorkloadManifest {
        &self.manifest
    }

    pub fn projects(&self) -> &ProjectsEndpoint {
        &self.projects
    }

    /// Handle one request.
    ///
    /// Generates the CSP nonce into `ctx`, dispatches to the route handler,
    /// then applies the security headers to whatever the handler returned.
    /// Work submitted to `executor` must only run after the response is sent.
    pub async fn handle(
        &self,
        ctx: &mut RequestContext,
        executor: Option<&dyn BackgroundExecutor>,
    ) -> EdgeResponse {
        ctx.nonce = Some(generate_nonce());

        let mut logger = self.config.logger(&ctx.request_id).with_route(&ctx.path);
        if let Some(buffer) = &self.log_capture {
            logger = logger.with_capture(buffer.clone());
        }

        logger
            .debug_builder("Request started")
            .field("method", ctx.method.as_str())
            .emit();

        let ctx = &*ctx;
        let mut response = match self.manifest.route_for(&ctx.path) {
            Some(route) => match route.handler.as_str() {
                "projects" => self.projects.handle(ctx, route, &logger, executor).await,
                "csp_report" => {
                    csp_report::handle(ctx, route, &self.config.client_ip_header, &logger)
                }
                _ => ClientError::NotFound.into_response(),
            },
            None => ClientError::NotFound.into_response(),
        };

        self.security.apply(&mut response, ctx.nonce.as_deref());
        response.set_header_if_absent("X-Request-ID", ctx.request_id.to_string());

        logger
            .info_builder("Request completed")
            .field("method", ctx.method.as_str())
            .field_i64("status", response.status.as_u16() as i64)
            .field("cache", response.header("X-Cache-Status").unwrap_or("-"))
            .duration_ms("duration_ms", ctx.timing.elapsed())
            .emit();

        response
    }
}
