//! Spin HTTP entry point.

use std::sync::Arc;

use spin_sdk::http::{Fields, IncomingRequest, OutgoingResponse, ResponseOutparam};
use spin_sdk::http_component;

use edge_sdk::edge_cache::SpinKvStore;
use edge_sdk::edge_core::{EdgeResponse, Method, RequestContext, StatusCode, SystemClock};
use edge_sdk::edge_data::SpinUpstream;
use edge_sdk::edge_executor::DeferredTasks;
use edge_sdk::edge_observability::StructuredLogger;
use edge_sdk::edge_security::{FixedWindowLimiter, RateLimitEntry, WindowStore};
use edge_sdk::edge_streaming::BodySink;

use crate::config::SiteConfig;
use crate::router::{Capabilities, SiteFunctions};

const RATE_LIMIT_PREFIX: &str = "ratelimit:";

/// Window counters in the Spin key-value store.
///
/// Each request runs in a fresh instance, so counters cannot live in memory.
/// Store failures read as an empty window.
struct SpinKvWindowStore {
    logger: StructuredLogger,
}

impl SpinKvWindowStore {
    fn key(client_id: &str) -> String {
        format!("{}{}", RATE_LIMIT_PREFIX, client_id)
    }

    fn open(&self) -> Option<spin_sdk::key_value::Store> {
        match spin_sdk::key_value::Store::open_default() {
            Ok(store) => Some(store),
            Err(e) => {
                self.logger
                    .warn_builder("Rate limit store unavailable")
                    .field("error", e.to_string())
                    .emit();
                None
            }
        }
    }
}

impl WindowStore for SpinKvWindowStore {
    fn load(&self, client_id: &str) -> Option<RateLimitEntry> {
        let bytes = self.open()?.get(&Self::key(client_id)).ok()??;
        serde_json::from_slice(&bytes).ok()
    }

    fn save(&self, client_id: &str, entry: RateLimitEntry, _now_ms: u64) {
        let Some(store) = self.open() else { return };
        let result = serde_json::to_vec(&entry)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                store
                    .set(&Self::key(client_id), &bytes)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            self.logger
                .warn_builder("Rate limit write failed")
                .field("error", e)
                .emit();
        }
    }
}

fn load_config() -> anyhow::Result<SiteConfig> {
    SiteConfig::from_lookup(|name| spin_sdk::variables::get(name).ok())
}

fn method(method: spin_sdk::http::Method) -> Method {
    use spin_sdk::http::Method as Spin;
    match method {
        Spin::Get => Method::Get,
        Spin::Post => Method::Post,
        Spin::Put => Method::Put,
        Spin::Delete => Method::Delete,
        Spin::Patch => Method::Patch,
        Spin::Head => Method::Head,
        Spin::Options => Method::Options,
        Spin::Connect => Method::Other("CONNECT".to_string()),
        Spin::Trace => Method::Other("TRACE".to_string()),
        Spin::Other(other) => Method::parse(&other),
    }
}

async fn request_context(req: IncomingRequest) -> RequestContext {
    let mut ctx = RequestContext::new(
        method(req.method()),
        req.path_with_query().unwrap_or_else(|| "/".to_string()),
    );
    for (name, value) in req.headers().entries() {
        ctx.insert_header(&name, String::from_utf8_lossy(&value));
    }
    if let Ok(body) = req.into_body().await {
        ctx.body = body;
    }
    ctx
}

/// Main HTTP handler.
#[http_component]
async fn handle(req: IncomingRequest, response_out: ResponseOutparam) {
    let mut ctx = request_context(req).await;
    let deferred = DeferredTasks::new();

    let response = match load_config() {
        Ok(config) => {
            let limiter_logger = config.logger(&ctx.request_id);
            let caps = Capabilities {
                store: Arc::new(SpinKvStore::open_default()),
                upstream: Arc::new(SpinUpstream),
                limiter: Arc::new(FixedWindowLimiter::new(
                    config.rate_limit(),
                    SpinKvWindowStore {
                        logger: limiter_logger,
                    },
                )),
                clock: Arc::new(SystemClock),
            };
            SiteFunctions::new(config, caps)
                .handle(&mut ctx, Some(&deferred))
                .await
        }
        Err(e) => {
            StructuredLogger::new(ctx.request_id.clone())
                .error_builder("Invalid configuration")
                .field("error", format!("{:#}", e))
                .emit();
            EdgeResponse::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &serde_json::json!({ "error": "Internal Server Error" }),
            )
        }
    };

    send(response, ctx, response_out).await;

    // The body is finished; revalidation runs without delaying the client.
    deferred.run_all().await;
}

async fn send(response: EdgeResponse, ctx: RequestContext, response_out: ResponseOutparam) {
    let header_list: Vec<(String, Vec<u8>)> = response
        .headers()
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.clone().into_bytes()))
        .collect();

    let headers = match Fields::from_list(&header_list) {
        Ok(headers) => headers,
        Err(e) => {
            eprintln!("invalid response headers: {:?}", e);
            Fields::new()
        }
    };

    let outgoing = OutgoingResponse::new(headers);
    if outgoing.set_status_code(response.status.as_u16()).is_err() {
        eprintln!("invalid status code: {}", response.status);
    }

    let body = outgoing.take_body();
    response_out.set(outgoing);

    let mut sink = BodySink::new(body, ctx.timing);
    if let Err(e) = sink.send_body(response.body).await {
        eprintln!("failed to write response body: {}", e);
    }
    sink.finish();
}
