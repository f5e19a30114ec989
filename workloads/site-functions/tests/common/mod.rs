//! Shared fixtures for component tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use edge_sdk::edge_cache::{CacheError, CacheResult, EdgeStore, InMemoryStore};
use edge_sdk::edge_core::{EdgeResponse, ManualClock, Method, RequestContext};
use edge_sdk::edge_data::ScriptedUpstream;
use edge_sdk::edge_executor::BackgroundExecutor;
use edge_sdk::edge_observability::LogEntry;
use edge_sdk::edge_security::{FixedWindowLimiter, InMemoryWindowStore};
use site_functions::{Capabilities, SiteConfig, SiteFunctions};

pub const START_MS: u64 = 1_000_000;
pub const CLIENT_IP: &str = "198.51.100.7";

pub struct Harness {
    pub app: SiteFunctions,
    pub upstream: Arc<ScriptedUpstream>,
    pub clock: Arc<ManualClock>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl Harness {
    pub fn new(upstream: ScriptedUpstream) -> Self {
        Self::with_store(SiteConfig::default(), Arc::new(InMemoryStore::new()), upstream)
    }

    pub fn with_config(config: SiteConfig, upstream: ScriptedUpstream) -> Self {
        Self::with_store(config, Arc::new(InMemoryStore::new()), upstream)
    }

    pub fn with_store(
        config: SiteConfig,
        store: Arc<dyn EdgeStore>,
        upstream: ScriptedUpstream,
    ) -> Self {
        let upstream = Arc::new(upstream);
        let clock = Arc::new(ManualClock::new(START_MS));
        let logs = Arc::new(Mutex::new(Vec::new()));
        let caps = Capabilities {
            store,
            upstream: upstream.clone(),
            limiter: Arc::new(FixedWindowLimiter::new(
                config.rate_limit(),
                InMemoryWindowStore::new(),
            )),
            clock: clock.clone(),
        };

        Self {
            app: SiteFunctions::new(config, caps).with_log_capture(logs.clone()),
            upstream,
            clock,
            logs,
        }
    }

    pub async fn send(&self, ctx: RequestContext) -> EdgeResponse {
        self.send_with(ctx, None).await
    }

    pub async fn send_with(
        &self,
        mut ctx: RequestContext,
        executor: Option<&dyn BackgroundExecutor>,
    ) -> EdgeResponse {
        self.app.handle(&mut ctx, executor).await
    }

    pub fn logged(&self, message: &str) -> bool {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .any(|entry| entry.message == message)
    }
}

pub fn request(method: Method, path: &str) -> RequestContext {
    RequestContext::new(method, path).with_header("x-real-ip", CLIENT_IP)
}

pub fn get(path: &str) -> RequestContext {
    request(Method::Get, path)
}

pub fn listing() -> Value {
    json!([
        {
            "name": "site",
            "html_url": "https://github.com/no-tone/site",
            "language": "TypeScript",
            "topics": ["astro"],
            "stargazers_count": 4,
            "updated_at": "2024-05-01T10:00:00Z"
        },
        {
            "name": "dotfiles",
            "html_url": "https://github.com/no-tone/dotfiles",
            "fork": true,
            "updated_at": "2023-11-20T08:30:00Z"
        }
    ])
}

/// Store whose every operation fails.
pub struct BrokenStore;

#[async_trait]
impl EdgeStore for BrokenStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Err(CacheError::Storage("store offline".into()))
    }

    async fn put(&self, _key: &str, _value: &[u8]) -> CacheResult<()> {
        Err(CacheError::Storage("store offline".into()))
    }
}
