//! Edge functions for the personal site.
//!
//! Routes:
//! - `/api/projects` - Repository listing proxy with a stale-while-revalidate
//!   cache, per-client rate limiting and conditional requests
//! - `/api/csp-report` - CSP violation report sink
//!
//! Every response passes through the security header middleware in
//! [`SiteFunctions::handle`].

pub mod config;
pub mod csp_report;
pub mod error;
pub mod projects;
pub mod router;

#[cfg(target_arch = "wasm32")]
mod platform;

pub use config::SiteConfig;
pub use error::ClientError;
pub use router::{manifest, Capabilities, SiteFunctions, CSP_REPORT_ROUTE, PROJECTS_ROUTE};

/// Name reported in logs and the manifest.
pub const WORKLOAD_NAME: &str = "site-functions";
