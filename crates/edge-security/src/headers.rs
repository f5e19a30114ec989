//! Security response headers and CSP nonces.

use base64::{engine::general_purpose::STANDARD, Engine};
use edge_core::EdgeResponse;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Generate a fresh CSP nonce (16 random bytes, base64).
pub fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    STANDARD.encode(bytes)
}

/// Content-Security-Policy builder.
///
/// Directives render in insertion order; a `'nonce-…'` source is appended
/// to `script-src` and `style-src` when a nonce is supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSecurityPolicy {
    directives: Vec<(String, Vec<String>)>,
    report_uri: Option<String>,
}

impl Default for ContentSecurityPolicy {
    fn default() -> Self {
        Self::new()
            .directive("default-src", &["'self'"])
            .directive("script-src", &["'self'", "'strict-dynamic'"])
            .directive("style-src", &["'self'"])
            .directive("img-src", &["'self'", "data:", "https:"])
            .directive("font-src", &["'self'", "data:"])
            .directive("connect-src", &["'self'"])
            .directive("object-src", &["'none'"])
            .directive("base-uri", &["'self'"])
            .directive("form-action", &["'self'"])
            .directive("frame-ancestors", &["'none'"])
            .with_report_uri("/api/csp-report")
    }
}

impl ContentSecurityPolicy {
    /// Create an empty policy.
    pub fn new() -> Self {
        Self {
            directives: Vec::new(),
            report_uri: None,
        }
    }

    /// Set a directive, replacing any previous sources for it.
    pub fn directive(mut self, name: &str, sources: &[&str]) -> Self {
        let sources: Vec<String> = sources.iter().map(|s| s.to_string()).collect();
        match self.directives.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = sources,
            None => self.directives.push((name.to_string(), sources)),
        }
        self
    }

    /// Set the violation report endpoint.
    pub fn with_report_uri(mut self, uri: impl Into<String>) -> Self {
        self.report_uri = Some(uri.into());
        self
    }

    /// Render the header value.
    pub fn render(&self, nonce: Option<&str>) -> String {
        let mut parts: Vec<String> = self
            .directives
            .iter()
            .map(|(name, sources)| {
                let mut sources = sources.clone();
                if let Some(nonce) = nonce {
                    if name == "script-src" || name == "style-src" {
                        sources.push(format!("'nonce-{}'", nonce));
                    }
                }
                if sources.is_empty() {
                    name.clone()
                } else {
                    format!("{} {}", name, sources.join(" "))
                }
            })
            .collect();

        if let Some(uri) = &self.report_uri {
            parts.push(format!("report-uri {}", uri));
        }

        parts.join("; ")
    }
}

/// Hardening headers applied to every response of the component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityHeaders {
    pub csp: ContentSecurityPolicy,
    pub hsts: String,
    pub frame_options: String,
    pub referrer_policy: String,
    pub permissions_policy: String,
    pub opener_policy: String,
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        Self {
            csp: ContentSecurityPolicy::default(),
            hsts: "max-age=63072000; includeSubDomains; preload".to_string(),
            frame_options: "DENY".to_string(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
            permissions_policy: "camera=(), microphone=(), geolocation=(), interest-cohort=()"
                .to_string(),
            opener_policy: "same-origin".to_string(),
        }
    }
}

impl SecurityHeaders {
    /// Header pairs for a response carrying `nonce`.
    pub fn to_headers(&self, nonce: Option<&str>) -> Vec<(String, String)> {
        vec![
            ("Content-Security-Policy".to_string(), self.csp.render(nonce)),
            ("Strict-Transport-Security".to_string(), self.hsts.clone()),
            ("X-Frame-Options".to_string(), self.frame_options.clone()),
            ("X-Content-Type-Options".to_string(), "nosniff".to_string()),
            ("Referrer-Policy".to_string(), self.referrer_policy.clone()),
            ("Permissions-Policy".to_string(), self.permissions_policy.clone()),
            ("Cross-Origin-Opener-Policy".to_string(), self.opener_policy.clone()),
        ]
    }

    /// Add the headers a handler did not set itself. HTML responses are
    /// marked `no-store` since they embed the per-request nonce.
    pub fn apply(&self, response: &mut EdgeResponse, nonce: Option<&str>) {
        for (name, value) in self.to_headers(nonce) {
            response.set_header_if_absent(&name, value);
        }
        if response.is_html() {
            response.set_header("Cache-Control", "no-store");
        }
    }
}
