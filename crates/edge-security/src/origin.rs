//! Same-origin enforcement for browser requests.

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// `Origin` header names another site.
    OriginMismatch(String),
    /// `Sec-Fetch-Site: cross-site`.
    CrossSiteFetch,
}

impl std::fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OriginMismatch(origin) => write!(f, "origin mismatch: {}", origin),
            Self::CrossSiteFetch => write!(f, "cross-site fetch"),
        }
    }
}

/// Outcome of an origin check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDecision {
    /// Request may proceed. `cors_origin` is the accepted `Origin` value to
    /// echo back, `None` when the request carried no `Origin`.
    Allowed { cors_origin: Option<String> },
    /// Request must be rejected.
    Forbidden(ForbiddenReason),
}

impl OriginDecision {
    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Guard accepting same-origin browser requests and non-browser clients.
#[derive(Debug, Clone)]
pub struct OriginGuard {
    site_origin: String,
}

impl OriginGuard {
    /// Create a guard for the site served at `site_origin`
    /// (e.g. `https://no-tone.com`).
    pub fn new(site_origin: impl AsRef<str>) -> Self {
        Self {
            site_origin: normalize_origin(site_origin.as_ref()),
        }
    }

    /// The normalized site origin.
    pub fn site_origin(&self) -> &str {
        &self.site_origin
    }

    /// Check the `Origin` and `Sec-Fetch-Site` request headers.
    ///
    /// Requests without an `Origin` header are allowed.
    pub fn check(&self, origin: Option<&str>, sec_fetch_site: Option<&str>) -> OriginDecision {
        if sec_fetch_site
            .map(|site| site.trim().eq_ignore_ascii_case("cross-site"))
            .unwrap_or(false)
        {
            return OriginDecision::Forbidden(ForbiddenReason::CrossSiteFetch);
        }

        match origin {
            None => OriginDecision::Allowed { cors_origin: None },
            Some(origin) if normalize_origin(origin) == self.site_origin => {
                OriginDecision::Allowed {
                    cors_origin: Some(origin.trim().to_string()),
                }
            }
            Some(origin) => {
                OriginDecision::Forbidden(ForbiddenReason::OriginMismatch(origin.to_string()))
            }
        }
    }
}

fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}
