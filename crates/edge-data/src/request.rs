//! Outbound request description.

/// An outbound `GET` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    /// Absolute URL.
    pub url: String,
    /// Request headers in insertion order.
    pub headers: Vec<(String, String)>,
}

impl UpstreamRequest {
    /// Create a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Add a header, replacing an earlier value with the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(self, agent: impl Into<String>) -> Self {
        self.header("User-Agent", agent)
    }

    /// Set the Accept header.
    pub fn accept(self, content_type: impl Into<String>) -> Self {
        self.header("Accept", content_type)
    }

    /// Add a bearer token authorization header.
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.as_ref()))
    }

    /// Make the request conditional on a stored validator. `None` and empty
    /// validators leave the request unconditional.
    pub fn if_none_match(self, etag: Option<&str>) -> Self {
        match etag.map(str::trim).filter(|e| !e.is_empty()) {
            Some(etag) => self.header("If-None-Match", etag),
            None => self,
        }
    }

    /// Get a header value (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_headers() {
        let req = UpstreamRequest::get("https://api.github.com/users/x/repos")
            .user_agent("site-functions")
            .accept("application/json")
            .bearer_auth("t0k");

        assert_eq!(req.header_value("user-agent"), Some("site-functions"));
        assert_eq!(req.header_value("ACCEPT"), Some("application/json"));
        assert_eq!(req.header_value("Authorization"), Some("Bearer t0k"));
    }

    #[test]
    fn test_header_replaces() {
        let req = UpstreamRequest::get("u").accept("a").accept("b");
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header_value("Accept"), Some("b"));
    }

    #[test]
    fn test_if_none_match_only_with_validator() {
        let req = UpstreamRequest::get("u").if_none_match(Some("\"abc\""));
        assert_eq!(req.header_value("If-None-Match"), Some("\"abc\""));

        assert!(UpstreamRequest::get("u").if_none_match(None).headers.is_empty());
        assert!(UpstreamRequest::get("u").if_none_match(Some(" ")).headers.is_empty());
    }
}
