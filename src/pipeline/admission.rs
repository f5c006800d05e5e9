//! Admission filter: cheap synchronous gate run before a body is enqueued.
//!
//! Checks run cheapest/most-selective first — host denylist, then
//! content-type denylist, then status code — so a skipped response costs as
//! little as possible on the proxy's hot path. Pure decision logic, no side
//! effects.

use std::collections::HashSet;

/// High-traffic domains whose responses are never worth inspecting.
const DEFAULT_SKIP_HOSTS: &[&str] = &[
    "google.com",
    "gstatic.com",
    "googleapis.com",
    "github.com",
    "cloudflare.com",
    "gravatar.com",
    "youtube.com",
    "ytimg.com",
    "facebook.com",
    "fbcdn.net",
    "twitter.com",
    "twimg.com",
    "microsoft.com",
    "msn.com",
    "live.com",
    "akamai.net",
    "jsdelivr.net",
    "unpkg.com",
    "baidu.com",
    "csdn.net",
    "cnblogs.com",
];

/// Content-type prefixes that mark a body as non-text and skippable.
const SKIP_CONTENT_TYPE_PREFIXES: &[&str] = &[
    "image/",
    "font/",
    "text/css",
    "video/",
    "audio/",
    "application/font",
    "application/x-font",
];

/// Extract an approximate registrable domain: strip any `:port`, split on
/// `.`, and keep the last two labels.
///
/// This is a deliberate two-label approximation of the public-suffix rules;
/// it mis-classifies compound suffixes (`a.b.example.co.uk` yields `co.uk`).
pub fn registrable_domain(host: &str) -> String {
    let host = host.split(':').next().unwrap_or(host);
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() < 2 {
        return host.to_string();
    }
    format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1])
}

/// Decides whether a response is worth inspecting at all.
pub struct AdmissionFilter {
    skip_hosts: HashSet<String>,
}

impl AdmissionFilter {
    pub fn new() -> Self {
        Self::with_hosts(DEFAULT_SKIP_HOSTS.iter().copied())
    }

    /// Build a filter with a custom host denylist (entries are compared
    /// against the two-label registrable domain, exact match only).
    pub fn with_hosts<'a>(hosts: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            skip_hosts: hosts.into_iter().map(str::to_string).collect(),
        }
    }

    /// True if the host's registrable domain is on the denylist.
    pub fn should_skip_host(&self, host: &str) -> bool {
        self.skip_hosts.contains(&registrable_domain(host))
    }

    /// True if the content type starts with any non-text prefix.
    pub fn should_skip_content_type(&self, content_type: &str) -> bool {
        SKIP_CONTENT_TYPE_PREFIXES
            .iter()
            .any(|prefix| content_type.starts_with(prefix))
    }

    /// Full admission decision: host, then content type, then status.
    /// Only HTTP 200 responses are inspected.
    pub fn admits(&self, host: &str, content_type: &str, status_code: u16) -> bool {
        if self.should_skip_host(host) {
            return false;
        }
        if self.should_skip_content_type(content_type) {
            return false;
        }
        status_code == 200
    }
}

impl Default for AdmissionFilter {
    fn default() -> Self {
        Self::new()
    }
}
