//! Cookie jar shared read-only by every worker.

use std::time::{SystemTime, UNIX_EPOCH};

/// One stored cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Domain as stored, e.g. `.bandcamp.com` or `bandcamp.com`.
    pub domain: String,
    pub path: String,
    pub secure: bool,
    /// Unix seconds; 0 means a session cookie.
    pub expires: i64,
    pub name: String,
    pub value: String,
}

impl Cookie {
    fn matches_host(&self, host: &str) -> bool {
        let domain = self.domain.trim_start_matches('.').to_ascii_lowercase();
        let host = host.to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{}", domain))
    }

    /// True if the cookie is scoped to `domain` itself or one of its subdomains.
    fn within_domain(&self, domain: &str) -> bool {
        let own = self.domain.trim_start_matches('.').to_ascii_lowercase();
        let domain = domain.to_ascii_lowercase();
        own == domain || own.ends_with(&format!(".{}", domain))
    }

    fn matches_path(&self, path: &str) -> bool {
        let prefix = self.path.as_str();
        if prefix.is_empty() || prefix == "/" {
            return true;
        }
        path == prefix
            || (path.starts_with(prefix)
                && (prefix.ends_with('/') || path[prefix.len()..].starts_with('/')))
    }

    fn is_expired(&self, now: i64) -> bool {
        self.expires > 0 && self.expires < now
    }
}

/// Authenticated session: the cookies sent with every storefront request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    cookies: Vec<Cookie>,
}

impl Credential {
    pub fn new(cookies: Vec<Cookie>) -> Self {
        Self { cookies }
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Keeps only cookies that apply to `domain` or its subdomains.
    pub fn restricted_to(self, domain: &str) -> Self {
        let cookies = self
            .cookies
            .into_iter()
            .filter(|c| c.within_domain(domain))
            .collect();
        Self { cookies }
    }

    /// `Cookie` header value for a request to `url`, if any cookie applies.
    pub fn cookie_header_for(&self, url: &str) -> Option<String> {
        let parsed = url::Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        let https = parsed.scheme() == "https";
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        let pairs: Vec<String> = self
            .cookies
            .iter()
            .filter(|c| c.matches_host(host) && c.matches_path(parsed.path()))
            .filter(|c| https || !c.secure)
            .filter(|c| !c.is_expired(now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}
