// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cookie storage and the XSRF cookie reader

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// Looks up the current value of a named cookie
pub trait CookieReader: Send + Sync {
    /// Current value of the cookie, if set
    fn read(&self, name: &str) -> Option<String>;
}

impl<F> CookieReader for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn read(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Reader with no cookies at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCookies;

impl CookieReader for NoCookies {
    fn read(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Script-visible cookies of a document: the jar's non-HttpOnly cookies that
/// match the document URL
#[derive(Debug, Clone)]
pub struct DocumentCookies {
    jar: CookieJar,
    document: Url,
}

impl DocumentCookies {
    /// Scope a jar to a document URL
    pub fn new(jar: CookieJar, document: Url) -> Self {
        Self { jar, document }
    }
}

impl CookieReader for DocumentCookies {
    fn read(&self, name: &str) -> Option<String> {
        self.jar
            .get_cookies(&self.document)
            .into_iter()
            .filter(|c| !c.http_only)
            .find(|c| c.name == name)
            .map(|c| c.value)
    }
}

/// A single HTTP cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Domain the cookie belongs to, empty matches every host
    pub domain: String,
    pub path: String,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// HTTPS only
    pub secure: bool,
    /// Hidden from document cookie reads
    pub http_only: bool,
}

impl Cookie {
    /// Create a session cookie valid for every path
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    /// Set the domain
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the HttpOnly flag
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set the Secure flag
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Check if the cookie is expired
    pub fn is_expired(&self) -> bool {
        self.expires.map_or(false, |exp| exp < Utc::now())
    }

    /// Check if the cookie should be sent to the URL
    pub fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("");
        self.domain_matches(host)
            && url.path().starts_with(&self.path)
            && (!self.secure || url.scheme() == "https")
            && !self.is_expired()
    }

    fn domain_matches(&self, host: &str) -> bool {
        if self.domain.is_empty() {
            return true;
        }
        let domain = self.domain.trim_start_matches('.');
        host == domain || host.ends_with(&format!(".{}", domain))
    }

    /// Parse a Set-Cookie header value received from `url`
    pub fn parse(header: &str, url: &Url) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.trim().split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie::new(name, value.trim());
        cookie.domain = url.host_str().unwrap_or("").to_string();

        for part in parts {
            let part = part.trim();
            match part.split_once('=') {
                Some((attr, val)) => {
                    let val = val.trim();
                    match attr.trim().to_ascii_lowercase().as_str() {
                        "domain" => cookie.domain = val.trim_start_matches('.').to_string(),
                        "path" => cookie.path = val.to_string(),
                        "expires" => {
                            if let Ok(dt) = DateTime::parse_from_rfc2822(val) {
                                cookie.expires = Some(dt.with_timezone(&Utc));
                            }
                        }
                        "max-age" => {
                            if let Ok(secs) = val.parse::<i64>() {
                                cookie.expires = Some(max_age_expiry(secs));
                            }
                        }
                        _ => {}
                    }
                }
                None => match part.to_ascii_lowercase().as_str() {
                    "secure" => cookie.secure = true,
                    "httponly" => cookie.http_only = true,
                    _ => {}
                },
            }
        }

        Some(cookie)
    }
}

/// Expiry for a Max-Age attribute. Zero or negative expires at once; values
/// past the representable range clamp to the latest time.
fn max_age_expiry(secs: i64) -> DateTime<Utc> {
    if secs <= 0 {
        return DateTime::<Utc>::MIN_UTC;
    }
    chrono::Duration::try_seconds(secs)
        .and_then(|age| Utc::now().checked_add_signed(age))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Thread-safe cookie storage, keyed by domain
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Arc<DashMap<String, Vec<Cookie>>>,
}

impl CookieJar {
    /// Create an empty jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cookie, replacing one with the same name and path
    pub fn add(&self, cookie: Cookie) {
        let mut entry = self.cookies.entry(cookie.domain.clone()).or_default();
        entry.retain(|c| c.name != cookie.name || c.path != cookie.path);
        if !cookie.is_expired() {
            entry.push(cookie);
        }
    }

    /// Store a cookie from a Set-Cookie header received from `url`
    pub fn add_from_header(&self, header: &str, url: &Url) {
        if let Some(cookie) = Cookie::parse(header, url) {
            self.add(cookie);
        }
    }

    /// All live cookies matching the URL
    pub fn get_cookies(&self, url: &Url) -> Vec<Cookie> {
        self.cookies
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|c| c.matches(url))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Cookie header value for a request to `url`
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.get_cookies(url);
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Remove a specific cookie
    pub fn remove(&self, name: &str, domain: &str, path: &str) {
        if let Some(mut cookies) = self.cookies.get_mut(domain) {
            cookies.retain(|c| c.name != name || c.path != path);
        }
    }

    /// Clear all cookies
    pub fn clear(&self) {
        self.cookies.clear();
    }

    /// Total cookie count
    pub fn len(&self) -> usize {
        self.cookies.iter().map(|e| e.value().len()).sum()
    }

    /// Check if jar is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
