// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request configuration

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use super::header_map::Headers;
use crate::cancel::CancelToken;
use crate::error::Error;

/// Cookie read for XSRF protection by [`RequestConfig::xsrf_defaults`]
pub const DEFAULT_XSRF_COOKIE_NAME: &str = "XSRF-TOKEN";

/// Header written for XSRF protection by [`RequestConfig::xsrf_defaults`]
pub const DEFAULT_XSRF_HEADER_NAME: &str = "X-XSRF-TOKEN";

/// A fully resolved request, consumed by one exchange
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Target URL, absolute or relative to the document
    pub url: String,
    /// HTTP method, any case
    pub method: String,
    /// Request body
    pub data: Option<Bytes>,
    /// Request headers
    pub headers: Headers,
    /// How the response body should be exposed
    pub response_type: Option<ResponseType>,
    /// Timeout in milliseconds, 0 disables it
    pub timeout: Option<u64>,
    /// Cancellation source
    pub cancel_token: Option<CancelToken>,
    /// Send credentials on cross-origin requests
    pub with_credentials: bool,
    /// Cookie holding the XSRF token
    pub xsrf_cookie_name: Option<String>,
    /// Header that echoes the XSRF token
    pub xsrf_header_name: Option<String>,
}

impl RequestConfig {
    /// Create a GET request config
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            data: None,
            headers: Headers::new(),
            response_type: None,
            timeout: None,
            cancel_token: None,
            with_credentials: false,
            xsrf_cookie_name: None,
            xsrf_header_name: None,
        }
    }

    /// Create a GET request config
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url)
    }

    /// Create a POST request config with a body
    pub fn post(url: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::new(url).method("POST").data(data)
    }

    /// Set the method
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Set the body
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace all headers
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Set the response type
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Set the timeout in milliseconds
    pub fn timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    /// Attach a cancel token
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Send credentials cross-origin
    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    /// Set the XSRF cookie name
    pub fn xsrf_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.xsrf_cookie_name = Some(name.into());
        self
    }

    /// Set the XSRF header name
    pub fn xsrf_header_name(mut self, name: impl Into<String>) -> Self {
        self.xsrf_header_name = Some(name.into());
        self
    }

    /// Use the conventional `XSRF-TOKEN` cookie / `X-XSRF-TOKEN` header pair
    pub fn xsrf_defaults(self) -> Self {
        self.xsrf_cookie_name(DEFAULT_XSRF_COOKIE_NAME)
            .xsrf_header_name(DEFAULT_XSRF_HEADER_NAME)
    }
}

/// Response body representation requested from the handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseType {
    /// Host default (text)
    #[default]
    Default,
    /// Raw text
    Text,
    /// Parsed JSON, null when the body is not valid JSON
    Json,
    /// Raw bytes
    ArrayBuffer,
    /// Raw bytes
    Blob,
    /// Markup, exposed as text
    Document,
}

impl ResponseType {
    /// Wire name of the response type
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Default => "",
            ResponseType::Text => "text",
            ResponseType::Json => "json",
            ResponseType::ArrayBuffer => "arraybuffer",
            ResponseType::Blob => "blob",
            ResponseType::Document => "document",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" => Ok(ResponseType::Default),
            "text" => Ok(ResponseType::Text),
            "json" => Ok(ResponseType::Json),
            "arraybuffer" => Ok(ResponseType::ArrayBuffer),
            "blob" => Ok(ResponseType::Blob),
            "document" => Ok(ResponseType::Document),
            other => Err(Error::Config(format!("unknown response type '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let config = RequestConfig::new("http://api.test/items");
        assert_eq!(config.method, "GET");
        assert!(config.data.is_none());
        assert!(config.headers.is_empty());
        assert!(!config.with_credentials);
        assert!(config.xsrf_cookie_name.is_none());
    }

    #[test]
    fn test_request_builder() {
        let config = RequestConfig::post("http://api.test/items", "{}")
            .header("Content-Type", "application/json")
            .timeout(2000)
            .with_credentials(true)
            .xsrf_defaults();

        assert_eq!(config.method, "POST");
        assert_eq!(config.data.as_deref(), Some(&b"{}"[..]));
        assert_eq!(config.headers.get("Content-Type"), Some("application/json"));
        assert_eq!(config.timeout, Some(2000));
        assert_eq!(config.xsrf_cookie_name.as_deref(), Some("XSRF-TOKEN"));
        assert_eq!(config.xsrf_header_name.as_deref(), Some("X-XSRF-TOKEN"));
    }

    #[test]
    fn test_response_type_parse() {
        assert_eq!("JSON".parse::<ResponseType>().unwrap(), ResponseType::Json);
        assert_eq!("".parse::<ResponseType>().unwrap(), ResponseType::Default);
        assert!("stream".parse::<ResponseType>().is_err());
    }
}
