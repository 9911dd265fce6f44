// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! reqwest-backed request handle

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, Method};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use super::cookie::CookieJar;
use super::header_map::Headers;
use super::request::ResponseType;
use super::response::ResponseData;
use super::{headers, DEFAULT_USER_AGENT};
use crate::adapter::{
    HandleEvent, HandleEvents, HandleFactory, HandleSnapshot, ReadyState, RequestHandle,
};
use crate::error::{Error, Result};

/// Configuration shared by every handle a factory creates
#[derive(Debug, Clone)]
pub struct HttpHandleConfig {
    /// User agent string
    pub user_agent: String,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Accept invalid certificates (dangerous!)
    pub accept_invalid_certs: bool,
    /// Headers sent with every request
    pub default_headers: HeaderMap,
    /// Proxy URL
    pub proxy: Option<String>,
    /// URL of the current document, the origin requests are compared to
    pub document_url: Option<Url>,
}

impl Default for HttpHandleConfig {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(headers::ACCEPT, HeaderValue::from_static("*/*"));

        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: 10,
            accept_invalid_certs: false,
            default_headers,
            proxy: None,
            document_url: None,
        }
    }
}

impl HttpHandleConfig {
    /// Create a default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the redirect limit
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Accept invalid TLS certificates
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Set proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set the document URL
    pub fn document_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.document_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }
}

/// Creates [`HttpHandle`]s sharing one client and cookie jar
#[derive(Clone)]
pub struct HttpHandleFactory {
    client: Client,
    cookie_jar: CookieJar,
    config: HttpHandleConfig,
}

impl HttpHandleFactory {
    /// Factory with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpHandleConfig::default())
    }

    /// Factory with custom configuration
    pub fn with_config(config: HttpHandleConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .default_headers(config.default_headers.clone());

        if let Some(ref proxy_url) = config.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy_url)
                    .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?,
            );
        }

        Ok(Self {
            client: builder.build()?,
            cookie_jar: CookieJar::new(),
            config,
        })
    }

    /// Get the cookie jar
    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookie_jar
    }

    /// Get the document URL
    pub fn document_url(&self) -> Option<&Url> {
        self.config.document_url.as_ref()
    }

    /// Get factory configuration
    pub fn config(&self) -> &HttpHandleConfig {
        &self.config
    }
}

impl HandleFactory for HttpHandleFactory {
    type Handle = HttpHandle;

    fn create(&self) -> HttpHandle {
        HttpHandle {
            client: self.client.clone(),
            cookie_jar: self.cookie_jar.clone(),
            document_url: self.config.document_url.clone(),
            method: None,
            url: None,
            headers: HeaderMap::new(),
            request_headers: Headers::new(),
            timeout: None,
            response_type: ResponseType::Default,
            with_credentials: false,
            events: None,
            shared: Arc::new(Mutex::new(Shared::default())),
            task: None,
        }
    }
}

/// State written by the in-flight task and read through the handle getters
#[derive(Debug, Default)]
struct Shared {
    ready_state: ReadyState,
    status: u16,
    status_text: String,
    raw_headers: String,
    body: Bytes,
    aborted: bool,
}

impl Shared {
    fn reset_to_failure(&mut self) {
        self.ready_state = ReadyState::Done;
        self.status = 0;
        self.status_text.clear();
        self.raw_headers.clear();
        self.body = Bytes::new();
    }
}

/// One request over reqwest, reporting progress as [`HandleEvent`]s
pub struct HttpHandle {
    client: Client,
    cookie_jar: CookieJar,
    document_url: Option<Url>,
    method: Option<Method>,
    url: Option<Url>,
    headers: HeaderMap,
    request_headers: Headers,
    timeout: Option<Duration>,
    response_type: ResponseType,
    with_credentials: bool,
    events: Option<mpsc::UnboundedSender<HandleEvent>>,
    shared: Arc<Mutex<Shared>>,
    task: Option<JoinHandle<()>>,
}

impl HttpHandle {
    fn is_same_origin(&self, url: &Url) -> bool {
        self.document_url
            .as_ref()
            .map_or(false, |doc| doc.origin() == url.origin())
    }
}

fn emit(events: &Option<mpsc::UnboundedSender<HandleEvent>>, event: HandleEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

/// Render a header map as a raw `name: value\r\n` block
fn raw_header_block(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            format!("{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes()))
        })
        .collect()
}

struct Flight {
    client: Client,
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    cookie_jar: CookieJar,
    use_cookies: bool,
    shared: Arc<Mutex<Shared>>,
    events: Option<mpsc::UnboundedSender<HandleEvent>>,
}

/// Reports the terminal events of one flight. Dropped unfinished (task panic
/// or cancellation) it reports a transport error unless the handle was aborted.
struct Completion {
    shared: Arc<Mutex<Shared>>,
    events: Option<mpsc::UnboundedSender<HandleEvent>>,
    finished: bool,
}

impl Completion {
    fn new(shared: Arc<Mutex<Shared>>, events: Option<mpsc::UnboundedSender<HandleEvent>>) -> Self {
        Self {
            shared,
            events,
            finished: false,
        }
    }

    fn finish(mut self, url: &Url, result: Option<std::result::Result<(), reqwest::Error>>) {
        self.finished = true;
        let mut state = self.shared.lock();
        if state.aborted {
            return;
        }
        match result {
            Some(Ok(())) => {
                state.ready_state = ReadyState::Done;
                drop(state);
                emit(&self.events, HandleEvent::ReadyStateChange);
            }
            Some(Err(err)) => {
                tracing::debug!(%url, error = %err, "request failed");
                state.reset_to_failure();
                drop(state);
                emit(&self.events, HandleEvent::ReadyStateChange);
                emit(&self.events, HandleEvent::Error(err.to_string()));
            }
            None => {
                tracing::debug!(%url, "request timed out");
                state.reset_to_failure();
                drop(state);
                emit(&self.events, HandleEvent::ReadyStateChange);
                emit(&self.events, HandleEvent::Timeout);
            }
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut state = self.shared.lock();
        if state.aborted {
            return;
        }
        tracing::warn!("request task ended without a result");
        state.reset_to_failure();
        drop(state);
        emit(&self.events, HandleEvent::ReadyStateChange);
        emit(&self.events, HandleEvent::Error("request task ended without a result".to_string()));
    }
}

impl Flight {
    async fn run(self, timeout: Option<Duration>) {
        let completion = Completion::new(self.shared.clone(), self.events.clone());
        let url = self.url.clone();

        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetch()).await.ok(),
            None => Some(self.fetch().await),
        };

        completion.finish(&url, result);
    }

    async fn fetch(self) -> std::result::Result<(), reqwest::Error> {
        let mut builder = self
            .client
            .request(self.method, self.url.clone())
            .headers(self.headers);

        if self.use_cookies {
            if let Some(cookie_header) = self.cookie_jar.cookie_header(&self.url) {
                builder = builder.header(headers::COOKIE, cookie_header);
            }
        }
        if let Some(body) = self.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        if self.use_cookies {
            for cookie in response.headers().get_all(headers::SET_COOKIE) {
                if let Ok(cookie_str) = cookie.to_str() {
                    self.cookie_jar.add_from_header(cookie_str, response.url());
                }
            }
        }

        {
            let mut state = self.shared.lock();
            if state.aborted {
                return Ok(());
            }
            let status = response.status();
            state.ready_state = ReadyState::HeadersReceived;
            state.status = status.as_u16();
            // reqwest does not surface the reason phrase the server sent.
            state.status_text = status.canonical_reason().unwrap_or("").to_string();
            state.raw_headers = raw_header_block(response.headers());
        }
        emit(&self.events, HandleEvent::ReadyStateChange);

        self.shared.lock().ready_state = ReadyState::Loading;
        emit(&self.events, HandleEvent::ReadyStateChange);

        let body = response.bytes().await?;
        self.shared.lock().body = body;
        Ok(())
    }
}

impl RequestHandle for HttpHandle {
    fn set_response_type(&mut self, response_type: ResponseType) {
        self.response_type = response_type;
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    fn set_with_credentials(&mut self, with_credentials: bool) {
        self.with_credentials = with_credentials;
    }

    fn open(&mut self, method: &str, url: &str) -> Result<()> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| Error::InvalidMethod(method.to_string()))?;
        let url = match &self.document_url {
            Some(document) => document.join(url)?,
            None => Url::parse(url)?,
        };

        self.method = Some(method);
        self.url = Some(url);
        self.shared.lock().ready_state = ReadyState::Opened;
        emit(&self.events, HandleEvent::ReadyStateChange);
        Ok(())
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<()> {
        if self.url.is_none() {
            return Err(Error::invalid_state("set_request_header called before open"));
        }
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::invalid_header(name, e))?;
        // Repeated names join into one value, whatever their case.
        let joined = match self.headers.get(&header_name) {
            Some(existing) => [existing.as_bytes(), &b", "[..], value.as_bytes()].concat(),
            None => value.as_bytes().to_vec(),
        };
        let header_value =
            HeaderValue::from_bytes(&joined).map_err(|e| Error::invalid_header(name, e))?;
        self.headers.insert(header_name, header_value);
        self.request_headers.combine(name, value);
        Ok(())
    }

    fn subscribe(&mut self) -> HandleEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    fn send(&mut self, body: Option<Bytes>) -> Result<()> {
        if self.task.is_some() {
            return Err(Error::invalid_state("request already sent"));
        }
        let (Some(method), Some(url)) = (self.method.clone(), self.url.clone()) else {
            return Err(Error::invalid_state("send called before open"));
        };

        // Cookies always flow same-origin; cross-origin only with credentials.
        let use_cookies = self.with_credentials || self.is_same_origin(&url);
        tracing::trace!(%method, %url, use_cookies, "dispatching request");

        let flight = Flight {
            client: self.client.clone(),
            method,
            url,
            headers: self.headers.clone(),
            body,
            cookie_jar: self.cookie_jar.clone(),
            use_cookies,
            shared: self.shared.clone(),
            events: self.events.clone(),
        };
        self.task = Some(tokio::spawn(flight.run(self.timeout)));
        Ok(())
    }

    fn abort(&mut self) {
        let first = {
            let mut state = self.shared.lock();
            let first = !state.aborted;
            state.aborted = true;
            if first {
                state.reset_to_failure();
            }
            first
        };
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if !first {
            return;
        }
        emit(&self.events, HandleEvent::ReadyStateChange);
        emit(&self.events, HandleEvent::Abort);
    }

    fn ready_state(&self) -> ReadyState {
        self.shared.lock().ready_state
    }

    fn status(&self) -> u16 {
        self.shared.lock().status
    }

    fn status_text(&self) -> String {
        self.shared.lock().status_text.clone()
    }

    fn all_response_headers(&self) -> String {
        self.shared.lock().raw_headers.clone()
    }

    fn response_text(&self) -> String {
        String::from_utf8_lossy(&self.shared.lock().body).into_owned()
    }

    fn response(&self) -> ResponseData {
        let body = self.shared.lock().body.clone();
        match self.response_type {
            ResponseType::Json => ResponseData::Json(
                serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
            ),
            ResponseType::ArrayBuffer | ResponseType::Blob => ResponseData::Bytes(body),
            ResponseType::Default | ResponseType::Text | ResponseType::Document => {
                ResponseData::Text(String::from_utf8_lossy(&body).into_owned())
            }
        }
    }

    fn snapshot(&self) -> HandleSnapshot {
        let state = self.shared.lock();
        HandleSnapshot {
            method: self.method.as_ref().map(|m| m.to_string()).unwrap_or_default(),
            url: self.url.as_ref().map(|u| u.to_string()).unwrap_or_default(),
            ready_state: state.ready_state,
            status: state.status,
            response_type: self.response_type,
            timeout: self.timeout,
            with_credentials: self.with_credentials,
            request_headers: self.request_headers.clone(),
            aborted: state.aborted,
        }
    }
}

impl Drop for HttpHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
