// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! The host request primitive the adapter drives
//!
//! A [`RequestHandle`] is configured, opened, given headers and sent once.
//! Progress is reported as [`HandleEvent`]s on the stream returned by
//! [`RequestHandle::subscribe`]; the handle's getters reflect its state at the
//! moment they are read, not at the moment an event was queued.

use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::http::{Headers, RequestConfig, ResponseData, ResponseType};

/// Notification stream of one handle
pub type HandleEvents = mpsc::UnboundedReceiver<HandleEvent>;

/// Lifecycle of a request handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReadyState {
    #[default]
    Unsent,
    Opened,
    HeadersReceived,
    Loading,
    /// Fully complete, successfully or not
    Done,
}

/// Notification emitted by a request handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleEvent {
    /// The ready state changed; read it from the handle
    ReadyStateChange,
    /// Transport failure, with a diagnostic description
    Error(String),
    /// The configured timeout elapsed
    Timeout,
    /// The handle was aborted
    Abort,
}

/// Native request primitive
pub trait RequestHandle: Send + 'static {
    fn set_response_type(&mut self, response_type: ResponseType);

    fn set_timeout(&mut self, timeout: Duration);

    /// Send credentials on cross-origin requests
    fn set_with_credentials(&mut self, with_credentials: bool);

    /// Open the handle. `method` is already uppercased.
    fn open(&mut self, method: &str, url: &str) -> Result<()>;

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<()>;

    /// Arm the notification sources. Must be called before [`send`](Self::send).
    fn subscribe(&mut self) -> HandleEvents;

    fn send(&mut self, body: Option<Bytes>) -> Result<()>;

    fn abort(&mut self);

    fn ready_state(&self) -> ReadyState;

    /// Status code, 0 before headers arrive or after a failure
    fn status(&self) -> u16;

    fn status_text(&self) -> String;

    /// Raw `name: value\r\n` response header block
    fn all_response_headers(&self) -> String;

    /// Body in text form
    fn response_text(&self) -> String;

    /// Body in the form selected by the response type
    fn response(&self) -> ResponseData;

    /// Diagnostic view of the handle
    fn snapshot(&self) -> HandleSnapshot;
}

/// Creates a fresh handle per exchange
pub trait HandleFactory: Send + Sync {
    type Handle: RequestHandle;

    fn create(&self) -> Self::Handle;
}

/// Diagnostic copy of a request handle's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleSnapshot {
    pub method: String,
    pub url: String,
    pub ready_state: ReadyState,
    pub status: u16,
    pub response_type: ResponseType,
    pub timeout: Option<Duration>,
    pub with_credentials: bool,
    /// Headers set on the handle before send
    pub request_headers: Headers,
    pub aborted: bool,
}

impl HandleSnapshot {
    /// Snapshot for an exchange whose handle is no longer reachable
    pub fn detached(config: &RequestConfig) -> Self {
        Self {
            method: config.method.to_uppercase(),
            url: config.url.clone(),
            ready_state: ReadyState::Unsent,
            status: 0,
            response_type: config.response_type.unwrap_or_default(),
            timeout: config.timeout.filter(|ms| *ms > 0).map(Duration::from_millis),
            with_credentials: config.with_credentials,
            request_headers: config.headers.clone(),
            aborted: false,
        }
    }
}
