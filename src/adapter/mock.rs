// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Scriptable request handle for tests

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::handle::{
    HandleEvent, HandleEvents, HandleFactory, HandleSnapshot, ReadyState, RequestHandle,
};
use crate::error::{Error, Result};
use crate::http::{Headers, ResponseData, ResponseType};

#[derive(Debug, Default)]
pub struct MockState {
    pub response_type: Option<ResponseType>,
    pub timeout: Option<Duration>,
    pub with_credentials: bool,
    pub method: Option<String>,
    pub url: Option<String>,
    pub request_headers: Headers,
    pub body: Option<Bytes>,
    pub sent: bool,
    pub abort_calls: u32,
    pub ready_state: ReadyState,
    pub status: u16,
    pub status_text: String,
    pub raw_headers: String,
    pub response_body: String,
    /// Header names `set_request_header` refuses
    pub reject_header: Option<String>,
    events: Option<mpsc::UnboundedSender<HandleEvent>>,
}

/// Test-side view of a [`MockHandle`]
#[derive(Debug, Clone, Default)]
pub struct MockProbe {
    state: Arc<Mutex<MockState>>,
}

impl MockProbe {
    pub fn state(&self) -> parking_lot::MutexGuard<'_, MockState> {
        self.state.lock()
    }

    /// Deliver an event; ignored once the exchange stopped listening
    pub fn emit(&self, event: HandleEvent) {
        if let Some(tx) = &self.state.lock().events {
            let _ = tx.send(event);
        }
    }

    pub fn progress(&self, ready_state: ReadyState) {
        self.state.lock().ready_state = ready_state;
        self.emit(HandleEvent::ReadyStateChange);
    }

    /// Finish with a response
    pub fn complete(&self, status: u16, status_text: &str, raw_headers: &str, body: &str) {
        {
            let mut state = self.state.lock();
            state.ready_state = ReadyState::Done;
            state.status = status;
            state.status_text = status_text.to_string();
            state.raw_headers = raw_headers.to_string();
            state.response_body = body.to_string();
        }
        self.emit(HandleEvent::ReadyStateChange);
    }

    /// Finish with a transport error: DONE with status 0, then the error
    pub fn fail(&self) {
        self.complete(0, "", "", "");
        self.emit(HandleEvent::Error("connection refused".to_string()));
    }

    /// Finish with a timeout: DONE with status 0, then the timeout
    pub fn time_out(&self) {
        self.complete(0, "", "", "");
        self.emit(HandleEvent::Timeout);
    }

    /// Drop the event sender so the stream ends
    pub fn close(&self) {
        self.state.lock().events = None;
    }
}

pub struct MockHandle {
    probe: MockProbe,
}

impl MockHandle {
    pub fn new() -> (MockHandle, MockProbe) {
        let probe = MockProbe::default();
        (
            MockHandle {
                probe: probe.clone(),
            },
            probe,
        )
    }
}

impl RequestHandle for MockHandle {
    fn set_response_type(&mut self, response_type: ResponseType) {
        self.probe.state().response_type = Some(response_type);
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.probe.state().timeout = Some(timeout);
    }

    fn set_with_credentials(&mut self, with_credentials: bool) {
        self.probe.state().with_credentials = with_credentials;
    }

    fn open(&mut self, method: &str, url: &str) -> Result<()> {
        let mut state = self.probe.state();
        state.method = Some(method.to_string());
        state.url = Some(url.to_string());
        state.ready_state = ReadyState::Opened;
        Ok(())
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<()> {
        let mut state = self.probe.state();
        if state.reject_header.as_deref() == Some(name) {
            return Err(Error::invalid_header(name, "rejected by mock"));
        }
        state.request_headers.insert(name, value);
        Ok(())
    }

    fn subscribe(&mut self) -> HandleEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        self.probe.state().events = Some(tx);
        rx
    }

    fn send(&mut self, body: Option<Bytes>) -> Result<()> {
        let mut state = self.probe.state();
        state.body = body;
        state.sent = true;
        Ok(())
    }

    fn abort(&mut self) {
        let mut state = self.probe.state();
        state.abort_calls += 1;
        state.ready_state = ReadyState::Done;
        state.status = 0;
    }

    fn ready_state(&self) -> ReadyState {
        self.probe.state().ready_state
    }

    fn status(&self) -> u16 {
        self.probe.state().status
    }

    fn status_text(&self) -> String {
        self.probe.state().status_text.clone()
    }

    fn all_response_headers(&self) -> String {
        self.probe.state().raw_headers.clone()
    }

    fn response_text(&self) -> String {
        self.probe.state().response_body.clone()
    }

    fn response(&self) -> ResponseData {
        let state = self.probe.state();
        match state.response_type.unwrap_or_default() {
            ResponseType::Json => ResponseData::Json(
                serde_json::from_str(&state.response_body).unwrap_or(serde_json::Value::Null),
            ),
            ResponseType::ArrayBuffer | ResponseType::Blob => {
                ResponseData::Bytes(Bytes::from(state.response_body.clone()))
            }
            _ => ResponseData::Text(state.response_body.clone()),
        }
    }

    fn snapshot(&self) -> HandleSnapshot {
        let state = self.probe.state();
        HandleSnapshot {
            method: state.method.clone().unwrap_or_default(),
            url: state.url.clone().unwrap_or_default(),
            ready_state: state.ready_state,
            status: state.status,
            response_type: state.response_type.unwrap_or_default(),
            timeout: state.timeout,
            with_credentials: state.with_credentials,
            request_headers: state.request_headers.clone(),
            aborted: state.abort_calls > 0,
        }
    }
}

/// Hands out mock handles and keeps their probes
#[derive(Default)]
pub struct MockFactory {
    probes: Mutex<Vec<MockProbe>>,
    reject_header: Option<String>,
}

impl MockFactory {
    pub fn rejecting_header(name: &str) -> Self {
        Self {
            reject_header: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Probe of the most recently created handle
    pub fn last(&self) -> MockProbe {
        self.probes
            .lock()
            .last()
            .cloned()
            .expect("no handle created yet")
    }

    pub fn created(&self) -> usize {
        self.probes.lock().len()
    }
}

impl HandleFactory for MockFactory {
    type Handle = MockHandle;

    fn create(&self) -> MockHandle {
        let (handle, probe) = MockHandle::new();
        probe.state().reject_header = self.reject_header.clone();
        self.probes.lock().push(probe);
        handle
    }
}
