// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Settle-once state machine for a single exchange
//!
//! Every notification source (handle events, cancel token, end of the event
//! stream) is funnelled through [`Exchange::dispatch`]. The first notification
//! that decides the outcome settles the exchange; everything after that is
//! discarded.

use std::sync::Arc;

use super::handle::{HandleEvent, ReadyState, RequestHandle};
use crate::cancel::Cancel;
use crate::error::{create_error, ErrorKind, Rejection, ECONNABORTED};
use crate::http::{parse_headers, RequestConfig, Response, ResponseData, ResponseType};

/// Settled result of an exchange
pub type Outcome = std::result::Result<Response, Rejection>;

/// Input to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Event from the request handle
    Handle(HandleEvent),
    /// The cancel token settled
    Cancel(Cancel),
    /// The handle's event stream ended
    Closed,
}

impl From<HandleEvent> for Notification {
    fn from(event: HandleEvent) -> Self {
        Notification::Handle(event)
    }
}

/// One in-flight exchange
pub struct Exchange<H: RequestHandle> {
    handle: H,
    config: Arc<RequestConfig>,
    settled: bool,
    aborted: bool,
}

impl<H: RequestHandle> Exchange<H> {
    /// Wrap a handle that has already been sent
    pub fn new(handle: H, config: Arc<RequestConfig>) -> Self {
        Self {
            handle,
            config,
            settled: false,
            aborted: false,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn config(&self) -> &Arc<RequestConfig> {
        &self.config
    }

    /// Feed one notification. Returns the outcome exactly once, on the
    /// notification that settles the exchange.
    pub fn dispatch(&mut self, notification: Notification) -> Option<Outcome> {
        if self.settled {
            tracing::trace!(?notification, "exchange already settled, discarding");
            return None;
        }

        let outcome = match notification {
            Notification::Cancel(reason) => {
                self.abort();
                Some(Err(Rejection::Cancelled(reason)))
            }
            Notification::Handle(HandleEvent::ReadyStateChange) => self.on_ready_state_change(),
            Notification::Handle(HandleEvent::Error(detail)) => {
                tracing::debug!(url = %self.config.url, %detail, "transport error");
                Some(Err(self.fail(ErrorKind::Network, "Network Error".to_string(), None, None)))
            }
            Notification::Handle(HandleEvent::Timeout) => {
                let timeout = self.config.timeout.unwrap_or_default();
                let message = format!("Timeout of {} ms exceeded", timeout);
                Some(Err(self.fail(ErrorKind::Timeout, message, Some(ECONNABORTED), None)))
            }
            Notification::Handle(HandleEvent::Abort) => None,
            Notification::Closed => {
                tracing::warn!(
                    url = %self.config.url,
                    "request handle stopped reporting before the exchange settled"
                );
                Some(Err(self.fail(ErrorKind::Network, "Network Error".to_string(), None, None)))
            }
        };

        if outcome.is_some() {
            self.settled = true;
        }
        outcome
    }

    /// Abort the handle, at most once
    pub fn abort(&mut self) {
        if !self.aborted {
            self.aborted = true;
            self.handle.abort();
        }
    }

    fn on_ready_state_change(&mut self) -> Option<Outcome> {
        if self.handle.ready_state() != ReadyState::Done {
            return None;
        }
        // Status 0 means abort or transport failure, reported on its own channel.
        let status = self.handle.status();
        if status == 0 {
            return None;
        }

        let data = match self.config.response_type {
            Some(ResponseType::Text) => ResponseData::Text(self.handle.response_text()),
            _ => self.handle.response(),
        };
        let response = Response {
            data,
            status,
            status_text: self.handle.status_text(),
            headers: parse_headers(&self.handle.all_response_headers()),
            config: self.config.clone(),
            request: self.handle.snapshot(),
        };

        tracing::debug!(method = %self.config.method, url = %self.config.url, status, "exchange complete");

        if response.is_success() {
            Some(Ok(response))
        } else {
            let message = format!("Request failed with status code {}", status);
            Some(Err(self.fail(ErrorKind::HttpStatus, message, None, Some(response))))
        }
    }

    fn fail(
        &self,
        kind: ErrorKind,
        message: String,
        code: Option<&str>,
        response: Option<Response>,
    ) -> Rejection {
        create_error(
            kind,
            message,
            self.config.clone(),
            code,
            self.handle.snapshot(),
            response,
        )
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::mock::{MockHandle, MockProbe};
    use crate::http::Headers;

    fn exchange(config: RequestConfig) -> (Exchange<MockHandle>, MockProbe) {
        let (handle, probe) = MockHandle::new();
        (Exchange::new(handle, Arc::new(config)), probe)
    }

    fn ready() -> Notification {
        HandleEvent::ReadyStateChange.into()
    }

    fn permutations(items: &[Notification]) -> Vec<Vec<Notification>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head.clone());
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn test_success_response() {
        let (mut exchange, probe) = exchange(RequestConfig::get("http://api.test/items"));
        probe.complete(200, "OK", "content-type: text/plain\r\n", "ok");

        let response = exchange.dispatch(ready()).unwrap().unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert_eq!(response.data, "ok");
        assert_eq!(response.headers, Headers::from_iter([("content-type", "text/plain")]));
        assert!(exchange.is_settled());
    }

    #[test]
    fn test_status_partition() {
        for status in [200u16, 201, 204, 226, 299] {
            let (mut exchange, probe) = exchange(RequestConfig::get("http://api.test/items"));
            probe.complete(status, "", "", "");
            let response = exchange.dispatch(ready()).unwrap().unwrap();
            assert_eq!(response.status, status);
        }

        for status in [100u16, 199, 300, 304, 401, 404, 500, 503] {
            let (mut exchange, probe) = exchange(RequestConfig::get("http://api.test/items"));
            probe.complete(status, "", "", "nope");
            let rejection = exchange.dispatch(ready()).unwrap().unwrap_err();
            let err = rejection.classified().unwrap();
            assert_eq!(err.kind, ErrorKind::HttpStatus);
            assert_eq!(err.code, None);
            assert_eq!(err.message, format!("Request failed with status code {}", status));
            assert_eq!(err.response.as_ref().map(|r| r.status), Some(status));
        }
    }

    #[test]
    fn test_intermediate_states_ignored() {
        let (mut exchange, probe) = exchange(RequestConfig::get("http://api.test/items"));
        probe.state().status = 200;
        for state in [ReadyState::Opened, ReadyState::HeadersReceived, ReadyState::Loading] {
            probe.progress(state);
            assert!(exchange.dispatch(ready()).is_none());
        }
        assert!(!exchange.is_settled());
    }

    #[test]
    fn test_zero_status_completion_does_not_settle() {
        let (mut exchange, probe) = exchange(RequestConfig::get("http://api.test/items"));
        probe.complete(0, "", "", "");

        assert!(exchange.dispatch(ready()).is_none());
        assert!(!exchange.is_settled());

        // The paired error notification settles it.
        let rejection = exchange
            .dispatch(HandleEvent::Error("connection refused".into()).into())
            .unwrap()
            .unwrap_err();
        assert_eq!(rejection.kind(), Some(ErrorKind::Network));
        assert_eq!(rejection.to_string(), "Network Error");
        assert!(rejection.response().is_none());
    }

    #[test]
    fn test_timeout_message() {
        let (mut exchange, _probe) =
            exchange(RequestConfig::get("http://api.test/items").timeout(2000));

        let rejection = exchange.dispatch(HandleEvent::Timeout.into()).unwrap().unwrap_err();
        let err = rejection.classified().unwrap();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.message.contains("2000"));
        assert_eq!(err.code.as_deref(), Some(ECONNABORTED));
        assert!(err.response.is_none());
    }

    #[test]
    fn test_cancellation_precedence() {
        let (mut exchange, probe) = exchange(RequestConfig::get("http://api.test/items"));

        let reason = Cancel::new("user left the page");
        let rejection = exchange
            .dispatch(Notification::Cancel(reason.clone()))
            .unwrap()
            .unwrap_err();
        assert_eq!(rejection.cancel_reason(), Some(&reason));
        assert_eq!(probe.state().abort_calls, 1);

        probe.complete(200, "OK", "", "late");
        assert!(exchange.dispatch(ready()).is_none());
        assert!(exchange.dispatch(HandleEvent::Error("reset".into()).into()).is_none());
        assert!(exchange.dispatch(Notification::Cancel(Cancel::new("again"))).is_none());
        assert_eq!(probe.state().abort_calls, 1);
    }

    #[test]
    fn test_abort_is_idempotent() {
        let (mut exchange, probe) = exchange(RequestConfig::get("http://api.test/items"));
        exchange.abort();
        exchange.abort();
        assert_eq!(probe.state().abort_calls, 1);
        assert!(exchange.handle().snapshot().aborted);
    }

    #[test]
    fn test_closed_stream_settles_as_network_error() {
        let (mut exchange, _probe) = exchange(RequestConfig::get("http://api.test/items"));
        let rejection = exchange.dispatch(Notification::Closed).unwrap().unwrap_err();
        assert_eq!(rejection.kind(), Some(ErrorKind::Network));
    }

    #[test]
    fn test_exactly_once_for_every_ordering() {
        let sources = vec![
            Notification::Cancel(Cancel::new("cancelled")),
            HandleEvent::Error("reset".into()).into(),
            HandleEvent::Timeout.into(),
            ready(),
        ];

        for order in permutations(&sources) {
            let (mut exchange, probe) =
                exchange(RequestConfig::get("http://api.test/items").timeout(500));
            probe.complete(200, "OK", "", "ok");

            let outcomes: Vec<Outcome> = order
                .iter()
                .cloned()
                .filter_map(|n| exchange.dispatch(n))
                .collect();
            assert_eq!(outcomes.len(), 1, "ordering {:?}", order);

            match (&order[0], &outcomes[0]) {
                (Notification::Cancel(reason), Err(r)) => {
                    assert_eq!(r.cancel_reason(), Some(reason))
                }
                (Notification::Handle(HandleEvent::Error(_)), Err(r)) => {
                    assert_eq!(r.kind(), Some(ErrorKind::Network))
                }
                (Notification::Handle(HandleEvent::Timeout), Err(r)) => {
                    assert_eq!(r.kind(), Some(ErrorKind::Timeout))
                }
                (Notification::Handle(HandleEvent::ReadyStateChange), Ok(resp)) => {
                    assert_eq!(resp.status, 200)
                }
                (first, outcome) => panic!("{:?} settled as {:?}", first, outcome),
            }

            let aborts = probe.state().abort_calls;
            assert!(aborts <= 1);
        }
    }

    #[test]
    fn test_response_type_selects_body_form() {
        let config = RequestConfig::get("http://api.test/items").response_type(ResponseType::Json);
        let (mut handle, probe) = MockHandle::new();
        handle.set_response_type(ResponseType::Json);
        let mut json_exchange = Exchange::new(handle, Arc::new(config));
        probe.complete(200, "OK", "", r#"{"items":[1,2]}"#);

        let response = json_exchange.dispatch(ready()).unwrap().unwrap();
        assert_eq!(response.data, ResponseData::Json(serde_json::json!({"items": [1, 2]})));

        let config = RequestConfig::get("http://api.test/items").response_type(ResponseType::Text);
        let (mut exchange, probe) = exchange(config);
        probe.complete(200, "OK", "", r#"{"items":[1,2]}"#);
        let response = exchange.dispatch(ready()).unwrap().unwrap();
        assert_eq!(response.data, r#"{"items":[1,2]}"#);
    }
}
