// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Transport adapter
//!
//! [`XhrAdapter::execute`] configures a fresh [`RequestHandle`], sends it and
//! hands back a [`PendingResponse`]. A driver task then races the handle's
//! notifications against the request's cancel token and settles the pending
//! response exactly once.

mod exchange;
mod handle;
#[cfg(test)]
pub(crate) mod mock;
mod prepare;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;

pub use exchange::{Exchange, Notification, Outcome};
pub use handle::{
    HandleEvent, HandleEvents, HandleFactory, HandleSnapshot, ReadyState, RequestHandle,
};
pub use prepare::{inject_xsrf, prepare_headers, strip_content_type};

use crate::cancel::CancelToken;
use crate::error::{create_error, ErrorKind, Result};
use crate::http::{
    CookieReader, DocumentCookies, DocumentOrigin, HttpHandleConfig, HttpHandleFactory, NoCookies,
    NoDocument, OriginChecker, RequestConfig, Response,
};

/// Drives request handles to a single settled outcome
pub struct XhrAdapter<F: HandleFactory> {
    factory: F,
    origin: Arc<dyn OriginChecker>,
    cookies: Arc<dyn CookieReader>,
}

impl XhrAdapter<HttpHandleFactory> {
    /// Adapter over the reqwest-backed handle with default configuration
    pub fn new() -> Result<Self> {
        Self::http(HttpHandleConfig::default())
    }

    /// Adapter over the reqwest-backed handle. Origin checks and XSRF cookie
    /// reads use the configured document URL; without one every request is
    /// cross-origin and no XSRF cookie is visible.
    pub fn http(config: HttpHandleConfig) -> Result<Self> {
        let factory = HttpHandleFactory::with_config(config)?;
        let adapter = match factory.document_url().cloned() {
            Some(document) => {
                let cookies = DocumentCookies::new(factory.cookie_jar().clone(), document.clone());
                Self::with_collaborators(factory, DocumentOrigin::new(document), cookies)
            }
            None => Self::with_collaborators(factory, NoDocument, NoCookies),
        };
        Ok(adapter)
    }
}

impl<F: HandleFactory> XhrAdapter<F> {
    /// Build an adapter from its collaborators
    pub fn with_collaborators(
        factory: F,
        origin: impl OriginChecker + 'static,
        cookies: impl CookieReader + 'static,
    ) -> Self {
        Self {
            factory,
            origin: Arc::new(origin),
            cookies: Arc::new(cookies),
        }
    }

    /// Get the handle factory
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Start an exchange.
    ///
    /// Returns once the request is sent. Failures the handle raises before
    /// sending (bad method, URL or header) are returned here; everything after
    /// that settles the [`PendingResponse`]. Must be called inside a Tokio
    /// runtime.
    pub fn execute(&self, mut config: RequestConfig) -> Result<PendingResponse> {
        let mut handle = self.factory.create();

        if let Some(response_type) = config.response_type {
            handle.set_response_type(response_type);
        }
        if let Some(timeout) = config.timeout.filter(|ms| *ms > 0) {
            handle.set_timeout(Duration::from_millis(timeout));
        }
        let cancel_token = config.cancel_token.clone();
        if config.with_credentials {
            handle.set_with_credentials(true);
        }

        config.headers = prepare_headers(&config, self.origin.as_ref(), self.cookies.as_ref());

        let method = config.method.to_uppercase();
        handle.open(&method, &config.url)?;
        let events = handle.subscribe();
        for (name, value) in config.headers.iter() {
            handle.set_request_header(name, value)?;
        }

        tracing::debug!(%method, url = %config.url, "sending request");
        handle.send(config.data.clone())?;

        let config = Arc::new(config);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(drive(
            Exchange::new(handle, config.clone()),
            events,
            cancel_token,
            tx,
        ));

        Ok(PendingResponse { rx, config })
    }

    /// Run an exchange to completion
    pub async fn request(&self, config: RequestConfig) -> Result<Response> {
        Ok(self.execute(config)?.await?)
    }

    /// Run several exchanges concurrently
    pub async fn execute_all(&self, configs: Vec<RequestConfig>) -> Vec<Result<Response>> {
        let futures: Vec<_> = configs.into_iter().map(|c| self.request(c)).collect();
        futures::future::join_all(futures).await
    }
}

/// Outcome of an exchange that has been sent but not yet settled
#[derive(Debug)]
#[must_use = "dropping a PendingResponse aborts the request"]
pub struct PendingResponse {
    rx: oneshot::Receiver<Outcome>,
    config: Arc<RequestConfig>,
}

impl PendingResponse {
    /// Config the exchange runs with, including the final header set
    pub fn config(&self) -> &Arc<RequestConfig> {
        &self.config
    }
}

impl Future for PendingResponse {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => {
                tracing::warn!(url = %self.config.url, "exchange driver stopped before settling");
                let error = create_error(
                    ErrorKind::Network,
                    "Network Error",
                    self.config.clone(),
                    None,
                    HandleSnapshot::detached(&self.config),
                    None,
                );
                Poll::Ready(Err(error.into()))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Merge the handle's events and the cancel token into the state machine
async fn drive<H: RequestHandle>(
    mut exchange: Exchange<H>,
    mut events: HandleEvents,
    cancel_token: Option<CancelToken>,
    mut tx: oneshot::Sender<Outcome>,
) {
    let cancelled = async move {
        match cancel_token {
            Some(token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(cancelled);
    let mut cancel_armed = true;

    loop {
        let notification = tokio::select! {
            event = events.recv() => match event {
                Some(event) => Notification::Handle(event),
                None => Notification::Closed,
            },
            reason = &mut cancelled, if cancel_armed => {
                cancel_armed = false;
                Notification::Cancel(reason)
            }
            _ = tx.closed() => {
                tracing::debug!(url = %exchange.config().url, "caller dropped the request, aborting");
                exchange.abort();
                return;
            }
        };

        if let Some(outcome) = exchange.dispatch(notification) {
            let _ = tx.send(outcome);
            return;
        }
    }
}
