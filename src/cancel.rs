// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cancellation tokens
//!
//! A [`CancelToken`] settles at most once with a [`Cancel`] reason. Tokens are
//! cheap to clone and may be shared by several requests; each exchange
//! subscribes on its own.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// Reason carried by a settled [`CancelToken`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cancel {
    /// Message supplied by whoever cancelled
    pub message: Option<String>,
}

impl Cancel {
    /// Create a reason with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

impl fmt::Display for Cancel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "Cancel: {}", message),
            None => f.write_str("Cancel"),
        }
    }
}

impl std::error::Error for Cancel {}

/// Single-fire cancellation future
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<Option<Cancel>>,
}

/// Trigger side of a [`CancelToken`]
#[derive(Debug, Clone)]
pub struct Canceller {
    tx: Arc<watch::Sender<Option<Cancel>>>,
}

/// A token together with its trigger
#[derive(Debug, Clone)]
pub struct CancelSource {
    pub token: CancelToken,
    pub canceller: Canceller,
}

impl CancelToken {
    /// Create a token and its trigger
    pub fn new() -> (CancelToken, Canceller) {
        let (tx, rx) = watch::channel(None);
        (CancelToken { rx }, Canceller { tx: Arc::new(tx) })
    }

    /// Create a [`CancelSource`]
    pub fn source() -> CancelSource {
        let (token, canceller) = Self::new();
        CancelSource { token, canceller }
    }

    /// The reason, if cancellation was already requested
    pub fn reason(&self) -> Option<Cancel> {
        self.rx.borrow().clone()
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Fail with the reason if cancellation was already requested
    pub fn throw_if_requested(&self) -> Result<(), Cancel> {
        match self.reason() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// Wait until the token settles.
    ///
    /// Never completes if every [`Canceller`] is dropped without cancelling.
    pub async fn cancelled(&self) -> Cancel {
        let mut rx = self.rx.clone();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(reason) = current {
                return reason;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Canceller {
    /// Request cancellation. Only the first call has an effect; returns
    /// whether this call was the one that settled the token.
    pub fn cancel(&self, message: impl Into<String>) -> bool {
        self.settle(Cancel::new(message))
    }

    /// Request cancellation with an explicit reason
    pub fn settle(&self, reason: Cancel) -> bool {
        let settled = self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
        if settled {
            tracing::debug!("cancellation requested");
        }
        settled
    }
}

impl CancelSource {
    /// Request cancellation through the source's trigger
    pub fn cancel(&self, message: impl Into<String>) -> bool {
        self.canceller.cancel(message)
    }
}
