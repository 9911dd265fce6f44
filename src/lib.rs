// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # xhr-adapter - Single-exchange HTTP transport adapter
//!
//! Takes a fully resolved [`RequestConfig`], drives one asynchronous HTTP
//! exchange through a native request handle and settles exactly one outcome:
//! a normalized [`Response`] or a [`Rejection`].
//!
//! ## Features
//!
//! - Exactly-once settlement across completion, transport error, timeout and
//!   cancellation, whatever order they fire in
//! - XSRF token injection for credentialed or same-origin requests
//! - `content-type` dropped when no body is sent
//! - Shareable, single-fire [`CancelToken`]s
//! - reqwest-backed request handle with a cookie jar and credentials mode
//!
//! ## Example
//!
//! ```rust,no_run
//! use xhr_adapter::{HttpHandleConfig, RequestConfig, XhrAdapter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HttpHandleConfig::new().document_url("https://app.example.com/")?;
//!     let adapter = XhrAdapter::http(config)?;
//!
//!     let request = RequestConfig::get("/api/items")
//!         .xsrf_defaults()
//!         .timeout(5_000);
//!
//!     match adapter.execute(request)?.await {
//!         Ok(response) => println!("{} {:?}", response.status, response.data),
//!         Err(rejection) => eprintln!("request failed: {}", rejection),
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod cancel;
pub mod error;
pub mod http;

// Adapter
pub use adapter::{
    Exchange, HandleEvent, HandleFactory, HandleSnapshot, Notification, Outcome,
    PendingResponse, ReadyState, RequestHandle, XhrAdapter,
};

// Cancellation
pub use cancel::{Cancel, CancelSource, CancelToken, Canceller};

// Errors
pub use error::{create_error, ClassifiedError, Error, ErrorKind, Rejection, Result, ECONNABORTED};

// HTTP
pub use http::{
    parse_headers, Cookie, CookieJar, CookieReader, DocumentCookies, DocumentOrigin, Headers,
    HttpHandle, HttpHandleConfig, HttpHandleFactory, NoCookies, NoDocument, OriginChecker,
    RequestConfig, Response, ResponseData, ResponseType,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
