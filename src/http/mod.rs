// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP layer: request config, normalized response, header and cookie
//! collaborators, and the reqwest-backed request handle.

mod client;
mod cookie;
mod header_map;
mod origin;
mod request;
mod response;

pub use client::{HttpHandle, HttpHandleConfig, HttpHandleFactory};
pub use cookie::{Cookie, CookieJar, CookieReader, DocumentCookies, NoCookies};
pub use header_map::{parse_headers, Headers};
pub use origin::{DocumentOrigin, NoDocument, OriginChecker};
pub use request::{
    RequestConfig, ResponseType, DEFAULT_XSRF_COOKIE_NAME, DEFAULT_XSRF_HEADER_NAME,
};
pub use response::{Response, ResponseData};

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("xhr-adapter/", env!("CARGO_PKG_VERSION"));

/// Common HTTP headers
pub mod headers {
    pub const ACCEPT: &str = "accept";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const COOKIE: &str = "cookie";
    pub const SET_COOKIE: &str = "set-cookie";
}
