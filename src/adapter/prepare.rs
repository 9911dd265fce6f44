// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Pre-send header transformation: XSRF injection and content-type removal

use crate::http::headers::CONTENT_TYPE;
use crate::http::{CookieReader, Headers, OriginChecker, RequestConfig};

/// Compute the header set that goes on the wire
pub fn prepare_headers(
    config: &RequestConfig,
    origin: &dyn OriginChecker,
    cookies: &dyn CookieReader,
) -> Headers {
    let mut prepared = config.headers.clone();
    inject_xsrf(&mut prepared, config, origin, cookies);
    if config.data.is_none() {
        strip_content_type(&mut prepared);
    }
    prepared
}

/// Echo the XSRF cookie into its header when the request carries credentials
/// or stays on the document's origin. Silently does nothing otherwise.
pub fn inject_xsrf(
    headers: &mut Headers,
    config: &RequestConfig,
    origin: &dyn OriginChecker,
    cookies: &dyn CookieReader,
) {
    let Some(cookie_name) = config.xsrf_cookie_name.as_deref() else {
        return;
    };
    if !(config.with_credentials || origin.is_same_origin(&config.url)) {
        return;
    }
    let token = cookies.read(cookie_name).filter(|v| !v.is_empty());
    if let (Some(token), Some(header)) = (token, config.xsrf_header_name.as_deref()) {
        tracing::debug!(header, "attaching xsrf token");
        headers.insert(header, token);
    }
}

/// Drop every content-type entry, whatever its case
pub fn strip_content_type(headers: &mut Headers) {
    headers.retain(|name, _| !name.eq_ignore_ascii_case(CONTENT_TYPE));
}
