// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Same-origin checks against the current document

use url::Url;

/// Decides whether a request URL is same-origin with the current context
pub trait OriginChecker: Send + Sync {
    fn is_same_origin(&self, url: &str) -> bool;
}

impl<F> OriginChecker for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_same_origin(&self, url: &str) -> bool {
        self(url)
    }
}

/// No document context: every request is cross-origin
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDocument;

impl OriginChecker for NoDocument {
    fn is_same_origin(&self, _url: &str) -> bool {
        false
    }
}

/// Compares scheme, host and port with a document URL.
/// Relative URLs resolve against the document first.
#[derive(Debug, Clone)]
pub struct DocumentOrigin {
    document: Url,
}

impl DocumentOrigin {
    pub fn new(document: Url) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Url {
        &self.document
    }
}

impl OriginChecker for DocumentOrigin {
    fn is_same_origin(&self, url: &str) -> bool {
        match self.document.join(url) {
            Ok(target) => target.origin() == self.document.origin(),
            Err(_) => false,
        }
    }
}
