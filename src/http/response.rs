// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Normalized response

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::header_map::Headers;
use super::request::RequestConfig;
use crate::adapter::HandleSnapshot;
use crate::error::Result;

/// Response body as exposed by the request handle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    /// Text form
    Text(String),
    /// Parsed JSON form
    Json(serde_json::Value),
    /// Binary form
    Bytes(#[serde(serialize_with = "serialize_lossy")] Bytes),
}

fn serialize_lossy<S: serde::Serializer>(bytes: &Bytes, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(bytes))
}

impl ResponseData {
    /// Text form, if the body was exposed as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Deserialize the body
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let value = match self {
            ResponseData::Text(text) => serde_json::from_str(text)?,
            ResponseData::Json(value) => serde_json::from_value(value.clone())?,
            ResponseData::Bytes(bytes) => serde_json::from_slice(bytes)?,
        };
        Ok(value)
    }

    /// Body length in bytes (serialized length for JSON)
    pub fn len(&self) -> usize {
        match self {
            ResponseData::Text(text) => text.len(),
            ResponseData::Json(value) => value.to_string().len(),
            ResponseData::Bytes(bytes) => bytes.len(),
        }
    }

    /// Check if the body is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq<&str> for ResponseData {
    fn eq(&self, other: &&str) -> bool {
        self.as_text() == Some(*other)
    }
}

/// Response produced by a completed exchange
#[derive(Debug, Clone)]
pub struct Response {
    /// Body, selected by the config's response type
    pub data: ResponseData,
    /// Status code
    pub status: u16,
    /// Status text
    pub status_text: String,
    /// Parsed response headers, names lowercased
    pub headers: Headers,
    /// Config the exchange ran with, including the final header set
    pub config: Arc<RequestConfig>,
    /// State of the request handle at settlement
    pub request: HandleSnapshot,
}

impl Response {
    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get_ignore_case(name)
    }

    /// Get content type
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body as text, if exposed as text
    pub fn text(&self) -> Option<&str> {
        self.data.as_text()
    }

    /// Deserialize the body
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        self.data.json()
    }
}
