//! Decoded HTTP responses

use crate::error::{Result, ServiceError};
use crate::parse::XmlElement;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// A successful response, fully read into memory
#[derive(Debug, Clone)]
pub struct RawResponse {
    url: String,
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    cached: bool,
}

impl RawResponse {
    pub(crate) fn new(url: String, status: StatusCode, headers: &HeaderMap, body: Vec<u8>) -> Self {
        let headers = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            url,
            status,
            headers,
            body,
            cached: false,
        }
    }

    pub(crate) fn from_cache(url: String, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            url,
            status: StatusCode::OK,
            headers,
            body,
            cached: true,
        }
    }

    /// Final request URL, query string included
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// True when the body came from the response cache
    pub fn is_cached(&self) -> bool {
        self.cached
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Header value, name compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Body as UTF-8 text
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.clone()).map_err(|e| {
            ServiceError::parse(format!("response from {} is not UTF-8: {}", self.url, e))
        })
    }

    /// Body deserialized from JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Body parsed as an XML tree
    pub fn xml(&self) -> Result<XmlElement> {
        XmlElement::from_bytes(&self.body)
    }

    /// Target of the `Link: <...>; rel="next"` header, used for cursor
    /// pagination
    pub fn next_link(&self) -> Option<String> {
        self.header("link").and_then(parse_next_link)
    }
}

/// Extract the `rel="next"` target from a Link header value
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| {
            let p = p.trim();
            p == "rel=\"next\"" || p == "rel=next"
        });
        if is_next {
            Some(target.trim_start_matches('<').trim_end_matches('>').to_string())
        } else {
            None
        }
    })
}
