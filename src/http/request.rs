use std::collections::BTreeMap;
use std::ops::Range;

use bytes::Bytes;

use crate::error::HttpError;

/// Request headers keyed by name exactly as received.
///
/// Iteration is ordered by key. A repeated key keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.as_str())
    }

    /// ASCII case-insensitive lookup. When several spellings of the same
    /// name were received, the first in key order wins.
    pub fn get_ignore_case(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A parsed HTTP request.
///
/// The request owns every byte read from the connection; the body is a range
/// into that buffer and is only present when a positive `Content-Length`
/// was received.
#[derive(Debug, Clone)]
pub struct HttpRequest<H = Headers> {
    method: String,
    url: String,
    headers: H,
    buffer: Bytes,
    body: Option<Range<usize>>,
}

impl<H> HttpRequest<H> {
    pub(crate) fn new(
        method: String,
        url: String,
        headers: H,
        buffer: Bytes,
        body: Option<Range<usize>>,
    ) -> Self {
        Self {
            method,
            url,
            headers,
            buffer,
            body,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request target, undecoded.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whatever the header observer collected.
    pub fn headers(&self) -> &H {
        &self.headers
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Borrowed view of the body.
    pub fn body(&self) -> Result<&[u8], HttpError> {
        let range = self.body.clone().ok_or(HttpError::NoBody)?;
        Ok(&self.buffer[range])
    }

    /// The body as a reference-counted slice of the receive buffer.
    pub fn body_bytes(&self) -> Result<Bytes, HttpError> {
        let range = self.body.clone().ok_or(HttpError::NoBody)?;
        Ok(self.buffer.slice(range))
    }

    /// The body copied into a string, with invalid UTF-8 replaced.
    pub fn body_string(&self) -> Result<String, HttpError> {
        self.body()
            .map(|body| String::from_utf8_lossy(body).into_owned())
    }

    pub fn body_length(&self) -> Result<usize, HttpError> {
        self.body.as_ref().map(|r| r.len()).ok_or(HttpError::NoBody)
    }

    /// Every byte received for this request, including anything that
    /// arrived after the end of the body.
    pub fn raw(&self) -> &Bytes {
        &self.buffer
    }
}

impl HttpRequest<Headers> {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }
}
