//! `ResponseEnvelope`: status, headers, trailers, and a lazy body stream.

use crate::error::{FetchError, Result};
use anyhow::anyhow;
use bytes::Bytes;
use futures_util::Stream;
use std::pin::Pin;

/// A case-insensitive, multi-valued, insertion-ordered header map.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.entries.iter()
    }
}

/// The produced response before its body is consumed. The body stream is
/// single-pass and lazy; it is exclusively owned by whichever consumer
/// (formatter or passthrough) drains it.
pub struct ResponseEnvelope {
    pub status: u16,
    pub version: &'static str,
    pub headers: HeaderMap,
    pub trailers: HeaderMap,
    pub body: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
}

impl ResponseEnvelope {
    pub async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status().as_u16();
        let version = match response.version() {
            reqwest::Version::HTTP_09 => "HTTP/0.9",
            reqwest::Version::HTTP_10 => "HTTP/1.0",
            reqwest::Version::HTTP_11 => "HTTP/1.1",
            reqwest::Version::HTTP_2 => "HTTP/2",
            reqwest::Version::HTTP_3 => "HTTP/3",
            _ => "HTTP/1.1",
        };

        let mut headers = HeaderMap::default();
        for (name, value) in response.headers() {
            let value = value
                .to_str()
                .map_err(|_| anyhow!(FetchError::Transport("non-UTF-8 response header".to_string())))?;
            headers.push(name.as_str(), value);
        }

        let body = Box::pin(response.bytes_stream());

        Ok(ResponseEnvelope {
            status,
            version,
            headers,
            trailers: HeaderMap::default(),
            body,
        })
    }

    /// Buffers the entire body into memory, for formatters that need the
    /// whole document (JSON, XML, CSV, Markdown, …).
    pub async fn buffer_body(mut self) -> Result<(Self, Vec<u8>)> {
        use futures_util::StreamExt;
        let mut buf = Vec::new();
        while let Some(chunk) = self.body.next().await {
            let chunk = chunk.map_err(|e| anyhow!(FetchError::Transport(e.to_string())))?;
            buf.extend_from_slice(&chunk);
        }
        self.body = Box::pin(futures_util::stream::empty());
        Ok((self, buf))
    }
}
