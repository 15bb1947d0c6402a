// src/transport.rs
//! Retrieval of raw response text from the gviz endpoint.
//!
//! The handler only depends on [`Transport`]; which implementation backs it is
//! picked by the host when the handler is built.

use std::fmt::Debug;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use tracing::{debug, trace};
use url::Url;

use crate::error::Result;

/// Prefix Google puts in front of every real gviz payload.
pub const RESPONSE_MARKER: &[u8] = b"/*O_o*/";

/// Why a structurally successful exchange produced no usable body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnusableReason {
    /// Non-success HTTP status.
    Status(StatusCode),
    /// Success status, but the body did not start with [`RESPONSE_MARKER`].
    MissingMarker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Body(String),
    Unusable(UnusableReason),
}

#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// GET `url` and return its body as text.
    ///
    /// Connection level failures are returned as errors.
    async fn fetch_text(&self, url: &Url) -> Result<Fetched>;
}

/// Plain GET; any success status yields the full body.
#[derive(Debug, Clone, Default)]
pub struct FetchTransport {
    client: Client,
}

impl FetchTransport {
    pub fn new() -> Self {
        FetchTransport {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        FetchTransport { client }
    }
}

#[async_trait]
impl Transport for FetchTransport {
    async fn fetch_text(&self, url: &Url) -> Result<Fetched> {
        debug!(%url, "fetching spreadsheet");
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(Fetched::Unusable(UnusableReason::Status(status)));
        }

        Ok(Fetched::Body(response.text().await?))
    }
}

/// GET that watches the body stream and gives up as soon as the leading bytes
/// are not [`RESPONSE_MARKER`], without reading the rest of the body.
#[derive(Debug, Clone, Default)]
pub struct StreamingTransport {
    client: Client,
}

impl StreamingTransport {
    pub fn new() -> Self {
        StreamingTransport {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        StreamingTransport { client }
    }
}

#[async_trait]
impl Transport for StreamingTransport {
    async fn fetch_text(&self, url: &Url) -> Result<Fetched> {
        debug!(%url, "streaming spreadsheet");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        let mut stream = response.bytes_stream().boxed();
        let mut body: Vec<u8> = Vec::new();
        let mut started = false;

        while let Some(chunk) = stream.try_next().await? {
            trace!(len = chunk.len(), "received chunk");
            body.extend_from_slice(&chunk);

            if started {
                continue;
            }
            // marker may be split across the first few chunks
            if body.len() < RESPONSE_MARKER.len() && RESPONSE_MARKER.starts_with(&body) {
                continue;
            }
            if !body.starts_with(RESPONSE_MARKER) {
                return Ok(Fetched::Unusable(unusable(status)));
            }
            started = true;
        }

        if !started {
            return Ok(Fetched::Unusable(unusable(status)));
        }

        Ok(Fetched::Body(String::from_utf8_lossy(&body).into_owned()))
    }
}

fn unusable(status: StatusCode) -> UnusableReason {
    if status.is_success() {
        UnusableReason::MissingMarker
    } else {
        UnusableReason::Status(status)
    }
}
