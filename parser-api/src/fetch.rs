//! Downloading remote files.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{Client, Response};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::{FetchConfig, LimitsConfig};

/// The bytes of a downloaded file.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub bytes: Bytes,
    /// Size reported by the upstream `Content-Length`, 0 when the header was absent
    pub declared_size: u64,
}

impl FetchedContent {
    /// The declared size when the upstream sent one, otherwise the number of bytes received.
    pub fn size(&self) -> u64 {
        if self.declared_size > 0 {
            self.declared_size
        } else {
            self.bytes.len() as u64
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure or a non-success status from the remote host
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("File too large")]
    TooLarge { size: u64, limit: u64 },
}

/// A trait for downloading a file by URL.
/// In practice this is [`ReqwestFetcher`]; the trait lets handlers be exercised without a network.
#[async_trait]
pub trait FetchFile: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError>;
}

/// The concrete implementation of `FetchFile`, backed by a shared `reqwest::Client`.
///
/// The size ceiling is checked against the declared `Content-Length` before the body is read. A
/// missing header therefore skips the check unless `enforce_read_cap` is set, in which case the
/// body is streamed and abandoned as soon as it grows past the limit.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    max_file_size: u64,
    enforce_read_cap: bool,
}

impl ReqwestFetcher {
    pub fn new(fetch: &FetchConfig, limits: &LimitsConfig) -> reqwest::Result<Self> {
        let mut builder = Client::builder()
            .user_agent(fetch.user_agent.as_str())
            .connect_timeout(fetch.connect_timeout);
        if let Some(timeout) = fetch.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            max_file_size: limits.max_file_size,
            enforce_read_cap: limits.enforce_read_cap,
        })
    }

    /// 0 means unlimited
    fn exceeds_limit(&self, size: u64) -> bool {
        self.max_file_size > 0 && size > self.max_file_size
    }
}

#[async_trait]
impl FetchFile for ReqwestFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        let declared_size = response.content_length().unwrap_or(0);
        if self.exceeds_limit(declared_size) {
            return Err(FetchError::TooLarge {
                size: declared_size,
                limit: self.max_file_size,
            });
        }

        let bytes = if self.enforce_read_cap && self.max_file_size > 0 {
            self.read_capped(&mut response).await?
        } else {
            response.bytes().await?
        };

        debug!(declared_size, received = bytes.len(), "Downloaded file");
        Ok(FetchedContent { bytes, declared_size })
    }
}

impl ReqwestFetcher {
    async fn read_capped(&self, response: &mut Response) -> Result<Bytes, FetchError> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            let size = (buffer.len() + chunk.len()) as u64;
            if self.exceeds_limit(size) {
                return Err(FetchError::TooLarge {
                    size,
                    limit: self.max_file_size,
                });
            }
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }
}
