use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::core::{Outcome, classify, is_not_found_message};
use crate::effects::credentials::{CredentialGate, CredentialProvider};
use crate::effects::store::BlobStore;
use crate::error::{Error, Result};

/// Outcome of one range fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedRange {
    /// `None` signals end of object. May be short of the request at the tail.
    pub payload: Option<Bytes>,
}

impl FetchedRange {
    pub fn data(payload: Bytes) -> Self { Self { payload: Some(payload) } }

    pub fn end_of_object() -> Self { Self { payload: None } }
}

/// Issues a single byte-range read.
///
/// The scheduler only sees this seam, so ordering and concurrency can be
/// exercised against any fetch implementation.
pub trait RangeFetch: Send + Sync + 'static {
    fn fetch(&self, offset: u64, length: u64) -> BoxFuture<'static, Result<FetchedRange>>;
}

/// Fetches ranges through a [`CredentialGate`], classifying each response as
/// data, end of object, or failure. Never retries.
pub struct ChunkFetcher<S, P> {
    gate:          Arc<CredentialGate<S, P>>,
    fetch_timeout: Option<Duration>,
}

impl<S, P> Clone for ChunkFetcher<S, P> {
    fn clone(&self) -> Self {
        Self {
            gate:          Arc::clone(&self.gate),
            fetch_timeout: self.fetch_timeout,
        }
    }
}

impl<S: BlobStore, P: CredentialProvider> ChunkFetcher<S, P> {
    pub fn new(gate: Arc<CredentialGate<S, P>>, fetch_timeout: Option<Duration>) -> Self {
        Self { gate, fetch_timeout }
    }

    pub fn gate(&self) -> &Arc<CredentialGate<S, P>> { &self.gate }

    async fn fetch_range(
        gate: Arc<CredentialGate<S, P>>,
        fetch_timeout: Option<Duration>,
        offset: u64,
        length: u64,
    ) -> Result<FetchedRange> {
        let client = gate.ensure_client().await?;
        let key = client.locator().to_string();

        let response = match fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, client.get_range(offset, length))
                .await
                .map_err(|_| {
                    warn!(%key, offset, length, "range request timed out");
                    Error::Timeout { offset, length }
                })?,
            None => client.get_range(offset, length).await,
        };

        let response = response.map_err(|e| {
            let message = e.to_string();
            warn!(%key, offset, length, error = %message, "range request failed");
            if is_not_found_message(&message) {
                Error::NotFound { key: key.clone() }
            } else {
                Error::Transport { offset, length, message }
            }
        })?;

        match classify(response.status, response.content_length, response.body, offset, length) {
            Outcome::Data(body) => {
                debug!(%key, offset, length, received = body.len(), "range received");
                Ok(FetchedRange::data(body))
            }
            Outcome::EndOfObject => {
                debug!(%key, offset, "range past end of object");
                Ok(FetchedRange::end_of_object())
            }
            Outcome::NotFound => Err(Error::NotFound { key }),
            Outcome::RangeIgnored => {
                warn!(%key, offset, length, "store ignored the range header");
                Err(Error::RangeIgnored { offset, length })
            }
            Outcome::Failed(status) => {
                warn!(%key, offset, length, status, "range request rejected");
                Err(Error::Status { status, offset, length })
            }
        }
    }
}

impl<S: BlobStore, P: CredentialProvider> RangeFetch for ChunkFetcher<S, P> {
    fn fetch(&self, offset: u64, length: u64) -> BoxFuture<'static, Result<FetchedRange>> {
        Box::pin(Self::fetch_range(Arc::clone(&self.gate), self.fetch_timeout, offset, length))
    }
}
