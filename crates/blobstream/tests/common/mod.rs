//! In-memory blob store shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use blobstream::{BlobStore, Credentials, ObjectLocator, RangeResponse};
use bytes::Bytes;
use parking_lot::Mutex;

#[derive(Debug)]
pub struct MemoryError(pub String);

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl std::error::Error for MemoryError {}

/// One range request as the store saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub container: String,
    pub key:       String,
    pub token:     String,
    pub offset:    u64,
    pub length:    u64,
}

/// Range-addressable store over in-memory objects.
///
/// Responds like S3: 206 with the overlapping bytes, 416 past the end,
/// 404 for unknown keys. Latency can be set per offset so tests control
/// completion order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects:     Arc<Mutex<HashMap<String, Bytes>>>,
    latency:     Arc<Mutex<HashMap<u64, Duration>>>,
    failures:    Arc<Mutex<HashMap<u64, u16>>>,
    requests:    Arc<Mutex<Vec<Recorded>>>,
    active:      Arc<AtomicUsize>,
    peak_active: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_object(self, key: &str, data: impl Into<Bytes>) -> Self {
        self.objects.lock().insert(key.to_string(), data.into());
        self
    }

    pub fn delay_at(&self, offset: u64, delay: Duration) { self.latency.lock().insert(offset, delay); }

    pub fn fail_at(&self, offset: u64, status: u16) { self.failures.lock().insert(offset, status); }

    pub fn requests(&self) -> Vec<Recorded> { self.requests.lock().clone() }

    pub fn offsets(&self) -> Vec<(u64, u64)> {
        self.requests().into_iter().map(|r| (r.offset, r.length)).collect()
    }

    pub fn peak_active(&self) -> usize { self.peak_active.load(Ordering::SeqCst) }
}

impl BlobStore for MemoryStore {
    type Error = MemoryError;

    async fn get_range(
        &self,
        locator: &ObjectLocator,
        credentials: &Credentials,
        offset: u64,
        length: u64,
    ) -> Result<RangeResponse, Self::Error> {
        self.requests.lock().push(Recorded {
            container: locator.container.clone(),
            key: locator.key.clone(),
            token: credentials.token.clone(),
            offset,
            length,
        });
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);

        let delay = self.latency.lock().get(&offset).copied().unwrap_or(Duration::from_millis(1));
        tokio::time::sleep(delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        if let Some(status) = self.failures.lock().get(&offset).copied() {
            return Ok(RangeResponse::status(status));
        }

        let Some(object) = self.objects.lock().get(&locator.key).cloned() else {
            return Ok(RangeResponse::status(404));
        };
        let len = object.len() as u64;
        if offset >= len {
            return Ok(RangeResponse::status(416));
        }
        let end = offset.saturating_add(length).min(len);
        Ok(RangeResponse::partial(object.slice(offset as usize..end as usize)))
    }
}

/// Deterministic object contents of `len` bytes.
pub fn object_bytes(len: usize) -> Bytes {
    (0..len).map(|i| (i.wrapping_mul(31) % 256) as u8).collect::<Vec<_>>().into()
}
