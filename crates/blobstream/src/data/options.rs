use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default size of one range request (512 KiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 512 * 1024;

/// Default number of range requests allowed in flight.
pub const DEFAULT_CONCURRENCY: usize = 6;

/// Default amount requested by a single `Stream` poll (64 KiB).
pub const DEFAULT_DEMAND_SIZE: u64 = 64 * 1024;

/// Default lead time before expiry at which credentials count as stale.
pub const DEFAULT_EXPIRY_WINDOW: Duration = Duration::from_secs(15);

/// How large each range request is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkSize {
    /// Every range request asks for exactly this many bytes.
    Fixed(u64),
    /// Every range request asks for the amount the consumer demanded.
    Demand,
}

impl ChunkSize {
    /// Length of the next range request given the consumer's demand.
    pub fn effective(self, requested: u64) -> u64 {
        match self {
            ChunkSize::Fixed(size) => size,
            ChunkSize::Demand => requested.max(1),
        }
    }
}

impl Default for ChunkSize {
    fn default() -> Self { ChunkSize::Fixed(DEFAULT_CHUNK_SIZE) }
}

/// Configuration for a range stream.
///
/// # Examples
///
/// ```
/// use blobstream::{ChunkSize, StreamOptions};
/// use std::time::Duration;
///
/// let options = StreamOptions::default()
///     .chunk_size(ChunkSize::Fixed(1024 * 1024))
///     .concurrency(4)
///     .fetch_timeout(Some(Duration::from_secs(30)));
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamOptions {
    /// Size of each range request.
    ///
    /// Default: `Fixed(512 KiB)`
    pub chunk_size: ChunkSize,

    /// Maximum number of range requests outstanding (queued or in flight).
    ///
    /// Default: 6
    pub concurrency: usize,

    /// Amount a plain `Stream` poll asks for. Only affects range sizes
    /// under [`ChunkSize::Demand`]; `AsyncRead` callers demand their buffer size.
    ///
    /// Default: 64 KiB
    pub demand_size: u64,

    /// Upper bound on a single range request. `None` waits indefinitely.
    ///
    /// Default: None
    #[serde(with = "duration_ms::option")]
    pub fetch_timeout: Option<Duration>,

    /// Credentials expiring within this window are refreshed before use.
    ///
    /// Default: 15s
    #[serde(with = "duration_ms")]
    pub expiry_window: Duration,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            chunk_size:    ChunkSize::default(),
            concurrency:   DEFAULT_CONCURRENCY,
            demand_size:   DEFAULT_DEMAND_SIZE,
            fetch_timeout: None,
            expiry_window: DEFAULT_EXPIRY_WINDOW,
        }
    }
}

impl StreamOptions {
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: ChunkSize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn demand_size(mut self, demand_size: u64) -> Self {
        self.demand_size = demand_size;
        self
    }

    #[must_use]
    pub fn fetch_timeout(mut self, fetch_timeout: Option<Duration>) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    #[must_use]
    pub fn expiry_window(mut self, expiry_window: Duration) -> Self {
        self.expiry_window = expiry_window;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == ChunkSize::Fixed(0) {
            return Err(Error::InvalidConfig("chunk size must be greater than 0".into()));
        }
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be greater than 0".into()));
        }
        if self.demand_size == 0 {
            return Err(Error::InvalidConfig("demand size must be greater than 0".into()));
        }
        Ok(())
    }
}

/// Durations as integer milliseconds in config files.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            duration.map(|d| d.as_millis() as u64).serialize(serializer)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
        }
    }
}
