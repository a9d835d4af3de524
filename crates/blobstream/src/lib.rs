//! Sequential byte streams over range-addressable blob storage.
//!
//! A remote object is read as an ordered stream of [`bytes::Bytes`] by issuing
//! fixed-size range requests with bounded concurrency and stitching the
//! completions back together in byte order.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and value types
//! - [`core`] - Pure state: session bookkeeping, reordering, range math
//! - [`effects`] - I/O operations behind the [`BlobStore`] and [`CredentialProvider`] seams
//!
//! # Key Features
//!
//! - **Order-preserving**: ranges complete in any order but are delivered in submission order
//! - **Bounded**: at most `concurrency` range requests are ever outstanding
//! - **Pull-driven**: new ranges are requested only when the consumer polls
//! - **Expiring credentials**: clients are rebuilt from a provider when their credentials go stale
//! - **Mechanism-only**: no retries; the first failure in byte order ends the stream
//!
//! # Example
//!
//! ```no_run
//! use blobstream::{IssuedCredentials, Credentials, ObjectLocator, RangeStream, ReqwestBlobStore, StreamOptions};
//! use futures_util::TryStreamExt;
//!
//! # async fn run() -> blobstream::Result<()> {
//! let store = ReqwestBlobStore::new("https://storage.example.com")?;
//! let provider = || async {
//!     Ok::<_, std::io::Error>(IssuedCredentials::new(Credentials::new("token")))
//! };
//! let locator = ObjectLocator::new("bucket", "path/to/object");
//!
//! let mut stream = RangeStream::open(store, provider, locator, StreamOptions::default())?;
//! while let Some(chunk) = stream.try_next().await? {
//!     println!("received {} bytes", chunk.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use data::{
    ChunkSize, Credentials, IssuedCredentials, ObjectLocator, RangeRequest, RangeResult,
    StreamOptions, Termination,
};
pub use effects::{
    BlobStore, ChunkFetcher, CredentialGate, CredentialProvider, CredentialedClient, FetchedRange,
    RangeFetch, RangeReader, RangeResponse, RangeScheduler, RangeStream,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestBlobStore;

pub use error::{Error, Result};
