//! I/O operations for range streaming.
//!
//! The blob store and credential provider are external collaborators reached
//! through the [`BlobStore`] and [`CredentialProvider`] traits. Everything
//! else here drives those seams: the credential gate, the per-range fetcher,
//! the ordered scheduler and the stream controller on top.

mod credentials;
mod fetcher;
mod reader;
mod scheduler;
mod store;
mod stream;

pub use credentials::{CredentialGate, CredentialProvider, CredentialedClient};
pub use fetcher::{ChunkFetcher, FetchedRange, RangeFetch};
pub use reader::RangeReader;
pub use scheduler::RangeScheduler;
pub use store::{BlobStore, RangeResponse};
pub use stream::RangeStream;

#[cfg(feature = "reqwest")]
pub use store::ReqwestBlobStore;
