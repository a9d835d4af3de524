use std::future::Future;

use bytes::Bytes;

use crate::data::{Credentials, ObjectLocator};

/// Raw answer to one range GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeResponse {
    /// HTTP status code, or the store's equivalent.
    pub status:         u16,
    /// Declared body length, when the store reports one.
    pub content_length: Option<u64>,
    pub body:           Bytes,
}

impl RangeResponse {
    /// A successful partial response carrying `body`.
    pub fn partial(body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            status:         206,
            content_length: Some(body.len() as u64),
            body,
        }
    }

    /// A body-less response with the given status.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_length: None,
            body: Bytes::new(),
        }
    }
}

/// Asynchronous range-addressable blob store.
///
/// Implementations issue a single byte-range read and report the outcome
/// without retrying. An out-of-range read must come back as status 416 and a
/// missing object as status 404; transport failures are `Err`.
///
/// # Implementations
///
/// - [`ReqwestBlobStore`]: HTTP implementation using `reqwest`
/// - In-memory stores in tests
pub trait BlobStore: Send + Sync + 'static {
    /// Error type for transport failures.
    type Error: std::error::Error + Send + 'static;

    /// Reads `[offset, offset + length)` of the object at `locator`.
    fn get_range(
        &self,
        locator: &ObjectLocator,
        credentials: &Credentials,
        offset: u64,
        length: u64,
    ) -> impl Future<Output = Result<RangeResponse, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use reqwest::header::RANGE;

    use super::*;
    use crate::core::range_header;
    use crate::error::{Error, Result};

    /// HTTP blob store that addresses objects as `{endpoint}/{container}/{key}`
    /// and presents credentials as a bearer token.
    #[derive(Debug, Clone)]
    pub struct ReqwestBlobStore {
        client:   reqwest::Client,
        endpoint: String,
    }

    impl ReqwestBlobStore {
        /// Create a store with a default `reqwest` client.
        pub fn new(endpoint: impl Into<String>) -> Result<Self> {
            let client = reqwest::Client::builder()
                .build()
                .map_err(|e| Error::InvalidConfig(e.to_string()))?;
            Ok(Self::with_client(client, endpoint))
        }

        pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
            Self {
                client,
                endpoint: endpoint.into().trim_end_matches('/').to_string(),
            }
        }

        pub fn object_url(&self, locator: &ObjectLocator) -> String {
            let key = locator.key.trim_start_matches('/');
            if locator.container.is_empty() {
                format!("{}/{}", self.endpoint, key)
            } else {
                format!("{}/{}/{}", self.endpoint, locator.container, key)
            }
        }
    }

    impl BlobStore for ReqwestBlobStore {
        type Error = reqwest::Error;

        async fn get_range(
            &self,
            locator: &ObjectLocator,
            credentials: &Credentials,
            offset: u64,
            length: u64,
        ) -> std::result::Result<RangeResponse, Self::Error> {
            let response = self
                .client
                .get(self.object_url(locator))
                .header(RANGE, range_header(offset, length))
                .bearer_auth(&credentials.token)
                .send()
                .await?;

            let status = response.status();
            let content_length = response.content_length();
            let body = if status.is_success() {
                response.bytes().await?
            } else {
                Bytes::new()
            };

            Ok(RangeResponse {
                status: status.as_u16(),
                content_length,
                body,
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn object_urls() {
            let store = ReqwestBlobStore::new("https://blobs.example.com/").unwrap();
            assert_eq!(
                store.object_url(&ObjectLocator::new("media", "a/b.mp4")),
                "https://blobs.example.com/media/a/b.mp4"
            );
            assert_eq!(
                store.object_url(&ObjectLocator::key("/b.mp4")),
                "https://blobs.example.com/b.mp4"
            );
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestBlobStore;
