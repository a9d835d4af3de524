use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::data::{Credentials, IssuedCredentials, ObjectLocator};
use crate::effects::store::{BlobStore, RangeResponse};
use crate::error::{Error, Result};

/// Source of temporary credentials.
///
/// Any `Fn() -> impl Future<Output = Result<IssuedCredentials, E>>` closure is
/// a provider.
pub trait CredentialProvider: Send + Sync + 'static {
    type Error: fmt::Display + Send + 'static;

    fn issue(&self) -> impl Future<Output = std::result::Result<IssuedCredentials, Self::Error>> + Send;
}

impl<F, Fut, E> CredentialProvider for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<IssuedCredentials, E>> + Send,
    E: fmt::Display + Send + 'static,
{
    type Error = E;

    fn issue(&self) -> impl Future<Output = std::result::Result<IssuedCredentials, E>> + Send { self() }
}

/// A store handle bound to one object and one set of credentials.
///
/// Never mutated: a refresh builds a new client and swaps it in, while
/// requests already holding the old one finish with it.
pub struct CredentialedClient<S> {
    store:       Arc<S>,
    locator:     ObjectLocator,
    credentials: Credentials,
    generation:  u64,
}

impl<S: BlobStore> CredentialedClient<S> {
    pub fn new(store: Arc<S>, locator: ObjectLocator, credentials: Credentials, generation: u64) -> Self {
        Self {
            store,
            locator,
            credentials,
            generation,
        }
    }

    pub fn locator(&self) -> &ObjectLocator { &self.locator }

    pub fn credentials(&self) -> &Credentials { &self.credentials }

    /// How many refreshes produced this client, starting at 1.
    pub fn generation(&self) -> u64 { self.generation }

    pub fn needs_refresh(&self, window: Duration) -> bool { self.credentials.needs_refresh(window) }

    pub async fn get_range(&self, offset: u64, length: u64) -> std::result::Result<RangeResponse, S::Error> {
        self.store
            .get_range(&self.locator, &self.credentials, offset, length)
            .await
    }
}

impl<S> fmt::Debug for CredentialedClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialedClient")
            .field("locator", &self.locator)
            .field("credentials", &self.credentials)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Owns the current [`CredentialedClient`] and replaces it when stale.
///
/// Refreshes are single-flight: concurrent callers that find the client stale
/// wait on one provider call and all observe its result.
pub struct CredentialGate<S, P> {
    store:         Arc<S>,
    provider:      P,
    locator:       ObjectLocator,
    expiry_window: Duration,
    current:       RwLock<Option<Arc<CredentialedClient<S>>>>,
    refresh_lock:  Mutex<()>,
    generation:    AtomicU64,
    attempts:      AtomicU64,
    last_failure:  RwLock<Option<String>>,
}

impl<S: BlobStore, P: CredentialProvider> CredentialGate<S, P> {
    pub fn new(store: Arc<S>, provider: P, locator: ObjectLocator, expiry_window: Duration) -> Self {
        Self {
            store,
            provider,
            locator,
            expiry_window,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            attempts: AtomicU64::new(0),
            last_failure: RwLock::new(None),
        }
    }

    /// Returns a client with usable credentials, refreshing first if needed.
    ///
    /// Does not suspend while the held client is still valid. Callers that
    /// queue behind a refresh get that refresh's outcome, failure included,
    /// instead of asking the provider again.
    pub async fn ensure_client(&self) -> Result<Arc<CredentialedClient<S>>> {
        if let Some(client) = self.valid_client() {
            return Ok(client);
        }

        let seen = self.attempts.load(Ordering::Acquire);
        let _guard = self.refresh_lock.lock().await;
        if self.attempts.load(Ordering::Acquire) != seen {
            let failure = self.last_failure.read().clone();
            if let Some(message) = failure {
                return Err(Error::Credential(message));
            }
            if let Some(client) = self.current() {
                return Ok(client);
            }
        }
        if let Some(client) = self.valid_client() {
            return Ok(client);
        }

        debug!(key = %self.locator.key, "credentials expired or missing, requesting new ones");
        let issued = match self.provider.issue().await {
            Ok(issued) => issued,
            Err(e) => {
                let message = e.to_string();
                warn!(key = %self.locator.key, error = %message, "credential provider failed");
                *self.last_failure.write() = Some(message.clone());
                self.attempts.fetch_add(1, Ordering::Release);
                return Err(Error::Credential(message));
            }
        };

        let locator = match issued.location_hint {
            Some(container) => self.locator.with_container(container),
            None => self.locator.clone(),
        };
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let client = Arc::new(CredentialedClient::new(
            Arc::clone(&self.store),
            locator,
            issued.credentials,
            generation,
        ));
        debug!(key = %self.locator.key, generation, container = %client.locator().container, "installed new client");

        *self.current.write() = Some(Arc::clone(&client));
        *self.last_failure.write() = None;
        self.attempts.fetch_add(1, Ordering::Release);
        Ok(client)
    }

    /// Marks the held client stale so the next caller refreshes.
    pub fn invalidate(&self) {
        if self.current.write().take().is_some() {
            debug!(key = %self.locator.key, "client invalidated");
        }
    }

    /// The client currently installed, stale or not.
    pub fn current(&self) -> Option<Arc<CredentialedClient<S>>> { self.current.read().clone() }

    /// Number of clients built so far.
    pub fn refresh_count(&self) -> u64 { self.generation.load(Ordering::Relaxed) }

    pub fn locator(&self) -> &ObjectLocator { &self.locator }

    fn valid_client(&self) -> Option<Arc<CredentialedClient<S>>> {
        self.current
            .read()
            .as_ref()
            .filter(|client| !client.needs_refresh(self.expiry_window))
            .cloned()
    }
}
