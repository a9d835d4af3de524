use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Temporary credentials used to sign range requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token presented to the store.
    pub token:      String,
    /// Instant after which the store rejects the token. `None` never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token:      token.into(),
            expires_at: None,
        }
    }

    #[must_use]
    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the credentials expire within `window` of `now`.
    pub fn needs_refresh_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let Some(expires_at) = self.expires_at else {
            return false;
        };
        let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
        match expires_at.checked_sub_signed(window) {
            Some(deadline) => deadline <= now,
            None => true,
        }
    }

    pub fn needs_refresh(&self, window: Duration) -> bool {
        self.needs_refresh_at(Utc::now(), window)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// What a credential provider hands back on each refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredentials {
    pub credentials:   Credentials,
    /// Container the credentials are scoped to, overriding the locator's.
    pub location_hint: Option<String>,
}

impl IssuedCredentials {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            location_hint: None,
        }
    }

    #[must_use]
    pub fn location_hint(mut self, container: impl Into<String>) -> Self {
        self.location_hint = Some(container.into());
        self
    }
}
