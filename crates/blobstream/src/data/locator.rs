use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifies one object inside a blob store.
///
/// The container (bucket) may be left empty when the credential provider
/// supplies it as a location hint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocator {
    pub container: String,
    pub key:       String,
}

impl ObjectLocator {
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key:       key.into(),
        }
    }

    /// Locator with only a key; the container comes from the credential provider.
    pub fn key(key: impl Into<String>) -> Self { Self::new(String::new(), key) }

    /// Returns a copy bound to `container`, as directed by a location hint.
    #[must_use]
    pub fn with_container(&self, container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key:       self.key.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::InvalidConfig("object locator requires a key".into()));
        }
        Ok(())
    }
}

impl fmt::Display for ObjectLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.container.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}/{}", self.container, self.key)
        }
    }
}
