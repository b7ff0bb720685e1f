//! Remote blob transport abstraction.
//!
//! The sync engine only needs whole-object `put` and `get`. Concrete stores
//! live behind [`Connector`], which turns caller-supplied [`Credentials`] into
//! a [`BlobTransport`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;

use super::error::{SyncError, TransportError};

/// Account, container and key for a remote store.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub account_name: String,
    pub container_name: String,
    pub account_key: String,
}

impl Credentials {
    #[must_use]
    pub fn new(
        account_name: impl Into<String>,
        container_name: impl Into<String>,
        account_key: impl Into<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            container_name: container_name.into(),
            account_key: account_key.into(),
        }
    }

    /// Check that every field is filled in.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` naming the first blank field.
    pub fn validate(&self) -> Result<(), SyncError> {
        let fields = [
            ("account name", &self.account_name),
            ("container name", &self.container_name),
            ("account key", &self.account_key),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(SyncError::InvalidCredentials(format!("{name} is empty")));
            }
        }
        Ok(())
    }
}

// The key never reaches logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account_name", &self.account_name)
            .field("container_name", &self.container_name)
            .field("account_key", &"<redacted>")
            .finish()
    }
}

/// Whole-object access to one remote container.
#[cfg_attr(test, mockall::automock)]
pub trait BlobTransport: Send + Sync {
    /// Upload `bytes` as `object_name`, replacing any existing object.
    fn put(&self, object_name: &str, bytes: &[u8]) -> Result<(), TransportError>;

    /// Download `object_name`. A missing object is `TransportError::NotFound`.
    fn get(&self, object_name: &str) -> Result<Vec<u8>, TransportError>;
}

/// Opens a transport for a set of credentials.
pub trait Connector: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the credentials cannot address a store.
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn BlobTransport>, TransportError>;
}

/// In-process blob store, keyed by container and object name.
///
/// Clones share the same objects, so a test can keep a handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    container: String,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an object from `container` directly.
    #[must_use]
    pub fn object(&self, container: &str, object_name: &str) -> Option<Vec<u8>> {
        self.objects.lock().get(&key(container, object_name)).cloned()
    }

    /// Store an object in `container` directly.
    pub fn insert(&self, container: &str, object_name: &str, bytes: impl Into<Vec<u8>>) {
        self.objects
            .lock()
            .insert(key(container, object_name), bytes.into());
    }
}

fn key(container: &str, object_name: &str) -> String {
    format!("{container}/{object_name}")
}

impl BlobTransport for MemoryTransport {
    fn put(&self, object_name: &str, bytes: &[u8]) -> Result<(), TransportError> {
        self.insert(&self.container, object_name, bytes);
        Ok(())
    }

    fn get(&self, object_name: &str) -> Result<Vec<u8>, TransportError> {
        self.object(&self.container, object_name)
            .ok_or_else(|| TransportError::NotFound(object_name.to_string()))
    }
}

impl Connector for MemoryTransport {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn BlobTransport>, TransportError> {
        Ok(Box::new(Self {
            objects: Arc::clone(&self.objects),
            container: credentials.container_name.clone(),
        }))
    }
}
