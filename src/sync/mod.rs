//! Snapshot sync with a remote blob store.
//!
//! - [`snapshot`] encodes and validates the wire document
//! - [`engine`] runs push and pull
//! - [`transport`], [`azure`] and [`dir`] provide the remote side

pub mod azure;
pub mod dir;
pub mod engine;
pub mod error;
pub mod snapshot;
pub mod transport;

pub use azure::{AzureConnector, DEFAULT_ENDPOINT_SUFFIX};
pub use dir::DirectoryConnector;
pub use engine::{PullReport, PushReport, SyncEngine, DEFAULT_OBJECT_NAME};
pub use error::{DecodeError, RecordKind, SyncError, SyncResult, TransportError};
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};
pub use transport::{BlobTransport, Connector, Credentials, MemoryTransport};
