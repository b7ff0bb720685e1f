//! Directory-backed blob store.
//!
//! Objects live at `<root>/<container>/<object>`. Useful for syncing through a
//! shared or mounted folder and for exercising the CLI without a cloud account.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::error::TransportError;
use super::transport::{BlobTransport, Connector, Credentials};

/// Connects to containers under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryConnector {
    root: PathBuf,
}

impl DirectoryConnector {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Connector for DirectoryConnector {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn BlobTransport>, TransportError> {
        let container = credentials.container_name.trim();
        if container.contains(['/', '\\']) || container == "." || container == ".." {
            return Err(TransportError::Unauthorized(format!(
                "container name '{container}' is not a plain directory name"
            )));
        }
        Ok(Box::new(DirectoryTransport {
            dir: self.root.join(container),
        }))
    }
}

/// One container directory.
#[derive(Debug)]
pub struct DirectoryTransport {
    dir: PathBuf,
}

impl DirectoryTransport {
    fn path_for(&self, object_name: &str) -> Result<PathBuf, TransportError> {
        if object_name.is_empty() || object_name.contains(['/', '\\']) || object_name == ".." {
            return Err(TransportError::Io(format!(
                "invalid object name '{object_name}'"
            )));
        }
        Ok(self.dir.join(object_name))
    }
}

impl BlobTransport for DirectoryTransport {
    fn put(&self, object_name: &str, bytes: &[u8]) -> Result<(), TransportError> {
        let path = self.path_for(object_name)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, &e))?;

        // Write beside the target and rename so readers never see a torn file
        let tmp = self.dir.join(format!("{object_name}.partial"));
        std::fs::write(&tmp, bytes).map_err(|e| io_error(&tmp, &e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_error(&path, &e))?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote object");
        Ok(())
    }

    fn get(&self, object_name: &str) -> Result<Vec<u8>, TransportError> {
        let path = self.path_for(object_name)?;
        std::fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TransportError::NotFound(object_name.to_string()),
            ErrorKind::PermissionDenied => TransportError::Unauthorized(e.to_string()),
            _ => io_error(&path, &e),
        })
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> TransportError {
    TransportError::Io(format!("{}: {err}", path.display()))
}
