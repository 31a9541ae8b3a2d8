//! Marker files in the policy status directory.
//!
//! One zero-length file per endpoint whose policy has been programmed,
//! named by [`EndpointId::to_status_filename`]. The files carry no data;
//! only their presence matters.

use std::fs;
use std::path::{Path, PathBuf};

use statusrep_id::EndpointId;
use tracing::{debug, info, warn};

use crate::error::StatusError;

/// Name of the subdirectory that holds policy marker files.
pub const POLICY_DIR: &str = "policy";

/// Marker file operations used by the reconcile pass.
pub trait StatusFiles: Send {
    /// List the endpoints that currently have a marker file.
    fn list(&self) -> Result<Vec<EndpointId>, StatusError>;

    /// Create the marker file for an endpoint. Recreating is not an error.
    fn create(&self, id: &EndpointId) -> Result<(), StatusError>;

    /// Remove the marker file for an endpoint.
    ///
    /// Implementations may report a missing file as a not-found error; the
    /// reconcile pass treats that as already converged.
    fn remove(&self, id: &EndpointId) -> Result<(), StatusError>;
}

/// Marker files on the local filesystem under `<root>/policy`.
#[derive(Debug, Clone)]
pub struct StatusDir {
    root: PathBuf,
}

impl StatusDir {
    /// Create a handle on the status directory rooted at `root`.
    ///
    /// Nothing is touched on disk until the first operation.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The configured root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory holding policy marker files.
    pub fn policy_dir(&self) -> PathBuf {
        self.root.join(POLICY_DIR)
    }

    /// Path of the marker file for an endpoint.
    pub fn marker_path(&self, id: &EndpointId) -> PathBuf {
        self.policy_dir().join(id.to_status_filename())
    }

    /// Make sure the policy directory exists.
    ///
    /// Returns true if it had to be created.
    pub fn ensure_directory(&self) -> Result<bool, StatusError> {
        let dir = self.policy_dir();
        if dir.is_dir() {
            return Ok(false);
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }
        builder
            .create(&dir)
            .map_err(|e| StatusError::io("create directory", &dir, e))?;

        info!(path = %dir.display(), "Created policy status directory");
        Ok(true)
    }
}

impl StatusFiles for StatusDir {
    fn list(&self) -> Result<Vec<EndpointId>, StatusError> {
        let dir = self.policy_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.ensure_directory()?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(StatusError::io("list", &dir, e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StatusError::io("list", &dir, e))?;
            let name = entry.file_name();

            let Some(name) = name.to_str() else {
                warn!(path = %entry.path().display(), "Skipping non UTF-8 status file");
                continue;
            };

            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                debug!(file = name, "Skipping directory in policy status dir");
                continue;
            }

            match EndpointId::from_status_filename(name) {
                Ok(id) => ids.push(id),
                Err(e) => warn!(file = name, error = %e, "Skipping unrecognized status file"),
            }
        }

        Ok(ids)
    }

    fn create(&self, id: &EndpointId) -> Result<(), StatusError> {
        let path = self.marker_path(id);
        fs::File::create(&path).map_err(|e| StatusError::io("create", &path, e))?;
        Ok(())
    }

    fn remove(&self, id: &EndpointId) -> Result<(), StatusError> {
        let path = self.marker_path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Status file already absent");
                Ok(())
            }
            Err(e) => Err(StatusError::io("remove", &path, e)),
        }
    }
}
