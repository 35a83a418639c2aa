//! Idempotent single-file transfer between local disk and an object store.
//!
//! A transfer checks the destination first and does nothing if it already
//! exists. Otherwise it reads the whole source into memory and writes the whole
//! destination. When the copy fails, a partially written destination is
//! removed before the error is returned, so the destination is either complete
//! or absent.
//!
//! The two directional tasks ([`LocalToRemote`] and [`RemoteToLocal`]) only
//! differ in how they resolve their [`TransferEndpoints`].
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use object_store::ObjectStore;
//! use object_store::memory::InMemory;
//! use object_store::path::Path;
//! use pigshift_core::transfer::{TransferOutcome, run_transfer};
//! use pigshift_core::types::{Direction, TransferSpec};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let local_dir = tempfile::TempDir::new()?;
//! std::fs::write(local_dir.path().join("part-00000"), b"1\t2\n")?;
//!
//! let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
//! let spec = TransferSpec::new(
//!     Path::from("exports"),
//!     local_dir.path(),
//!     "part-00000",
//!     Direction::LocalToRemote,
//! );
//! let upload = spec.endpoints(store);
//!
//! assert_eq!(run_transfer(upload.as_ref()).await?, TransferOutcome::Copied { bytes: 4 });
//! assert_eq!(run_transfer(upload.as_ref()).await?, TransferOutcome::Skipped);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, info, warn};
use object_store::ObjectStore;
use object_store::path::Path as ObjectPath;
use tokio::io::AsyncWriteExt;

use crate::error::{Result, StorageError, StorageErrorExt, TransferError};
use crate::types::{Direction, TransferSpec};

/// One side of a transfer: a local file or a remote object.
///
/// Implementations move whole payloads only; there is no streaming or
/// resumption across calls. `exists` must answer for the exact file or object
/// the other methods touch, since the transfer skips its copy on `true`.
#[async_trait]
pub trait Target: Send + Sync {
    /// Returns `true` if the file or object is present.
    ///
    /// Something other than a regular file at a local path is an error, not
    /// "present".
    async fn exists(&self) -> std::result::Result<bool, StorageError>;

    /// Reads the full contents.
    async fn read_all(&self) -> std::result::Result<Bytes, StorageError>;

    /// Writes the full contents, replacing anything already there.
    async fn write_all(&self, data: Bytes) -> std::result::Result<(), StorageError>;

    /// Deletes the file or object.
    async fn remove(&self) -> std::result::Result<(), StorageError>;

    /// Human-readable location for logs and errors.
    fn describe(&self) -> String;
}

/// A file on local disk.
///
/// Writes create missing parent directories. After a failed copy only the
/// file itself is cleaned up; directories created for it are left in place.
#[derive(Debug, Clone)]
pub struct LocalTarget {
    path: PathBuf,
}

impl LocalTarget {
    /// Creates a target for the given local path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The local path.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl Target for LocalTarget {
    async fn exists(&self) -> std::result::Result<bool, StorageError> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() => Ok(true),
            Ok(_) => Err(StorageError::Local {
                path: self.path.clone(),
                source: std::io::Error::other("not a regular file"),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_local_context(&self.path),
        }
    }

    async fn read_all(&self) -> std::result::Result<Bytes, StorageError> {
        let data = tokio::fs::read(&self.path)
            .await
            .with_local_context(&self.path)?;
        Ok(Bytes::from(data))
    }

    async fn write_all(&self, data: Bytes) -> std::result::Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_local_context(parent)?;
        }
        let mut file = tokio::fs::File::create(&self.path)
            .await
            .with_local_context(&self.path)?;
        file.write_all(&data).await.with_local_context(&self.path)?;
        file.sync_all().await.with_local_context(&self.path)
    }

    async fn remove(&self) -> std::result::Result<(), StorageError> {
        tokio::fs::remove_file(&self.path)
            .await
            .with_local_context(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// An object inside an injected, externally owned store.
#[derive(Debug, Clone)]
pub struct RemoteTarget {
    store: Arc<dyn ObjectStore>,
    location: ObjectPath,
}

impl RemoteTarget {
    /// Creates a target for `location` inside `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, location: ObjectPath) -> Self {
        Self { store, location }
    }

    /// The object location.
    #[must_use]
    pub fn location(&self) -> &ObjectPath {
        &self.location
    }

    fn context(&self, source: object_store::Error) -> StorageError {
        StorageError::Remote {
            location: self.location.to_string(),
            source,
        }
    }
}

#[async_trait]
impl Target for RemoteTarget {
    async fn exists(&self) -> std::result::Result<bool, StorageError> {
        match self.store.head(&self.location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(self.context(e)),
        }
    }

    async fn read_all(&self) -> std::result::Result<Bytes, StorageError> {
        let result = self
            .store
            .get(&self.location)
            .await
            .map_err(|e| self.context(e))?;
        result.bytes().await.map_err(|e| self.context(e))
    }

    async fn write_all(&self, data: Bytes) -> std::result::Result<(), StorageError> {
        self.store
            .put(&self.location, data.into())
            .await
            .map_err(|e| self.context(e))?;
        Ok(())
    }

    async fn remove(&self) -> std::result::Result<(), StorageError> {
        self.store
            .delete(&self.location)
            .await
            .map_err(|e| self.context(e))
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.store, self.location)
    }
}

/// Source and destination of a transfer.
///
/// Each directional task decides which side is local and which is remote by
/// the targets it returns here. The targets are resolved on every call, so an
/// implementation should be cheap and side-effect free.
pub trait TransferEndpoints: Send + Sync {
    /// Where the bytes are read from.
    fn input_target(&self) -> Arc<dyn Target>;

    /// Where the bytes are written to.
    fn output_target(&self) -> Arc<dyn Target>;
}

/// Uploads `<local dir>/<file>` to `<remote>/<file>`.
#[derive(Debug, Clone)]
pub struct LocalToRemote {
    spec: TransferSpec,
    store: Arc<dyn ObjectStore>,
}

impl LocalToRemote {
    /// Creates the upload task.
    #[must_use]
    pub fn new(spec: TransferSpec, store: Arc<dyn ObjectStore>) -> Self {
        Self { spec, store }
    }
}

impl TransferEndpoints for LocalToRemote {
    fn input_target(&self) -> Arc<dyn Target> {
        Arc::new(LocalTarget::new(self.spec.local_path()))
    }

    fn output_target(&self) -> Arc<dyn Target> {
        Arc::new(RemoteTarget::new(
            Arc::clone(&self.store),
            self.spec.remote_path(),
        ))
    }
}

/// Downloads `<remote>/<file>` to `<local dir>/<file>`.
#[derive(Debug, Clone)]
pub struct RemoteToLocal {
    spec: TransferSpec,
    store: Arc<dyn ObjectStore>,
}

impl RemoteToLocal {
    /// Creates the download task.
    #[must_use]
    pub fn new(spec: TransferSpec, store: Arc<dyn ObjectStore>) -> Self {
        Self { spec, store }
    }
}

impl TransferEndpoints for RemoteToLocal {
    fn input_target(&self) -> Arc<dyn Target> {
        Arc::new(RemoteTarget::new(
            Arc::clone(&self.store),
            self.spec.remote_path(),
        ))
    }

    fn output_target(&self) -> Arc<dyn Target> {
        Arc::new(LocalTarget::new(self.spec.local_path()))
    }
}

impl TransferSpec {
    /// Resolves the endpoints matching this spec's direction.
    #[must_use]
    pub fn endpoints(&self, store: Arc<dyn ObjectStore>) -> Box<dyn TransferEndpoints> {
        match self.direction {
            Direction::LocalToRemote => Box::new(LocalToRemote::new(self.clone(), store)),
            Direction::RemoteToLocal => Box::new(RemoteToLocal::new(self.clone(), store)),
        }
    }
}

/// What a successful transfer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The destination already existed; nothing was moved.
    Skipped,
    /// The destination was written.
    Copied {
        /// Number of bytes written
        bytes: usize,
    },
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferOutcome::Skipped => write!(f, "skipped"),
            TransferOutcome::Copied { bytes } => write!(f, "copied {bytes} bytes"),
        }
    }
}

/// Returns `true` if the destination already exists.
///
/// # Errors
///
/// Returns [`TransferError::Check`] if the existence check itself fails.
pub async fn is_complete(endpoints: &dyn TransferEndpoints) -> Result<bool> {
    let output = endpoints.output_target();
    let exists = output
        .exists()
        .await
        .map_err(|source| TransferError::Check {
            target: output.describe(),
            source,
        })?;
    Ok(exists)
}

/// Runs the transfer unless the destination already exists.
///
/// Safe to call unconditionally from a retry loop: the destination is checked
/// again before anything is read.
///
/// # Errors
///
/// Returns [`TransferError::Check`] if the destination cannot be checked, or
/// [`TransferError::Copy`] if reading or writing fails. In the latter case the
/// destination has been removed if it was partially written.
pub async fn run_transfer(endpoints: &dyn TransferEndpoints) -> Result<TransferOutcome> {
    let input = endpoints.input_target();
    let output = endpoints.output_target();

    if is_complete(endpoints).await? {
        info!("{} already exists, skipping transfer", output.describe());
        return Ok(TransferOutcome::Skipped);
    }

    debug!("Copying {} to {}", input.describe(), output.describe());
    match copy(input.as_ref(), output.as_ref()).await {
        Ok(bytes) => {
            info!(
                "Copied {bytes} bytes from {} to {}",
                input.describe(),
                output.describe()
            );
            Ok(TransferOutcome::Copied { bytes })
        },
        Err(source) => {
            remove_partial(output.as_ref()).await;
            Err(TransferError::Copy {
                from: input.describe(),
                to: output.describe(),
                source,
            }
            .into())
        },
    }
}

async fn copy(input: &dyn Target, output: &dyn Target) -> std::result::Result<usize, StorageError> {
    let data = input.read_all().await?;
    let len = data.len();
    output.write_all(data).await?;
    Ok(len)
}

async fn remove_partial(output: &dyn Target) {
    match output.exists().await {
        Ok(true) => {
            warn!("Removing partially written {}", output.describe());
            if let Err(e) = output.remove().await {
                warn!("Failed to remove {}: {e}", output.describe());
            }
        },
        Ok(false) => {},
        Err(e) => warn!(
            "Could not check {} after a failed transfer: {e}",
            output.describe()
        ),
    }
}
