//! Data types shared by the schema translator and the file transfer tasks.

use std::fmt;
use std::path::PathBuf;

use object_store::path::Path as ObjectPath;

/// A Redshift column definition, or a trailing key/constraint clause.
///
/// Key clauses such as `("PRIMARY KEY", "(id)")` use the same shape so they can
/// be appended after the columns they describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Column name, or the constraint keyword for key clauses
    pub name: String,
    /// Redshift type, or the constraint body for key clauses
    pub sql_type: String,
}

impl ColumnDefinition {
    /// Creates a new column definition.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }

    /// Returns the definition as a borrowed `(name, type)` pair.
    #[must_use]
    pub fn as_pair(&self) -> (&str, &str) {
        (&self.name, &self.sql_type)
    }
}

impl<N: Into<String>, T: Into<String>> From<(N, T)> for ColumnDefinition {
    fn from((name, sql_type): (N, T)) -> Self {
        Self::new(name, sql_type)
    }
}

impl fmt::Display for ColumnDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.sql_type)
    }
}

/// Which side of a single-file transfer is the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Upload `<local dir>/<file>` to `<remote>/<file>`
    LocalToRemote,
    /// Download `<remote>/<file>` to `<local dir>/<file>`
    RemoteToLocal,
}

impl Direction {
    /// Returns a short label for logs and CLI output.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Direction::LocalToRemote => "upload",
            Direction::RemoteToLocal => "download",
        }
    }
}

/// Everything needed to move one named file between local disk and a store.
#[derive(Debug, Clone)]
pub struct TransferSpec {
    /// Prefix of the remote object inside the injected store
    pub remote: ObjectPath,
    /// Local directory holding (or receiving) the file
    pub local_dir: PathBuf,
    /// Name of the file on both sides
    pub file_name: String,
    /// Transfer direction
    pub direction: Direction,
}

impl TransferSpec {
    /// Creates a new transfer spec.
    #[must_use]
    pub fn new(
        remote: ObjectPath,
        local_dir: impl Into<PathBuf>,
        file_name: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            remote,
            local_dir: local_dir.into(),
            file_name: file_name.into(),
            direction,
        }
    }

    /// Location of the file on local disk.
    #[must_use]
    pub fn local_path(&self) -> PathBuf {
        self.local_dir.join(&self.file_name)
    }

    /// Location of the file inside the object store.
    #[must_use]
    pub fn remote_path(&self) -> ObjectPath {
        self.remote.child(self.file_name.as_str())
    }
}
