//! Core types for the virtual filesystem.
//!
//! # Examples
//!
//! ```
//! use gistfs_vfs::{NodeId, VfsError};
//!
//! assert_eq!(NodeId::ROOT.get(), 1);
//!
//! let err = VfsError::NotFound { name: "notes.txt".to_string() };
//! assert!(err.is_not_found());
//! assert_eq!(err.errno(), libc::ENOENT);
//! ```

use std::fmt;
use thiserror::Error;

/// Errors surfaced to the filesystem protocol layer.
///
/// Remote failures are deliberately collapsed into `NotFound`; the cause is
/// logged where it happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VfsError {
    /// Entry does not exist, or its remote data could not be fetched
    #[error("Not found: {name}")]
    NotFound {
        /// Name of the missing entry (or the node whose fetch failed)
        name: String,
    },

    /// File node has no remote descriptor attached
    #[error("Bad file state: {name}")]
    BadFileState {
        /// Name of the file node
        name: String,
    },

    /// Name cannot be used as a path segment
    #[error("Invalid name: {name:?}")]
    InvalidName {
        /// The rejected name
        name: String,
    },
}

impl VfsError {
    /// Returns `true` if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a bad file state error.
    #[must_use]
    pub const fn is_bad_file_state(&self) -> bool {
        matches!(self, Self::BadFileState { .. })
    }

    /// Returns `true` if this is an invalid name error.
    #[must_use]
    pub const fn is_invalid_name(&self) -> bool {
        matches!(self, Self::InvalidName { .. })
    }

    /// Maps the error to the errno answered to the kernel.
    ///
    /// # Examples
    ///
    /// ```
    /// use gistfs_vfs::VfsError;
    ///
    /// let err = VfsError::BadFileState { name: "x".to_string() };
    /// assert_eq!(err.errno(), libc::EBADF);
    /// ```
    #[must_use]
    pub const fn errno(&self) -> libc::c_int {
        match self {
            Self::NotFound { .. } => libc::ENOENT,
            Self::BadFileState { .. } => libc::EBADF,
            Self::InvalidName { .. } => libc::EINVAL,
        }
    }
}

/// Type alias for VFS operation results.
pub type Result<T> = std::result::Result<T, VfsError>;

/// Identifier of a node in the tree.
///
/// Ids are dense, start at 1 with the root and are never reused, so they
/// serve directly as inode numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// The root directory.
    pub const ROOT: Self = Self(1);

    /// Wraps a raw id (for example an inode number handed back by the kernel).
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Position of the node in the arena, `None` for id 0.
    pub(crate) fn index(self) -> Option<usize> {
        usize::try_from(self.0.checked_sub(1)?).ok()
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u64 + 1)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a node is a directory or a file. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Directory
    Directory,
    /// Regular file
    File,
}

impl NodeKind {
    /// Returns `true` for directories.
    #[must_use]
    pub const fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// Population state of a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Population {
    /// Children have not been fetched yet
    #[default]
    Unpopulated,
    /// Children were derived from the remote listing; never refetched
    Populated,
}

/// One directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirEntry {
    /// Entry name
    pub name: String,
    /// Node the entry points to
    pub id: NodeId,
    /// `true` if the entry is a directory
    pub is_dir: bool,
}

/// Attributes synthesized for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes {
    /// Node kind
    pub kind: NodeKind,
    /// Permission bits
    pub perm: u16,
    /// Size in bytes; for files this is the size declared by the listing
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_index_roundtrip() {
        assert_eq!(NodeId::ROOT.index(), Some(0));
        assert_eq!(NodeId::from_index(0), NodeId::ROOT);
        assert_eq!(NodeId::from_index(41).get(), 42);
        assert_eq!(NodeId::new(0).index(), None);
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::new(7).to_string(), "#7");
    }

    #[test]
    fn test_error_classification() {
        let not_found = VfsError::NotFound {
            name: "a".to_string(),
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_bad_file_state());

        let bad = VfsError::BadFileState {
            name: "b".to_string(),
        };
        assert!(bad.is_bad_file_state());
        assert!(!bad.is_invalid_name());

        let invalid = VfsError::InvalidName {
            name: String::new(),
        };
        assert!(invalid.is_invalid_name());
        assert_eq!(invalid.errno(), libc::EINVAL);
    }

    #[test]
    fn test_population_defaults_to_unpopulated() {
        assert_eq!(Population::default(), Population::Unpopulated);
    }

    #[test]
    fn test_kind_is_dir() {
        assert!(NodeKind::Directory.is_dir());
        assert!(!NodeKind::File.is_dir());
    }
}
