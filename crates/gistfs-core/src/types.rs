//! Strong domain types for gistfs.
//!
//! The remote listing is decoded straight into these types, so their serde
//! attributes follow the JSON shape of the GitHub gists API.
//!
//! # Examples
//!
//! ```
//! use gistfs_core::{Collection, Owner};
//!
//! let owner = Owner::new("alice");
//! assert_eq!(owner.as_str(), "alice");
//!
//! let json = r#"[{"id": "abc", "files": {"notes.txt": {"raw_url": "https://x/raw", "size": 42}}}]"#;
//! let listing: Vec<Collection> = serde_json::from_str(json).unwrap();
//! assert_eq!(listing[0].files["notes.txt"].size, 42);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Remote owner identifier (newtype over String).
///
/// An owner is the account whose published collections make up one
/// directory of the mounted tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(String);

impl Owner {
    /// Creates a new owner identifier without validation.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates an owner identifier that is usable as a path segment.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if the name is empty, contains a `/`
    /// or a NUL byte, or is one of `.` and `..`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gistfs_core::Owner;
    ///
    /// assert!(Owner::parse("alice").is_ok());
    /// assert!(Owner::parse("").is_err());
    /// assert!(Owner::parse("a/b").is_err());
    /// ```
    pub fn parse(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.is_empty() || name == "." || name == ".." {
            return Err(crate::Error::InvalidArgument(format!(
                "invalid owner name: '{name}'"
            )));
        }
        if name.contains('/') || name.contains('\0') {
            return Err(crate::Error::InvalidArgument(format!(
                "owner name must be a single path segment: '{name}'"
            )));
        }
        Ok(Self(name))
    }

    /// Returns the owner as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Owner` and returns the inner `String`.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Owner {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Owner {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Descriptor of one remote file: where to fetch it and how big it claims
/// to be.
///
/// `size` is whatever the listing declared. It is reported as the file size
/// even when the fetched content turns out to be a different length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// URL serving the raw file content
    #[serde(rename = "raw_url")]
    pub url: String,

    /// Declared size in bytes
    #[serde(default)]
    pub size: u64,
}

impl RemoteFile {
    /// Creates a new remote file descriptor.
    #[must_use]
    pub fn new(url: impl Into<String>, size: u64) -> Self {
        Self {
            url: url.into(),
            size,
        }
    }
}

/// One entry of a remote listing: an identifier plus its files.
///
/// Files are kept in a `BTreeMap` so iteration order is by filename.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Collection {
    /// Collection identifier
    pub id: String,

    /// Filename to descriptor
    #[serde(default)]
    pub files: BTreeMap<String, RemoteFile>,
}

impl Collection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            files: BTreeMap::new(),
        }
    }

    /// Adds a file to the collection, builder style.
    ///
    /// # Examples
    ///
    /// ```
    /// use gistfs_core::{Collection, RemoteFile};
    ///
    /// let c = Collection::new("abc")
    ///     .with_file("a.txt", RemoteFile::new("https://x/a", 1))
    ///     .with_file("b.txt", RemoteFile::new("https://x/b", 2));
    /// assert_eq!(c.files.len(), 2);
    /// ```
    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, file: RemoteFile) -> Self {
        self.files.insert(name.into(), file);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_parse_valid() {
        let owner = Owner::parse("andrewstuart").unwrap();
        assert_eq!(owner.as_str(), "andrewstuart");
        assert_eq!(owner.to_string(), "andrewstuart");
    }

    #[test]
    fn test_owner_parse_rejects_bad_segments() {
        for bad in ["", ".", "..", "a/b", "nul\0byte"] {
            let err = Owner::parse(bad).unwrap_err();
            assert!(matches!(err, crate::Error::InvalidArgument(_)), "{bad:?}");
        }
    }

    #[test]
    fn test_owner_into_inner() {
        let owner = Owner::from("bob");
        assert_eq!(owner.into_inner(), "bob");
    }

    #[test]
    fn test_decode_github_listing() {
        let json = r#"
        [{
            "url": "https://api.github.com/gists/123abc",
            "id": "123abc",
            "public": true,
            "files": {
                "file1": {
                    "raw_url": "https://gist.example/raw/123abc",
                    "size": 123,
                    "filename": "file1",
                    "language": null
                }
            }
        }]"#;

        let listing: Vec<Collection> = serde_json::from_str(json).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].id, "123abc");
        let file = &listing[0].files["file1"];
        assert_eq!(file.url, "https://gist.example/raw/123abc");
        assert_eq!(file.size, 123);
    }

    #[test]
    fn test_decode_collection_without_files() {
        let listing: Vec<Collection> = serde_json::from_str(r#"[{"id": "empty"}]"#).unwrap();
        assert!(listing[0].files.is_empty());
    }

    #[test]
    fn test_decode_missing_size_defaults_to_zero() {
        let file: RemoteFile = serde_json::from_str(r#"{"raw_url": "https://x"}"#).unwrap();
        assert_eq!(file.size, 0);
    }

    #[test]
    fn test_collection_files_iterate_by_name() {
        let c = Collection::new("c")
            .with_file("zeta", RemoteFile::new("u1", 1))
            .with_file("alpha", RemoteFile::new("u2", 2));
        let names: Vec<_> = c.files.keys().cloned().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
