//! Virtual filesystem over a remote gist listing.
//!
//! The tree starts as a bare root. Directories created under it name remote
//! owners; the first listing of such a directory fetches the owner's
//! collections and turns every file into a child node. File content is only
//! fetched when a file is opened.
//!
//! # Examples
//!
//! ```
//! use async_trait::async_trait;
//! use gistfs_core::{Collection, GistSource, Owner, RemoteFile, Result};
//! use gistfs_vfs::VirtualFs;
//! use std::sync::Arc;
//!
//! struct Fixed;
//!
//! #[async_trait]
//! impl GistSource for Fixed {
//!     async fn fetch_listing(&self, _owner: &Owner) -> Result<Vec<Collection>> {
//!         Ok(vec![Collection::new("1").with_file("notes.txt", RemoteFile::new("mem://n", 5))])
//!     }
//!     async fn fetch_content(&self, _url: &str) -> Result<Vec<u8>> {
//!         Ok(b"hello".to_vec())
//!     }
//! }
//!
//! # tokio_test();
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn tokio_test() {
//! let fs = VirtualFs::new(Arc::new(Fixed));
//! let alice = fs.mkdir(fs.root(), "alice").await.unwrap();
//! let entries = fs.list(alice).await.unwrap();
//! assert_eq!(entries[0].name, "notes.txt");
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod cache;
pub mod types;
pub mod vfs;

pub use cache::ContentCache;
pub use types::{Attributes, DirEntry, NodeId, NodeKind, Population, Result, VfsError};
pub use vfs::VirtualFs;
