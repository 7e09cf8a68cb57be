//! HTTP implementation of `GistSource`.
//!
//! Fetches an owner's collection listing from a GitHub-compatible JSON API
//! and raw file content from the URLs the listing advertises.
//!
//! # Examples
//!
//! ```no_run
//! use gistfs_client::HttpGistSource;
//! use gistfs_core::{FsConfig, GistSource, Owner};
//!
//! # async fn example() -> gistfs_core::Result<()> {
//! let source = HttpGistSource::new(&FsConfig::default())?;
//! let listing = source.fetch_listing(&Owner::new("octocat")).await?;
//! println!("{} collections", listing.len());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod http;

pub use http::HttpGistSource;
