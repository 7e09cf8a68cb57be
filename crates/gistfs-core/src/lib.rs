//! Core types, traits, and errors for gistfs.
//!
//! This crate provides the foundational types and abstractions shared by
//! every other crate in the workspace.
//!
//! # Architecture
//!
//! The core consists of:
//! - Strong domain types (`Owner`, `Collection`, `RemoteFile`)
//! - Error hierarchy with contextual information
//! - The `GistSource` trait, the seam between the filesystem and the network
//! - Filesystem configuration (`FsConfig`)

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod config;
mod error;
mod types;

pub mod cli;
pub mod traits;

pub use config::{FsConfig, FsConfigBuilder, DEFAULT_ENDPOINT};
pub use error::{Error, Result};
pub use traits::GistSource;
pub use types::{Collection, Owner, RemoteFile};
