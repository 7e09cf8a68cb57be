//! gistfs command-line library.
//!
//! Argument parsing, configuration loading, the FUSE adapter and the mount
//! runner, exposed as a library so they can be tested without a mount.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod cli;
pub mod config;
pub mod fuse;
pub mod runner;

pub use cli::Cli;
pub use fuse::GistFs;
