//! Core traits for gistfs.
//!
//! # Module Structure
//!
//! - `source` - Remote listing and content provider trait

mod source;

pub use source::GistSource;
