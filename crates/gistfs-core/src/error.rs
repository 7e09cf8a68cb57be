//! Error types for gistfs.
//!
//! # Examples
//!
//! ```
//! use gistfs_core::{Error, Result};
//!
//! fn check_endpoint(endpoint: &str) -> Result<()> {
//!     if !endpoint.contains("{owner}") {
//!         return Err(Error::ConfigError {
//!             message: "endpoint must contain {owner}".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = check_endpoint("https://example.com").unwrap_err();
//! assert!(err.is_config_error());
//! ```

use thiserror::Error;

/// Main error type for gistfs.
///
/// The virtual filesystem collapses most of these into a "not found" signal
/// before they reach the kernel; the detail survives in logs.
#[derive(Error, Debug)]
pub enum Error {
    /// Remote listing or content fetch failed at the transport level.
    ///
    /// Covers connection failures, timeouts and non-success HTTP statuses.
    #[error("Remote source unavailable: {resource}")]
    RemoteUnavailable {
        /// Owner name or URL that could not be fetched
        resource: String,
        /// Underlying error cause
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Resource not found error.
    #[error("Resource not found: {resource}")]
    ResourceNotFound {
        /// Identifier of the missing resource
        resource: String,
    },

    /// Configuration error.
    ///
    /// Raised when configuration is invalid or contains contradictory settings.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// Serialization/deserialization error.
    ///
    /// Raised when a remote listing cannot be decoded.
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Description of the serialization failure
        message: String,
        /// Underlying serde error
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Invalid argument error.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Returns `true` if this is a remote transport error.
    ///
    /// # Examples
    ///
    /// ```
    /// use gistfs_core::Error;
    ///
    /// let err = Error::RemoteUnavailable {
    ///     resource: "alice".to_string(),
    ///     source: "connection refused".into(),
    /// };
    /// assert!(err.is_remote_error());
    /// ```
    #[must_use]
    pub const fn is_remote_error(&self) -> bool {
        matches!(self, Self::RemoteUnavailable { .. })
    }

    /// Returns `true` if this is a resource not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. })
    }

    /// Returns `true` if this is a configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use gistfs_core::Error;
    ///
    /// let err = Error::ConfigError {
    ///     message: "bad mode".to_string(),
    /// };
    /// assert!(err.is_config_error());
    /// ```
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Returns `true` if this is a serialization error.
    #[must_use]
    pub const fn is_serialization_error(&self) -> bool {
        matches!(self, Self::SerializationError { .. })
    }
}

/// Result type alias for gistfs operations.
pub type Result<T> = std::result::Result<T, Error>;
