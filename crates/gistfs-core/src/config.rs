//! Configuration types for gistfs.
//!
//! `FsConfig` covers the remote endpoint, the HTTP client, the content cache
//! and the attributes synthesized for mounted entries. It deserializes from
//! TOML with every field optional.
//!
//! # Examples
//!
//! ```
//! use gistfs_core::FsConfig;
//! use std::time::Duration;
//!
//! let config = FsConfig::default();
//! assert_eq!(config.cache_capacity, 64);
//!
//! let custom = FsConfig::builder()
//!     .endpoint("http://127.0.0.1:8080/users/{owner}/gists")
//!     .cache_capacity(0)
//!     .build();
//! assert_eq!(custom.request_timeout(), Duration::from_secs(30));
//! ```

use crate::{Error, Owner, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default listing endpoint. `{owner}` is replaced with the encoded owner name.
pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/users/{owner}/gists";

/// Placeholder substituted in `FsConfig::endpoint`.
const OWNER_PLACEHOLDER: &str = "{owner}";

/// Filesystem and remote-source configuration.
///
/// ```toml
/// endpoint = "https://api.github.com/users/{owner}/gists"
/// user_agent = "gistfs/0.1.0"
/// request_timeout_secs = 30
/// cache_capacity = 64
/// file_mode = 0o660
/// dir_mode = 0o770
/// attr_ttl_secs = 1
/// owners = ["alice"]
/// log_level = "info"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Listing URL template containing `{owner}`.
    pub endpoint: String,

    /// `User-Agent` sent with every request.
    pub user_agent: String,

    /// Per-request timeout of the HTTP client, in seconds.
    pub request_timeout_secs: u64,

    /// Number of opened files whose content is kept in memory.
    ///
    /// Zero disables the content cache: every open fetches again.
    pub cache_capacity: usize,

    /// Permission bits reported for files.
    pub file_mode: u16,

    /// Permission bits reported for directories.
    pub dir_mode: u16,

    /// How long the kernel may cache attributes and entries, in seconds.
    pub attr_ttl_secs: u64,

    /// Owner directories created under the root before mounting.
    pub owners: Vec<Owner>,

    /// Log level used when neither `--verbose` nor `RUST_LOG` is set.
    pub log_level: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: concat!("gistfs/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 30,
            cache_capacity: 64,
            file_mode: 0o660,
            dir_mode: 0o770,
            attr_ttl_secs: 1,
            owners: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl FsConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> FsConfigBuilder {
        FsConfigBuilder::new()
    }

    /// Request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Attribute TTL as a `Duration`.
    #[must_use]
    pub const fn attr_ttl(&self) -> Duration {
        Duration::from_secs(self.attr_ttl_secs)
    }

    /// Splits the endpoint template around its `{owner}` placeholder.
    ///
    /// The placeholder must make up one whole path segment, so the owner
    /// can be substituted as an encoded segment.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the placeholder is missing, appears
    /// more than once, or shares a path segment with other text.
    ///
    /// # Examples
    ///
    /// ```
    /// use gistfs_core::FsConfig;
    ///
    /// let config = FsConfig::default();
    /// let (prefix, suffix) = config.endpoint_parts().unwrap();
    /// assert_eq!(prefix, "https://api.github.com/users/");
    /// assert_eq!(suffix, "/gists");
    /// ```
    pub fn endpoint_parts(&self) -> Result<(&str, &str)> {
        let Some((prefix, suffix)) = self.endpoint.split_once(OWNER_PLACEHOLDER) else {
            return Err(Error::ConfigError {
                message: format!("endpoint must contain {OWNER_PLACEHOLDER}: '{}'", self.endpoint),
            });
        };

        if suffix.contains(OWNER_PLACEHOLDER) {
            return Err(Error::ConfigError {
                message: format!(
                    "endpoint must contain {OWNER_PLACEHOLDER} only once: '{}'",
                    self.endpoint
                ),
            });
        }

        let whole_segment = prefix.ends_with('/')
            && !prefix.contains(['?', '#'])
            && (suffix.is_empty() || suffix.starts_with(['/', '?', '#']));
        if !whole_segment {
            return Err(Error::ConfigError {
                message: format!(
                    "{OWNER_PLACEHOLDER} must be a whole path segment of the endpoint: '{}'",
                    self.endpoint
                ),
            });
        }

        Ok((prefix, suffix))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if:
    /// - the endpoint has no usable `{owner}` path segment
    /// - the request timeout is zero
    /// - a mode has bits outside `0o7777`
    /// - the log level is unknown
    ///
    /// # Examples
    ///
    /// ```
    /// use gistfs_core::FsConfig;
    ///
    /// assert!(FsConfig::default().validate().is_ok());
    ///
    /// let mut invalid = FsConfig::default();
    /// invalid.endpoint = "https://example.com/gists".to_string();
    /// assert!(invalid.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        self.endpoint_parts()?;

        if self.request_timeout_secs == 0 {
            return Err(Error::ConfigError {
                message: "request_timeout_secs must be greater than zero".to_string(),
            });
        }

        for (field, mode) in [("file_mode", self.file_mode), ("dir_mode", self.dir_mode)] {
            if mode > 0o7777 {
                return Err(Error::ConfigError {
                    message: format!("{field} {mode:#o} exceeds 0o7777"),
                });
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(Error::ConfigError {
                message: format!(
                    "invalid log_level '{}', must be one of: {}",
                    self.log_level,
                    valid_levels.join(", ")
                ),
            });
        }

        Ok(())
    }
}

/// Builder for `FsConfig`.
#[derive(Debug, Clone, Default)]
pub struct FsConfigBuilder {
    config: FsConfig,
}

impl FsConfigBuilder {
    /// Creates a builder seeded with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the listing endpoint template.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Sets the `User-Agent` header value.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Sets the request timeout in seconds.
    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Sets the content cache capacity.
    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    /// Sets the reported file permissions.
    #[must_use]
    pub fn file_mode(mut self, mode: u16) -> Self {
        self.config.file_mode = mode;
        self
    }

    /// Sets the reported directory permissions.
    #[must_use]
    pub fn dir_mode(mut self, mode: u16) -> Self {
        self.config.dir_mode = mode;
        self
    }

    /// Adds an owner directory to create before mounting.
    #[must_use]
    pub fn owner(mut self, owner: impl Into<Owner>) -> Self {
        self.config.owners.push(owner.into());
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> FsConfig {
        self.config
    }
}
