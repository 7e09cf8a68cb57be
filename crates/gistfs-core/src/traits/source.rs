//! Remote source trait.
//!
//! This module defines `GistSource`, the only way the virtual filesystem
//! talks to the network.

use crate::{Collection, Owner, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Provides remote listings and raw file content.
///
/// Implementations must be `Send + Sync`: the filesystem shares one source
/// across every request it serves.
///
/// # Examples
///
/// ```
/// use gistfs_core::traits::GistSource;
/// use gistfs_core::{Collection, Error, Owner, RemoteFile, Result};
/// use async_trait::async_trait;
///
/// struct StaticSource;
///
/// #[async_trait]
/// impl GistSource for StaticSource {
///     async fn fetch_listing(&self, owner: &Owner) -> Result<Vec<Collection>> {
///         if owner.as_str() != "alice" {
///             return Err(Error::ResourceNotFound {
///                 resource: owner.to_string(),
///             });
///         }
///         Ok(vec![Collection::new("1").with_file(
///             "notes.txt",
///             RemoteFile::new("mem://notes", 5),
///         )])
///     }
///
///     async fn fetch_content(&self, _url: &str) -> Result<Vec<u8>> {
///         Ok(b"hello".to_vec())
///     }
/// }
/// ```
#[async_trait]
pub trait GistSource: Send + Sync {
    /// Fetches every collection published by `owner`.
    ///
    /// A single request; no pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched or decoded.
    async fn fetch_listing(&self, owner: &Owner) -> Result<Vec<Collection>>;

    /// Fetches the raw bytes served at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails or the body cannot be read.
    async fn fetch_content(&self, url: &str) -> Result<Vec<u8>>;
}

#[async_trait]
impl<T: GistSource + ?Sized> GistSource for Arc<T> {
    async fn fetch_listing(&self, owner: &Owner) -> Result<Vec<Collection>> {
        (**self).fetch_listing(owner).await
    }

    async fn fetch_content(&self, url: &str) -> Result<Vec<u8>> {
        (**self).fetch_content(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, RemoteFile};

    struct OneFile;

    #[async_trait]
    impl GistSource for OneFile {
        async fn fetch_listing(&self, _owner: &Owner) -> Result<Vec<Collection>> {
            Ok(vec![
                Collection::new("a").with_file("f", RemoteFile::new("u", 3)),
            ])
        }

        async fn fetch_content(&self, url: &str) -> Result<Vec<u8>> {
            if url == "u" {
                Ok(b"abc".to_vec())
            } else {
                Err(Error::ResourceNotFound {
                    resource: url.to_string(),
                })
            }
        }
    }

    #[tokio::test]
    async fn test_arc_forwards_to_inner() {
        let source: Arc<dyn GistSource> = Arc::new(OneFile);
        let listing = source.fetch_listing(&Owner::new("x")).await.unwrap();
        assert_eq!(listing[0].files["f"].size, 3);
        assert_eq!(source.fetch_content("u").await.unwrap(), b"abc");
        assert!(source.fetch_content("v").await.unwrap_err().is_not_found());
    }
}
