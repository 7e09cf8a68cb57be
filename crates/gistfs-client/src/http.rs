use async_trait::async_trait;
use gistfs_core::{Collection, Error, FsConfig, GistSource, Owner, Result};
use reqwest::Url;
use reqwest::header::ACCEPT;

/// Media type requested for listings.
const LISTING_MEDIA_TYPE: &str = "application/vnd.github+json";

/// `GistSource` backed by a `reqwest` client.
///
/// The client carries the configured timeout and user agent, and is reused
/// for every request so connections are pooled.
#[derive(Debug, Clone)]
pub struct HttpGistSource {
    client: reqwest::Client,
    config: FsConfig,
}

impl HttpGistSource {
    /// Creates a source from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the HTTP client cannot be built
    /// (for example when no TLS backend can be initialized).
    pub fn new(config: &FsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::ConfigError {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Issues a GET and returns the body of a successful response.
    async fn get(&self, url: &str, accept: Option<&str>) -> Result<Vec<u8>> {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }

        let unavailable = |e: reqwest::Error| Error::RemoteUnavailable {
            resource: url.to_string(),
            source: Box::new(e),
        };

        let response = request
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;

        let body = response.bytes().await.map_err(unavailable)?;
        Ok(body.to_vec())
    }
}

/// Builds the listing URL for `owner`, percent-encoding it as one path segment.
fn listing_url(config: &FsConfig, owner: &Owner) -> Result<Url> {
    let (prefix, suffix) = config.endpoint_parts()?;
    let invalid = |reason: String| Error::ConfigError {
        message: format!("invalid endpoint '{}': {reason}", config.endpoint),
    };

    let mut url = Url::parse(prefix).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("endpoint cannot hold path segments".to_string()))?
        .pop_if_empty()
        .push(owner.as_str());

    Url::parse(&format!("{url}{suffix}")).map_err(|e| invalid(e.to_string()))
}

#[async_trait]
impl GistSource for HttpGistSource {
    async fn fetch_listing(&self, owner: &Owner) -> Result<Vec<Collection>> {
        let url = listing_url(&self.config, owner)?;
        tracing::debug!("Fetching listing for {owner} from {url}");

        let body = self.get(url.as_str(), Some(LISTING_MEDIA_TYPE)).await?;
        let listing: Vec<Collection> =
            serde_json::from_slice(&body).map_err(|e| Error::SerializationError {
                message: format!("Failed to decode listing for {owner}: {e}"),
                source: Some(e),
            })?;

        tracing::debug!("Listing for {owner} has {} collections", listing.len());
        Ok(listing)
    }

    async fn fetch_content(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("Fetching content from {url}");
        let body = self.get(url, None).await?;
        tracing::debug!("Fetched {} bytes from {url}", body.len());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_with_default_config() {
        let source = HttpGistSource::new(&FsConfig::default());
        assert!(source.is_ok());
    }

    #[test]
    fn test_listing_url_default_endpoint() {
        let url = listing_url(&FsConfig::default(), &Owner::new("alice")).unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/users/alice/gists");
    }

    #[test]
    fn test_listing_url_encodes_owner() {
        let config = FsConfig::default();

        let url = listing_url(&config, &Owner::new("a?b")).unwrap();
        assert_eq!(url.path(), "/users/a%3Fb/gists");
        assert_eq!(url.query(), None);

        let url = listing_url(&config, &Owner::new("a#b c%")).unwrap();
        assert_eq!(url.path(), "/users/a%23b%20c%25/gists");
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_listing_url_keeps_suffix_query() {
        let config = FsConfig::builder()
            .endpoint("http://localhost:8080/users/{owner}?per_page=100")
            .build();

        let url = listing_url(&config, &Owner::new("alice")).unwrap();
        assert_eq!(url.path(), "/users/alice");
        assert_eq!(url.query(), Some("per_page=100"));
    }

    #[test]
    fn test_listing_url_rejects_bad_endpoint() {
        let config = FsConfig::builder().endpoint("not a url/{owner}").build();

        let err = listing_url(&config, &Owner::new("alice")).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpGistSource>();
    }
}
