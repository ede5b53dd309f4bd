//! Feed source adapter: Atom or RSS from a local file or over HTTP

mod parse;

pub use parse::{extract_content_tags, extract_title_tags, parse_feed};

use async_trait::async_trait;
use feed_relay_domain::{Entry, FeedError, FeedSource};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

const USER_AGENT: &str = concat!("feed-relay/", env!("CARGO_PKG_VERSION"));

/// Feed read from a path when one exists, otherwise fetched as a URL
pub struct XmlFeedSource {
    location: String,
    client: Client,
}

impl XmlFeedSource {
    pub fn new(location: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            location: location.into(),
            client,
        }
    }

    async fn read(&self) -> Result<String, FeedError> {
        let path = Path::new(&self.location);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "Reading feed from file");
            return Ok(tokio::fs::read_to_string(path).await?);
        }

        if !self.location.starts_with("http://") && !self.location.starts_with("https://") {
            return Err(FeedError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is neither a file nor an HTTP URL", self.location),
            )));
        }

        tracing::debug!(url = %self.location, "Fetching feed over HTTP");
        let response = self
            .client
            .get(&self.location)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::Network(format!(
                "HTTP {} from {}",
                response.status(),
                self.location
            )));
        }

        response
            .text()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))
    }
}

#[async_trait]
impl FeedSource for XmlFeedSource {
    fn location(&self) -> &str {
        &self.location
    }

    async fn fetch_entries(&self) -> Result<Vec<Entry>, FeedError> {
        let body = self.read().await?;
        parse_feed(&body, &self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = r#"<rss version="2.0"><channel><title>t</title>
<item><title>One</title><link>https://example.com/1</link><description>first</description></item>
</channel></rss>"#;

    #[tokio::test]
    async fn test_reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("feed.xml");
        std::fs::write(&file, RSS).unwrap();

        let source = XmlFeedSource::new(file.display().to_string());
        let entries = source.fetch_entries().await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].identifier(), "https://example.com/1");
    }

    #[tokio::test]
    async fn test_fetches_over_http() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&mock_server)
            .await;

        let source = XmlFeedSource::new(format!("{}/feed.xml", mock_server.uri()));
        let entries = source.fetch_entries().await.unwrap();

        assert_eq!(entries[0].title, "One");
    }

    #[tokio::test]
    async fn test_http_error_is_network_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let source = XmlFeedSource::new(format!("{}/missing.xml", mock_server.uri()));
        assert!(matches!(
            source.fetch_entries().await,
            Err(FeedError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_path_is_io_error() {
        let source = XmlFeedSource::new("/definitely/not/here.xml");
        assert!(matches!(source.fetch_entries().await, Err(FeedError::Io(_))));
    }
}
