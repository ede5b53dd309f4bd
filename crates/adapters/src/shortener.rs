//! URL shorteners answering a plain-text GET

use async_trait::async_trait;
use feed_relay_domain::{ShortenError, UrlShortener};
use reqwest::Client;
use std::time::Duration;

/// Names accepted by `SimpleShortener::by_name`
pub const KNOWN_SHORTENERS: &[&str] = &["isgd", "dagd", "tinyurl"];

/// Shortener whose API takes the long URL as a query parameter and answers
/// with the short URL as the whole body
pub struct SimpleShortener {
    name: &'static str,
    endpoint: String,
    param: &'static str,
    client: Client,
}

impl SimpleShortener {
    fn build(name: &'static str, endpoint: String, param: &'static str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap_or_default();
        Self {
            name,
            endpoint,
            param,
            client,
        }
    }

    pub fn isgd() -> Self {
        Self::build("isgd", "https://is.gd/create.php?format=simple".to_string(), "url")
    }

    pub fn dagd() -> Self {
        Self::build("dagd", "https://da.gd/s".to_string(), "url")
    }

    pub fn tinyurl() -> Self {
        Self::build("tinyurl", "https://tinyurl.com/api-create.php".to_string(), "url")
    }

    /// Look a shortener up by its option name
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "isgd" => Some(Self::isgd()),
            "dagd" => Some(Self::dagd()),
            "tinyurl" => Some(Self::tinyurl()),
            _ => None,
        }
    }

    /// Point at another endpoint (for testing)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl UrlShortener for SimpleShortener {
    fn name(&self) -> &str {
        self.name
    }

    async fn shorten(&self, url: &str) -> Result<String, ShortenError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[(self.param, url)])
            .send()
            .await
            .map_err(|e| ShortenError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShortenError::Api(format!("{}: {}", self.name, body.trim())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ShortenError::Network(e.to_string()))?;
        let short = body.trim();

        if !short.starts_with("http://") && !short.starts_with("https://") {
            return Err(ShortenError::Api(format!("{}: {}", self.name, short)));
        }

        Ok(short.to_string())
    }
}
