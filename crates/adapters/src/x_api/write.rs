//! X API write adapter for publishing posts

use async_trait::async_trait;
use feed_relay_domain::{Delivery, DeliveryError, Destination, PreparedPost, RenderProfile};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Length X charges for any link, shortened to t.co
pub const LINK_COST: usize = 23;

/// Default post length
pub const DEFAULT_MAX_CHARS: usize = 280;

/// Post length as X counts it: the link costs `LINK_COST` whatever its size
pub fn weighted_length(text: &str, link: &str) -> usize {
    let len = text.chars().count();
    if !link.is_empty() && text.contains(link) {
        len - link.chars().count() + LINK_COST
    } else {
        len
    }
}

/// X API publisher for creating posts
pub struct XDestination {
    client: Client,
    user_token: SecretString,
    base_url: String,
    max_chars: usize,
}

impl XDestination {
    pub fn new(user_token: SecretString) -> Self {
        Self::with_base_url(user_token, "https://api.twitter.com".to_string())
    }

    pub fn with_base_url(user_token: SecretString, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            user_token,
            base_url,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }
}

#[derive(Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

#[async_trait]
impl Destination for XDestination {
    fn kind(&self) -> &'static str {
        "x"
    }

    fn profile(&self) -> RenderProfile {
        RenderProfile {
            max_chars: Some(self.max_chars),
            link_cost: Some(LINK_COST),
            include_link: true,
        }
    }

    async fn deliver(&self, post: &PreparedPost) -> Result<Delivery, DeliveryError> {
        // Validate content length
        let len = weighted_length(&post.text, &post.link);
        if len > self.max_chars {
            return Err(DeliveryError::ContentTooLong {
                len,
                max: self.max_chars,
            });
        }

        let url = format!("{}/2/tweets", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.user_token.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&CreateTweetRequest { text: &post.text })
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        if response.status() == 401 {
            return Err(DeliveryError::Auth("Invalid user token".to_string()));
        }

        if response.status() == 429 {
            return Err(DeliveryError::RateLimited);
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Api(format!(
                "Failed to create tweet: {}",
                body
            )));
        }

        let tweet_response: CreateTweetResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Api(e.to_string()))?;

        let id = tweet_response.data.id;
        Ok(Delivery::Posted {
            url: Some(format!("https://x.com/i/status/{}", id)),
            id: Some(id),
        })
    }
}
