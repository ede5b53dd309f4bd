//! Mastodon publishing adapter

use async_trait::async_trait;
use feed_relay_domain::{Delivery, DeliveryError, Destination, PreparedPost, RenderProfile};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default status length of a Mastodon instance
pub const DEFAULT_MAX_CHARS: usize = 500;

/// Status visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Unlisted,
    Private,
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "unlisted" => Ok(Self::Unlisted),
            "private" => Ok(Self::Private),
            other => Err(format!(
                "Unknown visibility '{}' (expected public, unlisted, private)",
                other
            )),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Private => "private",
        };
        f.write_str(name)
    }
}

/// Mastodon publisher posting statuses with an app access token
pub struct MastodonDestination {
    client: Client,
    access_token: SecretString,
    instance_url: String,
    visibility: Visibility,
    max_chars: usize,
}

impl MastodonDestination {
    pub fn new(access_token: SecretString, instance_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            access_token,
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            visibility: Visibility::default(),
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }
}

#[derive(Serialize)]
struct CreateStatusRequest<'a> {
    status: &'a str,
    visibility: Visibility,
}

#[derive(Deserialize)]
struct StatusResponse {
    id: String,
    url: Option<String>,
}

#[async_trait]
impl Destination for MastodonDestination {
    fn kind(&self) -> &'static str {
        "mastodon"
    }

    fn profile(&self) -> RenderProfile {
        RenderProfile {
            max_chars: Some(self.max_chars),
            ..Default::default()
        }
    }

    async fn deliver(&self, post: &PreparedPost) -> Result<Delivery, DeliveryError> {
        let len = post.text.chars().count();
        if len > self.max_chars {
            return Err(DeliveryError::ContentTooLong {
                len,
                max: self.max_chars,
            });
        }

        let url = format!("{}/api/v1/statuses", self.instance_url);
        let request = CreateStatusRequest {
            status: &post.text,
            visibility: self.visibility,
        };

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.access_token.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        if response.status() == 401 || response.status() == 403 {
            return Err(DeliveryError::Auth("Invalid access token".to_string()));
        }

        if response.status() == 429 {
            return Err(DeliveryError::RateLimited);
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Api(format!(
                "Failed to create status: {}",
                body
            )));
        }

        let status: StatusResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Api(e.to_string()))?;

        Ok(Delivery::Posted {
            id: Some(status.id),
            url: status.url,
        })
    }
}
