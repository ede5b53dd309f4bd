//! Stub destination: logs posts and keeps them in memory

use async_trait::async_trait;
use feed_relay_domain::{Delivery, DeliveryError, Destination, PreparedPost, RenderProfile};
use std::sync::Mutex;

/// Destination that never leaves the process
pub struct StubDestination {
    name: String,
    max_chars: Option<usize>,
    published: Mutex<Vec<PreparedPost>>,
}

impl StubDestination {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_chars: None,
            published: Mutex::new(vec![]),
        }
    }

    pub fn with_max_chars(mut self, max_chars: Option<usize>) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Get all posts that were delivered
    pub fn get_published(&self) -> Vec<PreparedPost> {
        self.published
            .lock()
            .map(|posts| posts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Destination for StubDestination {
    fn kind(&self) -> &'static str {
        "stub"
    }

    fn profile(&self) -> RenderProfile {
        RenderProfile {
            max_chars: self.max_chars,
            ..Default::default()
        }
    }

    async fn deliver(&self, post: &PreparedPost) -> Result<Delivery, DeliveryError> {
        tracing::info!(destination = %self.name, text = %post.text, "Stub delivery");

        let mut published = self
            .published
            .lock()
            .map_err(|e| DeliveryError::Api(e.to_string()))?;
        published.push(post.clone());

        Ok(Delivery::Posted {
            id: Some(format!("stub_{}", published.len())),
            url: None,
        })
    }
}
