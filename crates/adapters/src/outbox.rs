//! Outbox destination: appends prepared posts to a JSONL file for review.

use async_trait::async_trait;
use feed_relay_domain::model::PreparedPost;
use feed_relay_domain::ports::{Delivery, DeliveryError, Destination, RenderProfile};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Shared append-only handle; several outbox destinations may use one file
#[derive(Debug, Clone)]
pub struct OutboxWriter {
    path: PathBuf,
    file: Arc<Mutex<tokio::fs::File>>,
}

impl OutboxWriter {
    pub async fn new(path: PathBuf) -> Result<Self, OutboxError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, entry: &OutboxEntry<'_>) -> Result<(), OutboxError> {
        let line = serde_json::to_string(entry)?;
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OutboxDestination {
    writer: OutboxWriter,
    name: String,
    max_chars: Option<usize>,
}

impl OutboxDestination {
    pub fn new(writer: OutboxWriter, name: impl Into<String>) -> Self {
        Self {
            writer,
            name: name.into(),
            max_chars: None,
        }
    }

    /// Render as if for a platform with this status limit
    pub fn with_max_chars(mut self, max_chars: Option<usize>) -> Self {
        self.max_chars = max_chars;
        self
    }
}

#[derive(Serialize)]
struct OutboxEntry<'a> {
    id: String,
    destination: &'a str,
    entry_id: &'a str,
    text: &'a str,
    link: &'a str,
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    media_url: Option<&'a str>,
    queued_at: String,
}

#[async_trait]
impl Destination for OutboxDestination {
    fn kind(&self) -> &'static str {
        "outbox"
    }

    fn profile(&self) -> RenderProfile {
        RenderProfile {
            max_chars: self.max_chars,
            ..Default::default()
        }
    }

    async fn deliver(&self, post: &PreparedPost) -> Result<Delivery, DeliveryError> {
        let queued_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| DeliveryError::Api(format!("Timestamp formatting failed: {}", e)))?;
        let id = Uuid::new_v4().to_string();

        let entry = OutboxEntry {
            id: id.clone(),
            destination: &self.name,
            entry_id: &post.entry_id,
            text: &post.text,
            link: &post.link,
            tags: &post.tags,
            media_url: post.media_url.as_deref(),
            queued_at,
        };

        self.writer
            .append(&entry)
            .await
            .map_err(|error| DeliveryError::Api(format!("Outbox write failed: {}", error)))?;

        tracing::debug!(path = %self.writer.path().display(), id = %id, "Queued post in outbox");

        Ok(Delivery::Posted { id: Some(id), url: None })
    }
}
