//! Feed sources polled by the scheduler.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::utils::http::fetch_json;

/// Something that yields the current payload of a feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Short name used in logs ("main", "tsunami").
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Value>;
}

/// A JSON feed served over HTTP.
pub struct HttpFeed {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl HttpFeed {
    pub fn new(name: impl Into<String>, url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Value> {
        fetch_json(&self.client, &self.url)
            .await
            .map_err(|e| AppError::fetch(&self.name, format!("{} ({})", e, self.url)))
    }
}
