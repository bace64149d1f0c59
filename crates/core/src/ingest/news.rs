use crate::config::Settings;
use crate::domain::contract::RssDocument;
use crate::domain::snapshot::{NewsArticle, SnapshotField};
use crate::ingest::error::{FailureStage, UpstreamError};
use crate::ingest::{SourceData, UpstreamSource};
use anyhow::Context;
use std::time::Duration;

const DEFAULT_FEED_URL: &str =
    "https://search.cnbc.com/rs/search/combinedcms/view.xml?partnerId=wrss01&id=10000664";

#[derive(Debug, Clone)]
pub struct RssNewsSource {
    http: reqwest::Client,
    feed_url: String,
}

impl RssNewsSource {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let feed_url = settings
            .news_feed_url
            .clone()
            .unwrap_or_else(|| DEFAULT_FEED_URL.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.upstream_timeout_secs))
            .build()
            .context("failed to build news feed http client")?;

        Ok(Self { http, feed_url })
    }
}

pub(crate) fn parse_feed(source: &str, xml: &str) -> Result<Vec<NewsArticle>, UpstreamError> {
    let doc = quick_xml::de::from_str::<RssDocument>(xml).map_err(|e| {
        UpstreamError::new(source, FailureStage::Decode, format!("not a valid RSS document: {e}"))
    })?;
    doc.validate_and_into_articles()
        .map_err(|e| UpstreamError::new(source, FailureStage::Schema, format!("{e:#}")))
}

#[async_trait::async_trait]
impl UpstreamSource for RssNewsSource {
    fn name(&self) -> &str {
        "rss:news"
    }

    fn field(&self) -> SnapshotField {
        SnapshotField::News
    }

    async fn fetch(&self) -> Result<SourceData, UpstreamError> {
        let res = self
            .http
            .get(&self.feed_url)
            .send()
            .await
            .map_err(|e| UpstreamError::new(self.name(), FailureStage::Transport, e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| UpstreamError::new(self.name(), FailureStage::Transport, e.to_string()))?;
        if !status.is_success() {
            return Err(UpstreamError::new(
                self.name(),
                FailureStage::Http,
                format!("status={status}"),
            ));
        }

        Ok(SourceData::News(parse_feed(self.name(), &text)?))
    }
}
