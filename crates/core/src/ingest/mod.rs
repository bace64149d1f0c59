use crate::config::Settings;
use crate::domain::snapshot::{IndicatorSeries, NewsArticle, SnapshotField, StockRankings};
use crate::ingest::error::UpstreamError;
use std::sync::Arc;

pub mod alpha_vantage;
pub mod error;
pub mod news;

/// Validated payload from one upstream source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceData {
    News(Vec<NewsArticle>),
    Stocks(StockRankings),
    Series(IndicatorSeries),
}

/// One external data source. Each `fetch` is exactly one network call with no other
/// side effects.
#[async_trait::async_trait]
pub trait UpstreamSource: Send + Sync {
    fn name(&self) -> &str;

    fn field(&self) -> SnapshotField;

    async fn fetch(&self) -> Result<SourceData, UpstreamError>;
}

/// The seven production sources: stock rankings, five indicators, one news feed.
pub fn default_sources(settings: &Settings) -> anyhow::Result<Vec<Arc<dyn UpstreamSource>>> {
    let av = alpha_vantage::AlphaVantageClient::from_settings(settings)?;

    let mut sources: Vec<Arc<dyn UpstreamSource>> =
        vec![Arc::new(alpha_vantage::TopMoversSource::new(av.clone()))];
    for indicator in crate::domain::snapshot::Indicator::ALL {
        sources.push(Arc::new(alpha_vantage::IndicatorSource::new(
            av.clone(),
            indicator,
        )));
    }
    sources.push(Arc::new(news::RssNewsSource::from_settings(settings)?));

    Ok(sources)
}
