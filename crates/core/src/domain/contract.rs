use crate::domain::snapshot::{IndicatorSeries, NewsArticle, SeriesPoint, StockMover, StockRankings};
use anyhow::{ensure, Context};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

// Alpha Vantage answers throttled or invalid requests with HTTP 200 and one of these keys
// instead of the payload.
const NOTICE_KEYS: [&str; 3] = ["Note", "Information", "Error Message"];

/// Returns the provider notice text if the body is a notice instead of data.
pub fn provider_notice(raw: &Value) -> Option<String> {
    let obj = raw.as_object()?;
    NOTICE_KEYS.iter().find_map(|k| {
        obj.get(*k)
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopMoversPayload {
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub top_gainers: Option<Vec<MoverPayload>>,
    #[serde(default)]
    pub top_losers: Option<Vec<MoverPayload>>,
    #[serde(default)]
    pub most_actively_traded: Option<Vec<MoverPayload>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoverPayload {
    pub ticker: String,
    pub price: String,
    pub change_amount: String,
    pub change_percentage: String,
    pub volume: String,
}

impl TopMoversPayload {
    pub fn validate_and_into_rankings(self) -> anyhow::Result<StockRankings> {
        let top_gainers = self.top_gainers.context("missing top_gainers")?;
        let top_losers = self.top_losers.context("missing top_losers")?;
        let most_active = self
            .most_actively_traded
            .context("missing most_actively_traded")?;

        ensure!(
            !(top_gainers.is_empty() && top_losers.is_empty() && most_active.is_empty()),
            "all ranking lists are empty"
        );

        Ok(StockRankings {
            last_updated: self.last_updated.unwrap_or_default(),
            top_gainers: into_movers(top_gainers).context("top_gainers")?,
            top_losers: into_movers(top_losers).context("top_losers")?,
            most_actively_traded: into_movers(most_active).context("most_actively_traded")?,
        })
    }
}

fn into_movers(items: Vec<MoverPayload>) -> anyhow::Result<Vec<StockMover>> {
    items.into_iter().map(MoverPayload::validate_and_into_mover).collect()
}

impl MoverPayload {
    fn validate_and_into_mover(self) -> anyhow::Result<StockMover> {
        let ticker = self.ticker.trim().to_string();
        ensure!(!ticker.is_empty(), "ticker must be non-empty");

        let price = parse_f64(&self.price).with_context(|| format!("bad price for {ticker}"))?;
        let change_amount = parse_f64(&self.change_amount)
            .with_context(|| format!("bad change_amount for {ticker}"))?;
        let change_percentage = parse_f64(self.change_percentage.trim().trim_end_matches('%'))
            .with_context(|| format!("bad change_percentage for {ticker}"))?;
        let volume = self
            .volume
            .trim()
            .parse::<i64>()
            .with_context(|| format!("bad volume for {ticker}"))?;

        Ok(StockMover {
            ticker,
            price,
            change_amount,
            change_percentage,
            volume,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeriesPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<PointPayload>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointPayload {
    pub date: String,
    pub value: String,
}

impl SeriesPayload {
    pub fn validate_and_into_series(self) -> anyhow::Result<IndicatorSeries> {
        let data = self.data.context("missing data")?;

        let mut points = Vec::with_capacity(data.len());
        for p in data {
            // "." marks a missing observation.
            let Some(value) = parse_f64(&p.value) else {
                continue;
            };
            let date = NaiveDate::parse_from_str(p.date.trim(), "%Y-%m-%d")
                .with_context(|| format!("bad date: {}", p.date))?;
            points.push(SeriesPoint { date, value });
        }
        ensure!(!points.is_empty(), "series has no usable observations");

        Ok(IndicatorSeries {
            name: self.name.unwrap_or_default(),
            interval: self.interval.unwrap_or_default(),
            unit: self.unit.unwrap_or_default(),
            data: points,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RssDocument {
    pub channel: RssChannel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RssChannel {
    #[serde(rename = "item", default)]
    pub items: Vec<RssItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RssItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(rename = "pubDate", default)]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RssDocument {
    /// Items without a title or link are dropped; a feed with none left is rejected.
    pub fn validate_and_into_articles(self) -> anyhow::Result<Vec<NewsArticle>> {
        let total = self.channel.items.len();
        let articles: Vec<NewsArticle> = self
            .channel
            .items
            .into_iter()
            .filter_map(RssItem::into_article)
            .collect();
        ensure!(
            !articles.is_empty(),
            "feed has no usable items ({total} items total)"
        );
        Ok(articles)
    }
}

impl RssItem {
    fn into_article(self) -> Option<NewsArticle> {
        let title = non_empty(self.title)?;
        let link = non_empty(self.link)?;
        Some(NewsArticle {
            title,
            link,
            published_at: non_empty(self.pub_date).unwrap_or_default(),
            summary: non_empty(self.description).unwrap_or_default(),
        })
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_f64(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}
