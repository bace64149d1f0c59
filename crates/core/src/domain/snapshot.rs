use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The cached unit served to every dashboard: financial news plus the six trend panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSnapshot {
    pub news: Vec<NewsArticle>,
    pub trends: Trends,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub link: String,
    pub published_at: String,
    pub summary: String,
}

/// One field per trend key. Serialized as a map keyed by the display names, so a snapshot
/// missing any key fails to deserialize instead of reaching a client half-shaped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trends {
    #[serde(rename = "Stocks")]
    pub stocks: StockRankings,
    #[serde(rename = "GDP")]
    pub gdp: IndicatorSeries,
    #[serde(rename = "Inflation")]
    pub inflation: IndicatorSeries,
    #[serde(rename = "Unemployment")]
    pub unemployment: IndicatorSeries,
    #[serde(rename = "Treasury Yield")]
    pub treasury_yield: IndicatorSeries,
    #[serde(rename = "Federal Interest Rate")]
    pub federal_interest_rate: IndicatorSeries,
}

impl Trends {
    pub fn series(&self, indicator: Indicator) -> &IndicatorSeries {
        match indicator {
            Indicator::Gdp => &self.gdp,
            Indicator::Inflation => &self.inflation,
            Indicator::Unemployment => &self.unemployment,
            Indicator::TreasuryYield => &self.treasury_yield,
            Indicator::FederalInterestRate => &self.federal_interest_rate,
        }
    }

    pub fn series_mut(&mut self, indicator: Indicator) -> &mut IndicatorSeries {
        match indicator {
            Indicator::Gdp => &mut self.gdp,
            Indicator::Inflation => &mut self.inflation,
            Indicator::Unemployment => &mut self.unemployment,
            Indicator::TreasuryYield => &mut self.treasury_yield,
            Indicator::FederalInterestRate => &mut self.federal_interest_rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Indicator {
    Gdp,
    Inflation,
    Unemployment,
    TreasuryYield,
    FederalInterestRate,
}

impl Indicator {
    pub const ALL: [Indicator; 5] = [
        Indicator::Gdp,
        Indicator::Inflation,
        Indicator::Unemployment,
        Indicator::TreasuryYield,
        Indicator::FederalInterestRate,
    ];

    /// Key under which the series appears in `trends`.
    pub fn trend_key(self) -> &'static str {
        match self {
            Indicator::Gdp => "GDP",
            Indicator::Inflation => "Inflation",
            Indicator::Unemployment => "Unemployment",
            Indicator::TreasuryYield => "Treasury Yield",
            Indicator::FederalInterestRate => "Federal Interest Rate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub name: String,
    pub interval: String,
    pub unit: String,
    pub data: Vec<SeriesPoint>,
}

impl IndicatorSeries {
    /// Points ordered oldest first. Sources usually deliver newest first.
    pub fn sorted_ascending(&self) -> Vec<SeriesPoint> {
        let mut points = self.data.clone();
        points.sort_by_key(|p| p.date);
        points
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRankings {
    pub last_updated: String,
    pub top_gainers: Vec<StockMover>,
    pub top_losers: Vec<StockMover>,
    pub most_actively_traded: Vec<StockMover>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMover {
    pub ticker: String,
    pub price: f64,
    pub change_amount: f64,
    pub change_percentage: f64,
    pub volume: i64,
}

/// The single durable row: the last committed snapshot and when it was committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub timestamp: DateTime<Utc>,
    pub data: CompositeSnapshot,
}

/// Which part of the snapshot a source is responsible for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SnapshotField {
    News,
    Stocks,
    Indicator(Indicator),
}

impl SnapshotField {
    pub fn label(self) -> &'static str {
        match self {
            SnapshotField::News => "news",
            SnapshotField::Stocks => "Stocks",
            SnapshotField::Indicator(i) => i.trend_key(),
        }
    }
}

impl std::fmt::Display for SnapshotField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
