use crate::config::Settings;
use crate::domain::contract::{provider_notice, SeriesPayload, TopMoversPayload};
use crate::domain::snapshot::{Indicator, SnapshotField};
use crate::ingest::error::{FailureStage, UpstreamError};
use crate::ingest::{SourceData, UpstreamSource};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl AlphaVantageClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings
            .require_alpha_vantage_api_key()
            .ok()
            .map(str::to_string);
        if api_key.is_none() {
            tracing::warn!("ALPHA_VANTAGE_API_KEY missing; market data will be served from backup");
        }
        let base_url = settings
            .alpha_vantage_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.upstream_timeout_secs))
            .build()
            .context("failed to build Alpha Vantage http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/query", self.base_url.trim_end_matches('/'))
    }

    async fn query<T: DeserializeOwned>(
        &self,
        source: &str,
        function: &str,
        extra: &[(&str, &str)],
    ) -> Result<T, UpstreamError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(UpstreamError::new(
                source,
                FailureStage::Schema,
                "ALPHA_VANTAGE_API_KEY is required",
            ));
        };
        let mut params = vec![("function", function), ("apikey", api_key)];
        params.extend_from_slice(extra);

        let res = self
            .http
            .get(self.url())
            .query(&params)
            .send()
            .await
            .map_err(|e| UpstreamError::new(source, FailureStage::Transport, e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| UpstreamError::new(source, FailureStage::Transport, e.to_string()))?;
        if !status.is_success() {
            return Err(UpstreamError::new(
                source,
                FailureStage::Http,
                format!("status={status}"),
            ));
        }

        decode_json(source, &text)
    }
}

/// Parses a market-data body, classifying provider notices separately from bad JSON.
pub(crate) fn decode_json<T: DeserializeOwned>(source: &str, text: &str) -> Result<T, UpstreamError> {
    let raw = serde_json::from_str::<Value>(text).map_err(|e| {
        UpstreamError::new(source, FailureStage::Decode, format!("not valid JSON: {e}"))
    })?;

    if let Some(notice) = provider_notice(&raw) {
        return Err(UpstreamError::new(source, FailureStage::RateLimited, notice));
    }

    serde_json::from_value::<T>(raw)
        .map_err(|e| UpstreamError::new(source, FailureStage::Schema, e.to_string()))
}

#[derive(Debug, Clone)]
pub struct TopMoversSource {
    client: AlphaVantageClient,
}

impl TopMoversSource {
    pub fn new(client: AlphaVantageClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl UpstreamSource for TopMoversSource {
    fn name(&self) -> &str {
        "alpha_vantage:TOP_GAINERS_LOSERS"
    }

    fn field(&self) -> SnapshotField {
        SnapshotField::Stocks
    }

    async fn fetch(&self) -> Result<SourceData, UpstreamError> {
        let payload: TopMoversPayload = self
            .client
            .query(self.name(), "TOP_GAINERS_LOSERS", &[])
            .await?;
        let rankings = payload
            .validate_and_into_rankings()
            .map_err(|e| UpstreamError::new(self.name(), FailureStage::Schema, format!("{e:#}")))?;
        Ok(SourceData::Stocks(rankings))
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSource {
    client: AlphaVantageClient,
    indicator: Indicator,
    name: String,
}

impl IndicatorSource {
    pub fn new(client: AlphaVantageClient, indicator: Indicator) -> Self {
        let name = format!("alpha_vantage:{}", function_for(indicator));
        Self {
            client,
            indicator,
            name,
        }
    }
}

fn function_for(indicator: Indicator) -> &'static str {
    match indicator {
        Indicator::Gdp => "REAL_GDP",
        Indicator::Inflation => "INFLATION",
        Indicator::Unemployment => "UNEMPLOYMENT",
        Indicator::TreasuryYield => "TREASURY_YIELD",
        Indicator::FederalInterestRate => "FEDERAL_FUNDS_RATE",
    }
}

fn params_for(indicator: Indicator) -> &'static [(&'static str, &'static str)] {
    match indicator {
        Indicator::Gdp => &[("interval", "quarterly")],
        Indicator::Inflation | Indicator::Unemployment => &[],
        Indicator::TreasuryYield => &[("interval", "monthly"), ("maturity", "10year")],
        Indicator::FederalInterestRate => &[("interval", "monthly")],
    }
}

#[async_trait::async_trait]
impl UpstreamSource for IndicatorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn field(&self) -> SnapshotField {
        SnapshotField::Indicator(self.indicator)
    }

    async fn fetch(&self) -> Result<SourceData, UpstreamError> {
        let payload: SeriesPayload = self
            .client
            .query(
                &self.name,
                function_for(self.indicator),
                params_for(self.indicator),
            )
            .await?;
        let series = payload
            .validate_and_into_series()
            .map_err(|e| UpstreamError::new(&self.name, FailureStage::Schema, format!("{e:#}")))?;
        Ok(SourceData::Series(series))
    }
}
