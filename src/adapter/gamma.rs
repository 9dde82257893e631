//! Market lifecycle metadata from the Gamma API.
//!
//! Gamma is public and unauthenticated. We only read the two fields the
//! maturity monitor cares about: whether the market has closed and its
//! scheduled end date.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::MarketId;
use crate::error::{Error, Result};
use crate::exchange::{MarketStatus, MarketStatusSource};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the Gamma markets API.
pub struct GammaClient {
    http: reqwest::Client,
    base_url: String,
}

impl GammaClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MarketStatusSource for GammaClient {
    async fn market_status(&self, market_id: &MarketId) -> Result<MarketStatus> {
        let url = format!("{}/markets?clob_token_ids={}", self.base_url, market_id);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Connection(format!(
                "Gamma API returned status {}",
                response.status()
            )));
        }

        let markets: Vec<GammaMarket> = response.json().await?;
        let market = markets
            .into_iter()
            .next()
            .ok_or_else(|| Error::Parse(format!("no Gamma market for token {market_id}")))?;

        Ok(market.into_status())
    }
}

/// Gamma market response (subset of fields we need).
#[derive(Debug, Deserialize)]
struct GammaMarket {
    #[serde(default)]
    closed: Option<bool>,
    #[serde(default, rename = "endDateIso", alias = "end_date_iso")]
    end_date_iso: Option<String>,
    #[serde(default, rename = "endDate", alias = "end_date")]
    end_date: Option<String>,
}

impl GammaMarket {
    fn into_status(self) -> MarketStatus {
        let end_date = self
            .end_date_iso
            .as_deref()
            .or(self.end_date.as_deref())
            .and_then(parse_end_date);

        MarketStatus {
            closed: self.closed.unwrap_or(false),
            end_date,
        }
    }
}

/// Gamma sometimes returns a bare date with no time component.
fn parse_end_date(raw: &str) -> Option<DateTime<Utc>> {
    let candidate = if raw.contains('T') {
        raw.to_string()
    } else {
        format!("{raw}T00:00:00Z")
    };
    DateTime::parse_from_rfc3339(&candidate)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
