// src/market.rs
use crate::error::DashboardError;
use crate::models::Quote;
use chrono::{DateTime, Utc};
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::future::Future;

/// One row of a price series.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub close: f64,
}

/// A `{period, interval}` pair as understood by the chart endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub period: &'static str,
    pub interval: &'static str,
}

impl Window {
    /// Finest series available: one-minute bars for the current session.
    pub const INTRADAY: Window = Window {
        period: "1d",
        interval: "1m",
    };
    /// Used when the market is closed and the intraday series is empty.
    pub const RECENT_DAILY: Window = Window {
        period: "5d",
        interval: "1d",
    };
}

/// Result of a series fetch, for one ticker or keyed by ticker.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesFrame {
    Single(Vec<Observation>),
    Multi(BTreeMap<String, Vec<Observation>>),
}

impl SeriesFrame {
    pub fn series(&self, ticker: &str) -> Option<&[Observation]> {
        match self {
            SeriesFrame::Single(rows) => Some(rows),
            SeriesFrame::Multi(table) => table.get(ticker).map(Vec::as_slice),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SeriesFrame::Single(rows) => rows.is_empty(),
            SeriesFrame::Multi(table) => table.values().all(Vec::is_empty),
        }
    }
}

pub trait QuoteSource: Sync {
    fn fetch_series(
        &self,
        ticker: &str,
        window: Window,
    ) -> impl Future<Output = Result<Vec<Observation>, DashboardError>> + Send;

    /// Fetch several tickers into one frame keyed by ticker. A lone ticker
    /// comes back as a single-series frame.
    fn fetch_joint(
        &self,
        tickers: &[&str],
        window: Window,
    ) -> impl Future<Output = Result<SeriesFrame, DashboardError>> + Send {
        async move {
            if let [ticker] = tickers {
                return Ok(SeriesFrame::Single(self.fetch_series(ticker, window).await?));
            }
            let mut table = BTreeMap::new();
            for ticker in tickers {
                let rows = self.fetch_series(ticker, window).await?;
                table.insert(ticker.to_string(), rows);
            }
            Ok(SeriesFrame::Multi(table))
        }
    }
}

/// Current price is the last close, reference is the first open.
pub fn derive_quote(symbol: &str, rows: &[Observation]) -> Option<Quote> {
    let first = rows.first()?;
    let last = rows.last()?;
    Some(Quote {
        symbol: symbol.to_string(),
        current_price: last.close,
        reference_price: first.open,
        delta: last.close - first.open,
    })
}

/// Intraday first, then the recent daily series. `None` means unavailable.
pub async fn fetch_quote<S: QuoteSource>(source: &S, ticker: &str) -> Option<Quote> {
    for window in [Window::INTRADAY, Window::RECENT_DAILY] {
        match source.fetch_series(ticker, window).await {
            Ok(rows) if !rows.is_empty() => {
                let quote = derive_quote(ticker, &rows)?;
                info!(
                    "[{ticker}] {} observations ({}/{}), last close {} at {}",
                    rows.len(),
                    window.period,
                    window.interval,
                    quote.current_price,
                    rows[rows.len() - 1].timestamp
                );
                return Some(quote);
            }
            Ok(_) => {
                warn!(
                    "[{ticker}] empty series for {}/{}",
                    window.period, window.interval
                );
            }
            Err(e) => {
                warn!("[{ticker}] failed to fetch price series: {}", e);
                return None;
            }
        }
    }
    warn!("[{ticker}] no price data in any window");
    None
}

// chart endpoint schema
#[derive(Deserialize, Debug)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Deserialize, Debug)]
pub struct ChartBody {
    pub result: Option<Vec<ChartResult>>,
}

#[derive(Deserialize, Debug)]
pub struct ChartResult {
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<ChartQuote>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ChartQuote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

impl ChartEnvelope {
    /// Rows with a missing open or close are dropped.
    pub fn into_observations(self) -> Vec<Observation> {
        let Some(base) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return vec![];
        };
        let Some(prices) = base.indicators.quote.into_iter().next() else {
            return vec![];
        };
        base.timestamp
            .iter()
            .zip(prices.open.iter())
            .zip(prices.close.iter())
            .filter_map(|((ts, open), close)| {
                let timestamp = DateTime::<Utc>::from_timestamp(*ts, 0)?;
                Some(Observation {
                    timestamp,
                    open: (*open)?,
                    close: (*close)?,
                })
            })
            .collect()
    }
}

/// Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooChart {
    client: Client,
    base_url: String,
}

impl YahooChart {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl QuoteSource for YahooChart {
    async fn fetch_series(
        &self,
        ticker: &str,
        window: Window,
    ) -> Result<Vec<Observation>, DashboardError> {
        let url = format!("{}/{}", self.base_url, ticker);
        let response = self
            .client
            .get(&url)
            .query(&[("range", window.period), ("interval", window.interval)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DashboardError::Transport(format!(
                "chart request for {} failed: HTTP {}",
                ticker,
                response.status()
            )));
        }

        let envelope: ChartEnvelope = response.json().await?;
        Ok(envelope.into_observations())
    }
}
