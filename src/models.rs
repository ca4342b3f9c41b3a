// src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// News API credentials for a single request. Never stored, never logged.
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    pub id: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.id.trim().is_empty() && !self.secret.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &"<redacted>")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Most relevant first.
    Sim,
    /// Most recent first.
    Date,
}

impl SortMode {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortMode::Sim => "sim",
            SortMode::Date => "date",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub display: u32,
    pub sort: SortMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(Vec<NewsItem>),
    NoResults,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub current_price: f64,
    pub reference_price: f64,
    pub delta: f64,
}

/// A metal price converted into the local currency and display unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetalFigure {
    pub label: String,
    pub symbol: String,
    pub unit: String,
    pub local_price: f64,
    pub local_delta: f64,
    /// Price in the quote currency per source unit, as traded.
    pub source_price: f64,
}

/// Either fully built or not built at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub fx: Quote,
    pub metals: Vec<MetalFigure>,
}
