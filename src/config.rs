// src/config.rs
use crate::models::SortMode;
use crate::units::{MassUnit, DON, TROY_OUNCE};
use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_NEWS_ENDPOINT: &str = "https://openapi.naver.com/v1/search/news.json";
pub const DEFAULT_MARKET_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// How the market panel gathers its series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// One request per ticker, intraday with a daily fallback.
    PerTicker,
    /// All tickers in one intraday pass, no fallback.
    Joint,
}

/// Which FX rate converts a metal's delta into the local currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaBasis {
    /// Unit-scaled delta times the current rate. Ignores FX movement.
    CurrentRate,
    /// Current local price minus the opening price at the opening rate.
    OpeningRate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetalSpec {
    pub label: &'static str,
    pub symbol: &'static str,
    pub source_unit: MassUnit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketPlan {
    pub fx_symbol: &'static str,
    pub fx_label: &'static str,
    pub currency: &'static str,
    pub metals: Vec<MetalSpec>,
    pub target_unit: MassUnit,
    pub mode: FetchMode,
    pub delta_basis: DeltaBasis,
}

impl MarketPlan {
    pub fn tickers(&self) -> Vec<&'static str> {
        let mut tickers: Vec<_> = self.metals.iter().map(|m| m.symbol).collect();
        tickers.push(self.fx_symbol);
        tickers
    }
}

/// One of the dashboard variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// News search only.
    News,
    /// Per-ounce KRW prices from a single joint fetch.
    Joint,
    /// Per-ounce KRW prices with per-ticker fallback.
    Ounce,
    /// Per-don KRW prices with per-ticker fallback.
    Don,
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "news" => Ok(Profile::News),
            "joint" => Ok(Profile::Joint),
            "ounce" => Ok(Profile::Ounce),
            "don" => Ok(Profile::Don),
            other => Err(format!("unknown dashboard profile: {other}")),
        }
    }
}

fn metals() -> Vec<MetalSpec> {
    vec![
        MetalSpec {
            label: "Gold",
            symbol: "GC=F",
            source_unit: TROY_OUNCE,
        },
        MetalSpec {
            label: "Silver",
            symbol: "SI=F",
            source_unit: TROY_OUNCE,
        },
    ]
}

impl Profile {
    pub fn market_plan(&self) -> Option<MarketPlan> {
        let (target_unit, mode, delta_basis) = match self {
            Profile::News => return None,
            Profile::Joint => (TROY_OUNCE, FetchMode::Joint, DeltaBasis::OpeningRate),
            Profile::Ounce => (TROY_OUNCE, FetchMode::PerTicker, DeltaBasis::CurrentRate),
            Profile::Don => (DON, FetchMode::PerTicker, DeltaBasis::CurrentRate),
        };
        Some(MarketPlan {
            fx_symbol: "KRW=X",
            fx_label: "USD/KRW",
            currency: "원",
            metals: metals(),
            target_unit,
            mode,
            delta_basis,
        })
    }

    pub fn title(&self) -> &'static str {
        match self {
            Profile::News => "News search",
            Profile::Joint | Profile::Ounce | Profile::Don => "Today's market & news",
        }
    }

    pub fn display(&self) -> u32 {
        match self {
            Profile::News => 10,
            Profile::Joint | Profile::Ounce | Profile::Don => 5,
        }
    }

    pub fn sort(&self) -> SortMode {
        match self {
            Profile::News => SortMode::Sim,
            Profile::Joint | Profile::Ounce | Profile::Don => SortMode::Date,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: IpAddr,
    pub port: u16,
    pub profile: Profile,
    pub news_endpoint: String,
    pub market_endpoint: String,
    pub timeout: Duration,
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| format!("invalid value for {name}: {raw}")),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Config {
            bind: env_parse("DASHBOARD_BIND", IpAddr::from([127, 0, 0, 1]))?,
            port: env_parse("DASHBOARD_PORT", 3030)?,
            profile: env_str("DASHBOARD_PROFILE", "don").parse()?,
            news_endpoint: env_str("NEWS_ENDPOINT", DEFAULT_NEWS_ENDPOINT),
            market_endpoint: env_str("MARKET_ENDPOINT", DEFAULT_MARKET_ENDPOINT),
            timeout: Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS", 10)?),
        })
    }
}
