// src/error.rs
use thiserror::Error;
use warp::http::StatusCode;
use warp::reject::Reject;

/// Everything that can go wrong while serving one user action.
///
/// Every variant is recovered where it is detected and rendered as a notice;
/// none of them is fatal to the server.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    #[error("API Client ID and Client Secret are required. Enter both in the sidebar first.")]
    MissingCredentials,

    #[error("Please enter a search keyword.")]
    MissingKeyword,

    #[error("Authentication failed: check the Client ID and Client Secret.")]
    AuthFailure,

    #[error("Request limit exceeded: please try again in a moment.")]
    RateLimited,

    #[error("News API returned an error: HTTP {0}")]
    Upstream(u16),

    #[error("System error: {0}")]
    Transport(String),

    #[error("Market data is currently unavailable.")]
    MarketDataUnavailable,
}

/// How loudly a notice is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl DashboardError {
    /// Stable machine-readable name used by the JSON API.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::MissingKeyword => "missing_keyword",
            Self::AuthFailure => "auth_failure",
            Self::RateLimited => "rate_limited",
            Self::Upstream(_) => "upstream_error",
            Self::Transport(_) => "transport_error",
            Self::MarketDataUnavailable => "market_data_unavailable",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::MissingKeyword | Self::MarketDataUnavailable => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredentials | Self::MissingKeyword => StatusCode::BAD_REQUEST,
            Self::AuthFailure => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) | Self::Transport(_) => StatusCode::BAD_GATEWAY,
            Self::MarketDataUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(e: reqwest::Error) -> Self {
        DashboardError::Transport(e.to_string())
    }
}

impl Reject for DashboardError {}
