// src/news.rs
use crate::error::DashboardError;
use crate::models::{Credentials, NewsItem, SearchOutcome, SearchQuery};
use log::{error, info};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::future::Future;

const CLIENT_ID_HEADER: &str = "X-Naver-Client-Id";
const CLIENT_SECRET_HEADER: &str = "X-Naver-Client-Secret";

#[derive(Deserialize, Debug, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<RawItem>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "originallink")]
    pub original_link: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub pub_date: String,
}

/// Strip the bold highlight tags and decode the entities the API emits.
pub fn sanitize(text: &str) -> String {
    text.replace("<b>", "")
        .replace("</b>", "")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Keep the first 16 characters of `pubDate`, e.g. `Mon, 01 Jan 2024`.
pub fn truncate_date(pub_date: &str) -> String {
    pub_date.chars().take(16).collect()
}

impl From<RawItem> for NewsItem {
    fn from(raw: RawItem) -> Self {
        let link = if raw.original_link.trim().is_empty() {
            raw.link
        } else {
            raw.original_link
        };
        NewsItem {
            title: sanitize(&raw.title),
            link,
            summary: sanitize(&raw.description),
            published_at: truncate_date(&raw.pub_date),
        }
    }
}

pub trait NewsApi: Sync {
    fn search(
        &self,
        credentials: &Credentials,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<SearchOutcome, DashboardError>> + Send;
}

/// Validate inputs, then search. No network call happens on invalid input.
pub async fn search_news<A: NewsApi>(
    api: &A,
    credentials: &Credentials,
    query: &SearchQuery,
) -> Result<SearchOutcome, DashboardError> {
    if !credentials.is_complete() {
        return Err(DashboardError::MissingCredentials);
    }
    if query.keyword.trim().is_empty() {
        return Err(DashboardError::MissingKeyword);
    }
    api.search(credentials, query).await
}

/// Naver Open API news search.
#[derive(Clone)]
pub struct NaverNews {
    client: Client,
    endpoint: String,
}

impl NaverNews {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    async fn request(
        &self,
        credentials: &Credentials,
        query: &SearchQuery,
    ) -> Result<SearchOutcome, DashboardError> {
        let display = query.display.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .header(CLIENT_ID_HEADER, &credentials.id)
            .header(CLIENT_SECRET_HEADER, &credentials.secret)
            .query(&[
                ("query", query.keyword.as_str()),
                ("display", display.as_str()),
                ("sort", query.sort.as_param()),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: SearchResponse = response.json().await?;
                if body.items.is_empty() {
                    return Ok(SearchOutcome::NoResults);
                }
                Ok(SearchOutcome::Found(
                    body.items.into_iter().map(NewsItem::from).collect(),
                ))
            }
            StatusCode::UNAUTHORIZED => Err(DashboardError::AuthFailure),
            StatusCode::TOO_MANY_REQUESTS => Err(DashboardError::RateLimited),
            status => Err(DashboardError::Upstream(status.as_u16())),
        }
    }
}

impl NewsApi for NaverNews {
    async fn search(
        &self,
        credentials: &Credentials,
        query: &SearchQuery,
    ) -> Result<SearchOutcome, DashboardError> {
        match self.request(credentials, query).await {
            Ok(outcome) => {
                let count = match &outcome {
                    SearchOutcome::Found(items) => items.len(),
                    SearchOutcome::NoResults => 0,
                };
                info!("News search returned {} items.", count);
                Ok(outcome)
            }
            Err(e) => {
                error!("News search failed: {}", e);
                Err(e)
            }
        }
    }
}
