// src/api.rs
use crate::config::{MarketPlan, Profile};
use crate::error::DashboardError;
use crate::market::QuoteSource;
use crate::models::{Credentials, MarketSnapshot, SearchOutcome, SearchQuery};
use crate::news::{search_news, NewsApi};
use crate::render::{self, Page};
use crate::snapshot::build_snapshot;
use askama::Template;
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

/// Immutable per-process state shared by every request.
pub struct AppState<A, S> {
    pub profile: Profile,
    pub news: A,
    pub market: S,
}

#[derive(Deserialize, Default)]
pub struct SearchForm {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub keyword: String,
}

impl SearchForm {
    fn split(self, profile: Profile) -> (Credentials, SearchQuery) {
        let credentials = Credentials::new(self.client_id, self.client_secret);
        let query = SearchQuery {
            keyword: self.keyword.trim().to_string(),
            display: profile.display(),
            sort: profile.sort(),
        };
        (credentials, query)
    }
}

pub fn routes<A, S>(
    state: Arc<AppState<A, S>>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone
where
    A: NewsApi + Send + 'static,
    S: QuoteSource + Send + 'static,
{
    let page = warp::path::end()
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(page_handler::<A, S>);

    let search = warp::path::end()
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::body::form())
        .and_then(search_page_handler::<A, S>);

    let market = warp::path!("api" / "market")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(market_handler::<A, S>);

    let news = warp::path!("api" / "news")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::body::json())
        .and_then(news_handler::<A, S>);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| "ok");

    page.or(search)
        .or(market)
        .or(news)
        .or(health)
        .recover(handle_rejection)
}

fn with_state<A, S>(
    state: Arc<AppState<A, S>>,
) -> impl Filter<Extract = (Arc<AppState<A, S>>,), Error = Infallible> + Clone
where
    A: Send + Sync,
    S: Send + Sync,
{
    warp::any().map(move || state.clone())
}

async fn market_section<A, S: QuoteSource>(
    state: &AppState<A, S>,
) -> Option<(MarketPlan, Result<MarketSnapshot, DashboardError>)> {
    let plan = state.profile.market_plan()?;
    let snapshot = build_snapshot(&state.market, &plan).await;
    Some((plan, snapshot))
}

fn render_page(
    profile: Profile,
    market: &Option<(MarketPlan, Result<MarketSnapshot, DashboardError>)>,
    keyword: &str,
    search: Option<&Result<SearchOutcome, DashboardError>>,
) -> warp::reply::Response {
    let page = Page {
        title: profile.title(),
        market: market.as_ref().map(|(plan, snapshot)| (plan, snapshot)),
        keyword,
        search,
    };
    render_template(&render::dashboard(&page))
}

fn render_template<T: Template>(template: &T) -> warp::reply::Response {
    match template.render() {
        Ok(html) => warp::reply::html(html).into_response(),
        Err(e) => {
            error!("Template render error: {}", e);
            warp::reply::with_status(
                format!("Template error: {}", e),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response()
        }
    }
}

async fn page_handler<A, S>(state: Arc<AppState<A, S>>) -> Result<impl Reply, Rejection>
where
    A: NewsApi,
    S: QuoteSource,
{
    let market = market_section(&state).await;
    Ok(render_page(state.profile, &market, "", None))
}

async fn search_page_handler<A, S>(
    state: Arc<AppState<A, S>>,
    form: SearchForm,
) -> Result<impl Reply, Rejection>
where
    A: NewsApi,
    S: QuoteSource,
{
    let market = market_section(&state).await;
    let (credentials, query) = form.split(state.profile);
    info!("Search requested for '{}'.", query.keyword);
    let result = search_news(&state.news, &credentials, &query).await;
    Ok(render_page(
        state.profile,
        &market,
        &query.keyword,
        Some(&result),
    ))
}

async fn market_handler<A, S>(state: Arc<AppState<A, S>>) -> Result<impl Reply, Rejection>
where
    A: NewsApi,
    S: QuoteSource,
{
    let Some(plan) = state.profile.market_plan() else {
        return Err(warp::reject::not_found());
    };
    match build_snapshot(&state.market, &plan).await {
        Ok(snapshot) => Ok(warp::reply::json(&snapshot)),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

async fn news_handler<A, S>(
    state: Arc<AppState<A, S>>,
    form: SearchForm,
) -> Result<impl Reply, Rejection>
where
    A: NewsApi,
    S: QuoteSource,
{
    let (credentials, query) = form.split(state.profile);
    match search_news(&state.news, &credentials, &query).await {
        Ok(SearchOutcome::Found(items)) => Ok(warp::reply::json(&json!({ "items": items }))),
        Ok(SearchOutcome::NoResults) => Ok(warp::reply::json(&json!({ "items": [] }))),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = if let Some(e) = err.find::<DashboardError>() {
        (e.status(), json!({ "error": e.kind(), "message": e.to_string() }))
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, json!({ "error": "not_found" }))
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, json!({ "error": "bad_request", "message": e.to_string() }))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, json!({ "error": "method_not_allowed" }))
    } else {
        error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "internal_error" }))
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::tests::{obs, FakeSource};
    use crate::models::NewsItem;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeNews {
        calls: AtomicUsize,
    }

    impl NewsApi for FakeNews {
        async fn search(
            &self,
            credentials: &Credentials,
            query: &SearchQuery,
        ) -> Result<SearchOutcome, DashboardError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if credentials.id != "id" {
                return Err(DashboardError::AuthFailure);
            }
            match query.keyword.as_str() {
                "nothing" => Ok(SearchOutcome::NoResults),
                "busy" => Err(DashboardError::RateLimited),
                keyword => Ok(SearchOutcome::Found(vec![NewsItem {
                    title: format!("{keyword} headline"),
                    link: "https://press.example/1".into(),
                    summary: format!("display={} sort={}", query.display, query.sort.as_param()),
                    published_at: "Mon, 01 Jan 2024".into(),
                }])),
            }
        }
    }

    fn full_market() -> FakeSource {
        FakeSource::default()
            .with("KRW=X", "1d", vec![obs(0, 1300.0, 1310.0)])
            .with("GC=F", "1d", vec![obs(0, 2000.0, 2020.0)])
            .with("SI=F", "1d", vec![obs(0, 25.0, 24.5)])
    }

    fn state(profile: Profile, market: FakeSource) -> Arc<AppState<FakeNews, FakeSource>> {
        Arc::new(AppState {
            profile,
            news: FakeNews::default(),
            market,
        })
    }

    fn body_json(body: &[u8]) -> serde_json::Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn dashboard_renders_market_and_form() {
        let api = routes(state(Profile::Don, full_market()));
        let res = warp::test::request().method("GET").path("/").reply(&api).await;
        assert_eq!(res.status(), StatusCode::OK);
        let html = String::from_utf8(res.body().to_vec()).unwrap();
        assert!(html.contains("class=\"metric\""));
        assert!(html.contains("Gold (1 don, 3.75g)"));
        assert!(html.contains("name=\"keyword\""));
    }

    #[tokio::test]
    async fn ounce_dashboard_labels_metals_per_ounce() {
        let api = routes(state(Profile::Ounce, full_market()));
        let res = warp::test::request().method("GET").path("/").reply(&api).await;
        let html = String::from_utf8(res.body().to_vec()).unwrap();
        assert!(html.contains("Gold (1 oz)"));
        assert!(html.contains("Silver (1 oz)"));
        assert!(!html.contains("3.75g"));
    }

    struct Unprintable;

    impl fmt::Display for Unprintable {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[derive(Template)]
    #[template(source = "<p>{{ value }}</p>", ext = "html")]
    struct BrokenPage {
        value: Unprintable,
    }

    #[test]
    fn render_failure_is_internal_error() {
        let res = render_template(&BrokenPage { value: Unprintable });
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn dashboard_shows_unavailable_market() {
        let api = routes(state(Profile::Don, FakeSource::default()));
        let res = warp::test::request().method("GET").path("/").reply(&api).await;
        assert_eq!(res.status(), StatusCode::OK);
        let html = String::from_utf8(res.body().to_vec()).unwrap();
        assert!(html.contains("Market data is currently unavailable."));
        assert!(!html.contains("class=\"metric\""));
    }

    #[tokio::test]
    async fn form_search_renders_results() {
        let st = state(Profile::Don, full_market());
        let api = routes(st.clone());
        let res = warp::test::request()
            .method("POST")
            .path("/")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("client_id=id&client_secret=secret&keyword=gold")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let html = String::from_utf8(res.body().to_vec()).unwrap();
        assert!(html.contains("gold headline"));
        assert!(html.contains("display=5 sort=date"));
        assert_eq!(st.news.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn form_without_credentials_never_searches() {
        let st = state(Profile::News, FakeSource::default());
        let api = routes(st.clone());
        let res = warp::test::request()
            .method("POST")
            .path("/")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("client_id=&client_secret=&keyword=gold")
            .reply(&api)
            .await;
        let html = String::from_utf8(res.body().to_vec()).unwrap();
        assert!(html.contains("notice error"));
        assert!(html.contains("Client ID and Client Secret are required"));
        assert!(!html.contains("Please enter a search keyword."));
        assert_eq!(st.news.calls.load(Ordering::SeqCst), 0);
        // news profile renders no market panel
        assert!(!html.contains("class=\"market\""));
    }

    #[tokio::test]
    async fn market_api_returns_snapshot_json() {
        let api = routes(state(Profile::Joint, full_market()));
        let res = warp::test::request()
            .method("GET")
            .path("/api/market")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res.body());
        assert_eq!(body["fx"]["current_price"], 1310.0);
        assert_eq!(body["metals"][0]["unit"], "oz");
        assert_eq!(body["metals"][1]["symbol"], "SI=F");
    }

    #[tokio::test]
    async fn market_api_unavailable_is_503() {
        let api = routes(state(Profile::Don, full_market().failing("GC=F")));
        let res = warp::test::request()
            .method("GET")
            .path("/api/market")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(res.body())["error"], "market_data_unavailable");
    }

    #[tokio::test]
    async fn market_api_absent_for_news_profile() {
        let api = routes(state(Profile::News, full_market()));
        let res = warp::test::request()
            .method("GET")
            .path("/api/market")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn news_api_maps_errors_to_status() {
        let api = routes(state(Profile::News, FakeSource::default()));
        let cases = [
            (json!({"client_id": "id", "client_secret": "s", "keyword": "gold"}), StatusCode::OK),
            (json!({"client_id": "id", "client_secret": "s", "keyword": "nothing"}), StatusCode::OK),
            (json!({"client_id": "", "client_secret": "s", "keyword": "gold"}), StatusCode::BAD_REQUEST),
            (json!({"client_id": "id", "client_secret": "s", "keyword": ""}), StatusCode::BAD_REQUEST),
            (json!({"client_id": "x", "client_secret": "s", "keyword": "gold"}), StatusCode::UNAUTHORIZED),
            (json!({"client_id": "id", "client_secret": "s", "keyword": "busy"}), StatusCode::TOO_MANY_REQUESTS),
        ];
        for (body, status) in cases {
            let res = warp::test::request()
                .method("POST")
                .path("/api/news")
                .json(&body)
                .reply(&api)
                .await;
            assert_eq!(res.status(), status, "{body}");
        }
    }

    #[tokio::test]
    async fn news_api_lists_items() {
        let api = routes(state(Profile::News, FakeSource::default()));
        let res = warp::test::request()
            .method("POST")
            .path("/api/news")
            .json(&json!({"client_id": "id", "client_secret": "s", "keyword": "gold"}))
            .reply(&api)
            .await;
        let body = body_json(res.body());
        assert_eq!(body["items"][0]["title"], "gold headline");
        assert_eq!(body["items"][0]["summary"], "display=10 sort=sim");

        let res = warp::test::request()
            .method("POST")
            .path("/api/news")
            .json(&json!({"client_id": "id", "client_secret": "s", "keyword": "nothing"}))
            .reply(&api)
            .await;
        assert_eq!(body_json(res.body())["items"], json!([]));
    }

    #[tokio::test]
    async fn health_is_ok() {
        let api = routes(state(Profile::News, FakeSource::default()));
        let res = warp::test::request().path("/health").reply(&api).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"ok");
    }
}
