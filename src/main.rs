// src/main.rs
mod api;
mod config;
mod error;
mod market;
mod models;
mod news;
mod render;
mod snapshot;
mod units;

use crate::api::AppState;
use crate::config::Config;
use crate::market::YahooChart;
use crate::news::NaverNews;
use env_logger::{Builder, Env};
use log::{error, info};
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;

const USER_AGENT: &str = concat!("market_brief/", env!("CARGO_PKG_VERSION"));

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    let client = match Client::builder()
        .timeout(config.timeout)
        .user_agent(USER_AGENT)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };

    let state = Arc::new(AppState {
        profile: config.profile,
        news: NaverNews::new(client.clone(), config.news_endpoint.clone()),
        market: YahooChart::new(client, config.market_endpoint.clone()),
    });

    let api = api::routes(state);

    let addr = SocketAddr::new(config.bind, config.port);
    info!(
        "Starting the market dashboard ({:?} profile) on http://{}",
        config.profile, addr
    );
    match warp::serve(api).try_bind_ephemeral(addr) {
        Ok((bound, server)) => {
            info!("Server running on http://{}", bound);
            server.await;
        }
        Err(e) => error!("Failed to bind {}: {}", addr, e),
    }
}
