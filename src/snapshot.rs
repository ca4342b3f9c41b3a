// src/snapshot.rs
use crate::config::{DeltaBasis, FetchMode, MarketPlan, MetalSpec};
use crate::error::DashboardError;
use crate::market::{derive_quote, fetch_quote, QuoteSource, Window};
use crate::models::{MarketSnapshot, MetalFigure, Quote};
use crate::units::{convert_price, to_local};
use log::{info, warn};

/// Build the market panel, or report it unavailable as a whole.
pub async fn build_snapshot<S: QuoteSource>(
    source: &S,
    plan: &MarketPlan,
) -> Result<MarketSnapshot, DashboardError> {
    let quotes = match plan.mode {
        FetchMode::PerTicker => fetch_each(source, plan).await,
        FetchMode::Joint => fetch_joint(source, plan).await,
    };

    let Some((fx, metal_quotes)) = quotes else {
        warn!("Market snapshot unavailable.");
        return Err(DashboardError::MarketDataUnavailable);
    };

    let metals = plan
        .metals
        .iter()
        .zip(metal_quotes.iter())
        .map(|(spec, quote)| convert_metal(plan, spec, quote, &fx))
        .collect();

    info!("Market snapshot built: {} at {}", fx.symbol, fx.current_price);
    Ok(MarketSnapshot { fx, metals })
}

async fn fetch_each<S: QuoteSource>(
    source: &S,
    plan: &MarketPlan,
) -> Option<(Quote, Vec<Quote>)> {
    let fx = fetch_quote(source, plan.fx_symbol).await;
    let mut metals = Vec::with_capacity(plan.metals.len());
    for spec in &plan.metals {
        metals.push(fetch_quote(source, spec.symbol).await);
    }
    Some((fx?, metals.into_iter().collect::<Option<Vec<_>>>()?))
}

async fn fetch_joint<S: QuoteSource>(
    source: &S,
    plan: &MarketPlan,
) -> Option<(Quote, Vec<Quote>)> {
    let tickers = plan.tickers();
    let frame = match source.fetch_joint(&tickers, Window::INTRADAY).await {
        Ok(frame) if !frame.is_empty() => frame,
        Ok(_) => {
            warn!("Joint fetch returned no data.");
            return None;
        }
        Err(e) => {
            warn!("Joint fetch failed: {}", e);
            return None;
        }
    };

    let quote = |symbol: &str| {
        let found = frame.series(symbol).and_then(|rows| derive_quote(symbol, rows));
        if found.is_none() {
            warn!("[{symbol}] missing from joint frame");
        }
        found
    };

    let fx = quote(plan.fx_symbol)?;
    let metals = plan
        .metals
        .iter()
        .map(|spec| quote(spec.symbol))
        .collect::<Option<Vec<_>>>()?;
    Some((fx, metals))
}

fn convert_metal(
    plan: &MarketPlan,
    spec: &MetalSpec,
    quote: &Quote,
    fx: &Quote,
) -> MetalFigure {
    let per_unit = |price: f64| convert_price(price, spec.source_unit, plan.target_unit);
    let local_price = to_local(per_unit(quote.current_price), fx.current_price);
    let local_delta = match plan.delta_basis {
        DeltaBasis::CurrentRate => to_local(per_unit(quote.delta), fx.current_price),
        DeltaBasis::OpeningRate => {
            local_price - to_local(per_unit(quote.reference_price), fx.reference_price)
        }
    };

    MetalFigure {
        label: spec.label.to_string(),
        symbol: spec.symbol.to_string(),
        unit: plan.target_unit.name.to_string(),
        local_price,
        local_delta,
        source_price: quote.current_price,
    }
}
