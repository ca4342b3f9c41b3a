// src/render.rs
//! View models for the dashboard templates. No I/O happens here; markup and
//! escaping live in `templates/`.
use crate::config::MarketPlan;
use crate::error::{DashboardError, Severity};
use crate::models::{MarketSnapshot, NewsItem, SearchOutcome};
use crate::units::DON;
use askama::Template;

/// Everything one page render needs.
pub struct Page<'a> {
    pub title: &'a str,
    /// Absent for profiles without a market panel.
    pub market: Option<(&'a MarketPlan, &'a Result<MarketSnapshot, DashboardError>)>,
    pub keyword: &'a str,
    /// Absent until the user presses search.
    pub search: Option<&'a Result<SearchOutcome, DashboardError>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub label: String,
    pub value: String,
    pub delta: String,
    pub rising: bool,
    pub caption: Option<String>,
}

impl Metric {
    /// CSS class for the delta colour.
    pub fn direction(&self) -> &'static str {
        if self.rising {
            "up"
        } else {
            "down"
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub class: &'static str,
    pub text: String,
}

impl Notice {
    fn new(class: &'static str, text: impl Into<String>) -> Self {
        Notice {
            class,
            text: text.into(),
        }
    }
}

impl From<&DashboardError> for Notice {
    fn from(err: &DashboardError) -> Self {
        let class = match err.severity() {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        Notice::new(class, err.to_string())
    }
}

pub struct MarketPanel {
    /// Empty when the snapshot is unavailable.
    pub metrics: Vec<Metric>,
    pub notice: Notice,
}

pub struct ResultsPanel<'a> {
    pub notice: Notice,
    pub items: &'a [NewsItem],
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate<'a> {
    pub title: &'a str,
    pub market: Option<MarketPanel>,
    pub keyword: &'a str,
    pub results: Option<ResultsPanel<'a>>,
}

/// Fixed-point formatting, optionally with comma thousands separators.
pub fn format_number(value: f64, decimals: usize, grouped: bool) -> String {
    let raw = format!("{:.*}", decimals, value);
    if !grouped {
        return raw;
    }
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped_int = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped_int.push(',');
        }
        grouped_int.push(c);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped_int}.{f}"),
        None => format!("{sign}{grouped_int}"),
    }
}

fn metal_label(plan: &MarketPlan, metal: &str) -> String {
    let unit = plan.target_unit;
    if unit == DON {
        format!(
            "{metal} (1 {}, {}g)",
            unit.name,
            format_number(unit.grams, 2, false)
        )
    } else {
        format!("{metal} (1 {})", unit.name)
    }
}

pub fn metrics(plan: &MarketPlan, snapshot: &MarketSnapshot) -> Vec<Metric> {
    let currency = plan.currency;
    let mut out = vec![Metric {
        label: plan.fx_label.to_string(),
        value: format!("{} {currency}", format_number(snapshot.fx.current_price, 2, true)),
        delta: format!("{} {currency}", format_number(snapshot.fx.delta, 2, false)),
        rising: snapshot.fx.delta >= 0.0,
        caption: None,
    }];

    for metal in &snapshot.metals {
        out.push(Metric {
            label: metal_label(plan, &metal.label),
            value: format!("{} {currency}", format_number(metal.local_price, 0, true)),
            delta: format!("{} {currency}", format_number(metal.local_delta, 0, false)),
            rising: metal.local_delta >= 0.0,
            caption: Some(format!(
                "International: ${}/oz",
                format_number(metal.source_price, 2, false)
            )),
        });
    }
    out
}

pub fn market_panel(
    plan: &MarketPlan,
    market: &Result<MarketSnapshot, DashboardError>,
) -> MarketPanel {
    match market {
        Ok(snapshot) => MarketPanel {
            metrics: metrics(plan, snapshot),
            notice: Notice::new(
                "info",
                "Prices are international futures quotes converted at the live exchange rate; \
                 retail prices including VAT and fees are higher.",
            ),
        },
        Err(err) => MarketPanel {
            metrics: Vec::new(),
            notice: err.into(),
        },
    }
}

fn found_banner(count: usize) -> String {
    if count == 1 {
        "Found 1 article.".to_string()
    } else {
        format!("Found {count} articles.")
    }
}

pub fn search_results(result: &Result<SearchOutcome, DashboardError>) -> ResultsPanel<'_> {
    match result {
        Ok(SearchOutcome::Found(items)) => ResultsPanel {
            notice: Notice::new("success", found_banner(items.len())),
            items,
        },
        Ok(SearchOutcome::NoResults) => ResultsPanel {
            notice: Notice::new("info", "No results found."),
            items: &[],
        },
        Err(err) => ResultsPanel {
            notice: err.into(),
            items: &[],
        },
    }
}

pub fn dashboard<'a>(page: &Page<'a>) -> DashboardTemplate<'a> {
    DashboardTemplate {
        title: page.title,
        market: page.market.map(|(plan, market)| market_panel(plan, market)),
        keyword: page.keyword,
        results: page.search.map(search_results),
    }
}
