//! Nasdaq stock screener adapter.
//!
//! # Endpoint
//! `GET https://api.nasdaq.com/api/screener/stocks?letter=0&exchange=<code>&download=true`
//!
//! `letter=0` asks for every symbol and `download=true` for the unpaginated
//! table. The endpoint expects browser-like headers and answers with:
//!
//! ```json
//! { "data": { "headers": { "symbol": "Symbol", ... }, "rows": [ { "symbol": "A", ... } ] } }
//! ```
//!
//! No retries happen here. Requests are bounded by the client timeouts;
//! dropping the returned future cancels the request.

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};

use ticker_common::config::{ScreenerConfig, DEFAULT_SCREENER_URL, DEFAULT_USER_AGENT};

use super::provider::{is_common_stock_symbol, FetchError, ScreenerSource};
use super::{Exchange, RawTickerRow};

// ============================================================================
// Constants
// ============================================================================

const SCREENER_AUTHORITY: &str = "api.nasdaq.com";
const SCREENER_ORIGIN: &str = "https://www.nasdaq.com";
const SCREENER_REFERER: &str = "https://www.nasdaq.com/";

/// Longest error body kept in a `FetchError::Status`.
const MAX_ERROR_BODY_CHARS: usize = 200;

// ============================================================================
// Nasdaq Screener
// ============================================================================

/// HTTP client for the public Nasdaq screener.
pub struct NasdaqScreener {
    /// Endpoint URL
    base_url: String,
    /// HTTP client carrying the browser header set and timeouts
    client: reqwest::Client,
}

impl NasdaqScreener {
    /// Create a screener client for the public endpoint with default timeouts.
    pub fn new() -> Self {
        Self::from_config(&ScreenerConfig::default())
    }

    /// Create from the screener section of the config.
    pub fn from_config(config: &ScreenerConfig) -> Self {
        Self::with_settings(
            &config.base_url,
            &config.user_agent,
            config.request_timeout(),
            config.connect_timeout(),
        )
    }

    /// Create with an explicit endpoint, user agent and timeouts.
    pub fn with_settings(
        base_url: impl Into<String>,
        user_agent: &str,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .default_headers(browser_headers(user_agent))
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Endpoint this client queries.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_table(&self, exchange: Exchange) -> Result<ScreenerTable, FetchError> {
        debug!(url = %self.base_url, exchange = %exchange, "Fetching screener table");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("letter", "0"),
                ("exchange", exchange.code()),
                ("download", "true"),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let payload: ScreenerResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Decode(e.to_string())
            }
        })?;

        Ok(payload.data.unwrap_or_default())
    }
}

impl Default for NasdaqScreener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScreenerSource for NasdaqScreener {
    fn name(&self) -> &'static str {
        if self.base_url == DEFAULT_SCREENER_URL {
            "nasdaq-screener"
        } else {
            "screener"
        }
    }

    async fn fetch_exchange(&self, exchange: Exchange) -> Result<Vec<RawTickerRow>, FetchError> {
        let table = self.fetch_table(exchange).await?;
        let rows = parse_table(table, exchange)?;

        info!(exchange = %exchange, rows = rows.len(), "Fetched screener rows");
        Ok(rows)
    }
}

fn browser_headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
    );
    headers.insert(
        HeaderName::from_static("authority"),
        HeaderValue::from_static(SCREENER_AUTHORITY),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(ORIGIN, HeaderValue::from_static(SCREENER_ORIGIN));
    headers.insert(REFERER, HeaderValue::from_static(SCREENER_REFERER));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers
}

fn map_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() {
        FetchError::Network(format!("Connection failed: {}", e))
    } else {
        FetchError::Network(e.to_string())
    }
}

// ============================================================================
// Table Parsing
// ============================================================================

/// Turn a screener table into raw rows for `exchange`.
///
/// Rows without a symbol, and symbols containing `.` or `^`, are dropped.
fn parse_table(table: ScreenerTable, exchange: Exchange) -> Result<Vec<RawTickerRow>, FetchError> {
    let columns = header_columns(table.headers.as_ref())?;
    if let Some(columns) = &columns {
        if !columns.iter().any(|c| c == "symbol") {
            return Err(FetchError::Decode("table has no symbol column".into()));
        }
    }

    let rows = table.rows.unwrap_or_default();
    let total = rows.len();

    let parsed: Vec<RawTickerRow> = rows
        .iter()
        .filter_map(|cells| raw_row(cells, exchange))
        .filter(|row| is_common_stock_symbol(&row.symbol))
        .collect();

    debug!(
        exchange = %exchange,
        total,
        kept = parsed.len(),
        "Parsed screener table"
    );

    Ok(parsed)
}

/// Column names from `data.headers`: object keys or an array of names.
fn header_columns(headers: Option<&Value>) -> Result<Option<Vec<String>>, FetchError> {
    match headers {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map.keys().cloned().collect())),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| FetchError::Decode(format!("non-text column name: {}", v)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(FetchError::Decode(format!("unexpected headers: {}", other))),
    }
}

fn raw_row(cells: &Map<String, Value>, exchange: Exchange) -> Option<RawTickerRow> {
    let symbol = cell_text(cells, "symbol")?.trim().to_string();
    if symbol.is_empty() {
        return None;
    }

    let text = |key: &str| cell_text(cells, key).unwrap_or_default();

    Some(RawTickerRow {
        symbol,
        name: text("name"),
        exchange,
        market_cap: cell_text(cells, "marketCap"),
        sector: text("sector"),
        industry: text("industry"),
        last_sale: text("lastsale"),
        volume: cell_text(cells, "volume"),
        ipo_year: text("ipoyear"),
        country: text("country"),
        url: text("url"),
    })
}

fn cell_text(cells: &Map<String, Value>, key: &str) -> Option<String> {
    match cells.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ScreenerResponse {
    #[serde(default)]
    data: Option<ScreenerTable>,
}

#[derive(Debug, Default, Deserialize)]
struct ScreenerTable {
    #[serde(default)]
    headers: Option<Value>,
    #[serde(default)]
    rows: Option<Vec<Map<String, Value>>>,
}

// ============================================================================
// Tests
// ============================================================================
