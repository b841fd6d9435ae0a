//! Dataset assembly.
//!
//! Fetches the selected exchanges one after another, merges their rows and
//! sorts the result by symbol. A failed exchange is logged and recorded; the
//! assembly only fails when nothing was selected or every fetch failed.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use ticker_common::config::{ExchangeToggles, ScreenerConfig};

use super::nasdaq::NasdaqScreener;
use super::provider::{is_common_stock_symbol, FetchError, ScreenerSource};
use super::{Exchange, RawTickerRow};
use crate::error::{CatalogError, Result};

// ============================================================================
// Exchange Selection
// ============================================================================

/// Which exchanges to download. All three by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeSelection {
    pub nyse: bool,
    pub nasdaq: bool,
    pub amex: bool,
}

impl Default for ExchangeSelection {
    fn default() -> Self {
        Self {
            nyse: true,
            nasdaq: true,
            amex: true,
        }
    }
}

impl From<ExchangeToggles> for ExchangeSelection {
    fn from(toggles: ExchangeToggles) -> Self {
        Self {
            nyse: toggles.nyse,
            nasdaq: toggles.nasdaq,
            amex: toggles.amex,
        }
    }
}

impl ExchangeSelection {
    /// Select exactly the given exchanges.
    pub fn only(exchanges: &[Exchange]) -> Self {
        Self {
            nyse: exchanges.contains(&Exchange::Nyse),
            nasdaq: exchanges.contains(&Exchange::Nasdaq),
            amex: exchanges.contains(&Exchange::Amex),
        }
    }

    /// Selected exchanges in fetch order.
    pub fn selected(&self) -> Vec<Exchange> {
        Exchange::ALL
            .into_iter()
            .filter(|exchange| self.contains(*exchange))
            .collect()
    }

    pub fn contains(&self, exchange: Exchange) -> bool {
        match exchange {
            Exchange::Nyse => self.nyse,
            Exchange::Nasdaq => self.nasdaq,
            Exchange::Amex => self.amex,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.nyse || self.nasdaq || self.amex)
    }
}

// ============================================================================
// Assembly Result
// ============================================================================

/// A selected exchange whose download failed.
#[derive(Debug, Clone)]
pub struct ExchangeFailure {
    pub exchange: Exchange,
    pub error: FetchError,
}

/// What happened during one assembly.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    /// Rows received per successfully fetched exchange
    pub fetched: Vec<(Exchange, usize)>,
    /// Exchanges that failed
    pub failures: Vec<ExchangeFailure>,
    /// Duplicate symbols dropped across exchanges
    pub duplicates: usize,
    pub assembled_at: DateTime<Utc>,
}

impl AssemblyReport {
    /// True if at least one selected exchange failed.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Total rows received before deduplication.
    pub fn total_fetched(&self) -> usize {
        self.fetched.iter().map(|(_, count)| count).sum()
    }
}

/// The assembled snapshot plus its report.
#[derive(Debug, Clone)]
pub struct Assembly {
    /// Rows sorted by symbol ascending
    pub rows: Vec<RawTickerRow>,
    pub report: AssemblyReport,
}

impl Assembly {
    pub fn failures(&self) -> &[ExchangeFailure] {
        &self.report.failures
    }

    pub fn is_partial(&self) -> bool {
        self.report.is_partial()
    }
}

// ============================================================================
// Dataset Assembler
// ============================================================================

/// Merges per-exchange row sets into one snapshot.
pub struct DatasetAssembler {
    source: Arc<dyn ScreenerSource>,
}

impl DatasetAssembler {
    pub fn new(source: Arc<dyn ScreenerSource>) -> Self {
        Self { source }
    }

    /// Create an assembler backed by the HTTP screener.
    pub fn from_config(config: &ScreenerConfig) -> Self {
        Self::new(Arc::new(NasdaqScreener::from_config(config)))
    }

    /// Name of the underlying source.
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Fetch one exchange.
    pub async fn fetch_exchange(&self, exchange: Exchange) -> Result<Vec<RawTickerRow>> {
        self.source
            .fetch_exchange(exchange)
            .await
            .map_err(|source| CatalogError::RemoteFetch { exchange, source })
    }

    /// Fetch every selected exchange sequentially and merge the rows.
    pub async fn assemble(&self, selection: ExchangeSelection) -> Result<Assembly> {
        let exchanges = selection.selected();
        if exchanges.is_empty() {
            return Err(CatalogError::Assembly("no exchange selected".into()));
        }

        let mut fetched = Vec::with_capacity(exchanges.len());
        let mut failures = Vec::new();
        let mut merged = Vec::new();

        for exchange in exchanges {
            match self.fetch_exchange(exchange).await {
                Ok(rows) => {
                    fetched.push((exchange, rows.len()));
                    merged.extend(rows.into_iter().map(|mut row| {
                        row.exchange = exchange;
                        row
                    }));
                }
                Err(CatalogError::RemoteFetch { exchange, source }) => {
                    warn!(
                        source_name = self.source.name(),
                        exchange = %exchange,
                        error = %source,
                        "Exchange fetch failed, continuing without it"
                    );
                    failures.push(ExchangeFailure {
                        exchange,
                        error: source,
                    });
                }
                Err(other) => return Err(other),
            }
        }

        if fetched.is_empty() {
            let detail = failures
                .iter()
                .map(|f| format!("{}: {}", f.exchange, f.error))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CatalogError::Assembly(format!(
                "every exchange fetch failed ({})",
                detail
            )));
        }

        let (rows, duplicates) = merge_rows(merged);

        let report = AssemblyReport {
            fetched,
            failures,
            duplicates,
            assembled_at: Utc::now(),
        };

        info!(
            rows = rows.len(),
            exchanges = report.fetched.len(),
            failed = report.failures.len(),
            duplicates,
            "Assembled listing snapshot"
        );

        Ok(Assembly { rows, report })
    }
}

/// Drop share-class symbols and cross-listed duplicates, then sort.
///
/// The first occurrence in fetch order wins.
fn merge_rows(rows: Vec<RawTickerRow>) -> (Vec<RawTickerRow>, usize) {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut duplicates = 0;
    let mut kept = Vec::with_capacity(rows.len());

    for row in rows {
        if !is_common_stock_symbol(&row.symbol) {
            continue;
        }
        if !seen.insert(row.symbol.clone()) {
            warn!(symbol = %row.symbol, exchange = %row.exchange, "Dropping duplicate symbol");
            duplicates += 1;
            continue;
        }
        kept.push(row);
    }

    kept.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    (kept, duplicates)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StaticSource {
        tables: HashMap<Exchange, std::result::Result<Vec<&'static str>, FetchError>>,
        calls: AtomicU32,
    }

    impl StaticSource {
        fn new() -> Self {
            Self {
                tables: HashMap::new(),
                calls: AtomicU32::new(0),
            }
        }

        fn with(mut self, exchange: Exchange, symbols: Vec<&'static str>) -> Self {
            self.tables.insert(exchange, Ok(symbols));
            self
        }

        fn failing(mut self, exchange: Exchange, error: FetchError) -> Self {
            self.tables.insert(exchange, Err(error));
            self
        }
    }

    #[async_trait]
    impl ScreenerSource for StaticSource {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn fetch_exchange(
            &self,
            exchange: Exchange,
        ) -> std::result::Result<Vec<RawTickerRow>, FetchError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            match self.tables.get(&exchange) {
                Some(Ok(symbols)) => Ok(symbols
                    .iter()
                    .map(|s| RawTickerRow::new(*s, format!("{} Corp", s), exchange))
                    .collect()),
                Some(Err(e)) => Err(e.clone()),
                None => Ok(Vec::new()),
            }
        }
    }

    #[test]
    fn test_selection() {
        assert_eq!(ExchangeSelection::default().selected(), Exchange::ALL.to_vec());
        let only = ExchangeSelection::only(&[Exchange::Amex, Exchange::Nyse]);
        assert_eq!(only.selected(), vec![Exchange::Nyse, Exchange::Amex]);
        assert!(ExchangeSelection::only(&[]).is_empty());

        let toggles = ExchangeToggles {
            nyse: false,
            nasdaq: true,
            amex: false,
        };
        assert_eq!(
            ExchangeSelection::from(toggles).selected(),
            vec![Exchange::Nasdaq]
        );
    }

    #[tokio::test]
    async fn test_assemble_sorts_and_tags_exchange() {
        let source = StaticSource::new()
            .with(Exchange::Nyse, vec!["ZZZ", "AAA"])
            .with(Exchange::Nasdaq, vec!["MMM"]);
        let assembler = DatasetAssembler::new(Arc::new(source));

        let assembly = assembler.assemble(ExchangeSelection::default()).await.unwrap();
        let symbols: Vec<_> = assembly.rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA", "MMM", "ZZZ"]);
        assert_eq!(assembly.rows[1].exchange, Exchange::Nasdaq);
        assert!(!assembly.is_partial());
        assert_eq!(assembly.report.total_fetched(), 3);
    }

    #[tokio::test]
    async fn test_assemble_drops_duplicates_and_share_classes() {
        let source = StaticSource::new()
            .with(Exchange::Nyse, vec!["DUP", "BRK.A"])
            .with(Exchange::Nasdaq, vec!["DUP", "ONE"]);
        let assembler = DatasetAssembler::new(Arc::new(source));

        let assembly = assembler.assemble(ExchangeSelection::default()).await.unwrap();
        assert_eq!(assembly.rows.len(), 2);
        let dup = assembly.rows.iter().find(|r| r.symbol == "DUP").unwrap();
        assert_eq!(dup.exchange, Exchange::Nyse);
        assert_eq!(assembly.report.duplicates, 1);
    }

    #[tokio::test]
    async fn test_partial_failure_is_recorded() {
        let source = StaticSource::new()
            .with(Exchange::Nyse, vec!["AAA"])
            .failing(Exchange::Nasdaq, FetchError::Timeout);
        let assembler = DatasetAssembler::new(Arc::new(source));

        let assembly = assembler.assemble(ExchangeSelection::default()).await.unwrap();
        assert!(assembly.is_partial());
        assert_eq!(assembly.failures().len(), 1);
        assert_eq!(assembly.failures()[0].exchange, Exchange::Nasdaq);
    }

    #[tokio::test]
    async fn test_all_failures_is_assembly_error() {
        let source = StaticSource::new()
            .failing(Exchange::Nyse, FetchError::Network("reset".into()))
            .failing(Exchange::Amex, FetchError::Timeout);
        let assembler = DatasetAssembler::new(Arc::new(source));

        let err = assembler
            .assemble(ExchangeSelection::only(&[Exchange::Nyse, Exchange::Amex]))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Assembly(_)));
    }

    #[tokio::test]
    async fn test_empty_selection_skips_fetching() {
        let source = Arc::new(StaticSource::new());
        let assembler = DatasetAssembler::new(source.clone());

        let err = assembler.assemble(ExchangeSelection::only(&[])).await.unwrap_err();
        assert!(matches!(err, CatalogError::Assembly(_)));
        assert_eq!(source.calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_fetch_exchange_wraps_error() {
        let source = StaticSource::new().failing(
            Exchange::Amex,
            FetchError::Status {
                status: 500,
                body: String::new(),
            },
        );
        let assembler = DatasetAssembler::new(Arc::new(source));

        match assembler.fetch_exchange(Exchange::Amex).await {
            Err(CatalogError::RemoteFetch { exchange, source }) => {
                assert_eq!(exchange, Exchange::Amex);
                assert_eq!(source.status(), Some(500));
            }
            other => panic!("expected RemoteFetch, got {:?}", other),
        }
    }
}
