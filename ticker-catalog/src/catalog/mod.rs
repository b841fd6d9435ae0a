//! Filterable ticker catalog.
//!
//! A [`TickerCatalog`] owns the clean baseline (the cleaned snapshot, fixed
//! for the catalog's lifetime) and a working view over it. Filters reset the
//! working view to the baseline before they apply; ranking narrows whatever
//! the working view currently holds.
//!
//! ```text
//! Baseline ──apply_filters──▶ Filtered ──apply_filters──▶ Filtered
//!    ▲                           │  ▲                        (from baseline)
//!    └──reset_working_view───────┘  └─top_by_capitalization / refine_filters
//! ```

pub mod cleaner;
pub mod export;
pub mod filter;
pub mod scale;

pub use cleaner::{CleaningReport, DatasetCleaner, ExclusionRule, RuleOutcome};
pub use export::{ExportFormat, TickerExporter};
pub use filter::{CompiledFilter, FilterCriteria, Selection};
pub use scale::{generate_buckets, BucketScale, BUCKET_COUNT};

use tracing::{debug, info};

use crate::data::{round_to, AssemblyReport, DatasetAssembler, ExchangeSelection, RawTickerRow, TickerRow};
use crate::error::{CatalogError, Result};

/// Whether the working view still equals the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Baseline,
    Filtered,
}

/// The clean baseline plus a working view over it.
#[derive(Debug, Clone)]
pub struct TickerCatalog {
    baseline: Vec<TickerRow>,
    /// Market cap in millions, parallel to `baseline`
    cap_millions: Vec<f64>,
    /// Indices into `baseline`, in view order
    working: Vec<usize>,
    state: ViewState,
    max_market_cap: f64,
    scale: BucketScale,
    cleaning: CleaningReport,
}

impl TickerCatalog {
    /// Clean an assembled snapshot and build the catalog.
    pub fn from_snapshot(rows: Vec<RawTickerRow>) -> Self {
        let (baseline, cleaning) = DatasetCleaner::new().clean(rows);

        let cap_millions: Vec<f64> = baseline.iter().map(TickerRow::market_cap_millions).collect();
        let max_market_cap = round_to(cap_millions.iter().copied().fold(0.0, f64::max), 2);
        let scale = BucketScale::from_max(max_market_cap);

        info!(
            tickers = baseline.len(),
            max_market_cap,
            rounded_max = scale.rounded_max(),
            "Catalog baseline ready"
        );

        Self {
            working: (0..baseline.len()).collect(),
            baseline,
            cap_millions,
            state: ViewState::Baseline,
            max_market_cap,
            scale,
            cleaning,
        }
    }

    /// Run the whole pipeline: fetch, assemble, clean, scale.
    pub async fn load(
        assembler: &DatasetAssembler,
        selection: ExchangeSelection,
    ) -> Result<(Self, AssemblyReport)> {
        let assembly = assembler.assemble(selection).await?;
        Ok((Self::from_snapshot(assembly.rows), assembly.report))
    }

    /// Make the working view equal to the baseline again.
    pub fn reset_working_view(&mut self) {
        self.working = (0..self.baseline.len()).collect();
        self.state = ViewState::Baseline;
        debug!(tickers = self.working.len(), "Working view reset");
    }

    /// Filter the baseline. Returns the size of the new working view.
    ///
    /// Criteria are validated first; on failure the working view is left
    /// untouched.
    pub fn apply_filters(&mut self, criteria: &FilterCriteria) -> Result<usize> {
        let filter = criteria.compile()?;
        self.reset_working_view();
        self.retain(&filter);

        info!(
            tickers = self.working.len(),
            baseline = self.baseline.len(),
            "Filters applied"
        );
        Ok(self.working.len())
    }

    /// Filter the current working view without resetting it first.
    pub fn refine_filters(&mut self, criteria: &FilterCriteria) -> Result<usize> {
        let filter = criteria.compile()?;
        let before = self.working.len();
        self.retain(&filter);

        info!(before, after = self.working.len(), "Filters refined");
        Ok(self.working.len())
    }

    fn retain(&mut self, filter: &CompiledFilter) {
        let baseline = &self.baseline;
        let caps = &self.cap_millions;
        self.working
            .retain(|&i| filter.matches(&baseline[i], caps[i]));
        self.state = ViewState::Filtered;
    }

    /// Keep the `n` largest listings of the working view, largest first.
    ///
    /// Ties keep their current relative order.
    pub fn top_by_capitalization(&mut self, n: usize) -> Result<usize> {
        if n == 0 {
            return Err(CatalogError::validation("top count must be at least 1"));
        }

        let baseline = &self.baseline;
        self.working
            .sort_by(|&a, &b| baseline[b].market_cap.cmp(&baseline[a].market_cap));
        self.working.truncate(n);
        self.state = ViewState::Filtered;

        info!(n, tickers = self.working.len(), "Ranked by market cap");
        Ok(self.working.len())
    }

    /// Symbols of the working view, in view order.
    pub fn current_tickers(&self) -> Vec<String> {
        self.working_rows().map(|row| row.symbol.clone()).collect()
    }

    /// Rows of the working view, in view order.
    pub fn working_rows(&self) -> impl Iterator<Item = &TickerRow> + '_ {
        self.working.iter().map(move |&i| &self.baseline[i])
    }

    pub fn baseline(&self) -> &[TickerRow] {
        &self.baseline
    }

    pub fn baseline_len(&self) -> usize {
        self.baseline.len()
    }

    pub fn working_len(&self) -> usize {
        self.working.len()
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Largest market cap in the baseline, in millions.
    pub fn max_market_cap(&self) -> f64 {
        self.max_market_cap
    }

    pub fn bucket_scale(&self) -> &BucketScale {
        &self.scale
    }

    pub fn cleaning_report(&self) -> &CleaningReport {
        &self.cleaning
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Exchange, Sector};

    fn raw(symbol: &str, exchange: Exchange, sector: &str, cap: u64) -> RawTickerRow {
        RawTickerRow::new(symbol, format!("{} Holdings Inc", symbol), exchange)
            .with_market_cap(cap.to_string())
            .with_volume("50000")
            .with_sector(sector)
    }

    fn sample() -> TickerCatalog {
        TickerCatalog::from_snapshot(vec![
            raw("AAA", Exchange::Nyse, "Technology", 5_000_000),
            raw("BBB", Exchange::Nasdaq, "Finance", 12_000_000),
            raw("CCC", Exchange::Amex, "Technology", 800_000),
        ])
    }

    fn larger() -> TickerCatalog {
        TickerCatalog::from_snapshot(vec![
            raw("ALPHA", Exchange::Nyse, "Technology", 900_000_000),
            raw("BETA", Exchange::Nyse, "Finance", 40_000_000),
            raw("GAMMA", Exchange::Nasdaq, "Technology", 2_500_000_000),
            raw("DELTA", Exchange::Nasdaq, "Health Care", 40_000_000),
            raw("EPSILON", Exchange::Amex, "Energy", 15_000_000),
            raw("ZETA", Exchange::Nyse, "Technology", 310_000_000),
        ])
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut catalog = sample();
        assert_eq!(catalog.baseline_len(), 3);
        assert_eq!(catalog.max_market_cap(), 12.0);
        assert_eq!(catalog.bucket_scale().rounded_max(), 100_000.0);

        let criteria = FilterCriteria::new()
            .with_sectors("Technology")
            .with_cap_min(1.0);
        assert_eq!(catalog.apply_filters(&criteria).unwrap(), 1);
        assert_eq!(catalog.current_tickers(), vec!["AAA"]);

        catalog.reset_working_view();
        catalog.top_by_capitalization(2).unwrap();
        assert_eq!(catalog.current_tickers(), vec!["BBB", "AAA"]);
    }

    #[test]
    fn test_zero_cap_illiquid_row_dropped_then_filter_and_rank() {
        let mut catalog = TickerCatalog::from_snapshot(vec![
            raw("AAA", Exchange::Nasdaq, "Technology", 5_000_000),
            raw("BBB", Exchange::Nyse, "Finance", 0).with_volume("500"),
            RawTickerRow::new("CCC", "CCC Holdings Inc", Exchange::Amex)
                .with_market_cap("2000000")
                .with_volume("20000")
                .with_sector("Technology"),
        ]);
        assert_eq!(catalog.cleaning_report().input, 3);
        assert_eq!(catalog.cleaning_report().output, 2);

        let mut baseline = catalog.current_tickers();
        baseline.sort();
        assert_eq!(baseline, vec!["AAA", "CCC"]);

        let kept = catalog
            .apply_filters(&FilterCriteria::new().with_sectors("Technology"))
            .unwrap();
        assert_eq!(kept, 2);
        let mut technology = catalog.current_tickers();
        technology.sort();
        assert_eq!(technology, vec!["AAA", "CCC"]);

        catalog.top_by_capitalization(1).unwrap();
        assert_eq!(catalog.current_tickers(), vec!["AAA"]);
    }

    #[test]
    fn test_unknown_exchange_leaves_view_unchanged() {
        let mut catalog = larger();
        catalog
            .apply_filters(&FilterCriteria::new().with_sectors("Technology"))
            .unwrap();
        let before = catalog.current_tickers();

        let err = catalog
            .apply_filters(&FilterCriteria::new().with_exchanges("OTC"))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(catalog.current_tickers(), before);
        assert_eq!(catalog.state(), ViewState::Filtered);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut catalog = larger();
        catalog.top_by_capitalization(2).unwrap();

        catalog.reset_working_view();
        let once = catalog.current_tickers();
        catalog.reset_working_view();
        assert_eq!(catalog.current_tickers(), once);
        assert_eq!(catalog.state(), ViewState::Baseline);
        assert_eq!(catalog.working_len(), catalog.baseline_len());
    }

    #[test]
    fn test_apply_filters_does_not_compose() {
        let a = FilterCriteria::new().with_exchanges("nyse");
        let b = FilterCriteria::new().with_sectors("Technology");

        let mut sequential = larger();
        sequential.apply_filters(&a).unwrap();
        sequential.apply_filters(&b).unwrap();

        let mut direct = larger();
        direct.apply_filters(&b).unwrap();

        assert_eq!(sequential.current_tickers(), direct.current_tickers());
        assert_eq!(direct.current_tickers(), vec!["ALPHA", "GAMMA", "ZETA"]);
    }

    #[test]
    fn test_refine_filters_composes() {
        let mut catalog = larger();
        catalog
            .apply_filters(&FilterCriteria::new().with_exchanges("nyse"))
            .unwrap();
        catalog
            .refine_filters(&FilterCriteria::new().with_sectors("Technology"))
            .unwrap();
        assert_eq!(catalog.current_tickers(), vec!["ALPHA", "ZETA"]);
    }

    #[test]
    fn test_empty_criteria_still_marks_filtered() {
        let mut catalog = larger();
        assert_eq!(catalog.apply_filters(&FilterCriteria::new()).unwrap(), 6);
        assert_eq!(catalog.state(), ViewState::Filtered);
    }

    #[test]
    fn test_cap_bounds_are_inclusive_millions() {
        let mut catalog = larger();
        let criteria = FilterCriteria::new().with_cap_min(40.0).with_cap_max(310.0);
        catalog.apply_filters(&criteria).unwrap();
        assert_eq!(catalog.current_tickers(), vec!["BETA", "DELTA", "ZETA"]);
    }

    #[test]
    fn test_ranking_after_filter() {
        let mut catalog = larger();
        catalog
            .apply_filters(&FilterCriteria::new().with_sectors(vec![
                "Technology".to_string(),
                "Finance".to_string(),
            ]))
            .unwrap();
        let filtered = catalog.working_len();

        for n in [1, 2, 10] {
            let mut ranked = catalog.clone();
            let kept = ranked.top_by_capitalization(n).unwrap();
            assert_eq!(kept, n.min(filtered));

            let caps: Vec<u64> = ranked.working_rows().map(|r| r.market_cap).collect();
            assert!(caps.windows(2).all(|w| w[0] >= w[1]));
            assert!(ranked
                .working_rows()
                .all(|r| matches!(r.sector, Some(Sector::Technology) | Some(Sector::Finance))));
        }
    }

    #[test]
    fn test_ranking_ties_are_stable() {
        let mut catalog = larger();
        catalog
            .apply_filters(&FilterCriteria::new().with_cap_max(40.0))
            .unwrap();
        catalog.top_by_capitalization(3).unwrap();
        assert_eq!(catalog.current_tickers(), vec!["BETA", "DELTA", "EPSILON"]);
    }

    #[test]
    fn test_top_zero_is_rejected() {
        let mut catalog = larger();
        let err = catalog.top_by_capitalization(0).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(catalog.state(), ViewState::Baseline);
    }

    #[test]
    fn test_empty_catalog() {
        let mut catalog = TickerCatalog::from_snapshot(Vec::new());
        assert_eq!(catalog.max_market_cap(), 0.0);
        assert_eq!(catalog.bucket_scale().rounded_max(), 100_000.0);
        assert_eq!(catalog.top_by_capitalization(5).unwrap(), 0);
        assert!(catalog.current_tickers().is_empty());
    }
}
