//! Dataset cleaning.
//!
//! Runs a fixed sequence of exclusion rules over the assembled snapshot:
//! 1. Drop rows whose market cap or volume is not a number, coercing the rest
//! 2. Drop derivative-looking names (`%`, `Warrant`, `Rate`, `Fund `, `Bond `)
//! 3. Drop illiquid shells, illiquid trusts and micro funds
//!
//! Name matching is case-sensitive substring matching.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::{RawTickerRow, TickerRow};

/// Volume below which a listing counts as illiquid.
pub const MIN_LIQUID_VOLUME: u64 = 10_000;

/// Market cap (currency units) below which a fund is dropped.
pub const MICRO_FUND_MAX_CAP: u64 = 1_000_000;

// ============================================================================
// Exclusion Rules
// ============================================================================

/// One exclusion rule, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionRule {
    /// Market cap or volume missing or not numeric
    MissingNumeric,
    /// Name contains `%`
    PercentInName,
    /// Name contains `Warrant`
    Warrant,
    /// Name contains `Rate`
    Rate,
    /// Name contains `Fund ` (trailing space)
    FundSeries,
    /// Name contains `Bond ` (trailing space)
    BondSeries,
    /// Illiquid with zero market cap
    IlliquidShell,
    /// Illiquid trust
    IlliquidTrust,
    /// Fund (no trailing space) below the micro-cap cutoff
    MicroFund,
}

impl ExclusionRule {
    /// Rules applied after numeric coercion, in order.
    pub const ROW_RULES: [ExclusionRule; 8] = [
        ExclusionRule::PercentInName,
        ExclusionRule::Warrant,
        ExclusionRule::Rate,
        ExclusionRule::FundSeries,
        ExclusionRule::BondSeries,
        ExclusionRule::IlliquidShell,
        ExclusionRule::IlliquidTrust,
        ExclusionRule::MicroFund,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingNumeric => "missing market cap or volume",
            Self::PercentInName => "percent in name",
            Self::Warrant => "warrant",
            Self::Rate => "rate note",
            Self::FundSeries => "fund series",
            Self::BondSeries => "bond series",
            Self::IlliquidShell => "illiquid zero-cap",
            Self::IlliquidTrust => "illiquid trust",
            Self::MicroFund => "micro fund",
        }
    }

    /// True if the rule removes `row`.
    ///
    /// `MissingNumeric` never matches a coerced row; it is enforced by
    /// [`TickerRow::coerce`].
    pub fn excludes(&self, row: &TickerRow) -> bool {
        let name = row.name.as_str();
        match self {
            Self::MissingNumeric => false,
            Self::PercentInName => name.contains('%'),
            Self::Warrant => name.contains("Warrant"),
            Self::Rate => name.contains("Rate"),
            Self::FundSeries => name.contains("Fund "),
            Self::BondSeries => name.contains("Bond "),
            Self::IlliquidShell => row.volume < MIN_LIQUID_VOLUME && row.market_cap == 0,
            Self::IlliquidTrust => row.volume < MIN_LIQUID_VOLUME && name.contains("Trust"),
            Self::MicroFund => row.market_cap < MICRO_FUND_MAX_CAP && name.contains("Fund"),
        }
    }
}

impl std::fmt::Display for ExclusionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Cleaning Report
// ============================================================================

/// Rows removed by one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: ExclusionRule,
    pub removed: usize,
}

/// Funnel summary of one cleaning pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub input: usize,
    pub stages: Vec<RuleOutcome>,
    pub output: usize,
}

impl CleaningReport {
    pub fn removed(&self) -> usize {
        self.input.saturating_sub(self.output)
    }

    /// Rows removed by `rule`, zero if it never ran.
    pub fn removed_by(&self, rule: ExclusionRule) -> usize {
        self.stages
            .iter()
            .find(|s| s.rule == rule)
            .map_or(0, |s| s.removed)
    }
}

// ============================================================================
// Dataset Cleaner
// ============================================================================

/// Applies the exclusion rules to an assembled snapshot.
#[derive(Debug, Clone)]
pub struct DatasetCleaner {
    rules: Vec<ExclusionRule>,
}

impl Default for DatasetCleaner {
    fn default() -> Self {
        Self {
            rules: ExclusionRule::ROW_RULES.to_vec(),
        }
    }
}

impl DatasetCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules applied after coercion, in order.
    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    /// Clean `rows`, preserving their relative order.
    pub fn clean(&self, rows: Vec<RawTickerRow>) -> (Vec<TickerRow>, CleaningReport) {
        let input = rows.len();

        let mut kept: Vec<TickerRow> = rows.into_iter().filter_map(TickerRow::coerce).collect();
        let mut stages = Vec::with_capacity(self.rules.len() + 1);
        stages.push(RuleOutcome {
            rule: ExclusionRule::MissingNumeric,
            removed: input - kept.len(),
        });

        for rule in &self.rules {
            let before = kept.len();
            kept.retain(|row| !rule.excludes(row));
            let removed = before - kept.len();
            if removed > 0 {
                debug!(rule = %rule, removed, "Exclusion rule applied");
            }
            stages.push(RuleOutcome {
                rule: *rule,
                removed,
            });
        }

        let report = CleaningReport {
            input,
            stages,
            output: kept.len(),
        };

        info!(
            input = report.input,
            output = report.output,
            removed = report.removed(),
            "Cleaned listing snapshot"
        );

        (kept, report)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Exchange;

    fn raw(name: &str, cap: &str, volume: &str) -> RawTickerRow {
        RawTickerRow::new("TST", name, Exchange::Nyse)
            .with_market_cap(cap)
            .with_volume(volume)
    }

    fn survives(row: RawTickerRow) -> bool {
        let (kept, _) = DatasetCleaner::new().clean(vec![row]);
        kept.len() == 1
    }

    #[test]
    fn test_name_rules() {
        let cases = vec![
            ("Acme Corp Common Stock", true),
            ("Acme 5.25% Notes due 2030", false),
            ("Acme Acquisition Corp Warrant", false),
            ("Acme Floating Rate Notes", false),
            ("Acme Income Fund Inc", false),
            ("Acme Municipal Bond Trust", false),
            ("Acme warrant holdings", true),
            ("Acme Bondholders Inc", true),
        ];

        for (name, expected) in cases {
            assert_eq!(
                survives(raw(name, "500000000", "250000")),
                expected,
                "name: {}",
                name
            );
        }
    }

    #[test]
    fn test_fund_with_and_without_trailing_space() {
        // "Fund " is always dropped, "Fund" only below the micro-cap cutoff
        assert!(!survives(raw("Big Fund Inc", "900000000", "500000")));
        assert!(survives(raw("Fundamental Global Inc", "900000000", "500000")));
        assert!(!survives(raw("Fundamental Global Inc", "999999", "500000")));
        assert!(!survives(raw("Tiny Fund", "500000", "500000")));
        assert!(survives(raw("Large Fund", "5000000", "500000")));
    }

    #[test]
    fn test_liquidity_rules() {
        let cases = vec![
            // (name, cap, volume, survives)
            ("Shell Co", "0", "9999", false),
            ("Shell Co", "0", "10000", true),
            ("Dormant Holdings", "1", "9999", true),
            ("Acme Realty Trust", "500000000", "9999", false),
            ("Acme Realty Trust", "500000000", "10000", true),
        ];

        for (name, cap, volume, expected) in cases {
            assert_eq!(
                survives(raw(name, cap, volume)),
                expected,
                "{} cap={} volume={}",
                name,
                cap,
                volume
            );
        }
    }

    #[test]
    fn test_missing_numbers_are_dropped() {
        let rows = vec![
            RawTickerRow::new("A", "No Cap", Exchange::Nyse).with_volume("100000"),
            RawTickerRow::new("B", "No Volume", Exchange::Nyse).with_market_cap("100000000"),
            raw("Blank Cap", "", "100000"),
            raw("Text Cap", "NA", "100000"),
            raw("Good Co", "100000000.75", "100000.9"),
        ];

        let (kept, report) = DatasetCleaner::new().clean(rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].market_cap, 100_000_000);
        assert_eq!(kept[0].volume, 100_000);
        assert_eq!(report.removed_by(ExclusionRule::MissingNumeric), 4);
    }

    #[test]
    fn test_report_funnel() {
        let rows = vec![
            raw("Keep One", "500000000", "500000"),
            raw("Keep Two", "700000000", "500000"),
            raw("Some Warrant", "1", "1"),
            raw("Other Warrant", "1", "1"),
            raw("Shell", "0", "0"),
        ];

        let (kept, report) = DatasetCleaner::new().clean(rows);
        assert_eq!(kept.len(), 2);
        assert_eq!(report.input, 5);
        assert_eq!(report.output, 2);
        assert_eq!(report.removed(), 3);
        assert_eq!(report.removed_by(ExclusionRule::Warrant), 2);
        assert_eq!(report.removed_by(ExclusionRule::IlliquidShell), 1);
        assert_eq!(report.stages.len(), 9);
        assert_eq!(
            report.stages.iter().map(|s| s.removed).sum::<usize>(),
            report.removed()
        );
    }

    #[test]
    fn test_order_preserved() {
        let rows = vec![
            RawTickerRow::new("CCC", "Ccc", Exchange::Nyse)
                .with_market_cap("1000000")
                .with_volume("20000"),
            RawTickerRow::new("AAA", "Aaa", Exchange::Nyse)
                .with_market_cap("1000000")
                .with_volume("20000"),
        ];
        let (kept, _) = DatasetCleaner::new().clean(rows);
        assert_eq!(kept[0].symbol, "CCC");
        assert_eq!(kept[1].symbol, "AAA");
    }
}
