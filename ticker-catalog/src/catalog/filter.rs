//! Filter criteria.
//!
//! Callers describe a filter loosely ([`Selection`] of text values, optional
//! cap bounds). [`FilterCriteria::compile`] validates everything up front and
//! yields a [`CompiledFilter`] that can be applied without further failure.

use std::collections::HashSet;

use crate::data::{Exchange, Sector, TickerRow};
use crate::error::{CatalogError, Result};

// ============================================================================
// Selection
// ============================================================================

/// Nothing, one value, or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection<T> {
    #[default]
    None,
    Single(T),
    Many(Vec<T>),
}

impl<T> Selection<T> {
    /// Normalize to a list.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::None => Vec::new(),
            Self::Single(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl<T> From<Vec<T>> for Selection<T> {
    fn from(values: Vec<T>) -> Self {
        Self::Many(values)
    }
}

impl<T> From<Option<T>> for Selection<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Self::Single)
    }
}

impl From<&str> for Selection<String> {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

// ============================================================================
// Filter Criteria
// ============================================================================

/// Unvalidated filter input.
///
/// Cap bounds are in millions and inclusive. Empty selections, and entries
/// that are blank, leave that dimension unfiltered.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub exchanges: Selection<String>,
    pub sectors: Selection<String>,
    pub cap_min: Option<f64>,
    pub cap_max: Option<f64>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exchanges(mut self, exchanges: impl Into<Selection<String>>) -> Self {
        self.exchanges = exchanges.into();
        self
    }

    pub fn with_sectors(mut self, sectors: impl Into<Selection<String>>) -> Self {
        self.sectors = sectors.into();
        self
    }

    pub fn with_cap_min(mut self, cap_min: f64) -> Self {
        self.cap_min = Some(cap_min);
        self
    }

    pub fn with_cap_max(mut self, cap_max: f64) -> Self {
        self.cap_max = Some(cap_max);
        self
    }

    /// Validate every criterion.
    pub fn compile(&self) -> Result<CompiledFilter> {
        let exchanges = parse_members::<Exchange>(&self.exchanges, "exchange")?;
        let sectors = parse_members::<Sector>(&self.sectors, "sector")?;

        for (label, bound) in [("cap_min", self.cap_min), ("cap_max", self.cap_max)] {
            if let Some(value) = bound {
                if !value.is_finite() {
                    return Err(CatalogError::validation(format!(
                        "{} must be a finite number, got {}",
                        label, value
                    )));
                }
            }
        }

        Ok(CompiledFilter {
            exchanges,
            sectors,
            cap_min: self.cap_min,
            cap_max: self.cap_max,
        })
    }
}

fn parse_members<T>(selection: &Selection<String>, what: &str) -> Result<Option<HashSet<T>>>
where
    T: std::str::FromStr + Eq + std::hash::Hash,
{
    let values: Vec<&String> = match selection {
        Selection::None => Vec::new(),
        Selection::Single(value) => vec![value],
        Selection::Many(values) => values.iter().collect(),
    };

    let members = values
        .into_iter()
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| CatalogError::validation(format!("unknown {}: {}", what, v)))
        })
        .collect::<Result<HashSet<T>>>()?;

    Ok((!members.is_empty()).then_some(members))
}

// ============================================================================
// Compiled Filter
// ============================================================================

/// Validated criteria.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    exchanges: Option<HashSet<Exchange>>,
    sectors: Option<HashSet<Sector>>,
    cap_min: Option<f64>,
    cap_max: Option<f64>,
}

impl CompiledFilter {
    /// Match a row given its market cap in millions.
    pub fn matches(&self, row: &TickerRow, cap_millions: f64) -> bool {
        if let Some(exchanges) = &self.exchanges {
            if !exchanges.contains(&row.exchange) {
                return false;
            }
        }
        if let Some(sectors) = &self.sectors {
            match row.sector {
                Some(sector) if sectors.contains(&sector) => {}
                _ => return false,
            }
        }
        if self.cap_min.is_some_and(|min| cap_millions < min) {
            return false;
        }
        if self.cap_max.is_some_and(|max| cap_millions > max) {
            return false;
        }
        true
    }

    /// True if no dimension is restricted.
    pub fn is_unrestricted(&self) -> bool {
        self.exchanges.is_none()
            && self.sectors.is_none()
            && self.cap_min.is_none()
            && self.cap_max.is_none()
    }
}
