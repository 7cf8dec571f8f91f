//! Rough company valuation from profit history and churn.
//!
//! The estimate is a heuristic. It always travels with a [`Confidence`] and
//! [`DISCLAIMER`], and callers must show both next to the number.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{Confidence, ValuationConfig, ValuationMode};

// ---------------------------------------------------------------------------
// Formula constants
// ---------------------------------------------------------------------------

/// Multiple applied to average profit.
pub const PROFIT_MULTIPLE: f64 = 3.0;
/// Share of the annual growth rate carried into the multiplier.
pub const GROWTH_WEIGHT: f64 = 0.5;
pub const GROWTH_MULTIPLIER_MIN: f64 = 0.5;
pub const GROWTH_MULTIPLIER_MAX: f64 = 2.0;
/// Share of the churn percentage taken off the retention multiplier.
pub const CHURN_WEIGHT: f64 = 0.3;
pub const RETENTION_MULTIPLIER_MIN: f64 = 0.5;
pub const RETENTION_MULTIPLIER_MAX: f64 = 1.0;

/// Current year plus up to four prior years.
pub const MAX_PROFIT_YEARS: usize = 5;
/// Years of history needed (together with churn) for `High` confidence.
pub const HIGH_CONFIDENCE_YEARS: usize = 3;

pub const DISCLAIMER: &str = "Estimated valuation is a rough heuristic based on profit history \
     and churn. It is not a financial or legal valuation.";

/// Breakdown of an automatic estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationEstimate {
    pub valuation: f64,
    pub confidence: Confidence,
    pub years: usize,
    pub average_profit: f64,
    pub base: f64,
    pub growth_rate: f64,
    pub growth_multiplier: f64,
    pub retention_multiplier: f64,
    pub churn_rate: Option<f64>,
}

/// The company value currently in force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum CompanyValuation {
    /// Entered by a person; no confidence rating applies.
    Manual { valuation: f64 },
    /// Derived from business metrics.
    Auto(ValuationEstimate),
}

impl CompanyValuation {
    pub fn value(&self) -> f64 {
        match self {
            CompanyValuation::Manual { valuation } => *valuation,
            CompanyValuation::Auto(estimate) => estimate.valuation,
        }
    }

    pub fn confidence(&self) -> Option<Confidence> {
        match self {
            CompanyValuation::Manual { .. } => None,
            CompanyValuation::Auto(estimate) => Some(estimate.confidence),
        }
    }

    pub fn mode(&self) -> ValuationMode {
        match self {
            CompanyValuation::Manual { .. } => ValuationMode::Manual,
            CompanyValuation::Auto(_) => ValuationMode::Auto,
        }
    }
}

/// Confidence from input completeness.
pub fn confidence(years: usize, churn_provided: bool) -> Confidence {
    if years >= HIGH_CONFIDENCE_YEARS && churn_provided {
        Confidence::High
    } else if years <= 1 && !churn_provided {
        Confidence::Low
    } else {
        Confidence::Medium
    }
}

/// Annualised growth between the earliest and latest year on record.
///
/// Zero when there are fewer than two years or the earliest profit is not
/// positive.
pub fn growth_rate(profits: &BTreeMap<i32, f64>) -> f64 {
    let (Some((&first_year, &earliest)), Some((&last_year, &latest))) =
        (profits.first_key_value(), profits.last_key_value())
    else {
        return 0.0;
    };

    let span = (last_year - first_year) as f64;
    if profits.len() < 2 || span <= 0.0 || earliest <= 0.0 {
        return 0.0;
    }

    (latest - earliest) / earliest / span
}

pub fn growth_multiplier(growth_rate: f64) -> f64 {
    (1.0 + growth_rate * GROWTH_WEIGHT).clamp(GROWTH_MULTIPLIER_MIN, GROWTH_MULTIPLIER_MAX)
}

pub fn retention_multiplier(churn_rate: Option<f64>) -> f64 {
    match churn_rate {
        Some(churn) => (1.0 - churn / 100.0 * CHURN_WEIGHT)
            .clamp(RETENTION_MULTIPLIER_MIN, RETENTION_MULTIPLIER_MAX),
        None => 1.0,
    }
}

/// Estimate from year -> profit history and an optional churn percentage.
///
/// An empty history yields a zero valuation with `Low` confidence.
pub fn estimate(profits: &BTreeMap<i32, f64>, churn_rate: Option<f64>) -> ValuationEstimate {
    let years = profits.len();
    let average_profit = if years == 0 {
        0.0
    } else {
        profits.values().sum::<f64>() / years as f64
    };

    let base = average_profit * PROFIT_MULTIPLE;
    let growth_rate = growth_rate(profits);
    let growth_multiplier = growth_multiplier(growth_rate);
    let retention_multiplier = retention_multiplier(churn_rate);

    ValuationEstimate {
        valuation: base * growth_multiplier * retention_multiplier,
        confidence: confidence(years, churn_rate.is_some()),
        years,
        average_profit,
        base,
        growth_rate,
        growth_multiplier,
        retention_multiplier,
        churn_rate,
    }
}

/// Valuation for the configured mode.
pub fn current(config: &ValuationConfig) -> CompanyValuation {
    match config.mode {
        ValuationMode::Manual => CompanyValuation::Manual {
            valuation: config.manual_value,
        },
        ValuationMode::Auto => CompanyValuation::Auto(estimate(&config.profits, config.churn_rate)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(entries: &[(i32, f64)]) -> BTreeMap<i32, f64> {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_three_years_with_churn() {
        let profits = history(&[(2024, 100_000.0), (2023, 80_000.0), (2022, 60_000.0)]);
        let e = estimate(&profits, Some(10.0));

        assert_eq!(e.average_profit, 80_000.0);
        assert_eq!(e.base, 240_000.0);
        assert!((e.growth_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((e.growth_multiplier - 7.0 / 6.0).abs() < 1e-9);
        assert!((e.retention_multiplier - 0.97).abs() < 1e-9);
        assert!((e.valuation - 271_600.0).abs() < 1.0);
        assert_eq!(e.confidence, Confidence::High);
    }

    #[test]
    fn test_single_year_no_churn() {
        let e = estimate(&history(&[(2024, 50_000.0)]), None);
        assert_eq!(e.valuation, 150_000.0);
        assert_eq!(e.growth_rate, 0.0);
        assert_eq!(e.growth_multiplier, 1.0);
        assert_eq!(e.retention_multiplier, 1.0);
        assert_eq!(e.confidence, Confidence::Low);
    }

    #[test]
    fn test_confidence_table() {
        assert_eq!(confidence(1, false), Confidence::Low);
        assert_eq!(confidence(0, false), Confidence::Low);
        assert_eq!(confidence(1, true), Confidence::Medium);
        assert_eq!(confidence(2, true), Confidence::Medium);
        assert_eq!(confidence(2, false), Confidence::Medium);
        assert_eq!(confidence(5, false), Confidence::Medium);
        assert_eq!(confidence(3, true), Confidence::High);
        assert_eq!(confidence(5, true), Confidence::High);
    }

    #[test]
    fn test_multipliers_are_clamped() {
        // 10x growth in one year would be a 6x multiplier unclamped
        assert_eq!(growth_multiplier(10.0), GROWTH_MULTIPLIER_MAX);
        assert_eq!(growth_multiplier(-5.0), GROWTH_MULTIPLIER_MIN);
        assert!((retention_multiplier(Some(100.0)) - 0.7).abs() < 1e-12);
        assert_eq!(retention_multiplier(Some(0.0)), 1.0);
        assert_eq!(retention_multiplier(None), 1.0);
    }

    #[test]
    fn test_growth_uses_year_span_not_count() {
        // Two data points four years apart
        let profits = history(&[(2020, 100.0), (2024, 300.0)]);
        assert!((growth_rate(&profits) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_earliest_profit_has_no_growth() {
        let profits = history(&[(2023, 0.0), (2024, 10_000.0)]);
        let e = estimate(&profits, None);
        assert_eq!(e.growth_rate, 0.0);
        assert!(e.valuation.is_finite());
        assert_eq!(e.valuation, 15_000.0);
    }

    #[test]
    fn test_empty_history() {
        let e = estimate(&BTreeMap::new(), None);
        assert_eq!(e.valuation, 0.0);
        assert_eq!(e.confidence, Confidence::Low);
    }

    #[test]
    fn test_current_respects_mode() {
        let mut config = ValuationConfig {
            manual_value: 1_000_000.0,
            ..Default::default()
        };
        let manual = current(&config);
        assert_eq!(manual.value(), 1_000_000.0);
        assert_eq!(manual.confidence(), None);
        assert_eq!(manual.mode(), ValuationMode::Manual);

        config.mode = ValuationMode::Auto;
        config.profits = history(&[(2024, 10.0)]);
        let auto = current(&config);
        assert_eq!(auto.value(), 30.0);
        assert_eq!(auto.confidence(), Some(Confidence::Low));
    }
}
