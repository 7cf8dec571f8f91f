//! Slice totals and ownership percentages over the active records.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::vesting;
use crate::entity::{Contribution, ContributionType, Contributor};

/// Aggregated slices for one active contributor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorEquity {
    pub contributor_id: Uuid,
    pub name: String,
    pub slices: f64,
    pub percentage: f64,
    pub contribution_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquitySummary {
    pub total_slices: f64,
    pub contributors: Vec<ContributorEquity>,
}

impl EquitySummary {
    pub fn get(&self, contributor_id: &Uuid) -> Option<&ContributorEquity> {
        self.contributors
            .iter()
            .find(|c| &c.contributor_id == contributor_id)
    }

    pub fn slices_for(&self, contributor_id: &Uuid) -> f64 {
        self.get(contributor_id).map(|c| c.slices).unwrap_or(0.0)
    }
}

/// Flat record handed to charts, tables and exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityRow {
    pub contributor_id: Uuid,
    pub name: String,
    pub slices: f64,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vested_slices: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unvested_slices: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dollar_value: Option<f64>,
}

/// `part / total * 100`, or 0 when there is nothing to divide.
pub fn percentage(part: f64, total: f64) -> f64 {
    if total > 0.0 && total.is_finite() {
        part / total * 100.0
    } else {
        0.0
    }
}

/// Dollar value of an equity percentage at a company valuation.
pub fn dollar_value(percentage: f64, valuation: f64) -> f64 {
    if valuation > 0.0 && valuation.is_finite() {
        percentage / 100.0 * valuation
    } else {
        0.0
    }
}

/// Contributions that count towards equity: not deleted, and owned by a
/// contributor that exists and is not deleted.
pub fn counted_contributions<'a>(
    contributors: &'a [Contributor],
    contributions: &'a [Contribution],
) -> impl Iterator<Item = &'a Contribution> + 'a {
    contributions.iter().filter(move |c| {
        c.is_active()
            && contributors
                .iter()
                .any(|p| p.base.id == c.contributor_id && !p.is_deleted())
    })
}

/// Total and per-contributor slices across the active records.
///
/// Every active contributor gets a row, including those with zero slices.
/// Contributions whose owner is missing or deleted are left out of both the
/// rows and the total, so the percentages always add up to 100.
pub fn aggregate(contributors: &[Contributor], contributions: &[Contribution]) -> EquitySummary {
    let mut per_contributor: HashMap<Uuid, (f64, usize)> = HashMap::new();
    for contribution in counted_contributions(contributors, contributions) {
        let entry = per_contributor
            .entry(contribution.contributor_id)
            .or_insert((0.0, 0));
        entry.0 += contribution.slices;
        entry.1 += 1;
    }

    let total_slices: f64 = counted_contributions(contributors, contributions)
        .map(|c| c.slices)
        .sum();

    let mut active: Vec<&Contributor> = contributors.iter().filter(|c| !c.is_deleted()).collect();
    active.sort_by_key(|c| c.base.sequence_number);

    let rows = active
        .into_iter()
        .map(|c| {
            let (slices, count) = per_contributor
                .get(&c.base.id)
                .copied()
                .unwrap_or((0.0, 0));
            ContributorEquity {
                contributor_id: c.base.id,
                name: c.name.clone(),
                slices,
                percentage: percentage(slices, total_slices),
                contribution_count: count,
            }
        })
        .collect();

    EquitySummary {
        total_slices,
        contributors: rows,
    }
}

/// Slices per contribution type across the active records, in table order.
pub fn slices_by_type(
    contributors: &[Contributor],
    contributions: &[Contribution],
) -> Vec<(ContributionType, f64)> {
    ContributionType::ALL
        .iter()
        .map(|ty| {
            let total = counted_contributions(contributors, contributions)
                .filter(|c| c.contribution_type == *ty)
                .map(|c| c.slices)
                .sum();
            (*ty, total)
        })
        .collect()
}

/// Combine aggregation with optional vesting and valuation for rendering.
pub fn equity_rows(
    summary: &EquitySummary,
    contributors: &[Contributor],
    as_of: Option<NaiveDate>,
    valuation: Option<f64>,
) -> Vec<EquityRow> {
    summary
        .contributors
        .iter()
        .map(|row| {
            let vesting_status = as_of.map(|date| {
                let config = contributors
                    .iter()
                    .find(|c| c.base.id == row.contributor_id)
                    .and_then(|c| c.vesting.as_ref());
                vesting::status(config, row.slices, date)
            });
            EquityRow {
                contributor_id: row.contributor_id,
                name: row.name.clone(),
                slices: row.slices,
                percentage: row.percentage,
                vested_slices: vesting_status.as_ref().map(|s| s.vested_slices),
                unvested_slices: vesting_status.as_ref().map(|s| s.unvested_slices),
                dollar_value: valuation.map(|v| dollar_value(row.percentage, v)),
            }
        })
        .collect()
}
