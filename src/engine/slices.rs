//! Contribution value -> slice conversion.
//!
//! Inputs are assumed to have passed the validation boundary: finite and
//! non-negative. Nothing here fails.

use crate::entity::ContributionType;

pub const TIME_MULTIPLIER: f64 = 2.0;
pub const CASH_MULTIPLIER: f64 = 4.0;
pub const NON_CASH_MULTIPLIER: f64 = 2.0;
pub const IDEA_MULTIPLIER: f64 = 1.0;
pub const RELATIONSHIP_MULTIPLIER: f64 = 1.0;

/// Fixed multiplier for a contribution type.
pub fn multiplier(contribution_type: ContributionType) -> f64 {
    match contribution_type {
        ContributionType::Time => TIME_MULTIPLIER,
        ContributionType::Cash => CASH_MULTIPLIER,
        ContributionType::NonCash => NON_CASH_MULTIPLIER,
        ContributionType::Idea => IDEA_MULTIPLIER,
        ContributionType::Relationship => RELATIONSHIP_MULTIPLIER,
    }
}

/// Slices earned for a raw value.
///
/// `time` values are hours and are converted to dollars with `hourly_rate`
/// (a missing rate counts as zero). Every other type is already in dollars.
pub fn slices(contribution_type: ContributionType, value: f64, hourly_rate: Option<f64>) -> f64 {
    match contribution_type {
        ContributionType::Time => value * hourly_rate.unwrap_or(0.0) * TIME_MULTIPLIER,
        other => value * multiplier(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_table() {
        assert_eq!(multiplier(ContributionType::Time), 2.0);
        assert_eq!(multiplier(ContributionType::Cash), 4.0);
        assert_eq!(multiplier(ContributionType::NonCash), 2.0);
        assert_eq!(multiplier(ContributionType::Idea), 1.0);
        assert_eq!(multiplier(ContributionType::Relationship), 1.0);
    }

    #[test]
    fn test_time_uses_hourly_rate() {
        assert_eq!(slices(ContributionType::Time, 10.0, Some(100.0)), 2_000.0);
        assert_eq!(slices(ContributionType::Time, 1.5, Some(75.0)), 225.0);
    }

    #[test]
    fn test_time_without_rate_is_zero() {
        assert_eq!(slices(ContributionType::Time, 40.0, None), 0.0);
        assert_eq!(slices(ContributionType::Time, 40.0, Some(0.0)), 0.0);
    }

    #[test]
    fn test_dollar_types_ignore_rate() {
        assert_eq!(slices(ContributionType::Cash, 1_000.0, None), 4_000.0);
        assert_eq!(slices(ContributionType::Cash, 1_000.0, Some(500.0)), 4_000.0);
        assert_eq!(slices(ContributionType::NonCash, 250.0, None), 500.0);
        assert_eq!(slices(ContributionType::Idea, 2_000.0, None), 2_000.0);
        assert_eq!(slices(ContributionType::Relationship, 750.0, None), 750.0);
    }

    #[test]
    fn test_zero_value() {
        for ty in ContributionType::ALL {
            assert_eq!(slices(ty, 0.0, Some(100.0)), 0.0);
        }
    }
}
