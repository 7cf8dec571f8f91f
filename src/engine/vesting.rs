//! Cliff/vesting state machine.
//!
//! Status is a pure function of `(Option<VestingConfig>, total_slices, as_of)`.
//! Vested slices are always derived from the current total; nothing is locked
//! in per contribution.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::entity::contributor::add_months;
use crate::entity::VestingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VestingState {
    /// No vesting terms: everything is vested.
    None,
    PreCliff,
    Vesting,
    FullyVested,
}

impl std::fmt::Display for VestingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VestingState::None => write!(f, "none"),
            VestingState::PreCliff => write!(f, "pre_cliff"),
            VestingState::Vesting => write!(f, "vesting"),
            VestingState::FullyVested => write!(f, "fully_vested"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VestingStatus {
    pub state: VestingState,
    pub as_of: NaiveDate,
    pub total_slices: f64,
    pub vested_slices: f64,
    pub unvested_slices: f64,
    /// 0..=100
    pub percent_vested: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliff_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_vest_date: Option<NaiveDate>,
}

/// One sample of a forward projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VestingPoint {
    pub date: NaiveDate,
    pub state: VestingState,
    pub vested_slices: f64,
    pub percent_vested: f64,
}

/// Whole calendar months from `start` to `as_of` (0 when `as_of` is earlier).
pub fn completed_months(start: NaiveDate, as_of: NaiveDate) -> u32 {
    if as_of <= start {
        return 0;
    }
    let raw = (as_of.year() - start.year()) * 12 + as_of.month() as i32 - start.month() as i32;
    let mut months = raw.max(0) as u32;
    // Step back when the anniversary day hasn't been reached yet; add_months
    // clamps month ends so 31 Jan -> 29 Feb counts as a full month.
    while months > 0 && add_months(start, months) > as_of {
        months -= 1;
    }
    months
}

/// Fraction of the schedule vested at `as_of`, in [0, 1].
pub fn fraction_vested(config: Option<&VestingConfig>, as_of: NaiveDate) -> (VestingState, f64) {
    let Some(config) = config else {
        return (VestingState::None, 1.0);
    };

    if as_of < config.cliff_date() {
        return (VestingState::PreCliff, 0.0);
    }
    if as_of >= config.full_vest_date() || config.vesting_months <= config.cliff_months {
        return (VestingState::FullyVested, 1.0);
    }

    let elapsed = completed_months(config.start_date, as_of);
    let span = (config.vesting_months - config.cliff_months) as f64;
    let past_cliff = elapsed.saturating_sub(config.cliff_months) as f64;
    (VestingState::Vesting, (past_cliff / span).clamp(0.0, 1.0))
}

/// Vested/unvested split for a contributor holding `total_slices`.
pub fn status(
    config: Option<&VestingConfig>,
    total_slices: f64,
    as_of: NaiveDate,
) -> VestingStatus {
    let (state, fraction) = fraction_vested(config, as_of);

    let vested_slices = match state {
        VestingState::None | VestingState::FullyVested => total_slices,
        VestingState::PreCliff => 0.0,
        VestingState::Vesting => (total_slices * fraction).round().min(total_slices),
    };

    VestingStatus {
        state,
        as_of,
        total_slices,
        vested_slices,
        unvested_slices: total_slices - vested_slices,
        percent_vested: fraction * 100.0,
        cliff_date: config.map(|c| c.cliff_date()),
        full_vest_date: config.map(|c| c.full_vest_date()),
    }
}

/// Sample the schedule every `step_months` from `from` for `months` months.
///
/// Both endpoints are included.
pub fn project(
    config: Option<&VestingConfig>,
    total_slices: f64,
    from: NaiveDate,
    months: u32,
    step_months: u32,
) -> Vec<VestingPoint> {
    let step = step_months.max(1);
    let mut points = Vec::new();
    let mut offset = 0;

    loop {
        let date = add_months(from, offset.min(months));
        let s = status(config, total_slices, date);
        points.push(VestingPoint {
            date,
            state: s.state,
            vested_slices: s.vested_slices,
            percent_vested: s.percent_vested,
        });
        if offset >= months {
            break;
        }
        offset += step;
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn four_year_one_year_cliff() -> VestingConfig {
        VestingConfig::new(date(2024, 1, 1), 12, 48)
    }

    #[test]
    fn test_no_config_is_fully_vested() {
        let s = status(None, 500.0, date(2020, 1, 1));
        assert_eq!(s.state, VestingState::None);
        assert_eq!(s.vested_slices, 500.0);
        assert_eq!(s.unvested_slices, 0.0);
        assert_eq!(s.percent_vested, 100.0);
        assert!(s.cliff_date.is_none());
    }

    #[test]
    fn test_pre_cliff() {
        let config = four_year_one_year_cliff();
        let s = status(Some(&config), 12_000.0, date(2024, 6, 1));
        assert_eq!(s.state, VestingState::PreCliff);
        assert_eq!(s.vested_slices, 0.0);
        assert_eq!(s.unvested_slices, 12_000.0);
        assert_eq!(s.percent_vested, 0.0);
        assert_eq!(s.cliff_date, Some(date(2025, 1, 1)));
        assert_eq!(s.full_vest_date, Some(date(2028, 1, 1)));
    }

    #[test]
    fn test_day_before_cliff_is_pre_cliff() {
        let config = four_year_one_year_cliff();
        let s = status(Some(&config), 12_000.0, date(2024, 12, 31));
        assert_eq!(s.state, VestingState::PreCliff);
        assert_eq!(s.vested_slices, 0.0);
    }

    #[test]
    fn test_mid_vesting() {
        let config = four_year_one_year_cliff();
        let s = status(Some(&config), 12_000.0, date(2025, 6, 1));
        assert_eq!(s.state, VestingState::Vesting);
        // 17 whole months elapsed, 5 of the 36 post-cliff months
        assert!((s.percent_vested - 500.0 / 36.0).abs() < 1e-9);
        assert_eq!(s.vested_slices, 1_667.0);
        assert_eq!(s.unvested_slices, 10_333.0);

        let s = status(Some(&config), 12_000.0, date(2025, 7, 1));
        assert!((s.percent_vested - 50.0 / 3.0).abs() < 1e-9);
        assert_eq!(s.vested_slices, 2_000.0);
    }

    #[test]
    fn test_fully_vested() {
        let config = four_year_one_year_cliff();
        let s = status(Some(&config), 12_000.0, date(2028, 1, 1));
        assert_eq!(s.state, VestingState::FullyVested);
        assert_eq!(s.vested_slices, 12_000.0);
        assert_eq!(s.unvested_slices, 0.0);
        assert_eq!(s.percent_vested, 100.0);
    }

    #[test]
    fn test_before_start_is_pre_cliff() {
        let config = VestingConfig::new(date(2024, 1, 1), 0, 12);
        let s = status(Some(&config), 100.0, date(2023, 6, 1));
        assert_eq!(s.state, VestingState::PreCliff);
        assert_eq!(s.vested_slices, 0.0);
    }

    #[test]
    fn test_cliff_boundary_starts_at_zero() {
        let config = four_year_one_year_cliff();
        let s = status(Some(&config), 12_000.0, date(2025, 1, 1));
        assert_eq!(s.state, VestingState::Vesting);
        assert_eq!(s.percent_vested, 0.0);
        assert_eq!(s.vested_slices, 0.0);
    }

    #[test]
    fn test_zero_cliff_vests_monthly_from_start() {
        let config = VestingConfig::new(date(2024, 1, 1), 0, 10);
        let s = status(Some(&config), 1_000.0, date(2024, 1, 15));
        assert_eq!(s.state, VestingState::Vesting);
        assert_eq!(s.vested_slices, 0.0);

        let s = status(Some(&config), 1_000.0, date(2024, 3, 1));
        assert_eq!(s.vested_slices, 200.0);
    }

    #[test]
    fn test_vested_follows_new_total() {
        let config = four_year_one_year_cliff();
        let before = status(Some(&config), 12_000.0, date(2025, 6, 1));
        let after = status(Some(&config), 24_000.0, date(2025, 6, 1));
        assert_eq!(before.percent_vested, after.percent_vested);
        // 5 of 36 post-cliff months
        assert_eq!(after.vested_slices, 3_333.0);
        assert_eq!(
            after.vested_slices,
            (24_000.0 * before.percent_vested / 100.0).round()
        );
    }

    #[test]
    fn test_percent_vested_is_monotonic() {
        let config = VestingConfig::new(date(2024, 1, 31), 6, 30);
        let mut previous = -1.0;
        let mut day = date(2023, 12, 1);
        while day < date(2027, 1, 1) {
            let s = status(Some(&config), 9_999.0, day);
            assert!(
                s.percent_vested >= previous,
                "percent dropped on {}: {} < {}",
                day,
                s.percent_vested,
                previous
            );
            assert!(s.vested_slices <= s.total_slices);
            previous = s.percent_vested;
            day = day.succ_opt().unwrap();
        }
        assert_eq!(previous, 100.0);
    }

    #[test]
    fn test_completed_months_handles_month_ends() {
        assert_eq!(completed_months(date(2024, 1, 31), date(2024, 2, 28)), 0);
        assert_eq!(completed_months(date(2024, 1, 31), date(2024, 2, 29)), 1);
        assert_eq!(completed_months(date(2024, 1, 15), date(2025, 1, 14)), 11);
        assert_eq!(completed_months(date(2024, 1, 15), date(2025, 1, 15)), 12);
        assert_eq!(completed_months(date(2024, 1, 15), date(2023, 1, 15)), 0);
    }

    #[test]
    fn test_project_includes_both_endpoints() {
        let config = four_year_one_year_cliff();
        let points = project(Some(&config), 12_000.0, date(2024, 1, 1), 48, 12);
        let dates: Vec<_> = points.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 1),
                date(2025, 1, 1),
                date(2026, 1, 1),
                date(2027, 1, 1),
                date(2028, 1, 1)
            ]
        );
        assert_eq!(points[0].state, VestingState::PreCliff);
        assert_eq!(points[4].state, VestingState::FullyVested);
        assert_eq!(points[4].vested_slices, 12_000.0);
    }

    #[test]
    fn test_project_uneven_step_ends_on_horizon() {
        let points = project(None, 10.0, date(2024, 1, 1), 5, 2);
        let last = points.last().unwrap();
        assert_eq!(last.date, date(2024, 6, 1));
        assert_eq!(points.len(), 4);
    }
}
