use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::EntityBase;

/// Cliff/vesting terms attached to a contributor.
///
/// `vesting_months` is the full duration measured from `start_date`, so it
/// includes the cliff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingConfig {
    pub start_date: NaiveDate,
    pub cliff_months: u32,
    pub vesting_months: u32,
}

impl VestingConfig {
    pub fn new(start_date: NaiveDate, cliff_months: u32, vesting_months: u32) -> Self {
        Self {
            start_date,
            cliff_months,
            vesting_months,
        }
    }

    /// Date on which the cliff is reached.
    pub fn cliff_date(&self) -> NaiveDate {
        add_months(self.start_date, self.cliff_months)
    }

    /// Date on which everything is vested.
    pub fn full_vest_date(&self) -> NaiveDate {
        add_months(self.start_date, self.vesting_months)
    }
}

pub(crate) fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    #[serde(flatten)]
    pub base: EntityBase,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Dollar rate applied to `time` contributions when they are recorded.
    #[serde(default)]
    pub hourly_rate: f64,
    /// Whether the person is still participating. Unrelated to deletion.
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vesting: Option<VestingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Contributor {
    pub fn new(name: String, hourly_rate: f64, sequence_number: u32) -> Self {
        Self {
            base: EntityBase::new(sequence_number),
            name,
            email: None,
            hourly_rate,
            active: true,
            vesting: None,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vesting_dates() {
        let config = VestingConfig::new(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(), 12, 48);
        assert_eq!(config.cliff_date(), NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
        assert_eq!(config.full_vest_date(), NaiveDate::from_ymd_opt(2028, 1, 31).unwrap());

        // Month-end clamps instead of overflowing into the next month
        let short = VestingConfig::new(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(), 1, 2);
        assert_eq!(short.cliff_date(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "id": "6f1c1a4e-9a39-4f57-9d3a-0c0d1f0e2a11",
            "sequence_number": 1,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "name": "Ada"
        }"#;
        let contributor: Contributor = serde_json::from_str(json).unwrap();
        assert!(contributor.active);
        assert_eq!(contributor.hourly_rate, 0.0);
        assert!(!contributor.is_deleted());
        assert!(contributor.vesting.is_none());
    }
}
