//! Input validation boundary.
//!
//! Everything that reaches the engine passes through one of these validators
//! first. They normalise what they can (trimming, empty strings to `None`) and
//! collect every problem rather than stopping at the first.

use chrono::NaiveDate;

use crate::engine::ledger::{ContributionUpdate, ContributorUpdate, NewContribution, NewContributor};
use crate::engine::valuation::MAX_PROFIT_YEARS;
use crate::entity::{ContributionType, ValuationConfig, ValuationMode, VestingConfig};
use crate::error::{Result, SlicePieError};

/// Validation constants.
pub mod limits {
    pub const MAX_NAME_LENGTH: usize = 200;
    pub const MAX_EMAIL_LENGTH: usize = 320;
    pub const MAX_DESCRIPTION_LENGTH: usize = 2_000;
    pub const MAX_VESTING_MONTHS: u32 = 600;
    pub const MIN_ID_PREFIX_LENGTH: usize = 4;
    pub const DEFAULT_LIST_LIMIT: usize = 50;
    pub const MAX_LIST_LIMIT: usize = 100;
}

/// Outcome of checking an input.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation<T> {
    Valid(T),
    Invalid(Vec<String>),
}

impl<T> Validation<T> {
    /// `Valid(value)` when `reasons` is empty.
    pub fn from_reasons(value: T, reasons: Vec<String>) -> Self {
        if reasons.is_empty() {
            Validation::Valid(value)
        } else {
            Validation::Invalid(reasons)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    pub fn reasons(&self) -> &[String] {
        match self {
            Validation::Valid(_) => &[],
            Validation::Invalid(reasons) => reasons,
        }
    }

    pub fn into_result(self) -> Result<T> {
        match self {
            Validation::Valid(value) => Ok(value),
            Validation::Invalid(reasons) => Err(SlicePieError::Validation(reasons)),
        }
    }
}

fn check_non_negative(field: &str, value: f64, reasons: &mut Vec<String>) {
    if !value.is_finite() {
        reasons.push(format!("{} must be a finite number", field));
    } else if value < 0.0 {
        reasons.push(format!("{} must not be negative", field));
    }
}

fn check_name(name: &str, reasons: &mut Vec<String>) {
    if name.is_empty() {
        reasons.push("name is required".to_string());
    } else if name.chars().count() > limits::MAX_NAME_LENGTH {
        reasons.push(format!(
            "name exceeds {} characters",
            limits::MAX_NAME_LENGTH
        ));
    }
}

/// Trim, and turn blank strings into `None`.
fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_email(email: Option<&str>, reasons: &mut Vec<String>) {
    let Some(email) = email else { return };
    if email.len() > limits::MAX_EMAIL_LENGTH {
        reasons.push(format!(
            "email exceeds {} characters",
            limits::MAX_EMAIL_LENGTH
        ));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => reasons.push(format!("'{}' is not a valid email address", email)),
    }
}

fn check_description(description: Option<&str>, reasons: &mut Vec<String>) {
    if let Some(description) = description {
        if description.chars().count() > limits::MAX_DESCRIPTION_LENGTH {
            reasons.push(format!(
                "description exceeds {} characters",
                limits::MAX_DESCRIPTION_LENGTH
            ));
        }
    }
}

/// Problems with a vesting schedule, if any.
pub fn vesting_reasons(config: &VestingConfig) -> Vec<String> {
    let mut reasons = Vec::new();
    if config.vesting_months == 0 {
        reasons.push("vesting period must be at least one month".to_string());
    }
    if config.vesting_months > limits::MAX_VESTING_MONTHS {
        reasons.push(format!(
            "vesting period exceeds {} months",
            limits::MAX_VESTING_MONTHS
        ));
    }
    if config.cliff_months >= config.vesting_months {
        reasons.push("vesting period must be longer than the cliff".to_string());
    }
    reasons
}

pub fn validate_new_contributor(input: NewContributor) -> Validation<NewContributor> {
    let mut reasons = Vec::new();
    let input = NewContributor {
        name: input.name.trim().to_string(),
        email: normalize_optional(input.email),
        ..input
    };

    check_name(&input.name, &mut reasons);
    check_email(input.email.as_deref(), &mut reasons);
    check_non_negative("hourly rate", input.hourly_rate, &mut reasons);
    if let Some(vesting) = &input.vesting {
        reasons.extend(vesting_reasons(vesting));
    }

    Validation::from_reasons(input, reasons)
}

pub fn validate_contributor_update(update: ContributorUpdate) -> Validation<ContributorUpdate> {
    let mut reasons = Vec::new();
    let update = ContributorUpdate {
        name: update.name.map(|n| n.trim().to_string()),
        email: update.email.map(normalize_optional),
        ..update
    };

    if let Some(name) = &update.name {
        check_name(name, &mut reasons);
    }
    if let Some(email) = &update.email {
        check_email(email.as_deref(), &mut reasons);
    }
    if let Some(rate) = update.hourly_rate {
        check_non_negative("hourly rate", rate, &mut reasons);
    }
    if let Some(Some(vesting)) = &update.vesting {
        reasons.extend(vesting_reasons(vesting));
    }

    Validation::from_reasons(update, reasons)
}

fn check_contribution_value(value: f64, reasons: &mut Vec<String>) {
    if !value.is_finite() {
        reasons.push("value must be a finite number".to_string());
    } else if value <= 0.0 {
        reasons.push("value must be greater than zero".to_string());
    }
}

pub fn validate_new_contribution(input: NewContribution) -> Validation<NewContribution> {
    let mut reasons = Vec::new();
    let input = NewContribution {
        description: normalize_optional(input.description),
        ..input
    };

    check_contribution_value(input.value, &mut reasons);
    check_description(input.description.as_deref(), &mut reasons);

    Validation::from_reasons(input, reasons)
}

pub fn validate_contribution_update(
    update: ContributionUpdate,
) -> Validation<ContributionUpdate> {
    let mut reasons = Vec::new();
    let update = ContributionUpdate {
        description: update.description.map(normalize_optional),
        ..update
    };

    if let Some(value) = update.value {
        check_contribution_value(value, &mut reasons);
    }
    if let Some(Some(description)) = &update.description {
        check_description(Some(description), &mut reasons);
    }

    Validation::from_reasons(update, reasons)
}

/// Check valuation inputs.
///
/// Auto mode needs at least the current year's profit; at most
/// [`MAX_PROFIT_YEARS`] consecutive years are accepted.
pub fn validate_valuation(config: ValuationConfig) -> Validation<ValuationConfig> {
    let mut reasons = Vec::new();

    check_non_negative("manual valuation", config.manual_value, &mut reasons);

    if let Some(churn) = config.churn_rate {
        if !churn.is_finite() || !(0.0..=100.0).contains(&churn) {
            reasons.push("churn rate must be between 0 and 100".to_string());
        }
    }

    for (year, profit) in &config.profits {
        check_non_negative(&format!("profit for {}", year), *profit, &mut reasons);
    }

    if config.profits.len() > MAX_PROFIT_YEARS {
        reasons.push(format!(
            "at most {} years of profit history are used",
            MAX_PROFIT_YEARS
        ));
    }
    if let (Some((first, _)), Some((last, _))) =
        (config.profits.first_key_value(), config.profits.last_key_value())
    {
        if (last - first) as usize >= MAX_PROFIT_YEARS {
            reasons.push(format!(
                "profit history must fall within {} consecutive years",
                MAX_PROFIT_YEARS
            ));
        }
    }

    if config.mode == ValuationMode::Auto && config.profits.is_empty() {
        reasons.push("automatic valuation needs at least the current year's profit".to_string());
    }

    Validation::from_reasons(config, reasons)
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(field: &str, input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        SlicePieError::invalid(format!(
            "{} '{}' is not a date (expected YYYY-MM-DD)",
            field, input
        ))
    })
}

pub fn parse_contribution_type(input: &str) -> Result<ContributionType> {
    input.parse().map_err(SlicePieError::invalid)
}

/// Parse `YEAR=PROFIT` pairs such as `2024=100000`.
pub fn parse_profit(input: &str) -> Result<(i32, f64)> {
    let invalid = || SlicePieError::invalid(format!("'{}' is not YEAR=PROFIT", input));
    let (year, profit) = input.split_once('=').ok_or_else(invalid)?;
    let year = year.trim().parse::<i32>().map_err(|_| invalid())?;
    let profit = profit
        .trim()
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| invalid())?;
    Ok((year, profit))
}

/// Clamp a requested list size to `1..=MAX_LIST_LIMIT`.
pub fn list_limit(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(limits::DEFAULT_LIST_LIMIT)
        .clamp(1, limits::MAX_LIST_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn contribution(value: f64) -> NewContribution {
        NewContribution {
            contributor_id: Uuid::new_v4(),
            contribution_type: ContributionType::Cash,
            value,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            description: Some("   ".to_string()),
            created_by: None,
        }
    }

    #[test]
    fn test_contributor_is_normalized() {
        let result = validate_new_contributor(NewContributor {
            name: "  Ada Lovelace ".to_string(),
            email: Some("".to_string()),
            hourly_rate: 120.0,
            ..Default::default()
        });
        let Validation::Valid(input) = result else {
            panic!("expected valid input");
        };
        assert_eq!(input.name, "Ada Lovelace");
        assert!(input.email.is_none());
    }

    #[test]
    fn test_contributor_collects_all_reasons() {
        let result = validate_new_contributor(NewContributor {
            name: " ".to_string(),
            email: Some("nope".to_string()),
            hourly_rate: -1.0,
            vesting: Some(VestingConfig::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                24,
                12,
            )),
            created_by: None,
        });
        assert_eq!(result.reasons().len(), 4);
    }

    #[test]
    fn test_vesting_period_must_exceed_cliff() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let equal = validate_new_contributor(NewContributor {
            name: "Ada".to_string(),
            vesting: Some(VestingConfig::new(start, 12, 12)),
            ..Default::default()
        });
        assert!(!equal.is_valid());
        assert!(equal.reasons()[0].contains("longer than the cliff"));

        assert!(vesting_reasons(&VestingConfig::new(start, 12, 13)).is_empty());
        assert!(vesting_reasons(&VestingConfig::new(start, 0, 1)).is_empty());
    }

    #[test]
    fn test_contribution_value_must_be_positive_and_finite() {
        assert!(validate_new_contribution(contribution(10.0)).is_valid());
        assert!(!validate_new_contribution(contribution(0.0)).is_valid());
        assert!(!validate_new_contribution(contribution(-3.0)).is_valid());
        assert!(!validate_new_contribution(contribution(f64::NAN)).is_valid());
        assert!(!validate_new_contribution(contribution(f64::INFINITY)).is_valid());
    }

    #[test]
    fn test_blank_description_becomes_none() {
        let input = validate_new_contribution(contribution(1.0))
            .into_result()
            .unwrap();
        assert!(input.description.is_none());
    }

    #[test]
    fn test_valuation_rules() {
        let mut config = ValuationConfig {
            mode: ValuationMode::Auto,
            profits: [(2024, 10.0)].into_iter().collect(),
            churn_rate: Some(0.0),
            ..Default::default()
        };
        assert!(validate_valuation(config.clone()).is_valid());

        config.churn_rate = Some(100.5);
        assert!(!validate_valuation(config.clone()).is_valid());

        config.churn_rate = None;
        config.profits.insert(2023, -1.0);
        assert!(!validate_valuation(config.clone()).is_valid());

        config.profits = [(2024, 1.0), (2019, 1.0)].into_iter().collect();
        assert!(!validate_valuation(config.clone()).is_valid());

        config.profits.clear();
        assert!(!validate_valuation(config.clone()).is_valid());

        config.mode = ValuationMode::Manual;
        assert!(validate_valuation(config).is_valid());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(
            parse_date("date", "2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("date", "2023-02-29").is_err());
        assert_eq!(
            parse_contribution_type("non_cash").unwrap(),
            ContributionType::NonCash
        );
        assert!(parse_contribution_type("stock").is_err());
        assert_eq!(parse_profit("2024=100,000").unwrap(), (2024, 100_000.0));
        assert!(parse_profit("2024").is_err());
        assert_eq!(list_limit(None), 50);
        assert_eq!(list_limit(Some(500)), 100);
        assert_eq!(list_limit(Some(0)), 1);
    }
}
