//! MCP tool types and helpers for slicepie.
//!
//! This module contains parameter types, result types, and parsing helpers
//! for MCP tools. The actual tool implementations are in mod.rs within the
//! #[tool_router] impl block.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData as McpErrorData;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::engine::valuation::MAX_PROFIT_YEARS;
use crate::entity::{ActivityEvent, Contribution, ContributionType, Contributor, VestingConfig};
use crate::mcp::error::{valid_contribution_types, McpError};
use crate::suggestion::ContributionSuggestion;
use crate::validation;

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for contributor_add tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContributorAddParams {
    /// Contributor name (1-200 characters)
    pub name: String,
    /// Optional email address
    pub email: Option<String>,
    /// Hourly rate in dollars used for time contributions (default 0)
    pub hourly_rate: Option<f64>,
    /// Vesting start date (YYYY-MM-DD); omit for no vesting
    pub vesting_start: Option<String>,
    /// Cliff length in months (default 12)
    pub cliff_months: Option<u32>,
    /// Total vesting period in months, cliff included (default 48)
    pub vesting_months: Option<u32>,
}

/// Parameters for contributor_list tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ContributorListParams {
    /// Include soft-deleted contributors
    pub include_deleted: Option<bool>,
}

/// Parameters for tools addressing a single record
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecordRefParams {
    /// Sequence number like "2", full UUID, or UUID prefix (at least 4 characters)
    pub id: String,
}

/// Parameters for contribution_add tool
///
/// Mirrors the suggestion shape an assistant drafts, plus where it belongs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContributionAddParams {
    /// Contributor the contribution belongs to (sequence number or UUID prefix)
    pub contributor_id: String,
    /// Contribution type: time, cash, non-cash, idea, or relationship
    #[serde(rename = "type")]
    pub contribution_type: String,
    /// Hours for time, dollars for every other type
    pub value: f64,
    /// Why this entry is proposed; used as the description when none is given
    pub reasoning: Option<String>,
    /// Assistant confidence: low, medium, or high
    pub confidence: Option<String>,
    /// Date of the contribution (YYYY-MM-DD, default today)
    pub date: Option<String>,
    /// Optional description overriding the reasoning
    pub description: Option<String>,
}

impl ContributionAddParams {
    pub fn suggestion(&self) -> ContributionSuggestion {
        ContributionSuggestion {
            contribution_type: self.contribution_type.clone(),
            value: self.value,
            reasoning: self.reasoning.clone().unwrap_or_default(),
            confidence: self.confidence.clone(),
        }
    }
}

/// Parameters for contribution_list tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ContributionListParams {
    /// Only this contributor's contributions
    pub contributor_id: Option<String>,
    /// Include soft-deleted contributions
    pub include_deleted: Option<bool>,
    /// Maximum results (default 50, max 100)
    pub limit: Option<usize>,
}

/// Parameters for entity_purge tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntityPurgeParams {
    /// UUID or UUID prefix of a contributor or contribution
    pub id: String,
    /// Must be true; purging cannot be undone
    pub confirm: bool,
}

/// Parameters for equity_summary tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EquitySummaryParams {
    /// Split slices into vested/unvested at this date (YYYY-MM-DD)
    pub as_of: Option<String>,
    /// Attach dollar values at the current valuation
    pub include_value: Option<bool>,
}

/// Parameters for vesting_status tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VestingStatusParams {
    /// Contributor (sequence number or UUID prefix)
    pub contributor_id: String,
    /// Evaluation date (YYYY-MM-DD, default today)
    pub as_of: Option<String>,
    /// Project the schedule this many months forward
    pub project_months: Option<u32>,
    /// Months between projection points (default 3)
    pub step_months: Option<u32>,
}

/// One year of profit history
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProfitYear {
    pub year: i32,
    /// Net profit in dollars (non-negative)
    pub profit: f64,
}

/// Parameters for valuation_estimate tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValuationEstimateParams {
    /// Up to five years of profit history
    pub profits: Vec<ProfitYear>,
    /// Annual churn rate in percent (0-100)
    pub churn_rate: Option<f64>,
}

/// Parameters for activity_list tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ActivityListParams {
    /// Maximum events (default 50, max 100)
    pub limit: Option<usize>,
}

// ============================================================================
// Result Types
// ============================================================================

/// Contributor with its current share.
#[derive(Debug, Clone, Serialize)]
pub struct ContributorListItem {
    #[serde(flatten)]
    pub contributor: Contributor,
    pub slices: f64,
    pub percentage: f64,
}

/// Contribution with its owner's display name.
#[derive(Debug, Clone, Serialize)]
pub struct ContributionListItem {
    #[serde(flatten)]
    pub contribution: Contribution,
    pub contributor_name: String,
}

/// Outcome of a delete or restore.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeResult {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<ActivityEvent>,
}

impl From<Option<ActivityEvent>> for ChangeResult {
    fn from(event: Option<ActivityEvent>) -> Self {
        Self {
            changed: event.is_some(),
            event,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Serialize a value as pretty JSON text content.
pub fn json_result<T: Serialize + ?Sized>(value: &T) -> Result<CallToolResult, McpErrorData> {
    let text = serde_json::to_string_pretty(value).map_err(|e| McpError::InternalError {
        message: format!("Failed to serialize result: {}", e),
    })?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, McpError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| McpError::InvalidDateFormat {
        field: field.to_string(),
        value: value.to_string(),
    })
}

pub fn parse_optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, McpError> {
    value.map(|v| parse_date(field, v)).transpose()
}

/// Date argument defaulting to today.
pub fn date_or_today(field: &str, value: Option<&str>) -> Result<NaiveDate, McpError> {
    Ok(parse_optional_date(field, value)?.unwrap_or_else(|| chrono::Local::now().date_naive()))
}

pub fn parse_contribution_type(value: &str) -> Result<ContributionType, McpError> {
    value
        .parse()
        .map_err(|_| McpError::ContributionTypeInvalid {
            provided: value.to_string(),
            valid: valid_contribution_types(),
        })
}

/// Build vesting terms from tool arguments, applying the 12/48 month defaults.
pub fn vesting_from_params(
    start: Option<&str>,
    cliff_months: Option<u32>,
    vesting_months: Option<u32>,
) -> Result<Option<VestingConfig>, McpError> {
    match start {
        Some(start) => {
            let start = parse_date("vesting_start", start)?;
            Ok(Some(VestingConfig::new(
                start,
                cliff_months.unwrap_or(12),
                vesting_months.unwrap_or(48),
            )))
        }
        None if cliff_months.is_some() || vesting_months.is_some() => {
            Err(McpError::ValidationFailed {
                reasons: vec!["vesting_start is required when vesting terms are given".into()],
            })
        }
        None => Ok(None),
    }
}

/// Collect profit history, rejecting duplicate years and oversize inputs.
pub fn profits_map(profits: &[ProfitYear]) -> Result<BTreeMap<i32, f64>, McpError> {
    let mut reasons = Vec::new();
    if profits.is_empty() {
        reasons.push("at least one year of profit is required".to_string());
    }
    if profits.len() > MAX_PROFIT_YEARS {
        reasons.push(format!(
            "at most {} years of profit history are allowed",
            MAX_PROFIT_YEARS
        ));
    }

    let mut map = BTreeMap::new();
    for p in profits {
        if map.insert(p.year, p.profit).is_some() {
            reasons.push(format!("year {} listed more than once", p.year));
        }
    }

    if reasons.is_empty() {
        Ok(map)
    } else {
        Err(McpError::ValidationFailed { reasons })
    }
}

pub fn list_limit(limit: Option<usize>) -> usize {
    validation::list_limit(limit)
}
