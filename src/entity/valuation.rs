use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValuationMode {
    #[default]
    Manual,
    Auto,
}

impl std::fmt::Display for ValuationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValuationMode::Manual => write!(f, "manual"),
            ValuationMode::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for ValuationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(ValuationMode::Manual),
            "auto" => Ok(ValuationMode::Auto),
            _ => Err(format!("Invalid valuation mode: {}", s)),
        }
    }
}

/// How much an estimated valuation can be trusted, based on input completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            _ => Err(format!("Invalid confidence: {}", s)),
        }
    }
}

/// Business metrics and the chosen valuation mode.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValuationConfig {
    #[serde(default)]
    pub mode: ValuationMode,
    #[serde(default)]
    pub manual_value: f64,
    /// Year -> profit, at most five years.
    #[serde(default)]
    pub profits: BTreeMap<i32, f64>,
    /// Annual churn percentage in [0, 100].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub churn_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Snapshot appended each time the valuation is explicitly saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationHistoryEntry {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub mode: ValuationMode,
    pub valuation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}
