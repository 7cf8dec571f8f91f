mod activity;
mod contribution;
pub(crate) mod contributor;
mod valuation;

pub use activity::{ActivityEvent, ActivityType};
pub use contribution::{Contribution, ContributionType, DeletionState};
pub use contributor::{Contributor, VestingConfig};
pub use valuation::{Confidence, ValuationConfig, ValuationHistoryEntry, ValuationMode};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name used whenever a contribution points at a contributor that no
/// longer exists.
pub const UNKNOWN_CONTRIBUTOR: &str = "Unknown contributor";

/// Base fields shared by contributors and contributions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityBase {
    pub id: Uuid,
    pub sequence_number: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl EntityBase {
    pub fn new(sequence_number: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sequence_number,
            created_at: now,
            updated_at: now,
            created_by: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// The two kinds of record the ledger can delete and restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Contributor,
    Contribution,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Contributor => write!(f, "contributor"),
            EntityKind::Contribution => write!(f, "contribution"),
        }
    }
}

/// Company metadata carried alongside the ledger and in export documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founded: Option<NaiveDate>,
}
