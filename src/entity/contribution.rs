use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EntityBase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContributionType {
    Time,
    Cash,
    NonCash,
    Idea,
    Relationship,
}

impl ContributionType {
    pub const ALL: [ContributionType; 5] = [
        ContributionType::Time,
        ContributionType::Cash,
        ContributionType::NonCash,
        ContributionType::Idea,
        ContributionType::Relationship,
    ];

    /// Unit the raw value is expressed in.
    pub fn unit(&self) -> &'static str {
        match self {
            ContributionType::Time => "hours",
            _ => "dollars",
        }
    }
}

impl std::fmt::Display for ContributionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContributionType::Time => write!(f, "time"),
            ContributionType::Cash => write!(f, "cash"),
            ContributionType::NonCash => write!(f, "non-cash"),
            ContributionType::Idea => write!(f, "idea"),
            ContributionType::Relationship => write!(f, "relationship"),
        }
    }
}

impl std::str::FromStr for ContributionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "time" => Ok(ContributionType::Time),
            "cash" => Ok(ContributionType::Cash),
            "non-cash" | "noncash" => Ok(ContributionType::NonCash),
            "idea" => Ok(ContributionType::Idea),
            "relationship" => Ok(ContributionType::Relationship),
            _ => Err(format!("Invalid contribution type: {}", s)),
        }
    }
}

/// Soft-deletion status of a contribution.
///
/// A cascade deletion is a distinct variant carrying the parent id, so a
/// contribution deleted on its own can never be mistaken for one that went
/// away with its contributor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeletionState {
    #[default]
    Active,
    Deleted {
        deleted_at: DateTime<Utc>,
    },
    DeletedWithParent {
        deleted_at: DateTime<Utc>,
        deleted_with_parent: Uuid,
    },
}

impl DeletionState {
    pub fn is_active(&self) -> bool {
        matches!(self, DeletionState::Active)
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            DeletionState::Active => None,
            DeletionState::Deleted { deleted_at }
            | DeletionState::DeletedWithParent { deleted_at, .. } => Some(*deleted_at),
        }
    }

    /// Id of the contributor whose deletion cascaded onto this record.
    pub fn deleted_with_parent(&self) -> Option<Uuid> {
        match self {
            DeletionState::DeletedWithParent {
                deleted_with_parent,
                ..
            } => Some(*deleted_with_parent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    #[serde(flatten)]
    pub base: EntityBase,
    pub contributor_id: Uuid,
    #[serde(rename = "type")]
    pub contribution_type: ContributionType,
    /// Hours for `time`, dollars for everything else.
    pub value: f64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Recorded at creation; never recomputed when the contributor's rate changes.
    pub multiplier: f64,
    pub slices: f64,
    #[serde(flatten)]
    pub deletion: DeletionState,
}

impl Contribution {
    pub fn is_active(&self) -> bool {
        self.deletion.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contribution_type_parse_and_display() {
        for ty in ContributionType::ALL {
            let parsed: ContributionType = ty.to_string().parse().unwrap();
            assert_eq!(parsed, ty);
        }
        assert_eq!(
            "non_cash".parse::<ContributionType>().unwrap(),
            ContributionType::NonCash
        );
        assert!("equipment".parse::<ContributionType>().is_err());
    }

    #[test]
    fn test_contribution_type_serializes_kebab_case() {
        let json = serde_json::to_string(&ContributionType::NonCash).unwrap();
        assert_eq!(json, "\"non-cash\"");
    }

    #[test]
    fn test_deletion_state_serialization() {
        let parent = Uuid::new_v4();
        let state = DeletionState::DeletedWithParent {
            deleted_at: Utc::now(),
            deleted_with_parent: parent,
        };
        let value = serde_json::to_value(state).unwrap();
        assert_eq!(value["state"], "deleted_with_parent");
        assert_eq!(value["deleted_with_parent"], parent.to_string());

        let back: DeletionState = serde_json::from_value(value).unwrap();
        assert_eq!(back.deleted_with_parent(), Some(parent));
        assert!(!back.is_active());
    }

    #[test]
    fn test_direct_deletion_has_no_parent() {
        let state = DeletionState::Deleted {
            deleted_at: Utc::now(),
        };
        assert!(state.deleted_at().is_some());
        assert_eq!(state.deleted_with_parent(), None);
        assert_eq!(DeletionState::Active.deleted_at(), None);
    }
}
