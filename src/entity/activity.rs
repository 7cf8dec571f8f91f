use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Deleted,
    Restored,
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityType::Deleted => write!(f, "deleted"),
            ActivityType::Restored => write!(f, "restored"),
        }
    }
}

/// Audit record of a delete or restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub event_type: ActivityType,
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
    /// Snapshot of the name at event time; the entity may be purged later.
    pub entity_name: String,
    pub timestamp: DateTime<Utc>,
    pub slices_affected: f64,
    /// Contributions touched by a contributor-level cascade (0 otherwise).
    #[serde(default)]
    pub cascade_count: usize,
}

impl ActivityEvent {
    pub fn new(
        event_type: ActivityType,
        entity_type: EntityKind,
        entity_id: Uuid,
        entity_name: String,
        slices_affected: f64,
        cascade_count: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            entity_type,
            entity_id,
            entity_name,
            timestamp: Utc::now(),
            slices_affected,
            cascade_count,
        }
    }
}
