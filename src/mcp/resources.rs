//! MCP resource implementations for slicepie.
//!
//! Static resources expose the ledger's derived views (equity split,
//! contributors, activity, valuation, trash). Templates address a single
//! contributor or the vesting picture at a given date.

use crate::engine::valuation::DISCLAIMER;
use crate::engine::Ledger;
use crate::mcp::error::McpError;
use crate::mcp::tools::{parse_date, ContributionListItem, ContributorListItem};
use crate::mcp::ServerState;
use crate::suggestion::SuggestionContext;
use rmcp::model::{RawResource, RawResourceTemplate, ReadResourceResult, ResourceContents};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The slicepie:// URI scheme prefix.
pub const SLICEPIE_SCHEME: &str = "slicepie://";

/// MIME type for all resource responses.
pub const RESOURCE_MIME_TYPE: &str = "application/json";

/// Recent contributions included in the suggestion context.
const SUGGESTION_CONTEXT_RECENT: usize = 20;

/// Static resource URIs (directly readable without parameters).
pub mod static_resources {
    pub const EQUITY: &str = "slicepie://equity";
    pub const CONTRIBUTORS: &str = "slicepie://contributors";
    pub const ACTIVITY: &str = "slicepie://activity";
    pub const VALUATION: &str = "slicepie://valuation";
    pub const TRASH: &str = "slicepie://trash";
    pub const SUGGESTION_CONTEXT: &str = "slicepie://suggestion-context";
}

/// Resource template URI patterns (require parameter substitution).
pub mod resource_templates {
    pub const CONTRIBUTOR_BY_ID: &str = "slicepie://contributor/{id}";
    pub const VESTING_AT_DATE: &str = "slicepie://vesting/{date}";
}

fn static_resource(uri: &str, name: &str, title: &str, description: &str) -> RawResource {
    RawResource {
        uri: uri.to_string(),
        name: name.to_string(),
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        mime_type: Some(RESOURCE_MIME_TYPE.to_string()),
        size: None,
        icons: None,
        meta: None,
    }
}

/// Build the list of static resources.
pub fn build_static_resources() -> Vec<RawResource> {
    vec![
        static_resource(
            static_resources::EQUITY,
            "Equity",
            "Equity Split",
            "Slices and percentage ownership per active contributor",
        ),
        static_resource(
            static_resources::CONTRIBUTORS,
            "Contributors",
            "Contributors",
            "Active contributors with their current share",
        ),
        static_resource(
            static_resources::ACTIVITY,
            "Activity",
            "Delete/Restore Activity",
            "Most recent delete and restore events, newest first",
        ),
        static_resource(
            static_resources::VALUATION,
            "Valuation",
            "Company Valuation",
            "Valuation in force, its inputs, and saved history",
        ),
        static_resource(
            static_resources::TRASH,
            "Trash",
            "Soft-deleted Records",
            "Contributors and contributions that can still be restored",
        ),
        static_resource(
            static_resources::SUGGESTION_CONTEXT,
            "Suggestion Context",
            "Context for Drafting Contributions",
            "Company, contributors, current split and recent contributions",
        ),
    ]
}

/// Build the list of resource templates (dynamic resources with URI parameters).
pub fn build_resource_templates() -> Vec<RawResourceTemplate> {
    vec![
        RawResourceTemplate {
            uri_template: resource_templates::CONTRIBUTOR_BY_ID.to_string(),
            name: "Contributor by ID".to_string(),
            title: Some("Single Contributor".to_string()),
            description: Some(
                "A contributor with their contributions, share and vesting".to_string(),
            ),
            mime_type: Some(RESOURCE_MIME_TYPE.to_string()),
            icons: None,
        },
        RawResourceTemplate {
            uri_template: resource_templates::VESTING_AT_DATE.to_string(),
            name: "Vesting at Date".to_string(),
            title: Some("Vesting on Date".to_string()),
            description: Some(
                "Vested and unvested slices for every active contributor at a date".to_string(),
            ),
            mime_type: Some(RESOURCE_MIME_TYPE.to_string()),
            icons: None,
        },
    ]
}

/// Parse a resource URI and return the content.
pub async fn read_resource(
    uri: &str,
    state: &Arc<Mutex<ServerState>>,
) -> Result<ReadResourceResult, McpError> {
    let path = uri
        .strip_prefix(SLICEPIE_SCHEME)
        .ok_or_else(|| McpError::InvalidResourceUri {
            uri: uri.to_string(),
        })?;

    let state = state.lock().await;
    let ledger = &state.ledger;

    match path {
        "equity" => text_resource(uri, &ledger.summary()),
        "contributors" => text_resource(uri, &contributor_items(ledger)),
        "activity" => text_resource(uri, &ledger.activity().to_vec()),
        "valuation" => text_resource(
            uri,
            &json!({
                "current": ledger.current_valuation(),
                "config": ledger.valuation_config(),
                "history": ledger.valuation_history(),
                "disclaimer": DISCLAIMER,
            }),
        ),
        "trash" => text_resource(uri, &ledger.trash()),
        "suggestion-context" => text_resource(
            uri,
            &SuggestionContext::from_ledger(ledger, SUGGESTION_CONTEXT_RECENT),
        ),
        _ => {
            if let Some(id) = path.strip_prefix("contributor/") {
                return read_contributor_resource(uri, ledger, id);
            }
            if let Some(date) = path.strip_prefix("vesting/") {
                return read_vesting_resource(uri, ledger, date);
            }

            Err(McpError::ResourceNotFound {
                uri: uri.to_string(),
            })
        }
    }
}

fn text_resource<T: Serialize + ?Sized>(
    uri: &str,
    value: &T,
) -> Result<ReadResourceResult, McpError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| McpError::InternalError {
        message: format!("Failed to serialize resource: {}", e),
    })?;

    Ok(ReadResourceResult {
        contents: vec![ResourceContents::TextResourceContents {
            uri: uri.to_string(),
            mime_type: Some(RESOURCE_MIME_TYPE.to_string()),
            text,
            meta: None,
        }],
    })
}

pub(crate) fn contributor_items(ledger: &Ledger) -> Vec<ContributorListItem> {
    let summary = ledger.summary();
    ledger
        .active_contributors()
        .map(|c| {
            let share = summary.get(&c.base.id);
            ContributorListItem {
                contributor: c.clone(),
                slices: share.map(|s| s.slices).unwrap_or(0.0),
                percentage: share.map(|s| s.percentage).unwrap_or(0.0),
            }
        })
        .collect()
}

fn read_contributor_resource(
    uri: &str,
    ledger: &Ledger,
    reference: &str,
) -> Result<ReadResourceResult, McpError> {
    let id = ledger.resolve_contributor(reference)?;
    let contributor = ledger
        .contributor(&id)
        .ok_or_else(|| McpError::ContributorNotFound {
            id: reference.to_string(),
        })?;
    let summary = ledger.summary();
    let share = summary.get(&id);
    let today = chrono::Local::now().date_naive();

    let contributions: Vec<ContributionListItem> = ledger
        .contributions_of(&id)
        .map(|c| ContributionListItem {
            contribution: c.clone(),
            contributor_name: contributor.name.clone(),
        })
        .collect();

    text_resource(
        uri,
        &json!({
            "contributor": contributor,
            "slices": share.map(|s| s.slices).unwrap_or(0.0),
            "percentage": share.map(|s| s.percentage).unwrap_or(0.0),
            "vesting": ledger.vesting_status(&id, today)?,
            "contributions": contributions,
        }),
    )
}

fn read_vesting_resource(
    uri: &str,
    ledger: &Ledger,
    date: &str,
) -> Result<ReadResourceResult, McpError> {
    let as_of = parse_date("date", date)?;
    let mut entries = Vec::new();
    for contributor in ledger.active_contributors() {
        let status = ledger.vesting_status(&contributor.base.id, as_of)?;
        entries.push(json!({
            "contributor_id": contributor.base.id,
            "name": contributor.name,
            "status": status,
        }));
    }

    text_resource(uri, &json!({ "as_of": as_of, "contributors": entries }))
}
