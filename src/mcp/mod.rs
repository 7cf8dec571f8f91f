//! MCP (Model Context Protocol) server implementation for slicepie.
//!
//! Exposes the equity ledger to AI assistants. An assistant can read the
//! current split and draft contributions; `contribution_add` is only called
//! after a person has accepted the draft.

pub mod error;
pub mod resources;
pub mod tools;

use crate::engine::valuation::{self, DISCLAIMER};
use crate::engine::{Ledger, LedgerChange, NewContributor, Purged};
use crate::entity::EntityKind;
use crate::storage::LoroStore;
use error::McpError;
use rmcp::{
    handler::server::wrapper::Parameters,
    model::*,
    service::{RequestContext, RoleServer},
    tool, tool_handler, tool_router, ErrorData as McpErrorData, ServerHandler,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tools::*;
use tracing::{debug, info};

/// Subscription identifier type.
pub type SubscriptionId = String;

/// Manages active resource subscriptions.
#[derive(Debug, Default)]
pub struct SubscriptionState {
    /// Map of resource URI to list of subscription IDs.
    pub by_resource: HashMap<String, Vec<SubscriptionId>>,
    next_id: u64,
}

impl SubscriptionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription for a resource URI.
    pub fn subscribe(&mut self, uri: &str) -> SubscriptionId {
        let id = format!("sub_{}", self.next_id);
        self.next_id += 1;
        self.by_resource
            .entry(uri.to_string())
            .or_default()
            .push(id.clone());
        id
    }

    /// Remove a subscription by ID.
    pub fn unsubscribe(&mut self, id: &str) -> bool {
        for subs in self.by_resource.values_mut() {
            if let Some(pos) = subs.iter().position(|s| s == id) {
                subs.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn get_subscribers(&self, uri: &str) -> Vec<SubscriptionId> {
        self.by_resource.get(uri).cloned().unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.by_resource.clear();
    }
}

/// Store and in-memory ledger, guarded together so every mutation is
/// flushed before the lock is released.
pub struct ServerState {
    pub store: LoroStore,
    pub ledger: Ledger,
}

impl ServerState {
    /// Write pending ledger changes through to disk.
    fn persist(&mut self) -> Result<Vec<LedgerChange>, McpError> {
        Ok(self.store.flush(&mut self.ledger)?)
    }
}

/// The main MCP server for slicepie.
#[derive(Clone)]
pub struct SlicePieServer {
    pub state: Arc<Mutex<ServerState>>,
    pub subscriptions: Arc<Mutex<SubscriptionState>>,
    pub tool_router: rmcp::handler::server::tool::ToolRouter<Self>,
}

/// Server information for MCP initialization.
const SERVER_NAME: &str = "slicepie";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tool_router]
impl SlicePieServer {
    pub fn new(store: LoroStore, ledger: Ledger) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState { store, ledger })),
            subscriptions: Arc::new(Mutex::new(SubscriptionState::new())),
            tool_router: Self::tool_router(),
        }
    }

    /// Start the MCP server on the given transport.
    ///
    /// Runs until the transport is closed or an error occurs.
    pub async fn serve<T, E, A>(
        self,
        transport: T,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        T: rmcp::transport::IntoTransport<RoleServer, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        use rmcp::service::ServiceExt;
        let running = ServiceExt::serve(self, transport)
            .await
            .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
        running
            .waiting()
            .await
            .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
        Ok(())
    }

    /// Flush the ledger sections touched by the last mutation.
    async fn commit(&self, state: &mut ServerState) -> Result<(), McpError> {
        let changes = state.persist()?;
        if !changes.is_empty() {
            debug!(?changes, "ledger flushed");
        }
        Ok(())
    }

    #[tool(description = "Check if the server is running")]
    async fn ping(&self) -> Result<CallToolResult, McpErrorData> {
        Ok(CallToolResult::success(vec![Content::text("pong")]))
    }

    // ========================================================================
    // Contributors
    // ========================================================================

    #[tool(description = "Add a contributor with an hourly rate and optional vesting terms")]
    pub async fn contributor_add(
        &self,
        Parameters(params): Parameters<ContributorAddParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let vesting = vesting_from_params(
            params.vesting_start.as_deref(),
            params.cliff_months,
            params.vesting_months,
        )?;

        let mut state = self.state.lock().await;
        let contributor = state
            .ledger
            .add_contributor(NewContributor {
                name: params.name,
                email: params.email,
                hourly_rate: params.hourly_rate.unwrap_or(0.0),
                vesting,
                created_by: Some("assistant".to_string()),
            })
            .map_err(McpError::from)?
            .clone();
        self.commit(&mut state).await?;

        json_result(&contributor)
    }

    #[tool(description = "List contributors with their current slices and percentage")]
    pub async fn contributor_list(
        &self,
        Parameters(params): Parameters<ContributorListParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let state = self.state.lock().await;
        let mut items = resources::contributor_items(&state.ledger);
        if params.include_deleted.unwrap_or(false) {
            items.extend(
                state
                    .ledger
                    .contributors()
                    .iter()
                    .filter(|c| c.is_deleted())
                    .map(|c| ContributorListItem {
                        contributor: c.clone(),
                        slices: 0.0,
                        percentage: 0.0,
                    }),
            );
        }
        json_result(&items)
    }

    #[tool(description = "Soft-delete a contributor; their active contributions are removed with them")]
    pub async fn contributor_delete(
        &self,
        Parameters(params): Parameters<RecordRefParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let mut state = self.state.lock().await;
        let id = state
            .ledger
            .resolve_contributor(&params.id)
            .map_err(McpError::from)?;
        let event = state.ledger.soft_delete_contributor(&id);
        self.commit(&mut state).await?;
        json_result(&ChangeResult::from(event))
    }

    #[tool(description = "Restore a soft-deleted contributor and the contributions deleted with them")]
    pub async fn contributor_restore(
        &self,
        Parameters(params): Parameters<RecordRefParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let mut state = self.state.lock().await;
        let id = state
            .ledger
            .resolve_contributor(&params.id)
            .map_err(McpError::from)?;
        let event = state.ledger.restore_contributor(&id);
        self.commit(&mut state).await?;
        json_result(&ChangeResult::from(event))
    }

    // ========================================================================
    // Contributions
    // ========================================================================

    #[tool(
        description = "Record a contribution the user has accepted. Takes the suggestion shape {type, value, reasoning, confidence} plus the contributor."
    )]
    pub async fn contribution_add(
        &self,
        Parameters(params): Parameters<ContributionAddParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        parse_contribution_type(&params.contribution_type)?;
        let date = date_or_today("date", params.date.as_deref())?;

        let mut state = self.state.lock().await;
        let contributor_id = state
            .ledger
            .resolve_contributor(&params.contributor_id)
            .map_err(McpError::from)?;
        if state
            .ledger
            .contributor(&contributor_id)
            .is_some_and(|c| c.is_deleted())
        {
            return Err(McpError::ContributorDeleted {
                id: params.contributor_id,
            }
            .into());
        }

        let input = params
            .suggestion()
            .accept(contributor_id, date, params.description.clone())
            .map_err(McpError::from)?;
        let contribution = state
            .ledger
            .add_contribution(input)
            .map_err(McpError::from)?
            .clone();
        self.commit(&mut state).await?;

        info!(id = %contribution.base.id, slices = contribution.slices, "recorded accepted suggestion");
        json_result(&contribution)
    }

    #[tool(description = "List contributions, newest first")]
    pub async fn contribution_list(
        &self,
        Parameters(params): Parameters<ContributionListParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let state = self.state.lock().await;
        let ledger = &state.ledger;
        let owner = params
            .contributor_id
            .as_deref()
            .map(|r| ledger.resolve_contributor(r))
            .transpose()
            .map_err(McpError::from)?;
        let include_deleted = params.include_deleted.unwrap_or(false);

        let mut items: Vec<ContributionListItem> = ledger
            .contributions()
            .iter()
            .filter(|c| owner.map_or(true, |id| c.contributor_id == id))
            .filter(|c| include_deleted || c.is_active())
            .map(|c| ContributionListItem {
                contribution: c.clone(),
                contributor_name: ledger.contributor_name(&c.contributor_id).to_string(),
            })
            .collect();
        items.sort_by(|a, b| {
            b.contribution
                .date
                .cmp(&a.contribution.date)
                .then(b.contribution.base.sequence_number.cmp(&a.contribution.base.sequence_number))
        });
        items.truncate(list_limit(params.limit));

        json_result(&items)
    }

    #[tool(description = "Soft-delete a single contribution")]
    pub async fn contribution_delete(
        &self,
        Parameters(params): Parameters<RecordRefParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let mut state = self.state.lock().await;
        let id = state
            .ledger
            .resolve_contribution(&params.id)
            .map_err(McpError::from)?;
        let event = state.ledger.soft_delete_contribution(&id);
        self.commit(&mut state).await?;
        json_result(&ChangeResult::from(event))
    }

    #[tool(description = "Restore a soft-deleted contribution")]
    pub async fn contribution_restore(
        &self,
        Parameters(params): Parameters<RecordRefParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let mut state = self.state.lock().await;
        let id = state
            .ledger
            .resolve_contribution(&params.id)
            .map_err(McpError::from)?;
        let event = state.ledger.restore_contribution(&id);
        self.commit(&mut state).await?;
        json_result(&ChangeResult::from(event))
    }

    #[tool(
        description = "Permanently delete a contributor (with all their contributions) or a contribution. Requires confirm=true."
    )]
    pub async fn entity_purge(
        &self,
        Parameters(params): Parameters<EntityPurgeParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        if !params.confirm {
            return Err(McpError::ValidationFailed {
                reasons: vec!["purge cannot be undone; pass confirm=true".to_string()],
            }
            .into());
        }

        let mut state = self.state.lock().await;
        let (kind, id) = state
            .ledger
            .resolve_entity(&params.id)
            .map_err(McpError::from)?;
        let purged = state
            .ledger
            .hard_delete(&id)
            .ok_or_else(|| McpError::EntityNotFound {
                id: params.id.clone(),
            })?;
        self.commit(&mut state).await?;

        let result = match purged {
            Purged::Contributor {
                contributor,
                contributions_removed,
            } => json!({
                "entity_type": kind,
                "id": contributor.base.id,
                "name": contributor.name,
                "contributions_removed": contributions_removed,
            }),
            Purged::Contribution(contribution) => json!({
                "entity_type": EntityKind::Contribution,
                "id": contribution.base.id,
                "slices": contribution.slices,
            }),
        };
        json_result(&result)
    }

    // ========================================================================
    // Derived views
    // ========================================================================

    #[tool(description = "Current equity split, optionally with vesting and dollar values")]
    pub async fn equity_summary(
        &self,
        Parameters(params): Parameters<EquitySummaryParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let as_of = parse_optional_date("as_of", params.as_of.as_deref())?;
        let include_value = params.include_value.unwrap_or(false);

        let state = self.state.lock().await;
        let summary = state.ledger.summary();
        let rows = state.ledger.equity_rows(as_of, include_value);

        let mut result = json!({
            "total_slices": summary.total_slices,
            "rows": rows,
            "by_type": state
                .ledger
                .slices_by_type()
                .into_iter()
                .map(|(t, s)| (t.to_string(), s))
                .collect::<HashMap<_, _>>(),
        });
        if include_value {
            result["valuation"] = json!(state.ledger.current_valuation());
            result["disclaimer"] = json!(DISCLAIMER);
        }
        json_result(&result)
    }

    #[tool(description = "Vesting status for a contributor, with an optional forward projection")]
    pub async fn vesting_status(
        &self,
        Parameters(params): Parameters<VestingStatusParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let as_of = date_or_today("as_of", params.as_of.as_deref())?;

        let state = self.state.lock().await;
        let id = state
            .ledger
            .resolve_contributor(&params.contributor_id)
            .map_err(McpError::from)?;
        let status = state
            .ledger
            .vesting_status(&id, as_of)
            .map_err(McpError::from)?;

        let mut result = json!({
            "contributor_id": id,
            "name": state.ledger.contributor_name(&id),
            "status": status,
        });
        if let Some(months) = params.project_months {
            let projection = state
                .ledger
                .vesting_projection(&id, as_of, months, params.step_months.unwrap_or(3))
                .map_err(McpError::from)?;
            result["projection"] = json!(projection);
        }
        json_result(&result)
    }

    #[tool(description = "Estimate a company valuation from profit history and churn without saving it")]
    pub async fn valuation_estimate(
        &self,
        Parameters(params): Parameters<ValuationEstimateParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let profits = profits_map(&params.profits)?;
        let config = crate::validation::validate_valuation(crate::entity::ValuationConfig {
            mode: crate::entity::ValuationMode::Auto,
            profits,
            churn_rate: params.churn_rate,
            ..Default::default()
        })
        .into_result()
        .map_err(McpError::from)?;

        let estimate = valuation::estimate(&config.profits, config.churn_rate);
        json_result(&json!({
            "estimate": estimate,
            "disclaimer": DISCLAIMER,
        }))
    }

    #[tool(description = "Recent delete and restore events, newest first")]
    pub async fn activity_list(
        &self,
        Parameters(params): Parameters<ActivityListParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let state = self.state.lock().await;
        let events = state.ledger.activity().recent(list_limit(params.limit));
        json_result(&events)
    }
}

#[tool_handler]
impl ServerHandler for SlicePieServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(
                "slicepie tracks a dynamic equity split (Slicing Pie). Read \
                 slicepie://suggestion-context before drafting a contribution, \
                 show the draft to the user, and call contribution_add only \
                 after they accept it. Valuations are rough estimates."
                    .to_string(),
            ),
        }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, rmcp::ErrorData>> + Send + '_
    {
        use rmcp::model::AnnotateAble;
        async move {
            Ok(ListResourcesResult {
                resources: resources::build_static_resources()
                    .into_iter()
                    .map(|r| r.no_annotation())
                    .collect(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourceTemplatesResult, rmcp::ErrorData>>
           + Send
           + '_ {
        use rmcp::model::AnnotateAble;
        async move {
            Ok(ListResourceTemplatesResult {
                resource_templates: resources::build_resource_templates()
                    .into_iter()
                    .map(|t| t.no_annotation())
                    .collect(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, rmcp::ErrorData>> + Send + '_
    {
        async move {
            resources::read_resource(&request.uri, &self.state)
                .await
                .map_err(McpErrorData::from)
        }
    }

    fn subscribe(
        &self,
        request: SubscribeRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<(), rmcp::ErrorData>> + Send + '_ {
        async move {
            if !request.uri.starts_with(resources::SLICEPIE_SCHEME) {
                return Err(McpError::InvalidResourceUri { uri: request.uri }.into());
            }

            let mut subscriptions = self.subscriptions.lock().await;
            subscriptions.subscribe(&request.uri);
            Ok(())
        }
    }

    fn unsubscribe(
        &self,
        request: UnsubscribeRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<(), rmcp::ErrorData>> + Send + '_ {
        async move {
            // Subscriptions are not tracked per client, so drop every one for the URI.
            let mut subscriptions = self.subscriptions.lock().await;
            subscriptions.by_resource.remove(&request.uri);
            Ok(())
        }
    }
}

/// Serve over streamable HTTP at `bind` under `/mcp` until Ctrl-C.
pub async fn serve_http(
    server: SlicePieServer,
    bind: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use rmcp::transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
    };
    use tokio_util::sync::CancellationToken;

    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );
    let router = axum::Router::new().nest_service("/mcp", service);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %listener.local_addr()?, "serving MCP over HTTP at /mcp");

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
        }
        trigger.cancel();
    });

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}
