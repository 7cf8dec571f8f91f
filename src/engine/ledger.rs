//! In-memory state store for contributors, contributions and valuation.
//!
//! Every mutation goes through a `Ledger` method, completes synchronously and
//! records which persisted keys it touched. The storage layer drains those
//! notifications with [`Ledger::take_changes`] and decides when to write.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::activity::{ActivityLog, DEFAULT_ACTIVITY_LIMIT};
use crate::engine::equity::{self, EquityRow, EquitySummary};
use crate::engine::valuation::{self, CompanyValuation};
use crate::engine::vesting::{self, VestingPoint, VestingStatus};
use crate::engine::slices;
use crate::entity::{
    ActivityEvent, ActivityType, Company, Contribution, ContributionType, Contributor,
    DeletionState, EntityBase, EntityKind, ValuationConfig, ValuationHistoryEntry, VestingConfig,
    UNKNOWN_CONTRIBUTOR,
};
use crate::error::{Result, SlicePieError};
use crate::transfer::ExportDocument;
use crate::validation::{self, limits::MIN_ID_PREFIX_LENGTH};

pub const DEFAULT_VALUATION_HISTORY_LIMIT: usize = 20;

/// A persisted key whose contents changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerChange {
    Company,
    Contributors,
    Contributions,
    Activity,
    Valuation,
    ValuationHistory,
}

impl LedgerChange {
    pub const ALL: [LedgerChange; 6] = [
        LedgerChange::Company,
        LedgerChange::Contributors,
        LedgerChange::Contributions,
        LedgerChange::Activity,
        LedgerChange::Valuation,
        LedgerChange::ValuationHistory,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            LedgerChange::Company => "company",
            LedgerChange::Contributors => "contributors",
            LedgerChange::Contributions => "contributions",
            LedgerChange::Activity => "activity",
            LedgerChange::Valuation => "valuation",
            LedgerChange::ValuationHistory => "valuation_history",
        }
    }
}

/// Input for a new contributor
#[derive(Debug, Clone, Default)]
pub struct NewContributor {
    pub name: String,
    pub email: Option<String>,
    pub hourly_rate: f64,
    pub vesting: Option<VestingConfig>,
    pub created_by: Option<String>,
}

/// Update payload for a contributor
#[derive(Debug, Clone, Default)]
pub struct ContributorUpdate {
    pub name: Option<String>,
    pub email: Option<Option<String>>, // Some(None) to clear
    pub hourly_rate: Option<f64>,
    pub active: Option<bool>,
    pub vesting: Option<Option<VestingConfig>>, // Some(None) to remove vesting
}

/// Input for a new contribution
#[derive(Debug, Clone)]
pub struct NewContribution {
    pub contributor_id: Uuid,
    pub contribution_type: ContributionType,
    pub value: f64,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub created_by: Option<String>,
}

/// Update payload for a contribution
#[derive(Debug, Clone, Default)]
pub struct ContributionUpdate {
    pub contribution_type: Option<ContributionType>,
    pub value: Option<f64>,
    pub date: Option<NaiveDate>,
    pub description: Option<Option<String>>,
}

/// What a hard delete removed.
#[derive(Debug, Clone)]
pub enum Purged {
    Contributor {
        contributor: Contributor,
        contributions_removed: usize,
    },
    Contribution(Contribution),
}

#[derive(Debug, Clone, Serialize)]
pub struct TrashedContribution {
    #[serde(flatten)]
    pub contribution: Contribution,
    pub contributor_name: String,
    /// Deleted together with its contributor rather than on its own.
    pub cascaded: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Trash {
    pub contributors: Vec<Contributor>,
    pub contributions: Vec<TrashedContribution>,
}

impl Trash {
    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty() && self.contributions.is_empty()
    }
}

/// Everything the ledger persists, in storable form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub company: Company,
    pub contributors: Vec<Contributor>,
    pub contributions: Vec<Contribution>,
    /// Newest first.
    pub activity: Vec<ActivityEvent>,
    pub valuation: ValuationConfig,
    /// Newest first.
    pub valuation_history: Vec<ValuationHistoryEntry>,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    company: Company,
    contributors: Vec<Contributor>,
    contributions: Vec<Contribution>,
    activity: ActivityLog,
    valuation: ValuationConfig,
    valuation_history: Vec<ValuationHistoryEntry>,
    valuation_history_limit: usize,
    changes: Vec<LedgerChange>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_ACTIVITY_LIMIT, DEFAULT_VALUATION_HISTORY_LIMIT)
    }

    pub fn with_limits(activity_limit: usize, valuation_history_limit: usize) -> Self {
        Self {
            company: Company::default(),
            contributors: Vec::new(),
            contributions: Vec::new(),
            activity: ActivityLog::new(activity_limit),
            valuation: ValuationConfig::default(),
            valuation_history: Vec::new(),
            valuation_history_limit: valuation_history_limit.max(1),
            changes: Vec::new(),
        }
    }

    pub fn from_snapshot(
        snapshot: LedgerSnapshot,
        activity_limit: usize,
        valuation_history_limit: usize,
    ) -> Self {
        let mut ledger = Self::with_limits(activity_limit, valuation_history_limit);
        ledger.company = snapshot.company;
        ledger.contributors = snapshot.contributors;
        ledger.contributions = snapshot.contributions;
        ledger.activity = ActivityLog::from_events(snapshot.activity, activity_limit);
        ledger.valuation = snapshot.valuation;
        ledger.valuation_history = snapshot.valuation_history;
        ledger
            .valuation_history
            .truncate(ledger.valuation_history_limit);
        ledger
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            company: self.company.clone(),
            contributors: self.contributors.clone(),
            contributions: self.contributions.clone(),
            activity: self.activity.to_vec(),
            valuation: self.valuation.clone(),
            valuation_history: self.valuation_history.clone(),
        }
    }

    // ========================================================================
    // Change notifications
    // ========================================================================

    fn mark(&mut self, change: LedgerChange) {
        if !self.changes.contains(&change) {
            self.changes.push(change);
        }
    }

    /// Drain the keys touched since the last call.
    pub fn take_changes(&mut self) -> Vec<LedgerChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    // ========================================================================
    // Read access
    // ========================================================================

    pub fn company(&self) -> &Company {
        &self.company
    }

    /// All contributors, deleted ones included.
    pub fn contributors(&self) -> &[Contributor] {
        &self.contributors
    }

    /// All contributions, deleted ones included.
    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    pub fn active_contributors(&self) -> impl Iterator<Item = &Contributor> {
        self.contributors.iter().filter(|c| !c.is_deleted())
    }

    /// Contributions that currently count towards equity.
    pub fn active_contributions(&self) -> impl Iterator<Item = &Contribution> {
        equity::counted_contributions(&self.contributors, &self.contributions)
    }

    pub fn contributions_of(&self, contributor_id: &Uuid) -> impl Iterator<Item = &Contribution> {
        let id = *contributor_id;
        self.contributions
            .iter()
            .filter(move |c| c.contributor_id == id)
    }

    pub fn contributor(&self, id: &Uuid) -> Option<&Contributor> {
        self.contributors.iter().find(|c| &c.base.id == id)
    }

    pub fn contribution(&self, id: &Uuid) -> Option<&Contribution> {
        self.contributions.iter().find(|c| &c.base.id == id)
    }

    /// Name for display; dangling references read as "Unknown contributor".
    pub fn contributor_name(&self, id: &Uuid) -> &str {
        self.contributor(id)
            .map(|c| c.name.as_str())
            .unwrap_or(UNKNOWN_CONTRIBUTOR)
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn valuation_config(&self) -> &ValuationConfig {
        &self.valuation
    }

    /// Saved valuation snapshots, newest first.
    pub fn valuation_history(&self) -> &[ValuationHistoryEntry] {
        &self.valuation_history
    }

    fn contribution_label(&self, contribution: &Contribution) -> String {
        match &contribution.description {
            Some(description) => description.clone(),
            None => format!(
                "{} contribution by {}",
                contribution.contribution_type,
                self.contributor_name(&contribution.contributor_id)
            ),
        }
    }

    // ========================================================================
    // Reference resolution
    // ========================================================================

    /// Find a contributor by sequence number, full UUID or UUID prefix.
    pub fn resolve_contributor(&self, reference: &str) -> Result<Uuid> {
        resolve_reference(
            self.contributors
                .iter()
                .map(|c| (c.base.id, c.base.sequence_number)),
            reference,
        )?
        .ok_or_else(|| SlicePieError::ContributorNotFound(reference.to_string()))
    }

    /// Find a contribution by sequence number, full UUID or UUID prefix.
    pub fn resolve_contribution(&self, reference: &str) -> Result<Uuid> {
        resolve_reference(
            self.contributions
                .iter()
                .map(|c| (c.base.id, c.base.sequence_number)),
            reference,
        )?
        .ok_or_else(|| SlicePieError::ContributionNotFound(reference.to_string()))
    }

    /// Find any record by full UUID or UUID prefix.
    pub fn resolve_entity(&self, reference: &str) -> Result<(EntityKind, Uuid)> {
        if reference.chars().all(|c| c.is_ascii_digit()) {
            return Err(SlicePieError::invalid(format!(
                "'{}' is ambiguous; use a UUID prefix or the contributor/contribution commands",
                reference
            )));
        }
        let contributor = resolve_reference(
            self.contributors
                .iter()
                .map(|c| (c.base.id, c.base.sequence_number)),
            reference,
        )?;
        let contribution = resolve_reference(
            self.contributions
                .iter()
                .map(|c| (c.base.id, c.base.sequence_number)),
            reference,
        )?;
        match (contributor, contribution) {
            (Some(id), None) => Ok((EntityKind::Contributor, id)),
            (None, Some(id)) => Ok((EntityKind::Contribution, id)),
            (Some(_), Some(_)) => Err(SlicePieError::invalid(format!(
                "id prefix '{}' matches both a contributor and a contribution",
                reference
            ))),
            (None, None) => Err(SlicePieError::EntityNotFound(reference.to_string())),
        }
    }

    fn next_contributor_sequence(&self) -> u32 {
        self.contributors
            .iter()
            .map(|c| c.base.sequence_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn next_contribution_sequence(&self) -> u32 {
        self.contributions
            .iter()
            .map(|c| c.base.sequence_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    // ========================================================================
    // Company
    // ========================================================================

    pub fn set_company(&mut self, company: Company) {
        self.company = company;
        self.mark(LedgerChange::Company);
    }

    // ========================================================================
    // Contributors
    // ========================================================================

    pub fn add_contributor(&mut self, input: NewContributor) -> Result<&Contributor> {
        let input = validation::validate_new_contributor(input).into_result()?;

        let mut contributor = Contributor::new(
            input.name,
            input.hourly_rate,
            self.next_contributor_sequence(),
        );
        contributor.email = input.email;
        contributor.vesting = input.vesting;
        contributor.base.created_by = input.created_by;

        debug!(id = %contributor.base.id, name = %contributor.name, "added contributor");
        let index = self.contributors.len();
        self.contributors.push(contributor);
        self.mark(LedgerChange::Contributors);
        Ok(&self.contributors[index])
    }

    /// Apply an update. A new hourly rate only affects future `time` entries.
    pub fn update_contributor(
        &mut self,
        id: &Uuid,
        update: ContributorUpdate,
    ) -> Result<&Contributor> {
        let index = self
            .contributors
            .iter()
            .position(|c| &c.base.id == id)
            .ok_or_else(|| SlicePieError::ContributorNotFound(id.to_string()))?;
        let update = validation::validate_contributor_update(update).into_result()?;

        let contributor = &mut self.contributors[index];
        if let Some(name) = update.name {
            contributor.name = name;
        }
        if let Some(email) = update.email {
            contributor.email = email;
        }
        if let Some(rate) = update.hourly_rate {
            contributor.hourly_rate = rate;
        }
        if let Some(active) = update.active {
            contributor.active = active;
        }
        if let Some(vesting) = update.vesting {
            contributor.vesting = vesting;
        }
        contributor.base.touch();

        self.mark(LedgerChange::Contributors);
        Ok(&self.contributors[index])
    }

    pub fn set_vesting(
        &mut self,
        id: &Uuid,
        vesting: Option<VestingConfig>,
    ) -> Result<&Contributor> {
        self.update_contributor(
            id,
            ContributorUpdate {
                vesting: Some(vesting),
                ..Default::default()
            },
        )
    }

    // ========================================================================
    // Contributions
    // ========================================================================

    /// Record a contribution, computing and storing its slices.
    ///
    /// The owner must exist and not be deleted.
    pub fn add_contribution(&mut self, input: NewContribution) -> Result<&Contribution> {
        let input = validation::validate_new_contribution(input).into_result()?;

        let owner = self
            .contributors
            .iter()
            .find(|c| c.base.id == input.contributor_id && !c.is_deleted())
            .ok_or_else(|| SlicePieError::ContributorNotFound(input.contributor_id.to_string()))?;

        let multiplier = slices::multiplier(input.contribution_type);
        let slices = slices::slices(input.contribution_type, input.value, Some(owner.hourly_rate));

        let mut base = EntityBase::new(self.next_contribution_sequence());
        base.created_by = input.created_by;

        let contribution = Contribution {
            base,
            contributor_id: input.contributor_id,
            contribution_type: input.contribution_type,
            value: input.value,
            date: input.date,
            description: input.description,
            multiplier,
            slices,
            deletion: DeletionState::Active,
        };

        debug!(
            id = %contribution.base.id,
            contributor = %contribution.contributor_id,
            slices = contribution.slices,
            "added contribution"
        );
        let index = self.contributions.len();
        self.contributions.push(contribution);
        self.mark(LedgerChange::Contributions);
        Ok(&self.contributions[index])
    }

    /// Edit an active contribution.
    ///
    /// Changing the type or value recomputes this record's slices. A `time`
    /// entry keeps the hourly rate it was recorded with.
    pub fn update_contribution(
        &mut self,
        id: &Uuid,
        update: ContributionUpdate,
    ) -> Result<&Contribution> {
        let index = self
            .contributions
            .iter()
            .position(|c| &c.base.id == id)
            .ok_or_else(|| SlicePieError::ContributionNotFound(id.to_string()))?;
        if !self.contributions[index].is_active() {
            return Err(SlicePieError::invalid(
                "deleted contributions cannot be edited; restore it first",
            ));
        }
        let update = validation::validate_contribution_update(update).into_result()?;

        let current_rate = self
            .contributor(&self.contributions[index].contributor_id)
            .map(|c| c.hourly_rate);

        let contribution = &mut self.contributions[index];
        let recorded_rate = match contribution.contribution_type {
            ContributionType::Time if contribution.value > 0.0 => {
                Some(contribution.slices / (contribution.value * slices::TIME_MULTIPLIER))
            }
            _ => current_rate,
        };

        let reprice = update.contribution_type.is_some() || update.value.is_some();
        if let Some(ty) = update.contribution_type {
            contribution.contribution_type = ty;
        }
        if let Some(value) = update.value {
            contribution.value = value;
        }
        if let Some(date) = update.date {
            contribution.date = date;
        }
        if let Some(description) = update.description {
            contribution.description = description;
        }
        if reprice {
            contribution.multiplier = slices::multiplier(contribution.contribution_type);
            contribution.slices = slices::slices(
                contribution.contribution_type,
                contribution.value,
                recorded_rate,
            );
        }
        contribution.base.touch();

        self.mark(LedgerChange::Contributions);
        Ok(&self.contributions[index])
    }

    // ========================================================================
    // Soft delete / restore
    // ========================================================================

    fn record(&mut self, event: ActivityEvent) -> ActivityEvent {
        self.activity.record(event.clone());
        self.mark(LedgerChange::Activity);
        event
    }

    /// Soft-delete a contributor and cascade onto its active contributions.
    ///
    /// Contributions that were already deleted on their own are left as they
    /// are. Returns `None` if there is no active contributor with this id.
    pub fn soft_delete_contributor(&mut self, id: &Uuid) -> Option<ActivityEvent> {
        let now = Utc::now();
        let contributor = self
            .contributors
            .iter_mut()
            .find(|c| &c.base.id == id && !c.is_deleted())?;
        contributor.deleted_at = Some(now);
        contributor.base.touch();
        let name = contributor.name.clone();

        let mut cascaded = 0;
        let mut slices_affected = 0.0;
        for contribution in self
            .contributions
            .iter_mut()
            .filter(|c| &c.contributor_id == id && c.is_active())
        {
            contribution.deletion = DeletionState::DeletedWithParent {
                deleted_at: now,
                deleted_with_parent: *id,
            };
            contribution.base.touch();
            cascaded += 1;
            slices_affected += contribution.slices;
        }

        info!(%id, cascaded, "soft-deleted contributor");
        self.mark(LedgerChange::Contributors);
        if cascaded > 0 {
            self.mark(LedgerChange::Contributions);
        }
        Some(self.record(ActivityEvent::new(
            ActivityType::Deleted,
            EntityKind::Contributor,
            *id,
            name,
            slices_affected,
            cascaded,
        )))
    }

    /// Restore a contributor and only the contributions its deletion took down.
    pub fn restore_contributor(&mut self, id: &Uuid) -> Option<ActivityEvent> {
        let contributor = self
            .contributors
            .iter_mut()
            .find(|c| &c.base.id == id && c.is_deleted())?;
        contributor.deleted_at = None;
        contributor.base.touch();
        let name = contributor.name.clone();

        let mut restored = 0;
        let mut slices_affected = 0.0;
        for contribution in self
            .contributions
            .iter_mut()
            .filter(|c| c.deletion.deleted_with_parent() == Some(*id))
        {
            contribution.deletion = DeletionState::Active;
            contribution.base.touch();
            restored += 1;
            slices_affected += contribution.slices;
        }

        info!(%id, restored, "restored contributor");
        self.mark(LedgerChange::Contributors);
        if restored > 0 {
            self.mark(LedgerChange::Contributions);
        }
        Some(self.record(ActivityEvent::new(
            ActivityType::Restored,
            EntityKind::Contributor,
            *id,
            name,
            slices_affected,
            restored,
        )))
    }

    /// Soft-delete a single contribution. Never marks it as cascaded.
    pub fn soft_delete_contribution(&mut self, id: &Uuid) -> Option<ActivityEvent> {
        let index = self
            .contributions
            .iter()
            .position(|c| &c.base.id == id && c.is_active())?;
        let label = self.contribution_label(&self.contributions[index]);

        let contribution = &mut self.contributions[index];
        contribution.deletion = DeletionState::Deleted {
            deleted_at: Utc::now(),
        };
        contribution.base.touch();
        let slices_affected = contribution.slices;

        info!(%id, "soft-deleted contribution");
        self.mark(LedgerChange::Contributions);
        Some(self.record(ActivityEvent::new(
            ActivityType::Deleted,
            EntityKind::Contribution,
            *id,
            label,
            slices_affected,
            0,
        )))
    }

    /// Restore a single contribution regardless of how it was deleted.
    pub fn restore_contribution(&mut self, id: &Uuid) -> Option<ActivityEvent> {
        let index = self
            .contributions
            .iter()
            .position(|c| &c.base.id == id && !c.is_active())?;
        let label = self.contribution_label(&self.contributions[index]);

        let contribution = &mut self.contributions[index];
        let parent = contribution.deletion.deleted_with_parent();
        contribution.deletion = DeletionState::Active;
        contribution.base.touch();
        let slices_affected = contribution.slices;

        if let Some(parent) = parent {
            if self.contributor(&parent).is_some_and(|c| c.is_deleted()) {
                warn!(%id, %parent, "restored contribution whose contributor is still deleted");
            }
        }

        info!(%id, "restored contribution");
        self.mark(LedgerChange::Contributions);
        Some(self.record(ActivityEvent::new(
            ActivityType::Restored,
            EntityKind::Contribution,
            *id,
            label,
            slices_affected,
            0,
        )))
    }

    // ========================================================================
    // Hard delete
    // ========================================================================

    /// Permanently remove a record. A contributor takes all of its
    /// contributions with it, deleted or not.
    pub fn hard_delete(&mut self, id: &Uuid) -> Option<Purged> {
        if let Some(index) = self.contributors.iter().position(|c| &c.base.id == id) {
            let contributor = self.contributors.remove(index);
            let before = self.contributions.len();
            self.contributions.retain(|c| &c.contributor_id != id);
            let contributions_removed = before - self.contributions.len();

            warn!(%id, contributions_removed, "permanently deleted contributor");
            self.mark(LedgerChange::Contributors);
            if contributions_removed > 0 {
                self.mark(LedgerChange::Contributions);
            }
            return Some(Purged::Contributor {
                contributor,
                contributions_removed,
            });
        }

        let index = self.contributions.iter().position(|c| &c.base.id == id)?;
        let contribution = self.contributions.remove(index);
        warn!(%id, "permanently deleted contribution");
        self.mark(LedgerChange::Contributions);
        Some(Purged::Contribution(contribution))
    }

    /// Soft-deleted records, grouped for a trash view.
    pub fn trash(&self) -> Trash {
        Trash {
            contributors: self
                .contributors
                .iter()
                .filter(|c| c.is_deleted())
                .cloned()
                .collect(),
            contributions: self
                .contributions
                .iter()
                .filter(|c| !c.is_active())
                .map(|c| TrashedContribution {
                    contribution: c.clone(),
                    contributor_name: self.contributor_name(&c.contributor_id).to_string(),
                    cascaded: c.deletion.deleted_with_parent().is_some(),
                })
                .collect(),
        }
    }

    /// Permanently remove every soft-deleted record.
    ///
    /// Returns `(contributors_removed, contributions_removed)`.
    pub fn empty_trash(&mut self) -> (usize, usize) {
        let deleted_ids: Vec<Uuid> = self
            .contributors
            .iter()
            .filter(|c| c.is_deleted())
            .map(|c| c.base.id)
            .collect();

        let contributors_before = self.contributors.len();
        let contributions_before = self.contributions.len();
        self.contributors.retain(|c| !c.is_deleted());
        self.contributions
            .retain(|c| c.is_active() && !deleted_ids.contains(&c.contributor_id));

        let removed = (
            contributors_before - self.contributors.len(),
            contributions_before - self.contributions.len(),
        );
        if removed.0 > 0 {
            self.mark(LedgerChange::Contributors);
        }
        if removed.1 > 0 {
            self.mark(LedgerChange::Contributions);
        }
        warn!(
            contributors = removed.0,
            contributions = removed.1,
            "emptied trash"
        );
        removed
    }

    // ========================================================================
    // Derived views
    // ========================================================================

    pub fn summary(&self) -> EquitySummary {
        equity::aggregate(&self.contributors, &self.contributions)
    }

    pub fn slices_by_type(&self) -> Vec<(ContributionType, f64)> {
        equity::slices_by_type(&self.contributors, &self.contributions)
    }

    /// Rows for rendering. `with_valuation` attaches dollar values using the
    /// valuation in force.
    pub fn equity_rows(&self, as_of: Option<NaiveDate>, with_valuation: bool) -> Vec<EquityRow> {
        let valuation = with_valuation.then(|| self.current_valuation().value());
        equity::equity_rows(&self.summary(), &self.contributors, as_of, valuation)
    }

    /// Vesting split for one contributor's current slices at `as_of`.
    pub fn vesting_status(&self, id: &Uuid, as_of: NaiveDate) -> Result<VestingStatus> {
        let contributor = self
            .contributor(id)
            .ok_or_else(|| SlicePieError::ContributorNotFound(id.to_string()))?;
        let total = self.summary().slices_for(id);
        Ok(vesting::status(contributor.vesting.as_ref(), total, as_of))
    }

    pub fn vesting_projection(
        &self,
        id: &Uuid,
        from: NaiveDate,
        months: u32,
        step_months: u32,
    ) -> Result<Vec<VestingPoint>> {
        let contributor = self
            .contributor(id)
            .ok_or_else(|| SlicePieError::ContributorNotFound(id.to_string()))?;
        let total = self.summary().slices_for(id);
        Ok(vesting::project(
            contributor.vesting.as_ref(),
            total,
            from,
            months,
            step_months,
        ))
    }

    // ========================================================================
    // Valuation
    // ========================================================================

    pub fn current_valuation(&self) -> CompanyValuation {
        valuation::current(&self.valuation)
    }

    /// Store new valuation settings and append a history snapshot.
    pub fn save_valuation(&mut self, config: ValuationConfig) -> Result<ValuationHistoryEntry> {
        let mut config = validation::validate_valuation(config).into_result()?;
        let now = Utc::now();
        config.updated_at = Some(now);
        self.valuation = config;

        let current = self.current_valuation();
        let entry = ValuationHistoryEntry {
            id: Uuid::new_v4(),
            saved_at: now,
            mode: current.mode(),
            valuation: current.value(),
            confidence: current.confidence(),
        };
        self.valuation_history.insert(0, entry.clone());
        self.valuation_history
            .truncate(self.valuation_history_limit);

        info!(mode = %entry.mode, valuation = entry.valuation, "saved valuation");
        self.mark(LedgerChange::Valuation);
        self.mark(LedgerChange::ValuationHistory);
        Ok(entry)
    }

    // ========================================================================
    // Bulk import
    // ========================================================================

    /// Replace company, contributors and contributions in one step.
    ///
    /// Bypasses the cascade/restore API and records no activity.
    pub fn replace_all(&mut self, document: ExportDocument) {
        info!(
            contributors = document.contributors.len(),
            contributions = document.contributions.len(),
            "replacing ledger contents from import"
        );
        self.company = document.company;
        self.contributors = document.contributors;
        self.contributions = document.contributions;
        self.mark(LedgerChange::Company);
        self.mark(LedgerChange::Contributors);
        self.mark(LedgerChange::Contributions);
    }
}

/// Match `reference` against `(id, sequence_number)` pairs.
///
/// All digits means a sequence number; otherwise a full UUID or a unique
/// prefix of at least [`MIN_ID_PREFIX_LENGTH`] characters.
fn resolve_reference(
    candidates: impl Iterator<Item = (Uuid, u32)>,
    reference: &str,
) -> Result<Option<Uuid>> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(SlicePieError::invalid("id must not be empty"));
    }

    if reference.chars().all(|c| c.is_ascii_digit()) {
        let Ok(seq) = reference.parse::<u32>() else {
            return Ok(None);
        };
        return Ok(candidates.into_iter().find(|(_, s)| *s == seq).map(|(id, _)| id));
    }

    if let Ok(id) = Uuid::parse_str(reference) {
        return Ok(candidates.into_iter().find(|(c, _)| *c == id).map(|(id, _)| id));
    }

    if reference.len() < MIN_ID_PREFIX_LENGTH {
        return Err(SlicePieError::invalid(format!(
            "id prefix '{}' is too short (minimum {} characters)",
            reference, MIN_ID_PREFIX_LENGTH
        )));
    }

    let needle = reference.to_lowercase();
    let matches: Vec<Uuid> = candidates
        .filter(|(id, _)| id.to_string().starts_with(&needle))
        .map(|(id, _)| id)
        .collect();
    match matches.as_slice() {
        [] => Ok(None),
        [id] => Ok(Some(*id)),
        _ => Err(SlicePieError::invalid(format!(
            "id prefix '{}' matches {} records",
            reference,
            matches.len()
        ))),
    }
}
