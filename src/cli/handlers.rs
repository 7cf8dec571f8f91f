use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::cli::commands::VestingArgs;
use crate::config::Config;
use crate::engine::valuation::{self, CompanyValuation, DISCLAIMER};
use crate::engine::{
    ContributionUpdate, ContributorUpdate, Ledger, NewContribution, NewContributor, Purged,
};
use crate::entity::{ActivityEvent, Company, ValuationConfig, ValuationMode, VestingConfig};
use crate::error::{Result, SlicePieError};
use crate::mcp::SlicePieServer;
use crate::storage::{LoroStore, SLICEPIE_DIR};
use crate::transfer;
use crate::validation::{self, Validation};
use crate::warnings::{check_ledger, format_warning};

const DEFAULT_CLIFF_MONTHS: u32 = 12;
const DEFAULT_VESTING_MONTHS: u32 = 48;

/// Find the project root by looking for .slicepie/ or .git/
pub fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(SLICEPIE_DIR).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

/// An opened project: store, settings and the ledger loaded from it.
struct Project {
    store: LoroStore,
    config: Config,
    ledger: Ledger,
}

impl Project {
    fn open() -> Result<Self> {
        let root = find_project_root();
        let store = LoroStore::open(&root)?;
        let config = Config::load(store.dir())?;
        let ledger = store.load_ledger(&config)?;
        Ok(Self {
            store,
            config,
            ledger,
        })
    }

    fn save(&mut self) -> Result<()> {
        self.store.flush(&mut self.ledger)?;
        Ok(())
    }

    fn print_warnings(&self) {
        for warning in check_ledger(&self.ledger, self.store.file_size().ok()) {
            eprintln!("{}", format_warning(&warning));
        }
    }
}

fn get_git_author() -> Option<String> {
    std::process::Command::new("git")
        .args(["config", "user.name"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            } else {
                None
            }
        })
}

fn short_id(id: &Uuid) -> String {
    id.to_string()[..7].to_string()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn group_thousands(whole: u64) -> String {
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234.5` -> `1,234.50`; whole numbers drop the decimals.
fn format_number(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    let cents = (abs * 100.0).round() as u64;
    let (whole, frac) = (cents / 100, cents % 100);
    if frac == 0 {
        format!("{}{}", sign, group_thousands(whole))
    } else {
        format!("{}{}.{:02}", sign, group_thousands(whole), frac)
    }
}

fn format_money(value: f64) -> String {
    format!("${}", format_number(value.round()))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_optional_date(field: &str, input: Option<&str>) -> Result<Option<NaiveDate>> {
    input.map(|s| validation::parse_date(field, s)).transpose()
}

/// Ask for confirmation unless `force` is set.
///
/// Non-interactive sessions must pass `--force`.
fn confirm(prompt: &str, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }

    eprintln!("{} [y/N] ", prompt);

    // Check if stdin is a tty for interactive confirmation
    if atty::is(atty::Stream::Stdin) {
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().eq_ignore_ascii_case("y") {
            return Ok(true);
        }
        println!("Cancelled.");
        Ok(false)
    } else {
        Err(SlicePieError::invalid(
            "Use --force to confirm in non-interactive mode",
        ))
    }
}

fn vesting_from_args(args: &VestingArgs) -> Result<Option<VestingConfig>> {
    let Some(start) = args.start.as_deref() else {
        return Ok(None);
    };
    Ok(Some(VestingConfig::new(
        validation::parse_date("vesting start", start)?,
        args.cliff.unwrap_or(DEFAULT_CLIFF_MONTHS),
        args.months.unwrap_or(DEFAULT_VESTING_MONTHS),
    )))
}

fn describe_event(event: &ActivityEvent) -> String {
    let mut line = format!(
        "{} {} {} \"{}\" ({} slices)",
        event.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        event.event_type,
        event.entity_type,
        event.entity_name,
        format_number(event.slices_affected)
    );
    if event.cascade_count > 0 {
        line.push_str(&format!(", {} contribution(s) cascaded", event.cascade_count));
    }
    line
}

fn print_event(event: Option<ActivityEvent>, noop: &str, json: bool) -> Result<()> {
    match (event, json) {
        (Some(event), true) => print_json(&event),
        (None, true) => print_json(&json!({ "changed": false })),
        (Some(event), false) => {
            println!("{}", describe_event(&event));
            Ok(())
        }
        (None, false) => {
            println!("{}", noop);
            Ok(())
        }
    }
}

pub fn handle_init(company: Option<String>) -> Result<()> {
    let root = env::current_dir()?;

    let store = LoroStore::init(&root)?;
    let config = Config {
        company_name: company.unwrap_or_default(),
        ..Default::default()
    };
    config.save(store.dir())?;

    let mut ledger = Ledger::with_limits(config.activity_limit, config.valuation_history_limit);
    ledger.set_company(Company {
        name: config.company_name.clone(),
        ..Default::default()
    });
    store.write_all(&mut ledger)?;

    println!("Initialized slicepie project in {}", root.display());
    Ok(())
}

// ============================================================================
// Contributors
// ============================================================================

pub fn handle_contributor_add(
    name: String,
    email: Option<String>,
    rate: f64,
    vesting: VestingArgs,
    json: bool,
) -> Result<()> {
    let mut project = Project::open()?;

    let contributor = project
        .ledger
        .add_contributor(NewContributor {
            name,
            email,
            hourly_rate: rate,
            vesting: vesting_from_args(&vesting)?,
            created_by: get_git_author(),
        })?
        .clone();
    project.save()?;

    if json {
        print_json(&contributor)?;
    } else {
        println!(
            "Added contributor {:03} ({}): {}",
            contributor.base.sequence_number,
            short_id(&contributor.base.id),
            contributor.name
        );
    }
    Ok(())
}

pub fn handle_contributor_list(all: bool, json: bool) -> Result<()> {
    let project = Project::open()?;
    let summary = project.ledger.summary();

    let contributors: Vec<_> = project
        .ledger
        .contributors()
        .iter()
        .filter(|c| all || !c.is_deleted())
        .collect();

    if json {
        return print_json(&contributors);
    }
    if contributors.is_empty() {
        println!("No contributors found.");
        return Ok(());
    }

    println!("Contributors:\n");
    for c in contributors {
        let mut flags = Vec::new();
        if c.is_deleted() {
            flags.push("deleted".to_string());
        }
        if !c.active {
            flags.push("inactive".to_string());
        }
        if let Some(v) = &c.vesting {
            flags.push(format!(
                "vesting {}m/{}m from {}",
                v.cliff_months, v.vesting_months, v.start_date
            ));
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        println!(
            "  {:03} ({}) {} - {}/h, {} slices{}",
            c.base.sequence_number,
            short_id(&c.base.id),
            c.name,
            format_money(c.hourly_rate),
            format_number(summary.slices_for(&c.base.id)),
            flags
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_contributor_update(
    id: String,
    name: Option<String>,
    email: Option<String>,
    rate: Option<f64>,
    inactive: bool,
    reactivate: bool,
    vesting: VestingArgs,
    no_vesting: bool,
    json: bool,
) -> Result<()> {
    let mut project = Project::open()?;
    let id = project.ledger.resolve_contributor(&id)?;

    let vesting = if no_vesting {
        Some(None)
    } else {
        vesting_from_args(&vesting)?.map(Some)
    };
    let active = match (inactive, reactivate) {
        (true, _) => Some(false),
        (_, true) => Some(true),
        _ => None,
    };

    let contributor = project
        .ledger
        .update_contributor(
            &id,
            ContributorUpdate {
                name,
                email: email.map(Some),
                hourly_rate: rate,
                active,
                vesting,
            },
        )?
        .clone();
    project.save()?;

    if json {
        print_json(&contributor)?;
    } else {
        println!(
            "Updated contributor {:03} ({}): {}",
            contributor.base.sequence_number,
            short_id(&contributor.base.id),
            contributor.name
        );
    }
    Ok(())
}

pub fn handle_contributor_delete(id: String, json: bool) -> Result<()> {
    let mut project = Project::open()?;
    let id = project.ledger.resolve_contributor(&id)?;
    let event = project.ledger.soft_delete_contributor(&id);
    project.save()?;
    print_event(event, "Contributor is already deleted.", json)
}

pub fn handle_contributor_restore(id: String, json: bool) -> Result<()> {
    let mut project = Project::open()?;
    let id = project.ledger.resolve_contributor(&id)?;
    let event = project.ledger.restore_contributor(&id);
    project.save()?;
    print_event(event, "Contributor is not deleted.", json)
}

pub fn handle_contributor_purge(id: String, force: bool) -> Result<()> {
    let mut project = Project::open()?;
    let id = project.ledger.resolve_contributor(&id)?;
    let (name, count) = match project.ledger.contributor(&id) {
        Some(c) => (c.name.clone(), project.ledger.contributions_of(&id).count()),
        None => return Err(SlicePieError::ContributorNotFound(id.to_string())),
    };

    let prompt = format!(
        "Permanently delete {} and {} contribution(s)? This cannot be undone.",
        name, count
    );
    if !confirm(&prompt, force)? {
        return Ok(());
    }

    if let Some(Purged::Contributor {
        contributor,
        contributions_removed,
    }) = project.ledger.hard_delete(&id)
    {
        project.save()?;
        println!(
            "Permanently deleted {} and {} contribution(s)",
            contributor.name, contributions_removed
        );
    }
    Ok(())
}

// ============================================================================
// Contributions
// ============================================================================

pub fn handle_contribution_add(
    contributor: String,
    contribution_type: String,
    value: f64,
    date: Option<String>,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let mut project = Project::open()?;
    let contributor_id = project.ledger.resolve_contributor(&contributor)?;

    let contribution = project
        .ledger
        .add_contribution(NewContribution {
            contributor_id,
            contribution_type: validation::parse_contribution_type(&contribution_type)?,
            value,
            date: parse_optional_date("date", date.as_deref())?.unwrap_or_else(today),
            description,
            created_by: get_git_author(),
        })?
        .clone();
    project.save()?;

    if json {
        print_json(&contribution)?;
    } else {
        println!(
            "Added contribution {:03} ({}): {} {} {} for {} = {} slices",
            contribution.base.sequence_number,
            short_id(&contribution.base.id),
            format_number(contribution.value),
            contribution.contribution_type.unit(),
            contribution.contribution_type,
            project.ledger.contributor_name(&contribution.contributor_id),
            format_number(contribution.slices)
        );
    }
    Ok(())
}

pub fn handle_contribution_list(contributor: Option<String>, all: bool, json: bool) -> Result<()> {
    let project = Project::open()?;
    let owner = contributor
        .map(|c| project.ledger.resolve_contributor(&c))
        .transpose()?;

    let mut contributions: Vec<_> = project
        .ledger
        .contributions()
        .iter()
        .filter(|c| all || c.is_active())
        .filter(|c| owner.map_or(true, |o| c.contributor_id == o))
        .collect();
    contributions.sort_by_key(|c| (c.date, c.base.sequence_number));

    if json {
        return print_json(&contributions);
    }
    if contributions.is_empty() {
        println!("No contributions found.");
        return Ok(());
    }

    println!("Contributions:\n");
    for c in contributions {
        let state = if c.is_active() { "" } else { " [deleted]" };
        println!(
            "  {:03} ({}) {} {:<12} {:>10} {:<7} {:>10} slices  {}{}",
            c.base.sequence_number,
            short_id(&c.base.id),
            c.date,
            c.contribution_type.to_string(),
            format_number(c.value),
            c.contribution_type.unit(),
            format_number(c.slices),
            project.ledger.contributor_name(&c.contributor_id),
            state
        );
        if let Some(description) = &c.description {
            println!("      {}", description);
        }
    }
    Ok(())
}

pub fn handle_contribution_update(
    id: String,
    contribution_type: Option<String>,
    value: Option<f64>,
    date: Option<String>,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let mut project = Project::open()?;
    let id = project.ledger.resolve_contribution(&id)?;

    let contribution = project
        .ledger
        .update_contribution(
            &id,
            ContributionUpdate {
                contribution_type: contribution_type
                    .as_deref()
                    .map(validation::parse_contribution_type)
                    .transpose()?,
                value,
                date: parse_optional_date("date", date.as_deref())?,
                description: description.map(Some),
            },
        )?
        .clone();
    project.save()?;

    if json {
        print_json(&contribution)?;
    } else {
        println!(
            "Updated contribution {:03} ({}): {} slices",
            contribution.base.sequence_number,
            short_id(&contribution.base.id),
            format_number(contribution.slices)
        );
    }
    Ok(())
}

pub fn handle_contribution_delete(id: String, json: bool) -> Result<()> {
    let mut project = Project::open()?;
    let id = project.ledger.resolve_contribution(&id)?;
    let event = project.ledger.soft_delete_contribution(&id);
    project.save()?;
    print_event(event, "Contribution is already deleted.", json)
}

pub fn handle_contribution_restore(id: String, json: bool) -> Result<()> {
    let mut project = Project::open()?;
    let id = project.ledger.resolve_contribution(&id)?;
    let event = project.ledger.restore_contribution(&id);
    project.save()?;

    if let Some(parent) = project
        .ledger
        .contribution(&id)
        .and_then(|c| project.ledger.contributor(&c.contributor_id))
        .filter(|c| c.is_deleted())
    {
        eprintln!(
            "Note: {} is still deleted, so this contribution is not counted until they are restored.",
            parent.name
        );
    }
    print_event(event, "Contribution is not deleted.", json)
}

pub fn handle_contribution_purge(id: String, force: bool) -> Result<()> {
    let mut project = Project::open()?;
    let id = project.ledger.resolve_contribution(&id)?;

    let prompt = format!(
        "Permanently delete contribution {}? This cannot be undone.",
        short_id(&id)
    );
    if !confirm(&prompt, force)? {
        return Ok(());
    }

    if project.ledger.hard_delete(&id).is_some() {
        project.save()?;
        println!("Permanently deleted contribution {}", short_id(&id));
    }
    Ok(())
}

// ============================================================================
// Equity and vesting
// ============================================================================

pub fn handle_equity(as_of: Option<String>, value: bool, json: bool) -> Result<()> {
    let project = Project::open()?;
    let as_of = parse_optional_date("as-of", as_of.as_deref())?;
    let summary = project.ledger.summary();
    let rows = project.ledger.equity_rows(as_of, value);
    let valuation = value.then(|| project.ledger.current_valuation());

    if json {
        return print_json(&json!({
            "total_slices": summary.total_slices,
            "as_of": as_of,
            "valuation": valuation,
            "by_type": project.ledger.slices_by_type().into_iter()
                .map(|(ty, slices)| (ty.to_string(), slices))
                .collect::<BTreeMap<_, _>>(),
            "rows": rows,
        }));
    }

    if rows.is_empty() {
        println!("No contributors yet.");
        return Ok(());
    }

    println!(
        "Equity split ({} slices total):\n",
        format_number(summary.total_slices)
    );
    for row in &rows {
        let seq = project
            .ledger
            .contributor(&row.contributor_id)
            .map(|c| c.base.sequence_number)
            .unwrap_or(0);
        let mut line = format!(
            "  {:03} {:<24} {:>12} slices {:>7.2}%",
            seq,
            row.name,
            format_number(row.slices),
            row.percentage
        );
        if let (Some(vested), Some(unvested)) = (row.vested_slices, row.unvested_slices) {
            line.push_str(&format!(
                "  vested {} / unvested {}",
                format_number(vested),
                format_number(unvested)
            ));
        }
        if let Some(dollars) = row.dollar_value {
            line.push_str(&format!("  {}", format_money(dollars)));
        }
        println!("{}", line);
    }

    if let Some(valuation) = valuation {
        println!();
        print_valuation(&valuation);
    }
    project.print_warnings();
    Ok(())
}

pub fn handle_vesting(
    id: String,
    as_of: Option<String>,
    project_months: Option<u32>,
    step: u32,
    json: bool,
) -> Result<()> {
    let project = Project::open()?;
    let id = project.ledger.resolve_contributor(&id)?;
    let as_of = parse_optional_date("as-of", as_of.as_deref())?.unwrap_or_else(today);

    let name = project.ledger.contributor_name(&id).to_string();
    let status = project.ledger.vesting_status(&id, as_of)?;
    let projection = project_months
        .map(|months| project.ledger.vesting_projection(&id, as_of, months, step))
        .transpose()?;

    if json {
        return print_json(&json!({
            "contributor_id": id,
            "name": name,
            "status": status,
            "projection": projection,
        }));
    }

    println!("Vesting for {} as of {}: {}", name, status.as_of, status.state);
    if let (Some(cliff), Some(full)) = (status.cliff_date, status.full_vest_date) {
        println!("  Cliff: {}   Fully vested: {}", cliff, full);
    }
    println!(
        "  Vested {} of {} slices ({:.1}%), unvested {}",
        format_number(status.vested_slices),
        format_number(status.total_slices),
        status.percent_vested,
        format_number(status.unvested_slices)
    );

    if let Some(points) = projection {
        println!("\nProjection:");
        for p in points {
            println!(
                "  {}  {:<13} {:>6.1}%  {} slices",
                p.date,
                p.state.to_string(),
                p.percent_vested,
                format_number(p.vested_slices)
            );
        }
    }
    Ok(())
}

// ============================================================================
// Valuation
// ============================================================================

fn print_valuation(valuation: &CompanyValuation) {
    match valuation {
        CompanyValuation::Manual { valuation } => {
            println!("Valuation: {} (manual)", format_money(*valuation));
        }
        CompanyValuation::Auto(e) => {
            println!(
                "Valuation: {} (estimated, {} confidence)",
                format_money(e.valuation),
                e.confidence
            );
            println!(
                "  {} years of profit, average {}, base {}",
                e.years,
                format_money(e.average_profit),
                format_money(e.base)
            );
            println!(
                "  growth {:.1}%/yr -> x{:.3}, retention x{:.3}",
                e.growth_rate * 100.0,
                e.growth_multiplier,
                e.retention_multiplier
            );
            println!("  {}", DISCLAIMER);
        }
    }
}

fn profits_from_args(profits: &[String]) -> Result<BTreeMap<i32, f64>> {
    profits.iter().map(|p| validation::parse_profit(p)).collect()
}

pub fn handle_valuation_show(json: bool) -> Result<()> {
    let project = Project::open()?;
    let valuation = project.ledger.current_valuation();

    if json {
        return print_json(&json!({
            "valuation": valuation,
            "updated_at": project.ledger.valuation_config().updated_at,
            "disclaimer": (valuation.mode() == ValuationMode::Auto).then_some(DISCLAIMER),
        }));
    }
    print_valuation(&valuation);
    Ok(())
}

pub fn handle_valuation_estimate(profits: Vec<String>, churn: Option<f64>, json: bool) -> Result<()> {
    let config = ValuationConfig {
        mode: ValuationMode::Auto,
        profits: profits_from_args(&profits)?,
        churn_rate: churn,
        ..Default::default()
    };
    let config = validation::validate_valuation(config).into_result()?;
    let estimate = valuation::estimate(&config.profits, config.churn_rate);

    if json {
        return print_json(&json!({ "estimate": estimate, "disclaimer": DISCLAIMER }));
    }
    print_valuation(&CompanyValuation::Auto(estimate));
    Ok(())
}

fn save_valuation(mut project: Project, config: ValuationConfig, json: bool) -> Result<()> {
    let entry = project.ledger.save_valuation(config)?;
    project.save()?;

    if json {
        return print_json(&entry);
    }
    println!("Saved valuation snapshot {}", short_id(&entry.id));
    print_valuation(&project.ledger.current_valuation());
    Ok(())
}

pub fn handle_valuation_set_manual(value: f64, json: bool) -> Result<()> {
    let project = Project::open()?;
    let config = ValuationConfig {
        mode: ValuationMode::Manual,
        manual_value: value,
        ..project.ledger.valuation_config().clone()
    };
    save_valuation(project, config, json)
}

pub fn handle_valuation_set_auto(profits: Vec<String>, churn: Option<f64>, json: bool) -> Result<()> {
    let project = Project::open()?;
    let config = ValuationConfig {
        mode: ValuationMode::Auto,
        profits: profits_from_args(&profits)?,
        churn_rate: churn,
        ..project.ledger.valuation_config().clone()
    };
    save_valuation(project, config, json)
}

pub fn handle_valuation_history(json: bool) -> Result<()> {
    let project = Project::open()?;
    let history = project.ledger.valuation_history();

    if json {
        return print_json(history);
    }
    if history.is_empty() {
        println!("No saved valuations.");
        return Ok(());
    }
    println!("Valuation history:\n");
    for entry in history {
        let confidence = entry
            .confidence
            .map(|c| format!(", {} confidence", c))
            .unwrap_or_default();
        println!(
            "  {}  {:>14}  ({}{})",
            entry.saved_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            format_money(entry.valuation),
            entry.mode,
            confidence
        );
    }
    Ok(())
}

// ============================================================================
// Activity and trash
// ============================================================================

pub fn handle_activity(limit: usize, json: bool) -> Result<()> {
    let project = Project::open()?;
    let events = project.ledger.activity().recent(limit);

    if json {
        return print_json(&events);
    }
    if events.is_empty() {
        println!("No activity yet.");
        return Ok(());
    }
    for event in &events {
        println!("{}", describe_event(event));
    }
    Ok(())
}

pub fn handle_trash_list(json: bool) -> Result<()> {
    let project = Project::open()?;
    let trash = project.ledger.trash();

    if json {
        return print_json(&trash);
    }
    if trash.is_empty() {
        println!("Trash is empty.");
        return Ok(());
    }

    if !trash.contributors.is_empty() {
        println!("Contributors:");
        for c in &trash.contributors {
            let deleted = c
                .deleted_at
                .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            println!(
                "  {:03} ({}) {}  deleted {}",
                c.base.sequence_number,
                short_id(&c.base.id),
                c.name,
                deleted
            );
        }
    }
    if !trash.contributions.is_empty() {
        println!("Contributions:");
        for t in &trash.contributions {
            let c = &t.contribution;
            let how = if t.cascaded {
                " (with contributor)"
            } else {
                ""
            };
            println!(
                "  {:03} ({}) {} {} {} slices  {}{}",
                c.base.sequence_number,
                short_id(&c.base.id),
                c.date,
                c.contribution_type,
                format_number(c.slices),
                t.contributor_name,
                how
            );
        }
    }
    Ok(())
}

pub fn handle_trash_empty(force: bool) -> Result<()> {
    let mut project = Project::open()?;
    let trash = project.ledger.trash();
    if trash.is_empty() {
        println!("Trash is empty.");
        return Ok(());
    }

    let prompt = format!(
        "Permanently delete {} contributor(s) and {} contribution(s)? This cannot be undone.",
        trash.contributors.len(),
        trash.contributions.len()
    );
    if !confirm(&prompt, force)? {
        return Ok(());
    }

    let (contributors, contributions) = project.ledger.empty_trash();
    project.save()?;
    println!(
        "Permanently deleted {} contributor(s) and {} contribution(s)",
        contributors, contributions
    );
    Ok(())
}

// ============================================================================
// Import / export
// ============================================================================

pub fn handle_export(out: Option<String>) -> Result<()> {
    let project = Project::open()?;
    let document = transfer::export(&project.ledger);
    let text = serde_json::to_string_pretty(&document)?;

    match out {
        Some(path) => {
            fs::write(&path, text)?;
            eprintln!(
                "Exported {} contributor(s) and {} contribution(s) to {}",
                document.contributors.len(),
                document.contributions.len(),
                path
            );
        }
        None => println!("{}", text),
    }
    Ok(())
}

pub fn handle_import(file: String, force: bool) -> Result<()> {
    let mut project = Project::open()?;
    let text = fs::read_to_string(&file)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;

    let document = match transfer::validate_document(&value) {
        Validation::Valid(document) => document,
        Validation::Invalid(reasons) => {
            for reason in &reasons {
                eprintln!("  - {}", reason);
            }
            return Err(SlicePieError::Validation(reasons));
        }
    };

    let prompt = format!(
        "Replace the current ledger with {} contributor(s) and {} contribution(s) from {}?",
        document.contributors.len(),
        document.contributions.len(),
        file
    );
    if !confirm(&prompt, force)? {
        return Ok(());
    }

    let (contributors, contributions) = (document.contributors.len(), document.contributions.len());
    project.ledger.replace_all(document);
    project.save()?;

    println!(
        "Imported {} contributor(s) and {} contribution(s)",
        contributors, contributions
    );
    project.print_warnings();
    Ok(())
}

// ============================================================================
// MCP server
// ============================================================================

pub fn handle_serve(http: bool, bind: Option<String>) -> Result<()> {
    let project = Project::open()?;
    let bind = bind.unwrap_or_else(|| project.config.http_bind.clone());
    let server = SlicePieServer::new(project.store, project.ledger);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let result = if http {
            crate::mcp::serve_http(server, &bind).await
        } else {
            server.serve(rmcp::transport::stdio()).await
        };
        result.map_err(|e| SlicePieError::Server(e.to_string()))
    })
}
