use clap::Parser;
use slicepie::cli::{
    find_project_root, handle_activity, handle_contribution_add, handle_contribution_delete,
    handle_contribution_list, handle_contribution_purge, handle_contribution_restore,
    handle_contribution_update, handle_contributor_add, handle_contributor_delete,
    handle_contributor_list, handle_contributor_purge, handle_contributor_restore,
    handle_contributor_update, handle_equity, handle_export, handle_import, handle_init,
    handle_serve, handle_trash_empty, handle_trash_list, handle_valuation_estimate,
    handle_valuation_history, handle_valuation_set_auto, handle_valuation_set_manual,
    handle_valuation_show, handle_vesting, Cli, Commands, ContributionAction, ContributorAction,
    TrashAction, ValuationAction,
};
use slicepie::config::Config;
use slicepie::storage::SLICEPIE_DIR;
use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout stays clean for JSON output and the stdio transport.
fn init_tracing() {
    let fallback = Config::load(&find_project_root().join(SLICEPIE_DIR))
        .map(|c| c.log_filter)
        .unwrap_or_else(|_| "warn".to_string());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Init { company } => handle_init(company),
        Commands::Contributor(cmd) => match cmd.action {
            ContributorAction::Add {
                name,
                email,
                rate,
                vesting,
                json,
            } => handle_contributor_add(name, email, rate, vesting, json),
            ContributorAction::List { all, json } => handle_contributor_list(all, json),
            ContributorAction::Update {
                id,
                name,
                email,
                rate,
                inactive,
                reactivate,
                vesting,
                no_vesting,
                json,
            } => handle_contributor_update(
                id, name, email, rate, inactive, reactivate, vesting, no_vesting, json,
            ),
            ContributorAction::Delete { id, json } => handle_contributor_delete(id, json),
            ContributorAction::Restore { id, json } => handle_contributor_restore(id, json),
            ContributorAction::Purge { id, force } => handle_contributor_purge(id, force),
        },
        Commands::Contribution(cmd) => match cmd.action {
            ContributionAction::Add {
                contributor,
                contribution_type,
                value,
                date,
                description,
                json,
            } => handle_contribution_add(contributor, contribution_type, value, date, description, json),
            ContributionAction::List {
                contributor,
                all,
                json,
            } => handle_contribution_list(contributor, all, json),
            ContributionAction::Update {
                id,
                contribution_type,
                value,
                date,
                description,
                json,
            } => handle_contribution_update(id, contribution_type, value, date, description, json),
            ContributionAction::Delete { id, json } => handle_contribution_delete(id, json),
            ContributionAction::Restore { id, json } => handle_contribution_restore(id, json),
            ContributionAction::Purge { id, force } => handle_contribution_purge(id, force),
        },
        Commands::Equity { as_of, value, json } => handle_equity(as_of, value, json),
        Commands::Vesting {
            id,
            as_of,
            project,
            step,
            json,
        } => handle_vesting(id, as_of, project, step, json),
        Commands::Valuation(cmd) => match cmd.action {
            ValuationAction::Show { json } => handle_valuation_show(json),
            ValuationAction::Estimate {
                profits,
                churn,
                json,
            } => handle_valuation_estimate(profits, churn, json),
            ValuationAction::SetManual { value, json } => handle_valuation_set_manual(value, json),
            ValuationAction::SetAuto {
                profits,
                churn,
                json,
            } => handle_valuation_set_auto(profits, churn, json),
            ValuationAction::History { json } => handle_valuation_history(json),
        },
        Commands::Activity { limit, json } => handle_activity(limit, json),
        Commands::Trash(cmd) => match cmd.action {
            TrashAction::List { json } => handle_trash_list(json),
            TrashAction::Empty { force } => handle_trash_empty(force),
        },
        Commands::Export { out } => handle_export(out),
        Commands::Import { file, force } => handle_import(file, force),
        Commands::Serve { http, bind } => handle_serve(http, bind),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
