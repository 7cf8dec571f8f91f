mod commands;
mod handlers;

pub use commands::{
    Cli, Commands, ContributionAction, ContributionCommand, ContributorAction, ContributorCommand,
    TrashAction, TrashCommand, ValuationAction, ValuationCommand, VestingArgs,
};
pub use handlers::{
    find_project_root, handle_activity, handle_contribution_add, handle_contribution_delete,
    handle_contribution_list, handle_contribution_purge, handle_contribution_restore,
    handle_contribution_update, handle_contributor_add, handle_contributor_delete,
    handle_contributor_list, handle_contributor_purge, handle_contributor_restore,
    handle_contributor_update, handle_equity, handle_export, handle_import, handle_init,
    handle_serve, handle_trash_empty, handle_trash_list, handle_valuation_estimate,
    handle_valuation_history, handle_valuation_set_auto, handle_valuation_set_manual,
    handle_valuation_show, handle_vesting,
};
