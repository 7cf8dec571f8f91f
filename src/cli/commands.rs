use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "slicepie")]
#[command(version, about = "Dynamic equity split ledger for early-stage teams")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new slicepie project in the current directory
    Init {
        /// Company name
        #[arg(long)]
        company: Option<String>,
    },

    /// Manage contributors
    Contributor(ContributorCommand),

    /// Manage contributions
    Contribution(ContributionCommand),

    /// Show the current equity split
    Equity {
        /// Include vested/unvested slices at this date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<String>,

        /// Include dollar values at the current valuation
        #[arg(long)]
        value: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a contributor's vesting status
    Vesting {
        /// Contributor ID (sequence number like "2" or UUID prefix)
        id: String,

        /// Evaluation date (YYYY-MM-DD, default today)
        #[arg(long)]
        as_of: Option<String>,

        /// Project the schedule forward this many months
        #[arg(long, value_name = "MONTHS")]
        project: Option<u32>,

        /// Months between projection points
        #[arg(long, default_value = "3")]
        step: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Company valuation
    Valuation(ValuationCommand),

    /// Show recent delete/restore activity
    Activity {
        /// Maximum events to show
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Soft-deleted records
    Trash(TrashCommand),

    /// Export the ledger as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short = 'o')]
        out: Option<String>,
    },

    /// Replace the ledger with the contents of an export file
    Import {
        /// Path to the export document
        file: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Start the MCP server
    Serve {
        /// Serve over streamable HTTP instead of stdio
        #[arg(long)]
        http: bool,

        /// Bind address for --http (default from config)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct ContributorCommand {
    #[command(subcommand)]
    pub action: ContributorAction,
}

/// Vesting flags shared by `contributor add` and `contributor update`
#[derive(Args, Debug, Default)]
pub struct VestingArgs {
    /// Vesting start date (YYYY-MM-DD)
    #[arg(long = "vesting-start")]
    pub start: Option<String>,

    /// Cliff length in months
    #[arg(long, requires = "start")]
    pub cliff: Option<u32>,

    /// Total vesting period in months, cliff included
    #[arg(long = "vesting-months", requires = "start")]
    pub months: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum ContributorAction {
    /// Add a contributor
    Add {
        /// Contributor name
        name: String,

        /// Email address
        #[arg(long)]
        email: Option<String>,

        /// Hourly rate in dollars, used for time contributions
        #[arg(long, default_value = "0")]
        rate: f64,

        #[command(flatten)]
        vesting: VestingArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List contributors
    List {
        /// Include soft-deleted contributors
        #[arg(long)]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update a contributor
    Update {
        /// Contributor ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New email (empty string clears it)
        #[arg(long)]
        email: Option<String>,

        /// New hourly rate; only affects future time contributions
        #[arg(long)]
        rate: Option<f64>,

        /// Mark as no longer participating
        #[arg(long, conflicts_with = "reactivate")]
        inactive: bool,

        /// Mark as participating again
        #[arg(long)]
        reactivate: bool,

        #[command(flatten)]
        vesting: VestingArgs,

        /// Remove vesting terms
        #[arg(long, conflicts_with = "start")]
        no_vesting: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Soft-delete a contributor and their contributions
    Delete {
        /// Contributor ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restore a soft-deleted contributor
    Restore {
        /// Contributor ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Permanently delete a contributor and all their contributions
    Purge {
        /// Contributor ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct ContributionCommand {
    #[command(subcommand)]
    pub action: ContributionAction,
}

#[derive(Subcommand, Debug)]
pub enum ContributionAction {
    /// Record a contribution
    Add {
        /// Contributor ID
        contributor: String,

        /// Contribution type (time, cash, non-cash, idea, relationship)
        #[arg(long = "type", short = 't')]
        contribution_type: String,

        /// Hours for time, dollars for everything else
        #[arg(long)]
        value: f64,

        /// Date of the contribution (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,

        /// Description
        #[arg(long, short = 'd')]
        description: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List contributions
    List {
        /// Only this contributor's contributions
        #[arg(long)]
        contributor: Option<String>,

        /// Include soft-deleted contributions
        #[arg(long)]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit a contribution
    Update {
        /// Contribution ID
        id: String,

        /// New type
        #[arg(long = "type", short = 't')]
        contribution_type: Option<String>,

        /// New value
        #[arg(long)]
        value: Option<f64>,

        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// New description (empty string clears it)
        #[arg(long, short = 'd')]
        description: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Soft-delete a contribution
    Delete {
        /// Contribution ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restore a soft-deleted contribution
    Restore {
        /// Contribution ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Permanently delete a contribution
    Purge {
        /// Contribution ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct ValuationCommand {
    #[command(subcommand)]
    pub action: ValuationAction,
}

#[derive(Subcommand, Debug)]
pub enum ValuationAction {
    /// Show the valuation currently in force
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate a valuation without saving it
    Estimate {
        /// Profit for a year as YEAR=PROFIT (repeat for up to 5 years)
        #[arg(long = "profit", short = 'p', required = true)]
        profits: Vec<String>,

        /// Annual churn rate in percent (0-100)
        #[arg(long)]
        churn: Option<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Use a manually entered valuation
    SetManual {
        /// Company valuation in dollars
        value: f64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Use the automatic estimate from profit history and churn
    SetAuto {
        /// Profit for a year as YEAR=PROFIT (repeat for up to 5 years)
        #[arg(long = "profit", short = 'p', required = true)]
        profits: Vec<String>,

        /// Annual churn rate in percent (0-100)
        #[arg(long)]
        churn: Option<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show saved valuation snapshots
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct TrashCommand {
    #[command(subcommand)]
    pub action: TrashAction,
}

#[derive(Subcommand, Debug)]
pub enum TrashAction {
    /// List soft-deleted records
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Permanently delete everything in the trash
    Empty {
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
}
