//! The equity and vesting calculation engine.
//!
//! Everything in here is synchronous and performs no I/O. [`Ledger`] owns the
//! in-memory records and exposes every mutation; the other modules are pure
//! functions over slices of those records.

pub mod activity;
pub mod equity;
pub mod ledger;
pub mod slices;
pub mod valuation;
pub mod vesting;

pub use activity::{ActivityLog, DEFAULT_ACTIVITY_LIMIT};
pub use equity::{ContributorEquity, EquityRow, EquitySummary};
pub use ledger::{
    ContributionUpdate, ContributorUpdate, Ledger, LedgerChange, NewContribution, NewContributor,
    LedgerSnapshot, Purged, Trash, TrashedContribution, DEFAULT_VALUATION_HISTORY_LIMIT,
};
pub use valuation::{CompanyValuation, ValuationEstimate};
pub use vesting::{VestingPoint, VestingState, VestingStatus};
