pub mod cli;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod mcp;
pub mod storage;
pub mod suggestion;
pub mod transfer;
pub mod validation;
pub mod warnings;

pub use engine::Ledger;
pub use error::{Result, SlicePieError};
pub use mcp::SlicePieServer;
