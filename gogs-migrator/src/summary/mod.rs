//! Counters reported at the end of a migration.

mod result;
mod run_summary;

pub use result::ItemOutcome;
pub use run_summary::RunSummary;
