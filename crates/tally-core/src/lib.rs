pub mod ledger;
pub mod types;

pub use ledger::{SessionStatistics, TrialTallyLedger};
pub use types::*;
