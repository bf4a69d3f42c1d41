//! Business profiles, ledger access, balance classification and
//! reconciliation.
//!
//! This module has no XML in it: it decides who is paid out, who is debited
//! and for how much, and afterwards brings every ledger balance back to zero.

mod builder;
mod classify;
mod config;
mod error;
mod invoice;
mod ledger;
mod period;
mod reconcile;
mod types;

pub use builder::*;
pub use classify::*;
pub use config::*;
pub use error::*;
pub use invoice::*;
pub use ledger::*;
pub use period::*;
pub use reconcile::*;
pub use types::*;
