mod day;
mod item;
mod ledger;
mod log_entry;
mod money;
mod policy;

pub use day::*;
pub use item::*;
pub use ledger::*;
pub use log_entry::*;
pub use money::*;
pub use policy::*;
