// Import/export of day logs and ledger data

pub mod export;
pub mod import;

pub use export::*;
pub use import::*;
