// Application layer - use cases and orchestration.
// The ledger itself is pure; this layer loads it from storage, runs a day
// and writes the result back.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
