//! Instrument identities and per-contract input rows.

mod types;
mod universe;

pub use types::{ContractId, InstrumentPrice, SecurityExpiry};
pub use universe::contract_universe;
