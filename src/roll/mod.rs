//! Roll calendar construction: configuration, per-month contract
//! offsets, the calendar builder, and expiry inference.

pub mod calendar;
pub mod config;
pub mod infer;
pub mod resolver;

pub use calendar::{build_roll_calendar, RollCalendar, RollCalendarRow};
pub use config::{RollConfig, RollConfigError, RollCycle};
pub use infer::infer_security_meta;
pub use resolver::{resolve_contract_offsets, ContractOffsets};
