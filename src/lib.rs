// continuous-futures: Roll calendars and back-adjusted continuous series
// from per-contract futures prices

pub mod calendar;
pub mod instruments;
pub mod roll;
pub mod stitch;

// Re-export the pipeline entry points
pub use instruments::{contract_universe, ContractId, InstrumentPrice, SecurityExpiry};
pub use roll::{build_roll_calendar, infer_security_meta, RollCalendar, RollConfig, RollCycle};
pub use stitch::{
    assemble_unadjusted, roll_calendar_prices, stitch_panama_backward, StitchedSeries,
    UnadjustedSeries, DEFAULT_STITCH_LOOKBACK,
};
