//! Calendar primitives shared across the roll pipeline: month-letter
//! codes and signed calendar offsets.

pub mod month_code;
pub mod offset;

pub use month_code::{code_to_month, is_month_code, month_to_code, MONTH_CODES};
pub use offset::{CalendarOffset, OffsetParseError};
