//! Signed calendar offsets in compact string form.
//!
//! Roll configuration expresses date shifts as short strings:
//! `"-5d"` (five days earlier), `"2mo"` (two months later), `"-1y"`.
//! Month and year arithmetic clamps to the end of the target month,
//! so Jan 31 shifted by `1mo` lands on Feb 28 (or 29).
//!
//! # Example
//!
//! ```ignore
//! use continuous_futures::calendar::CalendarOffset;
//! use chrono::NaiveDate;
//!
//! let roll_offset: CalendarOffset = "-5d".parse()?;
//! let expiry = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
//! assert_eq!(roll_offset.apply(expiry), NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Units a calendar offset can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum OffsetUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl OffsetUnit {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Days => "d",
            Self::Weeks => "w",
            Self::Months => "mo",
            Self::Years => "y",
        }
    }
}

/// A signed calendar offset such as `-5d`, `2mo`, or `-1y`.
///
/// Serialized as its compact string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarOffset {
    amount: i32,
    unit: OffsetUnit,
}

impl CalendarOffset {
    /// Offset of `n` days.
    pub const fn days(n: i32) -> Self {
        Self {
            amount: n,
            unit: OffsetUnit::Days,
        }
    }

    /// Offset of `n` weeks.
    pub const fn weeks(n: i32) -> Self {
        Self {
            amount: n,
            unit: OffsetUnit::Weeks,
        }
    }

    /// Offset of `n` whole months.
    pub const fn months(n: i32) -> Self {
        Self {
            amount: n,
            unit: OffsetUnit::Months,
        }
    }

    /// Offset of `n` whole years.
    pub const fn years(n: i32) -> Self {
        Self {
            amount: n,
            unit: OffsetUnit::Years,
        }
    }

    /// True when the offset points into the past.
    pub fn is_backward(&self) -> bool {
        self.amount < 0
    }

    /// Shift a date by this offset.
    pub fn apply(&self, date: NaiveDate) -> NaiveDate {
        match self.unit {
            OffsetUnit::Days => date + Duration::days(self.amount as i64),
            OffsetUnit::Weeks => date + Duration::weeks(self.amount as i64),
            OffsetUnit::Months => shift_months(date, self.amount),
            OffsetUnit::Years => shift_months(date, self.amount * 12),
        }
    }

    /// The same magnitude in the opposite direction.
    pub fn negated(&self) -> Self {
        Self {
            amount: -self.amount,
            unit: self.unit,
        }
    }
}

fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    if months >= 0 {
        date + Months::new(months as u32)
    } else {
        date - Months::new(months.unsigned_abs())
    }
}

impl FromStr for CalendarOffset {
    type Err = OffsetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let unit_start = trimmed
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| OffsetParseError::MissingUnit(trimmed.to_string()))?;
        let (number, unit) = trimmed.split_at(unit_start);
        let amount: i32 = number
            .parse()
            .map_err(|_| OffsetParseError::InvalidAmount(trimmed.to_string()))?;
        let unit = match unit {
            "d" => OffsetUnit::Days,
            "w" => OffsetUnit::Weeks,
            "mo" => OffsetUnit::Months,
            "y" => OffsetUnit::Years,
            _ => return Err(OffsetParseError::UnknownUnit(trimmed.to_string())),
        };
        Ok(Self { amount, unit })
    }
}

impl fmt::Display for CalendarOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

impl TryFrom<String> for CalendarOffset {
    type Error = OffsetParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CalendarOffset> for String {
    fn from(offset: CalendarOffset) -> Self {
        offset.to_string()
    }
}

/// Errors from parsing a calendar offset string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OffsetParseError {
    /// No unit suffix at all
    #[error("Offset '{0}' is missing a unit suffix (d, w, mo, or y)")]
    MissingUnit(String),

    /// Numeric part absent or unparseable
    #[error("Offset '{0}' has an invalid amount")]
    InvalidAmount(String),

    /// Unit other than d/w/mo/y
    #[error("Offset '{0}' has an unknown unit (expected d, w, mo, or y)")]
    UnknownUnit(String),
}
