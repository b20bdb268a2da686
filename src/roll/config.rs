//! Per-asset roll configuration.
//!
//! A [`RollConfig`] says which contract months an asset actually holds
//! (`hold_roll_cycle`), which months carry liquid pricing
//! (`priced_roll_cycle`), how far from expiry the roll happens
//! (`roll_offset`), and where the carry contract sits relative to the
//! held contract (`carry_contract_offset`, a signed step in the priced
//! ring).
//!
//! # Example
//!
//! ```ignore
//! use continuous_futures::roll::{RollConfig, RollCycle};
//!
//! let config = RollConfig::new(
//!     "CL",
//!     RollCycle::parse("HMUZ")?,
//!     RollCycle::parse("FGHJKMNQUVXZ")?,
//!     "-5d".parse()?,
//!     -1,
//! );
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::calendar::month_code::code_to_month;
use crate::calendar::offset::CalendarOffset;

/// An ordered ring of futures month letters, e.g. `HMUZ`.
///
/// Letters must be valid month codes in strictly ascending calendar
/// order (which also forbids duplicates); the ring wraps from the last
/// letter back to the first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RollCycle {
    letters: Vec<char>,
}

impl RollCycle {
    /// Parse a cycle string such as `"HMUZ"` or `"FGHJKMNQUVXZ"`.
    pub fn parse(s: &str) -> Result<Self, RollConfigError> {
        let letters: Vec<char> = s.trim().chars().map(|c| c.to_ascii_uppercase()).collect();
        if letters.is_empty() {
            return Err(RollConfigError::EmptyCycle);
        }
        let mut prev: Option<u32> = None;
        for &letter in &letters {
            let month =
                code_to_month(letter).ok_or(RollConfigError::InvalidMonthCode(letter))?;
            if let Some(p) = prev {
                if month <= p {
                    return Err(RollConfigError::UnorderedCycle(s.trim().to_string()));
                }
            }
            prev = Some(month);
        }
        Ok(Self { letters })
    }

    /// Number of letters in the ring.
    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    /// The letters in calendar order.
    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    /// Whether the ring contains a letter.
    pub fn contains(&self, letter: char) -> bool {
        self.position_of(letter).is_some()
    }

    /// Zero-based ring position of a letter.
    pub fn position_of(&self, letter: char) -> Option<usize> {
        let letter = letter.to_ascii_uppercase();
        self.letters.iter().position(|&c| c == letter)
    }

    /// Ring successor of a letter; the successor of the last letter
    /// wraps to the first. A one-letter ring is its own successor.
    pub fn next_after(&self, letter: char) -> Option<char> {
        self.step(letter, 1)
    }

    /// Letter a signed number of ring positions away from `letter`.
    pub fn step(&self, letter: char, steps: i32) -> Option<char> {
        let idx = self.position_of(letter)? as i32;
        let len = self.letters.len() as i32;
        // Reduce into the ring first so the sum cannot overflow.
        let steps = steps.rem_euclid(len);
        Some(self.letters[(idx + steps).rem_euclid(len) as usize])
    }
}

impl FromStr for RollCycle {
    type Err = RollConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RollCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for letter in &self.letters {
            write!(f, "{}", letter)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for RollCycle {
    type Error = RollConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RollCycle> for String {
    fn from(cycle: RollCycle) -> Self {
        cycle.to_string()
    }
}

/// Roll configuration for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollConfig {
    /// Asset id (e.g. "CL")
    pub asset: String,

    /// Month letters actually held
    pub hold_roll_cycle: RollCycle,

    /// Month letters with liquid carry pricing; superset of the hold cycle
    pub priced_roll_cycle: RollCycle,

    /// Offset from a contract's expiry to its roll date, typically negative days
    pub roll_offset: CalendarOffset,

    /// Signed ring step in the priced cycle from the held contract to its
    /// carry contract; negative points at an earlier contract. Never zero.
    pub carry_contract_offset: i32,

    /// Offset from the first day of a delivery month to the approximate expiry
    pub approximate_expiry_offset: CalendarOffset,
}

impl RollConfig {
    /// New configuration with an approximate expiry at the month start.
    pub fn new(
        asset: impl Into<String>,
        hold_roll_cycle: RollCycle,
        priced_roll_cycle: RollCycle,
        roll_offset: CalendarOffset,
        carry_contract_offset: i32,
    ) -> Self {
        Self {
            asset: asset.into(),
            hold_roll_cycle,
            priced_roll_cycle,
            roll_offset,
            carry_contract_offset,
            approximate_expiry_offset: CalendarOffset::days(0),
        }
    }

    /// Set where in the delivery month contracts approximately expire.
    pub fn with_approximate_expiry_offset(mut self, offset: CalendarOffset) -> Self {
        self.approximate_expiry_offset = offset;
        self
    }
}

/// Errors from malformed roll configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RollConfigError {
    /// Cycle string had no letters
    #[error("Roll cycle is empty")]
    EmptyCycle,

    /// Letter outside the month-code table
    #[error("'{0}' is not a futures month code")]
    InvalidMonthCode(char),

    /// Letters out of calendar order or duplicated
    #[error("Cycle '{0}' is not in ascending month order")]
    UnorderedCycle(String),

    /// A zero step cannot select a carry contract
    #[error("Asset '{asset}': carry_contract_offset must be non-zero")]
    ZeroCarryOffset { asset: String },

    /// Hold-cycle letter missing from the priced cycle
    #[error("Asset '{asset}': held month '{month}' is not in priced cycle '{priced}'")]
    UnpricedHeldMonth {
        asset: String,
        month: char,
        priced: String,
    },
}
