//! Row types flowing through the continuous-futures pipeline.
//!
//! Everything here is a plain immutable value: contract identities,
//! per-contract expiry rows, and per-contract price observations.
//! Pipeline stages consume and produce slices of these; nothing is
//! mutated in place.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::month_code::{code_to_month, MONTH_CODES};

/// Identity of one dated futures contract: delivery month letter plus year.
///
/// Displays in exchange short form, e.g. `H26` for March 2026. Ordering
/// is chronological (year, then delivery month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId {
    /// Delivery month letter (F, G, H, J, K, M, N, Q, U, V, X, Z)
    pub tenor: char,

    /// Delivery year, four digits
    pub year: i32,
}

impl ContractId {
    /// New contract id from a month letter and year.
    pub fn new(tenor: char, year: i32) -> Self {
        Self {
            tenor: tenor.to_ascii_uppercase(),
            year,
        }
    }

    /// Contract whose delivery month contains `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            tenor: MONTH_CODES[date.month0() as usize],
            year: date.year(),
        }
    }

    /// Delivery month number (1-12), if the tenor letter is valid.
    pub fn month(&self) -> Option<u32> {
        code_to_month(self.tenor)
    }

    /// First calendar day of the delivery month.
    pub fn first_of_month(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month()?, 1)
    }

    /// Contract a whole number of months away, rolling the year as needed.
    pub fn offset_months(&self, months: i32) -> Option<Self> {
        let month0 = self.month()? as i32 - 1;
        let total = self.year * 12 + month0 + months;
        Some(Self {
            tenor: MONTH_CODES[total.rem_euclid(12) as usize],
            year: total.div_euclid(12),
        })
    }

    // Invalid tenors sort before January; tenor breaks the remaining tie
    // so ordering stays consistent with equality.
    fn sort_key(&self) -> (i32, u32, char) {
        (self.year, self.month().unwrap_or(0), self.tenor)
    }
}

impl Ord for ContractId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for ContractId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.tenor, self.year.rem_euclid(100))
    }
}

/// One physically existing contract and its lifecycle dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityExpiry {
    /// Asset the contract belongs to (e.g. "CL")
    pub asset: String,

    /// Exchange identity of the contract
    pub contract: ContractId,

    /// First date the contract trades
    pub first_trade: NaiveDate,

    /// Expiry date
    pub expiry: NaiveDate,
}

impl SecurityExpiry {
    pub fn new(
        asset: impl Into<String>,
        contract: ContractId,
        first_trade: NaiveDate,
        expiry: NaiveDate,
    ) -> Self {
        Self {
            asset: asset.into(),
            contract,
            first_trade,
            expiry,
        }
    }
}

/// A single observed price for one contract on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentPrice {
    /// Observation date
    pub time: NaiveDate,

    /// Asset id
    pub asset: String,

    /// Contract the observation belongs to
    pub contract: ContractId,

    /// Settlement value
    pub value: Decimal,
}

impl InstrumentPrice {
    pub fn new(
        time: NaiveDate,
        asset: impl Into<String>,
        contract: ContractId,
        value: Decimal,
    ) -> Self {
        Self {
            time,
            asset: asset.into(),
            contract,
            value,
        }
    }
}
