//! Contract range generation.

use chrono::NaiveDate;

use crate::roll::config::RollCycle;

use super::types::ContractId;

/// Enumerate the cycle's contracts with delivery months between `start`
/// and `end` inclusive (month granularity), in chronological order.
///
/// The month containing `start` is the first candidate, so a mid-month
/// `start` still yields that month's contract when it is on the cycle.
pub fn contract_universe(cycle: &RollCycle, start: NaiveDate, end: NaiveDate) -> Vec<ContractId> {
    let mut out = Vec::new();
    let mut cursor = ContractId::from_date(start);
    while let Some(first) = cursor.first_of_month() {
        if first > end {
            break;
        }
        if cycle.contains(cursor.tenor) {
            out.push(cursor);
        }
        match cursor.offset_months(1) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    out
}
