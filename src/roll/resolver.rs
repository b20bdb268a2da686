//! Far and carry contract offsets per held month.
//!
//! For each month letter an asset holds, the resolver computes how many
//! whole months separate the held contract from (a) the next contract
//! in the hold ring, which the asset rolls into, and (b) the carry
//! contract, a signed ring step away in the priced cycle. Offsets are
//! whole months; applying them to a contract id may roll the year.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::month_code::code_to_month;

use super::config::{RollConfig, RollConfigError};

/// Whole-month distances from a held contract to its far and carry contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractOffsets {
    /// Months to the next held contract, always 1..=12
    pub far_months: i32,

    /// Months to the carry contract; sign matches the configured ring step
    pub carry_months: i32,
}

/// Resolve far/carry month offsets for every month letter the asset holds.
///
/// Fails eagerly on configuration that cannot be resolved
/// deterministically: a zero carry step, or a held month absent from the
/// priced cycle. Such configs must not silently produce a
/// plausible-but-wrong calendar.
pub fn resolve_contract_offsets(
    config: &RollConfig,
) -> Result<HashMap<char, ContractOffsets>, RollConfigError> {
    if config.carry_contract_offset == 0 {
        return Err(RollConfigError::ZeroCarryOffset {
            asset: config.asset.clone(),
        });
    }

    let mut offsets = HashMap::with_capacity(config.hold_roll_cycle.len());
    for &held in config.hold_roll_cycle.letters() {
        let held_month = month_number(held)? as i32;

        // Far leg: the next letter in the hold ring, normalized strictly
        // ahead. A one-letter ring rolls into next year's same month.
        let far = config
            .hold_roll_cycle
            .next_after(held)
            .ok_or(RollConfigError::InvalidMonthCode(held))?;
        let mut far_months = month_number(far)? as i32 - held_month;
        if far_months <= 0 {
            far_months += 12;
        }

        // Carry leg: signed ring step in the priced cycle. The naive month
        // difference is corrected by 12 wherever its sign disagrees with
        // the step, so the carry never wraps the wrong way across a year
        // boundary. A zero difference stays zero.
        let carry = config
            .priced_roll_cycle
            .step(held, config.carry_contract_offset)
            .ok_or_else(|| RollConfigError::UnpricedHeldMonth {
                asset: config.asset.clone(),
                month: held,
                priced: config.priced_roll_cycle.to_string(),
            })?;
        let mut carry_months = month_number(carry)? as i32 - held_month;
        if config.carry_contract_offset > 0 && carry_months < 0 {
            carry_months += 12;
        } else if config.carry_contract_offset < 0 && carry_months > 0 {
            carry_months -= 12;
        }

        offsets.insert(
            held,
            ContractOffsets {
                far_months,
                carry_months,
            },
        );
    }

    debug!(
        asset = %config.asset,
        held_months = offsets.len(),
        "resolved contract offsets"
    );
    Ok(offsets)
}

fn month_number(letter: char) -> Result<u32, RollConfigError> {
    code_to_month(letter).ok_or(RollConfigError::InvalidMonthCode(letter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::offset::CalendarOffset;
    use crate::roll::config::RollCycle;

    fn quarterly_config(carry_contract_offset: i32) -> RollConfig {
        RollConfig::new(
            "ES",
            RollCycle::parse("HMUZ").unwrap(),
            RollCycle::parse("FGHJKMNQUVXZ").unwrap(),
            CalendarOffset::days(-5),
            carry_contract_offset,
        )
    }

    #[test]
    fn test_quarterly_hold_monthly_priced_negative_carry() {
        let offsets = resolve_contract_offsets(&quarterly_config(-1)).unwrap();

        // Held H (Mar): far is M (Jun), carry is G (Feb)
        let h = offsets[&'H'];
        assert_eq!(h.far_months, 3);
        assert_eq!(h.carry_months, -1);

        // Every held month rolls three months ahead and carries one behind
        for letter in ['H', 'M', 'U', 'Z'] {
            let o = offsets[&letter];
            assert_eq!(o.far_months, 3);
            assert_eq!(o.carry_months, -1);
        }
    }

    #[test]
    fn test_positive_carry_wraps_forward() {
        let offsets = resolve_contract_offsets(&quarterly_config(1)).unwrap();

        // Held Z (Dec): carry steps to F (Jan), one month ahead across
        // the year boundary, not eleven behind.
        assert_eq!(offsets[&'Z'].carry_months, 1);
        assert_eq!(offsets[&'H'].carry_months, 1);
    }

    #[test]
    fn test_negative_carry_wraps_backward() {
        let offsets = resolve_contract_offsets(&quarterly_config(-1)).unwrap();

        // Held F would be the wrap case, but F is not held here; Z's
        // carry is X (Nov), one month behind.
        assert_eq!(offsets[&'Z'].carry_months, -1);

        // Monthly hold: held F (Jan) carries Z (Dec), wrapping backward.
        let config = RollConfig::new(
            "CL",
            RollCycle::parse("FGHJKMNQUVXZ").unwrap(),
            RollCycle::parse("FGHJKMNQUVXZ").unwrap(),
            CalendarOffset::days(-5),
            -1,
        );
        let offsets = resolve_contract_offsets(&config).unwrap();
        assert_eq!(offsets[&'F'].carry_months, -1);
        assert_eq!(offsets[&'F'].far_months, 1);
    }

    #[test]
    fn test_single_letter_hold_cycle() {
        let config = RollConfig::new(
            "Z1",
            RollCycle::parse("Z").unwrap(),
            RollCycle::parse("FGHJKMNQUVXZ").unwrap(),
            CalendarOffset::days(-5),
            -1,
        );
        let offsets = resolve_contract_offsets(&config).unwrap();

        // Rolls into next year's Z
        assert_eq!(offsets[&'Z'].far_months, 12);
        assert_eq!(offsets[&'Z'].carry_months, -1);
    }

    #[test]
    fn test_zero_carry_offset_is_fatal() {
        let err = resolve_contract_offsets(&quarterly_config(0)).unwrap_err();
        assert_eq!(
            err,
            RollConfigError::ZeroCarryOffset {
                asset: "ES".to_string()
            }
        );
    }

    #[test]
    fn test_unpriced_held_month_is_fatal() {
        let config = RollConfig::new(
            "XX",
            RollCycle::parse("HMUZ").unwrap(),
            RollCycle::parse("MUZ").unwrap(), // H not priced
            CalendarOffset::days(-5),
            -1,
        );
        let err = resolve_contract_offsets(&config).unwrap_err();
        assert_eq!(
            err,
            RollConfigError::UnpricedHeldMonth {
                asset: "XX".to_string(),
                month: 'H',
                priced: "MUZ".to_string(),
            }
        );
    }
}
