//! Security metadata inference from observed prices.
//!
//! When no real expiry table is available, approximate one from the
//! contracts seen in price history: the expiry sits
//! `approximate_expiry_offset` into the delivery month, and trading is
//! assumed to start two years before expiry, or thirty days before the
//! roll date, whichever is earlier.

use std::collections::BTreeSet;

use tracing::debug;

use crate::calendar::offset::CalendarOffset;
use crate::instruments::{ContractId, InstrumentPrice, SecurityExpiry};

use super::config::RollConfig;

/// Minimum trading window before expiry.
const MIN_TRADE_OFFSET: CalendarOffset = CalendarOffset::years(-2);

/// Buffer before the roll-derived start.
const FIRST_TRADE_BUFFER: CalendarOffset = CalendarOffset::days(-30);

/// Infer per-contract expiry rows for one asset from its price history.
///
/// Only contracts on the priced cycle are considered; duplicate
/// observations of a contract collapse to one row. Output is sorted by
/// contract.
pub fn infer_security_meta(
    config: &RollConfig,
    prices: &[InstrumentPrice],
) -> Vec<SecurityExpiry> {
    let mut contracts: BTreeSet<ContractId> = BTreeSet::new();
    for price in prices {
        if price.asset == config.asset && config.priced_roll_cycle.contains(price.contract.tenor)
        {
            contracts.insert(price.contract);
        }
    }

    let mut rows = Vec::with_capacity(contracts.len());
    for contract in contracts {
        let month_start = match contract.first_of_month() {
            Some(day) => day,
            None => continue,
        };
        let expiry = config.approximate_expiry_offset.apply(month_start);
        let roll_buffer = FIRST_TRADE_BUFFER.apply(config.roll_offset.apply(expiry));
        let min_trade = MIN_TRADE_OFFSET.apply(expiry);
        rows.push(SecurityExpiry::new(
            config.asset.clone(),
            contract,
            roll_buffer.min(min_trade),
            expiry,
        ));
    }
    debug!(
        asset = %config.asset,
        contracts = rows.len(),
        "inferred security metadata"
    );
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::roll::config::RollCycle;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly_config() -> RollConfig {
        RollConfig::new(
            "CL",
            RollCycle::parse("FGHJKMNQUVXZ").unwrap(),
            RollCycle::parse("FGHJKMNQUVXZ").unwrap(),
            CalendarOffset::days(-5),
            -1,
        )
        .with_approximate_expiry_offset(CalendarOffset::days(19))
    }

    #[test]
    fn test_infers_expiry_and_first_trade() {
        let config = monthly_config();
        let h26 = ContractId::new('H', 2026);
        let prices = vec![
            InstrumentPrice::new(date(2026, 2, 2), "CL", h26, dec!(61.20)),
            InstrumentPrice::new(date(2026, 2, 3), "CL", h26, dec!(61.45)),
        ];

        let meta = infer_security_meta(&config, &prices);
        assert_eq!(meta.len(), 1);

        let row = &meta[0];
        assert_eq!(row.contract, h26);
        assert_eq!(row.expiry, date(2026, 3, 20)); // month start + 19d
        // min(roll - 30d, expiry - 2y) = min(2026-02-13, 2024-03-20)
        assert_eq!(row.first_trade, date(2024, 3, 20));
    }

    #[test]
    fn test_skips_other_assets_and_unpriced_tenors() {
        let mut config = monthly_config();
        config.priced_roll_cycle = RollCycle::parse("HMUZ").unwrap();
        config.hold_roll_cycle = RollCycle::parse("HMUZ").unwrap();

        let prices = vec![
            InstrumentPrice::new(date(2026, 2, 2), "CL", ContractId::new('H', 2026), dec!(61)),
            InstrumentPrice::new(date(2026, 2, 2), "CL", ContractId::new('G', 2026), dec!(60)),
            InstrumentPrice::new(date(2026, 2, 2), "GC", ContractId::new('H', 2026), dec!(2950)),
        ];

        let meta = infer_security_meta(&config, &prices);
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].contract, ContractId::new('H', 2026));
        assert_eq!(meta[0].asset, "CL");
    }

    #[test]
    fn test_empty_prices() {
        assert!(infer_security_meta(&monthly_config(), &[]).is_empty());
    }
}
