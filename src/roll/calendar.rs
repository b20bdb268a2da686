//! Roll calendar construction.
//!
//! The builder turns per-asset configuration plus per-contract expiry
//! rows into the table of roll events downstream stages run on: when
//! each asset rolls, out of which contract (near), into which (far),
//! and against which carry reference.
//!
//! Assets are independent, so rows are built per asset partition in
//! parallel; the per-asset offset fill is a strictly ordered scan.

use std::collections::HashMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::instruments::{ContractId, SecurityExpiry};

use super::config::{RollConfig, RollConfigError};
use super::resolver::{resolve_contract_offsets, ContractOffsets};

/// One roll event: the date and the contract identities around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollCalendarRow {
    /// Date the held contract changes
    pub roll_date: NaiveDate,

    /// Asset id
    pub asset: String,

    /// Contract held up to and including the roll date
    pub near_contract: ContractId,

    /// Contract held after the roll date
    pub far_contract: ContractId,

    /// Carry reference for the near contract
    pub carry_contract: ContractId,

    /// Config-coverage marker, populated only when debug columns are requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_coverage: Option<bool>,
}

/// Roll events for all assets, sorted by (asset, roll_date).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RollCalendar {
    pub rows: Vec<RollCalendarRow>,
}

impl RollCalendar {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows belonging to one asset, in roll-date order.
    pub fn rows_for_asset<'a>(
        &'a self,
        asset: &'a str,
    ) -> impl Iterator<Item = &'a RollCalendarRow> {
        self.rows.iter().filter(move |row| row.asset == asset)
    }
}

/// Build the roll calendar for every configured asset.
///
/// Malformed configuration (zero carry step, held month missing from the
/// priced cycle) fails before any row work starts. Expiries for
/// unconfigured assets are dropped. An expiry month with no resolved
/// offset mapping borrows the nearest strictly-later resolved row's
/// offsets within its asset (a backward fill in roll-date order); rows
/// still unresolved after filling are dropped. Output is sorted by
/// (asset, roll_date) and strictly increasing per asset; a violation is
/// logged, never silently deduplicated.
pub fn build_roll_calendar(
    configs: &[RollConfig],
    expiries: &[SecurityExpiry],
    include_debug: bool,
) -> Result<RollCalendar, RollConfigError> {
    // Resolve every config up front so malformed configuration fails
    // before any row is built.
    let mut resolved: HashMap<&str, (&RollConfig, HashMap<char, ContractOffsets>)> =
        HashMap::with_capacity(configs.len());
    for config in configs {
        let offsets = resolve_contract_offsets(config)?;
        resolved.insert(config.asset.as_str(), (config, offsets));
    }

    let mut by_asset: HashMap<&str, Vec<&SecurityExpiry>> = HashMap::new();
    let mut unconfigured = 0usize;
    for expiry in expiries {
        if resolved.contains_key(expiry.asset.as_str()) {
            by_asset
                .entry(expiry.asset.as_str())
                .or_default()
                .push(expiry);
        } else {
            unconfigured += 1;
        }
    }
    if unconfigured > 0 {
        debug!(rows = unconfigured, "dropped expiries for unconfigured assets");
    }

    // Assets are independent; build each partition in parallel, then
    // restore the canonical (asset, roll_date) ordering.
    let mut partitions: Vec<(&str, Vec<RollCalendarRow>)> = by_asset
        .into_iter()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(asset, asset_expiries)| {
            let (config, offsets) = &resolved[asset];
            (
                asset,
                build_asset_rows(config, offsets, &asset_expiries, include_debug),
            )
        })
        .collect();
    partitions.sort_by(|a, b| a.0.cmp(b.0));

    let rows: Vec<RollCalendarRow> = partitions
        .into_iter()
        .flat_map(|(_, rows)| rows)
        .collect();

    verify_monotonic(&rows);
    info!(rows = rows.len(), "built roll calendar");
    Ok(RollCalendar { rows })
}

fn build_asset_rows(
    config: &RollConfig,
    offsets: &HashMap<char, ContractOffsets>,
    expiries: &[&SecurityExpiry],
    include_debug: bool,
) -> Vec<RollCalendarRow> {
    let mut pending: Vec<(NaiveDate, ContractId, Option<ContractOffsets>)> = expiries
        .iter()
        .map(|expiry| {
            // The roll identity follows the expiry date: its month letter
            // names the near contract, its year the contract year.
            let near = ContractId::from_date(expiry.expiry);
            let roll_date = config.roll_offset.apply(expiry.expiry);
            (roll_date, near, offsets.get(&near.tenor).copied())
        })
        .collect();

    // Fill in roll-date order so "nearest later" is well-defined.
    pending.sort_by_key(|&(roll_date, near, _)| (roll_date, near));

    // Backward fill: walk from the latest row down, carrying the nearest
    // strictly-later known offsets into unresolved rows. Rows after the
    // last resolved row stay unresolved.
    let mut carried: Option<ContractOffsets> = None;
    for row in pending.iter_mut().rev() {
        match row.2 {
            Some(known) => carried = Some(known),
            None => row.2 = carried,
        }
    }

    let mut rows = Vec::with_capacity(pending.len());
    let mut dropped = 0usize;
    for (roll_date, near, filled) in pending {
        let legs = match filled {
            Some(offsets) => offsets,
            None => {
                dropped += 1;
                continue;
            }
        };
        let far = near.offset_months(legs.far_months);
        let carry = near.offset_months(legs.carry_months);
        match (far, carry) {
            (Some(far_contract), Some(carry_contract)) => rows.push(RollCalendarRow {
                roll_date,
                asset: config.asset.clone(),
                near_contract: near,
                far_contract,
                carry_contract,
                has_coverage: if include_debug { Some(true) } else { None },
            }),
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!(
            asset = %config.asset,
            rows = dropped,
            "dropped roll rows without resolvable offsets"
        );
    }
    rows
}

fn verify_monotonic(rows: &[RollCalendarRow]) {
    for pair in rows.windows(2) {
        if pair[0].asset == pair[1].asset && pair[0].roll_date >= pair[1].roll_date {
            warn!(
                asset = %pair[1].asset,
                roll_date = %pair[1].roll_date,
                "roll dates are not strictly increasing"
            );
        }
    }
}
