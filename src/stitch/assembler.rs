//! Unadjusted series assembly.
//!
//! Joins a roll calendar against per-contract price histories to
//! produce two views: the roll-date leg table (near/far/carry prices at
//! each roll, with bounded backward repair of missing legs) and the
//! daily unadjusted series, where each day carries the price of the
//! contract held that day and each roll date additionally carries the
//! incoming contract and its same-day value.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound::{Excluded, Included};

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calendar::CalendarOffset;
use crate::instruments::{ContractId, InstrumentPrice};
use crate::roll::{RollCalendar, RollCalendarRow};

use super::partition_by_asset;

/// Conventional repair window: up to fifteen days back from the roll date.
pub const DEFAULT_STITCH_LOOKBACK: CalendarOffset = CalendarOffset::days(-15);

/// How far the first window of each asset reaches back before its
/// earliest roll date.
const FIRST_WINDOW_BACKSTOP: CalendarOffset = CalendarOffset::years(-5);

/// Near, far and carry prices observed at one roll date.
///
/// When the near or far price is missing at the roll date itself, all
/// three legs may instead come from the most recent earlier day inside
/// the lookback window on which the whole triple traded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegPriceRow {
    pub roll_date: NaiveDate,
    pub asset: String,
    pub near_contract: ContractId,
    pub far_contract: ContractId,
    pub carry_contract: ContractId,
    pub near_price: Option<Decimal>,
    pub far_price: Option<Decimal>,
    pub carry_price: Option<Decimal>,
}

/// One day of the unadjusted continuous series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnadjustedRow {
    pub time: NaiveDate,
    pub asset: String,
    /// Contract held on this day.
    pub instrument_id: ContractId,
    pub value: Decimal,
    /// Contract rolled into, set on roll dates only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_instrument_id: Option<ContractId>,
    /// Same-day price of the incoming contract, set on roll dates when
    /// the near and far legs were both priced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_value: Option<Decimal>,
}

/// Daily unadjusted rows for all assets, sorted by asset then time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnadjustedSeries {
    pub rows: Vec<UnadjustedRow>,
}

impl UnadjustedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Price observations indexed by asset and contract, dates ordered.
struct PriceIndex<'a> {
    assets: HashMap<&'a str, HashMap<ContractId, BTreeMap<NaiveDate, Decimal>>>,
}

impl<'a> PriceIndex<'a> {
    fn build(prices: &'a [InstrumentPrice]) -> Self {
        let mut assets: HashMap<&'a str, HashMap<ContractId, BTreeMap<NaiveDate, Decimal>>> =
            HashMap::new();
        let mut duplicates = 0usize;
        for price in prices {
            let prior = assets
                .entry(price.asset.as_str())
                .or_default()
                .entry(price.contract)
                .or_default()
                .insert(price.time, price.value);
            if prior.is_some() {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            debug!(rows = duplicates, "duplicate price observations overwritten");
        }
        Self { assets }
    }

    fn series(&self, asset: &str, contract: ContractId) -> Option<&BTreeMap<NaiveDate, Decimal>> {
        self.assets.get(asset)?.get(&contract)
    }

    fn value_at(&self, asset: &str, contract: ContractId, date: NaiveDate) -> Option<Decimal> {
        self.series(asset, contract)?.get(&date).copied()
    }
}

/// Build the roll-date leg table for a calendar.
///
/// Output has one row per calendar row, in calendar order. Legs missing
/// at the roll date and unrepairable within `stitch_lookback` stay
/// `None`. Only the lookback's magnitude matters: `15d` and `-15d`
/// describe the same backward window.
pub fn roll_calendar_prices(
    calendar: &RollCalendar,
    prices: &[InstrumentPrice],
    stitch_lookback: CalendarOffset,
) -> Vec<LegPriceRow> {
    let index = PriceIndex::build(prices);
    calendar
        .rows
        .par_iter()
        .map(|row| leg_prices_for(row, &index, stitch_lookback))
        .collect()
}

fn leg_prices_for(
    row: &RollCalendarRow,
    index: &PriceIndex<'_>,
    lookback: CalendarOffset,
) -> LegPriceRow {
    let triple_at = |date: NaiveDate| {
        (
            index.value_at(&row.asset, row.near_contract, date),
            index.value_at(&row.asset, row.far_contract, date),
            index.value_at(&row.asset, row.carry_contract, date),
        )
    };

    let (mut near, mut far, mut carry) = triple_at(row.roll_date);

    // A missing near or far leg breaks the roll adjustment, so hunt
    // backward for the most recent day where the whole triple traded.
    // Legs are replaced together, never mixed across days.
    if near.is_none() || far.is_none() {
        // The lookback magnitude sets the reach; "15d" and "-15d" name
        // the same window.
        let reach = if lookback.is_backward() {
            lookback
        } else {
            lookback.negated()
        };
        let bound = reach.apply(row.roll_date);
        let mut day = row.roll_date - Duration::days(1);
        while day >= bound {
            let (n, f, c) = triple_at(day);
            if n.is_some() && f.is_some() && c.is_some() {
                debug!(
                    asset = %row.asset,
                    roll_date = %row.roll_date,
                    source = %day,
                    "repaired roll legs from an earlier day"
                );
                near = n;
                far = f;
                carry = c;
                break;
            }
            day -= Duration::days(1);
        }
        if near.is_none() || far.is_none() {
            warn!(
                asset = %row.asset,
                roll_date = %row.roll_date,
                near = %row.near_contract,
                far = %row.far_contract,
                "roll legs missing and not repairable within the lookback"
            );
        }
    }

    LegPriceRow {
        roll_date: row.roll_date,
        asset: row.asset.clone(),
        near_contract: row.near_contract,
        far_contract: row.far_contract,
        carry_contract: row.carry_contract,
        near_price: near,
        far_price: far,
        carry_price: carry,
    }
}

/// Assemble the daily unadjusted series for a roll calendar.
///
/// Each calendar row claims the half-open window from the previous roll
/// date (exclusive) through its own roll date (inclusive); observations
/// of the near contract inside the window become daily rows. Roll dates
/// carry the incoming contract and its same-day value derived from the
/// (possibly repaired) leg spread, so every boundary the stitcher sees
/// compares the two contracts on a single day.
pub fn assemble_unadjusted(
    calendar: &RollCalendar,
    prices: &[InstrumentPrice],
    stitch_lookback: CalendarOffset,
) -> UnadjustedSeries {
    if calendar.is_empty() || prices.is_empty() {
        info!(rows = 0, "assembled unadjusted series");
        return UnadjustedSeries::default();
    }

    let index = PriceIndex::build(prices);
    let partitions = partition_by_asset(&calendar.rows, |row| row.asset.as_str());

    let assembled: Vec<Vec<UnadjustedRow>> = partitions
        .par_iter()
        .map(|part| assemble_asset(part, &index, stitch_lookback))
        .collect();

    let rows: Vec<UnadjustedRow> = assembled.into_iter().flatten().collect();
    info!(rows = rows.len(), "assembled unadjusted series");
    UnadjustedSeries { rows }
}

fn assemble_asset(
    calendar_rows: &[RollCalendarRow],
    index: &PriceIndex<'_>,
    lookback: CalendarOffset,
) -> Vec<UnadjustedRow> {
    let mut out = Vec::new();
    let earliest = match calendar_rows.iter().map(|row| row.roll_date).min() {
        Some(date) => date,
        None => return out,
    };

    // Exclusive lower bound of the current window.
    let mut window_start = FIRST_WINDOW_BACKSTOP.apply(earliest);

    for row in calendar_rows {
        if window_start >= row.roll_date {
            // Degenerate window from a non-monotonic calendar; emitting
            // it would double-count days already claimed.
            debug!(asset = %row.asset, roll_date = %row.roll_date, "skipping degenerate roll window");
            continue;
        }

        let legs = leg_prices_for(row, index, lookback);
        let spread = match (legs.near_price, legs.far_price) {
            (Some(near), Some(far)) => Some(far - near),
            _ => None,
        };

        let mut saw_roll_date = false;
        if let Some(series) = index.series(&row.asset, row.near_contract) {
            for (&time, &value) in series.range((Excluded(window_start), Included(row.roll_date))) {
                let on_roll_date = time == row.roll_date;
                if on_roll_date {
                    saw_roll_date = true;
                }
                out.push(UnadjustedRow {
                    time,
                    asset: row.asset.clone(),
                    instrument_id: row.near_contract,
                    value,
                    next_instrument_id: if on_roll_date { Some(row.far_contract) } else { None },
                    next_value: if on_roll_date {
                        spread.map(|spread| value + spread)
                    } else {
                        None
                    },
                });
            }
        }

        // A roll date without a raw near observation still carries its
        // boundary when the legs were repaired; synthesize the row so
        // the discontinuity is not silently dropped.
        if !saw_roll_date {
            if let (Some(near), Some(far)) = (legs.near_price, legs.far_price) {
                debug!(
                    asset = %row.asset,
                    roll_date = %row.roll_date,
                    "synthesized roll-date row from repaired legs"
                );
                out.push(UnadjustedRow {
                    time: row.roll_date,
                    asset: row.asset.clone(),
                    instrument_id: row.near_contract,
                    value: near,
                    next_instrument_id: Some(row.far_contract),
                    next_value: Some(far),
                });
            }
        }

        window_start = row.roll_date;
    }

    out
}
