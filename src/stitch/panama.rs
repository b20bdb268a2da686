//! Backward-Panama stitching.
//!
//! Historical prices absorb the sum of every later roll discontinuity.
//! Per asset, rows are walked newest to oldest; each roll adjustment
//! (`next_value - value` where the incoming contract was priced) joins
//! a running suffix sum added onto the unadjusted value. The newest row
//! has no later discontinuity and comes through unchanged, and the
//! adjusted step across a roll boundary equals the incoming contract's
//! own day-over-day move.

use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::instruments::ContractId;

use super::assembler::{UnadjustedRow, UnadjustedSeries};
use super::partition_by_asset;

/// One day of the back-adjusted continuous series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StitchedRow {
    pub time: NaiveDate,
    pub asset: String,
    /// Contract held on this day.
    pub instrument_id: ContractId,
    /// Price as originally observed.
    pub unadjusted: Decimal,
    /// Price shifted by the sum of all later roll discontinuities.
    pub panama_backwards: Decimal,
}

/// Back-adjusted rows for all assets, sorted by asset then time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StitchedSeries {
    pub rows: Vec<StitchedRow>,
}

impl StitchedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Stitch an unadjusted series into a backward-Panama adjusted one.
///
/// Input rows must be sorted by asset then time, as the assembler emits
/// them. The suffix accumulation is strictly sequential within an
/// asset; assets run in parallel. Boundaries whose `next_value` is
/// missing contribute nothing, so the raw discontinuity stays visible
/// in the output rather than being papered over.
pub fn stitch_panama_backward(series: &UnadjustedSeries) -> StitchedSeries {
    let partitions = partition_by_asset(&series.rows, |row| row.asset.as_str());

    let stitched: Vec<Vec<StitchedRow>> = partitions
        .par_iter()
        .map(|part| stitch_asset(part))
        .collect();

    let rows: Vec<StitchedRow> = stitched.into_iter().flatten().collect();
    info!(rows = rows.len(), "stitched backward-panama series");
    StitchedSeries { rows }
}

// The accumulator includes the row's own adjustment, so a roll date
// already reads at the incoming contract's level.
fn stitch_asset(rows: &[UnadjustedRow]) -> Vec<StitchedRow> {
    let mut out = Vec::with_capacity(rows.len());
    let mut cumulative = Decimal::ZERO;
    for row in rows.iter().rev() {
        let roll_adjustment = match row.next_value {
            Some(next_value) => next_value - row.value,
            None => Decimal::ZERO,
        };
        cumulative += roll_adjustment;
        out.push(StitchedRow {
            time: row.time,
            asset: row.asset.clone(),
            instrument_id: row.instrument_id,
            unadjusted: row.value,
            panama_backwards: row.value + cumulative,
        });
    }
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn cid(tenor: char, year: i32) -> ContractId {
        ContractId::new(tenor, year)
    }

    fn row(
        asset: &str,
        time: NaiveDate,
        contract: ContractId,
        value: Decimal,
        next: Option<(ContractId, Decimal)>,
    ) -> UnadjustedRow {
        UnadjustedRow {
            time,
            asset: asset.to_string(),
            instrument_id: contract,
            value,
            next_instrument_id: next.map(|(id, _)| id),
            next_value: next.map(|(_, value)| value),
        }
    }

    fn single_roll_series() -> UnadjustedSeries {
        let f = cid('F', 2026);
        let g = cid('G', 2026);
        UnadjustedSeries {
            rows: vec![
                row("CL", date(2025, 12, 16), f, dec!(10), None),
                row("CL", date(2025, 12, 17), f, dec!(11), Some((g, dec!(14)))),
                row("CL", date(2025, 12, 18), g, dec!(15), None),
                row("CL", date(2025, 12, 19), g, dec!(16), None),
            ],
        }
    }

    #[test]
    fn test_single_boundary_back_adjustment() {
        let stitched = stitch_panama_backward(&single_roll_series());

        let panama: Vec<Decimal> = stitched
            .rows
            .iter()
            .map(|row| row.panama_backwards)
            .collect();
        // The +3 spread at the roll shifts everything at and before it.
        assert_eq!(panama, vec![dec!(13), dec!(14), dec!(15), dec!(16)]);

        // The roll date reads at the incoming contract's level, so the
        // step into 12-18 is G26's own move (+1), not the raw +4 jump.
        assert_eq!(stitched.rows[1].panama_backwards, dec!(14));
        assert_eq!(stitched.rows[1].unadjusted, dec!(11));
    }

    #[test]
    fn test_latest_row_is_unchanged() {
        let stitched = stitch_panama_backward(&single_roll_series());
        let last = stitched.rows.last().unwrap();
        assert_eq!(last.panama_backwards, last.unadjusted);
    }

    #[test]
    fn test_adjustments_telescope_across_boundaries() {
        let f = cid('F', 2026);
        let g = cid('G', 2026);
        let h = cid('H', 2026);
        let series = UnadjustedSeries {
            rows: vec![
                row("CL", date(2025, 12, 16), f, dec!(10), None),
                row("CL", date(2025, 12, 17), f, dec!(11), Some((g, dec!(14)))),
                row("CL", date(2026, 1, 14), g, dec!(15), None),
                row("CL", date(2026, 1, 15), g, dec!(16), Some((h, dec!(18)))),
                row("CL", date(2026, 1, 16), h, dec!(19), None),
            ],
        };

        let stitched = stitch_panama_backward(&series);

        // Oldest row absorbs both spreads: +3 and +2.
        assert_eq!(stitched.rows[0].panama_backwards, dec!(15));
        // Between the boundaries only the later spread applies.
        assert_eq!(stitched.rows[2].panama_backwards, dec!(17));
        assert_eq!(stitched.rows[4].panama_backwards, dec!(19));
    }

    #[test]
    fn test_missing_next_value_contributes_nothing() {
        let f = cid('F', 2026);
        let g = cid('G', 2026);
        let series = UnadjustedSeries {
            rows: vec![
                row("CL", date(2025, 12, 16), f, dec!(10), None),
                // Boundary present but the incoming leg was never priced.
                UnadjustedRow {
                    time: date(2025, 12, 17),
                    asset: "CL".to_string(),
                    instrument_id: f,
                    value: dec!(11),
                    next_instrument_id: Some(g),
                    next_value: None,
                },
                row("CL", date(2025, 12, 18), g, dec!(15), None),
            ],
        };

        let stitched = stitch_panama_backward(&series);

        let panama: Vec<Decimal> = stitched
            .rows
            .iter()
            .map(|row| row.panama_backwards)
            .collect();
        assert_eq!(panama, vec![dec!(10), dec!(11), dec!(15)]);
    }

    #[test]
    fn test_assets_are_adjusted_independently() {
        let f = cid('F', 2026);
        let g = cid('G', 2026);
        let series = UnadjustedSeries {
            rows: vec![
                row("CL", date(2025, 12, 17), f, dec!(11), Some((g, dec!(14)))),
                row("CL", date(2025, 12, 18), g, dec!(15), None),
                row("NG", date(2025, 12, 17), f, dec!(3), Some((g, dec!(2)))),
                row("NG", date(2025, 12, 18), g, dec!(2.5), None),
            ],
        };

        let stitched = stitch_panama_backward(&series);

        assert_eq!(stitched.rows[0].panama_backwards, dec!(14)); // CL: +3
        assert_eq!(stitched.rows[1].panama_backwards, dec!(15));
        assert_eq!(stitched.rows[2].panama_backwards, dec!(2)); // NG: -1
        assert_eq!(stitched.rows[3].panama_backwards, dec!(2.5));
    }

    #[test]
    fn test_empty_series() {
        let stitched = stitch_panama_backward(&UnadjustedSeries::default());
        assert!(stitched.is_empty());
        assert_eq!(stitched.len(), 0);
    }
}
