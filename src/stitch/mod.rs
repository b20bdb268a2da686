//! Price assembly and backward-Panama stitching.

pub mod assembler;
pub mod panama;

pub use assembler::{
    assemble_unadjusted, roll_calendar_prices, LegPriceRow, UnadjustedRow, UnadjustedSeries,
    DEFAULT_STITCH_LOOKBACK,
};
pub use panama::{stitch_panama_backward, StitchedRow, StitchedSeries};

/// Split rows sorted by asset into contiguous per-asset slices.
fn partition_by_asset<T, F>(rows: &[T], asset_of: F) -> Vec<&[T]>
where
    F: Fn(&T) -> &str,
{
    let mut partitions = Vec::new();
    let mut start = 0usize;
    for end in 1..=rows.len() {
        if end == rows.len() || asset_of(&rows[end]) != asset_of(&rows[start]) {
            partitions.push(&rows[start..end]);
            start = end;
        }
    }
    partitions
}
