//! Work estimates for balancing batched solves across workers.

use ms_tensor::Shape;

/// Row count above which the estimate is clamped to [`MAX_COST`].
///
/// `rows^3` alone would already exceed 2^60 beyond this point.
pub const COST_CLAMP_ROWS: u64 = 1 << 20;

/// Saturated cost, returned for matrices larger than [`COST_CLAMP_ROWS`] and
/// whenever the product would overflow.
pub const MAX_COST: u64 = u64::MAX;

/// Estimated cost of solving one `A @ X = B` pair.
///
/// `input` and `rhs` are the 2-D shapes of a single unit of work: `rows` is
/// `input[0]` and `rhss` is `rhs[1]`. Missing dimensions count as zero.
/// The estimate is `rows^2 * (rows + rhss)`: `O(rows^3)` for the
/// factorization plus `O(rows^2 * rhss)` for the substitutions.
pub fn cost_per_unit(input: &Shape, rhs: &Shape) -> u64 {
    let rows = input.dims().first().copied().unwrap_or(0) as u64;
    let rhss = rhs.dims().get(1).copied().unwrap_or(0) as u64;
    estimate(rows, rhss)
}

/// [`cost_per_unit`] on raw dimension sizes.
///
/// Non-decreasing in both `rows` and `rhss`.
pub fn estimate(rows: u64, rhss: u64) -> u64 {
    if rows > COST_CLAMP_ROWS {
        return MAX_COST;
    }
    rows.saturating_mul(rows)
        .saturating_mul(rows.saturating_add(rhss))
}
