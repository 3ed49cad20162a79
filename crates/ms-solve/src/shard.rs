use std::ops::Range;

/// Minimum estimated work a shard should carry before another one is
/// worth scheduling.
pub const DEFAULT_MIN_COST_PER_SHARD: u64 = 10_000;

/// Split of a batch into contiguous index ranges of (nearly) equal size.
///
/// Every shard except possibly the last holds `block_size` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardPlan {
    pub units: usize,
    pub num_shards: usize,
    pub block_size: usize,
}

impl ShardPlan {
    /// Plan `units` pieces of work costing `cost_per_unit` each.
    ///
    /// The shard count grows with the total cost, one shard per
    /// `min_cost_per_shard`, and is capped by `max_parallelism` and by the
    /// number of units. Cheap batches run as a single shard.
    pub fn new(
        units: usize,
        cost_per_unit: u64,
        max_parallelism: usize,
        min_cost_per_shard: u64,
    ) -> Self {
        if units == 0 {
            return ShardPlan {
                units: 0,
                num_shards: 0,
                block_size: 0,
            };
        }

        let total_cost = (units as u64).saturating_mul(cost_per_unit);
        let by_cost = total_cost / min_cost_per_shard.max(1);
        let cap = max_parallelism.max(1).min(units);
        let wanted = usize::try_from(by_cost).unwrap_or(usize::MAX).clamp(1, cap);

        let block_size = units.div_ceil(wanted);
        ShardPlan {
            units,
            num_shards: units.div_ceil(block_size),
            block_size,
        }
    }

    /// Batch indices covered by shard `shard`.
    pub fn range(&self, shard: usize) -> Range<usize> {
        let start = (shard * self.block_size).min(self.units);
        let end = (start + self.block_size).min(self.units);
        start..end
    }

    /// All shard ranges, in batch order.
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.num_shards).map(move |shard| self.range(shard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch() {
        let plan = ShardPlan::new(0, 1_000_000, 8, DEFAULT_MIN_COST_PER_SHARD);
        assert_eq!(plan.num_shards, 0);
        assert_eq!(plan.ranges().count(), 0);
    }

    #[test]
    fn test_cheap_batch_single_shard() {
        // 100 2x2 solves: 100 * 2*2*(2+1) = 1200, below one shard's worth.
        let plan = ShardPlan::new(100, 12, 8, DEFAULT_MIN_COST_PER_SHARD);
        assert_eq!(plan.num_shards, 1);
        assert_eq!(plan.range(0), 0..100);
    }

    #[test]
    fn test_capped_by_parallelism() {
        let plan = ShardPlan::new(1000, 1_000_000, 4, DEFAULT_MIN_COST_PER_SHARD);
        assert_eq!(plan.num_shards, 4);
        assert_eq!(plan.block_size, 250);
    }

    #[test]
    fn test_capped_by_units() {
        let plan = ShardPlan::new(3, u64::MAX, 64, DEFAULT_MIN_COST_PER_SHARD);
        assert_eq!(plan.num_shards, 3);
        assert_eq!(plan.block_size, 1);
    }

    #[test]
    fn test_scales_with_cost() {
        // Total cost 50_000 -> 5 shards of work.
        let plan = ShardPlan::new(10, 5_000, 16, DEFAULT_MIN_COST_PER_SHARD);
        assert_eq!(plan.num_shards, 5);
        assert_eq!(plan.block_size, 2);
    }

    #[test]
    fn test_ranges_cover_batch_once() {
        for units in [1usize, 7, 10, 33, 100] {
            for parallelism in [1usize, 2, 3, 8] {
                let plan = ShardPlan::new(units, 1 << 20, parallelism, DEFAULT_MIN_COST_PER_SHARD);
                assert!(plan.num_shards <= parallelism.min(units));
                let mut next = 0;
                for range in plan.ranges() {
                    assert_eq!(range.start, next);
                    assert!(!range.is_empty());
                    next = range.end;
                }
                assert_eq!(next, units);
            }
        }
    }

    #[test]
    fn test_zero_parallelism_treated_as_one() {
        let plan = ShardPlan::new(10, 1 << 30, 0, DEFAULT_MIN_COST_PER_SHARD);
        assert_eq!(plan.num_shards, 1);
    }
}
