use crate::shard::DEFAULT_MIN_COST_PER_SHARD;

/// Settings for dispatching a batch of solves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Upper bound on the number of shards run concurrently.
    pub max_parallelism: usize,
    /// Estimated cost one shard should carry before the batch is split further.
    pub min_cost_per_shard: u64,
    /// When false, every batch runs as one shard on the calling thread.
    pub parallel: bool,
}

impl DispatchConfig {
    /// Sequential dispatch on the calling thread.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism;
        self
    }

    pub fn with_min_cost_per_shard(mut self, min_cost_per_shard: u64) -> Self {
        self.min_cost_per_shard = min_cost_per_shard;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Parallelism actually available to the shard planner.
    pub fn effective_parallelism(&self) -> usize {
        if self.parallel {
            self.max_parallelism.max(1)
        } else {
            1
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_parallelism: rayon::current_num_threads(),
            min_cost_per_shard: DEFAULT_MIN_COST_PER_SHARD,
            parallel: true,
        }
    }
}
