/// Hit, miss and eviction totals of one simulated run.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    pub hit_count: u64,
    pub miss_count: u64,
    pub eviction_count: u64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, cache_hit: CacheHit) {
        match cache_hit {
            CacheHit::Hit => self.hit_count += 1,
            CacheHit::Miss { evicted } => {
                self.miss_count += 1;
                if evicted.is_some() {
                    self.eviction_count += 1;
                }
            }
        }
    }

    pub fn accesses(&self) -> u64 {
        self.hit_count + self.miss_count
    }

    /// `0.0` before any access.
    pub fn percent_hit(&self) -> f64 {
        self.percent_of(self.hit_count)
    }

    /// `0.0` before any access.
    pub fn percent_miss(&self) -> f64 {
        self.percent_of(self.miss_count)
    }

    fn percent_of(&self, count: u64) -> f64 {
        match self.accesses() {
            0 => 0.0,
            accesses => 100.0 * count as f64 / accesses as f64,
        }
    }

    pub fn format_summary(&self) -> String {
        let mut result = vec![self.to_string()];
        if self.accesses() > 0 {
            result.push(format!("Percent Hits: {:.3}%", self.percent_hit()));
            result.push(format!("Percent Misses: {:.3}%", self.percent_miss()));
        }

        result.join("\n")
    }
}

impl std::fmt::Display for Counters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "hits:{} misses:{} evictions:{}",
            self.hit_count, self.miss_count, self.eviction_count
        ))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CacheHit {
    Hit,
    Miss { evicted: Option<u64> },
}

impl std::fmt::Display for CacheHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheHit::Hit => f.write_str("hit"),
            CacheHit::Miss { evicted: None } => f.write_str("miss"),
            CacheHit::Miss { evicted: Some(_) } => f.write_str("miss eviction"),
        }
    }
}
