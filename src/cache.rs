use log::debug;

use crate::error::SimError;
use crate::geometry::Geometry;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheLine {
    pub valid: bool,
    pub tag: u64,
    /// Logical clock of the last touch, local to the owning set.
    pub recency: u64,
}

/// Storage for `S` sets of `E` lines each.
///
/// Lines live in one row-major buffer: set `i` occupies `lines[i * E..(i + 1) * E]`.
#[derive(Debug, Clone)]
pub struct CacheStore {
    lines_per_set: usize,
    lines: Vec<CacheLine>,
}

impl CacheStore {
    /// Allocates every line empty (`valid = false`, `tag = 0`, `recency = 0`).
    pub fn new(geometry: &Geometry) -> Result<Self, SimError> {
        let sets = geometry.sets();
        let lines_per_set = geometry.lines_per_set();
        let allocation_error = SimError::Allocation {
            sets,
            lines_per_set,
        };

        let Some(total) = sets.checked_mul(lines_per_set) else {
            return Err(allocation_error);
        };

        let mut lines = Vec::new();
        if lines.try_reserve_exact(total).is_err() {
            return Err(allocation_error);
        }
        lines.resize(total, CacheLine::default());

        debug!("allocated {total} cache lines ({geometry})");

        Ok(Self {
            lines_per_set,
            lines,
        })
    }

    pub fn sets(&self) -> usize {
        self.lines.len() / self.lines_per_set
    }

    pub fn lines_per_set(&self) -> usize {
        self.lines_per_set
    }

    /// Panics if `set_index` is out of range.
    pub fn set(&self, set_index: usize) -> &[CacheLine] {
        &self.lines[self.set_range(set_index)]
    }

    /// Panics if `set_index` is out of range.
    pub fn set_mut(&mut self, set_index: usize) -> &mut [CacheLine] {
        let range = self.set_range(set_index);
        &mut self.lines[range]
    }

    /// Panics if either index is out of range.
    pub fn line(&mut self, set_index: usize, line_index: usize) -> &mut CacheLine {
        &mut self.set_mut(set_index)[line_index]
    }

    /// Returns every line to the empty state without reallocating.
    pub fn reset(&mut self) {
        self.lines.fill(CacheLine::default());
    }

    /// Frees the storage. Consuming `self` rules out any later access.
    pub fn release(self) {
        debug!("releasing {} cache lines", self.lines.len());
    }

    fn set_range(&self, set_index: usize) -> std::ops::Range<usize> {
        assert!(
            set_index < self.sets(),
            "set index {set_index} out of range for {} sets",
            self.sets()
        );

        let start = set_index * self.lines_per_set;
        start..start + self.lines_per_set
    }
}
