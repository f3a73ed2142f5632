//! Synthetic memory traces for exercising the simulator without a recorded program.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::trace::{AccessKind, TraceEvent};

const ACCESS_SIZES: [u32; 4] = [1, 2, 4, 8];
const RECENT_WINDOW: usize = 16;

#[derive(Debug, Clone)]
pub struct TraceConfig {
    pub seed: u64,
    pub events: usize,
    /// Distinct blocks the generated addresses fall into.
    pub working_set: u64,
    /// Byte granularity addresses are generated at. Access sizes are limited to it,
    /// so with an aligned `base_address` no access straddles a block.
    pub block_size: u64,
    pub base_address: u64,
    /// Chance that an access repeats one of the last few addresses.
    pub reuse_probability: f64,
    /// Relative weights of instruction, load, store and modify events.
    pub weights: [u32; 4],
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            events: 1_000,
            working_set: 256,
            block_size: 16,
            base_address: 0x7ff0_0000,
            reuse_probability: 0.6,
            weights: [2, 4, 2, 1],
        }
    }
}

#[derive(Debug)]
pub struct TraceGenerator {
    config: TraceConfig,
    rng: StdRng,
    recent: Vec<(u64, u32)>,
}

impl TraceGenerator {
    pub fn new(config: TraceConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            recent: Vec::with_capacity(RECENT_WINDOW),
            config,
        }
    }

    pub fn generate(mut self) -> Vec<TraceEvent> {
        (0..self.config.events).map(|_| self.next_event()).collect()
    }

    /// The generated trace in the textual trace format, one event per line.
    pub fn generate_text(self) -> String {
        let mut text = self
            .generate()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        text.push('\n');
        text
    }

    fn next_event(&mut self) -> TraceEvent {
        let kind = self.next_kind();
        let reuse = self.config.reuse_probability.clamp(0.0, 1.0);

        let (address, size) = if !self.recent.is_empty() && self.rng.random_bool(reuse) {
            self.recent[self.rng.random_range(0..self.recent.len())]
        } else {
            let size = self.fitting_size();
            (self.fresh_address(size), size)
        };

        if self.recent.len() == RECENT_WINDOW {
            self.recent.remove(0);
        }
        self.recent.push((address, size));

        TraceEvent::new(kind, address, size)
    }

    fn next_kind(&mut self) -> AccessKind {
        const KINDS: [AccessKind; 4] = [
            AccessKind::Instruction,
            AccessKind::Load,
            AccessKind::Store,
            AccessKind::Modify,
        ];

        let total: u32 = self.config.weights.iter().sum();
        if total == 0 {
            return AccessKind::Load;
        }

        let mut random = self.rng.random_range(0..total);
        for (kind, weight) in KINDS.into_iter().zip(self.config.weights) {
            if random < weight {
                return kind;
            }
            random -= weight;
        }
        AccessKind::Load
    }

    /// A random access size no larger than a block.
    fn fitting_size(&mut self) -> u32 {
        let block_size = self.config.block_size.max(1);
        let fitting = ACCESS_SIZES
            .iter()
            .take_while(|size| u64::from(**size) <= block_size)
            .count();

        // sizes are ascending and start at 1, so at least one always fits
        ACCESS_SIZES[self.rng.random_range(0..fitting.max(1))]
    }

    fn fresh_address(&mut self, size: u32) -> u64 {
        let block_size = self.config.block_size.max(1);
        let block = self.rng.random_range(0..self.config.working_set.max(1));

        let slots = (block_size / u64::from(size)).max(1);
        let offset = self.rng.random_range(0..slots) * u64::from(size);

        self.config
            .base_address
            .wrapping_add(block.wrapping_mul(block_size))
            .wrapping_add(offset % block_size)
    }
}
