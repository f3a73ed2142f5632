use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;

use crate::cache::CacheStore;
use crate::error::SimError;
use crate::geometry::Geometry;
use crate::lru;
use crate::simulation_result::{CacheHit, Counters};
use crate::trace::{AccessKind, TraceEvent, TraceReader};

/// One simulated cache run: the geometry, the line storage and the counters it accumulates.
#[derive(Debug, Clone)]
pub struct Simulation {
    geometry: Geometry,
    store: CacheStore,
    counters: Counters,
}

/// Outcome of a single trace event. A modify produces two accesses.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EventOutcome {
    pub first: CacheHit,
    pub second: Option<CacheHit>,
}

impl std::fmt::Display for EventOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.second {
            Some(second) => f.write_fmt(format_args!("{} {second}", self.first)),
            None => f.write_fmt(format_args!("{}", self.first)),
        }
    }
}

impl Simulation {
    pub fn new(geometry: Geometry) -> Result<Self, SimError> {
        debug!("initializing cache {geometry}");

        Ok(Self {
            geometry,
            store: CacheStore::new(&geometry)?,
            counters: Counters::new(),
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Simulates one access and records it in the counters.
    pub fn access(&mut self, address: u64) -> CacheHit {
        let cache_hit = lru::access(&mut self.store, &self.geometry, address);
        self.counters.record(cache_hit);
        cache_hit
    }

    /// Loads and stores access the cache once, a modify is a load followed by a store.
    ///
    /// Returns `None` for instruction fetches, which are not simulated.
    pub fn apply(&mut self, event: &TraceEvent) -> Option<EventOutcome> {
        match event.kind {
            AccessKind::Instruction => None,
            AccessKind::Load | AccessKind::Store => Some(EventOutcome {
                first: self.access(event.address),
                second: None,
            }),
            AccessKind::Modify => {
                let first = self.access(event.address);
                let second = self.access(event.address);
                Some(EventOutcome {
                    first,
                    second: Some(second),
                })
            }
        }
    }

    /// Applies every event in order and returns the accumulated counters.
    pub fn run<'a>(&mut self, events: impl IntoIterator<Item = &'a TraceEvent>) -> Counters {
        for event in events {
            self.apply(event);
        }
        self.counters
    }

    /// Replays a trace file, calling `on_event` with each data event and its outcome.
    pub fn simulate_file(
        &mut self,
        file: impl AsRef<Path>,
        mut on_event: impl FnMut(&TraceEvent, &EventOutcome),
    ) -> Result<Counters, SimError> {
        let path = file.as_ref();
        let io_error = |source| SimError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = TraceReader::new(BufReader::new(File::open(path).map_err(io_error)?));
        for event in reader.by_ref() {
            let event = event.map_err(io_error)?;
            if let Some(outcome) = self.apply(&event) {
                on_event(&event, &outcome);
            }
        }

        debug!(
            "{}: {} instruction fetches ignored, {} lines skipped",
            path.display(),
            reader.instructions(),
            reader.skipped()
        );

        Ok(self.counters)
    }

    /// Empties the cache and zeroes the counters so the context can run another trace.
    pub fn reset(&mut self) {
        self.store.reset();
        self.counters = Counters::new();
    }

    /// Releases the line storage and hands back the final counters.
    pub fn finish(self) -> Counters {
        self.store.release();
        self.counters
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::trace::data_events;

    fn simulation(set_bits: u32, lines_per_set: usize, block_bits: u32) -> Simulation {
        Simulation::new(Geometry::new(set_bits, lines_per_set, block_bits).unwrap()).unwrap()
    }

    fn run_addresses(simulation: &mut Simulation, addresses: &[u64]) -> Counters {
        for address in addresses {
            simulation.access(*address);
        }
        simulation.counters()
    }

    #[test]
    fn direct_mapped_two_sets() {
        let mut simulation = simulation(1, 1, 1);

        assert_eq!(
            run_addresses(&mut simulation, &[0, 0, 2]),
            Counters {
                hit_count: 1,
                miss_count: 2,
                eviction_count: 0
            }
        );
    }

    #[test]
    fn direct_mapped_same_set_different_tag_evicts() {
        // 4 = 0b100: set (4 >> 1) & 1 = 0, tag 4 >> 2 = 1, conflicts with address 0
        let mut simulation = simulation(1, 1, 1);

        assert_eq!(
            run_addresses(&mut simulation, &[0, 0, 4]),
            Counters {
                hit_count: 1,
                miss_count: 2,
                eviction_count: 1
            }
        );
    }

    #[test]
    fn single_two_way_set_evicts_lru() {
        let mut simulation = simulation(0, 2, 0);

        assert_eq!(simulation.access(0), CacheHit::Miss { evicted: None });
        assert_eq!(simulation.access(8), CacheHit::Miss { evicted: None });
        assert_eq!(simulation.access(0), CacheHit::Hit);
        assert_eq!(simulation.access(16), CacheHit::Miss { evicted: Some(8) });
        assert_eq!(
            simulation.counters(),
            Counters {
                hit_count: 1,
                miss_count: 3,
                eviction_count: 1
            }
        );
    }

    #[test]
    fn modify_of_unseen_address_misses_then_hits() {
        let mut simulation = simulation(2, 1, 2);
        let outcome = simulation.apply(&TraceEvent::new(AccessKind::Modify, 0x30, 4));

        assert_eq!(
            outcome,
            Some(EventOutcome {
                first: CacheHit::Miss { evicted: None },
                second: Some(CacheHit::Hit),
            })
        );
        assert_eq!(simulation.counters().to_string(), "hits:1 misses:1 evictions:0");
    }

    #[test]
    fn instruction_fetches_are_not_simulated() {
        let mut simulation = simulation(1, 1, 1);

        assert_eq!(
            simulation.apply(&TraceEvent::new(AccessKind::Instruction, 0, 4)),
            None
        );
        assert_eq!(simulation.counters(), Counters::new());
    }

    #[test]
    fn direct_mapped_conflicts_always_evict() {
        let mut simulation = simulation(1, 1, 0);
        run_addresses(&mut simulation, &[0b00, 0b10, 0b00, 0b10]);

        assert_eq!(
            simulation.counters(),
            Counters {
                hit_count: 0,
                miss_count: 4,
                eviction_count: 3
            }
        );
    }

    #[test]
    fn run_over_a_parsed_trace() {
        // yi.trace from the cache lab
        let trace = " L 10,1\n M 20,1\n L 22,1\n S 18,1\n L 110,1\n L 210,1\n M 12,1\n";
        let events = data_events(trace).collect::<Vec<_>>();

        let mut simulation = simulation(4, 1, 4);
        let counters = simulation.run(&events);

        assert_eq!(counters.to_string(), "hits:4 misses:5 evictions:3");
    }

    #[test]
    fn outcome_display_lists_each_access() {
        let mut simulation = simulation(0, 1, 0);
        let first = simulation
            .apply(&TraceEvent::new(AccessKind::Load, 1, 1))
            .unwrap();
        let second = simulation
            .apply(&TraceEvent::new(AccessKind::Modify, 2, 1))
            .unwrap();

        assert_eq!(first.to_string(), "miss");
        assert_eq!(second.to_string(), "miss eviction hit");
    }

    #[test]
    fn reset_starts_a_fresh_run() {
        let mut simulation = simulation(0, 1, 0);
        run_addresses(&mut simulation, &[1, 2]);

        simulation.reset();

        assert_eq!(simulation.counters(), Counters::new());
        assert_eq!(simulation.access(2), CacheHit::Miss { evicted: None });
        assert_eq!(simulation.finish().miss_count, 1);
    }

    #[test]
    fn missing_trace_file_is_an_io_error() {
        let mut simulation = simulation(1, 1, 1);
        let result = simulation.simulate_file("does/not/exist.trace", |_, _| {});

        assert!(matches!(result, Err(SimError::Io { .. })));
    }
}
