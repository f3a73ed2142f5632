pub mod cache;
pub mod error;
pub mod generator;
pub mod geometry;
pub mod lru;
pub mod simulation;
pub mod simulation_result;
pub mod trace;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
use wasm_bindgen::prelude::*;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
#[wasm_bindgen]
pub fn run_simulation(trace: &str, set_bits: u32, lines_per_set: usize, block_bits: u32) -> String {
    use geometry::Geometry;
    use simulation::Simulation;

    let geometry = match Geometry::new(set_bits, lines_per_set, block_bits) {
        Ok(geometry) => geometry,
        Err(e) => return e.to_string(),
    };

    let mut simulation = match Simulation::new(geometry) {
        Ok(simulation) => simulation,
        Err(e) => return e.to_string(),
    };

    let mut result = vec![geometry.format_info()];
    for event in crate::trace::data_events(trace) {
        if let Some(outcome) = simulation.apply(&event) {
            result.push(format!("{} {outcome}", event.to_string().trim_start()));
        }
    }
    result.push(simulation.finish().format_summary());

    result.join("\n")
}
