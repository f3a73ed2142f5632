use std::io::Write;

use clap::Parser;
use csim::generator::{TraceConfig, TraceGenerator};

/// Generates a synthetic valgrind-style memory trace on stdout
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of trace events
    #[arg(short = 'n', long, default_value = "1000")]
    events: usize,

    /// Seed for the random number generator
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Number of distinct blocks touched
    #[arg(long, default_value = "256")]
    working_set: u64,

    /// Block size in bytes
    #[arg(long, default_value = "16", value_parser = clap::value_parser!(u64).range(1..))]
    block_size: u64,

    /// First address of the working set (hex)
    #[arg(long, default_value = "7ff00000", value_parser = parse_hex)]
    base_address: u64,

    /// Probability of repeating a recent address (0.0 - 1.0)
    #[arg(long, default_value = "0.6", value_parser = parse_probability)]
    reuse: f64,

    /// Relative weights of I,L,S,M events
    #[arg(long, value_delimiter = ',', default_value = "2,4,2,1")]
    weights: Vec<u32>,
}

fn parse_hex(s: &str) -> Result<u64, String> {
    u64::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| e.to_string())
}

fn parse_probability(s: &str) -> Result<f64, String> {
    let p: f64 = s.parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("{p} is not between 0.0 and 1.0"))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let weights: [u32; 4] = args
        .weights
        .as_slice()
        .try_into()
        .map_err(|_| "expected exactly four weights")?;

    let config = TraceConfig {
        seed: args.seed,
        events: args.events,
        working_set: args.working_set,
        block_size: args.block_size,
        base_address: args.base_address,
        reuse_probability: args.reuse,
        weights,
    };
    log::debug!("{config:?}");

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(TraceGenerator::new(config).generate_text().as_bytes())?;

    Ok(())
}
