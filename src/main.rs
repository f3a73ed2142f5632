use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use csim::geometry::Geometry;
use csim::simulation::Simulation;

/// Replays a valgrind memory trace against a set-associative LRU cache
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    after_help = "Examples:\n  csim -s 4 -E 1 -b 4 -t traces/yi.trace\n  csim -v -s 8 -E 2 -b 4 -t traces/yi.trace"
)]
struct Args {
    /// Number of set index bits
    #[arg(short = 's', value_name = "NUM", value_parser = clap::value_parser!(u32).range(1..))]
    set_bits: u32,

    /// Number of lines per set
    #[arg(short = 'E', value_name = "NUM", value_parser = clap::value_parser!(u64).range(1..))]
    lines_per_set: u64,

    /// Number of block offset bits
    #[arg(short = 'b', value_name = "NUM", value_parser = clap::value_parser!(u32).range(1..))]
    block_bits: u32,

    /// Trace file
    #[arg(short = 't', value_name = "FILE")]
    trace_file: PathBuf,

    /// Print the outcome of every access
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let lines_per_set = usize::try_from(args.lines_per_set)?;
    let geometry = Geometry::new(args.set_bits, lines_per_set, args.block_bits)?;
    log::debug!("{}", geometry.format_info());

    let mut simulation = Simulation::new(geometry)?;
    simulation.simulate_file(&args.trace_file, |event, outcome| {
        if args.verbose {
            println!("{} {outcome}", event.to_string().trim_start());
        }
    })?;

    println!("{}", simulation.finish());
    Ok(())
}
