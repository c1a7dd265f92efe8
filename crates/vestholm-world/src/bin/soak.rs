//! Soak runner: build a fixture world, churn the sweep, print a JSON
//! report on stdout.

use std::process;

use clap::Parser;

use vestholm_world::{run_soak, SoakConfig};

#[derive(Parser)]
#[command(name = "vestholm-soak")]
#[command(about = "Deterministic soak run over the world sweep", version)]
struct Cli {
    /// Fixture and rng seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Map size parameter (cols = 2^(5 + size/2))
    #[arg(long, default_value_t = 3)]
    size: u32,

    /// Number of update calls
    #[arg(long, default_value_t = 256)]
    steps: u32,

    /// Ticks advanced per update call
    #[arg(long, default_value_t = 20)]
    tick_step: u16,
}

fn main() {
    let cli = Cli::parse();
    if cli.size == 0 {
        eprintln!("--size must be at least 1");
        process::exit(2);
    }

    let config = SoakConfig {
        seed: cli.seed,
        size: cli.size,
        steps: cli.steps,
        tick_step: cli.tick_step,
    };

    match run_soak(&config) {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("report encode failed: {err}");
                process::exit(1);
            }
        },
        Err(err) => {
            eprintln!("soak failed: {err}");
            process::exit(1);
        }
    }
}
