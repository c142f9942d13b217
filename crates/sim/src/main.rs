//! MMC simulation binary.
//!
//! Drives the order-management core against a random workload: each tick
//! generates a batch of actions, drains the throttle queue, applies
//! acknowledgements, and collects garbage — strictly in that order, on one
//! thread. A single seed reproduces the whole run.

mod generator;
mod printer;

use std::path::PathBuf;

use clap::Parser;

use generator::ActionGenerator;
use mmc_core::config::AppConfig;
use mmc_oms::oracle::RandomOracle;
use mmc_oms::Engine;

/// MMC order-management core simulator.
#[derive(Parser, Debug)]
#[command(name = "mmc-sim", about = "MMC order-management core simulator")]
struct Args {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the workload generator and rate oracles. Drawn from OS
    /// entropy (and logged) when absent.
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of ticks to run (0 = run until interrupted).
    #[arg(long)]
    ticks: Option<u64>,

    /// Print the price ladder after every tick.
    #[arg(long)]
    print_book: bool,

    /// Emit JSON logs instead of human-readable logs.
    #[arg(long)]
    json_logs: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = AppConfig::load(args.config)?;
    if let Some(ticks) = args.ticks {
        config.sim.ticks = ticks;
    }
    if args.print_book {
        config.sim.print_book = true;
    }

    mmc_core::logging::init_tracing(args.json_logs);

    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(
        seed,
        ticks = config.sim.ticks,
        upper_price = config.engine.upper_price,
        "starting mmc-sim"
    );

    // Two independent streams derived from the one seed: exchange-side
    // rate decisions and client-side workload.
    let oracle = RandomOracle::new(
        seed,
        config.engine.throttle_closed_probability,
        config.engine.max_drain_per_tick,
        config.engine.max_acks_per_tick,
    );
    let mut engine = Engine::new(config.engine.clone(), Box::new(oracle));
    let mut workload = ActionGenerator::new(
        seed.wrapping_add(1),
        config.engine.upper_price,
        config.sim.max_actions_per_tick,
    );

    let mut tick: u64 = 0;
    while config.sim.ticks == 0 || tick < config.sim.ticks {
        tick += 1;
        tracing::debug!(tick, "tick");

        workload.run_tick(&mut engine)?;
        engine.process_throttle_queue()?;
        engine.ack_operations()?;
        engine.collect_garbage();
        engine.assert_book_not_crossed()?;

        if config.sim.print_book && printer::print_ladder(&engine.ladder()) {
            anyhow::bail!("shadow book crossed at tick {tick}");
        }
    }

    tracing::info!(
        tick,
        orders = engine.store().order_count(),
        operations = engine.store().operation_count(),
        queued = engine.throttle_ids().len(),
        resting = engine.book_ids().len(),
        "simulation complete"
    );
    Ok(())
}
