//! Ships an enumerator to worker threads as bytes, the way separate worker processes would
//! receive it, and merges their results by concatenation.

use std::thread;

use clap::Parser;
use log::info;

use gourgs_enum::{create_seeds, Enumerator, PrimitiveSet};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of workers.
    #[arg(value_name = "INT", default_value = "4")]
    workers: usize,

    /// Draws per worker.
    #[clap(long, value_name = "INT", default_value = "5")]
    draws: usize,

    /// Highest complexity index to draw from.
    #[clap(long, value_name = "INT", default_value = "10000")]
    max_complexity: u64,

    /// Base seed.
    #[clap(long, value_name = "INT", default_value = "42")]
    seed: u64,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let args = Cli::parse();
    println!("args = {:?}", args);

    let mut pset = PrimitiveSet::new();
    pset.add_operator("ant.if_food_ahead", 2)?;
    pset.add_operator("prog2", 2)?;
    pset.add_operator("prog3", 3)?;
    pset.add_variable("ant.move_forward()")?;
    pset.add_variable("ant.turn_left()")?;
    pset.add_variable("ant.turn_right()")?;

    let enumerator = Enumerator::new(pset);
    let bytes = enumerator.to_bytes()?;
    println!("Snapshot: {} bytes", bytes.len());

    // Disjoint seed lists, one per worker.
    let seeds = create_seeds(args.seed, args.workers * args.draws);

    let merged: Vec<String> = thread::scope(|scope| -> color_eyre::Result<Vec<String>> {
        let handles: Vec<_> = seeds
            .chunks(args.draws.max(1))
            .enumerate()
            .map(|(worker, chunk)| {
                let bytes = &bytes;
                scope.spawn(move || -> gourgs_enum::Result<Vec<String>> {
                    let enumerator = Enumerator::from_bytes(bytes)?;
                    info!("worker {} restored {:?}", worker, enumerator);
                    enumerator
                        .uniform_random_global_search(args.max_complexity, chunk.len(), chunk)?
                        .collect()
                })
            })
            .collect();

        let mut merged = Vec::new();
        for handle in handles {
            let part = handle
                .join()
                .map_err(|_| color_eyre::eyre::eyre!("worker panicked"))??;
            merged.extend(part);
        }
        Ok(merged)
    })?;

    // Every worker result is reproducible locally from the same seed.
    for (solution, &seed) in merged.iter().zip(&seeds) {
        let local = enumerator.uniform_random_global_search_once(args.max_complexity, seed)?;
        assert_eq!(&local, solution);
        println!("{:>20}: {}", seed, solution);
    }
    println!("Merged {} solutions from {} workers", merged.len(), args.workers);

    Ok(())
}
