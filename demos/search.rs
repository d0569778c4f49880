use clap::{Parser, ValueEnum};

use gourgs_enum::{create_seeds, CountingMode, Enumerator, EnumeratorConfig, PrimitiveSet};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Vocabulary {
    /// Arithmetic: add/2, sub/1, truediv/3, mul/1 over x, y.
    Arith,
    /// Santa Fe ant: if_food_ahead/2, prog2/2, prog3/3 over the three ant moves.
    Ant,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Canonical order, starting from the smallest topology.
    Exhaustive,
    /// Seeded draws, uniform per complexity index.
    Random,
    /// Seeded draws, uniform over all configurations up to the complexity bound.
    Global,
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Search strategy.
    #[arg(value_enum, default_value = "exhaustive")]
    strategy: Strategy,

    /// Operator and terminal vocabulary.
    #[clap(long, value_enum, default_value = "arith")]
    vocabulary: Vocabulary,

    /// Highest complexity index to consider.
    #[clap(long, value_name = "INT", default_value = "100")]
    max_complexity: u64,

    /// Number of solutions to print.
    #[clap(short, long, value_name = "INT", default_value = "20")]
    count: usize,

    /// Base seed for the random strategies.
    #[clap(long, value_name = "INT", default_value = "0")]
    seed: u64,

    /// Count by materializing topologies instead of index arithmetic.
    #[clap(long)]
    reference: bool,
}

fn vocabulary(kind: Vocabulary) -> gourgs_enum::Result<PrimitiveSet> {
    let mut pset = PrimitiveSet::new();
    match kind {
        Vocabulary::Arith => {
            pset.add_operator("add", 2)?;
            pset.add_operator("sub", 1)?;
            pset.add_operator("truediv", 3)?;
            pset.add_operator("mul", 1)?;
            pset.add_variable("x")?;
            pset.add_variable("y")?;
        }
        Vocabulary::Ant => {
            pset.add_operator("ant.if_food_ahead", 2)?;
            pset.add_operator("prog2", 2)?;
            pset.add_operator("prog3", 3)?;
            pset.add_variable("ant.move_forward()")?;
            pset.add_variable("ant.turn_left()")?;
            pset.add_variable("ant.turn_right()")?;
        }
    }
    Ok(pset)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let mode = if args.reference {
        CountingMode::Reference
    } else {
        CountingMode::Memoized
    };
    let config = EnumeratorConfig::new(mode);
    let enumerator = Enumerator::with_config(vocabulary(args.vocabulary)?, config);
    println!("enumerator = {:?}", enumerator);

    let space = enumerator.calculate_q(args.max_complexity)?;
    println!(
        "Configurations up to complexity {}: {} ({} decimal digits)",
        args.max_complexity,
        space.total,
        space.total.to_string().len()
    );

    let seeds = create_seeds(args.seed, args.count);
    let solutions: Vec<String> = match args.strategy {
        Strategy::Exhaustive => enumerator
            .exhaustive_global_search(args.max_complexity)?
            .take(args.count)
            .collect::<Result<_, _>>()?,
        Strategy::Random => enumerator
            .uniform_random_global_search(args.max_complexity, args.count, &seeds)?
            .collect::<Result<_, _>>()?,
        Strategy::Global => seeds
            .iter()
            .map(|&seed| enumerator.globally_uniform_random_once(args.max_complexity, seed))
            .collect::<Result<_, _>>()?,
    };

    for (index, solution) in solutions.iter().enumerate() {
        let configuration = enumerator.configuration_of(solution)?;
        println!("{:>4}: {} {}", index, configuration, solution);
    }

    let stats = enumerator.cache_stats();
    println!(
        "Cache: {} entries, {} hits, {} misses (hit rate {:.1}%)",
        stats.entries,
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0
    );

    let time_total = time_total.elapsed();
    println!("Total time: {:.3} s", time_total.as_secs_f64());

    Ok(())
}
