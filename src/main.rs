use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use markov_grid::algos::model_based::vi::DEFAULT_INITIAL_VALUE;
use markov_grid::report::{self, WorldSummary};
use markov_grid::*;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "markov-grid")]
#[command(version, about = "Value iteration and Q-learning on grid worlds", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a board with value iteration and print values and policy
    Mdp(MdpArgs),

    /// Learn action values on a board with Q-learning
    Qlearn(QlearnArgs),
}

#[derive(Args)]
struct MdpArgs {
    /// Board description (TOML)
    board: PathBuf,

    /// Stop once no estimate changes by this much between sweeps
    #[arg(long)]
    threshold: Option<f64>,

    /// Stop after this many sweeps
    #[arg(long)]
    iterations: Option<usize>,

    /// Value assumed for cells that have no estimate yet
    #[arg(long, default_value_t = DEFAULT_INITIAL_VALUE)]
    initial_value: f64,

    /// Write the per-sweep value table to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print a JSON summary instead of the text grids
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct QlearnArgs {
    /// Board description (TOML)
    board: PathBuf,

    #[arg(long, default_value_t = 10_000)]
    episodes: usize,

    /// RNG seed, entropy when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Print a JSON summary instead of the Q-table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Mdp(args) => mdp(args),
        Commands::Qlearn(args) => qlearn(args),
    }
}

fn load(path: &Path) -> Result<GridWorld> {
    GridWorld::load(path).with_context(|| format!("loading board {}", path.display()))
}

fn mdp(args: MdpArgs) -> Result<()> {
    let mut world = load(&args.board)?;

    let (converged, sweeps) = ValueIteration::with_initial_value(&mut world, args.initial_value)
        .exec(args.threshold, args.iterations)?;
    calculate_policy(&mut world, args.initial_value);

    if let Some(path) = &args.report {
        report::save_value_history(&world, path)?;
    }

    if args.json {
        let summary = WorldSummary {
            sweeps: Some(sweeps),
            converged: Some(converged),
            ..WorldSummary::new(&world, &world)
        };
        println!("{}", summary.to_json()?);
    } else {
        println!(
            "{}: {} sweeps, converged: {}",
            world.title(),
            sweeps,
            converged
        );
        print!("{}", report::render_values(&world));
        println!("{}", report::render_policy(&world, &world));
    }

    Ok(())
}

fn qlearn(args: QlearnArgs) -> Result<()> {
    let mut world = load(&args.board)?;

    let steps = QLearningAgent::new(&mut world, args.seed)?.learning(args.episodes)?;

    let policy = GreedyQPolicy { world: &world };
    if args.json {
        let summary = WorldSummary {
            episodes: Some(args.episodes),
            ..WorldSummary::new(&world, &policy)
        };
        println!("{}", summary.to_json()?);
    } else {
        println!(
            "{}: {} episodes, {} steps, epsilon: {}",
            world.title(),
            args.episodes,
            steps,
            world.epsilon()
        );
        print!("{}", report::render_q_table(&world, &policy));
    }

    Ok(())
}
