//! Command-line driver for hierarchical reward evaluation
//!
//! Reads transitions as JSON lines, evaluates them against a registered
//! reward configuration, and writes one reward per line to stdout.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reward_graph_core::{TerminalPolicy, Transition};
use reward_graph_envs::{default_registry, EnvParams};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "reward-graph", about = "Hierarchical reward graph evaluation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered reward configurations
    List,
    /// Evaluate a JSONL transition stream against a configuration
    Eval {
        /// Registered configuration name, e.g. cart_pole_obst/graph_chain
        #[arg(long)]
        reward: String,

        /// JSON file of environment parameters
        #[arg(long)]
        params: PathBuf,

        /// JSONL transition file; stdin when omitted
        #[arg(long)]
        transitions: Option<PathBuf>,

        /// Convert to potential-based shaping
        #[arg(long)]
        potential: bool,

        /// Discount constant for potential shaping
        #[arg(long, default_value_t = 1.0)]
        gamma: f64,

        /// Print the per-node component breakdown instead of bare values
        #[arg(long)]
        components: bool,
    },
    /// Parse a requirement constraint file and print it as JSON
    Parse {
        /// Constraint file; stdin when omitted
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match Cli::parse().command {
        Command::List => list(),
        Command::Eval {
            reward,
            params,
            transitions,
            potential,
            gamma,
            components,
        } => eval(&reward, &params, transitions.as_deref(), potential, gamma, components),
        Command::Parse { file } => parse_constraints(file.as_deref()),
    }
}

fn list() -> Result<()> {
    for name in default_registry().names() {
        println!("{name}");
    }
    Ok(())
}

fn eval(
    reward: &str,
    params_path: &std::path::Path,
    transitions: Option<&std::path::Path>,
    potential: bool,
    gamma: f64,
    components: bool,
) -> Result<()> {
    let params: EnvParams = serde_json::from_reader(
        File::open(params_path)
            .with_context(|| format!("opening params file {}", params_path.display()))?,
    )
    .context("parsing environment parameters")?;

    let mut evaluator = default_registry().build(reward, &params)?;
    if potential {
        evaluator = evaluator.with_potential(gamma, TerminalPolicy::Shaped);
    }
    info!(reward, nodes = evaluator.graph().len(), "evaluator ready");

    let reader: Box<dyn BufRead> = match transitions {
        Some(path) => Box::new(BufReader::new(
            File::open(path)
                .with_context(|| format!("opening transitions file {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stdout = io::stdout();
    let mut total = 0.0;
    let mut steps = 0usize;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let transition: Transition = serde_json::from_str(&line)
            .with_context(|| format!("parsing transition on line {}", lineno + 1))?;
        let result = evaluator.evaluate(&transition)?;
        total += result.value;
        steps += 1;
        if components {
            serde_json::to_writer(stdout.lock(), &result)?;
            println!();
        } else {
            println!("{}", result.value);
        }
    }
    info!(steps, total, "episode evaluated");
    Ok(())
}

fn parse_constraints(file: Option<&std::path::Path>) -> Result<()> {
    let mut text = String::new();
    match file {
        Some(path) => {
            File::open(path)
                .with_context(|| format!("opening constraint file {}", path.display()))?
                .read_to_string(&mut text)?;
        }
        None => {
            io::stdin().read_to_string(&mut text)?;
        }
    }
    let constraints = reward_graph_parser::parse(text.trim())?;
    serde_json::to_writer_pretty(io::stdout(), &constraints)?;
    println!();
    Ok(())
}
