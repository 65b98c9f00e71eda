use std::process;

use blackjack_rl::{simulation::DeckModel, DeckKind, Environment};
use blackjack_rl_drivers::{
    episodes::{evaluate_policy, ThresholdPolicy},
    init_logging, parse_config_from_file, resolve_config_path, ConfigError,
};
use clap::Parser;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(author, about = "Scores the fixed hit-below-threshold policy", long_about = None)]
struct CommandLineArgs {
    /// The path of the config file
    #[arg(short, long)]
    config: Option<String>,

    /// Overrides training.hit_below from the config file
    #[arg(long)]
    hit_below: Option<u8>,
}

fn main() {
    let args = CommandLineArgs::parse();
    if let Err(err) = run(args) {
        error!("{}", err);
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn run(args: CommandLineArgs) -> Result<(), ConfigError> {
    let config_path = resolve_config_path(args.config)?;
    let config = parse_config_from_file(&config_path)?;
    init_logging(&config.log_level)?;

    let policy = ThresholdPolicy {
        hit_below: args.hit_below.unwrap_or(config.training.hit_below),
    };
    let episodes = config.training.evaluation_episodes;
    let seed = config.environment.seed;
    match config.environment.deck_kind()? {
        DeckKind::Infinite => report(Environment::infinite(seed), policy, episodes),
        DeckKind::Finite => {
            let env = Environment::finite(config.environment.number_of_decks, seed)?;
            report(env, policy, episodes)
        }
    }
    Ok(())
}

fn report<D: DeckModel>(mut env: Environment<D>, mut policy: ThresholdPolicy, episodes: u64) {
    let evaluation = evaluate_policy(&mut env, &mut policy, episodes);
    info!(
        episodes = evaluation.episodes,
        hit_below = policy.hit_below,
        average = evaluation.average,
        max = evaluation.max,
        min = evaluation.min,
        bust_rate = evaluation.bust_rate,
        "baseline evaluation"
    );
}
