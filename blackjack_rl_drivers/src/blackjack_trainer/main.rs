use std::process;

use blackjack_rl::{
    simulation::DeckModel, AgentConfig, DeckKind, Environment, QLearningAgent,
};
use blackjack_rl_drivers::{
    episodes::{evaluate_policy, train, Greedy, ThresholdPolicy},
    init_logging, parse_config_from_file, resolve_config_path, Config, ConfigError,
};
use clap::Parser;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(author, about = "Trains a Q-learning agent to play blackjack", long_about = None)]
struct CommandLineArgs {
    /// The path of the config file
    #[arg(short, long)]
    config: Option<String>,

    /// Overrides training.episodes from the config file
    #[arg(short, long)]
    episodes: Option<u64>,

    /// Overrides log_level from the config file
    #[arg(short, long)]
    log_level: Option<String>,
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
    let mut config = parse_config_from_file(&config_path)?;
    if let Some(episodes) = args.episodes {
        config.training.episodes = episodes;
    }
    init_logging(args.log_level.as_deref().unwrap_or(&config.log_level))?;
    info!(config = %config_path, "loaded config");

    let agent_config: AgentConfig = config.agent.clone().try_into()?;
    let agent = QLearningAgent::new(agent_config)?;
    let seed = config.environment.seed;
    match config.environment.deck_kind()? {
        DeckKind::Infinite => train_and_report(Environment::infinite(seed), agent, &config),
        DeckKind::Finite => {
            let env = Environment::finite(config.environment.number_of_decks, seed)?;
            train_and_report(env, agent, &config)
        }
    }
    Ok(())
}

fn train_and_report<D: DeckModel>(
    mut env: Environment<D>,
    mut agent: QLearningAgent,
    config: &Config,
) {
    let training = &config.training;
    let report = train(&mut env, &mut agent, training.episodes, training.log_every);
    info!(
        episodes = report.episodes,
        recent_average = report.recent_average,
        final_epsilon = report.final_epsilon,
        states_visited = report.states_visited,
        "training finished"
    );

    let learned = evaluate_policy(
        &mut env,
        &mut Greedy(&mut agent),
        training.evaluation_episodes,
    );
    let baseline = evaluate_policy(
        &mut env,
        &mut ThresholdPolicy {
            hit_below: training.hit_below,
        },
        training.evaluation_episodes,
    );
    info!(
        average = learned.average,
        max = learned.max,
        min = learned.min,
        bust_rate = learned.bust_rate,
        "greedy agent evaluation"
    );
    info!(
        average = baseline.average,
        max = baseline.max,
        min = baseline.min,
        bust_rate = baseline.bust_rate,
        hit_below = training.hit_below,
        "baseline evaluation"
    );
}
