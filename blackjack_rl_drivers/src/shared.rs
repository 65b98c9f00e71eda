pub mod episodes;

use std::{fs, str::FromStr};

use blackjack_rl::{AgentConfig, AgentError, AgentPreset, DeckKind, EnvError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

pub const DEFAULT_CONFIG_FILE_NAME: &str = ".blackjack_rl.yml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub environment: ConfigEnvironment,
    pub agent: ConfigAgent,
    pub training: ConfigTraining,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEnvironment {
    /// "Infinite" or "Finite".
    pub deck: String,
    #[serde(default = "default_number_of_decks")]
    pub number_of_decks: u8,
    pub seed: Option<u64>,
}

impl ConfigEnvironment {
    pub fn deck_kind(&self) -> Result<DeckKind, ConfigError> {
        parse_enum("environment.deck", &self.deck)
    }
}

/// Starts from a preset; any hyperparameter given here overrides it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigAgent {
    /// "Standard" or "FiniteDeckTuned".
    pub preset: String,
    pub alpha: Option<f64>,
    pub gamma: Option<f64>,
    pub epsilon: Option<f64>,
    pub min_epsilon: Option<f64>,
    pub epsilon_decay: Option<f64>,
    pub seed: Option<u64>,
}

impl TryFrom<ConfigAgent> for AgentConfig {
    type Error = ConfigError;

    fn try_from(config: ConfigAgent) -> Result<AgentConfig, Self::Error> {
        let preset: AgentPreset = parse_enum("agent.preset", &config.preset)?;
        let defaults = preset.config();
        let agent_config = AgentConfig {
            alpha: config.alpha.unwrap_or(defaults.alpha),
            gamma: config.gamma.unwrap_or(defaults.gamma),
            epsilon: config.epsilon.unwrap_or(defaults.epsilon),
            min_epsilon: config.min_epsilon.unwrap_or(defaults.min_epsilon),
            epsilon_decay: config.epsilon_decay.unwrap_or(defaults.epsilon_decay),
            initial_values: defaults.initial_values,
            seed: config.seed,
        };
        agent_config.validate()?;
        Ok(agent_config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigTraining {
    pub episodes: u64,
    #[serde(default = "default_log_every")]
    pub log_every: u64,
    #[serde(default = "default_evaluation_episodes")]
    pub evaluation_episodes: u64,
    /// Threshold of the baseline policy: hit while the hand is below it.
    #[serde(default = "default_hit_below")]
    pub hit_below: u8,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{field} is invalid: {value}")]
    InvalidVariant { field: &'static str, value: String },
    #[error("cannot find home directory to look for .blackjack_rl.yml")]
    NoHomeDir,
    #[error("config file {path} does not exist or is a directory")]
    NotAFile { path: String },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Environment(#[from] EnvError),
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_number_of_decks() -> u8 {
    1
}

fn default_log_every() -> u64 {
    10_000
}

fn default_evaluation_episodes() -> u64 {
    10_000
}

fn default_hit_below() -> u8 {
    17
}

fn parse_enum<T: FromStr>(field: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidVariant {
        field,
        value: value.to_string(),
    })
}

/// Uses the given path, or `~/.blackjack_rl.yml` when none is given.
pub fn resolve_config_path(config: Option<String>) -> Result<String, ConfigError> {
    if let Some(path) = config {
        return Ok(path);
    }
    let home_dir = home::home_dir().ok_or(ConfigError::NoHomeDir)?;
    let config_file_path = home_dir.join(DEFAULT_CONFIG_FILE_NAME);
    let path = config_file_path.to_string_lossy().into_owned();
    if !config_file_path.is_file() {
        return Err(ConfigError::NotAFile { path });
    }
    Ok(path)
}

/// Reads the content of a given config file and parses it to a Config.
pub fn parse_config_from_file(filename: &str) -> Result<Config, ConfigError> {
    let file_content = fs::read_to_string(filename).map_err(|source| ConfigError::Io {
        path: filename.to_string(),
        source,
    })?;
    parse_config(&file_content)
}

pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Installs the global fmt subscriber at the given level.
pub fn init_logging(log_level: &str) -> Result<(), ConfigError> {
    let level = Level::from_str(log_level).map_err(|_| ConfigError::InvalidLogLevel {
        value: log_level.to_string(),
    })?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
    Ok(())
}
