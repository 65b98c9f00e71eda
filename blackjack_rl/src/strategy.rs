use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};
use thiserror::Error;
use tracing::debug;

use crate::{Action, ActionValues, Observation, QTable};

/// Anything that can pick an action for an observation.
pub trait Policy {
    fn get_action(&mut self, observation: &Observation) -> Action;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    #[error("{name} is out of range (got {value})")]
    InvalidHyperparameter { name: &'static str, value: f64 },
}

/// Hyperparameters of a `QLearningAgent`. Fixed once the agent is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentConfig {
    /// Learning rate.
    pub alpha: f64,
    /// Discount factor.
    pub gamma: f64,
    /// Starting exploration rate.
    pub epsilon: f64,
    pub min_epsilon: f64,
    pub epsilon_decay: f64,
    /// Row given to observations the first time they are looked up.
    pub initial_values: ActionValues,
    /// Seed for exploration. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl AgentConfig {
    pub fn standard() -> Self {
        Self {
            alpha: 0.05,
            gamma: 0.9,
            epsilon: 1.0,
            min_epsilon: 0.1,
            epsilon_decay: 0.9995,
            initial_values: [0.0, 0.0],
            seed: None,
        }
    }

    /// Tuned for the finite shoe. Unseen states start with an optimistic value
    /// for HIT so that hitting gets tried everywhere, and learning is slower
    /// because the count makes the state space much larger.
    pub fn finite_deck_tuned() -> Self {
        Self {
            alpha: 0.01,
            gamma: 0.9,
            epsilon: 1.0,
            min_epsilon: 0.05,
            epsilon_decay: 0.9999,
            initial_values: [0.0, 500.0],
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        let check = |name, value: f64, ok: bool| {
            if ok {
                Ok(())
            } else {
                Err(AgentError::InvalidHyperparameter { name, value })
            }
        };
        check("alpha", self.alpha, self.alpha > 0.0 && self.alpha <= 1.0)?;
        check("gamma", self.gamma, (0.0..=1.0).contains(&self.gamma))?;
        check("epsilon", self.epsilon, (0.0..=1.0).contains(&self.epsilon))?;
        check(
            "min_epsilon",
            self.min_epsilon,
            self.min_epsilon >= 0.0 && self.min_epsilon <= self.epsilon,
        )?;
        check(
            "epsilon_decay",
            self.epsilon_decay,
            self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0,
        )?;
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize_enum_str, Deserialize_enum_str)]
pub enum AgentPreset {
    Standard,
    FiniteDeckTuned,
}

impl AgentPreset {
    pub fn config(self) -> AgentConfig {
        match self {
            AgentPreset::Standard => AgentConfig::standard(),
            AgentPreset::FiniteDeckTuned => AgentConfig::finite_deck_tuned(),
        }
    }
}

/// Tabular Q-learning with an epsilon-greedy policy whose exploration rate
/// decays geometrically down to a floor.
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    config: AgentConfig,
    epsilon: f64,
    q_table: QTable,
    rng: ChaCha8Rng,
}

impl QLearningAgent {
    pub fn new(config: AgentConfig) -> Result<Self, AgentError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self {
            config,
            epsilon: config.epsilon,
            q_table: QTable::new(config.initial_values),
            rng,
        })
    }

    /// With probability epsilon a uniformly random action, otherwise the
    /// greedy one.
    pub fn get_action(&mut self, observation: &Observation) -> Action {
        if self.rng.gen::<f64>() < self.epsilon {
            if self.rng.gen::<bool>() {
                Action::Hit
            } else {
                Action::Stick
            }
        } else {
            self.greedy_action(observation)
        }
    }

    /// The action with the strictly greatest value, STICK on ties.
    pub fn greedy_action(&mut self, observation: &Observation) -> Action {
        self.q_table.argmax(observation)
    }

    /// One-step Q-learning:
    /// `Q(s,a) += alpha * (reward + gamma * max_a' Q(s',a') - Q(s,a))`,
    /// where the bootstrap term is 0 once the episode is done.
    pub fn update(
        &mut self,
        state: &Observation,
        action: Action,
        reward: f64,
        next_state: &Observation,
        done: bool,
    ) {
        let next_max = if done {
            0.0
        } else {
            self.q_table.max_value(next_state)
        };
        let AgentConfig { alpha, gamma, .. } = self.config;
        let value = &mut self.q_table.values_mut(state)[action.index()];
        *value += alpha * (reward + gamma * next_max - *value);
    }

    /// Meant to be called once per finished episode.
    pub fn decay_exploration(&mut self) {
        if self.epsilon > self.config.min_epsilon {
            self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.min_epsilon);
            if self.epsilon == self.config.min_epsilon {
                debug!(epsilon = self.epsilon, "exploration reached its floor");
            }
        }
    }

    /// Stored value of an action. Like every lookup, this inserts the default
    /// row for an unseen observation.
    pub fn get_q_value(&mut self, observation: &Observation, action: Action) -> f64 {
        self.q_table.values_mut(observation)[action.index()]
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }
}

impl Policy for QLearningAgent {
    fn get_action(&mut self, observation: &Observation) -> Action {
        QLearningAgent::get_action(self, observation)
    }
}
