use blackjack_rl::{
    simulation::DeckModel, Action, Environment, Observation, Policy, QLearningAgent,
};
use tracing::{debug, info};

/// The fixed baseline: hit while the hand is below `hit_below`, stick otherwise.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdPolicy {
    pub hit_below: u8,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self { hit_below: 17 }
    }
}

impl Policy for ThresholdPolicy {
    fn get_action(&mut self, observation: &Observation) -> Action {
        if observation.hand_sum() < self.hit_below {
            Action::Hit
        } else {
            Action::Stick
        }
    }
}

/// Plays a trained agent without exploring.
pub struct Greedy<'a>(pub &'a mut QLearningAgent);

impl Policy for Greedy<'_> {
    fn get_action(&mut self, observation: &Observation) -> Action {
        self.0.greedy_action(observation)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpisodeSummary {
    pub total_reward: u64,
    pub hands: u32,
    pub busts: u32,
    pub steps: u32,
}

/// Plays one episode from `reset` until `done`, adding up the reward of every
/// hand that ended.
pub fn run_episode<D: DeckModel, P: Policy>(
    env: &mut Environment<D>,
    policy: &mut P,
) -> EpisodeSummary {
    let mut summary = EpisodeSummary::default();
    let mut state = env.reset();
    loop {
        let action = policy.get_action(&state);
        let result = env.step(action);
        summary.steps += 1;
        if result.info.hand_ended {
            summary.hands += 1;
            summary.total_reward += u64::from(result.reward);
            if result.info.bust == Some(true) {
                summary.busts += 1;
            }
        }
        state = result.observation;
        if result.done {
            break summary;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationReport {
    pub episodes: u64,
    pub average: f64,
    pub max: u64,
    pub min: u64,
    pub bust_rate: f64,
}

pub fn evaluate_policy<D: DeckModel, P: Policy>(
    env: &mut Environment<D>,
    policy: &mut P,
    episodes: u64,
) -> EvaluationReport {
    let mut total = 0u64;
    let mut max = 0u64;
    let mut min = u64::MAX;
    let mut hands = 0u64;
    let mut busts = 0u64;
    for _ in 0..episodes {
        let summary = run_episode(env, policy);
        total += summary.total_reward;
        max = max.max(summary.total_reward);
        min = min.min(summary.total_reward);
        hands += u64::from(summary.hands);
        busts += u64::from(summary.busts);
    }
    if episodes == 0 {
        min = 0;
    }
    EvaluationReport {
        episodes,
        average: total as f64 / episodes.max(1) as f64,
        max,
        min,
        bust_rate: busts as f64 / hands.max(1) as f64,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingReport {
    pub episodes: u64,
    /// Average episode reward over the last `log_every` episodes (or all of
    /// them if fewer were played).
    pub recent_average: f64,
    pub final_epsilon: f64,
    pub states_visited: usize,
}

/// Runs `episodes` training episodes: get_action, step, update on every step,
/// and one exploration decay per episode.
pub fn train<D: DeckModel>(
    env: &mut Environment<D>,
    agent: &mut QLearningAgent,
    episodes: u64,
    log_every: u64,
) -> TrainingReport {
    let mut window_reward = 0u64;
    let mut window_len = 0u64;
    let mut recent_average = 0.0;

    for episode in 1..=episodes {
        let mut state = env.reset();
        let mut episode_reward = 0u64;
        loop {
            let action = agent.get_action(&state);
            let result = env.step(action);
            agent.update(
                &state,
                action,
                f64::from(result.reward),
                &result.observation,
                result.done,
            );
            if result.info.hand_ended {
                episode_reward += u64::from(result.reward);
            }
            state = result.observation;
            if result.done {
                break;
            }
        }
        agent.decay_exploration();
        debug!(episode, episode_reward, "episode finished");

        window_reward += episode_reward;
        window_len += 1;
        recent_average = window_reward as f64 / window_len as f64;
        if log_every > 0 && episode % log_every == 0 {
            info!(
                episode,
                average_reward = recent_average,
                epsilon = agent.epsilon(),
                states = agent.q_table().len(),
                "training progress"
            );
            window_reward = 0;
            window_len = 0;
        }
    }

    TrainingReport {
        episodes,
        recent_average,
        final_epsilon: agent.epsilon(),
        states_visited: agent.q_table().len(),
    }
}
