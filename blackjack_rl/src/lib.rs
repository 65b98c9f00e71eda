pub mod observation;
pub mod simulation;
mod statearray;
pub mod strategy;

use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};
use strum_macros::{Display, EnumIter};
use thiserror::Error;

pub use observation::{FiniteObservation, InfiniteObservation, Observation};
pub use simulation::{
    hand::{hand_value, score, HandTotal},
    shoe::hi_lo_value,
    Environment, EpisodePhase, FiniteEnv, InfiniteEnv, StepInfo, StepResult,
};
pub use statearray::{ActionValues, QTable};
pub use strategy::{AgentConfig, AgentError, AgentPreset, Policy, QLearningAgent};

pub const NUMBER_OF_ACTIONS: usize = 2;

/// The whole action space. The discriminants are the indices used by
/// `step_index` and by the Q-table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum Action {
    #[strum(serialize = "STICK")]
    Stick = 0,
    #[strum(serialize = "HIT")]
    Hit = 1,
}

impl Action {
    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Action {
    type Error = EnvError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Action::Stick),
            1 => Ok(Action::Hit),
            _ => Err(EnvError::InvalidAction(value)),
        }
    }
}

/// Which deck model an environment plays with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_enum_str, Deserialize_enum_str)]
pub enum DeckKind {
    Infinite,
    Finite,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("invalid action {0}: use 0 for stick or 1 for hit")]
    InvalidAction(u8),
    #[error("a finite shoe needs at least one deck")]
    NoDecks,
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn action_indices() {
        let actions: Vec<Action> = Action::iter().collect();
        assert_eq!(actions, vec![Action::Stick, Action::Hit]);
        assert_eq!(Action::Stick.index(), 0);
        assert_eq!(Action::Hit.index(), 1);
        assert_eq!(Action::try_from(1), Ok(Action::Hit));
        assert_eq!(Action::try_from(7), Err(EnvError::InvalidAction(7)));
        assert_eq!(Action::Hit.to_string(), "HIT");
    }

    #[test]
    fn deck_kind_parses_from_string() {
        assert_eq!("Finite".parse::<DeckKind>().unwrap(), DeckKind::Finite);
        assert!("Bottomless".parse::<DeckKind>().is_err());
    }
}
