use std::fmt;

/// What the agent sees while playing against an infinite deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfiniteObservation {
    pub hand_sum: u8,
    pub usable_ace: bool,
}

/// What the agent sees while playing through a finite shoe. The running count
/// and the number of undealt cards are the memory of earlier hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FiniteObservation {
    pub hand_sum: u8,
    pub usable_ace: bool,
    pub running_count: i32,
    pub cards_remaining: usize,
}

/// Snapshot of the environment handed to a policy. This is the key of the
/// Q-table, so the two shapes never compare equal to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Observation {
    Infinite(InfiniteObservation),
    Finite(FiniteObservation),
}

impl Observation {
    pub fn hand_sum(&self) -> u8 {
        match self {
            Observation::Infinite(obs) => obs.hand_sum,
            Observation::Finite(obs) => obs.hand_sum,
        }
    }

    pub fn usable_ace(&self) -> bool {
        match self {
            Observation::Infinite(obs) => obs.usable_ace,
            Observation::Finite(obs) => obs.usable_ace,
        }
    }

    /// `None` for the infinite deck, which keeps no memory.
    pub fn running_count(&self) -> Option<i32> {
        match self {
            Observation::Infinite(_) => None,
            Observation::Finite(obs) => Some(obs.running_count),
        }
    }

    /// `None` for the infinite deck, which never runs out.
    pub fn cards_remaining(&self) -> Option<usize> {
        match self {
            Observation::Infinite(_) => None,
            Observation::Finite(obs) => Some(obs.cards_remaining),
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let soft = if self.usable_ace() { "soft" } else { "hard" };
        match self {
            Observation::Infinite(obs) => write!(f, "{} {}", soft, obs.hand_sum),
            Observation::Finite(obs) => write!(
                f,
                "{} {} (count {}, {} left)",
                soft, obs.hand_sum, obs.running_count, obs.cards_remaining
            ),
        }
    }
}
