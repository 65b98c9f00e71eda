use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use super::hand::HandTotal;
use super::{Card, DeckModel, Suit};
use crate::observation::{InfiniteObservation, Observation};

/// A deck that never runs out. Every draw is independent and uniform over the
/// 52 cards of a standard deck, so each blackjack value 1..=9 has weight 1 and
/// value 10 has weight 4.
#[derive(Debug, Clone)]
pub struct InfiniteDeck {
    rng: ChaCha8Rng,
}

impl InfiniteDeck {
    /// `None` seeds the generator from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { rng }
    }

    pub fn deal_card(&mut self) -> Card {
        let card = Card {
            face_value: self.rng.gen_range(1..=13),
            suit: Suit::ALL[self.rng.gen_range(0..Suit::ALL.len())],
        };
        trace!(%card, "dealt from infinite deck");
        card
    }
}

impl DeckModel for InfiniteDeck {
    fn draw(&mut self) -> Option<Card> {
        Some(self.deal_card())
    }

    fn reshuffle(&mut self) {}

    fn observe(&self, total: HandTotal) -> Observation {
        Observation::Infinite(InfiniteObservation {
            hand_sum: total.sum,
            usable_ace: total.usable_ace,
        })
    }

    fn deals_next_hand(&self) -> bool {
        false
    }
}
