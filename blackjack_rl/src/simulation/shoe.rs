use super::{Card, DeckModel, Suit};
use crate::observation::{FiniteObservation, Observation};
use crate::EnvError;

use super::hand::HandTotal;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use strum::IntoEnumIterator;
use tracing::{debug, trace};

pub const CARDS_PER_DECK: usize = 52;

/// Hi-Lo count contribution of a blackjack value.
pub fn hi_lo_value(blackjack_value: u8) -> i32 {
    match blackjack_value {
        2..=6 => 1,
        7..=9 => 0,
        _ => -1,
    }
}

/// Represents a shoe in the real world: `number_of_decks` standard decks dealt
/// from the top until empty, with the Hi-Lo running count of everything dealt
/// since the last shuffle.
#[derive(Debug, Clone)]
pub struct Shoe {
    number_of_decks: u8,
    cards: Vec<Card>,
    current_index: usize,
    running_count: i32,
    rng: ChaCha8Rng,
}

impl Shoe {
    /// Creates a new shoe with ordered cards. Call `reshuffle` before dealing.
    /// `None` seeds the generator from OS entropy. A shoe needs at least one
    /// deck.
    pub fn new(number_of_decks: u8, seed: Option<u64>) -> Result<Shoe, EnvError> {
        if number_of_decks == 0 {
            return Err(EnvError::NoDecks);
        }
        let mut cards = Vec::with_capacity(number_of_decks as usize * CARDS_PER_DECK);
        for _ in 0..number_of_decks {
            for suit in Suit::iter() {
                for face_value in 1..=13 {
                    cards.push(Card { face_value, suit });
                }
            }
        }
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Shoe {
            number_of_decks,
            cards,
            current_index: 0,
            running_count: 0,
            rng,
        })
    }

    /// Returns the dealt cards back into the shoe, shuffles, and forgets the count.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut self.rng);
        self.current_index = 0;
        self.running_count = 0;
        debug!(
            number_of_decks = self.number_of_decks,
            cards = self.cards.len(),
            "shoe reshuffled"
        );
    }

    /// Deals a card if the shoe is not empty. Returns None if empty.
    pub fn deal_card(&mut self) -> Option<Card> {
        let card = *self.cards.get(self.current_index)?;
        self.current_index += 1;
        self.running_count += hi_lo_value(card.blackjack_value());
        trace!(%card, running_count = self.running_count, "dealt from shoe");
        Some(card)
    }

    pub fn cards_remaining(&self) -> usize {
        self.cards.len() - self.current_index
    }

    pub fn is_empty(&self) -> bool {
        self.cards_remaining() == 0
    }

    pub fn running_count(&self) -> i32 {
        self.running_count
    }

    pub fn number_of_decks(&self) -> u8 {
        self.number_of_decks
    }

    /// The next `number` undealt cards, or fewer near the end of the shoe.
    pub fn preview_next_few_cards(&self, number: usize) -> &[Card] {
        let end = (self.current_index + number).min(self.cards.len());
        &self.cards[self.current_index..end]
    }
}

impl DeckModel for Shoe {
    fn draw(&mut self) -> Option<Card> {
        self.deal_card()
    }

    fn reshuffle(&mut self) {
        self.shuffle();
    }

    fn observe(&self, total: HandTotal) -> Observation {
        Observation::Finite(FiniteObservation {
            hand_sum: total.sum,
            usable_ace: total.usable_ace,
            running_count: self.running_count,
            cards_remaining: self.cards_remaining(),
        })
    }

    fn deals_next_hand(&self) -> bool {
        !self.is_empty()
    }
}
