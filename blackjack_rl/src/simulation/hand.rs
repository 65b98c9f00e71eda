use super::Card;

/// Hand totals above this bust.
pub const BUST_THRESHOLD: u8 = 21;

/// Best total of a hand and whether an Ace is being counted as 11.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HandTotal {
    pub sum: u8,
    pub usable_ace: bool,
}

impl HandTotal {
    pub fn is_bust(&self) -> bool {
        self.sum > BUST_THRESHOLD
    }
}

/// Evaluates blackjack values (1 stands for A, 10 stands for 10 and J, Q, K).
///
/// All Aces count as 1, then at most one of them is promoted to 11 if that
/// does not bust. An empty slice gives a total of 0 without a usable Ace.
pub fn hand_value(values: &[u8]) -> HandTotal {
    let sum: u8 = values.iter().sum();
    if values.contains(&1) && sum + 10 <= BUST_THRESHOLD {
        HandTotal {
            sum: sum + 10,
            usable_ace: true,
        }
    } else {
        HandTotal {
            sum,
            usable_ace: false,
        }
    }
}

/// Quadratic reward granted when a hand resolves. Busted totals score 0.
pub fn score(total: u8) -> u32 {
    if total <= BUST_THRESHOLD {
        total as u32 * total as u32
    } else {
        0
    }
}

/// Cards held by the player in the current hand, in the order they were dealt.
#[derive(Debug, Clone, Default)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Hand {
        Hand {
            cards: Vec::with_capacity(6),
        }
    }

    pub fn receive_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn blackjack_values(&self) -> Vec<u8> {
        self.cards.iter().map(|card| card.blackjack_value()).collect()
    }

    pub fn total(&self) -> HandTotal {
        hand_value(&self.blackjack_values())
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }
}
