pub mod hand;
pub mod infinite;
pub mod shoe;

use blackjack_rl_macros::allowed_phase;
use strum_macros::EnumIter;
use tracing::{debug, warn};

use crate::{observation::Observation, Action, EnvError};

use self::hand::{score, Hand, HandTotal};
pub use self::{infinite::InfiniteDeck, shoe::Shoe};

static FACE_VALUE_TO_BLACKJACK_VALUE: [u8; 13] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Suit {
    Diamond = 0,
    Club,
    Heart,
    Spade,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Diamond, Suit::Club, Suit::Heart, Suit::Spade];
}

/// Represents a card in the real world with a suit and a face value.
/// The face value always lies in `1..=13`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    face_value: u8,
    suit: Suit,
}

impl Card {
    /// 1 stands for A, 11 to 13 for J, Q, K. Returns `None` for any other
    /// face value.
    pub fn new(face_value: u8, suit: Suit) -> Option<Card> {
        (1..=13)
            .contains(&face_value)
            .then_some(Card { face_value, suit })
    }

    pub fn face_value(&self) -> u8 {
        self.face_value
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    /// 1 stands for A. 10 stands for 10 and J, Q, K.
    pub fn blackjack_value(&self) -> u8 {
        FACE_VALUE_TO_BLACKJACK_VALUE[(self.face_value - 1) as usize]
    }
}

impl Default for Card {
    fn default() -> Self {
        Card {
            face_value: 1,
            suit: Suit::Diamond,
        }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suit = match self.suit {
            Suit::Diamond => 'D',
            Suit::Club => 'C',
            Suit::Heart => 'H',
            Suit::Spade => 'S',
        };
        let value = match self.face_value {
            1 => 'A',
            2..=9 => (b'0' + self.face_value) as char,
            10 => 'T',
            11 => 'J',
            12 => 'Q',
            13 => 'K',
            _ => '?',
        };
        write!(f, "{}{}", suit, value)
    }
}

impl From<Card> for u8 {
    fn from(card: Card) -> u8 {
        card.suit as u8 * 13 + card.face_value - 1
    }
}

impl TryFrom<u8> for Card {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let suit = match value / 13 {
            0 => Suit::Diamond,
            1 => Suit::Club,
            2 => Suit::Heart,
            3 => Suit::Spade,
            _ => return Err(()),
        };
        Ok(Card {
            suit,
            face_value: value % 13 + 1,
        })
    }
}

/// Where cards come from. The environment only talks to its deck through
/// this trait, so one environment type serves both deck models.
pub trait DeckModel {
    /// Deals the next card. `None` means the deck is exhausted.
    fn draw(&mut self) -> Option<Card>;
    /// Prepares the deck for a new episode.
    fn reshuffle(&mut self);
    /// Builds the observation for the given hand total.
    fn observe(&self, total: HandTotal) -> Observation;
    /// Whether the episode goes on with a new hand once the current one ends.
    fn deals_next_hand(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePhase {
    /// Between hands, about to deal the first card of the next one.
    Dealing,
    /// A hand is in progress and accepts actions.
    Active,
    /// The episode is over. Only `reset` is meaningful.
    Terminal,
}

/// Side channel returned with every step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepInfo {
    pub hand_ended: bool,
    /// Set whenever a hand ended: `Some(true)` for a bust, `Some(false)` for a stick.
    pub bust: Option<bool>,
    /// The card drawn by a hit, if any.
    pub card: Option<Card>,
    /// Set only when `step` was called on a finished episode.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// State after the step. In a finite shoe this may already describe the
    /// next hand while `reward` belongs to the hand that just ended.
    pub observation: Observation,
    pub reward: u32,
    pub done: bool,
    pub info: StepInfo,
}

/// Single-player blackjack without a dealer. The player draws until sticking
/// or busting and is paid the square of the final total.
///
/// With an `InfiniteDeck` an episode is exactly one hand. With a `Shoe` an
/// episode lasts until the shoe is empty, and a new single-card hand is dealt
/// as soon as the previous one ends.
#[derive(Debug, Clone)]
pub struct Environment<D: DeckModel> {
    deck: D,
    hand: Hand,
    phase: EpisodePhase,
    hands_completed: u32,
}

pub type InfiniteEnv = Environment<InfiniteDeck>;
pub type FiniteEnv = Environment<Shoe>;

impl Environment<InfiniteDeck> {
    pub fn infinite(seed: Option<u64>) -> Self {
        Self::new(InfiniteDeck::new(seed))
    }
}

impl Environment<Shoe> {
    pub fn finite(number_of_decks: u8, seed: Option<u64>) -> Result<Self, EnvError> {
        Ok(Self::new(Shoe::new(number_of_decks, seed)?))
    }
}

impl<D: DeckModel> Environment<D> {
    /// The environment starts out `Terminal`; call `reset` to begin.
    pub fn new(deck: D) -> Self {
        Self {
            deck,
            hand: Hand::new(),
            phase: EpisodePhase::Terminal,
            hands_completed: 0,
        }
    }

    /// Starts a new episode: reshuffles the deck and deals the first card of
    /// the first hand.
    pub fn reset(&mut self) -> Observation {
        self.deck.reshuffle();
        self.hands_completed = 0;
        self.phase = EpisodePhase::Dealing;
        self.deal_new_hand();
        self.observation()
    }

    /// Can be called at Active phase.
    #[allowed_phase(Active)]
    pub fn step(&mut self, action: Action) -> StepResult {
        let mut info = StepInfo::default();
        let mut reward = 0;
        let mut done = false;

        match action {
            Action::Hit => match self.deck.draw() {
                Some(card) => {
                    self.hand.receive_card(card);
                    info.card = Some(card);
                    if self.hand.total().is_bust() {
                        info.hand_ended = true;
                        info.bust = Some(true);
                    }
                }
                None => {
                    debug!(hand = ?self.hand.blackjack_values(), "deck exhausted mid-hand");
                    done = true;
                }
            },
            Action::Stick => {
                reward = score(self.hand.total().sum);
                info.hand_ended = true;
                info.bust = Some(false);
            }
        }

        if info.hand_ended {
            self.hands_completed += 1;
            debug!(
                hand = ?self.hand.blackjack_values(),
                reward,
                bust = ?info.bust,
                hands_completed = self.hands_completed,
                "hand ended"
            );
            if self.deck.deals_next_hand() {
                self.phase = EpisodePhase::Dealing;
                done = !self.deal_new_hand();
            } else {
                done = true;
            }
        }

        if done {
            self.phase = EpisodePhase::Terminal;
        }

        StepResult {
            observation: self.observation(),
            reward,
            done,
            info,
        }
    }

    /// Same as `step`, but takes the raw action index (0 for stick, 1 for hit).
    /// Any other index is rejected.
    pub fn step_index(&mut self, action: u8) -> Result<StepResult, EnvError> {
        let action = Action::try_from(action)?;
        Ok(self.step(action))
    }

    pub fn valid_actions(&self) -> &'static [Action] {
        match self.phase {
            EpisodePhase::Active => &[Action::Stick, Action::Hit],
            _ => &[],
        }
    }

    pub fn observation(&self) -> Observation {
        self.deck.observe(self.hand.total())
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == EpisodePhase::Terminal
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn deck(&self) -> &D {
        &self.deck
    }

    /// Number of hands that ended by sticking or busting in this episode.
    pub fn hands_completed(&self) -> u32 {
        self.hands_completed
    }

    /// Replaces the hand with a single fresh card. Returns false, leaving the
    /// old hand in place, if the deck has nothing left.
    fn deal_new_hand(&mut self) -> bool {
        match self.deck.draw() {
            Some(card) => {
                self.hand.clear();
                self.hand.receive_card(card);
                self.phase = EpisodePhase::Active;
                true
            }
            None => {
                self.phase = EpisodePhase::Terminal;
                false
            }
        }
    }

    fn stale_step(&self, reason: &str) -> StepResult {
        warn!(phase = ?self.phase, "{}", reason);
        StepResult {
            observation: self.observation(),
            reward: 0,
            done: true,
            info: StepInfo {
                error: Some(reason.to_string()),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(face_value: u8) -> Card {
        Card {
            face_value,
            suit: Suit::Club,
        }
    }

    #[test]
    fn card_encoding() {
        for card_integer in 0..52u8 {
            let card = Card::try_from(card_integer).unwrap();
            let back: u8 = card.into();
            assert_eq!(back, card_integer);
        }
        assert!(Card::try_from(52).is_err());
        assert_eq!(card(13).blackjack_value(), 10);
        assert_eq!(card(1).to_string(), "CA");
        assert_eq!(card(7).to_string(), "C7");
    }

    #[test]
    fn card_rejects_out_of_range_face_values() {
        assert!(Card::new(0, Suit::Spade).is_none());
        assert!(Card::new(14, Suit::Spade).is_none());
        let king = Card::new(13, Suit::Spade).unwrap();
        assert_eq!(king.face_value(), 13);
        assert_eq!(king.suit(), Suit::Spade);
        assert_eq!(king.blackjack_value(), 10);
        assert_eq!(Card::new(1, Suit::Heart).unwrap().blackjack_value(), 1);
    }

    #[test]
    fn new_environment_needs_reset() {
        let mut env = Environment::infinite(Some(1));
        assert_eq!(env.phase(), EpisodePhase::Terminal);
        assert!(env.is_done());
        let result = env.step(Action::Hit);
        assert!(result.done);
        assert!(result.info.error.is_some());
        assert!(env.hand().is_empty());
    }

    #[test]
    fn infinite_reset_deals_one_card() {
        let mut env = Environment::infinite(Some(42));
        let obs = env.reset();
        assert_eq!(env.phase(), EpisodePhase::Active);
        assert!(!env.is_done());
        assert_eq!(env.hand().len(), 1);
        assert!(matches!(obs, Observation::Infinite(_)));
        assert_eq!(obs, env.observation());
        assert_eq!(env.valid_actions(), &[Action::Stick, Action::Hit]);
    }

    #[test]
    fn infinite_stick_scores_and_ends() {
        let mut env = Environment::infinite(Some(42));
        let obs = env.reset();
        let result = env.step(Action::Stick);
        assert!(result.done);
        assert_eq!(result.reward, score(obs.hand_sum()));
        assert!(result.info.hand_ended);
        assert_eq!(result.info.bust, Some(false));
        assert_eq!(env.phase(), EpisodePhase::Terminal);
        assert!(env.is_done());
        assert!(env.valid_actions().is_empty());
    }

    #[test]
    fn infinite_hits_until_bust() {
        let mut env = Environment::infinite(Some(7));
        env.reset();
        loop {
            let result = env.step(Action::Hit);
            assert_eq!(result.reward, 0);
            assert!(result.info.card.is_some());
            if result.done {
                assert!(result.observation.hand_sum() > 21);
                assert_eq!(result.info.bust, Some(true));
                assert!(result.info.hand_ended);
                break;
            }
            assert!(!result.info.hand_ended);
            assert!(result.observation.hand_sum() <= 21);
        }
        assert_eq!(env.hands_completed(), 1);
    }

    #[test]
    fn stale_step_does_not_touch_hand() {
        let mut env = Environment::infinite(Some(3));
        env.reset();
        env.step(Action::Stick);
        let cards = env.hand().cards().to_vec();
        for action in [Action::Hit, Action::Stick] {
            let result = env.step(action);
            assert!(result.done);
            assert_eq!(result.reward, 0);
            assert!(!result.info.hand_ended);
            assert!(result.info.error.is_some());
            assert_eq!(env.hand().cards(), cards.as_slice());
        }
    }

    #[test]
    fn invalid_action_index_is_rejected() {
        let mut env = Environment::infinite(Some(3));
        env.reset();
        assert_eq!(env.step_index(2).unwrap_err(), EnvError::InvalidAction(2));
        assert_eq!(env.phase(), EpisodePhase::Active);
        assert!(env.step_index(0).unwrap().done);
    }

    #[test]
    fn same_seed_same_episode() {
        let play = |seed| {
            let mut env = Environment::infinite(Some(seed));
            let mut sums = vec![env.reset().hand_sum()];
            loop {
                let result = env.step(Action::Hit);
                sums.push(result.observation.hand_sum());
                if result.done {
                    break sums;
                }
            }
        };
        assert_eq!(play(99), play(99));
    }

    #[test]
    fn finite_requires_a_deck() {
        assert_eq!(Environment::finite(0, None).unwrap_err(), EnvError::NoDecks);
    }

    #[test]
    fn zero_deck_shoe_cannot_back_an_environment() {
        let env = Shoe::new(0, Some(1)).map(Environment::new);
        assert_eq!(env.unwrap_err(), EnvError::NoDecks);

        let mut env = Environment::new(Shoe::new(1, Some(1)).unwrap());
        let obs = env.reset();
        assert_eq!(env.phase(), EpisodePhase::Active);
        assert!(obs.hand_sum() >= 1);
        assert_eq!(env.hand().len(), 1);
    }

    #[test]
    fn finite_reset_starts_fresh_shoe() {
        let mut env = Environment::finite(2, Some(42)).unwrap();
        let obs = env.reset();
        assert_eq!(obs.cards_remaining(), Some(103));
        assert_eq!(
            obs.running_count(),
            Some(shoe::hi_lo_value(env.hand().cards()[0].blackjack_value()))
        );

        for _ in 0..5 {
            env.step(Action::Hit);
        }
        let obs = env.reset();
        assert_eq!(obs.cards_remaining(), Some(103));
        assert_eq!(env.hands_completed(), 0);
    }

    #[test]
    fn finite_stick_deals_next_hand() {
        let mut env = Environment::finite(1, Some(42)).unwrap();
        let first = env.reset();
        let next_card = env.deck().preview_next_few_cards(1)[0];

        let result = env.step(Action::Stick);
        assert!(!result.done);
        assert!(result.info.hand_ended);
        // The reward belongs to the old hand, the observation to the new one.
        assert_eq!(result.reward, score(first.hand_sum()));
        assert_eq!(env.hand().cards(), &[next_card]);
        assert_eq!(result.observation.cards_remaining(), Some(50));
        assert_eq!(env.phase(), EpisodePhase::Active);
    }

    #[test]
    fn finite_episode_runs_through_the_shoe() {
        let mut env = Environment::finite(1, Some(2024)).unwrap();
        let mut obs = env.reset();
        let mut remaining = obs.cards_remaining().unwrap_or(0);
        let mut hands_ended = 0;
        loop {
            let action = if obs.hand_sum() < 17 {
                Action::Hit
            } else {
                Action::Stick
            };
            let result = env.step(action);
            let now_remaining = result.observation.cards_remaining().unwrap_or(0);
            let drawn = result.info.card.is_some() as usize
                + (result.info.hand_ended && !result.done) as usize;
            assert_eq!(remaining - now_remaining, drawn);
            remaining = now_remaining;
            if result.info.hand_ended {
                hands_ended += 1;
            }
            obs = result.observation;
            if result.done {
                break;
            }
        }
        assert_eq!(remaining, 0);
        assert_eq!(env.hands_completed(), hands_ended);
        assert_eq!(env.phase(), EpisodePhase::Terminal);
        assert!(env.step(Action::Stick).info.error.is_some());
    }

    #[test]
    fn finite_hit_on_empty_shoe_ends_without_drawing() {
        let mut env = Environment::finite(1, Some(5)).unwrap();
        env.reset();
        // Every stick deals the next hand, so after 51 of them the last card
        // of the shoe is the whole current hand.
        for _ in 0..51 {
            let result = env.step(Action::Stick);
            assert!(!result.done);
        }
        assert_eq!(env.deck().cards_remaining(), 0);
        assert_eq!(env.phase(), EpisodePhase::Active);
        assert_eq!(env.hands_completed(), 51);

        let before = env.hand().cards().to_vec();
        let result = env.step(Action::Hit);
        assert!(result.done);
        assert!(!result.info.hand_ended);
        assert!(result.info.card.is_none());
        assert_eq!(result.reward, 0);
        assert_eq!(env.hand().cards(), before.as_slice());
        assert_eq!(env.phase(), EpisodePhase::Terminal);
    }

    #[test]
    fn finite_last_card_stick_ends_episode() {
        let mut env = Environment::finite(1, Some(6)).unwrap();
        env.reset();
        for _ in 0..51 {
            env.step(Action::Stick);
        }
        let last = env.observation();
        let result = env.step(Action::Stick);
        assert!(result.done);
        assert!(result.info.hand_ended);
        assert_eq!(result.reward, score(last.hand_sum()));
        // No new hand was dealt, so the observation still shows the old one.
        assert_eq!(result.observation, last);
        assert_eq!(env.hands_completed(), 52);
    }
}
