use super::card::Card;
use super::hand::Hand;
use super::player::Player;
use super::shoe::Shoe;
use super::GameState;
use crate::{DoublePolicy, GameRules, PlayerDecision};

/// Pure legality predicates over an immutable rules snapshot. No game state
/// lives here; callers pass in whatever hands the check concerns.
pub struct RulesEngine {
    rules: GameRules,
}

impl RulesEngine {
    pub fn new(rules: GameRules) -> RulesEngine {
        RulesEngine { rules }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn bet_is_legal(&self, bet: f64) -> bool {
        self.rules.min_bet <= bet && bet <= self.rules.max_bet
    }

    pub fn shoe_must_reshuffle(&self, shoe: &Shoe) -> bool {
        shoe.needs_shuffle()
    }

    /// Double-down legality is the conjunction of the card-count, split-origin
    /// and value restrictions. Ace pairs are recognized by rank so a demoted
    /// ace cannot hide one.
    pub fn can_double_down(&self, hand: &Hand) -> bool {
        if hand.is_played() {
            return false;
        }
        if self.rules.double_first_two_only && hand.cards().len() != 2 {
            return false;
        }
        if hand.from_split {
            let from_aces = !hand.cards().is_empty() && hand.cards()[0].is_ace();
            let allowed = if from_aces {
                self.rules.double_after_split_aces
            } else {
                self.rules.double_after_split
            };
            if !allowed {
                return false;
            }
        }
        match self.rules.double_policy {
            DoublePolicy::AnyTwo => true,
            DoublePolicy::NineTenElevenOnly => (9..=11).contains(&hand.value()),
            DoublePolicy::TenElevenOnly => (10..=11).contains(&hand.value()),
        }
    }

    /// A split is available while the player holds fewer hands than the cap
    /// and some unfinalized two-card hand is a pair.
    pub fn can_split(&self, hands: &[Hand]) -> bool {
        hands.len() < self.rules.max_hands
            && hands.iter().any(|h| !h.is_finalized() && h.is_pair())
    }

    /// Insurance is offered only against an ace up-card and only to players
    /// holding a single hand.
    pub fn can_insure(&self, hands: &[Hand], dealer_up: Card) -> bool {
        dealer_up.is_ace() && hands.len() == 1
    }

    pub fn can_early_surrender(&self, hands: &[Hand]) -> bool {
        self.rules.allow_early_surrender && Self::surrender_shape(hands)
    }

    pub fn can_late_surrender(&self, hands: &[Hand]) -> bool {
        self.rules.allow_late_surrender && Self::surrender_shape(hands)
    }

    /// Surrender requires an untouched two-card hand and no splits.
    fn surrender_shape(hands: &[Hand]) -> bool {
        hands.len() == 1 && hands[0].cards().len() == 2 && !hands[0].from_split
    }

    /// Gates a proposed play against the rules and the current game state.
    pub fn is_legal_play(
        &self,
        decision: PlayerDecision,
        player: &Player,
        hand_index: usize,
        state: GameState,
    ) -> bool {
        let hand = &player.hands[hand_index];
        if hand.is_played() {
            return false;
        }
        match decision {
            PlayerDecision::Hit => {
                // Split aces receive one card each unless the table allows more.
                !(hand.from_split
                    && !hand.cards().is_empty()
                    && hand.cards()[0].is_ace()
                    && !self.rules.hit_split_aces)
            }
            PlayerDecision::Stand => true,
            PlayerDecision::Double => {
                self.can_double_down(hand) && player.bankroll() >= hand.bet()
            }
            PlayerDecision::Split => {
                hand.is_pair() && self.can_split(&player.hands) && player.bankroll() >= hand.bet()
            }
            PlayerDecision::Surrender => match state {
                GameState::EarlySurrender => self.can_early_surrender(&player.hands),
                _ => self.can_late_surrender(&player.hands),
            },
            PlayerDecision::PlaceHolder => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::{Rank, Suit};

    fn rules() -> GameRules {
        GameRules {
            min_bet: 10.0,
            max_bet: 500.0,
            number_of_decks: 6,
            reset_percentage: 25.0,
            payout_blackjack: 1.5,
            dealer_hits_soft_seventeen: false,
            double_policy: DoublePolicy::AnyTwo,
            double_first_two_only: true,
            double_after_split: false,
            double_after_split_aces: false,
            max_hands: 4,
            hit_split_aces: false,
            allow_early_surrender: false,
            allow_late_surrender: true,
        }
    }

    fn hand_of(ranks: &[Rank]) -> Hand {
        let mut hand = Hand::new(10.0);
        for rank in ranks {
            hand.receive(Card::new(*rank, Suit::Clubs));
        }
        hand
    }

    #[test]
    fn bets_outside_the_bounds_are_illegal() {
        let engine = RulesEngine::new(rules());
        assert!(engine.bet_is_legal(10.0));
        assert!(engine.bet_is_legal(500.0));
        assert!(!engine.bet_is_legal(5.0));
        assert!(!engine.bet_is_legal(501.0));
    }

    #[test]
    fn any_two_cards_may_double() {
        let engine = RulesEngine::new(rules());
        assert!(engine.can_double_down(&hand_of(&[Rank::Two, Rank::Three])));
        assert!(!engine.can_double_down(&hand_of(&[Rank::Two, Rank::Three, Rank::Four])));
    }

    #[test]
    fn nine_ten_eleven_policy_restricts_by_value() {
        let mut r = rules();
        r.double_policy = DoublePolicy::NineTenElevenOnly;
        let engine = RulesEngine::new(r);
        assert!(engine.can_double_down(&hand_of(&[Rank::Four, Rank::Five])));
        assert!(engine.can_double_down(&hand_of(&[Rank::Six, Rank::Five])));
        assert!(!engine.can_double_down(&hand_of(&[Rank::Four, Rank::Four])));
        // Soft 19 is not a 9/10/11 hand even though one card is worth 11.
        assert!(!engine.can_double_down(&hand_of(&[Rank::Ace, Rank::Eight])));
    }

    #[test]
    fn split_hand_cannot_double_unless_allowed() {
        let engine = RulesEngine::new(rules());
        let mut hand = hand_of(&[Rank::Eight, Rank::Eight]);
        hand.split_off();
        hand.receive(Card::new(Rank::Three, Suit::Hearts));
        assert!(!engine.can_double_down(&hand));

        let mut r = rules();
        r.double_after_split = true;
        assert!(RulesEngine::new(r).can_double_down(&hand));
    }

    #[test]
    fn split_is_capped_by_max_hands() {
        let mut r = rules();
        r.max_hands = 2;
        let engine = RulesEngine::new(r);
        let pair = hand_of(&[Rank::Eight, Rank::Eight]);
        assert!(engine.can_split(std::slice::from_ref(&pair)));
        assert!(!engine.can_split(&[pair.clone(), pair]));
    }

    #[test]
    fn insurance_needs_an_ace_and_a_single_hand() {
        let engine = RulesEngine::new(rules());
        let hand = hand_of(&[Rank::Ten, Rank::Six]);
        let ace_up = Card::new(Rank::Ace, Suit::Spades);
        let ten_up = Card::new(Rank::Ten, Suit::Spades);
        assert!(engine.can_insure(std::slice::from_ref(&hand), ace_up));
        assert!(!engine.can_insure(std::slice::from_ref(&hand), ten_up));
        assert!(!engine.can_insure(&[hand.clone(), hand], ace_up));
    }

    #[test]
    fn surrender_is_gone_after_a_split_or_a_hit() {
        let engine = RulesEngine::new(rules());
        assert!(engine.can_late_surrender(&[hand_of(&[Rank::Ten, Rank::Six])]));
        assert!(!engine.can_late_surrender(&[hand_of(&[Rank::Ten, Rank::Four, Rank::Two])]));
        let mut split = hand_of(&[Rank::Eight, Rank::Eight]);
        split.split_off();
        split.receive(Card::new(Rank::Ten, Suit::Hearts));
        assert!(!engine.can_late_surrender(std::slice::from_ref(&split)));
    }

    #[test]
    fn early_surrender_needs_its_own_flag() {
        let engine = RulesEngine::new(rules());
        assert!(!engine.can_early_surrender(&[hand_of(&[Rank::Ten, Rank::Six])]));
    }
}
