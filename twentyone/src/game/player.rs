use super::card::Card;
use super::hand::Hand;
use super::shoe::Shoe;
use crate::strategy::{BasicStrategyEngine, BetSpread, CardCountingEngine};
use crate::GameRules;

use rand::Rng;

pub type PlayerId = u64;

/// Construction data for a seat. The variant decides whether the player is
/// driven externally or by the decision engines.
#[derive(Debug, Clone)]
pub enum PlayerInfo {
    Human {
        name: String,
        bankroll: f64,
    },
    Ai {
        bankroll: f64,
        play_skill: u8,
        count_skill: u8,
        spread: BetSpread,
    },
}

/// The card sense of an AI seat: running count, strategy tables and the bet
/// spread they feed.
pub struct AiBrain {
    pub running_count: i64,
    /// True count the last bet was sized from, kept for profit bucketing.
    pub last_true_count: f64,
    pub strategy: BasicStrategyEngine,
    pub counting: CardCountingEngine,
    pub spread: BetSpread,
}

pub struct Player {
    pub id: PlayerId,
    pub name: String,
    bankroll: f64,
    pub hands: Vec<Hand>,
    /// Humans who skip betting reuse this amount next round.
    pub last_bet: f64,
    brain: Option<AiBrain>,
}

impl Player {
    pub fn new(id: PlayerId, info: PlayerInfo) -> Player {
        match info {
            PlayerInfo::Human { name, bankroll } => Player {
                id,
                name,
                bankroll,
                hands: Vec::new(),
                last_bet: 0.0,
                brain: None,
            },
            PlayerInfo::Ai {
                bankroll,
                play_skill,
                count_skill,
                spread,
            } => Player {
                id,
                name: format!("ai-{}", id),
                bankroll,
                hands: Vec::new(),
                last_bet: 0.0,
                brain: Some(AiBrain {
                    running_count: 0,
                    last_true_count: 0.0,
                    strategy: BasicStrategyEngine::new(play_skill),
                    counting: CardCountingEngine::new(count_skill),
                    spread,
                }),
            },
        }
    }

    pub fn is_ai(&self) -> bool {
        self.brain.is_some()
    }

    pub fn brain(&self) -> Option<&AiBrain> {
        self.brain.as_ref()
    }

    pub fn brain_mut(&mut self) -> Option<&mut AiBrain> {
        self.brain.as_mut()
    }

    pub fn bankroll(&self) -> f64 {
        self.bankroll
    }

    pub fn credit(&mut self, amount: f64) {
        self.bankroll += amount;
    }

    pub fn debit(&mut self, amount: f64) {
        self.bankroll -= amount;
    }

    /// Feeds one face-up card into the running count, through the counting
    /// engine's error model.
    pub fn observe_card(&mut self, card: Card, rng: &mut impl Rng) {
        if let Some(brain) = self.brain.as_mut() {
            brain.running_count += brain.counting.adjustment(card.value(), rng) as i64;
        }
    }

    /// Counters start over on every reshuffle.
    pub fn reset_count(&mut self) {
        if let Some(brain) = self.brain.as_mut() {
            brain.running_count = 0;
        }
    }

    /// Running count normalized by decks left in the shoe, floored at one
    /// deck-equivalent so a near-empty shoe cannot blow the ratio up.
    pub fn true_count(&self, decks_remaining: f64) -> f64 {
        match &self.brain {
            Some(brain) => brain.running_count as f64 / decks_remaining.max(1.0),
            None => 0.0,
        }
    }

    /// The hand currently awaiting a decision, if any.
    pub fn active_hand_index(&self) -> Option<usize> {
        self.hands.iter().position(|h| !h.is_played())
    }
}

/// The house seat. Owns the shoe and exactly one hand per round; never bets,
/// never splits.
pub struct Dealer {
    pub shoe: Shoe,
    pub hand: Hand,
    bankroll: f64,
    pub payout_blackjack: f64,
}

impl Dealer {
    pub fn new(rules: &GameRules) -> Dealer {
        Dealer {
            shoe: Shoe::new(rules.number_of_decks, rules.reset_percentage),
            hand: Hand::new(0.0),
            bankroll: 0.0,
            payout_blackjack: rules.payout_blackjack,
        }
    }

    /// The second dealt card is the one shown face-up.
    pub fn up_card(&self) -> Card {
        self.hand.cards()[1]
    }

    pub fn has_up_card(&self) -> bool {
        self.hand.cards().len() >= 2
    }

    pub fn hole_card(&self) -> Card {
        self.hand.cards()[0]
    }

    pub fn bankroll(&self) -> f64 {
        self.bankroll
    }

    pub fn credit(&mut self, amount: f64) {
        self.bankroll += amount;
    }

    pub fn debit(&mut self, amount: f64) {
        self.bankroll -= amount;
    }

    pub fn clear_hand(&mut self) {
        self.hand = Hand::new(0.0);
    }

    /// Fixed house drawing rule: hit below 17, hit soft 17 only when the
    /// table flag permits, stand otherwise.
    pub fn must_hit(&self, dealer_hits_soft_seventeen: bool) -> bool {
        let value = self.hand.value();
        if value < 17 {
            true
        } else if value == 17 && self.hand.is_soft() {
            dealer_hits_soft_seventeen
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::{Rank, Suit};
    use crate::DoublePolicy;

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
            double_after_split: true,
            double_after_split_aces: false,
            max_hands: 4,
            hit_split_aces: false,
            allow_early_surrender: false,
            allow_late_surrender: true,
        }
    }

    fn dealer_with(ranks: &[Rank]) -> Dealer {
        let mut dealer = Dealer::new(&rules());
        dealer.clear_hand();
        for rank in ranks {
            dealer.hand.receive(Card::new(*rank, Suit::Hearts));
        }
        dealer
    }

    #[test]
    fn ai_seat_carries_a_brain() {
        let player = Player::new(
            7,
            PlayerInfo::Ai {
                bankroll: 500.0,
                play_skill: 90,
                count_skill: 80,
                spread: BetSpread::flat(25.0),
            },
        );
        assert!(player.is_ai());
        assert_eq!(player.bankroll(), 500.0);
    }

    #[test]
    fn human_seat_has_no_brain() {
        let player = Player::new(
            3,
            PlayerInfo::Human {
                name: "alice".into(),
                bankroll: 200.0,
            },
        );
        assert!(!player.is_ai());
        assert_eq!(player.true_count(3.0), 0.0);
    }

    #[test]
    fn perfect_counter_tracks_hi_lo_exactly() {
        let mut player = Player::new(
            1,
            PlayerInfo::Ai {
                bankroll: 500.0,
                play_skill: 100,
                count_skill: 100,
                spread: BetSpread::flat(25.0),
            },
        );
        let mut rng = rand::thread_rng();
        player.observe_card(Card::new(Rank::Five, Suit::Clubs), &mut rng);
        player.observe_card(Card::new(Rank::Two, Suit::Clubs), &mut rng);
        player.observe_card(Card::new(Rank::King, Suit::Clubs), &mut rng);
        player.observe_card(Card::new(Rank::Eight, Suit::Clubs), &mut rng);
        assert_eq!(player.brain().unwrap().running_count, 1);
        player.reset_count();
        assert_eq!(player.brain().unwrap().running_count, 0);
    }

    #[test]
    fn true_count_floors_decks_at_one() {
        let mut player = Player::new(
            1,
            PlayerInfo::Ai {
                bankroll: 500.0,
                play_skill: 100,
                count_skill: 100,
                spread: BetSpread::flat(25.0),
            },
        );
        player.brain_mut().unwrap().running_count = 6;
        assert_eq!(player.true_count(3.0), 2.0);
        assert_eq!(player.true_count(0.25), 6.0);
    }

    #[test]
    fn dealer_hits_below_seventeen() {
        let dealer = dealer_with(&[Rank::Ten, Rank::Six]);
        assert!(dealer.must_hit(false));
    }

    #[test]
    fn dealer_soft_seventeen_follows_the_flag() {
        let dealer = dealer_with(&[Rank::Ace, Rank::Six]);
        assert!(dealer.must_hit(true));
        assert!(!dealer.must_hit(false));
    }

    #[test]
    fn dealer_stands_on_hard_seventeen() {
        let dealer = dealer_with(&[Rank::Ten, Rank::Seven]);
        assert!(!dealer.must_hit(true));
    }

    #[test]
    fn up_card_is_the_second_dealt() {
        let dealer = dealer_with(&[Rank::Two, Rank::Ace]);
        assert!(dealer.has_up_card());
        assert_eq!(dealer.up_card().rank, Rank::Ace);
        assert_eq!(dealer.hole_card().rank, Rank::Two);
    }
}
