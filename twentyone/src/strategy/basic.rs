use crate::game::hand::Hand;
use crate::game::player::Player;
use crate::game::rules::RulesEngine;
use crate::PlayerDecision;

use rand::Rng;

/// Table-driven basic strategy with skill-parameterized noise. Chart entries
/// hold a primary decision and the fallback used when the primary is not
/// legal under the table rules.
pub struct BasicStrategyEngine {
    skill: u8,
    hard_charts: [[(PlayerDecision, PlayerDecision); 10]; 14],
    soft_charts: [[(PlayerDecision, PlayerDecision); 10]; 9],
    pair_charts: [[(PlayerDecision, PlayerDecision); 10]; 10],
}

impl BasicStrategyEngine {
    pub fn new(skill: u8) -> BasicStrategyEngine {
        const H: (PlayerDecision, PlayerDecision) =
            (PlayerDecision::Hit, PlayerDecision::PlaceHolder);
        const S: (PlayerDecision, PlayerDecision) =
            (PlayerDecision::Stand, PlayerDecision::PlaceHolder);
        const P: (PlayerDecision, PlayerDecision) =
            (PlayerDecision::Split, PlayerDecision::PlaceHolder);
        const DH: (PlayerDecision, PlayerDecision) = (PlayerDecision::Double, PlayerDecision::Hit);
        const DS: (PlayerDecision, PlayerDecision) =
            (PlayerDecision::Double, PlayerDecision::Stand);
        const RH: (PlayerDecision, PlayerDecision) =
            (PlayerDecision::Surrender, PlayerDecision::Hit);
        const RS: (PlayerDecision, PlayerDecision) =
            (PlayerDecision::Surrender, PlayerDecision::Stand);
        const RP: (PlayerDecision, PlayerDecision) =
            (PlayerDecision::Surrender, PlayerDecision::Split);

        // Columns are the dealer up-card: ace first, then 2 through 10.
        let hard_charts = [
            [H, H, H, H, H, H, H, H, H, H], // 5
            [H, H, H, H, H, H, H, H, H, H],
            [H, H, H, H, H, H, H, H, H, H],
            [H, H, H, H, H, H, H, H, H, H],
            [H, H, DH, DH, DH, DH, H, H, H, H],
            [H, DH, DH, DH, DH, DH, DH, DH, DH, H],
            [DH, DH, DH, DH, DH, DH, DH, DH, DH, DH],
            [H, H, H, S, S, S, H, H, H, H],
            [H, S, S, S, S, S, H, H, H, H],
            [H, S, S, S, S, S, H, H, H, H],
            [RH, S, S, S, S, S, H, H, H, RH],
            [RH, S, S, S, S, S, H, H, RH, RH],
            [RS, S, S, S, S, S, S, S, S, S], // 17
            [S, S, S, S, S, S, S, S, S, S], // 18, 18+
        ];
        let soft_charts = [
            [H, H, H, H, DH, DH, H, H, H, H], // Ace + 2
            [H, H, H, H, DH, DH, H, H, H, H],
            [H, H, H, DH, DH, DH, H, H, H, H],
            [H, H, H, DH, DH, DH, H, H, H, H],
            [H, H, DH, DH, DH, DH, H, H, H, H],
            [H, DS, DS, DS, DS, DS, S, S, H, H],
            [S, S, S, S, S, DS, S, S, S, S],
            [S, S, S, S, S, S, S, S, S, S], // Ace + 9
            [S, S, S, S, S, S, S, S, S, S], // Ace + 10
        ];
        let pair_charts = [
            [P, P, P, P, P, P, P, P, P, P], // pair of aces
            [H, P, P, P, P, P, P, H, H, H], // pair of 2s
            [H, P, P, P, P, P, P, H, H, H],
            [H, H, H, H, P, P, H, H, H, H],
            [H, DH, DH, DH, DH, DH, DH, DH, DH, H],
            [H, P, P, P, P, P, H, H, H, H],
            [H, P, P, P, P, P, P, H, H, H],
            [RP, P, P, P, P, P, P, P, P, P],
            [S, P, P, P, P, P, S, P, P, S],
            [S, S, S, S, S, S, S, S, S, S], // pair of 10s
        ];

        BasicStrategyEngine {
            skill: skill.min(100),
            hard_charts,
            soft_charts,
            pair_charts,
        }
    }

    pub fn skill(&self) -> u8 {
        self.skill
    }

    fn column(dealer_up: u8) -> usize {
        if dealer_up == 11 {
            0
        } else {
            dealer_up as usize - 1
        }
    }

    /// The total the player believes the hand holds. Low skill widens the
    /// spread of the misread; the result is clamped into the chart range.
    fn perceive(&self, total: u8, lo: u8, hi: u8, rng: &mut impl Rng) -> u8 {
        let spread = ((100 - self.skill) / 25) as i32;
        let fuzzed = total as i32 + rng.gen_range(-spread..=spread);
        fuzzed.clamp(lo as i32, hi as i32) as u8
    }

    /// Picks the next play for `player.hands[hand_index]` against the dealer
    /// up-card value. Split, double and surrender are each gated by rule
    /// legality and bankroll before they are offered.
    pub fn decide(
        &self,
        player: &Player,
        hand_index: usize,
        dealer_up: u8,
        rules: &RulesEngine,
        rng: &mut impl Rng,
    ) -> PlayerDecision {
        let hand = &player.hands[hand_index];
        let col = Self::column(dealer_up);

        let entry = if hand.is_pair()
            && rules.can_split(&player.hands)
            && player.bankroll() >= hand.bet()
        {
            let row = if hand.is_ace_pair() {
                0
            } else {
                hand.cards()[0].value() as usize - 1
            };
            self.pair_charts[row][col]
        } else if hand.is_soft() {
            let perceived = self.perceive(hand.value(), 13, 21, rng);
            self.soft_charts[(perceived - 13) as usize][col]
        } else {
            let perceived = self.perceive(hand.value(), 5, 18, rng);
            self.hard_charts[(perceived - 5) as usize][col]
        };

        match entry.0 {
            PlayerDecision::Double => {
                if rules.can_double_down(hand) && player.bankroll() >= hand.bet() {
                    PlayerDecision::Double
                } else {
                    entry.1
                }
            }
            PlayerDecision::Surrender => {
                if rules.can_late_surrender(&player.hands) {
                    PlayerDecision::Surrender
                } else {
                    entry.1
                }
            }
            other => other,
        }
    }

    /// Whether this player wants to forfeit the hand at a surrender offer.
    /// Only hard 15 against a ten and hard 16 against 9, ten or ace are worth
    /// giving up; the perceived total decides, not the true one.
    pub fn wants_surrender(&self, hand: &Hand, dealer_up: u8, rng: &mut impl Rng) -> bool {
        if hand.is_soft() {
            return false;
        }
        let perceived = self.perceive(hand.value(), 5, 18, rng);
        match perceived {
            16 => matches!(dealer_up, 9 | 10 | 11),
            15 => dealer_up == 10,
            _ => false,
        }
    }

    /// Insurance is always declined by the book; misjudgment at low skill
    /// occasionally takes it anyway.
    pub fn should_insure(&self, rng: &mut impl Rng) -> bool {
        let roll: u8 = rng.gen_range(0..100);
        roll < (100 - self.skill) / 3
    }
}
