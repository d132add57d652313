use super::card::Card;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HandResult {
    Undetermined,
    Win,
    Loss,
    Draw,
    Blackjack,
    Surrendered,
}

/// One betting unit of cards. A player starts a round with a single hand and
/// may grow more through splits.
#[derive(Debug, Clone)]
pub struct Hand {
    cards: Vec<Card>,
    bet: f64,
    pub insurance_bet: f64,
    pub payout: f64,
    result: HandResult,
    pub doubled_down: bool,
    finalized: bool,
    pub from_split: bool,
    stood: bool,
    /// None until the player has answered the insurance offer.
    pub insured: Option<bool>,
    /// None until the player has answered the surrender offer.
    pub surrendered: Option<bool>,
}

impl Hand {
    pub fn new(bet: f64) -> Hand {
        Hand {
            cards: Vec::with_capacity(3),
            bet,
            insurance_bet: 0.0,
            payout: 0.0,
            result: HandResult::Undetermined,
            doubled_down: false,
            finalized: false,
            from_split: false,
            stood: false,
            insured: None,
            surrendered: None,
        }
    }

    pub fn receive(&mut self, card: Card) {
        debug_assert!(!self.finalized, "dealt a card to a finalized hand");
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn bet(&self) -> f64 {
        self.bet
    }

    pub fn double_bet(&mut self) {
        debug_assert!(!self.finalized);
        self.bet *= 2.0;
        self.doubled_down = true;
    }

    /// Blackjack value of the hand. Aces are summed low, then a single ace is
    /// promoted to 11 when that keeps the total at 21 or below, so repeated
    /// calls are idempotent and Ace+9+King is exactly 20.
    pub fn value(&self) -> u8 {
        let low: u8 = self
            .cards
            .iter()
            .map(|c| if c.is_ace() { 1 } else { c.value() })
            .sum();
        if self.has_ace() && low + 10 <= 21 {
            low + 10
        } else {
            low
        }
    }

    fn has_ace(&self) -> bool {
        self.cards.iter().any(Card::is_ace)
    }

    /// A hand is soft while one of its aces still counts as 11.
    pub fn is_soft(&self) -> bool {
        let low: u8 = self
            .cards
            .iter()
            .map(|c| if c.is_ace() { 1 } else { c.value() })
            .sum();
        self.has_ace() && low + 10 <= 21
    }

    /// Exactly two cards of equal blackjack value.
    pub fn is_pair(&self) -> bool {
        self.cards.len() == 2 && self.cards[0].value() == self.cards[1].value()
    }

    /// Ace pairs are recognized by rank, never by current value.
    pub fn is_ace_pair(&self) -> bool {
        self.cards.len() == 2 && self.cards[0].is_ace() && self.cards[1].is_ace()
    }

    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.value() == 21 && !self.from_split
    }

    pub fn is_bust(&self) -> bool {
        self.value() > 21
    }

    pub fn result(&self) -> HandResult {
        self.result
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// A played hand takes no further decisions this round.
    pub fn is_played(&self) -> bool {
        self.finalized || self.stood
    }

    pub fn stand(&mut self) {
        self.stood = true;
    }

    /// Locks in the result and the payout. After this only `payout` may be
    /// reassigned; cards, bet and result are frozen.
    pub fn finalize(&mut self, result: HandResult, payout: f64) {
        debug_assert!(!self.finalized, "finalized a hand twice");
        self.result = result;
        self.payout = payout;
        self.finalized = true;
    }

    /// Detaches the last card to seed the sibling hand of a split.
    pub fn split_off(&mut self) -> Card {
        debug_assert!(self.cards.len() == 2, "split a hand without two cards");
        self.from_split = true;
        self.cards.pop().expect("split an empty hand")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::{Rank, Suit};

    fn card(rank: Rank) -> Card {
        Card::new(rank, Suit::Clubs)
    }

    fn hand_of(ranks: &[Rank]) -> Hand {
        let mut hand = Hand::new(10.0);
        for rank in ranks {
            hand.receive(card(*rank));
        }
        hand
    }

    #[test]
    fn ace_demotes_instead_of_busting() {
        let hand = hand_of(&[Rank::Ace, Rank::Nine, Rank::King]);
        assert_eq!(hand.value(), 20);
        assert!(!hand.is_soft());
        assert!(!hand.is_bust());
    }

    #[test]
    fn only_one_ace_counts_high() {
        let hand = hand_of(&[Rank::Ace, Rank::Ace]);
        assert_eq!(hand.value(), 12);
        assert!(hand.is_soft());
        assert!(hand.is_ace_pair());
    }

    #[test]
    fn value_is_idempotent() {
        let hand = hand_of(&[Rank::Ace, Rank::Seven, Rank::Ten]);
        assert_eq!(hand.value(), 18);
        assert_eq!(hand.value(), 18);
    }

    #[test]
    fn two_card_twenty_one_is_blackjack() {
        let hand = hand_of(&[Rank::Ace, Rank::King]);
        assert!(hand.is_blackjack());
    }

    #[test]
    fn split_twenty_one_is_not_blackjack() {
        let mut hand = hand_of(&[Rank::Ace, Rank::Ace]);
        hand.split_off();
        hand.receive(card(Rank::King));
        assert_eq!(hand.value(), 21);
        assert!(!hand.is_blackjack());
    }

    #[test]
    fn court_pair_counts_as_pair_by_value() {
        let hand = hand_of(&[Rank::King, Rank::Ten]);
        assert!(hand.is_pair());
        assert!(!hand.is_ace_pair());
    }

    #[test]
    fn double_doubles_the_bet() {
        let mut hand = hand_of(&[Rank::Five, Rank::Six]);
        hand.double_bet();
        assert_eq!(hand.bet(), 20.0);
        assert!(hand.doubled_down);
    }

    #[test]
    fn split_off_returns_the_last_card() {
        let mut hand = hand_of(&[Rank::Eight, Rank::Eight]);
        let detached = hand.split_off();
        assert_eq!(detached.value(), 8);
        assert_eq!(hand.cards().len(), 1);
        assert!(hand.from_split);
    }

    #[test]
    fn bust_hand_reports_bust() {
        let hand = hand_of(&[Rank::Ten, Rank::Nine, Rank::Five]);
        assert_eq!(hand.value(), 24);
        assert!(hand.is_bust());
    }
}
