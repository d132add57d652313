use super::card::{Card, Rank, Suit};

use strum::IntoEnumIterator;

use rand::seq::SliceRandom;
use rand::thread_rng;

/// Represents a shoe in the real world. Cards are drawn from the back of the
/// vector; since the shoe is shuffled, the end counts as the top.
#[derive(Debug, Clone)]
pub struct Shoe {
    deck_count: u8,
    reset_percentage: f64,
    cards: Vec<Card>,
}

impl Shoe {
    /// Creates a new shoe holding `deck_count` full 52-card decks, shuffled.
    pub fn new(deck_count: u8, reset_percentage: f64) -> Shoe {
        let mut shoe = Shoe {
            deck_count,
            reset_percentage,
            cards: Vec::with_capacity(deck_count as usize * 52),
        };
        shoe.load();
        shoe.shuffle();
        shoe
    }

    fn load(&mut self) {
        self.cards.clear();
        for _ in 0..self.deck_count {
            for suit in Suit::iter() {
                for rank in Rank::iter() {
                    self.cards.push(Card::new(rank, suit));
                }
            }
        }
    }

    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut thread_rng());
    }

    /// Returns all dealt cards to the shoe and shuffles.
    pub fn reshuffle(&mut self) {
        self.load();
        self.shuffle();
    }

    /// Draws the top card. Reshuffle-need is checked before every deal, so an
    /// empty shoe here is a logic defect, not a recoverable condition.
    pub fn draw(&mut self) -> Card {
        self.cards.pop().expect("drew from an empty shoe")
    }

    /// Places the given cards on top of the shoe so they are drawn first, in
    /// the given order. Used to script exact deals.
    pub fn stack_top(&mut self, cards: &[Card]) {
        for card in cards.iter().rev() {
            self.cards.push(*card);
        }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn full_size(&self) -> usize {
        self.deck_count as usize * 52
    }

    /// True once the shoe has shrunk to the configured reset threshold.
    pub fn needs_shuffle(&self) -> bool {
        self.remaining() as f64 <= self.full_size() as f64 * self.reset_percentage / 100.0
    }

    pub fn decks_remaining(&self) -> f64 {
        self.remaining() as f64 / 52.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_shoe_holds_every_card() {
        let deck_count = 3;
        let shoe = Shoe::new(deck_count, 25.0);
        assert_eq!(shoe.remaining(), deck_count as usize * 52);
        assert_eq!(shoe.full_size(), deck_count as usize * 52);

        for suit in Suit::iter() {
            for rank in Rank::iter() {
                let copies = shoe
                    .cards
                    .iter()
                    .filter(|c| c.rank == rank && c.suit == suit)
                    .count();
                assert_eq!(copies, deck_count as usize);
            }
        }
    }

    #[test]
    fn draws_are_conserved() {
        let mut shoe = Shoe::new(2, 25.0);
        let before = shoe.remaining();
        for _ in 0..10 {
            shoe.draw();
        }
        assert_eq!(shoe.remaining(), before - 10);
    }

    #[test]
    fn reshuffle_restores_full_size() {
        let mut shoe = Shoe::new(1, 25.0);
        for _ in 0..40 {
            shoe.draw();
        }
        assert!(shoe.needs_shuffle());
        shoe.reshuffle();
        assert_eq!(shoe.remaining(), 52);
        assert!(!shoe.needs_shuffle());
    }

    #[test]
    fn stacked_cards_come_out_in_order() {
        let mut shoe = Shoe::new(1, 25.0);
        let firsts = [
            Card::new(Rank::Ace, Suit::Spades),
            Card::new(Rank::King, Suit::Hearts),
            Card::new(Rank::Five, Suit::Clubs),
        ];
        shoe.stack_top(&firsts);
        for card in firsts {
            assert_eq!(shoe.draw(), card);
        }
    }

    #[test]
    fn decks_remaining_tracks_draws() {
        let mut shoe = Shoe::new(2, 25.0);
        for _ in 0..52 {
            shoe.draw();
        }
        assert!((shoe.decks_remaining() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    #[should_panic(expected = "empty shoe")]
    fn drawing_from_empty_shoe_panics() {
        let mut shoe = Shoe::new(1, 0.0);
        for _ in 0..53 {
            shoe.draw();
        }
    }
}
