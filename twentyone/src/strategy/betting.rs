use serde::{Deserialize, Serialize};

/// Bet sizes keyed by true-count buckets. Bucket 0 covers every count at or
/// below zero, bucket 6 covers six and above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetSpread {
    bets: [f64; 7],
}

impl BetSpread {
    pub fn new(bets: [f64; 7]) -> BetSpread {
        BetSpread { bets }
    }

    pub fn flat(bet: f64) -> BetSpread {
        BetSpread { bets: [bet; 7] }
    }

    pub fn bucket(true_count: f64) -> usize {
        true_count.clamp(0.0, 6.0).floor() as usize
    }

    pub fn bet_for(&self, true_count: f64) -> f64 {
        self.bets[Self::bucket(true_count)]
    }

    /// Sizes the next bet within table and bankroll limits. A bankroll below
    /// the table minimum goes all-in rather than failing.
    pub fn sized_bet(&self, true_count: f64, min_bet: f64, max_bet: f64, bankroll: f64) -> f64 {
        if bankroll < min_bet {
            return bankroll.max(0.0);
        }
        self.bet_for(true_count).clamp(min_bet, max_bet).min(bankroll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread() -> BetSpread {
        BetSpread::new([10.0, 10.0, 20.0, 40.0, 60.0, 80.0, 100.0])
    }

    #[test]
    fn negative_counts_share_the_bottom_bucket() {
        assert_eq!(BetSpread::bucket(-3.5), 0);
        assert_eq!(BetSpread::bucket(0.0), 0);
    }

    #[test]
    fn large_counts_share_the_top_bucket() {
        assert_eq!(BetSpread::bucket(6.0), 6);
        assert_eq!(BetSpread::bucket(11.0), 6);
        assert_eq!(spread().bet_for(9.0), 100.0);
    }

    #[test]
    fn bet_is_clamped_into_table_limits() {
        assert_eq!(spread().sized_bet(6.0, 10.0, 50.0, 1000.0), 50.0);
        assert_eq!(spread().sized_bet(0.0, 25.0, 500.0, 1000.0), 25.0);
    }

    #[test]
    fn short_bankroll_goes_all_in() {
        assert_eq!(spread().sized_bet(3.0, 10.0, 500.0, 4.0), 4.0);
        assert_eq!(spread().sized_bet(3.0, 10.0, 500.0, 0.0), 0.0);
    }

    #[test]
    fn bet_never_exceeds_bankroll() {
        assert_eq!(spread().sized_bet(6.0, 10.0, 500.0, 60.0), 60.0);
    }
}
