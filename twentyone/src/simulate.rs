pub mod batch;

pub use batch::{run_batch, run_batch_with_cancel, BatchOutcome};

use crate::game::hand::HandResult;
use crate::game::player::PlayerInfo;
use crate::strategy::BetSpread;
use crate::{Game, GameResult, GameRules, GameState};

use serde::{Deserialize, Serialize};
use std::thread;
use std::time::{Duration, Instant};

/// Everything one simulation run needs: the table, the player profile and
/// the limits that end the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub rules: GameRules,
    pub bankroll: f64,
    pub play_skill: u8,
    pub count_skill: u8,
    pub spread: BetSpread,
    pub bounds: Bounds,
    pub runs: usize,
    /// Rounds between cooperative yields, so long runs share their core.
    pub rounds_between_yields: u64,
}

/// Limits that terminate a run: bankroll targets, wall-clock time and the
/// number of hands a human could physically get through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    pub bankroll_goal: f64,
    pub bankroll_fail: f64,
    pub max_sim_seconds: u64,
    pub hands_per_hour: u64,
    pub hours_per_day: u64,
    pub days_per_week: u64,
    pub weeks: u64,
}

impl Bounds {
    /// Total hands the simulated span allows at a human table pace.
    pub fn human_hand_ceiling(&self) -> u64 {
        self.hands_per_hour * self.hours_per_day * self.days_per_week * self.weeks
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// The bankroll reached the goal.
    Won,
    /// The bankroll fell to the fail line.
    Lost,
    /// A time or hand ceiling ended the run first.
    Unfinished,
}

/// What one run produced. Hand tallies are disjoint: a natural counts under
/// `blackjacks`, not `hands_won`.
#[derive(Debug, Clone, Serialize)]
pub struct SingleOutcome {
    pub status: RunStatus,
    pub hands_played: u64,
    pub final_bankroll: f64,
    pub hands_won: u64,
    pub hands_lost: u64,
    pub hands_drawn: u64,
    pub blackjacks: u64,
    pub surrenders: u64,
    /// High and low water marks of the bankroll over the run.
    pub peak_bankroll: f64,
    pub trough_bankroll: f64,
    /// Bankroll delta attributed to the true-count bucket each round's bet
    /// was sized from. Sums to the total profit of the run.
    pub profit_from_true: [f64; 7],
    /// How far along the run got before it stopped, 0 to 100. Always 100
    /// once any terminating bound fired.
    pub progress: f64,
}

impl SingleOutcome {
    pub fn profit(&self) -> f64 {
        self.profit_from_true.iter().sum()
    }

    pub fn win_percentage(&self) -> Option<f64> {
        self.percentage(self.hands_won + self.blackjacks)
    }

    pub fn loss_percentage(&self) -> Option<f64> {
        self.percentage(self.hands_lost)
    }

    pub fn draw_percentage(&self) -> Option<f64> {
        self.percentage(self.hands_drawn)
    }

    fn percentage(&self, tally: u64) -> Option<f64> {
        if self.hands_played == 0 {
            None
        } else {
            Some(tally as f64 / self.hands_played as f64 * 100.0)
        }
    }
}

/// Plays one AI seat against the house until a bankroll target or a ceiling
/// ends the run.
pub fn run_single(request: &SimulationRequest) -> GameResult<SingleOutcome> {
    let bounds = request.bounds;
    // A seat with nothing left cannot bet, so the effective fail line never
    // sits below zero.
    let fail_line = bounds.bankroll_fail.max(0.0);
    let hand_ceiling = bounds.human_hand_ceiling();
    let deadline = Duration::from_secs(bounds.max_sim_seconds);
    let started = Instant::now();

    let mut game = Game::new(
        request.rules,
        vec![PlayerInfo::Ai {
            bankroll: request.bankroll,
            play_skill: request.play_skill,
            count_skill: request.count_skill,
            spread: request.spread,
        }],
    );
    game.start_game()?;

    let mut outcome = SingleOutcome {
        status: RunStatus::Unfinished,
        hands_played: 0,
        final_bankroll: request.bankroll,
        hands_won: 0,
        hands_lost: 0,
        hands_drawn: 0,
        blackjacks: 0,
        surrenders: 0,
        peak_bankroll: request.bankroll,
        trough_bankroll: request.bankroll,
        profit_from_true: [0.0; 7],
        progress: 0.0,
    };

    let mut rounds: u64 = 0;
    loop {
        let bankroll = game.players()[0].bankroll();
        if bankroll >= bounds.bankroll_goal {
            outcome.status = RunStatus::Won;
        } else if bankroll <= fail_line {
            outcome.status = RunStatus::Lost;
        }
        outcome.final_bankroll = bankroll;
        outcome.peak_bankroll = outcome.peak_bankroll.max(bankroll);
        outcome.trough_bankroll = outcome.trough_bankroll.min(bankroll);

        // Progress only ever moves forward, whichever bound is closest.
        let elapsed = started.elapsed();
        outcome.progress = outcome
            .progress
            .max(ratio(bankroll - request.bankroll, bounds.bankroll_goal - request.bankroll))
            .max(ratio(request.bankroll - bankroll, request.bankroll - fail_line))
            .max(ratio(elapsed.as_secs_f64(), deadline.as_secs_f64()))
            .max(ratio(outcome.hands_played as f64, hand_ceiling as f64));
        assert!(
            (0.0..=100.0).contains(&outcome.progress),
            "progress left its range: {}",
            outcome.progress
        );

        if outcome.status != RunStatus::Unfinished
            || elapsed >= deadline
            || outcome.hands_played >= hand_ceiling
        {
            break;
        }

        game.continue_until_state(GameState::Cleanup)?;
        rounds += 1;

        let player = &game.players()[0];
        let delta = player.bankroll() - bankroll;
        let bucket = BetSpread::bucket(player.brain().expect("ai seat").last_true_count);
        outcome.profit_from_true[bucket] += delta;
        for hand in &player.hands {
            outcome.hands_played += 1;
            match hand.result() {
                HandResult::Win => outcome.hands_won += 1,
                HandResult::Loss => outcome.hands_lost += 1,
                HandResult::Draw => outcome.hands_drawn += 1,
                HandResult::Blackjack => outcome.blackjacks += 1,
                HandResult::Surrendered => outcome.surrenders += 1,
                HandResult::Undetermined => unreachable!("round left a hand undetermined"),
            }
        }
        game.finish_round()?;

        if request.rounds_between_yields > 0 && rounds % request.rounds_between_yields == 0 {
            thread::yield_now();
        }
    }

    // Every cent of profit must be attributed to some true-count bucket.
    let attributed: f64 = outcome.profit_from_true.iter().sum();
    let total = outcome.final_bankroll - request.bankroll;
    assert!(
        (attributed - total).abs() < 1e-2,
        "profit attribution drifted: {} vs {}",
        attributed,
        total
    );

    Ok(outcome)
}

/// Progress toward one bound as a clamped percentage. A degenerate bound
/// (zero span) contributes nothing.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        0.0
    } else {
        (numerator / denominator * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::DoublePolicy;

    pub(crate) fn quick_request() -> SimulationRequest {
        SimulationRequest {
            rules: GameRules {
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
            },
            bankroll: 1000.0,
            play_skill: 100,
            count_skill: 100,
            spread: BetSpread::new([10.0, 10.0, 20.0, 40.0, 60.0, 80.0, 100.0]),
            bounds: Bounds {
                bankroll_goal: 1500.0,
                bankroll_fail: 500.0,
                max_sim_seconds: 5,
                hands_per_hour: 100,
                hours_per_day: 1,
                days_per_week: 1,
                weeks: 1,
            },
            runs: 2,
            rounds_between_yields: 16,
        }
    }

    #[test]
    fn hand_ceiling_multiplies_the_span() {
        let bounds = Bounds {
            bankroll_goal: 0.0,
            bankroll_fail: 0.0,
            max_sim_seconds: 1,
            hands_per_hour: 80,
            hours_per_day: 8,
            days_per_week: 5,
            weeks: 2,
        };
        assert_eq!(bounds.human_hand_ceiling(), 6400);
    }

    #[test]
    fn hand_tallies_are_disjoint_and_complete() {
        let outcome = run_single(&quick_request()).unwrap();
        let tallied = outcome.hands_won
            + outcome.hands_lost
            + outcome.hands_drawn
            + outcome.blackjacks
            + outcome.surrenders;
        assert_eq!(tallied, outcome.hands_played);
        assert!(outcome.hands_played > 0);
    }

    #[test]
    fn profit_attribution_conserves_the_bankroll_delta() {
        let request = quick_request();
        let outcome = run_single(&request).unwrap();
        let total = outcome.final_bankroll - request.bankroll;
        assert!((outcome.profit() - total).abs() < 1e-2);
    }

    #[test]
    fn finished_runs_report_full_progress() {
        let outcome = run_single(&quick_request()).unwrap();
        assert_eq!(outcome.progress, 100.0);
    }

    #[test]
    fn a_met_goal_wins_without_playing() {
        let mut request = quick_request();
        request.bounds.bankroll_goal = request.bankroll;
        let outcome = run_single(&request).unwrap();
        assert_eq!(outcome.status, RunStatus::Won);
        assert_eq!(outcome.hands_played, 0);
        assert_eq!(outcome.final_bankroll, request.bankroll);
    }

    #[test]
    fn a_spent_bankroll_loses_without_playing() {
        let mut request = quick_request();
        request.bankroll = 400.0;
        let outcome = run_single(&request).unwrap();
        assert_eq!(outcome.status, RunStatus::Lost);
        assert_eq!(outcome.hands_played, 0);
    }

    #[test]
    fn busted_seat_loses_even_below_a_negative_fail_line() {
        let mut request = quick_request();
        request.bankroll = 20.0;
        request.bounds.bankroll_goal = 100_000.0;
        request.bounds.bankroll_fail = -100.0;
        let mut saw_a_bust = false;
        for _ in 0..20 {
            let outcome = run_single(&request).unwrap();
            // A seat that busts must terminate as Lost, never keep playing
            // zero-stake hands to a ceiling as Unfinished.
            if outcome.final_bankroll <= 0.0 {
                saw_a_bust = true;
                assert_eq!(outcome.status, RunStatus::Lost);
                assert_eq!(outcome.progress, 100.0);
            }
        }
        assert!(saw_a_bust, "20 runs from 2 betting units never busted");
    }

    #[test]
    fn water_marks_bracket_the_final_bankroll() {
        let request = quick_request();
        let outcome = run_single(&request).unwrap();
        assert!(outcome.peak_bankroll >= request.bankroll);
        assert!(outcome.trough_bankroll <= request.bankroll);
        assert!(outcome.peak_bankroll >= outcome.final_bankroll);
        assert!(outcome.trough_bankroll <= outcome.final_bankroll);
    }

    #[test]
    fn percentages_are_absent_without_hands() {
        let mut request = quick_request();
        request.bounds.bankroll_goal = request.bankroll;
        let outcome = run_single(&request).unwrap();
        assert_eq!(outcome.win_percentage(), None);
        assert_eq!(outcome.loss_percentage(), None);
    }

    #[test]
    fn percentages_cover_all_outcomes() {
        let outcome = run_single(&quick_request()).unwrap();
        let covered = outcome.win_percentage().unwrap()
            + outcome.loss_percentage().unwrap()
            + outcome.draw_percentage().unwrap()
            + outcome.percentage(outcome.surrenders).unwrap();
        assert!((covered - 100.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_ratio_contributes_nothing() {
        assert_eq!(ratio(50.0, 0.0), 0.0);
        assert_eq!(ratio(-10.0, 100.0), 0.0);
        assert_eq!(ratio(250.0, 100.0), 100.0);
    }
}
