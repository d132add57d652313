use serde::{Deserialize, Serialize};
use std::fs;
use twentyone::simulate::{Bounds, SimulationRequest};
use twentyone::strategy::BetSpread;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rule: ConfigRule,
    pub simulator: ConfigSimulator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRule {
    pub min_bet: f64,
    pub max_bet: f64,
    pub number_of_decks: u8,
    pub reset_percentage: f64,
    pub payout_blackjack: f64,
    pub dealer_hits_soft_seventeen: bool,
    pub double_policy: String,
    pub double_first_two_only: bool,
    pub double_after_split: bool,
    pub double_after_split_aces: bool,
    pub max_hands: usize,
    pub hit_split_aces: bool,
    pub allow_early_surrender: bool,
    pub allow_late_surrender: bool,
}

impl TryInto<twentyone::GameRules> for ConfigRule {
    type Error = serde::de::value::Error;

    fn try_into(self) -> Result<twentyone::GameRules, Self::Error> {
        let rules = twentyone::GameRules {
            min_bet: self.min_bet,
            max_bet: self.max_bet,
            number_of_decks: self.number_of_decks,
            reset_percentage: self.reset_percentage,
            payout_blackjack: self.payout_blackjack,
            dealer_hits_soft_seventeen: self.dealer_hits_soft_seventeen,
            double_policy: self.double_policy.parse()?,
            double_first_two_only: self.double_first_two_only,
            double_after_split: self.double_after_split,
            double_after_split_aces: self.double_after_split_aces,
            max_hands: self.max_hands,
            hit_split_aces: self.hit_split_aces,
            allow_early_surrender: self.allow_early_surrender,
            allow_late_surrender: self.allow_late_surrender,
        };

        Ok(rules)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSimulator {
    pub bankroll: f64,
    pub play_skill: u8,
    pub count_skill: u8,
    pub bet_spread: [f64; 7],
    pub runs: usize,
    pub rounds_between_yields: u64,

    pub bankroll_goal: f64,
    pub bankroll_fail: f64,
    pub max_sim_seconds: u64,
    pub hands_per_hour: u64,
    pub hours_per_day: u64,
    pub days_per_week: u64,
    pub weeks: u64,
}

impl TryInto<SimulationRequest> for Config {
    type Error = serde::de::value::Error;

    fn try_into(self) -> Result<SimulationRequest, Self::Error> {
        let simulator = self.simulator;
        let request = SimulationRequest {
            rules: self.rule.try_into()?,
            bankroll: simulator.bankroll,
            play_skill: simulator.play_skill,
            count_skill: simulator.count_skill,
            spread: BetSpread::new(simulator.bet_spread),
            bounds: Bounds {
                bankroll_goal: simulator.bankroll_goal,
                bankroll_fail: simulator.bankroll_fail,
                max_sim_seconds: simulator.max_sim_seconds,
                hands_per_hour: simulator.hands_per_hour,
                hours_per_day: simulator.hours_per_day,
                days_per_week: simulator.days_per_week,
                weeks: simulator.weeks,
            },
            runs: simulator.runs,
            rounds_between_yields: simulator.rounds_between_yields,
        };

        Ok(request)
    }
}

/// Reads the content of a given config file and parses it to a Config.
///
/// Panics if any error occurs.
pub fn parse_config_from_file(filename: &str) -> Config {
    let file_content = fs::read_to_string(filename).unwrap();
    serde_yaml::from_str(&file_content).unwrap()
}
