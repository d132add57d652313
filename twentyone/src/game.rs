pub mod card;
pub mod hand;
pub mod player;
pub mod rules;
pub mod shoe;

use self::card::Card;
use self::hand::{Hand, HandResult};
use self::player::{Dealer, Player, PlayerId, PlayerInfo};
use self::rules::RulesEngine;
use crate::error::{GameError, GameResult};
use crate::{GameRules, PlayerDecision};

use serde::Serialize;
use twentyone_macros::allowed_state;

/// The states one round cycles through. Dealer blackjack jumps straight to
/// Results; every other transition is linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameState {
    NotStarted,
    Betting,
    Dealing,
    PlayerBlackjackCheck,
    Insurance,
    EarlySurrender,
    DealerBlackjackCheck,
    LateSurrender,
    HumanDecisions,
    AiDecisions,
    DealerDecisions,
    Results,
    Payouts,
    Cleanup,
}

/// One blackjack table: the dealer with her shoe, the seated players and the
/// round state machine that moves them through betting, dealing, decisions
/// and payouts.
pub struct Game {
    rules: RulesEngine,
    state: GameState,
    dealer: Dealer,
    players: Vec<Player>,
    next_player_id: PlayerId,
}

impl Game {
    pub fn new(rules: GameRules, roster: Vec<PlayerInfo>) -> Game {
        let dealer = Dealer::new(&rules);
        let mut game = Game {
            rules: RulesEngine::new(rules),
            state: GameState::NotStarted,
            dealer,
            players: Vec::new(),
            next_player_id: 1,
        };
        for info in roster {
            game.add_player(info);
        }
        game
    }

    fn add_player(&mut self, info: PlayerInfo) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;
        self.players.push(Player::new(id, info));
        id
    }

    /// Seats a human. Can be called before the first round or between rounds.
    #[allowed_state(NotStarted, Betting)]
    pub fn register_human_player(&mut self, info: PlayerInfo) -> GameResult<PlayerId> {
        Ok(self.add_player(info))
    }

    #[allowed_state(NotStarted)]
    pub fn start_game(&mut self) -> GameResult<()> {
        if self.players.is_empty() {
            return Err(GameError::IllegalPlay("cannot start a game with no players"));
        }
        self.state = GameState::Betting;
        Ok(())
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn rules(&self) -> &RulesEngine {
        &self.rules
    }

    pub fn dealer(&self) -> &Dealer {
        &self.dealer
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: PlayerId) -> GameResult<&Player> {
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .ok_or(GameError::UnknownPlayer(player_id))
    }

    fn player_index(&self, player_id: PlayerId) -> GameResult<usize> {
        self.players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(GameError::UnknownPlayer(player_id))
    }

    /// Drives the round forward until the machine sits in `target`. Pending
    /// human input surfaces as `InvalidState` instead of being skipped over.
    pub fn continue_until_state(&mut self, target: GameState) -> GameResult<()> {
        while self.state != target {
            self.advance()?;
        }
        Ok(())
    }

    /// Clears the table for the next round.
    #[allowed_state(Cleanup)]
    pub fn finish_round(&mut self) -> GameResult<()> {
        for player in self.players.iter_mut() {
            player.hands.clear();
        }
        self.dealer.clear_hand();
        self.state = GameState::Betting;
        Ok(())
    }

    // ---- externally driven operations -----------------------------------

    /// Places a human bet and seeds the round's hand. The bet is deducted
    /// from the bankroll immediately.
    #[allowed_state(Betting)]
    pub fn place_bet(&mut self, player_id: PlayerId, amount: f64) -> GameResult<()> {
        let p = self.player_index(player_id)?;
        if self.players[p].is_ai() {
            return Err(GameError::IllegalPlay("AI bets are sized automatically"));
        }
        if !self.rules.bet_is_legal(amount) {
            return Err(GameError::IllegalPlay("bet is outside the table limits"));
        }
        if amount > self.players[p].bankroll() {
            return Err(GameError::IllegalPlay("bet exceeds bankroll"));
        }
        if !self.players[p].hands.is_empty() {
            return Err(GameError::IllegalPlay("bet already placed this round"));
        }
        let player = &mut self.players[p];
        player.debit(amount);
        player.hands.push(Hand::new(amount));
        player.last_bet = amount;
        self.advance_if_ready();
        Ok(())
    }

    #[allowed_state(Insurance)]
    pub fn set_insurance(&mut self, player_id: PlayerId, take: bool) -> GameResult<()> {
        let p = self.player_index(player_id)?;
        let player = &self.players[p];
        if !self.rules.can_insure(&player.hands, self.dealer.up_card())
            || player.hands[0].is_finalized()
        {
            return Err(GameError::IllegalPlay("insurance is not on offer"));
        }
        if player.hands[0].insured.is_some() {
            return Err(GameError::IllegalPlay("insurance already answered"));
        }
        if take && player.bankroll() < player.hands[0].bet() / 2.0 {
            return Err(GameError::IllegalPlay("cannot cover the insurance bet"));
        }
        self.record_insurance(p, take);
        self.advance_if_ready();
        Ok(())
    }

    #[allowed_state(EarlySurrender, LateSurrender)]
    pub fn set_surrender(&mut self, player_id: PlayerId, surrender: bool) -> GameResult<()> {
        let p = self.player_index(player_id)?;
        let player = &self.players[p];
        let eligible = match self.state {
            GameState::EarlySurrender => self.rules.can_early_surrender(&player.hands),
            _ => self.rules.can_late_surrender(&player.hands),
        };
        if !eligible || player.hands[0].is_finalized() {
            return Err(GameError::IllegalPlay("surrender is not on offer"));
        }
        if player.hands[0].surrendered.is_some() {
            return Err(GameError::IllegalPlay("surrender already answered"));
        }
        if surrender {
            self.surrender_hand(p);
        } else {
            self.players[p].hands[0].surrendered = Some(false);
        }
        self.advance_if_ready();
        Ok(())
    }

    #[allowed_state(HumanDecisions)]
    pub fn hit(&mut self, player_id: PlayerId) -> GameResult<()> {
        let (p, h) = self.active_human_hand(player_id)?;
        if !self.rules.is_legal_play(PlayerDecision::Hit, &self.players[p], h, self.state) {
            return Err(GameError::IllegalPlay("this hand cannot be hit"));
        }
        self.do_hit(p, h);
        self.advance_if_ready();
        Ok(())
    }

    #[allowed_state(HumanDecisions)]
    pub fn stand(&mut self, player_id: PlayerId) -> GameResult<()> {
        let (p, h) = self.active_human_hand(player_id)?;
        self.players[p].hands[h].stand();
        self.advance_if_ready();
        Ok(())
    }

    #[allowed_state(HumanDecisions)]
    pub fn double_down(&mut self, player_id: PlayerId) -> GameResult<()> {
        let (p, h) = self.active_human_hand(player_id)?;
        if !self.rules.is_legal_play(PlayerDecision::Double, &self.players[p], h, self.state) {
            return Err(GameError::IllegalPlay("this hand cannot be doubled"));
        }
        self.do_double(p, h);
        self.advance_if_ready();
        Ok(())
    }

    #[allowed_state(HumanDecisions)]
    pub fn split(&mut self, player_id: PlayerId) -> GameResult<()> {
        let (p, h) = self.active_human_hand(player_id)?;
        if !self.rules.is_legal_play(PlayerDecision::Split, &self.players[p], h, self.state) {
            return Err(GameError::IllegalPlay("this hand cannot be split"));
        }
        self.do_split(p, h);
        self.advance_if_ready();
        Ok(())
    }

    fn active_human_hand(&self, player_id: PlayerId) -> GameResult<(usize, usize)> {
        let p = self.player_index(player_id)?;
        if self.players[p].is_ai() {
            return Err(GameError::IllegalPlay("AI hands play themselves"));
        }
        match self.players[p].active_hand_index() {
            Some(h) => Ok((p, h)),
            None => Err(GameError::IllegalPlay("no active hand")),
        }
    }

    /// Mutations drive the machine themselves: keep advancing until the round
    /// needs more input or reaches Cleanup.
    fn advance_if_ready(&mut self) {
        while self.state != GameState::Cleanup && self.advance().is_ok() {}
    }

    // ---- state transitions ----------------------------------------------

    fn advance(&mut self) -> GameResult<()> {
        match self.state {
            GameState::NotStarted | GameState::Cleanup => Err(GameError::InvalidState {
                op: "advance",
                state: self.state,
            }),
            GameState::Betting => self.advance_betting(),
            GameState::Dealing => self.advance_dealing(),
            GameState::PlayerBlackjackCheck => self.advance_player_blackjack_check(),
            GameState::Insurance => self.advance_insurance(),
            GameState::EarlySurrender => self.advance_surrender(GameState::EarlySurrender),
            GameState::DealerBlackjackCheck => self.advance_dealer_blackjack_check(),
            GameState::LateSurrender => self.advance_surrender(GameState::LateSurrender),
            GameState::HumanDecisions => self.advance_human_decisions(),
            GameState::AiDecisions => self.advance_ai_decisions(),
            GameState::DealerDecisions => self.advance_dealer_decisions(),
            GameState::Results => self.advance_results(),
            GameState::Payouts => self.advance_payouts(),
        }
    }

    fn advance_betting(&mut self) -> GameResult<()> {
        let decks_remaining = self.dealer.shoe.decks_remaining();
        let min_bet = self.rules.rules().min_bet;
        let max_bet = self.rules.rules().max_bet;
        for player in self.players.iter_mut() {
            if !player.hands.is_empty() {
                continue;
            }
            if player.is_ai() {
                let bankroll = player.bankroll();
                let true_count = player.true_count(decks_remaining);
                let brain = player.brain_mut().expect("ai player");
                brain.last_true_count = true_count;
                let bet = brain.spread.sized_bet(true_count, min_bet, max_bet, bankroll);
                player.debit(bet);
                player.hands.push(Hand::new(bet));
                player.last_bet = bet;
            } else if player.last_bet > 0.0 && player.bankroll() >= player.last_bet {
                // Documented quirk: a human who does not re-bet plays the
                // previous bet again.
                let bet = player.last_bet;
                player.debit(bet);
                player.hands.push(Hand::new(bet));
            } else {
                return Err(GameError::InvalidState {
                    op: "advance_betting",
                    state: GameState::Betting,
                });
            }
        }
        self.state = GameState::Dealing;
        Ok(())
    }

    fn advance_dealing(&mut self) -> GameResult<()> {
        if self.rules.shoe_must_reshuffle(&self.dealer.shoe) {
            self.dealer.shoe.reshuffle();
            for player in self.players.iter_mut() {
                player.reset_count();
            }
        }
        for p in 0..self.players.len() {
            for _ in 0..2 {
                let card = self.draw_seen();
                self.players[p].hands[0].receive(card);
            }
        }
        // The dealer's first card stays face down; only the up-card is
        // visible to counters.
        let hole = self.dealer.shoe.draw();
        self.dealer.hand.receive(hole);
        let up = self.draw_seen();
        self.dealer.hand.receive(up);
        self.state = GameState::PlayerBlackjackCheck;
        Ok(())
    }

    fn advance_player_blackjack_check(&mut self) -> GameResult<()> {
        let dealer_natural = self.dealer.hand.is_blackjack();
        let multiplier = self.rules.rules().payout_blackjack;
        for player in self.players.iter_mut() {
            for hand in player.hands.iter_mut() {
                if hand.is_blackjack() {
                    if dealer_natural {
                        hand.finalize(HandResult::Draw, 0.0);
                    } else {
                        let payout = hand.bet() * multiplier;
                        hand.finalize(HandResult::Blackjack, payout);
                    }
                }
            }
        }
        self.state = GameState::Insurance;
        Ok(())
    }

    fn advance_insurance(&mut self) -> GameResult<()> {
        let up = self.dealer.up_card();
        for p in 0..self.players.len() {
            let player = &self.players[p];
            if !self.rules.can_insure(&player.hands, up)
                || player.hands[0].is_finalized()
                || player.hands[0].insured.is_some()
            {
                continue;
            }
            if player.is_ai() {
                let affordable = player.bankroll() >= player.hands[0].bet() / 2.0;
                let take = affordable
                    && player
                        .brain()
                        .expect("ai player")
                        .strategy
                        .should_insure(&mut rand::thread_rng());
                self.record_insurance(p, take);
            } else {
                // Humans answer through set_insurance.
                return Err(GameError::InvalidState {
                    op: "advance_insurance",
                    state: self.state,
                });
            }
        }
        self.state = if self.rules.rules().allow_early_surrender {
            GameState::EarlySurrender
        } else {
            GameState::DealerBlackjackCheck
        };
        Ok(())
    }

    fn record_insurance(&mut self, p: usize, take: bool) {
        let player = &mut self.players[p];
        player.hands[0].insured = Some(take);
        if take {
            let side_bet = player.hands[0].bet() / 2.0;
            player.hands[0].insurance_bet = side_bet;
            player.debit(side_bet);
        }
    }

    fn advance_surrender(&mut self, stage: GameState) -> GameResult<()> {
        let up_value = self.dealer.up_card().value();
        for p in 0..self.players.len() {
            let player = &self.players[p];
            let eligible = match stage {
                GameState::EarlySurrender => self.rules.can_early_surrender(&player.hands),
                _ => self.rules.can_late_surrender(&player.hands),
            };
            if !eligible
                || player.hands[0].is_finalized()
                || player.hands[0].surrendered.is_some()
            {
                continue;
            }
            if player.is_ai() {
                let wants = player
                    .brain()
                    .expect("ai player")
                    .strategy
                    .wants_surrender(&player.hands[0], up_value, &mut rand::thread_rng());
                if wants {
                    self.surrender_hand(p);
                } else {
                    self.players[p].hands[0].surrendered = Some(false);
                }
            } else {
                // Humans answer through set_surrender.
                return Err(GameError::InvalidState {
                    op: "advance_surrender",
                    state: self.state,
                });
            }
        }
        self.state = match stage {
            GameState::EarlySurrender => GameState::DealerBlackjackCheck,
            _ => GameState::HumanDecisions,
        };
        Ok(())
    }

    /// Settles a surrender on the spot: half the bet comes back and the hand
    /// leaves active play.
    fn surrender_hand(&mut self, p: usize) {
        let player = &mut self.players[p];
        let refund = player.hands[0].bet() / 2.0;
        player.hands[0].surrendered = Some(true);
        player.hands[0].finalize(HandResult::Surrendered, refund);
        player.credit(refund);
    }

    fn advance_dealer_blackjack_check(&mut self) -> GameResult<()> {
        if self.dealer.hand.is_blackjack() {
            // 3x the side bet covers the stake plus the 2:1 insurance win.
            for player in self.players.iter_mut() {
                let refund: f64 = player.hands.iter().map(|h| h.insurance_bet).sum::<f64>() * 3.0;
                if refund > 0.0 {
                    player.credit(refund);
                }
            }
            let hole = self.dealer.hole_card();
            self.observe_all(hole);
            // No further play matters against a dealer natural.
            self.state = GameState::Results;
        } else {
            self.state = GameState::LateSurrender;
        }
        Ok(())
    }

    fn advance_human_decisions(&mut self) -> GameResult<()> {
        let pending = self
            .players
            .iter()
            .any(|p| !p.is_ai() && p.active_hand_index().is_some());
        if pending {
            return Err(GameError::InvalidState {
                op: "advance_human_decisions",
                state: self.state,
            });
        }
        self.state = GameState::AiDecisions;
        Ok(())
    }

    fn advance_ai_decisions(&mut self) -> GameResult<()> {
        let up_value = self.dealer.up_card().value();
        for p in 0..self.players.len() {
            if !self.players[p].is_ai() {
                continue;
            }
            let mut h = 0;
            while h < self.players[p].hands.len() {
                let mut turns = 0;
                while !self.players[p].hands[h].is_played() {
                    turns += 1;
                    assert!(turns <= 32, "AI decision loop failed to resolve a hand");
                    let decision = {
                        let player = &self.players[p];
                        let brain = player.brain().expect("ai player");
                        brain.strategy.decide(
                            player,
                            h,
                            up_value,
                            &self.rules,
                            &mut rand::thread_rng(),
                        )
                    };
                    if !self.rules.is_legal_play(decision, &self.players[p], h, self.state) {
                        // The engine only offers legal plays; standing keeps
                        // the round sound if that ever breaks.
                        debug_assert!(false, "AI proposed an illegal {:?}", decision);
                        self.players[p].hands[h].stand();
                        break;
                    }
                    self.apply_decision(p, h, decision);
                }
                h += 1;
            }
        }
        self.state = GameState::DealerDecisions;
        Ok(())
    }

    fn apply_decision(&mut self, p: usize, h: usize, decision: PlayerDecision) {
        match decision {
            PlayerDecision::Hit => self.do_hit(p, h),
            PlayerDecision::Stand => self.players[p].hands[h].stand(),
            PlayerDecision::Double => self.do_double(p, h),
            PlayerDecision::Split => self.do_split(p, h),
            PlayerDecision::Surrender => self.surrender_hand(p),
            PlayerDecision::PlaceHolder => unreachable!("placeholder decision reached execution"),
        }
    }

    fn do_hit(&mut self, p: usize, h: usize) {
        let card = self.draw_seen();
        let hand = &mut self.players[p].hands[h];
        hand.receive(card);
        if hand.is_bust() {
            // A bust settles immediately rather than waiting for Results.
            hand.finalize(HandResult::Loss, 0.0);
        } else if hand.value() == 21 {
            hand.stand();
        }
    }

    fn do_double(&mut self, p: usize, h: usize) {
        let extra = self.players[p].hands[h].bet();
        self.players[p].debit(extra);
        self.players[p].hands[h].double_bet();
        let card = self.draw_seen();
        let hand = &mut self.players[p].hands[h];
        hand.receive(card);
        if hand.is_bust() {
            hand.finalize(HandResult::Loss, 0.0);
        } else {
            hand.stand();
        }
    }

    fn do_split(&mut self, p: usize, h: usize) {
        let bet = self.players[p].hands[h].bet();
        let aces = self.players[p].hands[h].is_ace_pair();
        self.players[p].debit(bet);
        let seed = self.players[p].hands[h].split_off();
        let mut sibling = Hand::new(bet);
        sibling.from_split = true;
        sibling.receive(seed);
        self.players[p].hands.push(sibling);
        let sibling_index = self.players[p].hands.len() - 1;
        let card = self.draw_seen();
        self.players[p].hands[h].receive(card);
        let card = self.draw_seen();
        self.players[p].hands[sibling_index].receive(card);
        if aces && !self.rules.rules().hit_split_aces {
            // Split aces take one card each and are done.
            for idx in [h, sibling_index] {
                let hand = &mut self.players[p].hands[idx];
                if !hand.is_played() {
                    hand.stand();
                }
            }
        }
    }

    fn advance_dealer_decisions(&mut self) -> GameResult<()> {
        let contested = self
            .players
            .iter()
            .flat_map(|p| p.hands.iter())
            .any(|hand| !hand.is_finalized());
        if contested {
            // The hole card goes face up once the dealer plays.
            let hole = self.dealer.hole_card();
            self.observe_all(hole);
            while self.dealer.must_hit(self.rules.rules().dealer_hits_soft_seventeen) {
                let card = self.draw_seen();
                self.dealer.hand.receive(card);
            }
        }
        self.state = GameState::Results;
        Ok(())
    }

    fn advance_results(&mut self) -> GameResult<()> {
        let dealer_value = self.dealer.hand.value();
        let dealer_bust = self.dealer.hand.is_bust();
        let dealer_natural = self.dealer.hand.is_blackjack();
        for player in self.players.iter_mut() {
            for hand in player.hands.iter_mut() {
                if hand.is_finalized() {
                    continue;
                }
                let value = hand.value();
                let bet = hand.bet();
                if value > 21 || dealer_natural {
                    hand.finalize(HandResult::Loss, 0.0);
                } else if dealer_bust || value > dealer_value {
                    hand.finalize(HandResult::Win, bet);
                } else if value == dealer_value {
                    hand.finalize(HandResult::Draw, 0.0);
                } else {
                    hand.finalize(HandResult::Loss, 0.0);
                }
            }
        }
        self.state = GameState::Payouts;
        Ok(())
    }

    fn advance_payouts(&mut self) -> GameResult<()> {
        let mut house_delta = 0.0;
        for player in self.players.iter_mut() {
            let mut credit = 0.0;
            for hand in player.hands.iter() {
                match hand.result() {
                    HandResult::Win | HandResult::Blackjack => {
                        credit += hand.bet() + hand.payout;
                        house_delta -= hand.payout;
                    }
                    HandResult::Loss => {
                        credit += hand.payout;
                        house_delta += hand.bet();
                    }
                    HandResult::Draw => credit += hand.bet(),
                    // Settled when the surrender was recorded.
                    HandResult::Surrendered => {}
                    HandResult::Undetermined => panic!("unhandled hand result at payout"),
                }
            }
            player.credit(credit);
        }
        if house_delta >= 0.0 {
            self.dealer.credit(house_delta);
        } else {
            self.dealer.debit(-house_delta);
        }
        self.state = GameState::Cleanup;
        Ok(())
    }

    /// Draws a card face up: every counting player sees it.
    fn draw_seen(&mut self) -> Card {
        let card = self.dealer.shoe.draw();
        self.observe_all(card);
        card
    }

    fn observe_all(&mut self, card: Card) {
        let mut rng = rand::thread_rng();
        for player in self.players.iter_mut() {
            player.observe_card(card, &mut rng);
        }
    }
}
