use crate::error::{GameError, GameResult};
use crate::game::card::Card;
use crate::game::hand::HandResult;
use crate::game::player::{Player, PlayerId, PlayerInfo};
use crate::{Game, GameRules, GameState};

use log::info;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub type GameId = u64;

/// Registry of live tables. Each game sits behind its own lock so callers on
/// different tables never contend; the outer map lock is held only for the
/// lookup itself.
pub struct SessionStore {
    games: Mutex<HashMap<GameId, Arc<Mutex<Game>>>>,
    next_id: AtomicU64,
}

impl SessionStore {
    pub fn new() -> SessionStore {
        SessionStore {
            games: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn create_game(&self, rules: GameRules, roster: Vec<PlayerInfo>) -> GameId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let game = Arc::new(Mutex::new(Game::new(rules, roster)));
        self.games
            .lock()
            .expect("session table lock poisoned")
            .insert(id, game);
        info!("session {} created", id);
        id
    }

    pub fn end_session(&self, id: GameId) -> GameResult<()> {
        self.games
            .lock()
            .expect("session table lock poisoned")
            .remove(&id)
            .map(|_| info!("session {} ended", id))
            .ok_or(GameError::InvalidSession(id))
    }

    fn with_game<T>(
        &self,
        id: GameId,
        operate: impl FnOnce(&mut Game) -> GameResult<T>,
    ) -> GameResult<T> {
        let game = {
            let games = self.games.lock().expect("session table lock poisoned");
            games.get(&id).cloned().ok_or(GameError::InvalidSession(id))?
        };
        let mut game = game.lock().expect("game lock poisoned");
        operate(&mut game)
    }

    pub fn register_human_player(&self, id: GameId, info: PlayerInfo) -> GameResult<PlayerId> {
        self.with_game(id, |game| game.register_human_player(info))
    }

    pub fn start_game(&self, id: GameId) -> GameResult<()> {
        self.with_game(id, |game| game.start_game())
    }

    pub fn place_bet(&self, id: GameId, player: PlayerId, amount: f64) -> GameResult<()> {
        self.with_game(id, |game| game.place_bet(player, amount))
    }

    pub fn set_insurance(&self, id: GameId, player: PlayerId, take: bool) -> GameResult<()> {
        self.with_game(id, |game| game.set_insurance(player, take))
    }

    pub fn set_surrender(&self, id: GameId, player: PlayerId, surrender: bool) -> GameResult<()> {
        self.with_game(id, |game| game.set_surrender(player, surrender))
    }

    pub fn hit(&self, id: GameId, player: PlayerId) -> GameResult<()> {
        self.with_game(id, |game| game.hit(player))
    }

    pub fn stand(&self, id: GameId, player: PlayerId) -> GameResult<()> {
        self.with_game(id, |game| game.stand(player))
    }

    pub fn double_down(&self, id: GameId, player: PlayerId) -> GameResult<()> {
        self.with_game(id, |game| game.double_down(player))
    }

    pub fn split(&self, id: GameId, player: PlayerId) -> GameResult<()> {
        self.with_game(id, |game| game.split(player))
    }

    pub fn finish_round(&self, id: GameId) -> GameResult<()> {
        self.with_game(id, |game| game.finish_round())
    }

    pub fn continue_until_state(&self, id: GameId, target: GameState) -> GameResult<()> {
        self.with_game(id, |game| game.continue_until_state(target))
    }

    pub fn snapshot(&self, id: GameId) -> GameResult<GameSnapshot> {
        self.with_game(id, |game| Ok(GameSnapshot::of(game)))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        SessionStore::new()
    }
}

/// A serializable view of a table for clients. The dealer's hole card is
/// withheld until the round reaches the states where it is public.
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub state: GameState,
    pub dealer_up_card: Option<Card>,
    pub dealer_cards: Vec<Card>,
    pub players: Vec<PlayerSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub bankroll: f64,
    pub is_ai: bool,
    pub hands: Vec<HandSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HandSnapshot {
    pub cards: Vec<Card>,
    pub value: u8,
    pub bet: f64,
    pub result: HandResult,
}

impl GameSnapshot {
    fn of(game: &Game) -> GameSnapshot {
        let hole_is_public = matches!(
            game.state(),
            GameState::Results | GameState::Payouts | GameState::Cleanup
        );
        let dealer = game.dealer();
        GameSnapshot {
            state: game.state(),
            dealer_up_card: if dealer.has_up_card() {
                Some(dealer.up_card())
            } else {
                None
            },
            dealer_cards: if hole_is_public {
                dealer.hand.cards().to_vec()
            } else {
                Vec::new()
            },
            players: game.players().iter().map(PlayerSnapshot::of).collect(),
        }
    }
}

impl PlayerSnapshot {
    fn of(player: &Player) -> PlayerSnapshot {
        PlayerSnapshot {
            id: player.id,
            name: player.name.clone(),
            bankroll: player.bankroll(),
            is_ai: player.is_ai(),
            hands: player
                .hands
                .iter()
                .map(|hand| HandSnapshot {
                    cards: hand.cards().to_vec(),
                    value: hand.value(),
                    bet: hand.bet(),
                    result: hand.result(),
                })
                .collect(),
        }
    }
}
