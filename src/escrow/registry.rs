//! Game Registry
//!
//! Maps game ids to escrow ledger entries and owns sequential id
//! allocation. Pure storage plus the create/join transitions; the service
//! layer composes it with authorization, settlement, and the value rail.
//!
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::amount::Amount;
use crate::core::identity::{GameId, PlayerId};
use crate::escrow::error::EscrowError;
use crate::escrow::game::{Game, GameStatus};

/// All games, keyed by id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameRegistry {
    games: BTreeMap<GameId, Game>,
    next_id: GameId,
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRegistry {
    /// Create an empty registry. Ids start at 1.
    pub fn new() -> Self {
        Self {
            games: BTreeMap::new(),
            next_id: GameId(1),
        }
    }

    /// Allocate the next sequential id and create a game in WAITING status.
    ///
    /// The deposit has already been validated and collected by the caller.
    pub fn create_game(&mut self, creator: PlayerId, deposit: Amount, now: DateTime<Utc>) -> GameId {
        let id = self.next_id;
        self.next_id = self.next_id.next();
        self.games.insert(id, Game::new(id, creator, deposit, now));
        id
    }

    /// Join a waiting game as the second player.
    ///
    /// All preconditions are checked before any mutation. The deposit has
    /// already been validated and collected by the caller.
    pub fn join_game(
        &mut self,
        game_id: GameId,
        joiner: PlayerId,
        deposit: Amount,
        now: DateTime<Utc>,
    ) -> Result<(), EscrowError> {
        let game = self.get(game_id)?;
        if game.status != GameStatus::Waiting || game.player_b.is_some() {
            return Err(EscrowError::GameNotJoinable(game_id));
        }
        if game.player_a == joiner {
            return Err(EscrowError::SelfJoinForbidden);
        }

        let game = self.get_mut(game_id)?;
        game.player_b = Some(joiner);
        game.escrow_b = deposit;
        game.balance_b = deposit;
        game.status = GameStatus::Active;
        game.last_move_at = now;
        Ok(())
    }

    /// Read-only game lookup.
    pub fn get(&self, game_id: GameId) -> Result<&Game, EscrowError> {
        self.games
            .get(&game_id)
            .ok_or(EscrowError::GameNotFound(game_id))
    }

    /// Mutable game lookup.
    pub fn get_mut(&mut self, game_id: GameId) -> Result<&mut Game, EscrowError> {
        self.games
            .get_mut(&game_id)
            .ok_or(EscrowError::GameNotFound(game_id))
    }

    /// Number of games ever created.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// True if no game exists.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Iterate all games in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Game> {
        self.games.values()
    }

    /// Next id the registry will allocate.
    pub fn next_id(&self) -> GameId {
        self.next_id
    }
}

// =============================================================================
// TESTS
// =============================================================================
