//! Per-Game Escrow Ledger
//!
//! One `Game` record per match: two players, their staked and live balances,
//! the status state machine, the session-authorization set, and the log of
//! already-applied captures.
//!
//! Status transitions:
//!
//! ```text
//! WAITING --join------------------> ACTIVE
//! WAITING --cancel (after grace)--> CANCELLED
//! ACTIVE  --end_game / timeout----> FINISHED
//! ```
//!
//! FINISHED and CANCELLED are absorbing; no transition leaves them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::amount::Amount;
use crate::core::identity::{GameId, PlayerId};

/// Lifecycle status of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum GameStatus {
    /// Created, waiting for a second player to deposit.
    #[default]
    Waiting,
    /// Both deposits held, captures may be applied.
    Active,
    /// Settled with a winner; terminal.
    Finished,
    /// Cancelled before a second deposit; terminal.
    Cancelled,
}

/// Unique identifier for a single signed capture.
///
/// The replay key: a capture id is consumed exactly once per game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureId(pub Uuid);

impl CaptureId {
    /// Generate a fresh random capture id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Log of capture ids already applied to a game.
///
/// A game holds at most 30 non-king pieces across both sides, so the log is
/// capacity-bounded rather than an unbounded set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CaptureLog {
    applied: Vec<CaptureId>,
}

impl CaptureLog {
    /// Maximum number of captures a single game can produce.
    pub const CAPACITY: usize = 30;

    /// Has this capture id already been applied?
    pub fn contains(&self, id: CaptureId) -> bool {
        self.applied.contains(&id)
    }

    /// Can another capture be recorded?
    pub fn has_capacity(&self) -> bool {
        self.applied.len() < Self::CAPACITY
    }

    /// Record an applied capture id.
    ///
    /// Callers check `contains` and `has_capacity` first; recording itself
    /// cannot fail, so it can sit after the balance transfer in a transition
    /// without risking partial state.
    pub fn record(&mut self, id: CaptureId) {
        debug_assert!(!self.contains(id));
        debug_assert!(self.has_capacity());
        self.applied.push(id);
    }

    /// Number of captures applied so far.
    pub fn len(&self) -> usize {
        self.applied.len()
    }

    /// True if no capture has been applied.
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

/// One side's settlement payout and its rail status.
///
/// Written once when a game settles. `paid` flips as the rail confirms
/// each transfer, so a resumed settlement never pays a side twice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Receiving player.
    pub player: PlayerId,
    /// Amount fixed at settlement.
    pub amount: Amount,
    /// Whether the rail confirmed this transfer.
    pub paid: bool,
}

/// Per-game escrow ledger entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Game {
    /// Sequential identifier, immutable once created.
    pub id: GameId,

    /// Creator; always present.
    pub player_a: PlayerId,

    /// Second player; absent until someone joins.
    pub player_b: Option<PlayerId>,

    /// Amount deposited by the creator. Immutable after deposit, except
    /// zeroed on cancellation to prevent a double refund.
    pub escrow_a: Amount,

    /// Amount deposited by the joiner.
    pub escrow_b: Amount,

    /// Creator's live balance; mutated only by captures and settlement.
    pub balance_a: Amount,

    /// Joiner's live balance.
    pub balance_b: Amount,

    /// Lifecycle status.
    pub status: GameStatus,

    /// Winner, set only at FINISHED.
    pub winner: Option<PlayerId>,

    /// Creation timestamp (cancellation grace period anchor).
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last join or capture (move-timeout anchor).
    pub last_move_at: DateTime<Utc>,

    /// Players that have supplied a valid session authorization.
    ///
    /// Kept separate from being a registered player: joining and
    /// authorizing are two distinct predicates.
    pub authorized_players: BTreeSet<PlayerId>,

    /// Capture ids already applied.
    pub captures: CaptureLog,

    /// Settlement payouts, fixed when the game finishes. Empty before.
    pub payouts: Vec<Payout>,
}

impl Game {
    /// Create a new game from the creator's deposit.
    pub fn new(id: GameId, creator: PlayerId, deposit: Amount, now: DateTime<Utc>) -> Self {
        Self {
            id,
            player_a: creator,
            player_b: None,
            escrow_a: deposit,
            escrow_b: Amount::ZERO,
            balance_a: deposit,
            balance_b: Amount::ZERO,
            status: GameStatus::Waiting,
            winner: None,
            created_at: now,
            last_move_at: now,
            authorized_players: BTreeSet::new(),
            captures: CaptureLog::default(),
            payouts: Vec::new(),
        }
    }

    /// Is this identity one of the two registered players?
    pub fn is_player(&self, id: PlayerId) -> bool {
        self.player_a == id || self.player_b == Some(id)
    }

    /// The other registered player, if both exist and `id` is one of them.
    pub fn opponent_of(&self, id: PlayerId) -> Option<PlayerId> {
        let b = self.player_b?;
        if id == self.player_a {
            Some(b)
        } else if id == b {
            Some(self.player_a)
        } else {
            None
        }
    }

    /// Mark a player as session-authorized for this game.
    pub fn authorize(&mut self, id: PlayerId) {
        self.authorized_players.insert(id);
    }

    /// Has this player supplied a valid session authorization?
    pub fn is_authorized(&self, id: PlayerId) -> bool {
        self.authorized_players.contains(&id)
    }

    /// Live balance of the given player. `None` if not a player.
    pub fn balance_of(&self, id: PlayerId) -> Option<Amount> {
        if id == self.player_a {
            Some(self.balance_a)
        } else if self.player_b == Some(id) {
            Some(self.balance_b)
        } else {
            None
        }
    }

    /// Mutable live balance of the given player.
    pub fn balance_of_mut(&mut self, id: PlayerId) -> Option<&mut Amount> {
        if id == self.player_a {
            Some(&mut self.balance_a)
        } else if self.player_b == Some(id) {
            Some(&mut self.balance_b)
        } else {
            None
        }
    }

    /// Original escrow deposited by the given player.
    pub fn escrow_of(&self, id: PlayerId) -> Option<Amount> {
        if id == self.player_a {
            Some(self.escrow_a)
        } else if self.player_b == Some(id) {
            Some(self.escrow_b)
        } else {
            None
        }
    }

    /// Total escrowed value.
    pub fn total_escrow(&self) -> Amount {
        self.escrow_a + self.escrow_b
    }

    /// Conservation invariant: live balances always sum to total escrow
    /// while the game is ACTIVE.
    pub fn balances_conserved(&self) -> bool {
        self.balance_a + self.balance_b == self.total_escrow()
    }

    /// Is the game in a terminal (absorbing) state?
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, GameStatus::Finished | GameStatus::Cancelled)
    }

    /// Does any committed settlement payout still await the rail?
    pub fn has_pending_payouts(&self) -> bool {
        self.payouts.iter().any(|p| !p.paid && !p.amount.is_zero())
    }

    /// Settlement payout fixed for the given player. Zero before settlement
    /// or for non-players.
    pub fn payout_for(&self, id: PlayerId) -> Amount {
        self.payouts
            .iter()
            .find(|p| p.player == id)
            .map(|p| p.amount)
            .unwrap_or(Amount::ZERO)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn players() -> (PlayerId, PlayerId) {
        (PlayerId::derive("alice"), PlayerId::derive("bob"))
    }

    #[test]
    fn test_new_game_is_waiting() {
        let (a, _) = players();
        let game = Game::new(GameId(1), a, Amount::from_centi(2, 50), Utc::now());

        assert_eq!(game.status, GameStatus::Waiting);
        assert_eq!(game.balance_a, Amount::from_centi(2, 50));
        assert!(game.balance_b.is_zero());
        assert!(game.player_b.is_none());
        assert!(game.winner.is_none());
    }

    #[test]
    fn test_opponent_lookup() {
        let (a, b) = players();
        let mut game = Game::new(GameId(1), a, Amount::from_units(1), Utc::now());

        // No opponent while waiting
        assert_eq!(game.opponent_of(a), None);

        game.player_b = Some(b);
        assert_eq!(game.opponent_of(a), Some(b));
        assert_eq!(game.opponent_of(b), Some(a));
        assert_eq!(game.opponent_of(PlayerId::derive("mallory")), None);
    }

    #[test]
    fn test_authorization_is_separate_from_membership() {
        let (a, b) = players();
        let mut game = Game::new(GameId(1), a, Amount::from_units(1), Utc::now());
        game.player_b = Some(b);

        assert!(game.is_player(b));
        assert!(!game.is_authorized(b));

        game.authorize(b);
        assert!(game.is_authorized(b));
        assert!(!game.is_authorized(a));
    }

    #[test]
    fn test_capture_log_replay_detection() {
        let mut log = CaptureLog::default();
        let id = CaptureId::generate();

        assert!(!log.contains(id));
        log.record(id);
        assert!(log.contains(id));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_payout_tracking() {
        let (a, b) = players();
        let mut game = Game::new(GameId(1), a, Amount::from_units(1), Utc::now());
        assert!(!game.has_pending_payouts());
        assert!(game.payout_for(a).is_zero());

        game.payouts = vec![
            Payout { player: a, amount: Amount::from_centi(2, 55), paid: true },
            Payout { player: b, amount: Amount::from_centi(2, 45), paid: false },
        ];
        assert!(game.has_pending_payouts());
        assert_eq!(game.payout_for(b), Amount::from_centi(2, 45));

        game.payouts[1].paid = true;
        assert!(!game.has_pending_payouts());
    }

    #[test]
    fn test_capture_log_capacity() {
        let mut log = CaptureLog::default();
        for _ in 0..CaptureLog::CAPACITY {
            assert!(log.has_capacity());
            log.record(CaptureId::generate());
        }
        assert!(!log.has_capacity());
    }
}
