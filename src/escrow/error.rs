//! Escrow Error Taxonomy
//!
//! Every mutating operation fails atomically with one of these reasons; no
//! partial mutation ever escapes. Authorization failures and value-rail
//! failures keep their own sub-taxonomies.

use thiserror::Error;

use crate::auth::verifier::AuthError;
use crate::core::amount::Amount;
use crate::core::identity::GameId;
use crate::escrow::capture::Piece;
use crate::escrow::rail::RailError;

/// Errors surfaced by escrow ledger transitions.
#[derive(Debug, Error)]
pub enum EscrowError {
    /// Deposit does not match the required escrow amount.
    #[error("invalid deposit: expected {expected}, got {got}")]
    InvalidDeposit { expected: Amount, got: Amount },

    /// No game with this id.
    #[error("game {0} not found")]
    GameNotFound(GameId),

    /// Game is not waiting for a second player.
    #[error("game {0} is not joinable")]
    GameNotJoinable(GameId),

    /// Creator attempted to join their own game.
    #[error("cannot join own game")]
    SelfJoinForbidden,

    /// Transition requires ACTIVE status.
    #[error("game {0} is not active")]
    GameNotActive(GameId),

    /// Caller is not one of the two registered players.
    #[error("not a player in this game")]
    NotAPlayer,

    /// Declared winner is not one of the two registered players.
    #[error("winner is not a player in this game")]
    InvalidWinner,

    /// Piece kind carries no capture value (the king).
    #[error("piece {0:?} is not capturable for value")]
    NonCapturableType(Piece),

    /// Proposed capture exceeds the opponent's live balance. Signals a
    /// desync between the rules engine and the ledger; never clamped.
    #[error("insufficient balance: capture needs {required}, opponent holds {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    /// Move-timeout window has not elapsed.
    #[error("game {0} has not timed out yet")]
    GameNotTimedOut(GameId),

    /// Game is not in a cancellable state.
    #[error("game {0} cannot be cancelled")]
    NotCancellable(GameId),

    /// Only the creator may cancel a waiting game.
    #[error("only the creator may cancel")]
    NotCreator,

    /// Creation grace period is still running.
    #[error("cancellation grace period still active")]
    GracePeriodActive,

    /// Capture log reached its fixed capacity.
    #[error("game {0} has no capture capacity left")]
    CaptureLogFull(GameId),

    /// Signature, session, or replay check failed.
    #[error("authorization failed: {0}")]
    Auth(#[from] AuthError),

    /// The external value-transfer rail rejected a deposit or payout.
    /// Retry policy belongs to the caller, not the ledger.
    #[error("value rail failure: {0}")]
    Rail(#[from] RailError),
}
