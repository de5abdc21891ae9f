//! Capture Settlement Engine
//!
//! The transition that moves value between the two live balances when a
//! piece is captured. Piece values come from a fixed table injected through
//! configuration; the engine never changes game status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::amount::Amount;
use crate::core::identity::PlayerId;
use crate::escrow::error::EscrowError;
use crate::escrow::game::{Game, GameStatus};

/// Chess piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Piece {
    /// Pawn (0.05 units by default).
    Pawn = 0,
    /// Knight (0.15 units by default).
    Knight = 1,
    /// Bishop (0.15 units by default).
    Bishop = 2,
    /// Rook (0.25 units by default).
    Rook = 3,
    /// Queen (0.50 units by default).
    Queen = 4,
    /// Never captured for value; a king falling ends the game through the
    /// settlement path instead.
    King = 5,
}

impl Piece {
    /// Get from index (0-5).
    pub fn from_index(index: u8) -> Option<Piece> {
        match index {
            0 => Some(Piece::Pawn),
            1 => Some(Piece::Knight),
            2 => Some(Piece::Bishop),
            3 => Some(Piece::Rook),
            4 => Some(Piece::Queen),
            5 => Some(Piece::King),
            _ => None,
        }
    }
}

/// Fixed per-piece capture values.
///
/// Sized together with the escrow amount so that capturing every non-king
/// enemy piece can never exceed one side's deposit: conservation holds by
/// construction of the table, not by a separate check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceValues {
    /// Capture value of a pawn.
    pub pawn: Amount,
    /// Capture value of a knight.
    pub knight: Amount,
    /// Capture value of a bishop.
    pub bishop: Amount,
    /// Capture value of a rook.
    pub rook: Amount,
    /// Capture value of a queen.
    pub queen: Amount,
}

impl Default for PieceValues {
    fn default() -> Self {
        Self {
            pawn: Amount::from_centi(0, 5),
            knight: Amount::from_centi(0, 15),
            bishop: Amount::from_centi(0, 15),
            rook: Amount::from_centi(0, 25),
            queen: Amount::from_centi(0, 50),
        }
    }
}

impl PieceValues {
    /// Capture value of a piece. `None` for the king.
    pub fn value_of(&self, piece: Piece) -> Option<Amount> {
        match piece {
            Piece::Pawn => Some(self.pawn),
            Piece::Knight => Some(self.knight),
            Piece::Bishop => Some(self.bishop),
            Piece::Rook => Some(self.rook),
            Piece::Queen => Some(self.queen),
            Piece::King => None,
        }
    }

    /// Value of one side's full capturable material (8P + 2N + 2B + 2R + Q).
    pub fn full_side_value(&self) -> Amount {
        let mut total = Amount::ZERO;
        for _ in 0..8 {
            total += self.pawn;
        }
        total += self.knight;
        total += self.knight;
        total += self.bishop;
        total += self.bishop;
        total += self.rook;
        total += self.rook;
        total += self.queen;
        total
    }
}

/// Apply a validated capture, transferring the piece's value from the
/// opponent's balance to the captor's.
///
/// All preconditions are checked before any state is touched; a failure
/// leaves the game untouched. Authorization and replay are checked by the
/// caller before this runs. Returns the applied amount.
pub fn apply_capture(
    game: &mut Game,
    captor: PlayerId,
    piece: Piece,
    values: &PieceValues,
    now: DateTime<Utc>,
) -> Result<Amount, EscrowError> {
    if game.status != GameStatus::Active {
        return Err(EscrowError::GameNotActive(game.id));
    }
    if !game.is_player(captor) {
        return Err(EscrowError::NotAPlayer);
    }

    let value = values
        .value_of(piece)
        .ok_or(EscrowError::NonCapturableType(piece))?;

    // Both players exist once the game is Active.
    let opponent = game.opponent_of(captor).ok_or(EscrowError::NotAPlayer)?;

    let opponent_balance = game.balance_of(opponent).unwrap_or(Amount::ZERO);
    let remaining = opponent_balance.checked_sub(value).ok_or_else(|| {
        // Balances stay in sync with board material in normal play; hitting
        // this means the rules engine and the ledger have diverged.
        warn!(
            game_id = %game.id,
            captor = %captor.short(),
            required = %value,
            available = %opponent_balance,
            "capture exceeds opponent balance; ledger/rules desync"
        );
        EscrowError::InsufficientBalance {
            required: value,
            available: opponent_balance,
        }
    })?;

    // Commit: both balance writes together, then the move clock.
    if let Some(balance) = game.balance_of_mut(opponent) {
        *balance = remaining;
    }
    if let Some(balance) = game.balance_of_mut(captor) {
        *balance += value;
    }
    game.last_move_at = now;

    debug_assert!(game.balances_conserved());
    Ok(value)
}

// =============================================================================
// TESTS
// =============================================================================
