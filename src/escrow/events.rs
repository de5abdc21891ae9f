//! Escrow Events
//!
//! Every successful mutation emits exactly one event, the observable half
//! of "fully succeeds or fully fails". Consumers (relay responses, logs,
//! clients) get these; failures surface as errors instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::amount::Amount;
use crate::core::identity::{GameId, PlayerId};
use crate::escrow::capture::Piece;

/// Why an ACTIVE game settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A player reported checkmate/draw from the rules engine.
    Reported,
    /// The move-timeout window elapsed and the claimant took the win.
    Timeout,
}

/// Escrow event data.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EscrowEventData {
    /// A game was created by the first deposit.
    GameCreated {
        game_id: GameId,
        creator: PlayerId,
        deposit: Amount,
    },

    /// A second player deposited and joined; the game is now active.
    PlayerJoined {
        game_id: GameId,
        joiner: PlayerId,
        deposit: Amount,
    },

    /// A player supplied a valid session authorization.
    SessionAuthorized { game_id: GameId, player: PlayerId },

    /// A capture moved value between the live balances.
    PieceCaptured {
        game_id: GameId,
        captor: PlayerId,
        piece: Piece,
        value: Amount,
        captor_balance: Amount,
        opponent_balance: Amount,
    },

    /// The game settled; balances were paid out.
    GameEnded {
        game_id: GameId,
        winner: PlayerId,
        payout_a: Amount,
        payout_b: Amount,
        reason: EndReason,
    },

    /// A waiting game was cancelled and the creator refunded.
    GameCancelled { game_id: GameId, refunded: Amount },
}

/// An escrow event with its emission time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EscrowEvent {
    /// When the transition committed.
    pub at: DateTime<Utc>,

    /// Event data.
    pub data: EscrowEventData,
}

impl EscrowEvent {
    /// Create an event.
    pub fn new(at: DateTime<Utc>, data: EscrowEventData) -> Self {
        Self { at, data }
    }

    /// Game this event belongs to.
    pub fn game_id(&self) -> GameId {
        match self.data {
            EscrowEventData::GameCreated { game_id, .. } => game_id,
            EscrowEventData::PlayerJoined { game_id, .. } => game_id,
            EscrowEventData::SessionAuthorized { game_id, .. } => game_id,
            EscrowEventData::PieceCaptured { game_id, .. } => game_id,
            EscrowEventData::GameEnded { game_id, .. } => game_id,
            EscrowEventData::GameCancelled { game_id, .. } => game_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_game_id() {
        let event = EscrowEvent::new(
            Utc::now(),
            EscrowEventData::GameCancelled {
                game_id: GameId(7),
                refunded: Amount::from_centi(2, 50),
            },
        );
        assert_eq!(event.game_id(), GameId(7));
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = EscrowEvent::new(
            Utc::now(),
            EscrowEventData::SessionAuthorized {
                game_id: GameId(1),
                player: PlayerId::derive("alice"),
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"session_authorized\""));
    }
}
