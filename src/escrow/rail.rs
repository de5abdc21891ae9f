//! Value-Transfer Rail Boundary
//!
//! The ledger's balances are internal accounting; real value moves on an
//! external rail (token contract, payment processor) at deposit and payout
//! time. The core invokes the rail and propagates its failures without
//! retrying.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::amount::Amount;
use crate::core::identity::PlayerId;

/// Rail failures, a distinct error category from ledger preconditions.
#[derive(Debug, Error)]
pub enum RailError {
    /// The rail rejected the transfer.
    #[error("transfer rejected: {0}")]
    Rejected(String),

    /// The rail could not be reached.
    #[error("rail unavailable: {0}")]
    Unavailable(String),
}

/// External movement of real value.
pub trait ValueRail: Send + Sync {
    /// Pull a deposit from a player into escrow custody.
    fn collect_deposit(&self, from: PlayerId, amount: Amount) -> Result<(), RailError>;

    /// Push a payout or refund from escrow custody to a player.
    fn pay_out(&self, to: PlayerId, amount: Amount) -> Result<(), RailError>;
}

/// Direction of a recorded transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Player funds moving into escrow custody.
    Deposit,
    /// Escrow custody funds moving back to a player.
    Payout,
}

/// One transfer seen by the recording rail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RailTransfer {
    /// Deposit or payout.
    pub kind: TransferKind,
    /// Counterparty player.
    pub player: PlayerId,
    /// Amount moved.
    pub amount: Amount,
}

/// In-memory rail that records every transfer. Used by tests and the demo;
/// a deployment wires a real token or payment backend here instead.
#[derive(Debug, Default)]
pub struct RecordingRail {
    transfers: Mutex<Vec<RailTransfer>>,
}

impl RecordingRail {
    /// Create an empty recording rail.
    pub fn new() -> Self {
        Self::default()
    }

    /// All transfers recorded so far, in order.
    pub fn transfers(&self) -> Vec<RailTransfer> {
        self.transfers.lock().unwrap().clone()
    }

    /// Net amount held in custody (deposits minus payouts).
    pub fn held(&self) -> Amount {
        let transfers = self.transfers.lock().unwrap();
        let mut held = Amount::ZERO;
        for t in transfers.iter() {
            match t.kind {
                TransferKind::Deposit => held += t.amount,
                TransferKind::Payout => held = held.saturating_sub(t.amount),
            }
        }
        held
    }
}

impl ValueRail for RecordingRail {
    fn collect_deposit(&self, from: PlayerId, amount: Amount) -> Result<(), RailError> {
        self.transfers.lock().unwrap().push(RailTransfer {
            kind: TransferKind::Deposit,
            player: from,
            amount,
        });
        Ok(())
    }

    fn pay_out(&self, to: PlayerId, amount: Amount) -> Result<(), RailError> {
        self.transfers.lock().unwrap().push(RailTransfer {
            kind: TransferKind::Payout,
            player: to,
            amount,
        });
        Ok(())
    }
}

/// Rail that rejects everything. Lets tests assert that a rail failure
/// leaves the ledger untouched.
#[derive(Debug, Default)]
pub struct RejectingRail;

impl ValueRail for RejectingRail {
    fn collect_deposit(&self, _from: PlayerId, _amount: Amount) -> Result<(), RailError> {
        Err(RailError::Rejected("deposit declined".into()))
    }

    fn pay_out(&self, _to: PlayerId, _amount: Amount) -> Result<(), RailError> {
        Err(RailError::Rejected("payout declined".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_rail_tracks_custody() {
        let rail = RecordingRail::new();
        let alice = PlayerId::derive("alice");

        rail.collect_deposit(alice, Amount::from_centi(2, 50)).unwrap();
        assert_eq!(rail.held(), Amount::from_centi(2, 50));

        rail.pay_out(alice, Amount::from_units(1)).unwrap();
        assert_eq!(rail.held(), Amount::from_micros(1_500_000));
        assert_eq!(rail.transfers().len(), 2);
    }
}
