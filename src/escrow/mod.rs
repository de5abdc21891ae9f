//! Escrow Ledger Module
//!
//! The money-bearing state machine: per-game ledgers, capture settlement,
//! timeout and cancellation policy, final payouts, and player statistics.
//! Every transition is serialized per ledger and commits atomically.
//!
//! ## Module Structure
//!
//! - `config`: fixed economic/timing constants, injected at construction
//! - `game`: per-game ledger record and status state machine
//! - `registry`: id allocation and game storage
//! - `capture`: piece-value table and the balance-transfer engine
//! - `service`: the serialized front door composing all of the above
//! - `stats`: per-player settlement statistics
//! - `events`: observable results of successful transitions
//! - `rail`: external value-transfer boundary
//! - `store`: bincode snapshot persistence
//! - `error`: the failure taxonomy

pub mod capture;
pub mod config;
pub mod error;
pub mod events;
pub mod game;
pub mod rail;
pub mod registry;
pub mod service;
pub mod stats;
pub mod store;

// Re-export key types
pub use capture::{apply_capture, Piece, PieceValues};
pub use config::{EscrowConfig, MAX_ESCROW_MICROS};
pub use error::EscrowError;
pub use events::{EndReason, EscrowEvent, EscrowEventData};
pub use game::{CaptureId, CaptureLog, Game, GameStatus, Payout};
pub use rail::{RailError, RecordingRail, ValueRail};
pub use registry::GameRegistry;
pub use service::EscrowService;
pub use stats::{PlayerStats, StatsBook};
pub use store::{Snapshot, StoreError};
