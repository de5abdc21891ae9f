//! Core deterministic primitives.
//!
//! Money, identity, and time types shared by the escrow ledger and the
//! relay. All ledger arithmetic is integer-only and checked.

pub mod amount;
pub mod clock;
pub mod identity;

// Re-export core types
pub use amount::{Amount, MICROS_PER_UNIT};
pub use clock::{Clock, ManualClock, SystemClock};
pub use identity::{GameId, PlayerId};
