//! # Chess Escrow Server
//!
//! Escrow ledger and gas-sponsorship relay for wagered chess matches.
//! Captured pieces move real value between two staked balances; settlement
//! pays out final balances and updates player statistics.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   CHESS ESCROW SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── amount.rs    - Micro-unit money arithmetic              │
//! │  ├── identity.rs  - Player and game identifiers              │
//! │  └── clock.rs     - Injectable wall clock                    │
//! │                                                              │
//! │  escrow/          - Ledger core (serialized transitions)     │
//! │  ├── registry.rs  - Id allocation, create/join               │
//! │  ├── game.rs      - Per-game ledger state machine            │
//! │  ├── capture.rs   - Piece values and balance transfers       │
//! │  ├── service.rs   - The transition front door                │
//! │  ├── stats.rs     - Settlement-time player statistics        │
//! │  └── store.rs     - Snapshot persistence                     │
//! │                                                              │
//! │  auth/            - Session/capture authorization            │
//! │  ├── message.rs   - Canonical signed-message digests         │
//! │  ├── recover.rs   - Signer-recovery oracle boundary          │
//! │  └── verifier.rs  - Verification + replay rejection          │
//! │                                                              │
//! │  relay/           - Fee-sponsorship pass-through             │
//! │  ├── allowlist.rs - Sponsored target/selector policy         │
//! │  ├── protocol.rs  - Wire messages                            │
//! │  └── server.rs    - WebSocket front door                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! The ledger core guarantees, for every reachable state:
//! - Conservation: live balances of an ACTIVE game always sum to its
//!   total escrow; value is never created or destroyed mid-game.
//! - Idempotent capture: each signed capture id is applied exactly once;
//!   replays fail without touching balances.
//! - Authorization gating: captures require both registration and a valid
//!   session authorization bound to this game and domain.
//! - Terminal absorption: FINISHED and CANCELLED accept no transitions.
//!
//! Every mutating operation commits atomically or fails with a specific
//! error and no partial state change.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod auth;
pub mod core;
pub mod escrow;
pub mod relay;

// Re-export commonly used types
pub use auth::{LocalKeyRecovery, SessionVerifier, Signature, SignerRecovery};
pub use self::core::amount::Amount;
pub use self::core::clock::{Clock, ManualClock, SystemClock};
pub use self::core::identity::{GameId, PlayerId};
pub use escrow::{
    CaptureId, EscrowConfig, EscrowError, EscrowEvent, EscrowService, Game, GameStatus, Piece,
};
pub use relay::{AllowList, RelayConfig, RelayServer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
