//! Snapshot Persistence
//!
//! The registry (games, capture logs, session flags) and the statistics
//! book are the only state that must survive across invocations. Both are
//! captured in a versioned snapshot serialized with bincode.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::escrow::registry::GameRegistry;
use crate::escrow::stats::StatsBook;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("snapshot io error: {0}")]
    Io(#[from] io::Error),

    /// Encoding/decoding failure.
    #[error("snapshot codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Snapshot written by an incompatible version.
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
}

/// Durable ledger state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version for forward compatibility.
    pub version: u32,
    /// All games and the id allocator.
    pub registry: GameRegistry,
    /// All player statistics.
    pub stats: StatsBook,
}

impl Snapshot {
    /// Capture the durable state.
    pub fn capture(registry: &GameRegistry, stats: &StatsBook) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            registry: registry.clone(),
            stats: stats.clone(),
        }
    }

    /// Serialize to bytes.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes, rejecting unknown versions.
    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        let snapshot: Snapshot = bincode::deserialize(bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot)
    }

    /// Write to a file, replacing any previous snapshot.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        fs::write(path, self.encode()?)?;
        Ok(())
    }

    /// Read from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let bytes = fs::read(path)?;
        Self::decode(&bytes)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::amount::Amount;
    use crate::core::identity::{GameId, PlayerId};
    use crate::escrow::game::GameStatus;
    use crate::escrow::stats::SettledSide;
    use chrono::Utc;

    #[test]
    fn test_snapshot_round_trip() {
        let mut registry = GameRegistry::new();
        let alice = PlayerId::derive("alice");
        let bob = PlayerId::derive("bob");
        let deposit = Amount::from_centi(2, 50);
        let id = registry.create_game(alice, deposit, Utc::now());
        registry.join_game(id, bob, deposit, Utc::now()).unwrap();

        let mut stats = StatsBook::new();
        stats.record_settlement(
            GameId(9),
            SettledSide { player: alice, payout: deposit, escrow: deposit },
            SettledSide { player: bob, payout: deposit, escrow: deposit },
        );

        let snapshot = Snapshot::capture(&registry, &stats);
        let restored = Snapshot::decode(&snapshot.encode().unwrap()).unwrap();

        assert_eq!(restored.registry.len(), 1);
        assert_eq!(restored.registry.next_id(), GameId(2));
        let game = restored.registry.get(id).unwrap();
        assert_eq!(game.status, GameStatus::Active);
        assert_eq!(game.player_b, Some(bob));
        assert_eq!(restored.stats.stats(alice).unwrap().games_won, 1);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let snapshot = Snapshot {
            version: 99,
            registry: GameRegistry::new(),
            stats: StatsBook::new(),
        };
        let bytes = bincode::serialize(&snapshot).unwrap();
        assert!(matches!(
            Snapshot::decode(&bytes),
            Err(StoreError::UnsupportedVersion(99))
        ));
    }
}
