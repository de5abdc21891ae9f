//! Player and Game Identifiers
//!
//! Opaque identifiers used throughout the ledger.
//! `PlayerId` implements Ord for deterministic BTreeMap ordering.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Opaque player account identifier (20 bytes, address-shaped).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PlayerId(pub [u8; 20]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse from a hex string (with or without `0x` prefix).
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).ok()?;
        if bytes.len() != 20 {
            return None;
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Some(Self(arr))
    }

    /// Derive a deterministic identity from an arbitrary label.
    ///
    /// Uses SHA256 so demos and tests get stable, distinct identities
    /// without any real key material.
    pub fn derive(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"chess-escrow-player:");
        hasher.update(label.as_bytes());
        let hash = hasher.finalize();

        let mut id = [0u8; 20];
        id.copy_from_slice(&hash[..20]);
        Self(id)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Short hex form for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Sequential game identifier, allocated by the registry.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl GameId {
    /// Next sequential id.
    pub const fn next(self) -> GameId {
        GameId(self.0 + 1)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_ordering() {
        let id1 = PlayerId::new([0; 20]);
        let id2 = PlayerId::new([1; 20]);
        let id3 = PlayerId::new([0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        assert!(id1 < id2);
        assert!(id1 < id3);
        assert!(id3 < id2);
    }

    #[test]
    fn test_derive_is_stable() {
        let a1 = PlayerId::derive("alice");
        let a2 = PlayerId::derive("alice");
        let b = PlayerId::derive("bob");

        assert_eq!(a1, a2);
        assert_ne!(a1, b);
    }

    #[test]
    fn test_hex_round_trip() {
        let id = PlayerId::derive("alice");
        let parsed = PlayerId::from_hex(&id.to_string()).unwrap();
        assert_eq!(id, parsed);

        assert!(PlayerId::from_hex("0xdeadbeef").is_none());
    }

    #[test]
    fn test_game_id_next() {
        assert_eq!(GameId(1).next(), GameId(2));
    }
}
