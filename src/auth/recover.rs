//! Signer Recovery Oracle
//!
//! The ledger treats "message + signature -> signer identity" as an
//! external primitive and never implements signature math itself. The
//! `SignerRecovery` trait is that boundary; a deployment plugs in real
//! ecrecover-style recovery, while `LocalKeyRecovery` provides a
//! deterministic keyed-MAC stand-in for tests and demos.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::auth::message::MessageDigest;
use crate::core::identity::PlayerId;

/// Opaque signature blob (32 bytes under the local oracle).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(pub [u8; 32]);

impl Signature {
    /// Hex form for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

/// Recovers the signing identity from a message digest and signature.
pub trait SignerRecovery: Send + Sync {
    /// Identity that produced `signature` over `digest`, or `None` if the
    /// signature matches no known signer.
    fn recover(&self, digest: &MessageDigest, signature: &Signature) -> Option<PlayerId>;
}

/// Keyed-MAC recovery oracle over locally registered secrets.
///
/// Not cryptographic signing: a stand-in with the same recover-shaped
/// interface, so the ledger's authorization logic is exercised end to end
/// without wallet infrastructure.
#[derive(Debug, Default)]
pub struct LocalKeyRecovery {
    keys: Mutex<BTreeMap<PlayerId, Vec<u8>>>,
}

impl LocalKeyRecovery {
    /// Create an empty oracle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a player's signing secret.
    pub fn register(&self, player: PlayerId, secret: impl Into<Vec<u8>>) {
        self.keys.lock().unwrap().insert(player, secret.into());
    }

    /// Produce a signature over `digest` with the player's registered
    /// secret. `None` if the player has no key.
    pub fn sign(&self, player: PlayerId, digest: &MessageDigest) -> Option<Signature> {
        let keys = self.keys.lock().unwrap();
        let secret = keys.get(&player)?;
        Some(Signature(mac(secret, digest)))
    }
}

impl SignerRecovery for LocalKeyRecovery {
    fn recover(&self, digest: &MessageDigest, signature: &Signature) -> Option<PlayerId> {
        let keys = self.keys.lock().unwrap();
        keys.iter()
            .find(|(_, secret)| mac(secret, digest) == signature.0)
            .map(|(player, _)| *player)
    }
}

fn mac(secret: &[u8], digest: &MessageDigest) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"chess-escrow-sig:");
    hasher.update(secret);
    hasher.update(digest);
    hasher.finalize().into()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::message::session_digest;
    use crate::core::identity::GameId;

    #[test]
    fn test_sign_then_recover() {
        let oracle = LocalKeyRecovery::new();
        let alice = PlayerId::derive("alice");
        oracle.register(alice, b"alice-secret".to_vec());

        let digest = session_digest(1, GameId(1));
        let sig = oracle.sign(alice, &digest).unwrap();

        assert_eq!(oracle.recover(&digest, &sig), Some(alice));
    }

    #[test]
    fn test_signature_does_not_transfer_between_messages() {
        let oracle = LocalKeyRecovery::new();
        let alice = PlayerId::derive("alice");
        oracle.register(alice, b"alice-secret".to_vec());

        let sig = oracle.sign(alice, &session_digest(1, GameId(1))).unwrap();
        let other = session_digest(1, GameId(2));

        assert_eq!(oracle.recover(&other, &sig), None);
    }

    #[test]
    fn test_unknown_signature_recovers_nothing() {
        let oracle = LocalKeyRecovery::new();
        oracle.register(PlayerId::derive("alice"), b"alice-secret".to_vec());

        let digest = session_digest(1, GameId(1));
        assert_eq!(oracle.recover(&digest, &Signature([0u8; 32])), None);
    }

    #[test]
    fn test_unregistered_player_cannot_sign() {
        let oracle = LocalKeyRecovery::new();
        let digest = session_digest(1, GameId(1));
        assert!(oracle.sign(PlayerId::derive("nobody"), &digest).is_none());
    }
}
