//! Authorization Verifier
//!
//! Validates that a signed statement was produced by the claimed player for
//! this specific game and domain, and that a capture has not already been
//! consumed. Holds no state of its own beyond the domain id and the
//! recovery oracle; replay tracking lives in each game's capture log.

use std::sync::Arc;

use thiserror::Error;

use crate::auth::message::{capture_digest, session_digest};
use crate::auth::recover::{Signature, SignerRecovery};
use crate::core::identity::PlayerId;
use crate::escrow::capture::Piece;
use crate::escrow::game::{CaptureId, Game};

/// Authorization failures. Treated as potentially adversarial input and
/// never retried automatically.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Signature recovers to no known identity.
    #[error("signature recovers to no known signer")]
    UnknownSigner,

    /// Recovered identity differs from the claimed one.
    #[error("signature was not produced by the claimed player")]
    SignatureMismatch,

    /// Player never supplied a session authorization for this game.
    #[error("player has no session authorization for this game")]
    NotAuthorized,

    /// Capture id was already applied to this game.
    #[error("capture id already applied")]
    ReplayedCapture,
}

/// Verifier for session and capture authorizations.
pub struct SessionVerifier {
    domain_id: u64,
    recovery: Arc<dyn SignerRecovery>,
}

impl SessionVerifier {
    /// Create a verifier bound to one domain.
    pub fn new(domain_id: u64, recovery: Arc<dyn SignerRecovery>) -> Self {
        Self { domain_id, recovery }
    }

    /// Verify a session-authorization signature and, on success, mark the
    /// claimed signer as authorized for the game.
    pub fn verify_session(
        &self,
        game: &mut Game,
        claimed: PlayerId,
        signature: &Signature,
    ) -> Result<(), AuthError> {
        let digest = session_digest(self.domain_id, game.id);
        let recovered = self
            .recovery
            .recover(&digest, signature)
            .ok_or(AuthError::UnknownSigner)?;
        if recovered != claimed {
            return Err(AuthError::SignatureMismatch);
        }
        game.authorize(claimed);
        Ok(())
    }

    /// Check a capture authorization without mutating anything.
    ///
    /// The caller records the capture id only after the whole transition
    /// (including the balance transfer) is known to succeed, so a failed
    /// capture never consumes its id.
    pub fn check_capture(
        &self,
        game: &Game,
        captor: PlayerId,
        piece: Piece,
        capture_id: CaptureId,
        signature: &Signature,
    ) -> Result<(), AuthError> {
        let digest = capture_digest(self.domain_id, game.id, captor, piece);
        let recovered = self
            .recovery
            .recover(&digest, signature)
            .ok_or(AuthError::UnknownSigner)?;
        if recovered != captor {
            return Err(AuthError::SignatureMismatch);
        }
        if !game.is_authorized(captor) {
            return Err(AuthError::NotAuthorized);
        }
        if game.captures.contains(capture_id) {
            return Err(AuthError::ReplayedCapture);
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
