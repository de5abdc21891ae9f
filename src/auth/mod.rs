//! Authorization Layer
//!
//! Canonical signed-message construction and verification for session and
//! capture authorizations. Signature recovery itself is an external oracle
//! behind the `SignerRecovery` trait; this crate never does signature math.

pub mod message;
pub mod recover;
pub mod verifier;

pub use message::{capture_digest, session_digest, MessageDigest, CAPTURE_TAG, SESSION_TAG};
pub use recover::{LocalKeyRecovery, Signature, SignerRecovery};
pub use verifier::{AuthError, SessionVerifier};
