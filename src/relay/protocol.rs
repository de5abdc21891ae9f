//! Relay Protocol Messages
//!
//! Wire format for the gas-sponsorship relay over WebSocket. Messages are
//! serialized as JSON for debugging ease.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// CLIENT -> RELAY MESSAGES
// =============================================================================

/// Messages sent from a sponsored client to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayRequest {
    /// Submit a pre-authorized operation bundle for fee-sponsored execution.
    Sponsor(OperationBundle),

    /// Ping for liveness/latency measurement.
    Ping { timestamp: u64 },
}

/// A pre-authorized operation the relay submits on the caller's behalf.
///
/// The caller pays no fees; the relay only forwards bundles addressed to
/// allow-listed targets and selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationBundle {
    /// Client-chosen id echoed back in the response.
    pub request_id: Uuid,
    /// Sender identity (hex account id).
    pub sender: String,
    /// Destination contract/service.
    pub target: String,
    /// Entry point selector on the target.
    pub selector: String,
    /// Operation arguments, opaque to the relay.
    pub payload: serde_json::Value,
    /// The caller's authorization over the bundle (hex blob, verified by
    /// the execution environment, not by the relay).
    pub signature: String,
}

// =============================================================================
// RELAY -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from the relay back to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayResponse {
    /// Bundle was submitted; transaction identifier attached.
    Sponsored { request_id: Uuid, tx_id: String },

    /// Bundle was rejected before or at submission.
    Rejected {
        request_id: Option<Uuid>,
        reason: RejectReason,
        message: String,
    },

    /// Pong response.
    Pong { timestamp: u64, server_time: u64 },

    /// Relay is shutting down.
    Shutdown { reason: String },
}

/// Why the relay refused a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Target is not on the allow-list.
    TargetNotAllowed,
    /// Selector is not allow-listed for this target.
    SelectorNotAllowed,
    /// Message could not be parsed.
    MalformedRequest,
    /// The execution backend refused the bundle.
    BackendRejected,
}

impl RelayRequest {
    /// Parse from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl RelayResponse {
    /// Parse from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> OperationBundle {
        OperationBundle {
            request_id: Uuid::new_v4(),
            sender: "0xabc".into(),
            target: "chess-escrow".into(),
            selector: "capture_piece".into(),
            payload: serde_json::json!({ "game_id": 1, "piece": "pawn" }),
            signature: "deadbeef".into(),
        }
    }

    #[test]
    fn test_request_round_trip() {
        let request = RelayRequest::Sponsor(bundle());
        let json = request.to_json().unwrap();
        assert!(json.contains("\"type\":\"sponsor\""));

        match RelayRequest::from_json(&json).unwrap() {
            RelayRequest::Sponsor(parsed) => {
                assert_eq!(parsed.selector, "capture_piece");
                assert_eq!(parsed.target, "chess-escrow");
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_rejection_serializes_reason() {
        let response = RelayResponse::Rejected {
            request_id: None,
            reason: RejectReason::TargetNotAllowed,
            message: "unknown target".into(),
        };
        let json = response.to_json().unwrap();
        assert!(json.contains("target_not_allowed"));
    }
}
