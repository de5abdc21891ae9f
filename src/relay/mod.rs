//! Gas-Sponsorship Relay
//!
//! Pass-through service that submits pre-authorized operation bundles to
//! the execution environment so players never hold fee currency. The only
//! policy it owns is the target/selector allow-list; everything else is
//! forwarded verbatim.

pub mod allowlist;
pub mod protocol;
pub mod server;

pub use allowlist::{AllowList, ESCROW_SELECTORS};
pub use protocol::{OperationBundle, RejectReason, RelayRequest, RelayResponse};
pub use server::{
    BackendError, ExecutionBackend, RecordingBackend, RelayConfig, RelayServer, RelayServerError,
};
