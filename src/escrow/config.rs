//! Escrow Configuration
//!
//! Fixed economic and timing constants, injected at construction rather
//! than scattered through transition logic. Tests swap in compressed
//! timeout windows; deployments read the environment.

use chrono::Duration;
use tracing::warn;

use crate::core::amount::Amount;
use crate::escrow::capture::PieceValues;

/// Upper bound on a configured escrow amount, in micro-units.
///
/// Keeps every in-ledger sum over the two balances well inside u64 even
/// with both deposits at the bound.
pub const MAX_ESCROW_MICROS: u64 = u64::MAX / 4;

/// Immutable ledger configuration.
#[derive(Clone, Debug)]
pub struct EscrowConfig {
    /// Required deposit per player.
    pub escrow_amount: Amount,
    /// Fixed piece-value table.
    pub piece_values: PieceValues,
    /// Window after the last move before a timeout win can be claimed.
    pub move_timeout: Duration,
    /// Window after creation before the creator can cancel a waiting game.
    pub creation_grace: Duration,
    /// Domain/chain identifier bound into every signed message, so a
    /// signature for one deployment cannot replay against another.
    pub domain_id: u64,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            escrow_amount: Amount::from_centi(2, 50),
            piece_values: PieceValues::default(),
            move_timeout: Duration::minutes(30),
            creation_grace: Duration::minutes(5),
            domain_id: 1,
        }
    }
}

impl EscrowConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            escrow_amount: env_u64("ESCROW_AMOUNT_MICROS")
                .and_then(|micros| {
                    if micros == 0 || micros > MAX_ESCROW_MICROS {
                        warn!(micros, "ESCROW_AMOUNT_MICROS out of range, using default");
                        None
                    } else {
                        Some(Amount::from_micros(micros))
                    }
                })
                .unwrap_or(defaults.escrow_amount),
            piece_values: defaults.piece_values,
            move_timeout: env_u64("MOVE_TIMEOUT_SECS")
                .map(|s| Duration::seconds(s as i64))
                .unwrap_or(defaults.move_timeout),
            creation_grace: env_u64("CREATION_GRACE_SECS")
                .map(|s| Duration::seconds(s as i64))
                .unwrap_or(defaults.creation_grace),
            domain_id: env_u64("ESCROW_DOMAIN_ID").unwrap_or(defaults.domain_id),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        let config = EscrowConfig::default();
        assert_eq!(config.escrow_amount, Amount::from_micros(2_500_000));
        assert_eq!(config.move_timeout, Duration::minutes(30));
        assert_eq!(config.creation_grace, Duration::minutes(5));
    }

    #[test]
    fn test_from_env_rejects_out_of_range_escrow() {
        std::env::set_var("ESCROW_AMOUNT_MICROS", u64::MAX.to_string());
        let oversized = EscrowConfig::from_env();
        std::env::set_var("ESCROW_AMOUNT_MICROS", "0");
        let zero = EscrowConfig::from_env();
        std::env::remove_var("ESCROW_AMOUNT_MICROS");

        assert_eq!(oversized.escrow_amount, Amount::from_centi(2, 50));
        assert_eq!(zero.escrow_amount, Amount::from_centi(2, 50));
    }

    #[test]
    fn test_escrow_covers_full_capture_run() {
        // Deposit must cover losing every non-king piece with residual left.
        let config = EscrowConfig::default();
        assert!(config.piece_values.full_side_value() < config.escrow_amount);
    }
}
