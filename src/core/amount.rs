//! Fixed-Point Money Amounts
//!
//! Deterministic integer money for the escrow ledger.
//! All balances are carried as whole micro-units - no floats in ledger logic.
//!
//! ## Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  1 unit = 1_000_000 micro-units (u64)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  2.50 units  -> Amount(2_500_000)                            │
//! │  0.05 units  -> Amount(50_000)                               │
//! │                                                              │
//! │  Range: 0 to ~18.4 trillion units                            │
//! │  Precision: 0.000001 units                                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why micro-units?
//!
//! - Exact representation of the piece-value table (0.05, 0.15, ...)
//! - Checked integer ops on all platforms, identical everywhere
//! - Unsigned by construction: a balance can never go negative

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Micro-units per whole unit.
pub const MICROS_PER_UNIT: u64 = 1_000_000;

/// A non-negative money amount in micro-units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Zero amount.
    pub const ZERO: Amount = Amount(0);

    /// Create from raw micro-units.
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Create from whole units.
    pub const fn from_units(units: u64) -> Self {
        Self(units * MICROS_PER_UNIT)
    }

    /// Create from whole units and hundredths (e.g. `from_centi(2, 50)` = 2.50).
    pub const fn from_centi(units: u64, hundredths: u64) -> Self {
        Self(units * MICROS_PER_UNIT + hundredths * (MICROS_PER_UNIT / 100))
    }

    /// Raw micro-units.
    pub const fn micros(self) -> u64 {
        self.0
    }

    /// Is this amount zero?
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction. `None` if `other` exceeds `self`.
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Saturating subtraction, floored at zero.
    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Take the full amount, leaving zero behind.
    ///
    /// Used at settlement and refund so a balance can only be paid out once.
    pub fn take(&mut self) -> Amount {
        std::mem::replace(self, Amount::ZERO)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, other: Amount) -> Amount {
        Amount(self.0 + other.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, other: Amount) {
        self.0 += other.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Amount::add)
    }
}

impl fmt::Display for Amount {
    /// Render as a decimal unit string, e.g. `2.50`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.0 / MICROS_PER_UNIT;
        let micros = self.0 % MICROS_PER_UNIT;
        if micros == 0 {
            return write!(f, "{}.00", units);
        }
        let mut frac = format!("{:06}", micros);
        while frac.len() > 2 && frac.ends_with('0') {
            frac.pop();
        }
        write!(f, "{}.{}", units, frac)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(Amount::from_units(2).micros(), 2_000_000);
        assert_eq!(Amount::from_centi(2, 50).micros(), 2_500_000);
        assert_eq!(Amount::from_centi(0, 5).micros(), 50_000);
    }

    #[test]
    fn test_checked_sub_underflow() {
        let small = Amount::from_centi(0, 5);
        let big = Amount::from_units(1);
        assert_eq!(big.checked_sub(small), Some(Amount::from_micros(950_000)));
        assert_eq!(small.checked_sub(big), None);
    }

    #[test]
    fn test_take_zeroes_source() {
        let mut balance = Amount::from_centi(2, 55);
        let paid = balance.take();
        assert_eq!(paid, Amount::from_centi(2, 55));
        assert!(balance.is_zero());
        // A second take pays nothing
        assert!(balance.take().is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_centi(2, 50).to_string(), "2.50");
        assert_eq!(Amount::from_centi(0, 5).to_string(), "0.05");
        assert_eq!(Amount::from_units(5).to_string(), "5.00");
        assert_eq!(Amount::from_micros(2_550_000).to_string(), "2.55");
    }

    #[test]
    fn test_sum() {
        let total: Amount = [Amount::from_centi(0, 5), Amount::from_centi(0, 15)]
            .into_iter()
            .sum();
        assert_eq!(total, Amount::from_centi(0, 20));
    }
}
