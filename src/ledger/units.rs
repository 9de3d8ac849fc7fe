//! Lossless conversion between human denominations and atomic units.
//!
//! All arithmetic is on `U256`; no binary floating point appears at any
//! intermediate step. Conversion is exact for any decimal string with at
//! most `decimals` fractional digits, and excess precision is a validation
//! error rather than silent truncation.

use alloy::primitives::U256;

use crate::ledger::types::{ChainError, ChainResult};

/// Converter for one denomination, parameterized by the ledger's
/// atomic-unit exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Units {
    decimals: u32,
}

impl Units {
    /// The common 18-decimal denomination (ether/wei).
    pub const ETHER: Units = Units { decimals: 18 };

    /// Converter for a custom atomic-unit exponent.
    pub const fn new(decimals: u32) -> Self {
        Self { decimals }
    }

    /// The atomic-unit exponent of this denomination.
    pub const fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Convert a human-facing decimal string into an exact count of atomic
    /// units.
    ///
    /// Accepts non-negative decimals such as `"1"`, `"1.5"`, `".5"` and
    /// `"1."`. Fails with [`ChainError::InvalidAmount`] on anything else,
    /// including fractional parts longer than the atomic-unit exponent.
    pub fn to_atomic(&self, human: &str) -> ChainResult<U256> {
        let invalid = || ChainError::InvalidAmount(human.to_string());

        let (int_part, frac_part) = match human.split_once('.') {
            Some((i, f)) => (i, f),
            None => (human, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac_part.len() as u32 > self.decimals {
            return Err(ChainError::InvalidAmount(format!(
                "{human}: more than {} fractional digits",
                self.decimals
            )));
        }

        let ten = U256::from(10u64);
        let scale = ten.pow(U256::from(self.decimals));

        let int_units = if int_part.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(int_part, 10).map_err(|_| invalid())?
        };
        let frac_units = if frac_part.is_empty() {
            U256::ZERO
        } else {
            let raw = U256::from_str_radix(frac_part, 10).map_err(|_| invalid())?;
            // Scale up for the omitted trailing digits.
            raw * ten.pow(U256::from(self.decimals - frac_part.len() as u32))
        };

        int_units
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac_units))
            .ok_or_else(|| ChainError::InvalidAmount(format!("{human}: amount out of range")))
    }

    /// Render an atomic-unit count as a human-facing decimal string.
    ///
    /// Exact inverse of [`Units::to_atomic`] up to trailing-zero
    /// normalization: the magnitude never changes.
    pub fn to_human(&self, atomic: U256) -> String {
        if self.decimals == 0 {
            return atomic.to_string();
        }

        let scale = U256::from(10u64).pow(U256::from(self.decimals));
        let int_part = atomic / scale;
        let frac_part = atomic % scale;

        if frac_part.is_zero() {
            return int_part.to_string();
        }

        let frac = format!("{frac_part:0>width$}", width = self.decimals as usize);
        format!("{int_part}.{}", frac.trim_end_matches('0'))
    }
}
