//! # Money Primitives — Basis Points and Currency Tags
//!
//! Integer-only money arithmetic for the settlement core. Ratios are
//! expressed in basis points (1/100 of a percent) to keep floats out of
//! every funds path, and all multiplication widens to `u128` so overflow is
//! structurally unreachable for `u64` amounts.
//!
//! ## Security Invariant
//!
//! A `BasisPoints` value can only be constructed in the range
//! `0..=10000`. Any code holding a `BasisPoints` may apply it to an amount
//! without re-validating the ratio.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The basis-point scale: 10000 basis points = 100%.
pub const BASIS_POINTS_SCALE: u16 = 10_000;

/// A ratio in basis points, validated to `0..=10000` at construction.
///
/// Used for the platform fee and for split resolutions (the share awarded
/// to the beneficiary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct BasisPoints(u16);

impl BasisPoints {
    /// Zero basis points (0%).
    pub const ZERO: BasisPoints = BasisPoints(0);

    /// The full scale (100%).
    pub const FULL: BasisPoints = BasisPoints(BASIS_POINTS_SCALE);

    /// Create a validated basis-point ratio.
    ///
    /// # Errors
    ///
    /// Rejects values above 10000.
    pub fn new(value: u16) -> Result<Self, CoreError> {
        if value > BASIS_POINTS_SCALE {
            return Err(CoreError::InvalidBasisPoints { value });
        }
        Ok(Self(value))
    }

    /// Create a ratio from a whole percentage in `0..=100`.
    ///
    /// External admin surfaces express split ratios as percentages; the
    /// core stores them as basis points (`percent * 100`).
    pub fn from_percent(percent: u16) -> Result<Self, CoreError> {
        if percent > 100 {
            return Err(CoreError::InvalidBasisPoints {
                value: percent.saturating_mul(100),
            });
        }
        Ok(Self(percent * 100))
    }

    /// The raw basis-point value.
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Apply this ratio to an amount, truncating toward zero.
    ///
    /// The intermediate product is computed in `u128`, so the result is
    /// exact and cannot overflow for any `u64` amount.
    pub fn of(&self, amount: u64) -> u64 {
        let scaled = u128::from(amount) * u128::from(self.0) / u128::from(BASIS_POINTS_SCALE);
        // scaled <= amount because self.0 <= BASIS_POINTS_SCALE.
        scaled as u64
    }

    /// Split an amount into `(this_share, remainder)`.
    ///
    /// The truncation remainder always lands in the second component, so
    /// the two parts sum to `amount` exactly.
    pub fn split_of(&self, amount: u64) -> (u64, u64) {
        let share = self.of(amount);
        (share, amount - share)
    }

    /// Whether this ratio is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u16> for BasisPoints {
    type Error = CoreError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BasisPoints> for u16 {
    fn from(bps: BasisPoints) -> u16 {
        bps.0
    }
}

impl std::fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

/// The asset an escrow entry is denominated in.
///
/// The core never touches chain-specific token plumbing; the tag travels
/// with the entry so payouts and bridge payloads name the right asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Currency {
    /// The chain's native asset.
    Native,
    /// A stablecoin, identified by its marketplace-level tag (e.g. "USDC").
    Stablecoin(String),
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native => f.write_str("NATIVE"),
            Self::Stablecoin(tag) => write!(f, "STABLE:{tag}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_over_scale() {
        assert!(BasisPoints::new(10_001).is_err());
        assert!(BasisPoints::new(u16::MAX).is_err());
    }

    #[test]
    fn test_new_accepts_bounds() {
        assert_eq!(BasisPoints::new(0).unwrap(), BasisPoints::ZERO);
        assert_eq!(BasisPoints::new(10_000).unwrap(), BasisPoints::FULL);
    }

    #[test]
    fn test_from_percent() {
        assert_eq!(BasisPoints::from_percent(30).unwrap().as_u16(), 3000);
        assert_eq!(BasisPoints::from_percent(100).unwrap(), BasisPoints::FULL);
        assert!(BasisPoints::from_percent(101).is_err());
    }

    #[test]
    fn test_of_truncates() {
        // 500 bps of 1000 = 50
        assert_eq!(BasisPoints::new(500).unwrap().of(1000), 50);
        // 3333 bps of 100 = 33.33 → 33
        assert_eq!(BasisPoints::new(3333).unwrap().of(100), 33);
    }

    #[test]
    fn test_of_no_overflow_at_max_amount() {
        let bps = BasisPoints::FULL;
        assert_eq!(bps.of(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_split_conserves_amount() {
        let bps = BasisPoints::new(3000).unwrap();
        let (share, rest) = bps.split_of(1000);
        assert_eq!(share, 300);
        assert_eq!(rest, 700);
        assert_eq!(share + rest, 1000);
    }

    #[test]
    fn test_split_remainder_goes_to_second_component() {
        // 1 bps of 999 truncates to 0; the full amount stays in the remainder.
        let bps = BasisPoints::new(1).unwrap();
        let (share, rest) = bps.split_of(999);
        assert_eq!(share, 0);
        assert_eq!(rest, 999);
    }

    #[test]
    fn test_serde_rejects_invalid_ratio() {
        let parsed: Result<BasisPoints, _> = serde_json::from_str("12000");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let bps = BasisPoints::new(500).unwrap();
        let json = serde_json::to_string(&bps).unwrap();
        assert_eq!(json, "500");
        let parsed: BasisPoints = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bps);
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(Currency::Native.to_string(), "NATIVE");
        assert_eq!(
            Currency::Stablecoin("USDC".to_string()).to_string(),
            "STABLE:USDC"
        );
    }
}
