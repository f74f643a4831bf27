//! # Bonus Schemes
//!
//! Free-goods arrangements attached to a product and applied on stockist sales.
//!
//! ## Scheme Text
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Text              Parsed as                 billed 25 → free           │
//! │  ───────────────   ───────────────────────   ────────────────────────   │
//! │  "10+2"            BuyGet { buy: 10, free: 2 }  floor(25/10)×2 = 4       │
//! │  "10 + 1 strip"    BuyGet { buy: 10, free: 1 }  floor(25/10)×1 = 2       │
//! │  "15%"             Percent(1500 bps)            floor(25×15/100) = 3     │
//! │  "No Offer", ""    None                         0                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Anything that does not parse is treated as "no scheme": the sale still
//! goes through, just without free units.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Rate;

/// A parsed bonus scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BonusScheme {
    /// Buy `buy` units, get `free` units free (per full block).
    BuyGet { buy: u32, free: u32 },
    /// A percentage of billed units is given free.
    Percent { rate: Rate },
    /// No scheme.
    None,
}

impl BonusScheme {
    /// Parses scheme text.
    ///
    /// Accepted forms: `"N+M"` with optional spaces and a trailing unit word
    /// (`"10+1 strip"`), and `"P%"` with up to two decimals (`"12.5%"`).
    ///
    /// ## Example
    /// ```rust
    /// use sanj_core::scheme::BonusScheme;
    ///
    /// assert_eq!(BonusScheme::parse("10+2"), BonusScheme::BuyGet { buy: 10, free: 2 });
    /// assert_eq!(BonusScheme::parse("garbage"), BonusScheme::None);
    /// ```
    pub fn parse(text: &str) -> BonusScheme {
        let text = text.trim();
        if text.is_empty() {
            return BonusScheme::None;
        }

        if let Some(pct) = text.strip_suffix('%') {
            return parse_percent(pct.trim()).unwrap_or(BonusScheme::None);
        }

        parse_buy_get(text).unwrap_or(BonusScheme::None)
    }

    /// Free units earned on `billed` units.
    ///
    /// ## Example
    /// ```rust
    /// use sanj_core::scheme::BonusScheme;
    ///
    /// assert_eq!(BonusScheme::parse("10+2").free_quantity(25), 4);
    /// assert_eq!(BonusScheme::parse("15%").free_quantity(40), 6);
    /// ```
    pub fn free_quantity(&self, billed: i64) -> i64 {
        if billed <= 0 {
            return 0;
        }

        match *self {
            BonusScheme::BuyGet { buy, free } => (billed / buy as i64) * free as i64,
            BonusScheme::Percent { rate } => billed * rate.bps() as i64 / 10_000,
            BonusScheme::None => 0,
        }
    }

    /// Billed plus free units.
    #[inline]
    pub fn total_quantity(&self, billed: i64) -> i64 {
        billed + self.free_quantity(billed)
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, BonusScheme::None)
    }
}

impl Default for BonusScheme {
    fn default() -> Self {
        BonusScheme::None
    }
}

fn parse_buy_get(text: &str) -> Option<BonusScheme> {
    let (buy, rest) = text.split_once('+')?;
    let buy: u32 = buy.trim().parse().ok()?;

    // "1 strip" → take the leading digits, ignore the unit word
    let rest = rest.trim_start();
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (free, unit) = rest.split_at(digits_end);
    if !unit.is_empty() && !unit.starts_with(char::is_whitespace) {
        return None;
    }
    let free: u32 = free.parse().ok()?;

    if buy == 0 || free == 0 {
        return None;
    }
    Some(BonusScheme::BuyGet { buy, free })
}

fn parse_percent(text: &str) -> Option<BonusScheme> {
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    if whole.is_empty() || fraction.len() > 2 {
        return None;
    }
    let whole: u32 = whole.parse().ok()?;
    let fraction: u32 = if fraction.is_empty() {
        0
    } else {
        format!("{:0<2}", fraction).parse().ok()?
    };

    let bps = whole.checked_mul(100)?.checked_add(fraction)?;
    if bps == 0 || bps > 10_000 {
        return None;
    }
    Some(BonusScheme::Percent {
        rate: Rate::from_bps(bps),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_get_blocks() {
        let scheme = BonusScheme::parse("10+2");
        assert_eq!(scheme.free_quantity(25), 4);
        assert_eq!(scheme.total_quantity(25), 29);
        assert_eq!(scheme.free_quantity(9), 0);
        assert_eq!(scheme.free_quantity(10), 2);
    }

    #[test]
    fn test_percent() {
        let scheme = BonusScheme::parse("15%");
        assert_eq!(scheme, BonusScheme::Percent { rate: Rate::from_bps(1500) });
        assert_eq!(scheme.free_quantity(40), 6);
        assert_eq!(scheme.free_quantity(6), 0);

        assert_eq!(BonusScheme::parse("12.5%").free_quantity(80), 10);
    }

    #[test]
    fn test_unit_suffix_and_spacing() {
        assert_eq!(BonusScheme::parse("10+1 strip"), BonusScheme::BuyGet { buy: 10, free: 1 });
        assert_eq!(BonusScheme::parse(" 5 + 1 "), BonusScheme::BuyGet { buy: 5, free: 1 });
    }

    #[test]
    fn test_malformed_is_no_op() {
        for text in ["", "No Offer", "10% off", "0+2", "10+0", "10+x", "+2", "10+2x", "150%", "1.234%"] {
            let scheme = BonusScheme::parse(text);
            assert!(scheme.is_none(), "expected no scheme for {:?}", text);
            assert_eq!(scheme.free_quantity(100), 0);
        }
    }

    #[test]
    fn test_non_positive_billed() {
        assert_eq!(BonusScheme::parse("10+2").free_quantity(0), 0);
        assert_eq!(BonusScheme::parse("10+2").free_quantity(-20), 0);
    }
}
