//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  A ledger summed in floats drifts:                                      │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise (1 rupee = 100 paise)                      │
//! │    ₹350.00 MRP  → 35000 paise                                           │
//! │    ₹8884.88 EMI → 888488 paise                                          │
//! │                                                                         │
//! │  Every rounding step is explicit and happens exactly once.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sanj_core::money::Money;
//!
//! let mrp = Money::from_paise(35000); // ₹350.00
//! let strip_of_ten = mrp * 10i64;
//! assert_eq!(strip_of_ten.paise(), 350000);
//!
//! let parsed = Money::parse_decimal("8884.88").unwrap();
//! assert_eq!(parsed.paise(), 888488);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of a rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: net profit and reversals can go negative
/// - **Serialized as a bare integer**: the JSON API speaks paise
/// - **sqlx transparent**: stored as an INTEGER column
///
/// ## Where Money Flows
/// ```text
/// Product.mrp ──► derive_trade_prices ──► retailer / stockist price
///
/// Transaction: qty × unit − discount + cnf + transport ──► total_amount
///                                                             │
///                                                             ▼
///                                              FinanceRecord.amount (ledger)
///
/// BankDebt.loan_amount ──► calculate_emi ──► monthly_emi ──► "Debt Servicing"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ## Example
    /// ```rust
    /// use sanj_core::money::Money;
    ///
    /// let price = Money::from_paise(28000); // ₹280.00
    /// assert_eq!(price.paise(), 28000);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees and paise.
    ///
    /// ## Example
    /// ```rust
    /// use sanj_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees_paise(350, 50).paise(), 35050);
    /// assert_eq!(Money::from_rupees_paise(-5, 50).paise(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts only the rupee part carries the sign.
    #[inline]
    pub const fn from_rupees_paise(rupees: i64, paise: i64) -> Self {
        if rupees < 0 {
            Money(rupees * 100 - paise)
        } else {
            Money(rupees * 100 + paise)
        }
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps negative values to zero.
    ///
    /// ## Example
    /// ```rust
    /// use sanj_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(-10).non_negative(), Money::zero());
    /// assert_eq!(Money::from_paise(10).non_negative().paise(), 10);
    /// ```
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Multiplies money by a unit quantity, saturating at the `i64` bounds.
    ///
    /// Used for display values such as stock valuation. Amounts that get
    /// stored go through [`Money::checked_multiply_quantity`].
    ///
    /// ## Example
    /// ```rust
    /// use sanj_core::money::Money;
    ///
    /// let unit_price = Money::from_paise(24000); // ₹240.00 stockist price
    /// assert_eq!(unit_price.multiply_quantity(25).paise(), 600000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` when `amount × qty` does not fit.
    ///
    /// ## Example
    /// ```rust
    /// use sanj_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(500).checked_multiply_quantity(3), Some(Money::from_paise(1500)));
    /// assert_eq!(Money::from_paise(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Applies a basis-point rate to this amount.
    ///
    /// ## Rounding
    /// Half a paisa rounds away from zero:
    /// `(|amount| × bps + 5000) / 10000`, sign restored afterwards.
    ///
    /// ## Example
    /// ```rust
    /// use sanj_core::money::Money;
    /// use sanj_core::types::Rate;
    ///
    /// let total = Money::from_paise(100_000); // ₹1000.00
    /// let ratio = Rate::from_bps(1250);       // 12.5%
    /// assert_eq!(total.apply_rate(ratio).paise(), 12_500);
    ///
    /// // ₹0.05 at 10% = 0.5 paisa → 1 paisa
    /// assert_eq!(Money::from_paise(5).apply_rate(Rate::from_bps(1000)).paise(), 1);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        // i128 keeps large ledger totals from overflowing
        let magnitude = (self.0.unsigned_abs() as i128 * rate.bps() as i128 + 5000) / 10000;
        let signed = if self.0 < 0 { -magnitude } else { magnitude };
        Money(signed as i64)
    }

    /// Parses a decimal rupee string such as `"350"`, `"8884.88"` or `"-12.5"`.
    ///
    /// A third decimal digit is rounded half up; anything beyond it is ignored.
    ///
    /// ## Example
    /// ```rust
    /// use sanj_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("350").unwrap().paise(), 35000);
    /// assert_eq!(Money::parse_decimal("12.5").unwrap().paise(), 1250);
    /// assert_eq!(Money::parse_decimal("0.005").unwrap().paise(), 1);
    /// assert!(Money::parse_decimal("abc").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        let invalid = || ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: format!("'{}' is not a decimal amount", input),
        };

        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let rupees: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        let mut frac_digits = fraction.bytes().map(|b| (b - b'0') as i64);
        let tens = frac_digits.next().unwrap_or(0);
        let ones = frac_digits.next().unwrap_or(0);
        let round_digit = frac_digits.next().unwrap_or(0);

        let mut paise = rupees
            .checked_mul(100)
            .and_then(|p| p.checked_add(tens * 10 + ones))
            .ok_or_else(invalid)?;
        if round_digit >= 5 {
            paise += 1;
        }

        Ok(Money(if negative { -paise } else { paise }))
    }

    /// Formats as a plain decimal (`"1234.56"`), used for CSV cells.
    ///
    /// ## Example
    /// ```rust
    /// use sanj_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(123456).to_decimal_string(), "1234.56");
    /// assert_eq!(Money::from_paise(-550).to_decimal_string(), "-5.50");
    /// ```
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount with the rupee sign (`₹1234.56`).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(35050);
        assert_eq!(money.paise(), 35050);
        assert_eq!(money.rupees(), 350);
        assert_eq!(money.paise_part(), 50);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_paise(888488).to_string(), "₹8884.88");
        assert_eq!(Money::from_paise(500).to_string(), "₹5.00");
        assert_eq!(Money::from_paise(-550).to_string(), "-₹5.50");
        assert_eq!(Money::zero().to_string(), "₹0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_rupees(10);
        let b = Money::from_paise(500);

        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        assert_eq!((a * 3i64).paise(), 3000);
        assert_eq!((-a).paise(), -1000);
    }

    #[test]
    fn test_sum() {
        let amounts = vec![Money::from_paise(100), Money::from_paise(250), Money::from_paise(-50)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.paise(), 300);
    }

    #[test]
    fn test_apply_rate_rounds_away_from_zero() {
        // 12% GST on ₹280.00 = ₹33.60
        assert_eq!(Money::from_paise(28000).apply_rate(Rate::from_bps(1200)).paise(), 3360);
        // -0.5 paisa → -1 paisa
        assert_eq!(Money::from_paise(-5).apply_rate(Rate::from_bps(1000)).paise(), -1);
        // 0.4 paisa → 0
        assert_eq!(Money::from_paise(4).apply_rate(Rate::from_bps(1000)).paise(), 0);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("350.00").unwrap().paise(), 35000);
        assert_eq!(Money::parse_decimal(" 190 ").unwrap().paise(), 19000);
        assert_eq!(Money::parse_decimal(".5").unwrap().paise(), 50);
        assert_eq!(Money::parse_decimal("-12.345").unwrap().paise(), -1235);
        assert_eq!(Money::parse_decimal("1.994").unwrap().paise(), 199);

        assert!(Money::parse_decimal("").is_err());
        assert!(Money::parse_decimal(".").is_err());
        assert!(Money::parse_decimal("1,000").is_err());
        assert!(Money::parse_decimal("1.2.3").is_err());
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(Money::from_paise(-1).non_negative(), Money::zero());
        assert_eq!(Money::from_paise(7).non_negative().paise(), 7);
    }

    #[test]
    fn test_serializes_as_integer_paise() {
        let json = serde_json::to_string(&Money::from_paise(28000)).unwrap();
        assert_eq!(json, "28000");
    }
}
