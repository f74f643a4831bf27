//! # Business Formulas
//!
//! Closed-form arithmetic used across the tabs: loan EMI, investor ROI,
//! transaction totals, expected-return ratios and the trade-price ladder.
//!
//! ## Rounding Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Inputs are already in paise, so sums and products are exact.          │
//! │                                                                         │
//! │  Percentages (bps) round half a paisa away from zero, once.            │
//! │  EMI is the only float computation; its result rounds to the nearest   │
//! │  paisa before it is stored or compared.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Rate;

/// Retailer price as a share of MRP (80%).
pub const RETAILER_SHARE_OF_MRP: Rate = Rate::from_bps(8_000);

/// Stockist price as a share of retailer price (90%).
pub const STOCKIST_SHARE_OF_RETAILER: Rate = Rate::from_bps(9_000);

/// Markup used for a sale rate when a product has no retailer price (120%).
pub const DEFAULT_SALE_MARKUP: Rate = Rate::from_bps(12_000);

// =============================================================================
// Loans
// =============================================================================

/// Equated monthly installment for a loan.
///
/// `EMI = P·r·(1+r)^N / ((1+r)^N − 1)` with `r = annual_rate / 12`.
///
/// ## Edge Cases
/// - `tenure_months == 0` → `InvalidCalculation`
/// - `annual_rate == 0` → straight-line `P / N`, rounded to the paisa
/// - negative principal → `InvalidCalculation`
///
/// ## Example
/// ```rust
/// use sanj_core::calc::calculate_emi;
/// use sanj_core::money::Money;
/// use sanj_core::types::Rate;
///
/// let emi = calculate_emi(Money::from_rupees(100_000), Rate::from_bps(1200), 12).unwrap();
/// assert_eq!(emi.paise(), 888_488); // ₹8884.88
/// ```
pub fn calculate_emi(principal: Money, annual_rate: Rate, tenure_months: i64) -> CoreResult<Money> {
    if tenure_months <= 0 {
        return Err(CoreError::invalid_calculation("loan tenure must be at least one month"));
    }
    if principal.is_negative() {
        return Err(CoreError::invalid_calculation("loan amount cannot be negative"));
    }
    if principal.is_zero() {
        return Ok(Money::zero());
    }

    if annual_rate.is_zero() {
        let paise = (principal.paise() + tenure_months / 2) / tenure_months;
        return Ok(Money::from_paise(paise));
    }

    let p = principal.paise() as f64;
    let r = annual_rate.bps() as f64 / 10_000.0 / 12.0;
    let growth = (1.0 + r).powi(tenure_months as i32);
    let emi = p * r * growth / (growth - 1.0);

    if !emi.is_finite() {
        return Err(CoreError::invalid_calculation("EMI is not representable"));
    }
    Ok(Money::from_paise(emi.round() as i64))
}

/// Derived figures for an investor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvestorPosition {
    /// `max(0, principal − withdrawal)`.
    pub remaining_principal: Money,
    /// `remaining × roi`, whether or not it is paid.
    pub monthly_roi: Money,
    /// What leaves the business: zero when ROI is skipped.
    pub payable_roi: Money,
}

/// Computes an investor's remaining principal and monthly ROI.
///
/// ## Example
/// ```rust
/// use sanj_core::calc::investor_position;
/// use sanj_core::money::Money;
/// use sanj_core::types::Rate;
///
/// let pos = investor_position(
///     Money::from_rupees(200_000),
///     Rate::from_bps(200),          // 2% per month
///     Money::from_rupees(50_000),
///     false,
/// );
/// assert_eq!(pos.remaining_principal, Money::from_rupees(150_000));
/// assert_eq!(pos.monthly_roi, Money::from_rupees(3_000));
/// ```
pub fn investor_position(principal: Money, roi: Rate, withdrawal: Money, skipped: bool) -> InvestorPosition {
    let remaining_principal = (principal - withdrawal).non_negative();
    let monthly_roi = remaining_principal.apply_rate(roi);
    InvestorPosition {
        remaining_principal,
        monthly_roi,
        payable_roi: if skipped { Money::zero() } else { monthly_roi },
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// The amount-bearing fields of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TradeLine {
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub cnf_commission: Money,
    pub transport_expense: Money,
}

impl TradeLine {
    /// `quantity × unit_price − discount + cnf_commission + transport_expense`.
    ///
    /// ## Example
    /// ```rust
    /// use sanj_core::calc::TradeLine;
    /// use sanj_core::money::Money;
    ///
    /// let line = TradeLine {
    ///     quantity: 25,
    ///     unit_price: Money::from_rupees(240),
    ///     discount: Money::from_rupees(500),
    ///     cnf_commission: Money::from_rupees(150),
    ///     transport_expense: Money::from_rupees(80),
    /// };
    /// assert_eq!(line.total().unwrap(), Money::from_rupees(5_730));
    /// ```
    ///
    /// ## Errors
    /// `OutOfRange` on `total_amount` when the arithmetic overflows.
    pub fn total(&self) -> Result<Money, ValidationError> {
        self.gross()?
            .paise()
            .checked_sub(self.discount.paise())
            .and_then(|p| p.checked_add(self.cnf_commission.paise()))
            .and_then(|p| p.checked_add(self.transport_expense.paise()))
            .map(Money::from_paise)
            .ok_or_else(|| ValidationError::too_large("total_amount"))
    }

    /// Goods value before discount and expenses.
    #[inline]
    pub fn gross(&self) -> Result<Money, ValidationError> {
        self.unit_price
            .checked_multiply_quantity(self.quantity)
            .ok_or_else(|| ValidationError::too_large("unit_price"))
    }
}

/// Expected return on a total at the given ratio.
#[inline]
pub fn expected_return(total: Money, ratio: Rate) -> Money {
    total.apply_rate(ratio)
}

/// Inverse of [`expected_return`]: the ratio that yields `expected` on `total`.
///
/// Returns zero when either amount is not positive.
///
/// ## Example
/// ```rust
/// use sanj_core::calc::return_ratio;
/// use sanj_core::money::Money;
///
/// let ratio = return_ratio(Money::from_rupees(10_000), Money::from_rupees(1_250));
/// assert_eq!(ratio.bps(), 1250);
/// ```
pub fn return_ratio(total: Money, expected: Money) -> Rate {
    if !total.is_positive() || !expected.is_positive() {
        return Rate::zero();
    }
    let total = total.paise() as i128;
    let bps = (expected.paise() as i128 * 10_000 + total / 2) / total;
    Rate::from_bps(bps.min(u32::MAX as i128) as u32)
}

// =============================================================================
// Marketing
// =============================================================================

/// Amount still owed on an agreement.
#[inline]
pub fn agreement_pending(amount: Money, paid: Money) -> Money {
    amount - paid
}

/// Resolves the expected-return pair of an agreement.
///
/// An explicit `expected` amount wins and the ratio is derived from it;
/// otherwise the ratio is applied to the agreement amount.
pub fn resolve_expected_return(amount: Money, expected: Option<Money>, ratio: Option<Rate>) -> (Money, Rate) {
    match (expected, ratio) {
        (Some(expected), _) => (expected, return_ratio(amount, expected)),
        (None, Some(ratio)) => (expected_return(amount, ratio), ratio),
        (None, None) => (Money::zero(), Rate::zero()),
    }
}

// =============================================================================
// Pricing & Margins
// =============================================================================

/// Default trade prices derived from MRP: `(retailer, stockist)`.
///
/// ## Example
/// ```rust
/// use sanj_core::calc::derive_trade_prices;
/// use sanj_core::money::Money;
///
/// let (retailer, stockist) = derive_trade_prices(Money::from_rupees(350));
/// assert_eq!(retailer, Money::from_rupees(280));
/// assert_eq!(stockist, Money::from_rupees(252));
/// ```
pub fn derive_trade_prices(mrp: Money) -> (Money, Money) {
    let retailer = mrp.apply_rate(RETAILER_SHARE_OF_MRP);
    let stockist = retailer.apply_rate(STOCKIST_SHARE_OF_RETAILER);
    (retailer, stockist)
}

/// Sale rate for stock valuation: the retailer price, or purchase × 1.2.
pub fn sale_rate(retailer_price: Money, purchase_price: Money) -> Money {
    if retailer_price.is_positive() {
        retailer_price
    } else {
        purchase_price.apply_rate(DEFAULT_SALE_MARKUP)
    }
}

/// Net profit as basis points of income (may be negative).
///
/// Zero when there is no income.
pub fn profit_margin_bps(income: Money, expenses: Money) -> i64 {
    if !income.is_positive() {
        return 0;
    }
    let profit = (income - expenses).paise() as i128;
    let income = income.paise() as i128;
    let scaled = profit * 10_000;
    let half = income / 2;
    let bps = if scaled >= 0 {
        (scaled + half) / income
    } else {
        (scaled - half) / income
    };
    bps as i64
}

// =============================================================================
// Unit Tests
// =============================================================================
