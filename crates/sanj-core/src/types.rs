//! # Domain Types
//!
//! Core domain types for the back office, one record per business tab.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌───────────────┐   ┌───────────────┐   ┌─────────────────┐            │
//! │  │   Product     │◄──│  StockEntry   │   │  FinanceRecord  │            │
//! │  │  batch, mrp   │   │  signed qty   │   │  income/expense │            │
//! │  │  bonus scheme │   │  movement     │   │  ledger row     │            │
//! │  │  current_stock│   └───────▲───────┘   └────────▲────────┘            │
//! │  └──────▲────────┘           │                    │                     │
//! │         │            ┌───────┴────────────────────┴──┐                  │
//! │         └────────────│         Transaction           │──► Customer      │
//! │                      │ sale/purchase, totals, return │                  │
//! │                      └───────────────────────────────┘                  │
//! │                                                                         │
//! │  ┌───────────────┐   ┌───────────────┐   ┌──────────────────────┐       │
//! │  │   BankDebt    │   │ InvestorDebt  │   │ MarketingAgreement   │       │
//! │  │  EMI          │   │  monthly ROI  │   │  doctor, paid, status│       │
//! │  └───────────────┘   └───────────────┘   └──────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - `id`: UUID v4 string
//! - Money fields are [`Money`] (paise), rates are [`Rate`] (basis points)
//! - Business dates are `NaiveDate`, audit stamps are `DateTime<Utc>`

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::scheme::BonusScheme;

// =============================================================================
// Rate
// =============================================================================

/// A rate in basis points (1 bp = 0.01%).
///
/// Used for GST, loan interest (per year), investor ROI (per month) and
/// expected-return ratios.
///
/// ## Example
/// ```rust
/// use sanj_core::types::Rate;
///
/// let gst = Rate::from_bps(1200);
/// assert_eq!(gst.percentage(), 12.0);
/// assert_eq!(Rate::from_percentage(2.5).bps(), 250);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience at the edges).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round().max(0.0) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Generates `as_str` and `Display` for a snake_case status enum.
macro_rules! impl_as_str {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Returns the stored (snake_case) representation.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Direction of a trade transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Goods leave stock; income.
    Sale,
    /// Goods enter stock; expense.
    Purchase,
}

impl_as_str!(TransactionKind { Sale => "sale", Purchase => "purchase" });

/// Settlement state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Partial,
    #[default]
    Pending,
}

impl_as_str!(PaymentStatus { Paid => "paid", Partial => "partial", Pending => "pending" });

/// Trade category of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    #[default]
    Retailer,
    Stockist,
    Distributor,
    Hospital,
    Doctor,
    Other,
}

impl_as_str!(CustomerType {
    Retailer => "retailer",
    Stockist => "stockist",
    Distributor => "distributor",
    Hospital => "hospital",
    Doctor => "doctor",
    Other => "other",
});

/// Why a stock entry changed the on-hand quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockMovement {
    /// Goods received from a supplier.
    Purchase,
    /// Goods sold to a customer.
    Sale,
    /// Goods returned back into stock.
    Return,
    /// Manual correction (damage, recount); carries its own sign.
    Adjustment,
    /// Sale where the bonus scheme adds free units on top of billed units.
    SchemeSale,
}

impl_as_str!(StockMovement {
    Purchase => "purchase",
    Sale => "sale",
    Return => "return",
    Adjustment => "adjustment",
    SchemeSale => "scheme_sale",
});

impl StockMovement {
    /// Sign applied to a positive quantity for this movement.
    ///
    /// `Adjustment` returns +1: its quantity is already signed.
    #[inline]
    pub const fn sign(&self) -> i64 {
        match self {
            StockMovement::Purchase | StockMovement::Return | StockMovement::Adjustment => 1,
            StockMovement::Sale | StockMovement::SchemeSale => -1,
        }
    }
}

/// Direction of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FinanceKind {
    Income,
    Expense,
}

impl_as_str!(FinanceKind { Income => "income", Expense => "expense" });

/// Whether a debt is still being serviced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    #[default]
    Active,
    Closed,
}

impl_as_str!(DebtStatus { Active => "active", Closed => "closed" });

/// Lifecycle of a doctor marketing agreement.
///
/// ## Transitions
/// ```text
///            ┌──────────────┐
///     ┌─────►│  Completed   │  (terminal)
///     │      └──────────────┘
/// ┌───┴────┐
/// │ Active │
/// └───┬────┘
///     │      ┌──────────────┐
///     └─────►│ Discontinued │──► Active (reinstated)
///            └──────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    #[default]
    Active,
    Completed,
    Discontinued,
}

impl_as_str!(AgreementStatus {
    Active => "active",
    Completed => "completed",
    Discontinued => "discontinued",
});

impl AgreementStatus {
    /// Checks whether an agreement may move from `self` to `next`.
    ///
    /// ## Example
    /// ```rust
    /// use sanj_core::types::AgreementStatus;
    ///
    /// assert!(AgreementStatus::Active.can_transition_to(AgreementStatus::Completed));
    /// assert!(AgreementStatus::Discontinued.can_transition_to(AgreementStatus::Active));
    /// assert!(!AgreementStatus::Completed.can_transition_to(AgreementStatus::Active));
    /// ```
    pub const fn can_transition_to(&self, next: AgreementStatus) -> bool {
        use AgreementStatus::*;
        matches!(
            (self, next),
            (Active, _) | (Completed, Completed) | (Discontinued, Active) | (Discontinued, Discontinued)
        )
    }
}

/// How often an agreement amount is paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
    OneTime,
}

impl_as_str!(PaymentFrequency {
    Monthly => "monthly",
    Quarterly => "quarterly",
    HalfYearly => "half_yearly",
    Yearly => "yearly",
    OneTime => "one_time",
});

/// Computed health of an agreement (never stored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AgreementPerformance {
    /// Return value has reached the expected return.
    OnTrack,
    /// Still running, return value below expectation.
    UnderPerforming,
    /// Discontinued, or past its end date without being completed.
    Review,
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product (one row per product + batch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Manufacturer batch number.
    pub batch: String,
    #[ts(as = "Option<String>")]
    pub expiry: Option<NaiveDate>,
    pub mrp: Money,
    pub gst: Rate,
    pub retailer_price: Money,
    pub stockist_price: Money,
    /// Purchase rate; stock is valued at this price.
    pub supplier_price: Money,
    /// Scheme text exactly as entered ("10+2", "15%", "10+1 strip").
    pub bonus_scheme: Option<String>,
    /// Denormalized on-hand units, kept equal to the stock ledger sum.
    pub current_stock: i64,
    pub category: Option<String>,
    pub description: Option<String>,
    pub composition: Option<String>,
    pub packing: Option<String>,
    /// Soft-delete flag.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Parses the stored bonus scheme text.
    pub fn scheme(&self) -> BonusScheme {
        self.bonus_scheme
            .as_deref()
            .map(BonusScheme::parse)
            .unwrap_or(BonusScheme::None)
    }

    /// Value of on-hand stock at the supplier (purchase) price.
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.supplier_price.multiply_quantity(self.current_stock)
    }

    /// Checks if stock is at or below the threshold.
    #[inline]
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.current_stock <= threshold
    }

    /// Checks if the batch expires on or before `today + days`.
    pub fn expires_within(&self, today: NaiveDate, days: i64) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= today + chrono::Duration::days(days),
            None => false,
        }
    }

    /// Checks if the batch is already past its expiry date.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry.map(|e| e < today).unwrap_or(false)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A trade customer (retailer, stockist, hospital, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub customer_type: CustomerType,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub gst_number: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Transaction
// =============================================================================

/// A sale or purchase of one product with its expense lines.
///
/// Customer and product names are snapshots taken at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub product_id: String,
    pub product_name: String,
    /// Batch the stock movement was written to.
    pub batch: String,
    pub kind: TransactionKind,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub cnf_commission: Money,
    pub transport_expense: Money,
    /// `quantity × unit_price − discount + cnf_commission + transport_expense`.
    pub total_amount: Money,
    pub expected_return_ratio: Rate,
    pub expected_return: Money,
    pub payment_status: PaymentStatus,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Change this transaction applies to the product's on-hand stock.
    #[inline]
    pub fn stock_delta(&self) -> i64 {
        match self.kind {
            TransactionKind::Sale => -self.quantity,
            TransactionKind::Purchase => self.quantity,
        }
    }
}

// =============================================================================
// Stock Entry
// =============================================================================

/// One row of the stock ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockEntry {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub batch: String,
    /// Signed change in units (negative for sales).
    pub quantity: i64,
    pub movement: StockMovement,
    pub unit_price: Money,
    /// Supplier or customer name.
    pub party: Option<String>,
    /// Invoice or bill number.
    pub reference: Option<String>,
    /// Set when the entry was produced by a transaction.
    pub transaction_id: Option<String>,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Available units of one batch of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BatchBalance {
    pub product_id: String,
    pub batch: String,
    pub quantity: i64,
}

// =============================================================================
// Finance Record
// =============================================================================

/// A row in the income/expense ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct FinanceRecord {
    pub id: String,
    pub kind: FinanceKind,
    /// Who paid or was paid ("Walk-in", a bank, a supplier).
    pub source: String,
    /// "Sales", "Purchases", "CNF Commission", "Debt Servicing", ...
    pub category: String,
    pub amount: Money,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// Tab that produced the row ("transactions", "stock", "debts").
    pub linked_tab: Option<String>,
    pub notes: Option<String>,
    pub reference: Option<String>,
    pub customer_id: Option<String>,
    pub transaction_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Debts
// =============================================================================

/// A bank loan repaid by EMI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BankDebt {
    pub id: String,
    pub bank_name: String,
    pub loan_amount: Money,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    pub tenure_months: i64,
    /// Annual interest rate.
    pub interest_rate: Rate,
    pub monthly_emi: Money,
    pub remaining_principal: Money,
    pub status: DebtStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Money raised from an investor who is paid a monthly ROI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvestorDebt {
    pub id: String,
    pub investor_name: String,
    pub principal_invested: Money,
    /// Monthly ROI rate.
    pub roi: Rate,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    /// ROI is waived for now (still counted in totals, not as an expense).
    pub skipped_roi: bool,
    pub partial_withdrawal: Money,
    pub remaining_principal: Money,
    pub monthly_roi: Money,
    pub status: DebtStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InvestorDebt {
    /// ROI that actually leaves the business this month.
    #[inline]
    pub fn payable_roi(&self) -> Money {
        if self.skipped_roi {
            Money::zero()
        } else {
            self.monthly_roi
        }
    }
}

// =============================================================================
// Marketing Agreement
// =============================================================================

/// A marketing agreement with a doctor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MarketingAgreement {
    pub id: String,
    pub doctor_name: String,
    #[ts(as = "String")]
    pub agreement_start: NaiveDate,
    #[ts(as = "String")]
    pub agreement_end: NaiveDate,
    pub agreement_amount: Money,
    pub paid_amount: Money,
    /// `agreement_amount − paid_amount`.
    pub pending_amount: Money,
    pub expected_return: Money,
    /// Expected return as a share of the agreement amount.
    pub expected_return_ratio: Rate,
    /// Business actually generated so far.
    pub return_value: Money,
    pub status: AgreementStatus,
    pub payment_frequency: PaymentFrequency,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl MarketingAgreement {
    /// Checks if the agreement period has ended.
    #[inline]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.agreement_end < today
    }

    /// Classifies the agreement for the marketing table.
    ///
    /// ## Rules
    /// ```text
    /// discontinued, or expired and not completed ──► Review
    /// return_value ≥ expected_return             ──► OnTrack
    /// otherwise                                  ──► UnderPerforming
    /// ```
    pub fn performance(&self, today: NaiveDate) -> AgreementPerformance {
        let needs_review = self.status == AgreementStatus::Discontinued
            || (self.is_expired(today) && self.status != AgreementStatus::Completed);

        if needs_review {
            AgreementPerformance::Review
        } else if self.return_value >= self.expected_return {
            AgreementPerformance::OnTrack
        } else {
            AgreementPerformance::UnderPerforming
        }
    }
}

// =============================================================================
// Report Snapshot
// =============================================================================

/// A monthly finance snapshot exported to the reports tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ReportSnapshot {
    pub id: String,
    /// Month label, e.g. "October 2026".
    pub month: String,
    pub total_income: Money,
    pub total_expenses: Money,
    pub net_profit: Money,
    pub record_count: i64,
    pub exported_by: String,
    #[ts(as = "String")]
    pub exported_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
