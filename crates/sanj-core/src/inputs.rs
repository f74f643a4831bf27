//! # Input Payloads
//!
//! What a client submits to create or edit a record. Each payload validates
//! itself; derived amounts (totals, EMI, pending) are never accepted from the
//! client and are computed from these fields instead.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::calc::{self, TradeLine};
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{
    AgreementStatus, CustomerType, DebtStatus, FinanceKind, PaymentFrequency, PaymentStatus, Rate,
    TransactionKind,
};
use crate::validation::*;
use crate::{MAX_INTEREST_BPS, MAX_NAME_LENGTH, MAX_NOTES_LENGTH};

/// Upper bound for GST and expected-return ratios (100%).
const FULL_RATE_BPS: u32 = 10_000;

// =============================================================================
// Product
// =============================================================================

/// Create / edit payload for a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub name: String,
    pub batch: String,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
    pub mrp: Money,
    #[serde(default)]
    pub gst: Rate,
    /// Defaults to 80% of MRP.
    #[serde(default)]
    pub retailer_price: Option<Money>,
    /// Defaults to 90% of the retailer price.
    #[serde(default)]
    pub stockist_price: Option<Money>,
    pub supplier_price: Money,
    #[serde(default)]
    pub bonus_scheme: Option<String>,
    /// Units on hand when the product is first created (ignored on edit).
    #[serde(default)]
    pub opening_stock: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub composition: Option<String>,
    #[serde(default)]
    pub packing: Option<String>,
}

impl ProductInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, MAX_NAME_LENGTH)?;
        validate_batch(&self.batch)?;
        validate_non_negative("mrp", self.mrp)?;
        validate_rate("gst", self.gst, FULL_RATE_BPS)?;
        validate_non_negative("supplier_price", self.supplier_price)?;
        if let Some(price) = self.retailer_price {
            validate_non_negative("retailer_price", price)?;
        }
        if let Some(price) = self.stockist_price {
            validate_non_negative("stockist_price", price)?;
        }
        if self.opening_stock < 0 {
            return Err(ValidationError::OutOfRange {
                field: "opening_stock".to_string(),
                min: 0,
                max: crate::MAX_QUANTITY,
            });
        }
        validate_optional_text("bonus_scheme", self.bonus_scheme.as_deref(), 50)?;
        validate_optional_text("category", self.category.as_deref(), MAX_NAME_LENGTH)?;
        validate_optional_text("description", self.description.as_deref(), MAX_NOTES_LENGTH)?;
        validate_optional_text("composition", self.composition.as_deref(), MAX_NOTES_LENGTH)?;
        validate_optional_text("packing", self.packing.as_deref(), MAX_NAME_LENGTH)?;
        Ok(())
    }

    /// Retailer and stockist prices, filling gaps from the MRP ladder.
    pub fn trade_prices(&self) -> (Money, Money) {
        let (derived_retailer, _) = calc::derive_trade_prices(self.mrp);
        let retailer = self.retailer_price.unwrap_or(derived_retailer);
        let stockist = self
            .stockist_price
            .unwrap_or_else(|| retailer.apply_rate(calc::STOCKIST_SHARE_OF_RETAILER));
        (retailer, stockist)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Create / edit payload for a customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInput {
    pub name: String,
    #[serde(default)]
    pub customer_type: CustomerType,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CustomerInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, MAX_NAME_LENGTH)?;
        validate_optional_text("contact", self.contact.as_deref(), 100)?;
        validate_optional_text("address", self.address.as_deref(), MAX_NOTES_LENGTH)?;
        validate_gst_number(self.gst_number.as_deref())?;
        validate_optional_text("notes", self.notes.as_deref(), MAX_NOTES_LENGTH)?;
        Ok(())
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Create / edit payload for a sale or purchase.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionInput {
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Used when no customer record is linked ("Walk-in").
    #[serde(default)]
    pub customer_name: Option<String>,
    pub product_id: String,
    /// Batch the goods move in; the product's own batch when absent.
    #[serde(default)]
    pub batch: Option<String>,
    pub kind: TransactionKind,
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub cnf_commission: Money,
    #[serde(default)]
    pub transport_expense: Money,
    #[serde(default)]
    pub expected_return_ratio: Option<Rate>,
    /// When given, the ratio is back-computed from it.
    #[serde(default)]
    pub expected_return: Option<Money>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
    /// Save a sale even when it exceeds the product's on-hand stock.
    #[serde(default)]
    pub allow_oversell: bool,
}

impl TransactionInput {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(id) = &self.customer_id {
            validate_uuid("customer_id", id)?;
        }
        validate_optional_text("customer_name", self.customer_name.as_deref(), MAX_NAME_LENGTH)?;
        validate_uuid("product_id", &self.product_id)?;
        if let Some(batch) = self.batch.as_deref().filter(|b| !b.trim().is_empty()) {
            validate_batch(batch)?;
        }
        validate_quantity(self.quantity)?;
        validate_non_negative("unit_price", self.unit_price)?;
        validate_non_negative("discount", self.discount)?;
        validate_non_negative("cnf_commission", self.cnf_commission)?;
        validate_non_negative("transport_expense", self.transport_expense)?;
        if self.discount > self.trade_line().gross()? {
            return Err(ValidationError::Inconsistent {
                field: "discount".to_string(),
                reason: "cannot exceed quantity × unit_price".to_string(),
            });
        }
        if let Some(ratio) = self.expected_return_ratio {
            validate_rate("expected_return_ratio", ratio, FULL_RATE_BPS)?;
        }
        if let Some(expected) = self.expected_return {
            validate_non_negative("expected_return", expected)?;
        }
        validate_optional_text("notes", self.notes.as_deref(), MAX_NOTES_LENGTH)?;
        Ok(())
    }

    pub fn trade_line(&self) -> TradeLine {
        TradeLine {
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount: self.discount,
            cnf_commission: self.cnf_commission,
            transport_expense: self.transport_expense,
        }
    }

    /// `(total, expected_return, ratio)` recomputed from the raw fields.
    pub fn computed_amounts(&self) -> ValidationResult<(Money, Money, Rate)> {
        let total = self.trade_line().total()?;
        let (expected, ratio) =
            calc::resolve_expected_return(total, self.expected_return, self.expected_return_ratio);
        Ok((total, expected, ratio))
    }
}

// =============================================================================
// Finance
// =============================================================================

/// Create / edit payload for a manual ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinanceInput {
    pub kind: FinanceKind,
    pub source: String,
    pub category: String,
    pub amount: Money,
    #[serde(default)]
    pub description: Option<String>,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(default)]
    pub linked_tab: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

impl FinanceInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("source", &self.source, MAX_NAME_LENGTH)?;
        validate_name("category", &self.category, MAX_NAME_LENGTH)?;
        validate_positive("amount", self.amount)?;
        validate_optional_text("description", self.description.as_deref(), MAX_NOTES_LENGTH)?;
        validate_optional_text("linked_tab", self.linked_tab.as_deref(), 50)?;
        validate_optional_text("notes", self.notes.as_deref(), MAX_NOTES_LENGTH)?;
        validate_optional_text("reference", self.reference.as_deref(), 100)?;
        if let Some(id) = &self.customer_id {
            validate_uuid("customer_id", id)?;
        }
        Ok(())
    }
}

// =============================================================================
// Debts
// =============================================================================

/// Create / edit payload for a bank loan.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BankDebtInput {
    pub bank_name: String,
    pub loan_amount: Money,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    pub tenure_months: i64,
    pub interest_rate: Rate,
    /// Defaults to the loan amount.
    #[serde(default)]
    pub remaining_principal: Option<Money>,
    #[serde(default)]
    pub status: DebtStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl BankDebtInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("bank_name", &self.bank_name, MAX_NAME_LENGTH)?;
        validate_positive("loan_amount", self.loan_amount)?;
        validate_tenure(self.tenure_months)?;
        validate_rate("interest_rate", self.interest_rate, MAX_INTEREST_BPS)?;
        if let Some(remaining) = self.remaining_principal {
            validate_non_negative("remaining_principal", remaining)?;
            if remaining > self.loan_amount {
                return Err(ValidationError::Inconsistent {
                    field: "remaining_principal".to_string(),
                    reason: "cannot exceed loan_amount".to_string(),
                });
            }
        }
        validate_optional_text("notes", self.notes.as_deref(), MAX_NOTES_LENGTH)?;
        Ok(())
    }
}

/// Create / edit payload for an investor.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvestorInput {
    pub investor_name: String,
    pub principal_invested: Money,
    /// Monthly ROI rate.
    pub roi: Rate,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[serde(default)]
    pub skipped_roi: bool,
    #[serde(default)]
    pub partial_withdrawal: Money,
    #[serde(default)]
    pub status: DebtStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl InvestorInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("investor_name", &self.investor_name, MAX_NAME_LENGTH)?;
        validate_positive("principal_invested", self.principal_invested)?;
        validate_rate("roi", self.roi, MAX_INTEREST_BPS)?;
        validate_non_negative("partial_withdrawal", self.partial_withdrawal)?;
        validate_optional_text("notes", self.notes.as_deref(), MAX_NOTES_LENGTH)?;
        Ok(())
    }
}

// =============================================================================
// Marketing
// =============================================================================

/// Create / edit payload for a doctor agreement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AgreementInput {
    pub doctor_name: String,
    #[ts(as = "String")]
    pub agreement_start: NaiveDate,
    #[ts(as = "String")]
    pub agreement_end: NaiveDate,
    pub agreement_amount: Money,
    #[serde(default)]
    pub paid_amount: Money,
    #[serde(default)]
    pub expected_return: Option<Money>,
    #[serde(default)]
    pub expected_return_ratio: Option<Rate>,
    #[serde(default)]
    pub return_value: Money,
    #[serde(default)]
    pub status: AgreementStatus,
    #[serde(default)]
    pub payment_frequency: PaymentFrequency,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AgreementInput {
    /// ## Rules
    /// - doctor required, both dates present, start < end
    /// - amount > 0, 0 ≤ paid ≤ amount
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("doctor_name", &self.doctor_name, MAX_NAME_LENGTH)?;
        validate_date_order("agreement_start", self.agreement_start, "agreement_end", self.agreement_end)?;
        validate_positive("agreement_amount", self.agreement_amount)?;
        validate_non_negative("paid_amount", self.paid_amount)?;
        validate_paid_within(self.paid_amount, self.agreement_amount)?;
        validate_non_negative("return_value", self.return_value)?;
        if let Some(expected) = self.expected_return {
            validate_non_negative("expected_return", expected)?;
        }
        validate_optional_text("notes", self.notes.as_deref(), MAX_NOTES_LENGTH)?;
        Ok(())
    }

    /// `(expected_return, ratio)` kept in sync with the agreement amount.
    pub fn resolved_expected_return(&self) -> (Money, Rate) {
        calc::resolve_expected_return(self.agreement_amount, self.expected_return, self.expected_return_ratio)
    }
}

// =============================================================================
// Stock
// =============================================================================

/// Goods received into a batch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockPurchaseInput {
    pub product_id: String,
    pub batch: String,
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub supplier: Option<String>,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(default)]
    pub invoice: Option<String>,
}

impl StockPurchaseInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid("product_id", &self.product_id)?;
        validate_batch(&self.batch)?;
        validate_quantity(self.quantity)?;
        validate_non_negative("unit_price", self.unit_price)?;
        validate_optional_text("supplier", self.supplier.as_deref(), MAX_NAME_LENGTH)?;
        validate_optional_text("invoice", self.invoice.as_deref(), 100)?;
        self.line_amount()?;
        Ok(())
    }

    /// `unit_price × quantity`, the amount booked in finance.
    pub fn line_amount(&self) -> ValidationResult<Money> {
        self.unit_price
            .checked_multiply_quantity(self.quantity)
            .ok_or_else(|| ValidationError::too_large("unit_price"))
    }
}

/// Goods sold out of a batch (plain or scheme sale).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSaleInput {
    pub product_id: String,
    pub batch: String,
    /// Billed units.
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub customer: Option<String>,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(default)]
    pub reference: Option<String>,
}

impl StockSaleInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid("product_id", &self.product_id)?;
        validate_batch(&self.batch)?;
        validate_quantity(self.quantity)?;
        validate_non_negative("unit_price", self.unit_price)?;
        validate_optional_text("customer", self.customer.as_deref(), MAX_NAME_LENGTH)?;
        validate_optional_text("reference", self.reference.as_deref(), 100)?;
        self.line_amount()?;
        Ok(())
    }

    /// `unit_price × quantity`, the amount booked in finance.
    pub fn line_amount(&self) -> ValidationResult<Money> {
        self.unit_price
            .checked_multiply_quantity(self.quantity)
            .ok_or_else(|| ValidationError::too_large("unit_price"))
    }
}

/// Goods coming back into a batch, or a manual correction.
///
/// For returns `quantity` must be positive; for adjustments it is signed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockCorrectionInput {
    pub product_id: String,
    pub batch: String,
    pub quantity: i64,
    #[serde(default)]
    pub party: Option<String>,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(default)]
    pub reference: Option<String>,
}

impl StockCorrectionInput {
    pub fn validate_return(&self) -> ValidationResult<()> {
        self.validate_common()?;
        validate_quantity(self.quantity)
    }

    pub fn validate_adjustment(&self) -> ValidationResult<()> {
        self.validate_common()?;
        validate_adjustment(self.quantity)
    }

    fn validate_common(&self) -> ValidationResult<()> {
        validate_uuid("product_id", &self.product_id)?;
        validate_batch(&self.batch)?;
        validate_optional_text("party", self.party.as_deref(), MAX_NAME_LENGTH)?;
        validate_optional_text("reference", self.reference.as_deref(), 100)?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
