//! # Report Aggregation
//!
//! Pure summaries over already-loaded records: dashboard cards, the monthly
//! finance series and the filtered business report.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sanj-db repositories ──► Vec<FinanceRecord>, Vec<Transaction>, ...     │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │  reports.rs (THIS MODULE)   FinanceSummary / StockSummary /             │
//! │                             DebtSummary / MarketingSummary /            │
//! │                             BusinessReport                              │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │  dashboard-api ──► JSON                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::calc::profit_margin_bps;
use crate::money::Money;
use crate::types::{
    AgreementPerformance, AgreementStatus, BankDebt, DebtStatus, FinanceKind, FinanceRecord,
    InvestorDebt, MarketingAgreement, Product, Transaction, TransactionKind,
};

/// Number of rows in the top products / customers tables.
pub const TOP_N: usize = 5;

/// Number of transactions listed on the business report.
pub const RECENT_TRANSACTION_LIMIT: usize = 50;

/// Formats a date as a snapshot month label, e.g. "October 2026".
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

// =============================================================================
// Finance
// =============================================================================

/// Income / expense totals for a set of ledger rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinanceSummary {
    pub total_income: Money,
    pub total_expenses: Money,
    pub net_profit: Money,
    /// Net profit as basis points of income.
    pub profit_margin_bps: i64,
    pub record_count: i64,
}

impl FinanceSummary {
    pub fn from_records(records: &[FinanceRecord]) -> Self {
        let mut summary = FinanceSummary::default();
        for record in records {
            match record.kind {
                FinanceKind::Income => summary.total_income += record.amount,
                FinanceKind::Expense => summary.total_expenses += record.amount,
            }
        }
        summary.net_profit = summary.total_income - summary.total_expenses;
        summary.profit_margin_bps = profit_margin_bps(summary.total_income, summary.total_expenses);
        summary.record_count = records.len() as i64;
        summary
    }
}

/// One month of the finance chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyFigures {
    /// "YYYY-MM".
    pub month: String,
    pub income: Money,
    pub expenses: Money,
    pub profit: Money,
}

/// Per-month totals for the latest `last_n` months present in `records`,
/// oldest first.
///
/// ## Example
/// ```rust
/// use sanj_core::reports::monthly_series;
///
/// assert!(monthly_series(&[], 6).is_empty());
/// ```
pub fn monthly_series(records: &[FinanceRecord], last_n: usize) -> Vec<MonthlyFigures> {
    let mut months: BTreeMap<(i32, u32), (Money, Money)> = BTreeMap::new();
    for record in records {
        let entry = months
            .entry((record.date.year(), record.date.month()))
            .or_default();
        match record.kind {
            FinanceKind::Income => entry.0 += record.amount,
            FinanceKind::Expense => entry.1 += record.amount,
        }
    }

    let skip = months.len().saturating_sub(last_n);
    months
        .into_iter()
        .skip(skip)
        .map(|((year, month), (income, expenses))| MonthlyFigures {
            month: format!("{:04}-{:02}", year, month),
            income,
            expenses,
            profit: income - expenses,
        })
        .collect()
}

// =============================================================================
// Stock
// =============================================================================

/// Inventory card on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSummary {
    pub product_count: i64,
    pub total_units: i64,
    /// On-hand units valued at the supplier price.
    pub stock_value: Money,
    pub low_stock_count: i64,
}

impl StockSummary {
    pub fn compute(products: &[Product], low_stock_threshold: i64) -> Self {
        let mut summary = StockSummary::default();
        for product in products.iter().filter(|p| p.is_active) {
            summary.product_count += 1;
            summary.total_units += product.current_stock;
            summary.stock_value += product.stock_value();
            if product.is_low_stock(low_stock_threshold) {
                summary.low_stock_count += 1;
            }
        }
        summary
    }
}

/// Row of the low-stock table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LowStockRow {
    pub product_id: String,
    pub name: String,
    pub batch: String,
    pub current_stock: i64,
    pub category: Option<String>,
}

impl From<&Product> for LowStockRow {
    fn from(p: &Product) -> Self {
        LowStockRow {
            product_id: p.id.clone(),
            name: p.name.clone(),
            batch: p.batch.clone(),
            current_stock: p.current_stock,
            category: p.category.clone(),
        }
    }
}

// =============================================================================
// Debts
// =============================================================================

/// Debts card and debts tab summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DebtSummary {
    pub active_count: i64,
    pub principal_outstanding: Money,
    pub monthly_emi_total: Money,
    pub monthly_roi_total: Money,
    /// EMI + ROI, including skipped ROI.
    pub monthly_obligation: Money,
    /// EMI + ROI actually paid out (skipped ROI excluded).
    pub monthly_debt_expense: Money,
}

impl DebtSummary {
    pub fn compute(banks: &[BankDebt], investors: &[InvestorDebt]) -> Self {
        let mut summary = DebtSummary::default();

        for bank in banks.iter().filter(|b| b.status == DebtStatus::Active) {
            summary.active_count += 1;
            summary.principal_outstanding += bank.remaining_principal;
            summary.monthly_emi_total += bank.monthly_emi;
            summary.monthly_debt_expense += bank.monthly_emi;
        }

        for investor in investors.iter().filter(|i| i.status == DebtStatus::Active) {
            summary.active_count += 1;
            summary.principal_outstanding += investor.remaining_principal;
            summary.monthly_roi_total += investor.monthly_roi;
            summary.monthly_debt_expense += investor.payable_roi();
        }

        summary.monthly_obligation = summary.monthly_emi_total + summary.monthly_roi_total;
        summary
    }
}

// =============================================================================
// Marketing
// =============================================================================

/// Marketing card and marketing tab summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MarketingSummary {
    pub agreement_count: i64,
    pub active_count: i64,
    /// Paid to doctors so far (an expense).
    pub total_paid: Money,
    pub total_pending: Money,
    pub expected_return_total: Money,
    pub return_value_total: Money,
    /// Agreements that need attention.
    pub review_count: i64,
    /// Return value as basis points of expected return.
    pub completion_rate_bps: i64,
}

impl MarketingSummary {
    pub fn compute(agreements: &[MarketingAgreement], today: NaiveDate) -> Self {
        let mut summary = MarketingSummary::default();
        for agreement in agreements {
            summary.agreement_count += 1;
            if agreement.status == AgreementStatus::Active {
                summary.active_count += 1;
            }
            summary.total_paid += agreement.paid_amount;
            summary.total_pending += agreement.pending_amount;
            summary.expected_return_total += agreement.expected_return;
            summary.return_value_total += agreement.return_value;
            if agreement.performance(today) == AgreementPerformance::Review {
                summary.review_count += 1;
            }
        }

        if summary.expected_return_total.is_positive() {
            let expected = summary.expected_return_total.paise() as i128;
            let returned = summary.return_value_total.paise() as i128;
            summary.completion_rate_bps = ((returned * 10_000 + expected / 2) / expected) as i64;
        }
        summary
    }
}

// =============================================================================
// Business Report
// =============================================================================

/// Which debts count toward the report's debt figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DebtType {
    Bank,
    Investor,
}

/// Filters accepted by the business report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportFilter {
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub product_category: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub debt_type: Option<DebtType>,
}

impl ReportFilter {
    /// Checks whether a date falls inside the (inclusive) range.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    fn matches_category(&self, category: Option<&str>) -> bool {
        match self.product_category.as_deref().filter(|c| !c.is_empty()) {
            Some(wanted) => category.map_or(false, |c| c.eq_ignore_ascii_case(wanted)),
            None => true,
        }
    }

    fn matches_transaction(&self, tx: &Transaction, categories: &HashMap<&str, Option<&str>>) -> bool {
        self.contains_date(tx.date)
            && self.kind.map_or(true, |k| tx.kind == k)
            && self
                .customer_id
                .as_deref()
                .filter(|c| !c.is_empty())
                .map_or(true, |c| tx.customer_id.as_deref() == Some(c))
            && self.matches_category(categories.get(tx.product_id.as_str()).copied().flatten())
    }

    fn includes_debt(&self, debt_type: DebtType) -> bool {
        self.debt_type.map_or(true, |t| t == debt_type)
    }
}

/// Everything the business report reads.
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub transactions: &'a [Transaction],
    pub products: &'a [Product],
    pub bank_debts: &'a [BankDebt],
    pub investors: &'a [InvestorDebt],
    pub agreements: &'a [MarketingAgreement],
}

/// Expense lines of the business report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseBreakdown {
    pub purchases: Money,
    pub cnf_commission: Money,
    pub transport: Money,
    pub marketing: Money,
    /// Monthly EMI plus payable ROI of active debts.
    pub debt_servicing: Money,
    pub total: Money,
}

/// A row of the top products / customers tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RankedEntry {
    /// Product id, or customer id / name for unlinked customers.
    pub key: String,
    pub name: String,
    pub quantity: i64,
    pub total: Money,
}

/// The filtered business report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessReport {
    pub revenue: Money,
    pub expenses: ExpenseBreakdown,
    pub profit: Money,
    pub stock_value: Money,
    /// Remaining principal of active debts.
    pub outstanding_debt: Money,
    /// Expected return of transactions plus agreements.
    pub expected_return: Money,
    pub transaction_count: i64,
    pub top_products: Vec<RankedEntry>,
    pub top_customers: Vec<RankedEntry>,
    pub low_stock: Vec<LowStockRow>,
    /// Newest first, capped at [`RECENT_TRANSACTION_LIMIT`].
    pub recent_transactions: Vec<Transaction>,
}

impl BusinessReport {
    pub fn compute(inputs: ReportInputs<'_>, filter: &ReportFilter, low_stock_threshold: i64) -> Self {
        let categories: HashMap<&str, Option<&str>> = inputs
            .products
            .iter()
            .map(|p| (p.id.as_str(), p.category.as_deref()))
            .collect();

        let mut transactions: Vec<&Transaction> = inputs
            .transactions
            .iter()
            .filter(|tx| filter.matches_transaction(tx, &categories))
            .collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));

        let mut revenue = Money::zero();
        let mut expenses = ExpenseBreakdown::default();
        let mut expected_return = Money::zero();
        for tx in &transactions {
            match tx.kind {
                TransactionKind::Sale => revenue += tx.total_amount,
                TransactionKind::Purchase => expenses.purchases += tx.total_amount,
            }
            expenses.cnf_commission += tx.cnf_commission;
            expenses.transport += tx.transport_expense;
            expected_return += tx.expected_return;
        }

        // The date range narrows transactions only; agreements always count
        for agreement in inputs.agreements {
            expenses.marketing += agreement.paid_amount;
            expected_return += agreement.expected_return;
        }

        let banks: &[BankDebt] = if filter.includes_debt(DebtType::Bank) { inputs.bank_debts } else { &[] };
        let investors: &[InvestorDebt] =
            if filter.includes_debt(DebtType::Investor) { inputs.investors } else { &[] };
        let debts = DebtSummary::compute(banks, investors);
        expenses.debt_servicing = debts.monthly_debt_expense;

        expenses.total = expenses.purchases
            + expenses.cnf_commission
            + expenses.transport
            + expenses.marketing
            + expenses.debt_servicing;

        let products: Vec<&Product> = inputs
            .products
            .iter()
            .filter(|p| p.is_active && filter.matches_category(p.category.as_deref()))
            .collect();
        let stock_value = products.iter().map(|p| p.stock_value()).sum();
        let low_stock = products
            .iter()
            .filter(|p| p.is_low_stock(low_stock_threshold))
            .map(|p| LowStockRow::from(*p))
            .collect();

        BusinessReport {
            revenue,
            profit: revenue - expenses.total,
            expenses,
            stock_value,
            outstanding_debt: debts.principal_outstanding,
            expected_return,
            transaction_count: transactions.len() as i64,
            top_products: top_products(&transactions, TOP_N),
            top_customers: top_customers(&transactions, TOP_N),
            low_stock,
            recent_transactions: transactions
                .iter()
                .take(RECENT_TRANSACTION_LIMIT)
                .map(|tx| (*tx).clone())
                .collect(),
        }
    }
}

/// Products ranked by sales total, highest first.
pub fn top_products(transactions: &[&Transaction], n: usize) -> Vec<RankedEntry> {
    rank_sales(transactions, n, |tx| (tx.product_id.clone(), tx.product_name.clone()))
}

/// Customers ranked by sales total, highest first.
///
/// Unlinked customers are grouped by their name snapshot.
pub fn top_customers(transactions: &[&Transaction], n: usize) -> Vec<RankedEntry> {
    rank_sales(transactions, n, |tx| {
        let key = tx.customer_id.clone().unwrap_or_else(|| tx.customer_name.clone());
        (key, tx.customer_name.clone())
    })
}

fn rank_sales<F>(transactions: &[&Transaction], n: usize, key_of: F) -> Vec<RankedEntry>
where
    F: Fn(&Transaction) -> (String, String),
{
    let mut totals: HashMap<String, RankedEntry> = HashMap::new();
    for tx in transactions.iter().filter(|tx| tx.kind == TransactionKind::Sale) {
        let (key, name) = key_of(tx);
        let entry = totals.entry(key.clone()).or_insert_with(|| RankedEntry {
            key,
            name,
            quantity: 0,
            total: Money::zero(),
        });
        entry.quantity += tx.quantity;
        entry.total += tx.total_amount;
    }

    let mut ranked: Vec<RankedEntry> = totals.into_values().collect();
    ranked.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(n);
    ranked
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentFrequency, PaymentStatus, Rate};
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(kind: FinanceKind, rupees: i64, on: NaiveDate) -> FinanceRecord {
        let now = Utc::now();
        FinanceRecord {
            id: format!("{}-{}", kind, rupees),
            kind,
            source: "Manual".to_string(),
            category: "General".to_string(),
            amount: Money::from_rupees(rupees),
            description: None,
            date: on,
            linked_tab: None,
            notes: None,
            reference: None,
            customer_id: None,
            transaction_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn product(id: &str, stock: i64, supplier: i64, category: &str) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            batch: format!("B{}", id),
            expiry: None,
            mrp: Money::from_rupees(supplier * 2),
            gst: Rate::from_bps(1200),
            retailer_price: Money::from_rupees(supplier + 50),
            stockist_price: Money::from_rupees(supplier + 20),
            supplier_price: Money::from_rupees(supplier),
            bonus_scheme: None,
            current_stock: stock,
            category: Some(category.to_string()),
            description: None,
            composition: None,
            packing: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn tx(product_id: &str, customer: &str, kind: TransactionKind, qty: i64, total: i64, on: NaiveDate) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: format!("{}-{}-{}", product_id, customer, total),
            customer_id: None,
            customer_name: customer.to_string(),
            product_id: product_id.to_string(),
            product_name: format!("Product {}", product_id),
            batch: "B1".to_string(),
            kind,
            quantity: qty,
            unit_price: Money::zero(),
            discount: Money::zero(),
            cnf_commission: Money::from_rupees(10),
            transport_expense: Money::from_rupees(5),
            total_amount: Money::from_rupees(total),
            expected_return_ratio: Rate::from_bps(1000),
            expected_return: Money::from_rupees(total / 10),
            payment_status: PaymentStatus::Paid,
            date: on,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn bank(emi: i64, remaining: i64, status: DebtStatus) -> BankDebt {
        let now = Utc::now();
        BankDebt {
            id: "bank".to_string(),
            bank_name: "SBI".to_string(),
            loan_amount: Money::from_rupees(remaining),
            start_date: date(2026, 1, 1),
            tenure_months: 12,
            interest_rate: Rate::from_bps(1200),
            monthly_emi: Money::from_rupees(emi),
            remaining_principal: Money::from_rupees(remaining),
            status,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn investor(roi: i64, remaining: i64, skipped: bool) -> InvestorDebt {
        let now = Utc::now();
        InvestorDebt {
            id: "inv".to_string(),
            investor_name: "R. Gupta".to_string(),
            principal_invested: Money::from_rupees(remaining),
            roi: Rate::from_bps(200),
            start_date: date(2026, 1, 1),
            skipped_roi: skipped,
            partial_withdrawal: Money::zero(),
            remaining_principal: Money::from_rupees(remaining),
            monthly_roi: Money::from_rupees(roi),
            status: DebtStatus::Active,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn agreement(paid: i64, expected: i64, returned: i64, status: AgreementStatus) -> MarketingAgreement {
        let now = Utc::now();
        MarketingAgreement {
            id: "agr".to_string(),
            doctor_name: "Dr. Sharma".to_string(),
            agreement_start: date(2026, 3, 1),
            agreement_end: date(2026, 12, 31),
            agreement_amount: Money::from_rupees(10_000),
            paid_amount: Money::from_rupees(paid),
            pending_amount: Money::from_rupees(10_000 - paid),
            expected_return: Money::from_rupees(expected),
            expected_return_ratio: Rate::zero(),
            return_value: Money::from_rupees(returned),
            status,
            payment_frequency: PaymentFrequency::Monthly,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_finance_summary() {
        let records = vec![
            record(FinanceKind::Income, 5_000, date(2025, 10, 1)),
            record(FinanceKind::Expense, 2_000, date(2025, 10, 2)),
            record(FinanceKind::Income, 7_000, date(2025, 10, 15)),
            record(FinanceKind::Expense, 2_500, date(2025, 10, 18)),
        ];
        let summary = FinanceSummary::from_records(&records);
        assert_eq!(summary.total_income, Money::from_rupees(12_000));
        assert_eq!(summary.total_expenses, Money::from_rupees(4_500));
        assert_eq!(summary.net_profit, Money::from_rupees(7_500));
        assert_eq!(summary.profit_margin_bps, 6_250);
        assert_eq!(summary.record_count, 4);
    }

    #[test]
    fn test_monthly_series_keeps_latest_months() {
        let records: Vec<FinanceRecord> = (1..=8)
            .map(|m| record(FinanceKind::Income, 100 * m as i64, date(2026, m, 10)))
            .chain(std::iter::once(record(FinanceKind::Expense, 50, date(2026, 8, 11))))
            .collect();

        let series = monthly_series(&records, 6);
        assert_eq!(series.len(), 6);
        assert_eq!(series[0].month, "2026-03");
        let last = series.last().unwrap();
        assert_eq!(last.month, "2026-08");
        assert_eq!(last.income, Money::from_rupees(800));
        assert_eq!(last.profit, Money::from_rupees(750));
    }

    #[test]
    fn test_stock_summary() {
        let mut inactive = product("c", 100, 10, "Injectables");
        inactive.is_active = false;
        let products = vec![product("a", 120, 190, "Women's Health"), product("b", 5, 85, "Cough & Cold"), inactive];

        let summary = StockSummary::compute(&products, 10);
        assert_eq!(summary.product_count, 2);
        assert_eq!(summary.total_units, 125);
        assert_eq!(summary.stock_value, Money::from_rupees(120 * 190 + 5 * 85));
        assert_eq!(summary.low_stock_count, 1);
    }

    #[test]
    fn test_debt_summary_excludes_skipped_roi_from_expense() {
        let banks = vec![bank(8_885, 90_000, DebtStatus::Active), bank(1_000, 5_000, DebtStatus::Closed)];
        let investors = vec![investor(3_000, 150_000, false), investor(1_600, 16_000, true)];

        let summary = DebtSummary::compute(&banks, &investors);
        assert_eq!(summary.active_count, 3);
        assert_eq!(summary.principal_outstanding, Money::from_rupees(256_000));
        assert_eq!(summary.monthly_obligation, Money::from_rupees(8_885 + 3_000 + 1_600));
        assert_eq!(summary.monthly_debt_expense, Money::from_rupees(8_885 + 3_000));
    }

    #[test]
    fn test_marketing_summary() {
        let today = date(2026, 10, 18);
        let agreements = vec![
            agreement(2_000, 20_000, 15_000, AgreementStatus::Active),
            agreement(1_500, 10_000, 5_000, AgreementStatus::Discontinued),
        ];
        let summary = MarketingSummary::compute(&agreements, today);
        assert_eq!(summary.agreement_count, 2);
        assert_eq!(summary.active_count, 1);
        assert_eq!(summary.total_paid, Money::from_rupees(3_500));
        assert_eq!(summary.review_count, 1);
        assert_eq!(summary.completion_rate_bps, 6_667);
    }

    #[test]
    fn test_business_report_filters_and_rankings() {
        let products = vec![product("a", 3, 100, "Neuro Health"), product("b", 50, 200, "Gastrointestinal")];
        let transactions = vec![
            tx("a", "City Pharma", TransactionKind::Sale, 10, 3_000, date(2026, 9, 1)),
            tx("b", "City Pharma", TransactionKind::Sale, 5, 1_000, date(2026, 9, 2)),
            tx("b", "Apollo", TransactionKind::Sale, 20, 5_000, date(2026, 9, 3)),
            tx("a", "Supplier", TransactionKind::Purchase, 40, 4_000, date(2026, 9, 4)),
            tx("a", "Old", TransactionKind::Sale, 1, 999, date(2025, 1, 1)),
        ];
        let banks = vec![bank(1_000, 50_000, DebtStatus::Active)];
        let investors = vec![investor(500, 25_000, false)];
        let agreements = vec![agreement(2_000, 20_000, 0, AgreementStatus::Active)];
        let inputs = ReportInputs {
            transactions: &transactions,
            products: &products,
            bank_debts: &banks,
            investors: &investors,
            agreements: &agreements,
        };

        let filter = ReportFilter {
            from: Some(date(2026, 1, 1)),
            ..ReportFilter::default()
        };
        let report = BusinessReport::compute(inputs, &filter, 10);

        assert_eq!(report.transaction_count, 4);
        assert_eq!(report.revenue, Money::from_rupees(9_000));
        assert_eq!(report.expenses.purchases, Money::from_rupees(4_000));
        assert_eq!(report.expenses.cnf_commission, Money::from_rupees(40));
        assert_eq!(report.expenses.transport, Money::from_rupees(20));
        assert_eq!(report.expenses.marketing, Money::from_rupees(2_000));
        assert_eq!(report.expenses.debt_servicing, Money::from_rupees(1_500));
        assert_eq!(report.expenses.total, Money::from_rupees(7_560));
        assert_eq!(report.profit, Money::from_rupees(1_440));
        assert_eq!(report.outstanding_debt, Money::from_rupees(75_000));
        assert_eq!(report.stock_value, Money::from_rupees(3 * 100 + 50 * 200));
        assert_eq!(report.expected_return, Money::from_rupees(300 + 100 + 500 + 400 + 20_000));

        assert_eq!(report.top_products[0].key, "b");
        assert_eq!(report.top_products[0].total, Money::from_rupees(6_000));
        assert_eq!(report.top_customers[0].name, "Apollo");
        assert_eq!(report.low_stock.len(), 1);
        assert_eq!(report.recent_transactions[0].date, date(2026, 9, 4));

        // Category filter narrows transactions and stock; debt type narrows debts
        let filter = ReportFilter {
            product_category: Some("neuro health".to_string()),
            kind: Some(TransactionKind::Sale),
            debt_type: Some(DebtType::Investor),
            ..ReportFilter::default()
        };
        let report = BusinessReport::compute(inputs, &filter, 10);
        assert_eq!(report.transaction_count, 2);
        assert_eq!(report.revenue, Money::from_rupees(3_999));
        assert_eq!(report.stock_value, Money::from_rupees(300));
        assert_eq!(report.outstanding_debt, Money::from_rupees(25_000));

        // A range ending before the agreement starts still counts its spend
        let filter = ReportFilter {
            to: Some(date(2026, 1, 31)),
            ..ReportFilter::default()
        };
        let report = BusinessReport::compute(inputs, &filter, 10);
        assert_eq!(report.transaction_count, 1);
        assert_eq!(report.expenses.marketing, Money::from_rupees(2_000));
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label(date(2026, 10, 18)), "October 2026");
    }
}
