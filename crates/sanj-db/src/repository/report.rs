//! # Report Repository
//!
//! Read-side aggregation across tabs plus the saved monthly snapshots.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  finance ─────┐                                                         │
//! │  products ────┤                                                         │
//! │  transactions ├──► load rows ──► sanj_core::reports ──► Dashboard       │
//! │  debts ───────┤                  (pure aggregation)     BusinessReport  │
//! │  marketing ───┘                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::debt::DebtRepository;
use crate::repository::finance::FinanceRepository;
use crate::repository::marketing::MarketingRepository;
use crate::repository::product::ProductRepository;
use crate::repository::transaction::TransactionRepository;
use sanj_core::reports::{
    month_label, monthly_series, BusinessReport, DebtSummary, FinanceSummary, MarketingSummary, MonthlyFigures,
    ReportFilter, ReportInputs, StockSummary,
};
use sanj_core::ReportSnapshot;

const UNKNOWN_EXPORTER: &str = "Unknown";

/// Everything on the dashboard tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub finance: FinanceSummary,
    pub monthly: Vec<MonthlyFigures>,
    pub stock: StockSummary,
    pub debts: DebtSummary,
    pub marketing: MarketingSummary,
}

/// Repository for reports and finance snapshots.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Saves the current ledger totals under this month's label
    /// ("October 2026").
    pub async fn export_snapshot(&self, today: NaiveDate, exported_by: Option<&str>) -> DbResult<ReportSnapshot> {
        let summary = FinanceRepository::new(self.pool.clone()).summary(None, None).await?;

        let snapshot = ReportSnapshot {
            id: Uuid::new_v4().to_string(),
            month: month_label(today),
            total_income: summary.total_income,
            total_expenses: summary.total_expenses,
            net_profit: summary.net_profit,
            record_count: summary.record_count,
            exported_by: exported_by
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .unwrap_or(UNKNOWN_EXPORTER)
                .to_string(),
            exported_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO report_snapshots (
                id, month, total_income, total_expenses, net_profit,
                record_count, exported_by, exported_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&snapshot.id)
        .bind(&snapshot.month)
        .bind(snapshot.total_income)
        .bind(snapshot.total_expenses)
        .bind(snapshot.net_profit)
        .bind(snapshot.record_count)
        .bind(&snapshot.exported_by)
        .bind(snapshot.exported_at)
        .execute(&self.pool)
        .await?;

        info!(month = %snapshot.month, records = snapshot.record_count, "Finance snapshot exported");
        Ok(snapshot)
    }

    /// Saved snapshots, newest first.
    pub async fn list_snapshots(&self) -> DbResult<Vec<ReportSnapshot>> {
        let snapshots =
            sqlx::query_as::<_, ReportSnapshot>("SELECT * FROM report_snapshots ORDER BY exported_at DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(snapshots)
    }

    /// Dashboard cards and the six-month chart.
    pub async fn dashboard(&self, today: NaiveDate, low_stock_threshold: i64, months: usize) -> DbResult<Dashboard> {
        let finance = FinanceRepository::new(self.pool.clone());
        let records = finance.all(None, None).await?;
        let products = ProductRepository::new(self.pool.clone()).list(None).await?;
        let debts = DebtRepository::new(self.pool.clone()).summary().await?;
        let marketing = MarketingRepository::new(self.pool.clone()).summary(today).await?;

        Ok(Dashboard {
            finance: FinanceSummary::from_records(&records),
            monthly: monthly_series(&records, months),
            stock: StockSummary::compute(&products, low_stock_threshold),
            debts,
            marketing,
        })
    }

    /// The filtered business report.
    pub async fn business_report(&self, filter: &ReportFilter, low_stock_threshold: i64) -> DbResult<BusinessReport> {
        let transactions = TransactionRepository::new(self.pool.clone()).all().await?;
        let products = ProductRepository::new(self.pool.clone()).list(None).await?;
        let debts = DebtRepository::new(self.pool.clone());
        let bank_debts = debts.list_banks().await?;
        let investors = debts.list_investors().await?;
        let agreements = MarketingRepository::new(self.pool.clone()).all().await?;

        let inputs = ReportInputs {
            transactions: &transactions,
            products: &products,
            bank_debts: &bank_debts,
            investors: &investors,
            agreements: &agreements,
        };

        Ok(BusinessReport::compute(inputs, filter, low_stock_threshold))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{date, db, product_input};
    use sanj_core::inputs::{FinanceInput, StockSaleInput};
    use sanj_core::{FinanceKind, Money};

    fn expense(rupees: i64) -> FinanceInput {
        FinanceInput {
            kind: FinanceKind::Expense,
            source: "Office".to_string(),
            category: "Rent".to_string(),
            amount: Money::from_rupees(rupees),
            description: None,
            date: date(2026, 10, 1),
            linked_tab: None,
            notes: None,
            reference: None,
            customer_id: None,
        }
    }

    #[tokio::test]
    async fn test_export_snapshot_labels_month() {
        let db = db().await;
        db.finance().create(&expense(5_000)).await.unwrap();

        let snapshot = db.reports().export_snapshot(date(2026, 10, 18), None).await.unwrap();
        assert_eq!(snapshot.month, "October 2026");
        assert_eq!(snapshot.total_expenses, Money::from_rupees(5_000));
        assert_eq!(snapshot.net_profit, Money::from_rupees(-5_000));
        assert_eq!(snapshot.record_count, 1);
        assert_eq!(snapshot.exported_by, "Unknown");

        db.reports().export_snapshot(date(2026, 11, 2), Some("owner@sanj.in")).await.unwrap();
        let snapshots = db.reports().list_snapshots().await.unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].month, "November 2026");
    }

    #[tokio::test]
    async fn test_dashboard_reflects_stock_sale() {
        let db = db().await;
        let product = db.products().create(&product_input("SAZ LQ 10 CAP", "SLQ2307", 12)).await.unwrap();
        db.stock()
            .record_sale(&StockSaleInput {
                product_id: product.id.clone(),
                batch: "SLQ2307".to_string(),
                quantity: 4,
                unit_price: Money::from_rupees(160),
                customer: None,
                date: date(2026, 10, 10),
                reference: None,
            })
            .await
            .unwrap();

        let dashboard = db.reports().dashboard(date(2026, 10, 18), 10, 6).await.unwrap();
        assert_eq!(dashboard.finance.total_income, Money::from_rupees(640));
        assert_eq!(dashboard.monthly.len(), 1);
        assert_eq!(dashboard.stock.total_units, 8);
        assert_eq!(dashboard.stock.low_stock_count, 1);
        assert_eq!(dashboard.debts.active_count, 0);
    }

    #[tokio::test]
    async fn test_business_report_on_empty_database() {
        let db = db().await;
        let report = db.reports().business_report(&ReportFilter::default(), 10).await.unwrap();
        assert_eq!(report.transaction_count, 0);
        assert!(report.top_products.is_empty());
        assert_eq!(report.profit, Money::zero());
    }
}
