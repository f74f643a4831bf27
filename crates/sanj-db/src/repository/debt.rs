//! # Debt Repository
//!
//! Bank loans (repaid by EMI) and investors (paid a monthly ROI).
//!
//! Derived columns are always recomputed on save: a bank loan's EMI from
//! amount, rate and tenure; an investor's remaining principal and monthly
//! ROI from principal, withdrawal and rate. Saving an active debt appends
//! this month's servicing cost to the finance ledger.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::finance::{self, LedgerEntry};
use crate::repository::product::clean;
use sanj_core::calc;
use sanj_core::inputs::{BankDebtInput, InvestorInput};
use sanj_core::reports::DebtSummary;
use sanj_core::{BankDebt, DebtStatus, FinanceKind, InvestorDebt, Money};

const SOURCE: &str = "Debts";
const LINKED_TAB: &str = "debts";
const CATEGORY: &str = "Debt Servicing";

/// Repository for bank loans and investors.
#[derive(Debug, Clone)]
pub struct DebtRepository {
    pool: SqlitePool,
}

impl DebtRepository {
    /// Creates a new DebtRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DebtRepository { pool }
    }

    // =========================================================================
    // Bank loans
    // =========================================================================

    /// Records a bank loan.
    ///
    /// Remaining principal defaults to the full loan amount.
    pub async fn create_bank(&self, input: &BankDebtInput) -> DbResult<BankDebt> {
        input.validate()?;

        let now = Utc::now();
        let debt = BankDebt {
            id: Uuid::new_v4().to_string(),
            bank_name: input.bank_name.trim().to_string(),
            loan_amount: input.loan_amount,
            start_date: input.start_date,
            tenure_months: input.tenure_months,
            interest_rate: input.interest_rate,
            monthly_emi: calc::calculate_emi(input.loan_amount, input.interest_rate, input.tenure_months)?,
            remaining_principal: input.remaining_principal.unwrap_or(input.loan_amount),
            status: input.status,
            notes: clean(&input.notes),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %debt.id, bank = %debt.bank_name, emi = %debt.monthly_emi, "Creating bank debt");

        let mut db_tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO bank_debts (
                id, bank_name, loan_amount, start_date, tenure_months, interest_rate,
                monthly_emi, remaining_principal, status, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&debt.id)
        .bind(&debt.bank_name)
        .bind(debt.loan_amount)
        .bind(debt.start_date)
        .bind(debt.tenure_months)
        .bind(debt.interest_rate)
        .bind(debt.monthly_emi)
        .bind(debt.remaining_principal)
        .bind(debt.status)
        .bind(&debt.notes)
        .bind(debt.created_at)
        .bind(debt.updated_at)
        .execute(&mut *db_tx)
        .await?;

        post_emi(&mut *db_tx, &debt).await?;
        db_tx.commit().await?;

        info!(id = %debt.id, "Bank debt created");
        Ok(debt)
    }

    /// Updates a bank loan and recomputes its EMI.
    ///
    /// Remaining principal is kept when the payload leaves it out.
    pub async fn update_bank(&self, id: &str, input: &BankDebtInput) -> DbResult<BankDebt> {
        input.validate()?;

        let existing = self
            .get_bank(id)
            .await?
            .ok_or_else(|| DbError::not_found("BankDebt", id))?;

        let debt = BankDebt {
            bank_name: input.bank_name.trim().to_string(),
            loan_amount: input.loan_amount,
            start_date: input.start_date,
            tenure_months: input.tenure_months,
            interest_rate: input.interest_rate,
            monthly_emi: calc::calculate_emi(input.loan_amount, input.interest_rate, input.tenure_months)?,
            remaining_principal: input
                .remaining_principal
                .unwrap_or_else(|| existing.remaining_principal.min(input.loan_amount)),
            status: input.status,
            notes: clean(&input.notes),
            updated_at: Utc::now(),
            ..existing
        };

        let mut db_tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE bank_debts SET
                bank_name = ?2, loan_amount = ?3, start_date = ?4, tenure_months = ?5,
                interest_rate = ?6, monthly_emi = ?7, remaining_principal = ?8,
                status = ?9, notes = ?10, updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&debt.id)
        .bind(&debt.bank_name)
        .bind(debt.loan_amount)
        .bind(debt.start_date)
        .bind(debt.tenure_months)
        .bind(debt.interest_rate)
        .bind(debt.monthly_emi)
        .bind(debt.remaining_principal)
        .bind(debt.status)
        .bind(&debt.notes)
        .bind(debt.updated_at)
        .execute(&mut *db_tx)
        .await?;

        post_emi(&mut *db_tx, &debt).await?;
        db_tx.commit().await?;

        Ok(debt)
    }

    /// Gets a bank loan by ID.
    pub async fn get_bank(&self, id: &str) -> DbResult<Option<BankDebt>> {
        let debt = sqlx::query_as::<_, BankDebt>("SELECT * FROM bank_debts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(debt)
    }

    /// Lists bank loans, newest first.
    pub async fn list_banks(&self) -> DbResult<Vec<BankDebt>> {
        let debts = sqlx::query_as::<_, BankDebt>("SELECT * FROM bank_debts ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(debts)
    }

    /// Deletes a bank loan. Finance rows already posted stay.
    pub async fn delete_bank(&self, id: &str) -> DbResult<()> {
        delete_row(&self.pool, "bank_debts", "BankDebt", id).await
    }

    // =========================================================================
    // Investors
    // =========================================================================

    /// Records an investor.
    pub async fn create_investor(&self, input: &InvestorInput) -> DbResult<InvestorDebt> {
        input.validate()?;

        let now = Utc::now();
        let position = calc::investor_position(
            input.principal_invested,
            input.roi,
            input.partial_withdrawal,
            input.skipped_roi,
        );

        let investor = InvestorDebt {
            id: Uuid::new_v4().to_string(),
            investor_name: input.investor_name.trim().to_string(),
            principal_invested: input.principal_invested,
            roi: input.roi,
            start_date: input.start_date,
            skipped_roi: input.skipped_roi,
            partial_withdrawal: input.partial_withdrawal,
            remaining_principal: position.remaining_principal,
            monthly_roi: position.monthly_roi,
            status: input.status,
            notes: clean(&input.notes),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %investor.id, investor = %investor.investor_name, "Creating investor");

        let mut db_tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO investor_debts (
                id, investor_name, principal_invested, roi, start_date, skipped_roi,
                partial_withdrawal, remaining_principal, monthly_roi, status, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&investor.id)
        .bind(&investor.investor_name)
        .bind(investor.principal_invested)
        .bind(investor.roi)
        .bind(investor.start_date)
        .bind(investor.skipped_roi)
        .bind(investor.partial_withdrawal)
        .bind(investor.remaining_principal)
        .bind(investor.monthly_roi)
        .bind(investor.status)
        .bind(&investor.notes)
        .bind(investor.created_at)
        .bind(investor.updated_at)
        .execute(&mut *db_tx)
        .await?;

        post_roi(&mut *db_tx, &investor).await?;
        db_tx.commit().await?;

        info!(id = %investor.id, "Investor created");
        Ok(investor)
    }

    /// Updates an investor and recomputes remaining principal and ROI.
    pub async fn update_investor(&self, id: &str, input: &InvestorInput) -> DbResult<InvestorDebt> {
        input.validate()?;

        let existing = self
            .get_investor(id)
            .await?
            .ok_or_else(|| DbError::not_found("InvestorDebt", id))?;

        let position = calc::investor_position(
            input.principal_invested,
            input.roi,
            input.partial_withdrawal,
            input.skipped_roi,
        );

        let investor = InvestorDebt {
            investor_name: input.investor_name.trim().to_string(),
            principal_invested: input.principal_invested,
            roi: input.roi,
            start_date: input.start_date,
            skipped_roi: input.skipped_roi,
            partial_withdrawal: input.partial_withdrawal,
            remaining_principal: position.remaining_principal,
            monthly_roi: position.monthly_roi,
            status: input.status,
            notes: clean(&input.notes),
            updated_at: Utc::now(),
            ..existing
        };

        let mut db_tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE investor_debts SET
                investor_name = ?2, principal_invested = ?3, roi = ?4, start_date = ?5,
                skipped_roi = ?6, partial_withdrawal = ?7, remaining_principal = ?8,
                monthly_roi = ?9, status = ?10, notes = ?11, updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&investor.id)
        .bind(&investor.investor_name)
        .bind(investor.principal_invested)
        .bind(investor.roi)
        .bind(investor.start_date)
        .bind(investor.skipped_roi)
        .bind(investor.partial_withdrawal)
        .bind(investor.remaining_principal)
        .bind(investor.monthly_roi)
        .bind(investor.status)
        .bind(&investor.notes)
        .bind(investor.updated_at)
        .execute(&mut *db_tx)
        .await?;

        post_roi(&mut *db_tx, &investor).await?;
        db_tx.commit().await?;

        Ok(investor)
    }

    /// Gets an investor by ID.
    pub async fn get_investor(&self, id: &str) -> DbResult<Option<InvestorDebt>> {
        let investor = sqlx::query_as::<_, InvestorDebt>("SELECT * FROM investor_debts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(investor)
    }

    /// Lists investors, newest first.
    pub async fn list_investors(&self) -> DbResult<Vec<InvestorDebt>> {
        let investors = sqlx::query_as::<_, InvestorDebt>("SELECT * FROM investor_debts ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(investors)
    }

    /// Deletes an investor.
    pub async fn delete_investor(&self, id: &str) -> DbResult<()> {
        delete_row(&self.pool, "investor_debts", "InvestorDebt", id).await
    }

    /// Totals across banks and investors.
    pub async fn summary(&self) -> DbResult<DebtSummary> {
        let banks = self.list_banks().await?;
        let investors = self.list_investors().await?;
        Ok(DebtSummary::compute(&banks, &investors))
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn post_emi(conn: &mut SqliteConnection, debt: &BankDebt) -> DbResult<()> {
    if debt.status != DebtStatus::Active {
        return Ok(());
    }

    post_servicing(
        conn,
        debt.monthly_emi,
        format!("EMI Payment - {}", debt.bank_name),
        format!("BANK_{}", debt.bank_name),
    )
    .await
}

async fn post_roi(conn: &mut SqliteConnection, investor: &InvestorDebt) -> DbResult<()> {
    if investor.status != DebtStatus::Active || investor.skipped_roi {
        return Ok(());
    }

    post_servicing(
        conn,
        investor.monthly_roi,
        format!("ROI Payment - {}", investor.investor_name),
        format!("INV_{}", investor.investor_name),
    )
    .await
}

async fn post_servicing(conn: &mut SqliteConnection, amount: Money, description: String, reference: String) -> DbResult<()> {
    finance::post_entry(
        conn,
        LedgerEntry {
            kind: FinanceKind::Expense,
            source: SOURCE,
            category: CATEGORY,
            amount,
            description,
            date: Utc::now().date_naive(),
            linked_tab: LINKED_TAB,
            reference: Some(reference),
            customer_id: None,
            transaction_id: None,
        },
    )
    .await?;
    Ok(())
}

async fn delete_row(pool: &SqlitePool, table: &str, entity: &str, id: &str) -> DbResult<()> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?1", table))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(entity, id));
    }

    info!(entity = %entity, id = %id, "Debt deleted");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::finance::FinanceQuery;
    use crate::repository::test_support::{date, db};
    use sanj_core::{CoreError, Rate};

    fn bank(status: DebtStatus) -> BankDebtInput {
        BankDebtInput {
            bank_name: "HDFC Bank".to_string(),
            loan_amount: Money::from_rupees(100_000),
            start_date: date(2026, 1, 1),
            tenure_months: 12,
            interest_rate: Rate::from_bps(1200),
            remaining_principal: None,
            status,
            notes: None,
        }
    }

    fn investor(skipped: bool) -> InvestorInput {
        InvestorInput {
            investor_name: "R. Sharma".to_string(),
            principal_invested: Money::from_rupees(200_000),
            roi: Rate::from_bps(200),
            start_date: date(2026, 2, 1),
            skipped_roi: skipped,
            partial_withdrawal: Money::from_rupees(50_000),
            status: DebtStatus::Active,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_bank_debt_emi_and_finance_row() {
        let db = db().await;
        let debt = db.debts().create_bank(&bank(DebtStatus::Active)).await.unwrap();

        assert_eq!(debt.monthly_emi, Money::from_paise(888_488));
        assert_eq!(debt.remaining_principal, Money::from_rupees(100_000));

        let records = db.finance().list(&FinanceQuery::default()).await.unwrap().records;
        assert_eq!(records.len(), 1);
        let row = &records[0];
        assert_eq!(row.category, "Debt Servicing");
        assert_eq!(row.kind, FinanceKind::Expense);
        assert_eq!(row.amount, Money::from_paise(888_488));
        assert_eq!(row.description.as_deref(), Some("EMI Payment - HDFC Bank"));
        assert_eq!(row.reference.as_deref(), Some("BANK_HDFC Bank"));
        assert_eq!(row.linked_tab.as_deref(), Some("debts"));
    }

    #[tokio::test]
    async fn test_closed_debt_posts_nothing_and_update_recomputes() {
        let db = db().await;
        let debt = db.debts().create_bank(&bank(DebtStatus::Closed)).await.unwrap();
        assert_eq!(db.finance().list(&FinanceQuery::default()).await.unwrap().total_count, 0);

        let mut edited = bank(DebtStatus::Closed);
        edited.interest_rate = Rate::zero();
        edited.remaining_principal = Some(Money::from_rupees(40_000));
        let updated = db.debts().update_bank(&debt.id, &edited).await.unwrap();
        assert_eq!(updated.monthly_emi, Money::from_paise(833_333));
        assert_eq!(updated.remaining_principal, Money::from_rupees(40_000));

        let mut zero_tenure = bank(DebtStatus::Active);
        zero_tenure.tenure_months = 0;
        let result = db.debts().update_bank(&debt.id, &zero_tenure).await;
        assert!(matches!(result, Err(DbError::Core(CoreError::Validation(_)))));
    }

    #[tokio::test]
    async fn test_investor_position_and_skipped_roi() {
        let db = db().await;
        let paid = db.debts().create_investor(&investor(false)).await.unwrap();
        assert_eq!(paid.remaining_principal, Money::from_rupees(150_000));
        assert_eq!(paid.monthly_roi, Money::from_rupees(3_000));

        let skipped = db.debts().create_investor(&investor(true)).await.unwrap();
        assert_eq!(skipped.monthly_roi, Money::from_rupees(3_000));

        let records = db.finance().list(&FinanceQuery::default()).await.unwrap().records;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description.as_deref(), Some("ROI Payment - R. Sharma"));
        assert_eq!(records[0].reference.as_deref(), Some("INV_R. Sharma"));

        assert_eq!(db.debts().list_investors().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_summary_and_delete() {
        let db = db().await;
        let debt = db.debts().create_bank(&bank(DebtStatus::Active)).await.unwrap();
        let inv = db.debts().create_investor(&investor(true)).await.unwrap();

        let summary = db.debts().summary().await.unwrap();
        assert_eq!(summary.active_count, 2);
        assert_eq!(summary.monthly_emi_total, Money::from_paise(888_488));

        db.debts().delete_bank(&debt.id).await.unwrap();
        db.debts().delete_investor(&inv.id).await.unwrap();
        assert!(db.debts().list_banks().await.unwrap().is_empty());

        let missing = db.debts().delete_bank(&debt.id).await;
        assert!(matches!(missing, Err(DbError::NotFound { .. })));
    }
}
