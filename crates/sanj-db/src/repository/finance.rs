//! # Finance Repository
//!
//! The income / expense ledger. Rows come from two places:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Manual entry (finance tab) ──────────────► FinanceRepository::create   │
//! │                                                                         │
//! │  Transactions  ─┐                                                       │
//! │  Stock ledger  ─┼─► LedgerEntry ──► insert_record (same SQL tx as the   │
//! │  Debts         ─┘                    write that caused it)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows linked to a transaction (`transaction_id`) are owned by it: editing
//! or deleting the transaction replaces or removes them.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product::like_pattern;
use sanj_core::inputs::FinanceInput;
use sanj_core::reports::{monthly_series, FinanceSummary, MonthlyFigures};
use sanj_core::validation::validate_page;
use sanj_core::{FinanceKind, FinanceRecord, Money, DEFAULT_PAGE_SIZE};

// =============================================================================
// Query / Page
// =============================================================================

/// Filters for the finance table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinanceQuery {
    #[serde(default)]
    pub kind: Option<FinanceKind>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    /// Matched against source, category, description, notes, linked tab
    /// and the amount in rupees.
    #[serde(default)]
    pub search: Option<String>,
    /// 1-based.
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// One page of finance records.
#[derive(Debug, Clone, Serialize)]
pub struct FinancePage {
    pub records: Vec<FinanceRecord>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: i64,
    pub page_count: u32,
}

// =============================================================================
// Ledger rows written by other repositories
// =============================================================================

/// A ledger row produced as a side effect of another write.
#[derive(Debug, Clone)]
pub(crate) struct LedgerEntry<'a> {
    pub kind: FinanceKind,
    pub source: &'a str,
    pub category: &'a str,
    pub amount: Money,
    pub description: String,
    pub date: NaiveDate,
    pub linked_tab: &'a str,
    pub reference: Option<String>,
    pub customer_id: Option<String>,
    pub transaction_id: Option<String>,
}

impl LedgerEntry<'_> {
    pub(crate) fn into_record(self) -> FinanceRecord {
        let now = Utc::now();
        FinanceRecord {
            id: Uuid::new_v4().to_string(),
            kind: self.kind,
            source: self.source.to_string(),
            category: self.category.to_string(),
            amount: self.amount,
            description: Some(self.description),
            date: self.date,
            linked_tab: Some(self.linked_tab.to_string()),
            notes: None,
            reference: self.reference,
            customer_id: self.customer_id,
            transaction_id: self.transaction_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Inserts a ledger row on an open connection.
pub(crate) async fn insert_record(conn: &mut SqliteConnection, record: &FinanceRecord) -> DbResult<()> {
    debug!(
        id = %record.id,
        kind = %record.kind,
        category = %record.category,
        amount = %record.amount,
        "Inserting finance record"
    );

    sqlx::query(
        r#"
        INSERT INTO finance_records (
            id, kind, source, category, amount, description, date,
            linked_tab, notes, reference, customer_id, transaction_id,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11, ?12,
            ?13, ?14
        )
        "#,
    )
    .bind(&record.id)
    .bind(record.kind)
    .bind(&record.source)
    .bind(&record.category)
    .bind(record.amount)
    .bind(&record.description)
    .bind(record.date)
    .bind(&record.linked_tab)
    .bind(&record.notes)
    .bind(&record.reference)
    .bind(&record.customer_id)
    .bind(&record.transaction_id)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts a side-effect row unless its amount is zero.
pub(crate) async fn post_entry(conn: &mut SqliteConnection, entry: LedgerEntry<'_>) -> DbResult<Option<FinanceRecord>> {
    if !entry.amount.is_positive() {
        return Ok(None);
    }
    let record = entry.into_record();
    insert_record(conn, &record).await?;
    Ok(Some(record))
}

/// Removes every ledger row owned by a transaction.
pub(crate) async fn delete_for_transaction(conn: &mut SqliteConnection, transaction_id: &str) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM finance_records WHERE transaction_id = ?1")
        .bind(transaction_id)
        .execute(&mut *conn)
        .await?;

    debug!(transaction_id = %transaction_id, removed = result.rows_affected(), "Removed linked finance records");
    Ok(result.rows_affected())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the finance ledger.
#[derive(Debug, Clone)]
pub struct FinanceRepository {
    pool: SqlitePool,
}

impl FinanceRepository {
    /// Creates a new FinanceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FinanceRepository { pool }
    }

    /// Records a manual income or expense.
    pub async fn create(&self, input: &FinanceInput) -> DbResult<FinanceRecord> {
        input.validate()?;

        let now = Utc::now();
        let record = FinanceRecord {
            id: Uuid::new_v4().to_string(),
            kind: input.kind,
            source: input.source.trim().to_string(),
            category: input.category.trim().to_string(),
            amount: input.amount,
            description: input.description.clone(),
            date: input.date,
            linked_tab: input.linked_tab.clone().or_else(|| Some("finance".to_string())),
            notes: input.notes.clone(),
            reference: input.reference.clone(),
            customer_id: input.customer_id.clone(),
            transaction_id: None,
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.pool.acquire().await?;
        insert_record(&mut *conn, &record).await?;
        Ok(record)
    }

    /// Gets a record by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<FinanceRecord>> {
        let record = sqlx::query_as::<_, FinanceRecord>("SELECT * FROM finance_records WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Edits a manual record.
    ///
    /// Rows owned by a transaction are rejected; edit the transaction instead.
    pub async fn update(&self, id: &str, input: &FinanceInput) -> DbResult<FinanceRecord> {
        input.validate()?;

        let existing = self.get(id).await?.ok_or_else(|| DbError::not_found("Finance record", id))?;
        if existing.transaction_id.is_some() {
            return Err(sanj_core::CoreError::Conflict {
                reason: "record is generated by a transaction; edit the transaction instead".to_string(),
            }
            .into());
        }

        debug!(id = %id, "Updating finance record");

        sqlx::query(
            r#"
            UPDATE finance_records SET
                kind = ?2,
                source = ?3,
                category = ?4,
                amount = ?5,
                description = ?6,
                date = ?7,
                linked_tab = ?8,
                notes = ?9,
                reference = ?10,
                customer_id = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.kind)
        .bind(input.source.trim())
        .bind(input.category.trim())
        .bind(input.amount)
        .bind(&input.description)
        .bind(input.date)
        .bind(input.linked_tab.as_deref().or(existing.linked_tab.as_deref()))
        .bind(&input.notes)
        .bind(&input.reference)
        .bind(&input.customer_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get(id).await?.ok_or_else(|| DbError::not_found("Finance record", id))
    }

    /// Deletes a record.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting finance record");

        let result = sqlx::query("DELETE FROM finance_records WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Finance record", id));
        }

        Ok(())
    }

    /// One page of records matching `query`, newest date first.
    pub async fn list(&self, query: &FinanceQuery) -> DbResult<FinancePage> {
        let page = query.page.unwrap_or(1);
        let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        validate_page(page, page_size)?;

        let pattern = like_pattern(query.search.as_deref())?;
        let kind = query.kind.map(|k| k.as_str());

        const FILTER: &str = r#"
            WHERE (?1 IS NULL OR kind = ?1)
              AND (?2 IS NULL OR date >= ?2)
              AND (?3 IS NULL OR date <= ?3)
              AND (?4 IS NULL
                   OR source LIKE ?4
                   OR category LIKE ?4
                   OR IFNULL(description, '') LIKE ?4
                   OR IFNULL(notes, '') LIKE ?4
                   OR IFNULL(linked_tab, '') LIKE ?4
                   OR printf('%.2f', amount / 100.0) LIKE ?4)
        "#;

        let total_count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM finance_records {}", FILTER))
            .bind(kind)
            .bind(query.from)
            .bind(query.to)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let offset = i64::from(page - 1) * i64::from(page_size);
        let records = sqlx::query_as::<_, FinanceRecord>(&format!(
            "SELECT * FROM finance_records {} ORDER BY date DESC, created_at DESC LIMIT ?5 OFFSET ?6",
            FILTER
        ))
        .bind(kind)
        .bind(query.from)
        .bind(query.to)
        .bind(&pattern)
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let page_count = ((total_count + i64::from(page_size) - 1) / i64::from(page_size)) as u32;

        debug!(page, page_size, total_count, "Listed finance records");

        Ok(FinancePage {
            records,
            page,
            page_size,
            total_count,
            page_count,
        })
    }

    /// Every record in a date range (unpaginated), newest first.
    pub async fn all(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> DbResult<Vec<FinanceRecord>> {
        let records = sqlx::query_as::<_, FinanceRecord>(
            r#"
            SELECT * FROM finance_records
            WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Rows owned by a transaction.
    pub async fn for_transaction(&self, transaction_id: &str) -> DbResult<Vec<FinanceRecord>> {
        let records = sqlx::query_as::<_, FinanceRecord>(
            "SELECT * FROM finance_records WHERE transaction_id = ?1 ORDER BY category",
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Income / expense totals for a date range.
    pub async fn summary(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> DbResult<FinanceSummary> {
        let records = self.all(from, to).await?;
        Ok(FinanceSummary::from_records(&records))
    }

    /// Per-month totals for the latest `months` months with activity.
    pub async fn monthly(&self, months: usize) -> DbResult<Vec<MonthlyFigures>> {
        let records = self.all(None, None).await?;
        Ok(monthly_series(&records, months))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{date, db};

    fn input(kind: FinanceKind, category: &str, rupees: i64, on: NaiveDate) -> FinanceInput {
        FinanceInput {
            kind,
            source: "Manual".to_string(),
            category: category.to_string(),
            amount: Money::from_rupees(rupees),
            description: None,
            date: on,
            linked_tab: None,
            notes: Some("office".to_string()),
            reference: None,
            customer_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let db = db().await;
        let record = db
            .finance()
            .create(&input(FinanceKind::Expense, "Rent", 15_000, date(2026, 10, 1)))
            .await
            .unwrap();
        assert_eq!(record.linked_tab.as_deref(), Some("finance"));

        let mut edit = input(FinanceKind::Expense, "Rent", 16_000, date(2026, 10, 1));
        edit.notes = None;
        let updated = db.finance().update(&record.id, &edit).await.unwrap();
        assert_eq!(updated.amount, Money::from_rupees(16_000));
        assert_eq!(updated.notes, None);

        db.finance().delete(&record.id).await.unwrap();
        assert!(db.finance().get(&record.id).await.unwrap().is_none());
        assert!(matches!(db.finance().delete(&record.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_paginates_and_filters() {
        let db = db().await;
        for day in 1..=23 {
            let kind = if day % 2 == 0 { FinanceKind::Income } else { FinanceKind::Expense };
            db.finance()
                .create(&input(kind, "General", 100 * day as i64, date(2026, 9, day)))
                .await
                .unwrap();
        }

        let page = db.finance().list(&FinanceQuery::default()).await.unwrap();
        assert_eq!(page.total_count, 23);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.records.len(), 10);
        assert_eq!(page.records[0].date, date(2026, 9, 23));

        let last = db
            .finance()
            .list(&FinanceQuery {
                page: Some(3),
                ..FinanceQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(last.records.len(), 3);

        let income = db
            .finance()
            .list(&FinanceQuery {
                kind: Some(FinanceKind::Income),
                from: Some(date(2026, 9, 10)),
                ..FinanceQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(income.total_count, 7);

        let by_amount = db
            .finance()
            .list(&FinanceQuery {
                search: Some("2300".to_string()),
                ..FinanceQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(by_amount.total_count, 1);

        let bad_page = db
            .finance()
            .list(&FinanceQuery {
                page: Some(0),
                ..FinanceQuery::default()
            })
            .await;
        assert!(matches!(bad_page, Err(DbError::Core(_))));
    }

    #[tokio::test]
    async fn test_summary_and_monthly() {
        let db = db().await;
        db.finance().create(&input(FinanceKind::Income, "Sales", 10_000, date(2026, 8, 5))).await.unwrap();
        db.finance().create(&input(FinanceKind::Expense, "Rent", 4_000, date(2026, 8, 6))).await.unwrap();
        db.finance().create(&input(FinanceKind::Income, "Sales", 6_000, date(2026, 9, 5))).await.unwrap();

        let summary = db.finance().summary(None, None).await.unwrap();
        assert_eq!(summary.total_income, Money::from_rupees(16_000));
        assert_eq!(summary.net_profit, Money::from_rupees(12_000));

        let september = db.finance().summary(Some(date(2026, 9, 1)), None).await.unwrap();
        assert_eq!(september.record_count, 1);

        let monthly = db.finance().monthly(6).await.unwrap();
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].month, "2026-08");
        assert_eq!(monthly[0].profit, Money::from_rupees(6_000));
    }
}
