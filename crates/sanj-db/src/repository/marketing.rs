//! # Marketing Repository
//!
//! Doctor marketing agreements. Pending amount and the expected-return pair
//! are derived on every save; performance is computed on read and never
//! stored.
//!
//! The doctor picklist is the `doctors` registry plus every name already on
//! an agreement.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product::clean;
use sanj_core::calc;
use sanj_core::inputs::AgreementInput;
use sanj_core::validation::validate_name;
use sanj_core::reports::MarketingSummary;
use sanj_core::{AgreementPerformance, CoreError, MarketingAgreement, MAX_NAME_LENGTH};

/// An agreement with its performance as of a given day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementView {
    #[serde(flatten)]
    pub agreement: MarketingAgreement,
    pub performance: AgreementPerformance,
}

/// Repository for doctor agreements.
#[derive(Debug, Clone)]
pub struct MarketingRepository {
    pool: SqlitePool,
}

impl MarketingRepository {
    /// Creates a new MarketingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MarketingRepository { pool }
    }

    /// Records an agreement.
    pub async fn create(&self, input: &AgreementInput) -> DbResult<MarketingAgreement> {
        input.validate()?;

        let now = Utc::now();
        let (expected_return, expected_return_ratio) = input.resolved_expected_return();
        let agreement = MarketingAgreement {
            id: Uuid::new_v4().to_string(),
            doctor_name: input.doctor_name.trim().to_string(),
            agreement_start: input.agreement_start,
            agreement_end: input.agreement_end,
            agreement_amount: input.agreement_amount,
            paid_amount: input.paid_amount,
            pending_amount: calc::agreement_pending(input.agreement_amount, input.paid_amount),
            expected_return,
            expected_return_ratio,
            return_value: input.return_value,
            status: input.status,
            payment_frequency: input.payment_frequency,
            notes: clean(&input.notes),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %agreement.id, doctor = %agreement.doctor_name, "Creating agreement");

        sqlx::query(
            r#"
            INSERT INTO marketing_agreements (
                id, doctor_name, agreement_start, agreement_end, agreement_amount,
                paid_amount, pending_amount, expected_return, expected_return_ratio,
                return_value, status, payment_frequency, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&agreement.id)
        .bind(&agreement.doctor_name)
        .bind(agreement.agreement_start)
        .bind(agreement.agreement_end)
        .bind(agreement.agreement_amount)
        .bind(agreement.paid_amount)
        .bind(agreement.pending_amount)
        .bind(agreement.expected_return)
        .bind(agreement.expected_return_ratio)
        .bind(agreement.return_value)
        .bind(agreement.status)
        .bind(agreement.payment_frequency)
        .bind(&agreement.notes)
        .bind(agreement.created_at)
        .bind(agreement.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %agreement.id, "Agreement created");
        Ok(agreement)
    }

    /// Updates an agreement.
    ///
    /// ## Returns
    /// * `Err(DbError::Core(InvalidStatusTransition))` - e.g. reopening a
    ///   completed agreement
    pub async fn update(&self, id: &str, input: &AgreementInput) -> DbResult<MarketingAgreement> {
        input.validate()?;

        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Agreement", id))?;

        if !existing.status.can_transition_to(input.status) {
            return Err(CoreError::InvalidStatusTransition {
                entity: "Agreement".to_string(),
                from: existing.status.to_string(),
                to: input.status.to_string(),
            }
            .into());
        }

        let (expected_return, expected_return_ratio) = input.resolved_expected_return();
        let agreement = MarketingAgreement {
            doctor_name: input.doctor_name.trim().to_string(),
            agreement_start: input.agreement_start,
            agreement_end: input.agreement_end,
            agreement_amount: input.agreement_amount,
            paid_amount: input.paid_amount,
            pending_amount: calc::agreement_pending(input.agreement_amount, input.paid_amount),
            expected_return,
            expected_return_ratio,
            return_value: input.return_value,
            status: input.status,
            payment_frequency: input.payment_frequency,
            notes: clean(&input.notes),
            updated_at: Utc::now(),
            ..existing
        };

        sqlx::query(
            r#"
            UPDATE marketing_agreements SET
                doctor_name = ?2, agreement_start = ?3, agreement_end = ?4,
                agreement_amount = ?5, paid_amount = ?6, pending_amount = ?7,
                expected_return = ?8, expected_return_ratio = ?9, return_value = ?10,
                status = ?11, payment_frequency = ?12, notes = ?13, updated_at = ?14
            WHERE id = ?1
            "#,
        )
        .bind(&agreement.id)
        .bind(&agreement.doctor_name)
        .bind(agreement.agreement_start)
        .bind(agreement.agreement_end)
        .bind(agreement.agreement_amount)
        .bind(agreement.paid_amount)
        .bind(agreement.pending_amount)
        .bind(agreement.expected_return)
        .bind(agreement.expected_return_ratio)
        .bind(agreement.return_value)
        .bind(agreement.status)
        .bind(agreement.payment_frequency)
        .bind(&agreement.notes)
        .bind(agreement.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(agreement)
    }

    /// Gets an agreement by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<MarketingAgreement>> {
        let agreement = sqlx::query_as::<_, MarketingAgreement>("SELECT * FROM marketing_agreements WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(agreement)
    }

    /// All agreements, latest start first.
    pub async fn all(&self) -> DbResult<Vec<MarketingAgreement>> {
        let agreements = sqlx::query_as::<_, MarketingAgreement>(
            "SELECT * FROM marketing_agreements ORDER BY agreement_start DESC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(agreements)
    }

    /// Agreements with their performance as of `today`.
    pub async fn list(&self, today: NaiveDate) -> DbResult<Vec<AgreementView>> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .map(|agreement| AgreementView {
                performance: agreement.performance(today),
                agreement,
            })
            .collect())
    }

    /// Deletes an agreement.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM marketing_agreements WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Agreement", id));
        }

        info!(id = %id, "Agreement deleted");
        Ok(())
    }

    /// Adds a doctor to the registry. Names are unique ignoring case.
    pub async fn add_doctor(&self, name: &str) -> DbResult<String> {
        validate_name("doctor_name", name, MAX_NAME_LENGTH)?;

        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO doctors (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&id)
            .bind(name.trim())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        debug!(id = %id, doctor = %name.trim(), "Doctor registered");
        Ok(id)
    }

    /// Doctor names for the agreement form, alphabetical.
    pub async fn doctors(&self) -> DbResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name FROM doctors
            UNION
            SELECT doctor_name FROM marketing_agreements
            ORDER BY 1 COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    /// Marketing tab totals as of `today`.
    pub async fn summary(&self, today: NaiveDate) -> DbResult<MarketingSummary> {
        let agreements = self.all().await?;
        Ok(MarketingSummary::compute(&agreements, today))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{date, db};
    use sanj_core::{AgreementStatus, Money, PaymentFrequency, Rate};

    fn input(doctor: &str) -> AgreementInput {
        AgreementInput {
            doctor_name: doctor.to_string(),
            agreement_start: date(2026, 4, 1),
            agreement_end: date(2027, 3, 31),
            agreement_amount: Money::from_rupees(50_000),
            paid_amount: Money::from_rupees(20_000),
            expected_return: None,
            expected_return_ratio: Some(Rate::from_bps(30_000)),
            return_value: Money::from_rupees(90_000),
            status: AgreementStatus::Active,
            payment_frequency: PaymentFrequency::Quarterly,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_pending_and_expected() {
        let db = db().await;
        let agreement = db.marketing().create(&input("Dr. Mehta")).await.unwrap();

        assert_eq!(agreement.pending_amount, Money::from_rupees(30_000));
        assert_eq!(agreement.expected_return, Money::from_rupees(150_000));
        assert_eq!(agreement.expected_return_ratio, Rate::from_bps(30_000));

        let mut explicit = input("Dr. Rao");
        explicit.expected_return = Some(Money::from_rupees(100_000));
        let derived = db.marketing().create(&explicit).await.unwrap();
        assert_eq!(derived.expected_return_ratio, Rate::from_bps(20_000));
    }

    #[tokio::test]
    async fn test_validation_rules() {
        let db = db().await;

        let mut overpaid = input("Dr. Mehta");
        overpaid.paid_amount = Money::from_rupees(60_000);
        assert!(db.marketing().create(&overpaid).await.is_err());

        let mut reversed = input("Dr. Mehta");
        reversed.agreement_end = date(2026, 3, 1);
        assert!(db.marketing().create(&reversed).await.is_err());

        let nameless = input("  ");
        assert!(db.marketing().create(&nameless).await.is_err());
    }

    #[tokio::test]
    async fn test_completed_agreement_cannot_reopen() {
        let db = db().await;
        let agreement = db.marketing().create(&input("Dr. Mehta")).await.unwrap();

        let mut completed = input("Dr. Mehta");
        completed.status = AgreementStatus::Completed;
        db.marketing().update(&agreement.id, &completed).await.unwrap();

        let reopen = db.marketing().update(&agreement.id, &input("Dr. Mehta")).await;
        assert!(matches!(
            reopen,
            Err(DbError::Core(CoreError::InvalidStatusTransition { .. }))
        ));
    }

    #[tokio::test]
    async fn test_list_performance_and_summary() {
        let db = db().await;
        db.marketing().create(&input("Dr. Mehta")).await.unwrap();

        let mut lapsed = input("Dr. Rao");
        lapsed.agreement_start = date(2025, 1, 1);
        lapsed.agreement_end = date(2025, 12, 31);
        db.marketing().create(&lapsed).await.unwrap();

        let today = date(2026, 10, 18);
        let views = db.marketing().list(today).await.unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].agreement.doctor_name, "Dr. Mehta");
        assert_eq!(views[0].performance, AgreementPerformance::UnderPerforming);
        assert_eq!(views[1].performance, AgreementPerformance::Review);

        let summary = db.marketing().summary(today).await.unwrap();
        assert_eq!(summary.agreement_count, 2);
        assert_eq!(summary.total_paid, Money::from_rupees(40_000));
        assert_eq!(summary.review_count, 1);
        assert_eq!(summary.completion_rate_bps, 6_000);

        let id = views[1].agreement.id.clone();
        db.marketing().delete(&id).await.unwrap();
        assert!(db.marketing().get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_doctor_picklist_merges_registry_and_agreements() {
        let db = db().await;
        db.marketing().add_doctor("Dr. Sharma").await.unwrap();
        db.marketing().add_doctor(" Dr. Iyer ").await.unwrap();
        db.marketing().create(&input("Dr. Mehta")).await.unwrap();
        db.marketing().create(&input("Dr. Sharma")).await.unwrap();

        let doctors = db.marketing().doctors().await.unwrap();
        assert_eq!(doctors, vec!["Dr. Iyer", "Dr. Mehta", "Dr. Sharma"]);

        let duplicate = db.marketing().add_doctor("dr. sharma").await;
        assert!(matches!(duplicate, Err(DbError::UniqueViolation { .. })));
        assert!(db.marketing().add_doctor("   ").await.is_err());
    }
}
