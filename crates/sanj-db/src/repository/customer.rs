//! # Customer Repository
//!
//! Customers are referenced by transactions. A customer with transactions
//! cannot be deleted; their finance rows keep the name in the description
//! and lose only the link.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product::{clean, like_pattern};
use sanj_core::inputs::CustomerInput;
use sanj_core::{CoreError, Customer};

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Creates a customer.
    pub async fn create(&self, input: &CustomerInput) -> DbResult<Customer> {
        input.validate()?;

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            customer_type: input.customer_type,
            contact: clean(&input.contact),
            address: clean(&input.address),
            gst_number: clean(&input.gst_number).map(|g| g.to_ascii_uppercase()),
            notes: clean(&input.notes),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, name = %customer.name, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, customer_type, contact, address, gst_number, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(customer.customer_type)
        .bind(&customer.contact)
        .bind(&customer.address)
        .bind(&customer.gst_number)
        .bind(&customer.notes)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Gets a customer by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Lists customers alphabetically, optionally filtered by name, contact
    /// or GST number.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<Customer>> {
        let pattern = like_pattern(search)?;

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE (?1 IS NULL OR name LIKE ?1 OR contact LIKE ?1 OR gst_number LIKE ?1)
            ORDER BY name COLLATE NOCASE
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Updates a customer's details.
    ///
    /// Past transactions keep the name they were saved with.
    pub async fn update(&self, id: &str, input: &CustomerInput) -> DbResult<Customer> {
        input.validate()?;

        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        let customer = Customer {
            name: input.name.trim().to_string(),
            customer_type: input.customer_type,
            contact: clean(&input.contact),
            address: clean(&input.address),
            gst_number: clean(&input.gst_number).map(|g| g.to_ascii_uppercase()),
            notes: clean(&input.notes),
            updated_at: Utc::now(),
            ..existing
        };

        sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2, customer_type = ?3, contact = ?4, address = ?5,
                gst_number = ?6, notes = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(customer.customer_type)
        .bind(&customer.contact)
        .bind(&customer.address)
        .bind(&customer.gst_number)
        .bind(&customer.notes)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Deletes a customer that has no transactions.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let references: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE customer_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if references > 0 {
            return Err(CoreError::Conflict {
                reason: format!("customer has {} transaction(s)", references),
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(id = %id, "Customer deleted");
        Ok(())
    }

    /// Counts customers.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::db;
    use sanj_core::CustomerType;

    fn input(name: &str) -> CustomerInput {
        CustomerInput {
            name: name.to_string(),
            customer_type: CustomerType::Retailer,
            contact: Some("98765 43210".to_string()),
            address: Some("  ".to_string()),
            gst_number: Some("27aapfu0939f1zv".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_normalises_fields() {
        let db = db().await;
        let customer = db.customers().create(&input("  City Medicals ")).await.unwrap();

        assert_eq!(customer.name, "City Medicals");
        assert_eq!(customer.address, None);
        assert_eq!(customer.gst_number.as_deref(), Some("27AAPFU0939F1ZV"));

        let fetched = db.customers().get(&customer.id).await.unwrap().unwrap();
        assert_eq!(fetched, customer);
    }

    #[tokio::test]
    async fn test_list_search_and_update() {
        let db = db().await;
        db.customers().create(&input("Zen Pharmacy")).await.unwrap();
        let apollo = db.customers().create(&input("apollo stores")).await.unwrap();

        let all = db.customers().list(None).await.unwrap();
        assert_eq!(all[0].name, "apollo stores");

        let mut edited = input("Apollo Stores");
        edited.customer_type = CustomerType::Hospital;
        let updated = db.customers().update(&apollo.id, &edited).await.unwrap();
        assert_eq!(updated.customer_type, CustomerType::Hospital);
        assert_eq!(updated.created_at, apollo.created_at);

        let found = db.customers().list(Some("zen")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(db.customers().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalid_gst_is_rejected() {
        let db = db().await;
        let mut bad = input("City Medicals");
        bad.gst_number = Some("123".to_string());

        let result = db.customers().create(&bad).await;
        assert!(matches!(result, Err(DbError::Core(CoreError::Validation(_)))));
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let db = db().await;
        let customer = db.customers().create(&input("City Medicals")).await.unwrap();

        db.customers().delete(&customer.id).await.unwrap();
        assert!(db.customers().get(&customer.id).await.unwrap().is_none());

        let again = db.customers().delete(&customer.id).await;
        assert!(matches!(again, Err(DbError::NotFound { .. })));
    }
}
