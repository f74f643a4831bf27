//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Search by name / batch / category
//! - CRUD with soft delete
//! - Low-stock and expiring-batch lists
//!
//! `current_stock` is never written here directly except through the stock
//! ledger (see [`crate::repository::stock`]), so the counter always equals
//! the sum of the product's stock entries.

use chrono::{NaiveDate, TimeDelta, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::stock::{self, Movement};
use sanj_core::inputs::ProductInput;
use sanj_core::validation::{validate_expiry_window, validate_search_query};
use sanj_core::ValidationError;
use sanj_core::{Product, StockMovement};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let results = repo.list(Some("neuron")).await?;
/// let product = repo.get("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product from validated input.
    ///
    /// ## What This Does
    /// 1. Fills retailer / stockist prices from the MRP ladder when absent
    /// 2. Inserts the product with zero stock
    /// 3. Books `opening_stock` as an adjustment entry, so the ledger and
    ///    the counter agree from the first row
    pub async fn create(&self, input: &ProductInput) -> DbResult<Product> {
        input.validate()?;

        let now = Utc::now();
        let (retailer_price, stockist_price) = input.trade_prices();
        let mut product = Product {
            id: generate_product_id(),
            name: input.name.trim().to_string(),
            batch: input.batch.trim().to_string(),
            expiry: input.expiry,
            mrp: input.mrp,
            gst: input.gst,
            retailer_price,
            stockist_price,
            supplier_price: input.supplier_price,
            bonus_scheme: clean(&input.bonus_scheme),
            current_stock: 0,
            category: clean(&input.category),
            description: clean(&input.description),
            composition: clean(&input.composition),
            packing: clean(&input.packing),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Creating product");

        let mut db_tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, batch, expiry, mrp, gst,
                retailer_price, stockist_price, supplier_price, bonus_scheme,
                current_stock, category, description, composition, packing,
                is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15,
                ?16, ?17, ?18
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.batch)
        .bind(product.expiry)
        .bind(product.mrp)
        .bind(product.gst)
        .bind(product.retailer_price)
        .bind(product.stockist_price)
        .bind(product.supplier_price)
        .bind(&product.bonus_scheme)
        .bind(product.current_stock)
        .bind(&product.category)
        .bind(&product.description)
        .bind(&product.composition)
        .bind(&product.packing)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *db_tx)
        .await?;

        if input.opening_stock > 0 {
            stock::record_movement(
                &mut *db_tx,
                Movement {
                    product: &product,
                    batch: &product.batch,
                    quantity: input.opening_stock,
                    movement: StockMovement::Adjustment,
                    unit_price: product.supplier_price,
                    party: None,
                    reference: Some("Opening stock"),
                    transaction_id: None,
                    date: now.date_naive(),
                },
            )
            .await?;
            product.current_stock = input.opening_stock;
        }

        db_tx.commit().await?;
        Ok(product)
    }

    /// Gets a product by its ID (active or not).
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists active products, optionally filtered by a search term matched
    /// against name, batch and category.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<Product>> {
        let pattern = like_pattern(search)?;

        debug!(search = ?pattern, "Listing products");

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE is_active = 1
              AND (?1 IS NULL OR name LIKE ?1 OR batch LIKE ?1 OR category LIKE ?1)
            ORDER BY name
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates catalog fields. Stock is left untouched.
    pub async fn update(&self, id: &str, input: &ProductInput) -> DbResult<Product> {
        input.validate()?;

        debug!(id = %id, "Updating product");

        let (retailer_price, stockist_price) = input.trade_prices();
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                batch = ?3,
                expiry = ?4,
                mrp = ?5,
                gst = ?6,
                retailer_price = ?7,
                stockist_price = ?8,
                supplier_price = ?9,
                bonus_scheme = ?10,
                category = ?11,
                description = ?12,
                composition = ?13,
                packing = ?14,
                updated_at = ?15
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.batch.trim())
        .bind(input.expiry)
        .bind(input.mrp)
        .bind(input.gst)
        .bind(retailer_price)
        .bind(stockist_price)
        .bind(input.supplier_price)
        .bind(clean(&input.bonus_scheme))
        .bind(clean(&input.category))
        .bind(clean(&input.description))
        .bind(clean(&input.composition))
        .bind(clean(&input.packing))
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get(id).await?.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Transactions and stock entries keep pointing at the row.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Active products with `current_stock <= threshold`, lowest first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE is_active = 1 AND current_stock <= ?1
            ORDER BY current_stock, name
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Active products whose batch expires on or before `today + days`,
    /// soonest first (already expired batches included).
    ///
    /// `days` is bounded by `MAX_EXPIRY_WINDOW_DAYS`.
    pub async fn expiring(&self, today: NaiveDate, days: i64) -> DbResult<Vec<Product>> {
        validate_expiry_window(days)?;
        let cutoff = TimeDelta::try_days(days)
            .and_then(|window| today.checked_add_signed(window))
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "days".to_string(),
                min: 0,
                max: sanj_core::MAX_EXPIRY_WINDOW_DAYS,
            })?;

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE is_active = 1 AND expiry IS NOT NULL AND expiry <= ?1
            ORDER BY expiry, name
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Distinct categories of active products.
    pub async fn categories(&self) -> DbResult<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT category FROM products
            WHERE is_active = 1 AND category IS NOT NULL AND category != ''
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level helpers (used inside other repositories' transactions)
// =============================================================================

/// Loads a product on an open connection, failing with NotFound.
pub(crate) async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Product> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
}

/// Applies a signed delta to the stock counter.
pub(crate) async fn adjust_counter(conn: &mut SqliteConnection, id: &str, delta: i64) -> DbResult<()> {
    debug!(id = %id, delta = %delta, "Updating stock counter");

    let result = sqlx::query(
        "UPDATE products SET current_stock = current_stock + ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(id)
    .bind(delta)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

/// Turns a search box value into a `LIKE` pattern (`None` when blank).
pub(crate) fn like_pattern(search: Option<&str>) -> DbResult<Option<String>> {
    match search {
        Some(raw) => {
            let query = validate_search_query(raw)?;
            Ok((!query.is_empty()).then(|| format!("%{}%", query)))
        }
        None => Ok(None),
    }
}

/// Trims optional text, mapping blanks to `None`.
pub(crate) fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, product_input as input};
    use sanj_core::{CoreError, Money};

    #[tokio::test]
    async fn test_create_fills_trade_prices_and_opening_stock() {
        let db = db().await;
        let product = db.products().create(&input("CALSANZ FEM CAP", "CSF2301", 120)).await.unwrap();

        assert_eq!(product.retailer_price, Money::from_rupees(280));
        assert_eq!(product.stockist_price, Money::from_rupees(252));
        assert_eq!(product.current_stock, 120);

        let stored = db.products().get(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.current_stock, 120);
        assert_eq!(stored.bonus_scheme.as_deref(), Some("10+2"));

        let balances = db.stock().batch_balances(&product.id).await.unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].quantity, 120);
    }

    #[tokio::test]
    async fn test_search_and_soft_delete() {
        let db = db().await;
        let a = db.products().create(&input("NEURON PLUS CAP", "NPL2304", 150)).await.unwrap();
        db.products().create(&input("FOL D3 TAB", "FLD2303", 200)).await.unwrap();

        assert_eq!(db.products().list(Some("neuron")).await.unwrap().len(), 1);
        assert_eq!(db.products().list(Some("FLD")).await.unwrap().len(), 1);
        assert_eq!(db.products().list(None).await.unwrap().len(), 2);

        db.products().soft_delete(&a.id).await.unwrap();
        assert_eq!(db.products().count().await.unwrap(), 1);
        assert!(db.products().get(&a.id).await.unwrap().is_some());

        let missing = db.products().soft_delete("nope").await;
        assert!(matches!(missing, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_keeps_stock() {
        let db = db().await;
        let product = db.products().create(&input("SAZ LQ 10 CAP", "SLQ2307", 110)).await.unwrap();

        let mut edit = input("SAZ LQ 10 CAP", "SLQ2307", 0);
        edit.mrp = Money::from_rupees(190);
        edit.retailer_price = Some(Money::from_rupees(160));
        let updated = db.products().update(&product.id, &edit).await.unwrap();

        assert_eq!(updated.current_stock, 110);
        assert_eq!(updated.retailer_price, Money::from_rupees(160));
        assert_eq!(updated.stockist_price, Money::from_rupees(144));
    }

    #[tokio::test]
    async fn test_low_stock_expiring_and_categories() {
        let db = db().await;
        let mut soon = input("SINOPLEX L SYP", "SPL2309", 5);
        soon.expiry = NaiveDate::from_ymd_opt(2026, 11, 30);
        soon.category = Some("Cough & Cold".to_string());
        db.products().create(&soon).await.unwrap();
        db.products().create(&input("TENDOLIV OA TAB", "TDO2308", 75)).await.unwrap();

        let low = db.products().low_stock(10).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "SINOPLEX L SYP");

        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let expiring = db.products().expiring(today, 90).await.unwrap();
        assert_eq!(expiring.len(), 1);

        let window = db.products().expiring(today, i64::MAX).await;
        assert!(matches!(window, Err(DbError::Core(CoreError::Validation(_)))));
        assert!(db.products().expiring(today, -1).await.is_err());

        let categories = db.products().categories().await.unwrap();
        assert_eq!(categories, vec!["Cough & Cold".to_string(), "Women's Health".to_string()]);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let db = db().await;
        let mut bad = input("", "CSF2301", 0);
        bad.name = "  ".to_string();
        let result = db.products().create(&bad).await;
        assert!(matches!(result, Err(DbError::Core(_))));
    }
}
