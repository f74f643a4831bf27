//! # Stock Repository
//!
//! The batch-level stock ledger. Every movement is one signed row in
//! `stock_entries` plus the same delta on `products.current_stock`, written
//! together on one connection.
//!
//! ## Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation        Entry qty        Counter     Finance row              │
//! │  ───────────────  ───────────────  ──────────  ──────────────────────── │
//! │  purchase         +qty             +qty        Expense "Stock Purchase" │
//! │  sale             −qty             −qty        Income  "Product Sale"   │
//! │  scheme sale      −(billed+free)   −(b+f)      Income  billed × price   │
//! │  return           +qty             +qty        none                     │
//! │  adjustment       ±qty             ±qty        none                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Outgoing movements must be covered by the batch balance (the sum of the
//! batch's entries); otherwise the write fails with `InsufficientStock` and
//! nothing is committed.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::finance::{self, LedgerEntry};
use crate::repository::product::{self, like_pattern};
use sanj_core::calc;
use sanj_core::inputs::{StockCorrectionInput, StockPurchaseInput, StockSaleInput};
use sanj_core::{BatchBalance, CoreError, FinanceKind, Money, Product, StockEntry, StockMovement};

const SOURCE: &str = "Stock";
const LINKED_TAB: &str = "stock";

// =============================================================================
// Ledger helpers (shared with products and transactions)
// =============================================================================

/// One signed movement to write.
#[derive(Debug, Clone)]
pub(crate) struct Movement<'a> {
    pub product: &'a Product,
    pub batch: &'a str,
    /// Signed: positive into stock, negative out of stock.
    pub quantity: i64,
    pub movement: StockMovement,
    pub unit_price: Money,
    pub party: Option<&'a str>,
    pub reference: Option<&'a str>,
    pub transaction_id: Option<&'a str>,
    pub date: NaiveDate,
}

/// Inserts the ledger row and moves the product counter by the same delta.
pub(crate) async fn record_movement(conn: &mut SqliteConnection, m: Movement<'_>) -> DbResult<StockEntry> {
    let entry = StockEntry {
        id: Uuid::new_v4().to_string(),
        product_id: m.product.id.clone(),
        product_name: m.product.name.clone(),
        batch: m.batch.to_string(),
        quantity: m.quantity,
        movement: m.movement,
        unit_price: m.unit_price,
        party: m.party.map(str::to_string),
        reference: m.reference.map(str::to_string),
        transaction_id: m.transaction_id.map(str::to_string),
        date: m.date,
        created_at: Utc::now(),
    };

    debug!(
        product_id = %entry.product_id,
        batch = %entry.batch,
        quantity = entry.quantity,
        movement = %entry.movement,
        "Recording stock movement"
    );

    sqlx::query(
        r#"
        INSERT INTO stock_entries (
            id, product_id, product_name, batch, quantity, movement,
            unit_price, party, reference, transaction_id, date, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11, ?12
        )
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.product_id)
    .bind(&entry.product_name)
    .bind(&entry.batch)
    .bind(entry.quantity)
    .bind(entry.movement)
    .bind(entry.unit_price)
    .bind(&entry.party)
    .bind(&entry.reference)
    .bind(&entry.transaction_id)
    .bind(entry.date)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    product::adjust_counter(conn, &entry.product_id, entry.quantity).await?;

    Ok(entry)
}

/// Sum of a batch's entries.
pub(crate) async fn batch_balance(conn: &mut SqliteConnection, product_id: &str, batch: &str) -> DbResult<i64> {
    let balance: i64 = sqlx::query_scalar(
        "SELECT IFNULL(SUM(quantity), 0) FROM stock_entries WHERE product_id = ?1 AND batch = ?2",
    )
    .bind(product_id)
    .bind(batch)
    .fetch_one(&mut *conn)
    .await?;

    Ok(balance)
}

/// Fails with `InsufficientStock` unless the batch holds `requested` units.
pub(crate) async fn ensure_batch_covers(
    conn: &mut SqliteConnection,
    product: &Product,
    batch: &str,
    requested: i64,
) -> DbResult<()> {
    let available = batch_balance(conn, &product.id, batch).await?;
    if available < requested {
        return Err(CoreError::InsufficientStock {
            product: format!("{} (batch {})", product.name, batch),
            available,
            requested,
        }
        .into());
    }
    Ok(())
}

/// Removes the ledger rows owned by a transaction and backs their total out
/// of the product counter. Returns the delta that was reversed.
pub(crate) async fn reverse_for_transaction(conn: &mut SqliteConnection, transaction_id: &str) -> DbResult<i64> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT product_id, SUM(quantity) FROM stock_entries WHERE transaction_id = ?1 GROUP BY product_id",
    )
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM stock_entries WHERE transaction_id = ?1")
        .bind(transaction_id)
        .execute(&mut *conn)
        .await?;

    let mut reversed = 0;
    for (product_id, delta) in rows {
        product::adjust_counter(conn, &product_id, -delta).await?;
        reversed += delta;
    }

    debug!(transaction_id = %transaction_id, reversed, "Reversed transaction stock");
    Ok(reversed)
}

// =============================================================================
// Result / export types
// =============================================================================

/// Outcome of a scheme sale.
#[derive(Debug, Clone, Serialize)]
pub struct SchemeSale {
    pub entry: StockEntry,
    pub billed_quantity: i64,
    pub free_quantity: i64,
    /// Billed units × price (free units are not income).
    pub income: Money,
}

/// One row of the stock CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockExportRow {
    pub product_name: String,
    pub batch: String,
    pub available_quantity: i64,
    pub purchase_rate: Money,
    pub sale_rate: Money,
    pub stock_value: Money,
    pub supplier: Option<String>,
    pub last_updated: NaiveDate,
}

#[derive(Debug, sqlx::FromRow)]
struct BatchRow {
    product_name: String,
    batch: String,
    available_quantity: i64,
    last_updated: NaiveDate,
    last_purchase_price: Option<Money>,
    supplier: Option<String>,
    supplier_price: Money,
    retailer_price: Money,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for stock movements and batch balances.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Receives goods into a batch and books the purchase expense.
    pub async fn record_purchase(&self, input: &StockPurchaseInput) -> DbResult<StockEntry> {
        input.validate()?;

        let mut db_tx = self.pool.begin().await?;
        let product = product::fetch_product(&mut *db_tx, &input.product_id).await?;

        let entry = record_movement(
            &mut *db_tx,
            Movement {
                product: &product,
                batch: input.batch.trim(),
                quantity: input.quantity,
                movement: StockMovement::Purchase,
                unit_price: input.unit_price,
                party: input.supplier.as_deref(),
                reference: input.invoice.as_deref(),
                transaction_id: None,
                date: input.date,
            },
        )
        .await?;

        finance::post_entry(
            &mut *db_tx,
            LedgerEntry {
                kind: FinanceKind::Expense,
                source: SOURCE,
                category: "Stock Purchase",
                amount: input.line_amount()?,
                description: format!(
                    "Purchase of {} units of {} (Batch: {})",
                    input.quantity, product.name, entry.batch
                ),
                date: input.date,
                linked_tab: LINKED_TAB,
                reference: input.invoice.clone(),
                customer_id: None,
                transaction_id: None,
            },
        )
        .await?;

        db_tx.commit().await?;
        info!(product_id = %product.id, batch = %entry.batch, quantity = input.quantity, "Stock purchase recorded");
        Ok(entry)
    }

    /// Sells units out of a batch and books the sale income.
    pub async fn record_sale(&self, input: &StockSaleInput) -> DbResult<StockEntry> {
        input.validate()?;

        let mut db_tx = self.pool.begin().await?;
        let product = product::fetch_product(&mut *db_tx, &input.product_id).await?;
        let batch = input.batch.trim();
        ensure_batch_covers(&mut *db_tx, &product, batch, input.quantity).await?;

        let entry = record_movement(
            &mut *db_tx,
            Movement {
                product: &product,
                batch,
                quantity: -input.quantity,
                movement: StockMovement::Sale,
                unit_price: input.unit_price,
                party: input.customer.as_deref(),
                reference: input.reference.as_deref(),
                transaction_id: None,
                date: input.date,
            },
        )
        .await?;

        finance::post_entry(
            &mut *db_tx,
            LedgerEntry {
                kind: FinanceKind::Income,
                source: SOURCE,
                category: "Product Sale",
                amount: input.line_amount()?,
                description: sale_description(input.quantity, &product.name, input.customer.as_deref(), batch),
                date: input.date,
                linked_tab: LINKED_TAB,
                reference: input.reference.clone(),
                customer_id: None,
                transaction_id: None,
            },
        )
        .await?;

        db_tx.commit().await?;
        info!(product_id = %product.id, batch = %batch, quantity = input.quantity, "Stock sale recorded");
        Ok(entry)
    }

    /// Sells units under the product's bonus scheme.
    ///
    /// ## Example
    /// A "10+2" product billed for 25 units ships 29 and books income for 25.
    pub async fn record_scheme_sale(&self, input: &StockSaleInput) -> DbResult<SchemeSale> {
        input.validate()?;

        let mut db_tx = self.pool.begin().await?;
        let product = product::fetch_product(&mut *db_tx, &input.product_id).await?;
        let batch = input.batch.trim();

        let scheme = product.scheme();
        let free_quantity = scheme.free_quantity(input.quantity);
        let shipped = input.quantity + free_quantity;
        ensure_batch_covers(&mut *db_tx, &product, batch, shipped).await?;

        let entry = record_movement(
            &mut *db_tx,
            Movement {
                product: &product,
                batch,
                quantity: -shipped,
                movement: StockMovement::SchemeSale,
                unit_price: input.unit_price,
                party: input.customer.as_deref(),
                reference: input.reference.as_deref(),
                transaction_id: None,
                date: input.date,
            },
        )
        .await?;

        let income = input.line_amount()?;
        let mut description = sale_description(input.quantity, &product.name, input.customer.as_deref(), batch);
        if free_quantity > 0 {
            description.push_str(&format!(" + {} free", free_quantity));
        }

        finance::post_entry(
            &mut *db_tx,
            LedgerEntry {
                kind: FinanceKind::Income,
                source: SOURCE,
                category: "Product Sale",
                amount: income,
                description,
                date: input.date,
                linked_tab: LINKED_TAB,
                reference: input.reference.clone(),
                customer_id: None,
                transaction_id: None,
            },
        )
        .await?;

        db_tx.commit().await?;
        info!(
            product_id = %product.id,
            billed = input.quantity,
            free = free_quantity,
            "Scheme sale recorded"
        );

        Ok(SchemeSale {
            entry,
            billed_quantity: input.quantity,
            free_quantity,
            income,
        })
    }

    /// Takes returned goods back into a batch. No finance row.
    pub async fn record_return(&self, input: &StockCorrectionInput) -> DbResult<StockEntry> {
        input.validate_return()?;

        let mut db_tx = self.pool.begin().await?;
        let product = product::fetch_product(&mut *db_tx, &input.product_id).await?;

        let entry = record_movement(
            &mut *db_tx,
            Movement {
                product: &product,
                batch: input.batch.trim(),
                quantity: input.quantity,
                movement: StockMovement::Return,
                unit_price: product.supplier_price,
                party: input.party.as_deref(),
                reference: input.reference.as_deref(),
                transaction_id: None,
                date: input.date,
            },
        )
        .await?;

        db_tx.commit().await?;
        Ok(entry)
    }

    /// Applies a signed manual correction. Neither the batch nor the product
    /// counter may go below zero.
    pub async fn record_adjustment(&self, input: &StockCorrectionInput) -> DbResult<StockEntry> {
        input.validate_adjustment()?;

        let mut db_tx = self.pool.begin().await?;
        let product = product::fetch_product(&mut *db_tx, &input.product_id).await?;
        let batch = input.batch.trim();

        if input.quantity < 0 {
            ensure_batch_covers(&mut *db_tx, &product, batch, -input.quantity).await?;
            if product.current_stock + input.quantity < 0 {
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.current_stock,
                    requested: -input.quantity,
                }
                .into());
            }
        }

        let entry = record_movement(
            &mut *db_tx,
            Movement {
                product: &product,
                batch,
                quantity: input.quantity,
                movement: StockMovement::Adjustment,
                unit_price: product.supplier_price,
                party: input.party.as_deref(),
                reference: input.reference.as_deref(),
                transaction_id: None,
                date: input.date,
            },
        )
        .await?;

        db_tx.commit().await?;
        Ok(entry)
    }

    /// Batches of a product that still hold stock.
    pub async fn batch_balances(&self, product_id: &str) -> DbResult<Vec<BatchBalance>> {
        let balances = sqlx::query_as::<_, BatchBalance>(
            r#"
            SELECT product_id, batch, SUM(quantity) AS quantity
            FROM stock_entries
            WHERE product_id = ?1
            GROUP BY product_id, batch
            HAVING SUM(quantity) > 0
            ORDER BY batch
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(balances)
    }

    /// Ledger rows, newest first, optionally filtered by product name or batch.
    pub async fn list_entries(&self, search: Option<&str>, limit: u32) -> DbResult<Vec<StockEntry>> {
        let pattern = like_pattern(search)?;

        let entries = sqlx::query_as::<_, StockEntry>(
            r#"
            SELECT * FROM stock_entries
            WHERE (?1 IS NULL OR product_name LIKE ?1 OR batch LIKE ?1)
            ORDER BY date DESC, created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Rows of the stock CSV: one per batch with stock on hand.
    ///
    /// Purchase rate and supplier come from the batch's latest purchase,
    /// falling back to the product's supplier price.
    pub async fn export_rows(&self) -> DbResult<Vec<StockExportRow>> {
        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT
                e.product_name AS product_name,
                e.batch AS batch,
                SUM(e.quantity) AS available_quantity,
                MAX(e.date) AS last_updated,
                (SELECT p.unit_price FROM stock_entries p
                  WHERE p.product_id = e.product_id AND p.batch = e.batch AND p.movement = 'purchase'
                  ORDER BY p.date DESC, p.created_at DESC LIMIT 1) AS last_purchase_price,
                (SELECT p.party FROM stock_entries p
                  WHERE p.product_id = e.product_id AND p.batch = e.batch AND p.movement = 'purchase'
                  ORDER BY p.date DESC, p.created_at DESC LIMIT 1) AS supplier,
                pr.supplier_price AS supplier_price,
                pr.retailer_price AS retailer_price
            FROM stock_entries e
            INNER JOIN products pr ON pr.id = e.product_id
            GROUP BY e.product_id, e.batch
            HAVING SUM(e.quantity) > 0
            ORDER BY e.product_name, e.batch
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let purchase_rate = row.last_purchase_price.unwrap_or(row.supplier_price);
                StockExportRow {
                    product_name: row.product_name,
                    batch: row.batch,
                    available_quantity: row.available_quantity,
                    purchase_rate,
                    sale_rate: calc::sale_rate(row.retailer_price, purchase_rate),
                    stock_value: purchase_rate.multiply_quantity(row.available_quantity),
                    supplier: row.supplier,
                    last_updated: row.last_updated,
                }
            })
            .collect())
    }
}

fn sale_description(quantity: i64, product: &str, customer: Option<&str>, batch: &str) -> String {
    match customer.map(str::trim).filter(|c| !c.is_empty()) {
        Some(customer) => format!("Sale of {} units of {} to {} (Batch: {})", quantity, product, customer, batch),
        None => format!("Sale of {} units of {} (Batch: {})", quantity, product, batch),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
