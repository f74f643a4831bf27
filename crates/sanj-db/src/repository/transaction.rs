//! # Transaction Repository
//!
//! Sales and purchases. Saving a transaction writes three things in one SQL
//! transaction: the transaction row, its stock movement, and its finance
//! rows. Editing or deleting first undoes all of them.
//!
//! ## Write Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create / update                                                        │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   ├── (update only) reverse stock rows, delete finance rows             │
//! │   ├── oversell check (sale qty vs batch balance)                        │
//! │   ├── INSERT / UPDATE transactions                                      │
//! │   ├── stock entry  sale −qty │ purchase +qty   (counter follows)        │
//! │   ├── finance      Income "Sales" │ Expense "Purchases"  = total        │
//! │   ├── finance      Expense "CNF Commission"   (when > 0)                │
//! │   └── finance      Expense "Transportation"   (when > 0)                │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::finance::{self, LedgerEntry};
use crate::repository::product::{self, clean};
use crate::repository::stock::{self, Movement};
use sanj_core::inputs::TransactionInput;
use sanj_core::{Customer, FinanceKind, Money, Product, StockMovement, Transaction, TransactionKind};

const SOURCE: &str = "Transactions";
const LINKED_TAB: &str = "transactions";
const WALK_IN: &str = "Walk-in";

/// Filters for the transaction list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionQuery {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

/// Totals shown above the transaction list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionSummary {
    pub transaction_count: i64,
    pub total_sales: Money,
    pub total_purchases: Money,
    pub expected_return: Money,
    /// CNF commission plus transport across all transactions.
    pub expenses: Money,
    /// Distinct linked customers.
    pub customer_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    transaction_count: i64,
    total_sales: Money,
    total_purchases: Money,
    expected_return: Money,
    expenses: Money,
    customer_count: i64,
}

/// Repository for sales and purchases.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Saves a new transaction with its stock and finance effects.
    ///
    /// ## Returns
    /// * `Err(DbError::Core(InsufficientStock))` - Sale exceeds the batch
    ///   balance and `allow_oversell` is not set
    pub async fn create(&self, input: &TransactionInput) -> DbResult<Transaction> {
        input.validate()?;

        let mut db_tx = self.pool.begin().await?;

        let now = Utc::now();
        let product = product::fetch_product(&mut *db_tx, &input.product_id).await?;
        let transaction = build(&mut *db_tx, input, &product, Uuid::new_v4().to_string(), now).await?;
        ensure_stock(&mut *db_tx, &product, &transaction, input.allow_oversell).await?;

        debug!(id = %transaction.id, kind = %transaction.kind, "Creating transaction");

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, customer_id, customer_name, product_id, product_name, kind,
                quantity, unit_price, discount, cnf_commission, transport_expense,
                total_amount, expected_return_ratio, expected_return, payment_status,
                date, notes, created_at, updated_at, batch
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15,
                ?16, ?17, ?18, ?19, ?20
            )
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.customer_id)
        .bind(&transaction.customer_name)
        .bind(&transaction.product_id)
        .bind(&transaction.product_name)
        .bind(transaction.kind)
        .bind(transaction.quantity)
        .bind(transaction.unit_price)
        .bind(transaction.discount)
        .bind(transaction.cnf_commission)
        .bind(transaction.transport_expense)
        .bind(transaction.total_amount)
        .bind(transaction.expected_return_ratio)
        .bind(transaction.expected_return)
        .bind(transaction.payment_status)
        .bind(transaction.date)
        .bind(&transaction.notes)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .bind(&transaction.batch)
        .execute(&mut *db_tx)
        .await?;

        apply_effects(&mut *db_tx, &transaction, &product).await?;

        db_tx.commit().await?;
        info!(id = %transaction.id, total = %transaction.total_amount, "Transaction created");
        Ok(transaction)
    }

    /// Replaces a transaction, undoing its previous stock and finance effects
    /// before applying the new ones.
    pub async fn update(&self, id: &str, input: &TransactionInput) -> DbResult<Transaction> {
        input.validate()?;

        let mut db_tx = self.pool.begin().await?;

        let existing = fetch_transaction(&mut *db_tx, id).await?;
        stock::reverse_for_transaction(&mut *db_tx, id).await?;
        finance::delete_for_transaction(&mut *db_tx, id).await?;

        // Re-read after the reversal so the oversell check sees restored stock
        let product = product::fetch_product(&mut *db_tx, &input.product_id).await?;
        let mut transaction = build(&mut *db_tx, input, &product, existing.id, Utc::now()).await?;
        transaction.created_at = existing.created_at;
        ensure_stock(&mut *db_tx, &product, &transaction, input.allow_oversell).await?;

        sqlx::query(
            r#"
            UPDATE transactions SET
                customer_id = ?2, customer_name = ?3, product_id = ?4, product_name = ?5,
                kind = ?6, quantity = ?7, unit_price = ?8, discount = ?9,
                cnf_commission = ?10, transport_expense = ?11, total_amount = ?12,
                expected_return_ratio = ?13, expected_return = ?14, payment_status = ?15,
                date = ?16, notes = ?17, updated_at = ?18, batch = ?19
            WHERE id = ?1
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.customer_id)
        .bind(&transaction.customer_name)
        .bind(&transaction.product_id)
        .bind(&transaction.product_name)
        .bind(transaction.kind)
        .bind(transaction.quantity)
        .bind(transaction.unit_price)
        .bind(transaction.discount)
        .bind(transaction.cnf_commission)
        .bind(transaction.transport_expense)
        .bind(transaction.total_amount)
        .bind(transaction.expected_return_ratio)
        .bind(transaction.expected_return)
        .bind(transaction.payment_status)
        .bind(transaction.date)
        .bind(&transaction.notes)
        .bind(transaction.updated_at)
        .bind(&transaction.batch)
        .execute(&mut *db_tx)
        .await?;

        apply_effects(&mut *db_tx, &transaction, &product).await?;

        db_tx.commit().await?;
        info!(id = %transaction.id, "Transaction updated");
        Ok(transaction)
    }

    /// Deletes a transaction and undoes its stock and finance effects.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut db_tx = self.pool.begin().await?;

        fetch_transaction(&mut *db_tx, id).await?;
        stock::reverse_for_transaction(&mut *db_tx, id).await?;
        finance::delete_for_transaction(&mut *db_tx, id).await?;

        sqlx::query("DELETE FROM transactions WHERE id = ?1")
            .bind(id)
            .execute(&mut *db_tx)
            .await?;

        db_tx.commit().await?;
        info!(id = %id, "Transaction deleted");
        Ok(())
    }

    /// Gets a transaction by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(transaction)
    }

    /// Lists transactions matching the query, newest date first.
    pub async fn list(&self, query: &TransactionQuery) -> DbResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE (?1 IS NULL OR customer_id = ?1)
              AND (?2 IS NULL OR product_id = ?2)
              AND (?3 IS NULL OR kind = ?3)
              AND (?4 IS NULL OR date >= ?4)
              AND (?5 IS NULL OR date <= ?5)
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(&query.customer_id)
        .bind(&query.product_id)
        .bind(query.kind.map(|k| k.as_str()))
        .bind(query.from)
        .bind(query.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    /// Every transaction, newest first.
    pub async fn all(&self) -> DbResult<Vec<Transaction>> {
        self.list(&TransactionQuery::default()).await
    }

    /// Totals over all transactions.
    pub async fn summary(&self) -> DbResult<TransactionSummary> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                COUNT(*) AS transaction_count,
                IFNULL(SUM(CASE WHEN kind = 'sale' THEN total_amount ELSE 0 END), 0) AS total_sales,
                IFNULL(SUM(CASE WHEN kind = 'purchase' THEN total_amount ELSE 0 END), 0) AS total_purchases,
                IFNULL(SUM(expected_return), 0) AS expected_return,
                IFNULL(SUM(cnf_commission + transport_expense), 0) AS expenses,
                COUNT(DISTINCT customer_id) AS customer_count
            FROM transactions
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(TransactionSummary {
            transaction_count: row.transaction_count,
            total_sales: row.total_sales,
            total_purchases: row.total_purchases,
            expected_return: row.expected_return,
            expenses: row.expenses,
            customer_count: row.customer_count,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn fetch_transaction(conn: &mut SqliteConnection, id: &str) -> DbResult<Transaction> {
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Transaction", id))
}

/// Builds the row from the payload, resolving the customer name snapshot.
async fn build(
    conn: &mut SqliteConnection,
    input: &TransactionInput,
    product: &Product,
    id: String,
    now: chrono::DateTime<Utc>,
) -> DbResult<Transaction> {
    let customer_name = match &input.customer_id {
        Some(customer_id) => {
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?1")
                .bind(customer_id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| DbError::not_found("Customer", customer_id))?
                .name
        }
        None => clean(&input.customer_name).unwrap_or_else(|| WALK_IN.to_string()),
    };

    let (total_amount, expected_return, expected_return_ratio) = input.computed_amounts()?;
    let batch = input
        .batch
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(&product.batch)
        .to_string();

    Ok(Transaction {
        id,
        customer_id: input.customer_id.clone(),
        customer_name,
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        batch,
        kind: input.kind,
        quantity: input.quantity,
        unit_price: input.unit_price,
        discount: input.discount,
        cnf_commission: input.cnf_commission,
        transport_expense: input.transport_expense,
        total_amount,
        expected_return_ratio,
        expected_return,
        payment_status: input.payment_status,
        date: input.date,
        notes: clean(&input.notes),
        created_at: now,
        updated_at: now,
    })
}

/// A sale must be covered by the batch it draws from, the same rule the
/// stock tab applies.
async fn ensure_stock(
    conn: &mut SqliteConnection,
    product: &Product,
    transaction: &Transaction,
    allow_oversell: bool,
) -> DbResult<()> {
    if transaction.kind == TransactionKind::Sale && !allow_oversell {
        stock::ensure_batch_covers(conn, product, &transaction.batch, transaction.quantity).await?;
    }
    Ok(())
}

/// Writes the stock movement and the finance rows of a transaction.
async fn apply_effects(conn: &mut SqliteConnection, transaction: &Transaction, product: &Product) -> DbResult<()> {
    let movement = match transaction.kind {
        TransactionKind::Sale => StockMovement::Sale,
        TransactionKind::Purchase => StockMovement::Purchase,
    };

    stock::record_movement(
        &mut *conn,
        Movement {
            product,
            batch: &transaction.batch,
            quantity: transaction.stock_delta(),
            movement,
            unit_price: transaction.unit_price,
            party: Some(transaction.customer_name.as_str()),
            reference: None,
            transaction_id: Some(transaction.id.as_str()),
            date: transaction.date,
        },
    )
    .await?;

    let (kind, category, verb) = match transaction.kind {
        TransactionKind::Sale => (FinanceKind::Income, "Sales", "Sale"),
        TransactionKind::Purchase => (FinanceKind::Expense, "Purchases", "Purchase"),
    };

    let lines = [
        (
            kind,
            category,
            transaction.total_amount,
            format!("{} - {} to {}", verb, transaction.product_name, transaction.customer_name),
        ),
        (
            FinanceKind::Expense,
            "CNF Commission",
            transaction.cnf_commission,
            format!("CNF Commission for {}", transaction.product_name),
        ),
        (
            FinanceKind::Expense,
            "Transportation",
            transaction.transport_expense,
            format!("Transport for {}", transaction.product_name),
        ),
    ];

    for (kind, category, amount, description) in lines {
        finance::post_entry(
            &mut *conn,
            LedgerEntry {
                kind,
                source: SOURCE,
                category,
                amount,
                description,
                date: transaction.date,
                linked_tab: LINKED_TAB,
                reference: None,
                customer_id: transaction.customer_id.clone(),
                transaction_id: Some(transaction.id.clone()),
            },
        )
        .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use crate::repository::finance::FinanceQuery;
    use crate::repository::test_support::{date, db, product_input};
    use sanj_core::inputs::{CustomerInput, StockPurchaseInput};
    use sanj_core::{CoreError, CustomerType, PaymentStatus, Rate};

    async fn setup(db: &Database) -> (Product, Customer) {
        let product = db.products().create(&product_input("NEURON PLUS CAP", "NPL2304", 100)).await.unwrap();
        let customer = db
            .customers()
            .create(&CustomerInput {
                name: "City Medicals".to_string(),
                customer_type: CustomerType::Retailer,
                contact: None,
                address: None,
                gst_number: None,
                notes: None,
            })
            .await
            .unwrap();
        (product, customer)
    }

    fn sale(product: &Product, customer: &Customer, qty: i64) -> TransactionInput {
        TransactionInput {
            customer_id: Some(customer.id.clone()),
            customer_name: None,
            product_id: product.id.clone(),
            batch: None,
            kind: TransactionKind::Sale,
            quantity: qty,
            unit_price: Money::from_rupees(230),
            discount: Money::from_rupees(100),
            cnf_commission: Money::from_rupees(50),
            transport_expense: Money::zero(),
            expected_return_ratio: Some(Rate::from_bps(2000)),
            expected_return: None,
            payment_status: PaymentStatus::Pending,
            date: date(2026, 10, 12),
            notes: None,
            allow_oversell: false,
        }
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get(id).await.unwrap().unwrap().current_stock
    }

    #[tokio::test]
    async fn test_sale_syncs_stock_and_finance() {
        let db = db().await;
        let (product, customer) = setup(&db).await;

        let tx = db.transactions().create(&sale(&product, &customer, 10)).await.unwrap();
        // 10 × 230 − 100 + 50
        assert_eq!(tx.total_amount, Money::from_rupees(2_250));
        assert_eq!(tx.expected_return, Money::from_rupees(450));
        assert_eq!(tx.customer_name, "City Medicals");
        assert_eq!(stock_of(&db, &product.id).await, 90);

        let rows = db.finance().for_transaction(&tx.id).await.unwrap();
        assert_eq!(rows.len(), 2);
        let main = rows.iter().find(|r| r.category == "Sales").unwrap();
        assert_eq!(main.kind, FinanceKind::Income);
        assert_eq!(main.amount, Money::from_rupees(2_250));
        assert_eq!(main.description.as_deref(), Some("Sale - NEURON PLUS CAP to City Medicals"));
        assert_eq!(main.customer_id.as_deref(), Some(customer.id.as_str()));
        let cnf = rows.iter().find(|r| r.category == "CNF Commission").unwrap();
        assert_eq!(cnf.kind, FinanceKind::Expense);
        assert_eq!(cnf.amount, Money::from_rupees(50));
    }

    #[tokio::test]
    async fn test_oversell_needs_explicit_flag() {
        let db = db().await;
        let (product, customer) = setup(&db).await;

        let result = db.transactions().create(&sale(&product, &customer, 150)).await;
        assert!(matches!(
            result,
            Err(DbError::Core(CoreError::InsufficientStock { available: 100, requested: 150, .. }))
        ));
        assert_eq!(stock_of(&db, &product.id).await, 100);

        let mut forced = sale(&product, &customer, 150);
        forced.allow_oversell = true;
        db.transactions().create(&forced).await.unwrap();
        assert_eq!(stock_of(&db, &product.id).await, -50);
    }

    #[tokio::test]
    async fn test_sale_draws_from_the_named_batch() {
        let db = db().await;
        let (product, customer) = setup(&db).await;
        db.stock()
            .record_purchase(&StockPurchaseInput {
                product_id: product.id.clone(),
                batch: "B202".to_string(),
                quantity: 50,
                unit_price: Money::from_rupees(90),
                supplier: None,
                date: date(2026, 10, 10),
                invoice: None,
            })
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &product.id).await, 150);

        // The default batch only holds the opening 100
        let short = db.transactions().create(&sale(&product, &customer, 120)).await;
        assert!(matches!(
            short,
            Err(DbError::Core(CoreError::InsufficientStock { available: 100, requested: 120, .. }))
        ));

        let mut from_new_batch = sale(&product, &customer, 30);
        from_new_batch.batch = Some("B202".to_string());
        let tx = db.transactions().create(&from_new_batch).await.unwrap();
        assert_eq!(tx.batch, "B202");

        let tx_default = db.transactions().create(&sale(&product, &customer, 10)).await.unwrap();
        assert_eq!(tx_default.batch, "NPL2304");

        let balances = db.stock().batch_balances(&product.id).await.unwrap();
        let quantities: Vec<_> = balances.iter().map(|b| (b.batch.as_str(), b.quantity)).collect();
        assert_eq!(quantities, vec![("B202", 20), ("NPL2304", 90)]);
        assert_eq!(stock_of(&db, &product.id).await, 110);

        // Deleting puts the units back in the batch they left
        db.transactions().delete(&tx.id).await.unwrap();
        let balances = db.stock().batch_balances(&product.id).await.unwrap();
        assert_eq!(balances[0].quantity, 50);
    }

    #[tokio::test]
    async fn test_update_replaces_previous_effects() {
        let db = db().await;
        let (product, customer) = setup(&db).await;
        let tx = db.transactions().create(&sale(&product, &customer, 10)).await.unwrap();

        let mut edited = sale(&product, &customer, 95);
        edited.cnf_commission = Money::zero();
        edited.transport_expense = Money::from_rupees(80);
        let updated = db.transactions().update(&tx.id, &edited).await.unwrap();

        // 95 fits only because the old 10 were restored first
        assert_eq!(stock_of(&db, &product.id).await, 5);
        assert_eq!(updated.created_at, tx.created_at);

        let rows = db.finance().for_transaction(&tx.id).await.unwrap();
        let categories: Vec<_> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(rows.len(), 2);
        assert!(categories.contains(&"Sales"));
        assert!(categories.contains(&"Transportation"));

        let balances = db.stock().batch_balances(&product.id).await.unwrap();
        assert_eq!(balances[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_delete_restores_stock_and_ledger() {
        let db = db().await;
        let (product, customer) = setup(&db).await;
        let tx = db.transactions().create(&sale(&product, &customer, 10)).await.unwrap();

        db.transactions().delete(&tx.id).await.unwrap();

        assert_eq!(stock_of(&db, &product.id).await, 100);
        assert!(db.transactions().get(&tx.id).await.unwrap().is_none());
        assert_eq!(db.finance().list(&FinanceQuery::default()).await.unwrap().total_count, 0);

        let missing = db.transactions().delete(&tx.id).await;
        assert!(matches!(missing, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_purchase_walk_in_list_and_summary() {
        let db = db().await;
        let (product, customer) = setup(&db).await;
        db.transactions().create(&sale(&product, &customer, 10)).await.unwrap();

        let mut purchase = sale(&product, &customer, 40);
        purchase.kind = TransactionKind::Purchase;
        purchase.customer_id = None;
        purchase.customer_name = None;
        purchase.discount = Money::zero();
        purchase.cnf_commission = Money::zero();
        purchase.unit_price = Money::from_rupees(160);
        purchase.date = date(2026, 10, 14);
        let bought = db.transactions().create(&purchase).await.unwrap();
        assert_eq!(bought.customer_name, "Walk-in");
        assert_eq!(stock_of(&db, &product.id).await, 130);

        let rows = db.finance().for_transaction(&bought.id).await.unwrap();
        assert_eq!(rows[0].description.as_deref(), Some("Purchase - NEURON PLUS CAP to Walk-in"));

        let all = db.transactions().all().await.unwrap();
        assert_eq!(all[0].id, bought.id);

        let sales_only = db
            .transactions()
            .list(&TransactionQuery {
                kind: Some(TransactionKind::Sale),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(sales_only.len(), 1);

        let summary = db.transactions().summary().await.unwrap();
        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.total_sales, Money::from_rupees(2_250));
        assert_eq!(summary.total_purchases, Money::from_rupees(6_400));
        assert_eq!(summary.expenses, Money::from_rupees(50));
        assert_eq!(summary.customer_count, 1);
    }
}
