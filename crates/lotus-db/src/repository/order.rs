//! # Order Repository
//!
//! The order transaction manager. Order creation and status transitions are
//! multi-step mutations (header, lines, stock movements, loyalty credit,
//! audit row), so every one of them runs inside a single SQLite transaction:
//! all steps commit together or none do.
//!
//! ## Pricing
//! Line prices are snapshotted from the product at creation time inside the
//! same transaction. Later product price changes never alter existing
//! orders.
//!
//! ## Status Transitions
//! ```text
//!              complete           cancel
//!   pending ─────────────► completed      pending ───► cancelled
//!              loyalty+                    stock restored
//! ```
//! Both terminal states are final. A repeated completion would double the
//! loyalty credit, so the transition table rejects it.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{apply_stock_delta, credit_loyalty, log_activity};
use lotus_core::{
    ledger, numbering, validation, CoreError, Money, Order, OrderDraft, OrderLine, OrderLineDraft,
    OrderStatus, Product, StockPolicy,
};

const ORDER_COLUMNS: &str = "id, order_number, customer_id, user_id, order_date, status, \
     total_amount_cents, discount_cents, final_amount_cents, payment_method, notes";

const LINE_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price_cents, subtotal_cents";

/// Repository for order database operations.
///
/// Carries the configured [`StockPolicy`]: under the default permissive
/// policy an order may drive stock negative (oversell, reconciled later);
/// under the strict policy creation fails with an insufficient-stock
/// conflict instead.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    stock_policy: StockPolicy,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool, stock_policy: StockPolicy) -> Self {
        OrderRepository { pool, stock_policy }
    }

    /// Creates an order with its lines, atomically.
    ///
    /// ## Steps (one transaction)
    /// 1. Validate the draft (at least one line, positive quantities,
    ///    non-negative discount)
    /// 2. Decrement stock per line (merged per product)
    /// 3. Verify the referenced customer exists, when one is given
    /// 4. Snapshot each line's unit price from the product row
    /// 5. Insert header and lines with derived totals
    /// 6. If created directly as completed, credit loyalty points
    /// 7. Append the audit row
    ///
    /// The stock UPDATEs come first: the transaction's opening statement is
    /// a write, so SQLite takes the write lock up front and concurrent
    /// creators queue on the busy timeout instead of failing a snapshot
    /// upgrade mid-transaction.
    ///
    /// Any failing step (unknown product, insufficient stock under the
    /// strict policy, unknown customer) rolls back everything.
    pub async fn create_order(&self, draft: OrderDraft, lines: &[OrderLineDraft]) -> DbResult<Order> {
        self.create_order_at(draft, lines, Utc::now()).await
    }

    /// [`create_order`](Self::create_order) with an explicit clock instant.
    /// The instant feeds both the order number and order_date.
    pub(crate) async fn create_order_at(
        &self,
        draft: OrderDraft,
        lines: &[OrderLineDraft],
        now: DateTime<Utc>,
    ) -> DbResult<Order> {
        validation::validate_order_draft(&draft, lines).map_err(CoreError::from)?;

        let order_number = numbering::order_number(now);

        debug!(order_number = %order_number, lines = lines.len(), "Creating order");

        let mut tx = self.pool.begin().await?;

        for delta in ledger::order_creation_deltas(lines) {
            apply_stock_delta(&mut tx, delta, self.stock_policy).await?;
        }

        if let Some(customer_id) = draft.customer_id {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM customers WHERE id = ?1")
                .bind(customer_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(DbError::not_found("Customer", customer_id));
            }
        }

        // Snapshot prices inside the transaction so a concurrent price
        // change cannot split one order across two price versions.
        let mut priced: Vec<(OrderLineDraft, Money)> = Vec::with_capacity(lines.len());
        for line in lines {
            let product = fetch_product(&mut tx, line.product_id).await?;
            priced.push((line.clone(), product.selling_price()));
        }

        let totals = ledger::order_totals(
            priced
                .iter()
                .map(|(line, price)| ledger::line_subtotal(*price, line.quantity)),
            Money::from_cents(draft.discount_cents),
        );

        let result = sqlx::query(
            "INSERT INTO orders \
             (order_number, customer_id, user_id, order_date, status, total_amount_cents, \
              discount_cents, final_amount_cents, payment_method, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&order_number)
        .bind(draft.customer_id)
        .bind(draft.user_id)
        .bind(now)
        .bind(draft.status)
        .bind(totals.total.cents())
        .bind(draft.discount_cents)
        .bind(totals.final_amount.cents())
        .bind(draft.payment_method)
        .bind(&draft.notes)
        .execute(&mut *tx)
        .await?;

        let order_id = result.last_insert_rowid();

        for (line, price) in &priced {
            let subtotal = ledger::line_subtotal(*price, line.quantity);
            sqlx::query(
                "INSERT INTO order_lines \
                 (order_id, product_id, quantity, unit_price_cents, subtotal_cents) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(price.cents())
            .bind(subtotal.cents())
            .execute(&mut *tx)
            .await?;
        }

        if draft.status == OrderStatus::Completed {
            if let Some(customer_id) = draft.customer_id {
                let points = ledger::loyalty_points(totals.final_amount);
                credit_loyalty(&mut tx, customer_id, points).await?;
            }
        }

        log_activity(
            &mut tx,
            Some(draft.user_id),
            "Order created",
            format!("Order #{order_number} was created"),
            now,
        )
        .await?;

        tx.commit().await?;

        info!(order_number = %order_number, total_cents = totals.total.cents(), "Order created");

        Ok(Order {
            id: order_id,
            order_number,
            customer_id: draft.customer_id,
            user_id: draft.user_id,
            order_date: now,
            status: draft.status,
            total_amount_cents: totals.total.cents(),
            discount_cents: draft.discount_cents,
            final_amount_cents: totals.final_amount.cents(),
            payment_method: draft.payment_method,
            notes: draft.notes,
        })
    }

    /// Transitions an order's status, applying the side effects exactly once.
    ///
    /// - `pending -> completed`: credits loyalty points to the customer
    /// - `pending -> cancelled`: restores the decremented stock
    ///
    /// Any other transition (including a repeat of either) is a conflict:
    /// the side effects must not be re-applied.
    pub async fn update_order_status(&self, id: i64, new_status: OrderStatus) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))?;

        if !order.status.can_transition_to(new_status) {
            return Err(CoreError::IllegalTransition {
                from: order.status.as_str(),
                to: new_status.as_str(),
            }
            .into());
        }

        // Guard on the prior status as well, in case another connection
        // transitioned the order between our read and this write.
        let result = sqlx::query("UPDATE orders SET status = ?2 WHERE id = ?1 AND status = ?3")
            .bind(id)
            .bind(new_status)
            .bind(order.status)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::IllegalTransition {
                from: order.status.as_str(),
                to: new_status.as_str(),
            }
            .into());
        }

        match new_status {
            OrderStatus::Completed => {
                if let Some(customer_id) = order.customer_id {
                    let points = ledger::loyalty_points(order.final_amount());
                    credit_loyalty(&mut tx, customer_id, points).await?;
                }
            }
            OrderStatus::Cancelled => {
                let lines = fetch_lines(&mut tx, id).await?;
                // Restoration always succeeds; the strict policy only guards
                // decrements.
                for delta in ledger::order_cancellation_deltas(&lines) {
                    apply_stock_delta(&mut tx, delta, StockPolicy::AllowNegative).await?;
                }
            }
            OrderStatus::Pending => unreachable!("no transition targets pending"),
        }

        let now = Utc::now();
        log_activity(
            &mut tx,
            Some(order.user_id),
            "Order status updated",
            format!(
                "Order #{} marked {}",
                order.order_number,
                new_status.as_str()
            ),
            now,
        )
        .await?;

        tx.commit().await?;

        info!(order_number = %order.order_number, status = new_status.as_str(), "Order status updated");

        Ok(Order {
            status: new_status,
            ..order
        })
    }

    /// Gets an order by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Order> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");

        sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Gets an order by its document number.
    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = ?1");

        Ok(sqlx::query_as::<_, Order>(&sql)
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Returns the lines of an order.
    pub async fn lines(&self, order_id: i64) -> DbResult<Vec<OrderLine>> {
        let sql = format!("SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = ?1 ORDER BY id");

        Ok(sqlx::query_as::<_, OrderLine>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Lists all orders, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY order_date DESC, id DESC");

        Ok(sqlx::query_as::<_, Order>(&sql).fetch_all(&self.pool).await?)
    }

    /// Returns the most recent orders.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY order_date DESC, id DESC LIMIT ?1"
        );

        Ok(sqlx::query_as::<_, Order>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Lists a customer's orders, newest first.
    pub async fn by_customer(&self, customer_id: i64) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = ?1 \
             ORDER BY order_date DESC, id DESC"
        );

        Ok(sqlx::query_as::<_, Order>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?)
    }
}

async fn fetch_product(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    product_id: i64,
) -> DbResult<Product> {
    sqlx::query_as::<_, Product>(
        "SELECT id, name, sku, barcode, description, category_id, cost_price_cents, \
         selling_price_cents, stock_quantity, alert_threshold FROM products WHERE id = ?1",
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| DbError::not_found("Product", product_id))
}

async fn fetch_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    order_id: i64,
) -> DbResult<Vec<OrderLine>> {
    let sql = format!("SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = ?1 ORDER BY id");

    Ok(sqlx::query_as::<_, OrderLine>(&sql)
        .bind(order_id)
        .fetch_all(&mut **tx)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use crate::repository::testutil::{seed_customer, seed_product, seed_user, test_db};
    use lotus_core::{PaymentMethod, ValidationError};

    fn draft(customer_id: Option<i64>, user_id: i64) -> OrderDraft {
        OrderDraft {
            customer_id,
            user_id,
            status: OrderStatus::Pending,
            discount_cents: 0,
            payment_method: PaymentMethod::Cash,
            notes: None,
        }
    }

    fn line(product_id: i64, quantity: i64) -> OrderLineDraft {
        OrderLineDraft {
            product_id,
            quantity,
        }
    }

    #[tokio::test]
    async fn creating_an_order_decrements_stock_and_derives_totals() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let p1 = seed_product(&db, "P1", 1_000, 10).await;
        let p2 = seed_product(&db, "P2", 2_500, 10).await;

        let mut d = draft(None, user);
        d.discount_cents = 500;
        let order = db
            .orders()
            .create_order(d, &[line(p1, 3), line(p2, 2)])
            .await
            .unwrap();

        // total = 3*1000 + 2*2500, final = total - discount
        assert_eq!(order.total_amount_cents, 8_000);
        assert_eq!(order.final_amount_cents, 7_500);
        assert!(order.order_number.starts_with("ORD-"));

        let lines = db.orders().lines(order.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        for l in &lines {
            assert_eq!(l.subtotal_cents, l.unit_price_cents * l.quantity);
        }
        let sum: i64 = lines.iter().map(|l| l.subtotal_cents).sum();
        assert_eq!(sum, order.total_amount_cents);

        assert_eq!(db.products().get_by_id(p1).await.unwrap().stock_quantity, 7);
        assert_eq!(db.products().get_by_id(p2).await.unwrap().stock_quantity, 8);
    }

    #[tokio::test]
    async fn line_prices_are_frozen_at_creation() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let pid = seed_product(&db, "SNAP", 1_000, 10).await;

        let order = db
            .orders()
            .create_order(draft(None, user), &[line(pid, 1)])
            .await
            .unwrap();

        let mut product = db.products().get_by_id(pid).await.unwrap();
        product.selling_price_cents = 9_999;
        db.products().update(&product).await.unwrap();

        let lines = db.orders().lines(order.id).await.unwrap();
        assert_eq!(lines[0].unit_price_cents, 1_000);

        let reread = db.orders().get_by_id(order.id).await.unwrap();
        assert_eq!(reread.total_amount_cents, 1_000);
    }

    #[tokio::test]
    async fn completion_credits_loyalty_once() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let customer = seed_customer(&db).await;
        // 19 * 2500 = 47,500 -> floor(47500 / 10000) = 4 points
        let pid = seed_product(&db, "LOYAL", 2_500, 100).await;

        let order = db
            .orders()
            .create_order(draft(Some(customer), user), &[line(pid, 19)])
            .await
            .unwrap();
        assert_eq!(order.final_amount_cents, 47_500);

        db.orders()
            .update_order_status(order.id, OrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(
            db.customers().get_by_id(customer).await.unwrap().loyalty_points,
            4
        );

        // A second completion is rejected and must not credit again.
        let err = db
            .orders()
            .update_order_status(order.id, OrderStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::IllegalTransition { .. })
        ));
        assert_eq!(
            db.customers().get_by_id(customer).await.unwrap().loyalty_points,
            4
        );
    }

    #[tokio::test]
    async fn completion_without_customer_succeeds_silently() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let pid = seed_product(&db, "WALKIN", 5_000, 10).await;

        let order = db
            .orders()
            .create_order(draft(None, user), &[line(pid, 3)])
            .await
            .unwrap();

        let completed = db
            .orders()
            .update_order_status(order.id, OrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn cancellation_restores_stock_but_completion_does_not() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let pid = seed_product(&db, "CANCEL", 1_000, 10).await;

        // Document numbers carry a millisecond suffix; distinct instants
        // keep the two orders in this test off the same one.
        let base = Utc::now();

        let cancelled = db
            .orders()
            .create_order_at(draft(None, user), &[line(pid, 4)], base)
            .await
            .unwrap();
        db.orders()
            .update_order_status(cancelled.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(db.products().get_by_id(pid).await.unwrap().stock_quantity, 10);

        let completed = db
            .orders()
            .create_order_at(
                draft(None, user),
                &[line(pid, 4)],
                base + chrono::Duration::milliseconds(1),
            )
            .await
            .unwrap();
        db.orders()
            .update_order_status(completed.id, OrderStatus::Completed)
            .await
            .unwrap();
        // Stock moved at creation, completion leaves it alone.
        assert_eq!(db.products().get_by_id(pid).await.unwrap().stock_quantity, 6);
    }

    #[tokio::test]
    async fn cancelled_order_cannot_be_completed() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let pid = seed_product(&db, "DEAD", 1_000, 10).await;

        let order = db
            .orders()
            .create_order(draft(None, user), &[line(pid, 1)])
            .await
            .unwrap();
        db.orders()
            .update_order_status(order.id, OrderStatus::Cancelled)
            .await
            .unwrap();

        let err = db
            .orders()
            .update_order_status(order.id, OrderStatus::Completed)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn empty_order_is_rejected_without_a_record() {
        let db = test_db().await;
        let user = seed_user(&db).await;

        let err = db.orders().create_order(draft(None, user), &[]).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::EmptyLines))
        ));

        assert!(db.orders().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_product_rolls_back_everything() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let pid = seed_product(&db, "REAL", 1_000, 10).await;

        let err = db
            .orders()
            .create_order(draft(None, user), &[line(pid, 2), line(999_999, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        // The valid line's decrement must have been rolled back too.
        assert_eq!(db.products().get_by_id(pid).await.unwrap().stock_quantity, 10);
        assert!(db.orders().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn permissive_policy_allows_oversell() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let pid = seed_product(&db, "OVER", 1_000, 2).await;

        db.orders()
            .create_order(draft(None, user), &[line(pid, 5)])
            .await
            .unwrap();

        assert_eq!(db.products().get_by_id(pid).await.unwrap().stock_quantity, -3);
    }

    #[tokio::test]
    async fn strict_policy_rejects_oversell_atomically() {
        let db = Database::new(
            DbConfig::in_memory().stock_policy(StockPolicy::RejectNegative),
        )
        .await
        .unwrap();
        let user = seed_user(&db).await;
        let ok = seed_product(&db, "OK", 1_000, 10).await;
        let scarce = seed_product(&db, "SCARCE", 1_000, 2).await;

        let err = db
            .orders()
            .create_order(draft(None, user), &[line(ok, 1), line(scarce, 5)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock { .. })
        ));

        assert_eq!(db.products().get_by_id(ok).await.unwrap().stock_quantity, 10);
        assert_eq!(db.products().get_by_id(scarce).await.unwrap().stock_quantity, 2);
        assert!(db.orders().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn creating_completed_order_credits_immediately() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let customer = seed_customer(&db).await;
        let pid = seed_product(&db, "DIRECT", 12_000, 10).await;

        let mut d = draft(Some(customer), user);
        d.status = OrderStatus::Completed;
        db.orders().create_order(d, &[line(pid, 1)]).await.unwrap();

        assert_eq!(
            db.customers().get_by_id(customer).await.unwrap().loyalty_points,
            1
        );
    }

    #[tokio::test]
    async fn unknown_customer_fails_creation() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let pid = seed_product(&db, "NOCUST", 1_000, 10).await;

        let err = db
            .orders()
            .create_order(draft(Some(424_242), user), &[line(pid, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(db.products().get_by_id(pid).await.unwrap().stock_quantity, 10);
    }

    #[tokio::test]
    async fn creation_writes_an_audit_row() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let pid = seed_product(&db, "AUDIT", 1_000, 10).await;

        let order = db
            .orders()
            .create_order(draft(None, user), &[line(pid, 1)])
            .await
            .unwrap();

        let entries = db.activity().recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "Order created");
        assert!(entries[0]
            .details
            .as_deref()
            .unwrap()
            .contains(&order.order_number));
    }

    #[tokio::test]
    async fn duplicate_lines_for_one_product_merge_their_stock_effect() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let pid = seed_product(&db, "MERGE", 1_000, 10).await;

        let order = db
            .orders()
            .create_order(draft(None, user), &[line(pid, 2), line(pid, 3)])
            .await
            .unwrap();

        assert_eq!(db.products().get_by_id(pid).await.unwrap().stock_quantity, 5);
        assert_eq!(order.total_amount_cents, 5_000);

        db.orders()
            .update_order_status(order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(db.products().get_by_id(pid).await.unwrap().stock_quantity, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creations_never_lose_a_stock_update() {
        // A shared in-memory database only holds one connection, so this
        // test runs against a file-backed pool where writers genuinely race.
        let path = std::env::temp_dir().join(format!(
            "lotus-concurrent-orders-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let user = seed_user(&db).await;
        let pid = seed_product(&db, "RACE", 1_000, 1_000).await;

        let base = Utc::now();
        let mut handles = Vec::new();
        for i in 0..8i64 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.orders()
                    .create_order_at(
                        draft(None, user),
                        &[line(pid, 5)],
                        base + chrono::Duration::milliseconds(i),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // 8 writers x 5 units each; a lost update would leave stock high.
        assert_eq!(
            db.products().get_by_id(pid).await.unwrap().stock_quantity,
            1_000 - 8 * 5
        );
        assert_eq!(db.orders().list_all().await.unwrap().len(), 8);

        db.close().await;
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }
}
