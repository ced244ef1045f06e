//! # Purchase Repository
//!
//! The purchase transaction manager, the supply-side mirror of the order
//! manager. A purchase records inbound stock from a supplier; receiving it
//! applies the stock increase and the cost-price updates, exactly once.
//!
//! ## Status Transitions
//! ```text
//!              receive            cancel
//!   pending ─────────────► received       pending ───► cancelled
//!              stock+, cost updated       no stock effect
//! ```
//! Cancelling a purchase performs NO stock reversal: unlike orders, pending
//! purchases never moved stock in the first place.
//!
//! ## Cost Updates
//! Receiving sets each product's `cost_price_cents` to the line's invoiced
//! unit cost. When one product appears on several lines, the last line wins.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{apply_stock_delta, log_activity};
use lotus_core::{
    ledger, numbering, validation, CoreError, Purchase, PurchaseDraft, PurchaseLine,
    PurchaseLineDraft, PurchaseStatus, StockPolicy,
};

const PURCHASE_COLUMNS: &str =
    "id, purchase_number, supplier_id, user_id, purchase_date, status, total_amount_cents";

const LINE_COLUMNS: &str = "id, purchase_id, product_id, quantity, unit_cost_cents, subtotal_cents";

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Creates a purchase with its lines, atomically.
    ///
    /// Every referenced product must exist; a single unknown product rolls
    /// back the whole purchase. A purchase created directly as `received`
    /// applies its stock and cost effects in the same transaction.
    pub async fn create_purchase(
        &self,
        draft: PurchaseDraft,
        lines: &[PurchaseLineDraft],
    ) -> DbResult<Purchase> {
        validation::validate_purchase_lines(lines).map_err(CoreError::from)?;

        let now = Utc::now();
        let purchase_number = numbering::purchase_number(now);

        debug!(purchase_number = %purchase_number, lines = lines.len(), "Creating purchase");

        let mut tx = self.pool.begin().await?;

        if let Some(supplier_id) = draft.supplier_id {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM suppliers WHERE id = ?1")
                .bind(supplier_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(DbError::not_found("Supplier", supplier_id));
            }
        }

        for line in lines {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?1")
                .bind(line.product_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(DbError::not_found("Product", line.product_id));
            }
        }

        let total = ledger::purchase_total(lines);

        let result = sqlx::query(
            "INSERT INTO purchases \
             (purchase_number, supplier_id, user_id, purchase_date, status, total_amount_cents) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&purchase_number)
        .bind(draft.supplier_id)
        .bind(draft.user_id)
        .bind(now)
        .bind(draft.status)
        .bind(total.cents())
        .execute(&mut *tx)
        .await?;

        let purchase_id = result.last_insert_rowid();

        let mut inserted: Vec<PurchaseLine> = Vec::with_capacity(lines.len());
        for line in lines {
            let subtotal = line.unit_cost_cents * line.quantity;
            let result = sqlx::query(
                "INSERT INTO purchase_lines \
                 (purchase_id, product_id, quantity, unit_cost_cents, subtotal_cents) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(purchase_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_cost_cents)
            .bind(subtotal)
            .execute(&mut *tx)
            .await?;

            inserted.push(PurchaseLine {
                id: result.last_insert_rowid(),
                purchase_id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_cost_cents: line.unit_cost_cents,
                subtotal_cents: subtotal,
            });
        }

        if draft.status == PurchaseStatus::Received {
            apply_receipt_effects(&mut tx, &inserted).await?;
        }

        log_activity(
            &mut tx,
            Some(draft.user_id),
            "Purchase created",
            format!("Purchase #{purchase_number} was created"),
            now,
        )
        .await?;

        tx.commit().await?;

        info!(purchase_number = %purchase_number, total_cents = total.cents(), "Purchase created");

        Ok(Purchase {
            id: purchase_id,
            purchase_number,
            supplier_id: draft.supplier_id,
            user_id: draft.user_id,
            purchase_date: now,
            status: draft.status,
            total_amount_cents: total.cents(),
        })
    }

    /// Transitions a purchase's status, applying the side effects exactly once.
    ///
    /// - `pending -> received`: adds each line's quantity to stock and sets
    ///   the products' cost prices from the invoiced unit costs
    /// - `pending -> cancelled`: no stock effect
    ///
    /// Any other transition is a conflict, so receiving twice cannot double
    /// the stock increase.
    pub async fn update_purchase_status(
        &self,
        id: i64,
        new_status: PurchaseStatus,
    ) -> DbResult<Purchase> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ?1");
        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", id))?;

        if !purchase.status.can_transition_to(new_status) {
            return Err(CoreError::IllegalTransition {
                from: purchase.status.as_str(),
                to: new_status.as_str(),
            }
            .into());
        }

        let result = sqlx::query("UPDATE purchases SET status = ?2 WHERE id = ?1 AND status = ?3")
            .bind(id)
            .bind(new_status)
            .bind(purchase.status)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::IllegalTransition {
                from: purchase.status.as_str(),
                to: new_status.as_str(),
            }
            .into());
        }

        if new_status == PurchaseStatus::Received {
            let lines = fetch_lines(&mut tx, id).await?;
            apply_receipt_effects(&mut tx, &lines).await?;
        }

        let now = Utc::now();
        log_activity(
            &mut tx,
            Some(purchase.user_id),
            "Purchase status updated",
            format!(
                "Purchase #{} marked {}",
                purchase.purchase_number,
                new_status.as_str()
            ),
            now,
        )
        .await?;

        tx.commit().await?;

        info!(purchase_number = %purchase.purchase_number, status = new_status.as_str(), "Purchase status updated");

        Ok(Purchase {
            status: new_status,
            ..purchase
        })
    }

    /// Gets a purchase by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Purchase> {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ?1");

        sqlx::query_as::<_, Purchase>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", id))
    }

    /// Returns the lines of a purchase.
    pub async fn lines(&self, purchase_id: i64) -> DbResult<Vec<PurchaseLine>> {
        let sql =
            format!("SELECT {LINE_COLUMNS} FROM purchase_lines WHERE purchase_id = ?1 ORDER BY id");

        Ok(sqlx::query_as::<_, PurchaseLine>(&sql)
            .bind(purchase_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Lists all purchases, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Purchase>> {
        let sql = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases ORDER BY purchase_date DESC, id DESC"
        );

        Ok(sqlx::query_as::<_, Purchase>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Lists a supplier's purchases, newest first.
    pub async fn by_supplier(&self, supplier_id: i64) -> DbResult<Vec<Purchase>> {
        let sql = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE supplier_id = ?1 \
             ORDER BY purchase_date DESC, id DESC"
        );

        Ok(sqlx::query_as::<_, Purchase>(&sql)
            .bind(supplier_id)
            .fetch_all(&self.pool)
            .await?)
    }
}

/// Applies the receipt side effects: stock increases (merged per product)
/// and last-cost-wins cost price updates.
async fn apply_receipt_effects(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    lines: &[PurchaseLine],
) -> DbResult<()> {
    for delta in ledger::purchase_receipt_deltas(lines) {
        apply_stock_delta(tx, delta, StockPolicy::AllowNegative).await?;
    }

    for update in ledger::receipt_cost_updates(lines) {
        sqlx::query("UPDATE products SET cost_price_cents = ?2 WHERE id = ?1")
            .bind(update.product_id)
            .bind(update.unit_cost.cents())
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

async fn fetch_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    purchase_id: i64,
) -> DbResult<Vec<PurchaseLine>> {
    let sql =
        format!("SELECT {LINE_COLUMNS} FROM purchase_lines WHERE purchase_id = ?1 ORDER BY id");

    Ok(sqlx::query_as::<_, PurchaseLine>(&sql)
        .bind(purchase_id)
        .fetch_all(&mut **tx)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::testutil::{seed_product, seed_supplier, seed_user, test_db};
    use lotus_core::ValidationError;

    fn draft(supplier_id: Option<i64>, user_id: i64) -> PurchaseDraft {
        PurchaseDraft {
            supplier_id,
            user_id,
            status: PurchaseStatus::Pending,
        }
    }

    fn line(product_id: i64, quantity: i64, unit_cost_cents: i64) -> PurchaseLineDraft {
        PurchaseLineDraft {
            product_id,
            quantity,
            unit_cost_cents,
        }
    }

    #[tokio::test]
    async fn pending_purchase_moves_no_stock() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let supplier = seed_supplier(&db).await;
        let pid = seed_product(&db, "INBOUND", 1_000, 5).await;

        let purchase = db
            .purchases()
            .create_purchase(draft(Some(supplier), user), &[line(pid, 20, 600)])
            .await
            .unwrap();

        assert!(purchase.purchase_number.starts_with("PUR-"));
        assert_eq!(purchase.total_amount_cents, 12_000);
        assert_eq!(db.products().get_by_id(pid).await.unwrap().stock_quantity, 5);
    }

    #[tokio::test]
    async fn receiving_adds_stock_and_updates_cost_once() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let pid = seed_product(&db, "RECV", 1_000, 5).await;

        let purchase = db
            .purchases()
            .create_purchase(draft(None, user), &[line(pid, 20, 650)])
            .await
            .unwrap();

        db.purchases()
            .update_purchase_status(purchase.id, PurchaseStatus::Received)
            .await
            .unwrap();

        let product = db.products().get_by_id(pid).await.unwrap();
        assert_eq!(product.stock_quantity, 25);
        assert_eq!(product.cost_price_cents, 650);

        // Receiving again is a conflict and must not re-add stock.
        let err = db
            .purchases()
            .update_purchase_status(purchase.id, PurchaseStatus::Received)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(db.products().get_by_id(pid).await.unwrap().stock_quantity, 25);
    }

    #[tokio::test]
    async fn last_cost_wins_across_lines() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let pid = seed_product(&db, "COST", 1_000, 0).await;

        let mut d = draft(None, user);
        d.status = PurchaseStatus::Received;
        db.purchases()
            .create_purchase(d, &[line(pid, 5, 700), line(pid, 5, 720)])
            .await
            .unwrap();

        let product = db.products().get_by_id(pid).await.unwrap();
        assert_eq!(product.stock_quantity, 10);
        assert_eq!(product.cost_price_cents, 720);
    }

    #[tokio::test]
    async fn cancelling_a_purchase_leaves_stock_alone() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let pid = seed_product(&db, "CXL", 1_000, 5).await;

        let purchase = db
            .purchases()
            .create_purchase(draft(None, user), &[line(pid, 20, 600)])
            .await
            .unwrap();

        db.purchases()
            .update_purchase_status(purchase.id, PurchaseStatus::Cancelled)
            .await
            .unwrap();

        assert_eq!(db.products().get_by_id(pid).await.unwrap().stock_quantity, 5);

        // Terminal: cannot be received afterwards.
        let err = db
            .purchases()
            .update_purchase_status(purchase.id, PurchaseStatus::Received)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn empty_purchase_is_rejected_without_a_record() {
        let db = test_db().await;
        let user = seed_user(&db).await;

        let err = db
            .purchases()
            .create_purchase(draft(None, user), &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::EmptyLines))
        ));
        assert!(db.purchases().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_product_rolls_back_the_purchase() {
        let db = test_db().await;
        let user = seed_user(&db).await;
        let pid = seed_product(&db, "PART", 1_000, 5).await;

        let mut d = draft(None, user);
        d.status = PurchaseStatus::Received;
        let err = db
            .purchases()
            .create_purchase(d, &[line(pid, 10, 600), line(777_777, 1, 100)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        assert_eq!(db.products().get_by_id(pid).await.unwrap().stock_quantity, 5);
        assert!(db.purchases().list_all().await.unwrap().is_empty());
    }
}
