use crate::{
    db::DbPool,
    entities::{
        item::{self, ItemStatus},
        stock_transaction::{self, TransactionKind},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionError, TransactionTrait,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// One stock movement to record against an item.
///
/// For `in`, `out` and `return` the quantity is a positive magnitude. For
/// `adjust` it is the non-negative target quantity; the ledger row records
/// the signed difference from the previous balance.
#[derive(Debug, Clone)]
pub struct StockInput {
    pub kind: TransactionKind,
    pub quantity: i32,
    pub notes: Option<String>,
    pub reference: Option<String>,
    pub event_id: Option<Uuid>,
    pub created_by: Uuid,
}

/// Applies a stock movement inside an open transaction. The item balance
/// and the ledger row are written together or not at all.
pub async fn apply_in_txn<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    input: &StockInput,
) -> Result<(stock_transaction::Model, item::Model), ServiceError> {
    // SELECT ... FOR UPDATE so two concurrent outbound movements cannot
    // both pass the sufficiency check against the same stale balance.
    // SQLite serializes writers and ignores the lock clause.
    let item = item::Entity::find_by_id(item_id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id)))?;

    let previous_quantity = item.quantity;

    let (new_quantity, recorded_quantity) = match input.kind {
        TransactionKind::In | TransactionKind::Return => {
            if input.quantity <= 0 {
                return Err(ServiceError::InvalidInput(
                    "Quantity must be positive".to_string(),
                ));
            }
            (previous_quantity + input.quantity, input.quantity)
        }
        TransactionKind::Out => {
            if input.quantity <= 0 {
                return Err(ServiceError::InvalidInput(
                    "Quantity must be positive".to_string(),
                ));
            }
            let remaining = previous_quantity - input.quantity;
            if remaining < 0 {
                return Err(ServiceError::InsufficientStock(format!(
                    "Item {}: requested {}, have {}",
                    item.sku, input.quantity, previous_quantity
                )));
            }
            (remaining, input.quantity)
        }
        TransactionKind::Adjust => {
            if input.quantity < 0 {
                return Err(ServiceError::InvalidInput(
                    "Adjustment target cannot be negative".to_string(),
                ));
            }
            // The ledger keeps the signed delta so adjustments replay
            // like any other movement
            (input.quantity, input.quantity - previous_quantity)
        }
    };

    let new_status = ItemStatus::recompute(item.status(), new_quantity);

    let mut active_item: item::ActiveModel = item.into();
    active_item.quantity = Set(new_quantity);
    active_item.status = Set(new_status.as_str().to_string());
    if matches!(input.kind, TransactionKind::In | TransactionKind::Return) {
        active_item.last_restocked = Set(Some(Utc::now()));
    }

    let updated_item = active_item
        .update(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let ledger_row = stock_transaction::ActiveModel {
        item_id: Set(item_id),
        kind: Set(input.kind.as_str().to_string()),
        quantity: Set(recorded_quantity),
        previous_quantity: Set(previous_quantity),
        new_quantity: Set(new_quantity),
        notes: Set(input.notes.clone()),
        reference: Set(input.reference.clone()),
        event_id: Set(input.event_id),
        created_by: Set(input.created_by),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)?;

    info!(
        item_id = %item_id,
        kind = input.kind.as_str(),
        previous_quantity,
        new_quantity,
        "recorded stock transaction"
    );

    Ok((ledger_row, updated_item))
}

/// Stock ledger service. Every quantity change flows through here so the
/// transaction history stays the source of truth for item balances.
pub struct StockLedgerService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl StockLedgerService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Records a single stock movement atomically and emits events after
    /// commit.
    pub async fn apply(
        &self,
        item_id: Uuid,
        input: StockInput,
    ) -> Result<(stock_transaction::Model, item::Model), ServiceError> {
        let txn_input = input.clone();
        let (ledger_row, updated_item) = self
            .db
            .transaction::<_, (stock_transaction::Model, item::Model), ServiceError>(move |txn| {
                Box::pin(async move { apply_in_txn(txn, item_id, &txn_input).await })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.emit_events(&ledger_row, &updated_item).await?;

        Ok((ledger_row, updated_item))
    }

    async fn emit_events(
        &self,
        ledger_row: &stock_transaction::Model,
        item: &item::Model,
    ) -> Result<(), ServiceError> {
        self.event_sender
            .send(Event::StockApplied {
                item_id: item.id,
                transaction_id: ledger_row.id,
                kind: ledger_row.kind.clone(),
                previous_quantity: ledger_row.previous_quantity,
                new_quantity: ledger_row.new_quantity,
            })
            .await
            .map_err(ServiceError::EventError)?;

        if item.is_low_stock() {
            self.event_sender
                .send(Event::LowStock {
                    item_id: item.id,
                    quantity: item.quantity,
                    min_stock_level: item.min_stock_level,
                })
                .await
                .map_err(ServiceError::EventError)?;
        }

        Ok(())
    }

    /// Paginated ledger history for one item, most recent first
    pub async fn list_for_item(
        &self,
        item_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<stock_transaction::Model>, u64), ServiceError> {
        let db = self.db.as_ref();

        let exists = item::Entity::find_by_id(item_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if exists.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Item {} not found",
                item_id
            )));
        }

        let paginator = stock_transaction::Entity::find()
            .filter(stock_transaction::Column::ItemId.eq(item_id))
            .order_by_desc(stock_transaction::Column::Id)
            .paginate(db, per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::db_error)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((rows, total))
    }

    /// Most recent ledger entry for an item, if any
    pub async fn latest_entry(
        &self,
        item_id: Uuid,
    ) -> Result<Option<stock_transaction::Model>, ServiceError> {
        stock_transaction::Entity::find()
            .filter(stock_transaction::Column::ItemId.eq(item_id))
            .order_by_desc(stock_transaction::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}
