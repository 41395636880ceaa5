use crate::{
    db::DbPool,
    entities::{
        category,
        item::{self, ItemStatus},
        subcategory, supplier,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Fields for a new item. Stock is not set here; the opening balance is
/// recorded as an `in` transaction so the ledger stays complete.
#[derive(Debug, Clone)]
pub struct CreateItemInput {
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub subcategory_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub min_stock_level: i32,
    pub max_stock_level: i32,
    pub location: Option<String>,
    pub shelf: Option<String>,
}

/// Partial update for an item. Quantity is absent on purpose; balances
/// only move through the stock ledger.
#[derive(Debug, Clone, Default)]
pub struct UpdateItemInput {
    pub sku: Option<String>,
    pub barcode: Option<Option<String>>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Option<Uuid>>,
    pub supplier_id: Option<Option<Uuid>>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub min_stock_level: Option<i32>,
    pub max_stock_level: Option<i32>,
    pub status: Option<ItemStatus>,
    pub location: Option<Option<String>>,
    pub shelf: Option<Option<String>>,
}

/// Filters for listing items
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub status: Option<ItemStatus>,
}

pub struct ItemService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ItemService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    pub async fn create(
        &self,
        created_by: Option<Uuid>,
        input: CreateItemInput,
    ) -> Result<item::Model, ServiceError> {
        let db = self.db.as_ref();

        if input.min_stock_level < 0 || input.max_stock_level < input.min_stock_level {
            return Err(ServiceError::InvalidInput(
                "Stock levels must satisfy 0 <= min <= max".to_string(),
            ));
        }
        if input.cost_price < Decimal::ZERO || input.selling_price < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Prices cannot be negative".to_string(),
            ));
        }

        let duplicate = item::Entity::find()
            .filter(item::Column::Sku.eq(input.sku.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "SKU {} is already in use",
                input.sku
            )));
        }

        if let Some(barcode) = &input.barcode {
            self.check_barcode_free(barcode).await?;
        }

        self.check_references(
            input.category_id,
            input.subcategory_id,
            input.supplier_id,
        )
        .await?;

        let model = item::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(input.sku),
            barcode: Set(input.barcode),
            name: Set(input.name),
            description: Set(input.description),
            category_id: Set(input.category_id),
            subcategory_id: Set(input.subcategory_id),
            supplier_id: Set(input.supplier_id),
            cost_price: Set(input.cost_price),
            selling_price: Set(input.selling_price),
            quantity: Set(0),
            min_stock_level: Set(input.min_stock_level),
            max_stock_level: Set(input.max_stock_level),
            status: Set(ItemStatus::OutOfStock.as_str().to_string()),
            location: Set(input.location),
            shelf: Set(input.shelf),
            created_by: Set(created_by),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        info!(item_id = %model.id, sku = %model.sku, "item created");

        self.event_sender
            .send(Event::ItemCreated(model.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(model)
    }

    pub async fn update(
        &self,
        item_id: Uuid,
        input: UpdateItemInput,
    ) -> Result<item::Model, ServiceError> {
        let db = self.db.as_ref();

        let existing = item::Entity::find_by_id(item_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id)))?;

        if let Some(new_sku) = &input.sku {
            if *new_sku != existing.sku {
                let duplicate = item::Entity::find()
                    .filter(item::Column::Sku.eq(new_sku.clone()))
                    .one(db)
                    .await
                    .map_err(ServiceError::db_error)?;
                if duplicate.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "SKU {} is already in use",
                        new_sku
                    )));
                }
            }
        }

        if let Some(Some(new_barcode)) = &input.barcode {
            if existing.barcode.as_deref() != Some(new_barcode.as_str()) {
                self.check_barcode_free(new_barcode).await?;
            }
        }

        let category_id = input.category_id.unwrap_or(existing.category_id);
        let subcategory_id = input
            .subcategory_id
            .clone()
            .unwrap_or(existing.subcategory_id);
        let supplier_id = input.supplier_id.clone().unwrap_or(existing.supplier_id);
        self.check_references(category_id, subcategory_id, supplier_id)
            .await?;

        let quantity = existing.quantity;
        let mut active: item::ActiveModel = existing.into();

        if let Some(sku) = input.sku {
            active.sku = Set(sku);
        }
        if let Some(barcode) = input.barcode {
            active.barcode = Set(barcode);
        }
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(subcategory_id) = input.subcategory_id {
            active.subcategory_id = Set(subcategory_id);
        }
        if let Some(supplier_id) = input.supplier_id {
            active.supplier_id = Set(supplier_id);
        }
        if let Some(cost_price) = input.cost_price {
            if cost_price < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(
                    "Prices cannot be negative".to_string(),
                ));
            }
            active.cost_price = Set(cost_price);
        }
        if let Some(selling_price) = input.selling_price {
            if selling_price < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(
                    "Prices cannot be negative".to_string(),
                ));
            }
            active.selling_price = Set(selling_price);
        }
        if let Some(min_stock_level) = input.min_stock_level {
            if min_stock_level < 0 {
                return Err(ServiceError::InvalidInput(
                    "Minimum stock level cannot be negative".to_string(),
                ));
            }
            active.min_stock_level = Set(min_stock_level);
        }
        if let Some(max_stock_level) = input.max_stock_level {
            active.max_stock_level = Set(max_stock_level);
        }
        if let Some(status) = input.status {
            // Discontinuing is a manual decision; any other requested
            // status is reconciled against the current balance
            let effective = match status {
                ItemStatus::Discontinued => ItemStatus::Discontinued,
                other => ItemStatus::recompute(other, quantity),
            };
            active.status = Set(effective.as_str().to_string());
        }
        if let Some(location) = input.location {
            active.location = Set(location);
        }
        if let Some(shelf) = input.shelf {
            active.shelf = Set(shelf);
        }

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send(Event::ItemUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    pub async fn delete(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let db = self.db.as_ref();

        let existing = item::Entity::find_by_id(item_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id)))?;

        item::Entity::delete_by_id(existing.id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        info!(item_id = %item_id, "item deleted");

        self.event_sender
            .send(Event::ItemDeleted(item_id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }

    pub async fn get(&self, item_id: Uuid) -> Result<item::Model, ServiceError> {
        item::Entity::find_by_id(item_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id)))
    }

    pub async fn list(
        &self,
        filter: ItemFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<item::Model>, u64), ServiceError> {
        let mut query = item::Entity::find();

        if let Some(search) = filter.search.filter(|s| !s.trim().is_empty()) {
            let needle = search.trim().to_string();
            query = query.filter(
                Condition::any()
                    .add(item::Column::Name.contains(&needle))
                    .add(item::Column::Sku.contains(&needle)),
            );
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(item::Column::CategoryId.eq(category_id));
        }
        if let Some(subcategory_id) = filter.subcategory_id {
            query = query.filter(item::Column::SubcategoryId.eq(subcategory_id));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(item::Column::SupplierId.eq(supplier_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(item::Column::Status.eq(status.as_str()));
        }

        let paginator = query
            .order_by_asc(item::Column::Name)
            .paginate(self.db.as_ref(), per_page.max(1));

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

    /// Items at or below their minimum stock level, discontinued excluded
    pub async fn low_stock(&self) -> Result<Vec<item::Model>, ServiceError> {
        item::Entity::find()
            .filter(
                Expr::col(item::Column::Quantity).lte(Expr::col(item::Column::MinStockLevel)),
            )
            .filter(item::Column::Status.ne(ItemStatus::Discontinued.as_str()))
            .order_by_asc(item::Column::Quantity)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    async fn check_barcode_free(&self, barcode: &str) -> Result<(), ServiceError> {
        let duplicate = item::Entity::find()
            .filter(item::Column::Barcode.eq(barcode))
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Barcode {} is already in use",
                barcode
            )));
        }
        Ok(())
    }

    async fn check_references(
        &self,
        category_id: Uuid,
        subcategory_id: Option<Uuid>,
        supplier_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let db = self.db.as_ref();

        let category = category::Entity::find_by_id(category_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if category.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Category {} not found",
                category_id
            )));
        }

        if let Some(subcategory_id) = subcategory_id {
            let subcategory = subcategory::Entity::find_by_id(subcategory_id)
                .one(db)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Subcategory {} not found", subcategory_id))
                })?;
            if subcategory.category_id != category_id {
                return Err(ServiceError::InvalidInput(
                    "Subcategory does not belong to the chosen category".to_string(),
                ));
            }
        }

        if let Some(supplier_id) = supplier_id {
            let supplier = supplier::Entity::find_by_id(supplier_id)
                .one(db)
                .await
                .map_err(ServiceError::db_error)?;
            if supplier.is_none() {
                return Err(ServiceError::NotFound(format!(
                    "Supplier {} not found",
                    supplier_id
                )));
            }
        }

        Ok(())
    }
}
