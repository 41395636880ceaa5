use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stocking state of an item.
///
/// `available` and `out_of_stock` are derived from the quantity after every
/// ledger application; `discontinued` is a manual flag that stock arithmetic
/// never overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Available,
    OutOfStock,
    Discontinued,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::OutOfStock => "out_of_stock",
            ItemStatus::Discontinued => "discontinued",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(ItemStatus::Available),
            "out_of_stock" => Some(ItemStatus::OutOfStock),
            "discontinued" => Some(ItemStatus::Discontinued),
            _ => None,
        }
    }

    /// Status after a stock movement left `quantity` on hand.
    pub fn recompute(current: ItemStatus, quantity: i32) -> ItemStatus {
        match current {
            ItemStatus::Discontinued => ItemStatus::Discontinued,
            _ if quantity == 0 => ItemStatus::OutOfStock,
            _ => ItemStatus::Available,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub sku: String,
    #[sea_orm(unique)]
    pub barcode: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub subcategory_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    /// Cached projection of the ledger; only written together with a
    /// stock_transactions row.
    pub quantity: i32,
    pub min_stock_level: i32,
    pub max_stock_level: i32,
    pub status: String,
    pub location: Option<String>,
    pub shelf: Option<String>,
    pub last_restocked: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn status(&self) -> ItemStatus {
        ItemStatus::parse(&self.status).unwrap_or(ItemStatus::Available)
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock_level
    }

    pub fn needs_restock(&self) -> bool {
        self.quantity == 0
    }

    /// Margin over cost as a percentage; zero when the cost price is zero.
    pub fn profit_margin(&self) -> Decimal {
        if self.cost_price > Decimal::ZERO {
            (self.selling_price - self.cost_price) / self.cost_price * Decimal::from(100)
        } else {
            Decimal::ZERO
        }
    }

    pub fn total_value(&self) -> Decimal {
        Decimal::from(self.quantity) * self.cost_price
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::subcategory::Entity",
        from = "Column::SubcategoryId",
        to = "super::subcategory::Column::Id"
    )]
    Subcategory,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::stock_transaction::Entity")]
    StockTransactions,
    #[sea_orm(has_many = "super::requested_item::Entity")]
    RequestedItems,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::subcategory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subcategory.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::stock_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockTransactions.def()
    }
}

impl Related<super::requested_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequestedItems.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }
        active_model.updated_at = Set(Some(now));

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(quantity: i32, cost: Decimal, selling: Decimal) -> Model {
        Model {
            id: Uuid::new_v4(),
            sku: "TEST-1".into(),
            barcode: None,
            name: "Test item".into(),
            description: None,
            category_id: Uuid::new_v4(),
            subcategory_id: None,
            supplier_id: None,
            cost_price: cost,
            selling_price: selling,
            quantity,
            min_stock_level: 10,
            max_stock_level: 100,
            status: ItemStatus::Available.as_str().into(),
            location: None,
            shelf: None,
            last_restocked: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn low_stock_is_inclusive_of_the_minimum() {
        assert!(item(10, dec!(1), dec!(2)).is_low_stock());
        assert!(!item(11, dec!(1), dec!(2)).is_low_stock());
    }

    #[test]
    fn profit_margin_handles_zero_cost() {
        assert_eq!(item(0, dec!(0), dec!(5)).profit_margin(), Decimal::ZERO);
        assert_eq!(item(0, dec!(4), dec!(6)).profit_margin(), dec!(50));
    }

    #[test]
    fn total_value_is_quantity_times_cost() {
        assert_eq!(item(3, dec!(2.50), dec!(4)).total_value(), dec!(7.50));
    }

    #[test]
    fn recompute_never_overrides_discontinued() {
        assert_eq!(
            ItemStatus::recompute(ItemStatus::Discontinued, 5),
            ItemStatus::Discontinued
        );
        assert_eq!(
            ItemStatus::recompute(ItemStatus::Available, 0),
            ItemStatus::OutOfStock
        );
        assert_eq!(
            ItemStatus::recompute(ItemStatus::OutOfStock, 3),
            ItemStatus::Available
        );
    }
}
