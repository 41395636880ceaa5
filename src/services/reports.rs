use crate::{
    db::DbPool,
    entities::{
        item::{self, ItemStatus},
        item_request::{self, RequestStatus},
    },
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Aggregated stockroom snapshot for the dashboard
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardReport {
    pub total_items: u64,
    /// Sum of quantity * cost price across all items
    #[schema(value_type = String)]
    pub total_stock_value: Decimal,
    pub low_stock_count: u64,
    pub out_of_stock_count: u64,
    pub discontinued_count: u64,
    pub pending_requests: u64,
}

pub struct ReportService {
    db: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Computes the dashboard from live data; nothing here is cached
    pub async fn dashboard(&self) -> Result<DashboardReport, ServiceError> {
        let db = self.db.as_ref();

        let items = item::Entity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut total_stock_value = Decimal::ZERO;
        let mut low_stock_count = 0;
        let mut out_of_stock_count = 0;
        let mut discontinued_count = 0;

        for item in &items {
            total_stock_value += item.total_value();
            match item.status() {
                ItemStatus::Discontinued => discontinued_count += 1,
                ItemStatus::OutOfStock => out_of_stock_count += 1,
                ItemStatus::Available => {}
            }
            if item.status() != ItemStatus::Discontinued && item.is_low_stock() {
                low_stock_count += 1;
            }
        }

        let pending_requests = item_request::Entity::find()
            .filter(item_request::Column::Status.eq(RequestStatus::Pending.as_str()))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(DashboardReport {
            total_items: items.len() as u64,
            total_stock_value,
            low_stock_count,
            out_of_stock_count,
            discontinued_count,
            pending_requests,
        })
    }
}
