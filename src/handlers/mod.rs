use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        categories::CategoryService, departments::DepartmentService, events::EventService,
        items::ItemService, reports::ReportService, requests::RequestService,
        stock_ledger::StockLedgerService, subcategories::SubcategoryService,
        suppliers::SupplierService,
    },
};
use std::sync::Arc;

pub mod categories;
pub mod common;
pub mod departments;
pub mod events;
pub mod health;
pub mod items;
pub mod reports;
pub mod requests;
pub mod subcategories;
pub mod suppliers;

/// Service bundle shared through the application state
#[derive(Clone)]
pub struct AppServices {
    pub items: Arc<ItemService>,
    pub categories: Arc<CategoryService>,
    pub subcategories: Arc<SubcategoryService>,
    pub departments: Arc<DepartmentService>,
    pub suppliers: Arc<SupplierService>,
    pub events: Arc<EventService>,
    pub stock_ledger: Arc<StockLedgerService>,
    pub requests: Arc<RequestService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            items: Arc::new(ItemService::new(db.clone(), event_sender.clone())),
            categories: Arc::new(CategoryService::new(db.clone())),
            subcategories: Arc::new(SubcategoryService::new(db.clone())),
            departments: Arc::new(DepartmentService::new(db.clone())),
            suppliers: Arc::new(SupplierService::new(db.clone())),
            events: Arc::new(EventService::new(db.clone())),
            stock_ledger: Arc::new(StockLedgerService::new(db.clone(), event_sender.clone())),
            requests: Arc::new(RequestService::new(db.clone(), event_sender)),
            reports: Arc::new(ReportService::new(db)),
        }
    }
}
