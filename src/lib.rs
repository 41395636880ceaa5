//! Stockroom API Library
//!
//! Inventory tracking backend: items and their categorisation, suppliers,
//! departments, the stock transaction ledger and the item request
//! workflow.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{routing::get, routing::post, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::auth::policy::consts as perm;
use crate::auth::AuthRouterExt;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// API v1 routes, grouped by the permission that gates them
pub fn api_v1_routes() -> Router<AppState> {
    // Items
    let items_read = Router::new()
        .route("/items", get(handlers::items::list_items))
        .route("/items/low-stock", get(handlers::items::low_stock_items))
        .route("/items/:id", get(handlers::items::get_item))
        .with_permission(perm::ITEMS_READ);

    let items_create = Router::new()
        .route("/items", post(handlers::items::create_item))
        .with_permission(perm::ITEMS_CREATE);

    let items_update = Router::new()
        .route("/items/:id", axum::routing::put(handlers::items::update_item))
        .with_permission(perm::ITEMS_UPDATE);

    let items_delete = Router::new()
        .route(
            "/items/:id",
            axum::routing::delete(handlers::items::delete_item),
        )
        .with_permission(perm::ITEMS_DELETE);

    // Stock ledger
    let transactions_read = Router::new()
        .route(
            "/items/:id/transactions",
            get(handlers::items::list_item_transactions),
        )
        .with_permission(perm::TRANSACTIONS_READ);

    let transactions_write = Router::new()
        .route(
            "/items/:id/transactions",
            post(handlers::items::apply_item_transaction),
        )
        .with_permission(perm::TRANSACTIONS_ADJUST);

    // Categories and subcategories
    let categories_read = Router::new()
        .route("/categories", get(handlers::categories::list_categories))
        .route("/categories/:id", get(handlers::categories::get_category))
        .route(
            "/categories/:id/subcategories",
            get(handlers::categories::get_category_subcategories),
        )
        .with_permission(perm::CATEGORIES_READ);

    let categories_create = Router::new()
        .route("/categories", post(handlers::categories::create_category))
        .with_permission(perm::CATEGORIES_CREATE);

    let categories_update = Router::new()
        .route(
            "/categories/:id",
            axum::routing::put(handlers::categories::update_category),
        )
        .with_permission(perm::CATEGORIES_UPDATE);

    let categories_delete = Router::new()
        .route(
            "/categories/:id",
            axum::routing::delete(handlers::categories::delete_category),
        )
        .with_permission(perm::CATEGORIES_DELETE);

    let subcategories_read = Router::new()
        .route(
            "/subcategories",
            get(handlers::subcategories::list_subcategories),
        )
        .route(
            "/subcategories/:id",
            get(handlers::subcategories::get_subcategory),
        )
        .with_permission(perm::SUBCATEGORIES_READ);

    let subcategories_create = Router::new()
        .route(
            "/subcategories",
            post(handlers::subcategories::create_subcategory),
        )
        .with_permission(perm::SUBCATEGORIES_CREATE);

    let subcategories_update = Router::new()
        .route(
            "/subcategories/:id",
            axum::routing::put(handlers::subcategories::update_subcategory),
        )
        .with_permission(perm::SUBCATEGORIES_UPDATE);

    let subcategories_delete = Router::new()
        .route(
            "/subcategories/:id",
            axum::routing::delete(handlers::subcategories::delete_subcategory),
        )
        .with_permission(perm::SUBCATEGORIES_DELETE);

    // Departments
    let departments_read = Router::new()
        .route("/departments", get(handlers::departments::list_departments))
        .route(
            "/departments/:id",
            get(handlers::departments::get_department),
        )
        .with_permission(perm::DEPARTMENTS_READ);

    let departments_create = Router::new()
        .route(
            "/departments",
            post(handlers::departments::create_department),
        )
        .with_permission(perm::DEPARTMENTS_CREATE);

    let departments_update = Router::new()
        .route(
            "/departments/:id",
            axum::routing::put(handlers::departments::update_department),
        )
        .with_permission(perm::DEPARTMENTS_UPDATE);

    let departments_delete = Router::new()
        .route(
            "/departments/:id",
            axum::routing::delete(handlers::departments::delete_department),
        )
        .with_permission(perm::DEPARTMENTS_DELETE);

    // Suppliers
    let suppliers_read = Router::new()
        .route("/suppliers", get(handlers::suppliers::list_suppliers))
        .route("/suppliers/:id", get(handlers::suppliers::get_supplier))
        .with_permission(perm::SUPPLIERS_READ);

    let suppliers_create = Router::new()
        .route("/suppliers", post(handlers::suppliers::create_supplier))
        .with_permission(perm::SUPPLIERS_CREATE);

    let suppliers_update = Router::new()
        .route(
            "/suppliers/:id",
            axum::routing::put(handlers::suppliers::update_supplier),
        )
        .with_permission(perm::SUPPLIERS_UPDATE);

    let suppliers_delete = Router::new()
        .route(
            "/suppliers/:id",
            axum::routing::delete(handlers::suppliers::delete_supplier),
        )
        .with_permission(perm::SUPPLIERS_DELETE);

    // Events
    let events_read = Router::new()
        .route("/events", get(handlers::events::list_events))
        .route("/events/:id", get(handlers::events::get_event))
        .with_permission(perm::EVENTS_READ);

    let events_create = Router::new()
        .route("/events", post(handlers::events::create_event))
        .with_permission(perm::EVENTS_CREATE);

    let events_update = Router::new()
        .route(
            "/events/:id",
            axum::routing::put(handlers::events::update_event),
        )
        .with_permission(perm::EVENTS_UPDATE);

    let events_delete = Router::new()
        .route(
            "/events/:id",
            axum::routing::delete(handlers::events::delete_event),
        )
        .with_permission(perm::EVENTS_DELETE);

    // Item requests
    let requests_read = Router::new()
        .route("/requests", get(handlers::requests::list_requests))
        .route("/requests/:id", get(handlers::requests::get_request))
        .with_permission(perm::REQUESTS_READ);

    let requests_create = Router::new()
        .route("/requests", post(handlers::requests::create_request))
        .with_permission(perm::REQUESTS_CREATE);

    let requests_approve = Router::new()
        .route(
            "/requests/:id/approve",
            post(handlers::requests::approve_request),
        )
        .route(
            "/requests/:id/reject",
            post(handlers::requests::reject_request),
        )
        .with_permission(perm::REQUESTS_APPROVE);

    let requests_fulfill = Router::new()
        .route(
            "/requests/:id/fulfill",
            post(handlers::requests::fulfill_request),
        )
        .with_permission(perm::REQUESTS_FULFILL);

    // Reports
    let reports = Router::new()
        .route("/reports/dashboard", get(handlers::reports::dashboard))
        .with_permission(perm::REPORTS_READ);

    Router::new()
        .merge(items_read)
        .merge(items_create)
        .merge(items_update)
        .merge(items_delete)
        .merge(transactions_read)
        .merge(transactions_write)
        .merge(categories_read)
        .merge(categories_create)
        .merge(categories_update)
        .merge(categories_delete)
        .merge(subcategories_read)
        .merge(subcategories_create)
        .merge(subcategories_update)
        .merge(subcategories_delete)
        .merge(departments_read)
        .merge(departments_create)
        .merge(departments_update)
        .merge(departments_delete)
        .merge(suppliers_read)
        .merge(suppliers_create)
        .merge(suppliers_update)
        .merge(suppliers_delete)
        .merge(events_read)
        .merge(events_create)
        .merge(events_update)
        .merge(events_delete)
        .merge(requests_read)
        .merge(requests_create)
        .merge(requests_approve)
        .merge(requests_fulfill)
        .merge(reports)
}
