use crate::{
    auth::AuthUser,
    entities::{item::ItemStatus, stock_transaction::TransactionKind},
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response,
        validate_input, PaginatedResponse, PaginationParams,
    },
    services::{
        items::{CreateItemInput, ItemFilter, UpdateItemInput},
        stock_ledger::StockInput,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ItemListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    /// Substring match on name or SKU
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    /// One of available, out_of_stock, discontinued
    pub status: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1, max = 64))]
    pub barcode: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub subcategory_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    #[serde(default)]
    #[schema(value_type = String)]
    pub cost_price: Decimal,
    #[serde(default)]
    #[schema(value_type = String)]
    pub selling_price: Decimal,
    #[serde(default = "default_min_stock_level")]
    pub min_stock_level: i32,
    #[serde(default = "default_max_stock_level")]
    pub max_stock_level: i32,
    pub location: Option<String>,
    pub shelf: Option<String>,
}

fn default_min_stock_level() -> i32 {
    10
}

fn default_max_stock_level() -> i32 {
    100
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub barcode: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    #[schema(value_type = Option<String>)]
    pub cost_price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub selling_price: Option<Decimal>,
    pub min_stock_level: Option<i32>,
    pub max_stock_level: Option<i32>,
    /// One of available, out_of_stock, discontinued
    pub status: Option<String>,
    pub location: Option<String>,
    pub shelf: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApplyTransactionRequest {
    /// One of in, out, adjust, return
    #[validate(length(min = 1))]
    pub kind: String,
    /// Positive magnitude, or the non-negative target for adjust
    pub quantity: i32,
    pub notes: Option<String>,
    pub reference: Option<String>,
    pub event_id: Option<Uuid>,
}

pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemListQuery>,
) -> Result<Response, ApiError> {
    let status = match &query.status {
        Some(raw) => Some(ItemStatus::parse(raw).ok_or_else(|| ApiError::BadRequest {
            message: format!("Unknown item status: {}", raw),
        })?),
        None => None,
    };

    let filter = ItemFilter {
        search: query.search,
        category_id: query.category_id,
        subcategory_id: query.subcategory_id,
        supplier_id: query.supplier_id,
        status,
    };

    let page = query.page.max(1);
    let per_page = query.per_page.clamp(1, 100);
    let (items, total) = state
        .services
        .items
        .list(filter, page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        items, page, per_page, total,
    )))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let item = state.services.items.get(id).await.map_err(map_service_error)?;
    Ok(success_response(item))
}

pub async fn create_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateItemRequest>,
) -> Result<Response, ApiError> {
    validate_input(&request)?;

    let input = CreateItemInput {
        sku: request.sku,
        barcode: request.barcode,
        name: request.name,
        description: request.description,
        category_id: request.category_id,
        subcategory_id: request.subcategory_id,
        supplier_id: request.supplier_id,
        cost_price: request.cost_price,
        selling_price: request.selling_price,
        min_stock_level: request.min_stock_level,
        max_stock_level: request.max_stock_level,
        location: request.location,
        shelf: request.shelf,
    };

    let item = state
        .services
        .items
        .create(Some(user.user_id), input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(item))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Response, ApiError> {
    validate_input(&request)?;

    let status = match &request.status {
        Some(raw) => Some(ItemStatus::parse(raw).ok_or_else(|| ApiError::BadRequest {
            message: format!("Unknown item status: {}", raw),
        })?),
        None => None,
    };

    let input = UpdateItemInput {
        sku: request.sku,
        barcode: request.barcode.map(Some),
        name: request.name,
        description: request.description.map(Some),
        category_id: request.category_id,
        subcategory_id: request.subcategory_id.map(Some),
        supplier_id: request.supplier_id.map(Some),
        cost_price: request.cost_price,
        selling_price: request.selling_price,
        min_stock_level: request.min_stock_level,
        max_stock_level: request.max_stock_level,
        status,
        location: request.location.map(Some),
        shelf: request.shelf.map(Some),
    };

    let item = state
        .services
        .items
        .update(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .services
        .items
        .delete(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub async fn low_stock_items(State(state): State<AppState>) -> Result<Response, ApiError> {
    let items = state
        .services
        .items
        .low_stock()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}

pub async fn list_item_transactions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    let page = pagination.page();
    let per_page = pagination.per_page();
    let (rows, total) = state
        .services
        .stock_ledger
        .list_for_item(id, page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        rows, page, per_page, total,
    )))
}

pub async fn apply_item_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    Json(request): Json<ApplyTransactionRequest>,
) -> Result<Response, ApiError> {
    validate_input(&request)?;

    let kind = TransactionKind::parse(&request.kind).ok_or_else(|| ApiError::BadRequest {
        message: format!("Unknown transaction kind: {}", request.kind),
    })?;

    let input = StockInput {
        kind,
        quantity: request.quantity,
        notes: request.notes,
        reference: request.reference,
        event_id: request.event_id,
        created_by: user.user_id,
    };

    let (ledger_row, _item) = state
        .services
        .stock_ledger
        .apply(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(ledger_row))
}
