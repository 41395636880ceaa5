use crate::{
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response,
        validate_input, PaginatedResponse, PaginationParams,
    },
    services::suppliers::{CreateSupplierInput, UpdateSupplierInput},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub contact_person: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSupplierRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub contact_person: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    pub notes: Option<String>,
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    let page = pagination.page();
    let per_page = pagination.per_page();
    let (rows, total) = state
        .services
        .suppliers
        .list(page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        rows, page, per_page, total,
    )))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let supplier = state
        .services
        .suppliers
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(supplier))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    Json(request): Json<CreateSupplierRequest>,
) -> Result<Response, ApiError> {
    validate_input(&request)?;

    let supplier = state
        .services
        .suppliers
        .create(CreateSupplierInput {
            name: request.name,
            contact_person: request.contact_person,
            email: request.email,
            phone: request.phone,
            address: request.address,
            website: request.website,
            notes: request.notes,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(supplier))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSupplierRequest>,
) -> Result<Response, ApiError> {
    validate_input(&request)?;

    let supplier = state
        .services
        .suppliers
        .update(
            id,
            UpdateSupplierInput {
                name: request.name,
                contact_person: request.contact_person.map(Some),
                email: request.email.map(Some),
                phone: request.phone.map(Some),
                address: request.address.map(Some),
                website: request.website.map(Some),
                notes: request.notes.map(Some),
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(supplier))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .services
        .suppliers
        .delete(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
