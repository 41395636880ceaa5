use crate::{
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response,
        validate_input, PaginatedResponse,
    },
    services::subcategories::{CreateSubcategoryInput, UpdateSubcategoryInput},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SubcategoryListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub category_id: Option<Uuid>,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSubcategoryRequest {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSubcategoryRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
}

pub async fn list_subcategories(
    State(state): State<AppState>,
    Query(query): Query<SubcategoryListQuery>,
) -> Result<Response, ApiError> {
    let page = query.page.max(1);
    let per_page = query.per_page.clamp(1, 100);
    let (rows, total) = state
        .services
        .subcategories
        .list(query.category_id, page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        rows, page, per_page, total,
    )))
}

pub async fn get_subcategory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let subcategory = state
        .services
        .subcategories
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(subcategory))
}

pub async fn create_subcategory(
    State(state): State<AppState>,
    Json(request): Json<CreateSubcategoryRequest>,
) -> Result<Response, ApiError> {
    validate_input(&request)?;

    let subcategory = state
        .services
        .subcategories
        .create(CreateSubcategoryInput {
            category_id: request.category_id,
            name: request.name,
            description: request.description,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(subcategory))
}

pub async fn update_subcategory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSubcategoryRequest>,
) -> Result<Response, ApiError> {
    validate_input(&request)?;

    let subcategory = state
        .services
        .subcategories
        .update(
            id,
            UpdateSubcategoryInput {
                name: request.name,
                description: request.description.map(Some),
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(subcategory))
}

pub async fn delete_subcategory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .services
        .subcategories
        .delete(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
