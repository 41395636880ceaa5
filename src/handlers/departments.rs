use crate::{
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response,
        validate_input, PaginatedResponse, PaginationParams,
    },
    services::departments::{CreateDepartmentInput, UpdateDepartmentInput},
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
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDepartmentRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
}

pub async fn list_departments(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    let page = pagination.page();
    let per_page = pagination.per_page();
    let (rows, total) = state
        .services
        .departments
        .list(page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        rows, page, per_page, total,
    )))
}

pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let department = state
        .services
        .departments
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(department))
}

pub async fn create_department(
    State(state): State<AppState>,
    Json(request): Json<CreateDepartmentRequest>,
) -> Result<Response, ApiError> {
    validate_input(&request)?;

    let department = state
        .services
        .departments
        .create(CreateDepartmentInput {
            name: request.name,
            description: request.description,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(department))
}

pub async fn update_department(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDepartmentRequest>,
) -> Result<Response, ApiError> {
    validate_input(&request)?;

    let department = state
        .services
        .departments
        .update(
            id,
            UpdateDepartmentInput {
                name: request.name,
                description: request.description.map(Some),
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(department))
}

pub async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .services
        .departments
        .delete(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
