use crate::{
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response,
        validate_input, PaginatedResponse, PaginationParams,
    },
    services::events::{CreateEventInput, UpdateEventInput},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[schema(value_type = String, format = Date)]
    pub starts_on: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub ends_on: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub starts_on: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub ends_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    let page = pagination.page();
    let per_page = pagination.per_page();
    let (rows, total) = state
        .services
        .events
        .list(page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        rows, page, per_page, total,
    )))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let event = state
        .services
        .events
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(event))
}

pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<Response, ApiError> {
    validate_input(&request)?;

    let event = state
        .services
        .events
        .create(CreateEventInput {
            name: request.name,
            starts_on: request.starts_on,
            ends_on: request.ends_on,
            notes: request.notes,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(event))
}

pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Response, ApiError> {
    validate_input(&request)?;

    let event = state
        .services
        .events
        .update(
            id,
            UpdateEventInput {
                name: request.name,
                starts_on: request.starts_on,
                ends_on: request.ends_on,
                notes: request.notes.map(Some),
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .services
        .events
        .delete(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
