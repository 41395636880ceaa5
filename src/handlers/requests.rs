use crate::{
    auth::AuthUser,
    entities::item_request::RequestStatus,
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, success_response, validate_input, PaginatedResponse,
    },
    services::requests::{CreateRequestInput, RequestLine},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
pub struct RequestListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    /// One of pending, approved, rejected, fulfilled
    pub status: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RequestLineDto {
    pub item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRequestRequest {
    pub department_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub lines: Vec<RequestLineDto>,
}

pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<RequestListQuery>,
) -> Result<Response, ApiError> {
    let status = match &query.status {
        Some(raw) => Some(RequestStatus::parse(raw).ok_or_else(|| ApiError::BadRequest {
            message: format!("Unknown request status: {}", raw),
        })?),
        None => None,
    };

    let page = query.page.max(1);
    let per_page = query.per_page.clamp(1, 100);
    let (rows, total) = state
        .services
        .requests
        .list(status, page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        rows, page, per_page, total,
    )))
}

pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let result = state
        .services
        .requests
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "request": result.request,
        "lines": result.lines,
    })))
}

pub async fn create_request(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateRequestRequest>,
) -> Result<Response, ApiError> {
    validate_input(&request)?;

    let input = CreateRequestInput {
        department_id: request.department_id,
        event_id: request.event_id,
        notes: request.notes,
        lines: request
            .lines
            .into_iter()
            .map(|line| RequestLine {
                item_id: line.item_id,
                quantity: line.quantity,
            })
            .collect(),
    };

    let result = state
        .services
        .requests
        .create(&user, input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(serde_json::json!({
        "request": result.request,
        "lines": result.lines,
    })))
}

pub async fn approve_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    let request = state
        .services
        .requests
        .approve(&user, id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(request))
}

pub async fn reject_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    let request = state
        .services
        .requests
        .reject(&user, id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(request))
}

pub async fn fulfill_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    let result = state
        .services
        .requests
        .fulfill(&user, id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "request": result.request,
        "lines": result.lines,
    })))
}
