use crate::{
    errors::ApiError,
    handlers::common::{map_service_error, success_response},
    AppState,
};
use axum::{extract::State, response::Response};

pub async fn dashboard(State(state): State<AppState>) -> Result<Response, ApiError> {
    let report = state
        .services
        .reports
        .dashboard()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(report))
}
