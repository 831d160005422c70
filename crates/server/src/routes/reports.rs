use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use services::services::report::ActivityReport;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    auth::{Authorized, ClientOnly},
    error::ApiError,
};

/// GET /api/{org_slug}/client/reports
/// Closed activities at the caller's client's buildings.
pub async fn client_reports(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<ClientOnly>,
) -> Result<ResponseJson<ApiResponse<Vec<ActivityReport>>>, ApiError> {
    let reports = state.reports().client_reports(&scope).await?;
    Ok(ResponseJson(ApiResponse::success(reports)))
}

pub async fn client_report(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<ClientOnly>,
    Path((_, activity_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<ActivityReport>>, ApiError> {
    let report = state.reports().client_report(&scope, activity_id).await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

/// Mounted under `/api/{org_slug}/client`.
pub fn client_router() -> Router<AppState> {
    Router::new()
        .route("/reports", get(client_reports))
        .route("/reports/{activity_id}", get(client_report))
}
