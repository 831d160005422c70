use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::post,
};
use services::services::users::AcceptedInvitation;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

/// POST /api/invitations/{token}/accept
/// Creates the invited user and returns a session token for them.
pub async fn accept_invitation(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<ResponseJson<ApiResponse<AcceptedInvitation>>, ApiError> {
    let accepted = state
        .users()
        .accept_invitation(&state.codec, &token)
        .await?;
    Ok(ResponseJson(ApiResponse::success(accepted)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/invitations/{token}/accept", post(accept_invitation))
}
