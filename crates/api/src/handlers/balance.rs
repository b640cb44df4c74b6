//! Token balance lookup.
//!
//! Routes:
//! - `GET /api/v1/balance` — the caller's current token balance.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use glaze_db::repositories::BalanceRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/balance
pub async fn get(State(state): State<AppState>, user: AuthUser) -> AppResult<impl IntoResponse> {
    let tokens = BalanceRepo::get(&state.pool, &user.user_id).await?;
    Ok(Json(DataResponse {
        data: json!({ "tokens": tokens }),
    }))
}
