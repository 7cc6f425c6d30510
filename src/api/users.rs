use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::users::{CreateUserRequest, CreatedUserResponse, FailureResponse, UserResponse};
use crate::config::StatusMode;
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

pub async fn list(_auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let users = state.user_service.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect::<Vec<_>>()))
}

pub async fn show(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    // No user can own an id that is not a UUID.
    let id = Uuid::parse_str(&id).map_err(|_| AppError::NotFound)?;
    let user = state.user_service.get(id).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(payload) = payload.map_err(|rejection| {
        AppError::BadRequest(format!("param is missing or the value is empty: user ({})", rejection.body_text()))
    })?;
    if payload.user.is_blank() {
        return Err(AppError::BadRequest("param is missing or the value is empty: user".to_string()));
    }

    let mode = state.config.users.status_mode;
    match state.user_service.register(payload.user.into()).await {
        Ok(created) => {
            let status = match mode {
                StatusMode::Legacy => StatusCode::OK,
                StatusMode::Standard => StatusCode::CREATED,
            };
            Ok((status, Json(CreatedUserResponse::from(created))).into_response())
        }
        Err(AppError::Validation(errors)) if mode == StatusMode::Legacy => {
            tracing::debug!(errors = %errors, "Registration rejected");
            Ok((StatusCode::OK, Json(FailureResponse::legacy())).into_response())
        }
        Err(e) => Err(e),
    }
}
