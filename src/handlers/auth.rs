use axum::{extract::State, http::StatusCode, Json};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::auth::{issue_token, verify_password, AuthUser};
use crate::entities::user::{self, Role};
use crate::errors::{AppError, AppResult, ValidatedJson};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// `POST /auth/login` — grounded in the original's `auth.py::login`.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<(StatusCode, Json<LoginResponse>)> {
    let account = user::Entity::find()
        .filter(user::Column::Email.eq(payload.email.clone()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &account.password_hash) {
        return Err(AppError::Unauthorized(
            "invalid email or password".to_string(),
        ));
    }

    let role = account
        .role()
        .ok_or_else(|| AppError::Internal(format!("user {} has an unknown role", account.id)))?;

    let access_token = issue_token(
        &state.config.jwt_secret_key,
        &state.config.jwt_algorithm,
        state.config.jwt_access_token_ttl_minutes,
        account.id,
        &account.email,
        role,
    )?;

    Ok((StatusCode::OK, Json(LoginResponse { access_token })))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: i32,
    pub email: String,
    pub role: String,
}

/// `GET /auth/me` — decodes the caller's own bearer claims.
pub async fn me(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.user_id,
        email: user.email,
        role: user.role.as_str().to_string(),
    })
}
