use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// One entry of the `INSUFFICIENT_INGREDIENTS` breakdown (spec §4.3.2e).
#[derive(Debug, Clone, Serialize)]
pub struct InsufficientIngredient {
    pub ingredient_id: i32,
    pub ingredient_name: String,
    pub required_qty: i32,
    pub available_qty: i32,
    pub is_out: bool,
    pub message: String,
}

/// The application's single error type. Every variant maps to exactly one
/// HTTP status and error `code`, per the Error Kinds table.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unauthorized")]
    Unauthorized(String),

    #[error("forbidden")]
    Forbidden(String),

    #[error("not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("insufficient ingredients")]
    InsufficientIngredients(Vec<InsufficientIngredient>),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InsufficientIngredients(_) => "INSUFFICIENT_INGREDIENTS",
            AppError::Internal(_) | AppError::Database(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InsufficientIngredients(_) => StatusCode::CONFLICT,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Validation(m)
            | AppError::Unauthorized(m)
            | AppError::Forbidden(m)
            | AppError::NotFound(m)
            | AppError::Conflict(m)
            | AppError::Internal(m) => m.clone(),
            AppError::InsufficientIngredients(_) => "insufficient ingredients".to_string(),
            AppError::Database(e) => e.to_string(),
        }
    }
}

/// Stable response envelope: `{error, code, request_id}`, with `errors`
/// present only for `INSUFFICIENT_INGREDIENTS`.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<InsufficientIngredient>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = crate::request_id::current();
        let status = self.status();

        match &self {
            AppError::Internal(msg) => error!(%request_id, "invariant breach or internal error: {}", msg),
            AppError::Database(err) => error!(%request_id, "database error: {}", err),
            AppError::Conflict(msg) => tracing::warn!(%request_id, "conflict: {}", msg),
            _ => {}
        }

        let errors = match &self {
            AppError::InsufficientIngredients(list) => Some(list.clone()),
            _ => None,
        };

        let body = ErrorBody {
            error: self.message(),
            code: self.code(),
            request_id,
            errors,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// A `Json<T>` extractor whose rejection routes through [`AppError`] instead
/// of axum's default plain-text `JsonRejection` response. Every handler
/// taking a body must use this in place of `axum::Json` — a bare `Json<T>`
/// argument lets axum call `JsonRejection::into_response` directly on a
/// malformed or type-mismatched body (e.g. `qty: true`), bypassing the
/// `{error, code, request_id}` envelope §7 requires for every error.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ValidatedJson(value))
    }
}

pub fn not_found_body(message: impl Into<String>) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": message.into(), "code": "NOT_FOUND" })),
    )
}

pub type AppResult<T> = Result<T, AppError>;
