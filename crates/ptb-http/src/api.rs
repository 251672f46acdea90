use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use ptb_core::{
    codes::CodeStatus,
    domain::{PackageId, UserId},
    errors::Error,
    status::PackageStatus,
};

use crate::ApiState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCodeRequest {
    user_id: String,
}

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    package_id: String,
    new_status: String,
}

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal { error: String, details: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": error }))).into_response()
            }
            Self::NotFound(error) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": error }))).into_response()
            }
            Self::Internal { error, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error, "details": details })),
            )
                .into_response(),
        }
    }
}

pub async fn generate_code(
    State(state): State<ApiState>,
    Json(req): Json<GenerateCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.user_id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Необходимо указать userId".to_string(),
        ));
    }

    let code = state.codes.generate(&UserId(req.user_id.clone())).await;
    tracing::info!(user = %req.user_id, "pairing code generated");
    Ok(Json(json!({ "code": code })))
}

/// The web client's polling endpoint: `verified: false` until the bot has
/// seen the code, then the chat id exactly once, then 400.
pub async fn verify_code(
    State(state): State<ApiState>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match state.codes.consume(&req.code).await {
        Ok(CodeStatus::Pending) => Ok(Json(json!({ "verified": false }))),
        Ok(CodeStatus::Verified { user_id, chat_id }) => {
            tracing::info!(user = %user_id.0, chat = chat_id.0, "pairing completed");
            Ok(Json(json!({
                "verified": true,
                "userId": user_id.0,
                "telegramUserId": chat_id.0,
            })))
        }
        Err(Error::ExpiredCode) => Err(ApiError::BadRequest("Код истек".to_string())),
        Err(_) => Err(ApiError::BadRequest("Неверный код".to_string())),
    }
}

pub async fn notify_status_change(
    State(state): State<ApiState>,
    Json(req): Json<NotifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.package_id.trim().is_empty() || req.new_status.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Необходимо указать packageId и newStatus".to_string(),
        ));
    }

    let status = PackageStatus::parse(&req.new_status);
    match state
        .relay
        .notify(&PackageId(req.package_id.clone()), &status)
        .await
    {
        // Lack of opt-in is an expected skip; the caller is told the request
        // was accepted either way.
        Ok(_) => Ok(Json(json!({ "success": true }))),
        Err(Error::PackageNotFound(id)) => {
            Err(ApiError::NotFound(format!("Посылка не найдена: {id}")))
        }
        Err(e) => {
            tracing::error!(package = %req.package_id, "status notification failed: {e}");
            Err(ApiError::Internal {
                error: "Ошибка на сервере при отправке уведомления".to_string(),
                details: e.to_string(),
            })
        }
    }
}
