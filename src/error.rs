use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Blockchain RPC error: {0}")]
    BlockchainRPC(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Participant data not found: {0}")]
    ParticipantNotFound(String),

    #[error("Invalid challenge type: {0}")]
    InvalidChallengeType(i64),

    #[error("Challenge {0} already settled")]
    AlreadySettled(u64),

    #[error("Challenge {0} is being settled by another run")]
    SettlementInProgress(u64),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// Short machine-readable code used in error bodies and cron item reports.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::BlockchainRPC(_) => "BLOCKCHAIN_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::ParticipantNotFound(_) => "PARTICIPANT_NOT_FOUND",
            AppError::InvalidChallengeType(_) => "INVALID_CHALLENGE_TYPE",
            AppError::AlreadySettled(_) => "ALREADY_SETTLED",
            AppError::SettlementInProgress(_) => "SETTLEMENT_IN_PROGRESS",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::ParticipantNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidChallengeType(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadySettled(_) | AppError::SettlementInProgress(_) => StatusCode::CONFLICT,
            AppError::BlockchainRPC(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let details = match &self {
            AppError::InvalidChallengeType(value) => {
                Some(serde_json::json!({ "challenge_type": value, "allowed": "0..=6" }))
            }
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!(code, error = %self, "request failed");
        }

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_not_found_maps_to_404() {
        let err = AppError::ParticipantNotFound("0xabc".to_string());
        assert_eq!(err.code(), "PARTICIPANT_NOT_FOUND");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_challenge_type_is_client_error() {
        let err = AppError::InvalidChallengeType(9);
        assert!(err.to_string().contains('9'));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn concurrent_settlement_is_a_conflict() {
        let err = AppError::SettlementInProgress(7);
        assert_eq!(err.code(), "SETTLEMENT_IN_PROGRESS");
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn ledger_failures_are_gateway_errors() {
        let err = AppError::BlockchainRPC("nonce too low".to_string());
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
