use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, ChallengeType, EvaluationRequest, EvaluationResult, MetricBasis, MetricKind},
    services::SettlementReceipt,
};

use super::{require_cron_secret, AppState};

#[derive(Debug, Serialize)]
pub struct ChallengeTypeInfo {
    pub code: i64,
    pub name: &'static str,
    pub basis: &'static str,
    pub metrics: Vec<MetricKind>,
}

fn challenge_type_info(kind: ChallengeType) -> ChallengeTypeInfo {
    let (basis, metrics) = match kind.basis() {
        MetricBasis::DailyAverage(metric) => ("daily_average", vec![metric]),
        MetricBasis::TrendMean(metrics) => ("trend_mean", metrics.to_vec()),
    };
    ChallengeTypeInfo {
        code: kind.code(),
        name: kind.name(),
        basis,
        metrics,
    }
}

fn validate_request(req: &EvaluationRequest) -> Result<()> {
    if req.challenger_address.trim().is_empty() {
        return Err(AppError::BadRequest("challenger_address is required".to_string()));
    }
    if req.is_two_sided
        && req
            .challenged_address
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .is_none()
    {
        return Err(AppError::BadRequest(
            "challenged_address is required for two-sided challenges".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/v1/challenges/types
pub async fn list_types() -> Json<ApiResponse<Vec<ChallengeTypeInfo>>> {
    let types = ChallengeType::ALL.into_iter().map(challenge_type_info).collect();
    Json(ApiResponse::success(types))
}

/// POST /api/v1/challenges/preview
pub async fn preview(
    State(state): State<AppState>,
    Json(req): Json<EvaluationRequest>,
) -> Result<Json<ApiResponse<EvaluationResult>>> {
    validate_request(&req)?;
    let result = state.relay.preview(&req).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// POST /api/v1/challenges/settle
pub async fn settle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EvaluationRequest>,
) -> Result<Json<ApiResponse<SettlementReceipt>>> {
    require_cron_secret(&headers, &state.config)?;
    validate_request(&req)?;

    let receipt = state.relay.settle(&req).await?;
    Ok(Json(ApiResponse::success(receipt)))
}
