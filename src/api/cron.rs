use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use crate::{
    constants::CRON_SETTLE_MAX_BATCH,
    error::{AppError, Result},
    models::{ApiResponse, SettlementReport, SettlementStatus},
};

use super::{require_cron_secret, AppState};

#[derive(Debug, Deserialize)]
pub struct SettleChallengesRequest {
    pub challenge_ids: Vec<u64>,
}

#[derive(Debug, Serialize)]
pub struct SettleChallengesResponse {
    pub settled: usize,
    pub skipped: usize,
    pub failed: usize,
    pub results: Vec<SettlementReport>,
}

fn unique_ids(ids: &[u64]) -> Result<Vec<u64>> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() > CRON_SETTLE_MAX_BATCH {
        return Err(AppError::BadRequest(format!(
            "At most {} challenges per batch",
            CRON_SETTLE_MAX_BATCH
        )));
    }
    Ok(ids)
}

fn summarize(results: Vec<SettlementReport>) -> SettleChallengesResponse {
    let count = |status: SettlementStatus| results.iter().filter(|r| r.status == status).count();
    SettleChallengesResponse {
        settled: count(SettlementStatus::Settled),
        skipped: count(SettlementStatus::Skipped),
        failed: count(SettlementStatus::Failed),
        results,
    }
}

/// POST /api/v1/cron/settle-challenges
pub async fn settle_challenges(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SettleChallengesRequest>,
) -> Result<Json<ApiResponse<SettleChallengesResponse>>> {
    require_cron_secret(&headers, &state.config)?;
    let ids = unique_ids(&req.challenge_ids)?;

    let now_secs = chrono::Utc::now().timestamp();
    let results = state
        .relay
        .settle_due(&ids, now_secs, state.config.cron_settle_concurrency)
        .await;
    let response = summarize(results);

    tracing::info!(
        requested = ids.len(),
        settled = response.settled,
        skipped = response.skipped,
        failed = response.failed,
        "Cron settlement run finished"
    );

    Ok(Json(ApiResponse::success(response)))
}
