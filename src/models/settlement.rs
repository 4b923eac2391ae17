use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::EvaluationResult;
use crate::error::{AppError, Result};

// ==================== SETTLEMENT LOG ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SettlementRecord {
    pub challenge_id: i64,
    pub challenge_type: i16,
    pub mode: String, // self_target / two_sided_compare
    pub outcome: bool,
    pub challenger_value: f64,
    pub challenged_value: Option<f64>,
    pub tx_hash: String,
    pub settled_at: DateTime<Utc>,
}

impl SettlementRecord {
    pub fn from_result(result: &EvaluationResult, tx_hash: String) -> Result<Self> {
        Ok(Self {
            challenge_id: challenge_id_to_db(result.challenge_id)?,
            challenge_type: result.challenge_type.code() as i16,
            mode: result.mode.as_str().to_string(),
            outcome: result.verdict.ledger_flag(),
            challenger_value: result.challenger.overall_average,
            challenged_value: result.challenged.as_ref().map(|c| c.overall_average),
            tx_hash,
            settled_at: Utc::now(),
        })
    }
}

/// Challenge ids are uint256 on-chain; only the i64 range is tracked off-chain.
pub fn challenge_id_to_db(challenge_id: u64) -> Result<i64> {
    i64::try_from(challenge_id)
        .map_err(|_| AppError::BadRequest(format!("Challenge id {} out of range", challenge_id)))
}

// ==================== CRON REPORT ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Settled,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementReport {
    pub challenge_id: u64,
    pub status: SettlementStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SettlementReport {
    pub fn settled(challenge_id: u64, outcome: bool, tx_hash: String) -> Self {
        Self {
            challenge_id,
            status: SettlementStatus::Settled,
            outcome: Some(outcome),
            tx_hash: Some(tx_hash),
            reason: None,
        }
    }

    pub fn skipped(challenge_id: u64, reason: &str) -> Self {
        Self {
            challenge_id,
            status: SettlementStatus::Skipped,
            outcome: None,
            tx_hash: None,
            reason: Some(reason.to_string()),
        }
    }

    pub fn failed(challenge_id: u64, err: &AppError) -> Self {
        Self {
            challenge_id,
            status: SettlementStatus::Failed,
            outcome: None,
            tx_hash: None,
            reason: Some(format!("{}: {}", err.code(), err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_id_outside_i64_is_rejected() {
        assert_eq!(challenge_id_to_db(42).unwrap(), 42);
        assert!(challenge_id_to_db(u64::MAX).is_err());
    }

    #[test]
    fn failed_report_carries_error_code() {
        let report = SettlementReport::failed(3, &AppError::ParticipantNotFound("0xabc".to_string()));
        assert_eq!(report.status, SettlementStatus::Failed);
        assert!(report.reason.unwrap().starts_with("PARTICIPANT_NOT_FOUND"));
    }

    #[test]
    fn record_stores_mode_name() {
        use crate::models::{ChallengeType, EvaluationMode, MetricAggregate, Verdict};

        let aggregate = MetricAggregate {
            overall_average: 12.0,
            sub_metrics: Vec::new(),
        };
        let result = EvaluationResult {
            challenge_id: 9,
            challenge_type: ChallengeType::Strain,
            mode: EvaluationMode::TwoSidedCompare,
            challenge_target: 10.0,
            verdict: Verdict::ChallengedWon {
                winner_is_challenged: true,
            },
            challenger: aggregate.clone(),
            challenged: Some(aggregate),
        };
        let record = SettlementRecord::from_result(&result, "0xabc".to_string()).unwrap();
        assert_eq!(record.mode, "two_sided_compare");
        assert_eq!(record.challenge_type, 1);
        assert!(record.outcome);
        assert_eq!(record.challenged_value, Some(12.0));
        assert_eq!(EvaluationMode::SelfTarget.as_str(), "self_target");
    }
}
