// src/models/mod.rs
pub mod challenge;
pub mod settlement;
pub mod whoop;

use serde::Serialize;

pub use challenge::{
    ChallengeType,
    ChallengeWindow,
    EvaluationMode,
    EvaluationRequest,
    EvaluationResult,
    MetricAggregate,
    MetricBasis,
    MetricKind,
    SubMetric,
    Verdict,
};
pub use settlement::{SettlementRecord, SettlementReport, SettlementStatus};
pub use whoop::{Cycle, ParticipantSamples, Recovery, Sleep, WhoopUser};

// ==================== API RESPONSE ====================
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
