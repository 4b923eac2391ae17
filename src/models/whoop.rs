use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::constants::{SCORE_STATE_PENDING, SCORE_STATE_SCORED, SCORE_STATE_UNSCORABLE};

// ==================== SCORE STATE ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreState {
    PendingScore,
    Scored,
    Unscorable,
}

impl ScoreState {
    /// Parses the WHOOP `score_state` string. Unknown values are treated as unscorable.
    pub fn from_db(value: &str) -> Self {
        match value.trim() {
            SCORE_STATE_SCORED => ScoreState::Scored,
            SCORE_STATE_PENDING => ScoreState::PendingScore,
            SCORE_STATE_UNSCORABLE => ScoreState::Unscorable,
            _ => ScoreState::Unscorable,
        }
    }

    pub fn is_scored(self) -> bool {
        self == ScoreState::Scored
    }
}

// ==================== CYCLE ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cycle {
    pub id: i64,
    pub whoop_user_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>, // null while the cycle is still open
    pub updated_at: DateTime<Utc>,
    pub score_state: String,
    pub strain: Option<f64>,
    pub kilojoule: Option<f64>,
}

impl Cycle {
    pub fn score_state(&self) -> ScoreState {
        ScoreState::from_db(&self.score_state)
    }

    /// End of the cycle, or its last update while it is still open.
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.end_time.unwrap_or(self.updated_at)
    }
}

// ==================== SLEEP ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sleep {
    pub id: i64,
    pub whoop_user_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub nap: bool,
    pub score_state: String,
    pub total_in_bed_time_milli: Option<i64>,
    pub sleep_performance_percentage: Option<f64>,
    pub sleep_consistency_percentage: Option<f64>,
    pub sleep_efficiency_percentage: Option<f64>,
}

impl Sleep {
    pub fn score_state(&self) -> ScoreState {
        ScoreState::from_db(&self.score_state)
    }
}

// ==================== RECOVERY ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recovery {
    pub cycle_id: i64,
    pub sleep_id: Option<i64>,
    pub whoop_user_id: i64,
    pub updated_at: DateTime<Utc>,
    pub score_state: String,
    pub user_calibrating: bool,
    pub recovery_score: Option<f64>,
}

impl Recovery {
    pub fn score_state(&self) -> ScoreState {
        ScoreState::from_db(&self.score_state)
    }
}

// ==================== PARTICIPANT ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WhoopUser {
    pub address: String,
    pub whoop_user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Materialized sample streams of one challenge participant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipantSamples {
    pub cycles: Vec<Cycle>,
    pub sleeps: Vec<Sleep>,
    pub recoveries: Vec<Recovery>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn score_state_parses_whoop_values() {
        assert_eq!(ScoreState::from_db("SCORED"), ScoreState::Scored);
        assert_eq!(ScoreState::from_db("PENDING_SCORE"), ScoreState::PendingScore);
        assert_eq!(ScoreState::from_db("UNSCORABLE"), ScoreState::Unscorable);
        assert_eq!(ScoreState::from_db("garbage"), ScoreState::Unscorable);
        assert!(ScoreState::from_db(" SCORED ").is_scored());
    }

    #[test]
    fn open_cycle_uses_updated_at() {
        let updated = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let cycle = Cycle {
            id: 1,
            whoop_user_id: 7,
            start_time: updated,
            end_time: None,
            updated_at: updated,
            score_state: "SCORED".to_string(),
            strain: Some(10.0),
            kilojoule: None,
        };
        assert_eq!(cycle.effective_time(), updated);
    }
}
