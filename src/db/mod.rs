use sqlx::{postgres::PgPoolOptions, PgPool};
use crate::{
    config::Config,
    error::Result,
    models::{ChallengeWindow, Cycle, ParticipantSamples, Recovery, SettlementRecord, Sleep, WhoopUser},
};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}


impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub(crate) fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

// ==================== WHOOP USER QUERIES ====================
impl Database {
    pub async fn get_whoop_user(&self, address: &str) -> Result<Option<WhoopUser>> {
        let row = sqlx::query_as::<_, WhoopUser>(
            "SELECT address, whoop_user_id, created_at FROM whoop_users WHERE LOWER(address) = $1",
        )
        .bind(normalize_address(address))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

// ==================== SAMPLE QUERIES ====================
impl Database {
    /// Loads the sample streams of a wallet's linked WHOOP account, or `None` when the
    /// address has no WHOOP link.
    ///
    /// The SQL bounds are a coarse prefilter on the window; eligibility is decided by
    /// the evaluation code.
    pub async fn get_participant_samples(
        &self,
        address: &str,
        window: &ChallengeWindow,
    ) -> Result<Option<ParticipantSamples>> {
        let Some(user) = self.get_whoop_user(address).await? else {
            return Ok(None);
        };

        let cycles = sqlx::query_as::<_, Cycle>(
            "SELECT id, whoop_user_id, start_time, end_time, updated_at, score_state, strain, kilojoule
             FROM whoop_cycles
             WHERE whoop_user_id = $1
               AND (end_time IS NULL OR end_time BETWEEN $2 AND $3)
             ORDER BY start_time ASC",
        )
        .bind(user.whoop_user_id)
        .bind(window.start_time)
        .bind(window.end_time)
        .fetch_all(&self.pool)
        .await?;

        let sleeps = sqlx::query_as::<_, Sleep>(
            "SELECT id, whoop_user_id, start_time, end_time, updated_at, nap, score_state,
                    total_in_bed_time_milli, sleep_performance_percentage,
                    sleep_consistency_percentage, sleep_efficiency_percentage
             FROM whoop_sleeps
             WHERE whoop_user_id = $1
               AND end_time BETWEEN $2 AND $3
             ORDER BY start_time ASC",
        )
        .bind(user.whoop_user_id)
        .bind(window.start_time)
        .bind(window.end_time)
        .fetch_all(&self.pool)
        .await?;

        let recoveries = sqlx::query_as::<_, Recovery>(
            "SELECT cycle_id, sleep_id, whoop_user_id, updated_at, score_state,
                    user_calibrating, recovery_score
             FROM whoop_recoveries
             WHERE whoop_user_id = $1
               AND updated_at BETWEEN $2 AND $3
             ORDER BY updated_at ASC",
        )
        .bind(user.whoop_user_id)
        .bind(window.start_time)
        .bind(window.end_time)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(
            address = %user.address,
            cycles = cycles.len(),
            sleeps = sleeps.len(),
            recoveries = recoveries.len(),
            "participant samples loaded"
        );

        Ok(Some(ParticipantSamples {
            cycles,
            sleeps,
            recoveries,
        }))
    }
}

// ==================== SETTLEMENT QUERIES ====================
impl Database {
    pub async fn get_settlement(&self, challenge_id: i64) -> Result<Option<SettlementRecord>> {
        let row = sqlx::query_as::<_, SettlementRecord>(
            "SELECT challenge_id, challenge_type, mode, outcome, challenger_value,
                    challenged_value, tx_hash, settled_at
             FROM challenge_settlements WHERE challenge_id = $1",
        )
        .bind(challenge_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn save_settlement(&self, record: &SettlementRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO challenge_settlements
                (challenge_id, challenge_type, mode, outcome,
                 challenger_value, challenged_value, tx_hash, settled_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
            ON CONFLICT (challenge_id) DO NOTHING
            "#,
        )
        .bind(record.challenge_id)
        .bind(record.challenge_type)
        .bind(&record.mode)
        .bind(record.outcome)
        .bind(record.challenger_value)
        .bind(record.challenged_value)
        .bind(&record.tx_hash)
        .bind(record.settled_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Takes the settlement slot for a challenge. `false` when another run holds it.
    pub async fn claim_settlement(&self, challenge_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO challenge_settlement_claims (challenge_id) VALUES ($1)
             ON CONFLICT (challenge_id) DO NOTHING",
        )
        .bind(challenge_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn release_settlement_claim(&self, challenge_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM challenge_settlement_claims WHERE challenge_id = $1")
            .bind(challenge_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
