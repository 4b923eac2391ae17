use crate::{
    db::Database,
    error::{AppError, Result},
    evaluation::{self, Participants},
    models::{
        settlement::challenge_id_to_db, ChallengeWindow, EvaluationRequest, EvaluationResult,
        ParticipantSamples, SettlementRecord, SettlementReport,
    },
};
use serde::Serialize;
use std::sync::Arc;

use super::onchain::ChallengeTuple;

// ==================== PORTS ====================

#[async_trait::async_trait]
pub trait ParticipantSampleStore: Send + Sync {
    /// `None` when the address has no linked WHOOP data.
    async fn get_participant_samples(
        &self,
        address: &str,
        window: &ChallengeWindow,
    ) -> Result<Option<ParticipantSamples>>;

    async fn get_settlement(&self, challenge_id: u64) -> Result<Option<SettlementRecord>>;

    async fn save_settlement(&self, record: &SettlementRecord) -> Result<()>;

    /// Reserves the challenge for one settlement run. Returns `false` when it is
    /// already reserved.
    async fn claim_settlement(&self, challenge_id: u64) -> Result<bool>;

    async fn release_settlement_claim(&self, challenge_id: u64) -> Result<()>;
}

#[async_trait::async_trait]
pub trait ChallengeLedger: Send + Sync {
    async fn get_challenge(&self, challenge_id: u64) -> Result<ChallengeTuple>;

    /// Submits the verdict and waits for the receipt. Returns the transaction hash.
    async fn update_target_status(&self, challenge_id: u64, outcome: bool) -> Result<String>;
}

#[async_trait::async_trait]
impl ParticipantSampleStore for Database {
    async fn get_participant_samples(
        &self,
        address: &str,
        window: &ChallengeWindow,
    ) -> Result<Option<ParticipantSamples>> {
        Database::get_participant_samples(self, address, window).await
    }

    async fn get_settlement(&self, challenge_id: u64) -> Result<Option<SettlementRecord>> {
        Database::get_settlement(self, challenge_id_to_db(challenge_id)?).await
    }

    async fn save_settlement(&self, record: &SettlementRecord) -> Result<()> {
        Database::save_settlement(self, record).await
    }

    async fn claim_settlement(&self, challenge_id: u64) -> Result<bool> {
        Database::claim_settlement(self, challenge_id_to_db(challenge_id)?).await
    }

    async fn release_settlement_claim(&self, challenge_id: u64) -> Result<()> {
        Database::release_settlement_claim(self, challenge_id_to_db(challenge_id)?).await
    }
}

// ==================== RELAY ====================

#[derive(Debug, Clone, Serialize)]
pub struct SettlementReceipt {
    pub tx_hash: String,
    pub result: EvaluationResult,
}

/// Settlement Relay - loads participant samples, evaluates, and hands the verdict to
/// the challenge contract.
#[derive(Clone)]
pub struct SettlementRelay {
    store: Arc<dyn ParticipantSampleStore>,
    ledger: Arc<dyn ChallengeLedger>,
}

impl SettlementRelay {
    pub fn new(store: Arc<dyn ParticipantSampleStore>, ledger: Arc<dyn ChallengeLedger>) -> Self {
        Self { store, ledger }
    }

    /// Evaluates without touching the ledger.
    pub async fn preview(&self, request: &EvaluationRequest) -> Result<EvaluationResult> {
        let window = request.window();

        if request.is_two_sided {
            let challenged_address = request.challenged_address.as_deref().ok_or_else(|| {
                AppError::BadRequest("challenged_address is required for two-sided challenges".to_string())
            })?;
            let (challenger, challenged) = tokio::join!(
                self.load_participant(&request.challenger_address, &window),
                self.load_participant(challenged_address, &window),
            );
            let (challenger, challenged) = (challenger?, challenged?);
            evaluation::evaluate(
                request,
                Participants::Pair {
                    challenger: &challenger,
                    challenged: &challenged,
                },
            )
        } else {
            let samples = self.load_participant(&request.challenger_address, &window).await?;
            evaluation::evaluate(request, Participants::Solo(&samples))
        }
    }

    /// Evaluates and writes the verdict on-chain. A challenge is written at most once
    /// from this service: the id is claimed in the store before the ledger call, and
    /// the claim is released only when the run fails.
    pub async fn settle(&self, request: &EvaluationRequest) -> Result<SettlementReceipt> {
        let challenge_id = request.challenge_id;
        if self.store.get_settlement(challenge_id).await?.is_some() {
            return Err(AppError::AlreadySettled(challenge_id));
        }
        if !self.store.claim_settlement(challenge_id).await? {
            return Err(AppError::SettlementInProgress(challenge_id));
        }

        match self.settle_claimed(request).await {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                if let Err(release_err) = self.store.release_settlement_claim(challenge_id).await {
                    tracing::error!(challenge_id, "Failed to release settlement claim: {}", release_err);
                }
                Err(e)
            }
        }
    }

    async fn settle_claimed(&self, request: &EvaluationRequest) -> Result<SettlementReceipt> {
        let result = self.preview(request).await?;
        let outcome = result.verdict.ledger_flag();
        let tx_hash = self
            .ledger
            .update_target_status(request.challenge_id, outcome)
            .await?;

        let record = SettlementRecord::from_result(&result, tx_hash.clone())?;
        if let Err(e) = self.store.save_settlement(&record).await {
            // already on-chain at this point; only the audit row is lost
            tracing::error!(challenge_id = request.challenge_id, %tx_hash, "Failed to record settlement: {}", e);
        }

        tracing::info!(
            challenge_id = request.challenge_id,
            challenge_type = %request.challenge_type,
            outcome,
            %tx_hash,
            "Challenge settled"
        );

        Ok(SettlementReceipt { tx_hash, result })
    }

    /// Settles every listed challenge that has ended and has not been settled yet.
    /// Items are processed independently; one failure does not stop the batch.
    pub async fn settle_due(
        &self,
        challenge_ids: &[u64],
        now_secs: i64,
        concurrency: usize,
    ) -> Vec<SettlementReport> {
        let mut reports = Vec::with_capacity(challenge_ids.len());
        for chunk in challenge_ids.chunks(concurrency.max(1)) {
            let futures = chunk.iter().map(|&challenge_id| async move {
                match self.settle_one_due(challenge_id, now_secs).await {
                    Ok(report) => report,
                    Err(e) => {
                        tracing::warn!(challenge_id, "Cron settlement failed: {}", e);
                        SettlementReport::failed(challenge_id, &e)
                    }
                }
            });
            reports.extend(futures_util::future::join_all(futures).await);
        }

        reports.sort_by_key(|report| report.challenge_id);
        reports
    }

    async fn settle_one_due(&self, challenge_id: u64, now_secs: i64) -> Result<SettlementReport> {
        if self.store.get_settlement(challenge_id).await?.is_some() {
            return Ok(SettlementReport::skipped(challenge_id, "already_settled"));
        }

        let challenge = self.ledger.get_challenge(challenge_id).await?;
        if !challenge.has_ended(now_secs) {
            tracing::debug!(challenge_id, end_time = challenge.end_time, "Challenge still running");
            return Ok(SettlementReport::skipped(challenge_id, "not_ended"));
        }

        let request = challenge.into_request(challenge_id)?;
        match self.settle(&request).await {
            Ok(receipt) => Ok(SettlementReport::settled(
                challenge_id,
                receipt.result.verdict.ledger_flag(),
                receipt.tx_hash,
            )),
            Err(AppError::AlreadySettled(_)) => Ok(SettlementReport::skipped(challenge_id, "already_settled")),
            Err(AppError::SettlementInProgress(_)) => Ok(SettlementReport::skipped(challenge_id, "in_progress")),
            Err(e) => Err(e),
        }
    }

    async fn load_participant(&self, address: &str, window: &ChallengeWindow) -> Result<ParticipantSamples> {
        self.store
            .get_participant_samples(address, window)
            .await?
            .ok_or_else(|| AppError::ParticipantNotFound(address.to_string()))
    }
}
