use crate::{
    config::Config,
    error::{AppError, Result},
    models::{ChallengeType, ChallengeWindow, EvaluationRequest},
};
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, H256, I256, U256, U64},
};
use std::str::FromStr;
use std::sync::Arc;

use super::settlement_relay::ChallengeLedger;

ethers::contract::abigen!(
    FitcentiveChallenges,
    r#"[
        function updateTargetStatus(uint256 challengeId, bool targetReached)
        function getChallenge(uint256 challengeId) view returns (address, address, uint8, int256, uint256, uint256, bool)
    ]"#
);

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Challenge as stored by the contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeTuple {
    pub challenger: String,
    pub challenged: String,
    pub challenge_type: i64,
    pub target: f64,
    pub start_time: i64,
    pub end_time: i64,
    pub is_two_sided: bool,
}

impl ChallengeTuple {
    pub fn has_ended(&self, now_secs: i64) -> bool {
        self.end_time <= now_secs
    }

    pub fn into_request(self, challenge_id: u64) -> Result<EvaluationRequest> {
        let challenge_type = ChallengeType::try_from(self.challenge_type)?;
        let window = ChallengeWindow::from_unix_secs(self.start_time, self.end_time)
            .ok_or_else(|| AppError::BadRequest("Invalid challenge window".to_string()))?;
        let challenged_address = if self.is_two_sided && !is_zero_address(&self.challenged) {
            Some(self.challenged)
        } else {
            None
        };

        Ok(EvaluationRequest {
            challenge_id,
            challenge_type,
            challenge_target: self.target,
            start_time: window.start_time,
            end_time: window.end_time,
            is_two_sided: self.is_two_sided,
            challenger_address: self.challenger,
            challenged_address,
        })
    }
}

/// Reads challenges from, and writes verdicts to, the deployed challenge contract.
pub struct EvmChallengeLedger {
    reader: FitcentiveChallenges<Provider<Http>>,
    writer: Option<FitcentiveChallenges<SignerClient>>,
}

impl EvmChallengeLedger {
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.ethereum_rpc_url.as_str())
            .map_err(|e| AppError::Internal(format!("Invalid EVM RPC URL: {}", e)))?;
        let contract_address = Address::from_str(config.challenge_contract_address.trim())
            .map_err(|_| AppError::Internal("Invalid challenge contract address".to_string()))?;

        let writer = match &config.settlement_private_key {
            Some(key) => {
                let wallet = key
                    .trim()
                    .parse::<LocalWallet>()
                    .map_err(|e| AppError::Internal(format!("Invalid settlement key: {}", e)))?
                    .with_chain_id(config.evm_chain_id);
                tracing::info!("Settlement signer: {:?}", wallet.address());
                let client = Arc::new(SignerMiddleware::new(provider.clone(), wallet));
                Some(FitcentiveChallenges::new(contract_address, client))
            }
            None => None,
        };

        Ok(Self {
            reader: FitcentiveChallenges::new(contract_address, Arc::new(provider)),
            writer,
        })
    }

    pub fn can_sign(&self) -> bool {
        self.writer.is_some()
    }
}

#[async_trait::async_trait]
impl ChallengeLedger for EvmChallengeLedger {
    async fn get_challenge(&self, challenge_id: u64) -> Result<ChallengeTuple> {
        let (challenger, challenged, challenge_type, target, start_time, end_time, is_two_sided) = self
            .reader
            .get_challenge(U256::from(challenge_id))
            .call()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;

        Ok(ChallengeTuple {
            challenger: format_address(challenger),
            challenged: format_address(challenged),
            challenge_type: i64::from(challenge_type),
            target: i256_to_f64(target)?,
            start_time: u256_to_i64(start_time)?,
            end_time: u256_to_i64(end_time)?,
            is_two_sided,
        })
    }

    async fn update_target_status(&self, challenge_id: u64, outcome: bool) -> Result<String> {
        let writer = self.writer.as_ref().ok_or_else(|| {
            AppError::BlockchainRPC("Settlement signer is not configured".to_string())
        })?;

        let call = writer.update_target_status(U256::from(challenge_id), outcome);
        let pending = call
            .send()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;
        let tx_hash = format_tx_hash(*pending);
        tracing::info!(challenge_id, outcome, %tx_hash, "updateTargetStatus submitted");

        let receipt = pending
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?
            .ok_or_else(|| AppError::BlockchainRPC(format!("Transaction {} dropped", tx_hash)))?;
        if receipt.status == Some(U64::zero()) {
            return Err(AppError::BlockchainRPC(format!("Transaction {} reverted", tx_hash)));
        }

        Ok(tx_hash)
    }
}

pub fn format_address(address: Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

pub fn format_tx_hash(hash: H256) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}

pub fn is_zero_address(address: &str) -> bool {
    let trimmed = address.trim().trim_start_matches("0x");
    trimmed.is_empty() || trimmed.chars().all(|c| c == '0')
}

pub fn u256_to_i64(value: U256) -> Result<i64> {
    if value > U256::from(i64::MAX as u64) {
        return Err(AppError::Internal("uint256 value too large".to_string()));
    }
    Ok(value.as_u64() as i64)
}

pub fn i256_to_f64(value: I256) -> Result<f64> {
    value
        .to_string()
        .parse::<f64>()
        .map_err(|e| AppError::Internal(format!("Invalid int256 value: {}", e)))
}
