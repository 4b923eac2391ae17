use serde::Deserialize;
use std::env;

use crate::constants::{CRON_SETTLE_CONCURRENCY_DEFAULT, DEFAULT_EVM_CHAIN_ID};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Blockchain
    pub ethereum_rpc_url: String,
    pub evm_chain_id: u64,
    pub challenge_contract_address: String,
    pub settlement_private_key: Option<String>,

    // Cron
    pub cron_secret: String,
    pub cron_settle_concurrency: usize,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,

            ethereum_rpc_url: env::var("ETHEREUM_RPC_URL")?,
            evm_chain_id: env::var("EVM_CHAIN_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_EVM_CHAIN_ID),
            challenge_contract_address: env::var("CHALLENGE_CONTRACT_ADDRESS")?,
            settlement_private_key: env::var("SETTLEMENT_PRIVATE_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),

            cron_secret: env::var("CRON_SECRET")?,
            cron_settle_concurrency: env::var("CRON_SETTLE_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|value: &usize| *value > 0)
                .unwrap_or(CRON_SETTLE_CONCURRENCY_DEFAULT),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.ethereum_rpc_url.trim().is_empty() {
            anyhow::bail!("ETHEREUM_RPC_URL is empty");
        }
        if url::Url::parse(&self.ethereum_rpc_url).is_err() {
            anyhow::bail!("ETHEREUM_RPC_URL is not a valid URL");
        }
        if self.challenge_contract_address.trim().is_empty() {
            anyhow::bail!("CHALLENGE_CONTRACT_ADDRESS is empty");
        }
        if self.cron_secret.trim().is_empty() {
            anyhow::bail!("CRON_SECRET is empty");
        }

        if self.challenge_contract_address.starts_with("0x0000") {
            tracing::warn!("Using placeholder challenge contract address");
        }
        if self.settlement_private_key.is_none() {
            tracing::warn!("SETTLEMENT_PRIVATE_KEY not set; verdicts cannot be written on-chain");
        }
        if self.cron_secret.len() < 16 {
            tracing::warn!("CRON_SECRET is short; use at least 16 characters");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_testnet(&self) -> bool {
        self.environment == "development"
            || self.environment == "testnet"
            || self.evm_chain_id == DEFAULT_EVM_CHAIN_ID
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "0.0.0.0".to_string(),
        port: 3000,
        environment: "development".to_string(),
        database_url: "postgres://localhost/fitcentive".to_string(),
        database_max_connections: 1,
        ethereum_rpc_url: "http://localhost:8545".to_string(),
        evm_chain_id: DEFAULT_EVM_CHAIN_ID,
        challenge_contract_address: "0x0000000000000000000000000000000000000001".to_string(),
        settlement_private_key: None,
        cron_secret: "test_cron_secret_value".to_string(),
        cron_settle_concurrency: 2,
        cors_allowed_origins: "*".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_test_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_rpc_url() {
        let mut config = test_config();
        config.ethereum_rpc_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_cron_secret() {
        let mut config = test_config();
        config.cron_secret = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
