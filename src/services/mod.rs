// All service modules
pub mod onchain;
pub mod settlement_relay;

// Re-export for convenience
pub use onchain::EvmChallengeLedger;
pub use settlement_relay::{SettlementReceipt, SettlementRelay};
