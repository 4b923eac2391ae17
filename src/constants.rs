/// Application constants

// Unit conversions used by challenge aggregation
pub const KILOJOULE_TO_KCAL: f64 = 0.239006;
pub const MILLIS_PER_HOUR: f64 = 3_600_000.0;
pub const MILLIS_PER_DAY: f64 = 86_400_000.0;

// WHOOP score states
pub const SCORE_STATE_SCORED: &str = "SCORED";
pub const SCORE_STATE_PENDING: &str = "PENDING_SCORE";
pub const SCORE_STATE_UNSCORABLE: &str = "UNSCORABLE";

// API version
pub const API_VERSION: &str = "v1";

// Cron settlement
pub const CRON_SETTLE_CONCURRENCY_DEFAULT: usize = 4;
pub const CRON_SETTLE_MAX_BATCH: usize = 100;

// Default EVM chain (Base Sepolia)
pub const DEFAULT_EVM_CHAIN_ID: u64 = 84532;
