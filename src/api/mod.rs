// src/api/mod.rs
pub mod challenges;
pub mod cron;
pub mod health;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::services::SettlementRelay;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub relay: Arc<SettlementRelay>,
    pub ledger_can_sign: bool,
}

/// Settlement endpoints are driven by a scheduler holding `CRON_SECRET`.
pub fn require_cron_secret(headers: &HeaderMap, config: &Config) -> Result<()> {
    let auth_str = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::AuthError("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::AuthError("Invalid Authorization header".to_string()))?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or_else(|| AppError::AuthError("Invalid Authorization scheme".to_string()))?;

    if token.is_empty() || token != config.cron_secret.trim() {
        return Err(AppError::AuthError("Invalid cron secret".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn cron_secret_accepts_matching_bearer() {
        let config = test_config();
        let headers = headers_with(&format!("Bearer {}", config.cron_secret));
        assert!(require_cron_secret(&headers, &config).is_ok());
    }

    #[test]
    fn cron_secret_rejects_missing_or_wrong_token() {
        let config = test_config();
        assert!(matches!(
            require_cron_secret(&HeaderMap::new(), &config),
            Err(AppError::AuthError(_))
        ));
        assert!(require_cron_secret(&headers_with("Bearer nope"), &config).is_err());
        assert!(require_cron_secret(&headers_with("Basic abc"), &config).is_err());
        assert!(require_cron_secret(&headers_with("Bearer "), &config).is_err());
    }
}
