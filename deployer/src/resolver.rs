//! Resolves the on-chain tax configuration record.

use borsh::BorshDeserialize;
use thiserror::Error;

use alpha_sdk::instruction::find_token_config;
use alpha_sdk::state::TokenConfig;

use crate::ledger::{Ledger, LedgerError};

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The config PDA does not exist yet. A fresh deployment must run the
    /// state machine through ConfigInitialized first.
    #[error("tax config account is not initialized")]
    NotInitialized,
    #[error("tax config account exists but does not deserialize: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Derive the config PDA (fixed seed + program ID, deterministic) and fetch
/// and decode the record behind it.
pub fn resolve<L: Ledger>(ledger: &L) -> Result<TokenConfig, ResolveError> {
    let (config_pda, _) = find_token_config();
    let snapshot = ledger
        .get_account(&config_pda)?
        .ok_or(ResolveError::NotInitialized)?;
    let config = TokenConfig::try_from_slice(&snapshot.data)
        .map_err(|e| ResolveError::Corrupt(e.to_string()))?;
    if !config.is_initialized {
        return Err(ResolveError::NotInitialized);
    }
    Ok(config)
}
