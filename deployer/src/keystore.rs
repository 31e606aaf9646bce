//! Key material loading, plus the one-time tax wallet generation.

use std::path::{Path, PathBuf};

use solana_sdk::signature::{read_keypair_file, write_keypair_file, Keypair};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("no keypair found at {0}")]
    KeyNotFound(PathBuf),
    #[error("failed to write keypair to {path}: {message}")]
    WriteFailed { path: PathBuf, message: String },
}

/// Default operator identity: `~/.config/solana/id.json`.
pub fn default_identity_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config/solana/id.json")
}

pub fn load_identity(path: &Path) -> Result<Keypair, KeyStoreError> {
    read_keypair_file(path).map_err(|_| KeyStoreError::KeyNotFound(path.to_path_buf()))
}

/// Tax wallet key material. It is generated exactly once and is not
/// re-derivable, so `generated` tells the caller whether this run must
/// surface the secret to the operator.
pub struct TaxWallet {
    pub keypair: Keypair,
    pub generated: bool,
}

pub fn load_or_generate_tax_wallet(path: &Path) -> Result<TaxWallet, KeyStoreError> {
    if path.exists() {
        return Ok(TaxWallet {
            keypair: load_identity(path)?,
            generated: false,
        });
    }
    let keypair = Keypair::new();
    write_keypair_file(&keypair, path).map_err(|e| KeyStoreError::WriteFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(TaxWallet {
        keypair,
        generated: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Signer;

    #[test]
    fn missing_identity_reports_key_not_found() {
        let path = Path::new("/nonexistent/alpha-keypair.json");
        match load_identity(path) {
            Err(KeyStoreError::KeyNotFound(p)) => assert_eq!(p, path),
            other => panic!("expected KeyNotFound, got {other:?}"),
        }
    }

    #[test]
    fn tax_wallet_generated_once_then_loaded() {
        let dir = std::env::temp_dir().join(format!("alpha-keystore-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tax-wallet.json");
        let _ = std::fs::remove_file(&path);

        let first = load_or_generate_tax_wallet(&path).unwrap();
        assert!(first.generated);

        let second = load_or_generate_tax_wallet(&path).unwrap();
        assert!(!second.generated);
        assert_eq!(first.keypair.pubkey(), second.keypair.pubkey());

        let _ = std::fs::remove_file(&path);
    }
}
