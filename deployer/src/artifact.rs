//! Program binary artifacts: build and upload via the Solana toolchain.

use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("program build failed: {0}")]
    BuildFailed(String),
    #[error("program deployment failed: {0}")]
    DeployFailed(String),
}

/// External artifact collaborator: where the program binary lives and how it
/// reaches the ledger. The state machine only ever calls these three entry
/// points.
pub trait ArtifactStore {
    fn program_binary_exists(&self) -> bool;

    fn build(&self) -> Result<(), ArtifactError>;

    /// Upload the program binary to the ledger.
    fn deploy(&self) -> Result<(), ArtifactError>;
}

/// Shells out to `cargo build-sbf` and `solana program deploy`, the same
/// toolchain workflow an operator would run by hand.
pub struct ToolchainArtifacts {
    workspace_root: PathBuf,
    binary_name: String,
    rpc_url: String,
    keypair_path: PathBuf,
}

impl ToolchainArtifacts {
    pub fn new(
        workspace_root: PathBuf,
        binary_name: impl Into<String>,
        rpc_url: impl Into<String>,
        keypair_path: PathBuf,
    ) -> Self {
        Self {
            workspace_root,
            binary_name: binary_name.into(),
            rpc_url: rpc_url.into(),
            keypair_path,
        }
    }

    pub fn binary_path(&self) -> PathBuf {
        self.workspace_root.join("target/deploy").join(&self.binary_name)
    }
}

impl ArtifactStore for ToolchainArtifacts {
    fn program_binary_exists(&self) -> bool {
        self.binary_path().exists()
    }

    fn build(&self) -> Result<(), ArtifactError> {
        let status = Command::new("cargo")
            .arg("build-sbf")
            .current_dir(&self.workspace_root)
            .status()
            .map_err(|e| ArtifactError::BuildFailed(e.to_string()))?;
        if !status.success() {
            return Err(ArtifactError::BuildFailed(format!(
                "cargo build-sbf exited with {status}"
            )));
        }
        Ok(())
    }

    fn deploy(&self) -> Result<(), ArtifactError> {
        let status = Command::new("solana")
            .args(["program", "deploy", "--url"])
            .arg(&self.rpc_url)
            .arg("--keypair")
            .arg(&self.keypair_path)
            .arg(self.binary_path())
            .status()
            .map_err(|e| ArtifactError::DeployFailed(e.to_string()))?;
        if !status.success() {
            return Err(ArtifactError::DeployFailed(format!(
                "solana program deploy exited with {status}"
            )));
        }
        Ok(())
    }
}
