//! Ledger client abstraction and the typed failure taxonomy.
//!
//! Everything that talks to the chain goes through the [`Ledger`] trait so
//! the deployment state machine and verifier can run against an in-memory
//! ledger in tests. The production implementation wraps the blocking
//! [`RpcClient`] at confirmed commitment.

use solana_client::client_error::ClientError;
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    system_instruction::SystemError,
    transaction::{Transaction, TransactionError},
};
use thiserror::Error;

use alpha_sdk::error::AlphaTokenError;

/// Point-in-time copy of an account as seen by the ledger.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub lamports: u64,
    pub owner: Pubkey,
    pub executable: bool,
    pub data: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Network/RPC failure. Aborts the run without retry; re-running the
    /// whole sequence is safe because every transition is idempotent.
    #[error("transport failure: {0}")]
    Transport(String),
    /// An instruction was rejected with a program-specific custom code.
    #[error("instruction {index} rejected with custom code {code}")]
    Program { index: u8, code: u32 },
    /// The transaction failed for a reason that carries no custom code.
    #[error("transaction rejected: {0}")]
    Rejected(String),
}

impl LedgerError {
    /// Custom code of the failing instruction, if the failure carried one.
    pub fn custom_code(&self) -> Option<u32> {
        match self {
            LedgerError::Program { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The already-satisfied class: the resource this transaction would have
    /// created already exists. Matched on structured codes only, never on
    /// message text, so unrelated failures always surface.
    pub fn is_already_satisfied(&self) -> bool {
        matches!(
            self.custom_code(),
            Some(code) if code == SystemError::AccountAlreadyInUse as u32
                || code == AlphaTokenError::AlreadyInitialized.code()
        )
    }
}

fn classify(err: ClientError) -> LedgerError {
    match err.get_transaction_error() {
        Some(TransactionError::InstructionError(index, InstructionError::Custom(code))) => {
            LedgerError::Program { index, code }
        }
        Some(tx_err) => LedgerError::Rejected(tx_err.to_string()),
        None => LedgerError::Transport(err.to_string()),
    }
}

/// Narrow read/submit interface over the external ledger. One blocking
/// round-trip per call; `submit` implies confirmation.
pub trait Ledger {
    /// Lamport balance; a missing account reads as 0.
    fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError>;

    fn get_account(&self, address: &Pubkey) -> Result<Option<AccountSnapshot>, LedgerError>;

    fn minimum_rent_exempt_balance(&self, data_len: usize) -> Result<u64, LedgerError>;

    /// Submit one transaction and wait for confirmation.
    fn submit(
        &self,
        instructions: &[Instruction],
        payer: &Pubkey,
        signers: &[&Keypair],
    ) -> Result<Signature, LedgerError>;
}

pub struct RpcLedger {
    client: RpcClient,
}

impl RpcLedger {
    pub fn new(url: &str) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url.to_string(), CommitmentConfig::confirmed()),
        }
    }
}

impl Ledger for RpcLedger {
    fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
        self.client.get_balance(address).map_err(classify)
    }

    fn get_account(&self, address: &Pubkey) -> Result<Option<AccountSnapshot>, LedgerError> {
        let account = self
            .client
            .get_account_with_commitment(address, self.client.commitment())
            .map_err(classify)?
            .value;
        Ok(account.map(|a| AccountSnapshot {
            lamports: a.lamports,
            owner: a.owner,
            executable: a.executable,
            data: a.data,
        }))
    }

    fn minimum_rent_exempt_balance(&self, data_len: usize) -> Result<u64, LedgerError> {
        self.client
            .get_minimum_balance_for_rent_exemption(data_len)
            .map_err(classify)
    }

    fn submit(
        &self,
        instructions: &[Instruction],
        payer: &Pubkey,
        signers: &[&Keypair],
    ) -> Result<Signature, LedgerError> {
        let blockhash = self.client.get_latest_blockhash().map_err(classify)?;
        let tx = Transaction::new_signed_with_payer(instructions, Some(payer), signers, blockhash);
        self.client.send_and_confirm_transaction(&tx).map_err(classify)
    }
}
