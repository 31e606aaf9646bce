//! Deployment and authority state machine.
//!
//! The whole lifecycle is an explicit ordered list of named transitions,
//! strictly forward-only. Every transition probes the ledger first and
//! reports `AlreadySatisfied` when its effect is already in place, so the
//! full sequence can be re-run against a live, partially-completed
//! deployment at any time. There is no rollback: each resource a transition
//! creates (mint, token accounts, config) is independently valid even when
//! a later transition fails.

use solana_program::program_pack::Pack;
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};
use spl_token::instruction::AuthorityType;
use spl_token::state::Mint;
use thiserror::Error;

use alpha_sdk::constants::{ALPHA_DECIMALS, ALPHA_TOKEN_PROGRAM_ID, TOTAL_SUPPLY_UNITS};
use alpha_sdk::instruction as alpha_ix;

use crate::artifact::{ArtifactError, ArtifactStore};
use crate::ledger::{Ledger, LedgerError};
use crate::resolver::{self, ResolveError};

/// Deployment stages in lifecycle order. `Start` is the origin; the terminal
/// `OwnershipRenounced` is irreversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    ProgramAvailable,
    ProgramDeployed,
    MintCreated,
    SupplyMinted,
    TaxAccountFunded,
    ConfigInitialized,
    MintAuthorityRenounced,
    FreezeAuthorityRenounced,
    OwnershipRenounced,
}

impl Stage {
    /// Every transition after `Start`, in execution order.
    pub const SEQUENCE: [Stage; 9] = [
        Stage::ProgramAvailable,
        Stage::ProgramDeployed,
        Stage::MintCreated,
        Stage::SupplyMinted,
        Stage::TaxAccountFunded,
        Stage::ConfigInitialized,
        Stage::MintAuthorityRenounced,
        Stage::FreezeAuthorityRenounced,
        Stage::OwnershipRenounced,
    ];

    /// The renouncement tail, runnable on its own against an existing mint.
    pub const RENOUNCE_SEQUENCE: [Stage; 3] = [
        Stage::MintAuthorityRenounced,
        Stage::FreezeAuthorityRenounced,
        Stage::OwnershipRenounced,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::ProgramAvailable => "program-available",
            Stage::ProgramDeployed => "program-deployed",
            Stage::MintCreated => "mint-created",
            Stage::SupplyMinted => "supply-minted",
            Stage::TaxAccountFunded => "tax-account-funded",
            Stage::ConfigInitialized => "config-initialized",
            Stage::MintAuthorityRenounced => "mint-authority-renounced",
            Stage::FreezeAuthorityRenounced => "freeze-authority-renounced",
            Stage::OwnershipRenounced => "ownership-renounced",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The transition performed its ledger write.
    Advanced,
    /// The transition's effect was already in place; nothing was written.
    AlreadySatisfied,
}

/// Structured record of one transition. Logging consumes these; it never
/// drives control flow.
#[derive(Debug, Clone)]
pub struct StageEvent {
    pub stage: Stage,
    pub outcome: Outcome,
    pub detail: String,
}

fn event(stage: Stage, outcome: Outcome, detail: impl Into<String>) -> StageEvent {
    StageEvent {
        stage,
        outcome,
        detail: detail.into(),
    }
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("program binary missing and build failed: {0}")]
    BuildRequired(ArtifactError),
    #[error("program upload failed: {0}")]
    DeployFailed(ArtifactError),
    #[error("mint {0} was named for resumption but does not exist on the ledger")]
    MintMissing(Pubkey),
    #[error("account {mint} is not a token mint: {message}")]
    NotAMint { mint: Pubkey, message: String },
    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: LedgerError,
    },
    #[error("config resolution failed: {0}")]
    Resolve(#[from] ResolveError),
}

/// The mint this deployment drives. A fresh run holds the keypair and may
/// create the account; a resumed run only knows the address and can never
/// recreate it.
pub enum MintHandle {
    Fresh(Keypair),
    Existing(Pubkey),
}

impl MintHandle {
    pub fn address(&self) -> Pubkey {
        match self {
            MintHandle::Fresh(keypair) => keypair.pubkey(),
            MintHandle::Existing(address) => *address,
        }
    }

    fn keypair(&self) -> Option<&Keypair> {
        match self {
            MintHandle::Fresh(keypair) => Some(keypair),
            MintHandle::Existing(_) => None,
        }
    }
}

/// In-memory state threaded through the transitions. The only shared mutable
/// state is the external ledger itself.
pub struct Deployment<'a, L: Ledger, A: ArtifactStore> {
    ledger: &'a L,
    artifacts: &'a A,
    payer: &'a Keypair,
    tax_wallet: Pubkey,
    tax_rate_bps: u16,
    mint: MintHandle,
}

impl<'a, L: Ledger, A: ArtifactStore> Deployment<'a, L, A> {
    pub fn new(
        ledger: &'a L,
        artifacts: &'a A,
        payer: &'a Keypair,
        tax_wallet: Pubkey,
        tax_rate_bps: u16,
        mint: MintHandle,
    ) -> Self {
        Self {
            ledger,
            artifacts,
            payer,
            tax_wallet,
            tax_rate_bps,
            mint,
        }
    }

    pub fn mint_address(&self) -> Pubkey {
        self.mint.address()
    }

    /// Run every transition in order, collecting one event per stage.
    pub fn run(&mut self) -> Result<Vec<StageEvent>, DeployError> {
        let mut events = Vec::with_capacity(Stage::SEQUENCE.len());
        for stage in Stage::SEQUENCE {
            events.push(self.advance(stage)?);
        }
        Ok(events)
    }

    /// Execute a single named transition. Completed stages come back
    /// `AlreadySatisfied`. Transport failures abort the run; the operator
    /// re-invokes the sequence, which is safe by idempotency.
    pub fn advance(&mut self, stage: Stage) -> Result<StageEvent, DeployError> {
        match stage {
            Stage::Start => Ok(event(stage, Outcome::AlreadySatisfied, "origin state")),
            Stage::ProgramAvailable => self.ensure_program_available(),
            Stage::ProgramDeployed => self.ensure_program_deployed(),
            Stage::MintCreated => self.ensure_mint_created(),
            Stage::SupplyMinted => self.ensure_supply_minted(),
            Stage::TaxAccountFunded => self.ensure_tax_account_funded(),
            Stage::ConfigInitialized => self.ensure_config_initialized(),
            Stage::MintAuthorityRenounced => self.ensure_mint_authority_renounced(),
            Stage::FreezeAuthorityRenounced => self.ensure_freeze_authority_renounced(),
            Stage::OwnershipRenounced => self.ensure_ownership_renounced(),
        }
    }

    fn ensure_program_available(&self) -> Result<StageEvent, DeployError> {
        let stage = Stage::ProgramAvailable;
        if self.artifacts.program_binary_exists() {
            return Ok(event(stage, Outcome::AlreadySatisfied, "program binary present"));
        }
        self.artifacts.build().map_err(DeployError::BuildRequired)?;
        Ok(event(stage, Outcome::Advanced, "program binary built"))
    }

    fn ensure_program_deployed(&self) -> Result<StageEvent, DeployError> {
        let stage = Stage::ProgramDeployed;
        let account = self
            .ledger
            .get_account(&ALPHA_TOKEN_PROGRAM_ID)
            .map_err(|e| self.stage_error(stage, e))?;
        if account.map_or(false, |a| a.executable) {
            return Ok(event(
                stage,
                Outcome::AlreadySatisfied,
                format!("program already on ledger at {ALPHA_TOKEN_PROGRAM_ID}"),
            ));
        }
        self.artifacts.deploy().map_err(DeployError::DeployFailed)?;
        Ok(event(
            stage,
            Outcome::Advanced,
            format!("program uploaded to {ALPHA_TOKEN_PROGRAM_ID}"),
        ))
    }

    fn ensure_mint_created(&self) -> Result<StageEvent, DeployError> {
        let stage = Stage::MintCreated;
        let mint_address = self.mint.address();

        if let Some(snapshot) = self
            .ledger
            .get_account(&mint_address)
            .map_err(|e| self.stage_error(stage, e))?
        {
            // Fetched rather than recreated; just confirm it really is a mint.
            Mint::unpack(&snapshot.data).map_err(|e| DeployError::NotAMint {
                mint: mint_address,
                message: e.to_string(),
            })?;
            return Ok(event(
                stage,
                Outcome::AlreadySatisfied,
                format!("mint {mint_address} already exists"),
            ));
        }

        let Some(mint_keypair) = self.mint.keypair() else {
            // A resumed run named a mint the ledger has never seen; we hold
            // no key for it and must not mint a different one.
            return Err(DeployError::MintMissing(mint_address));
        };

        let rent = self
            .ledger
            .minimum_rent_exempt_balance(Mint::LEN)
            .map_err(|e| self.stage_error(stage, e))?;
        let create = system_instruction::create_account(
            &self.payer.pubkey(),
            &mint_address,
            rent,
            Mint::LEN as u64,
            &spl_token::id(),
        );
        let init = spl_token::instruction::initialize_mint(
            &spl_token::id(),
            &mint_address,
            &self.payer.pubkey(),
            Some(&self.payer.pubkey()),
            ALPHA_DECIMALS,
        )
        .expect("canonical token program id");

        let outcome = self.submit_absorbing(stage, &[create, init], &[self.payer, mint_keypair])?;
        Ok(event(
            stage,
            outcome,
            format!("mint {mint_address} created with {ALPHA_DECIMALS} decimals"),
        ))
    }

    fn ensure_supply_minted(&self) -> Result<StageEvent, DeployError> {
        let stage = Stage::SupplyMinted;
        let mint_address = self.mint.address();
        let mint_state = self.fetch_mint(stage)?;
        if mint_state.supply > 0 {
            return Ok(event(
                stage,
                Outcome::AlreadySatisfied,
                format!("supply already minted: {} units", mint_state.supply),
            ));
        }

        let treasury = get_associated_token_address(&self.payer.pubkey(), &mint_address);
        let ensure_treasury = create_associated_token_account_idempotent(
            &self.payer.pubkey(),
            &self.payer.pubkey(),
            &mint_address,
            &spl_token::id(),
        );
        let mint_supply = spl_token::instruction::mint_to(
            &spl_token::id(),
            &mint_address,
            &treasury,
            &self.payer.pubkey(),
            &[],
            TOTAL_SUPPLY_UNITS,
        )
        .expect("canonical token program id");

        self.submit(stage, &[ensure_treasury, mint_supply], &[self.payer])?;
        Ok(event(
            stage,
            Outcome::Advanced,
            format!("minted {TOTAL_SUPPLY_UNITS} units to {treasury}"),
        ))
    }

    fn ensure_tax_account_funded(&self) -> Result<StageEvent, DeployError> {
        let stage = Stage::TaxAccountFunded;
        let mint_address = self.mint.address();
        let tax_ata = get_associated_token_address(&self.tax_wallet, &mint_address);

        if self
            .ledger
            .get_account(&tax_ata)
            .map_err(|e| self.stage_error(stage, e))?
            .is_some()
        {
            return Ok(event(
                stage,
                Outcome::AlreadySatisfied,
                format!("tax token account {tax_ata} already exists"),
            ));
        }

        let ensure_ata = create_associated_token_account_idempotent(
            &self.payer.pubkey(),
            &self.tax_wallet,
            &mint_address,
            &spl_token::id(),
        );
        self.submit(stage, &[ensure_ata], &[self.payer])?;
        Ok(event(
            stage,
            Outcome::Advanced,
            format!("tax token account {tax_ata} created"),
        ))
    }

    fn ensure_config_initialized(&self) -> Result<StageEvent, DeployError> {
        let stage = Stage::ConfigInitialized;
        match resolver::resolve(self.ledger) {
            Ok(_) => Ok(event(
                stage,
                Outcome::AlreadySatisfied,
                "config already initialized",
            )),
            Err(ResolveError::NotInitialized) => {
                let ix = alpha_ix::create_initialize_instruction(
                    &self.payer.pubkey(),
                    &self.tax_wallet,
                    self.tax_rate_bps,
                );
                // A concurrent or interrupted earlier run may beat us to the
                // PDA; the typed already-in-use code is the deliberate
                // idempotency path, everything else halts.
                let outcome = self.submit_absorbing(stage, &[ix], &[self.payer])?;
                Ok(event(
                    stage,
                    outcome,
                    format!(
                        "config initialized: tax wallet {}, rate {} bps",
                        self.tax_wallet, self.tax_rate_bps
                    ),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn ensure_mint_authority_renounced(&self) -> Result<StageEvent, DeployError> {
        let stage = Stage::MintAuthorityRenounced;
        let mint_state = self.fetch_mint(stage)?;
        if mint_state.mint_authority.is_none() {
            return Ok(event(
                stage,
                Outcome::AlreadySatisfied,
                "mint authority already absent",
            ));
        }
        self.revoke_authority(stage, AuthorityType::MintTokens)?;
        Ok(event(stage, Outcome::Advanced, "mint authority renounced"))
    }

    fn ensure_freeze_authority_renounced(&self) -> Result<StageEvent, DeployError> {
        let stage = Stage::FreezeAuthorityRenounced;
        let mint_state = self.fetch_mint(stage)?;
        if mint_state.freeze_authority.is_none() {
            return Ok(event(
                stage,
                Outcome::AlreadySatisfied,
                "no freeze authority to revoke",
            ));
        }
        self.revoke_authority(stage, AuthorityType::FreezeAccount)?;
        Ok(event(stage, Outcome::Advanced, "freeze authority renounced"))
    }

    fn ensure_ownership_renounced(&self) -> Result<StageEvent, DeployError> {
        let stage = Stage::OwnershipRenounced;
        let config = resolver::resolve(self.ledger)?;
        if config.renounced() {
            return Ok(event(
                stage,
                Outcome::AlreadySatisfied,
                "ownership already renounced",
            ));
        }
        let ix = alpha_ix::create_renounce_ownership_instruction(&self.payer.pubkey());
        self.submit(stage, &[ix], &[self.payer])?;
        Ok(event(
            stage,
            Outcome::Advanced,
            "ownership renounced; config authority permanently cleared",
        ))
    }

    fn fetch_mint(&self, stage: Stage) -> Result<Mint, DeployError> {
        let mint_address = self.mint.address();
        let snapshot = self
            .ledger
            .get_account(&mint_address)
            .map_err(|e| self.stage_error(stage, e))?
            .ok_or(DeployError::MintMissing(mint_address))?;
        Mint::unpack(&snapshot.data).map_err(|e| DeployError::NotAMint {
            mint: mint_address,
            message: e.to_string(),
        })
    }

    fn revoke_authority(
        &self,
        stage: Stage,
        authority_type: AuthorityType,
    ) -> Result<(), DeployError> {
        let ix = spl_token::instruction::set_authority(
            &spl_token::id(),
            &self.mint.address(),
            None,
            authority_type,
            &self.payer.pubkey(),
            &[],
        )
        .expect("canonical token program id");
        self.submit(stage, &[ix], &[self.payer])?;
        Ok(())
    }

    fn submit(
        &self,
        stage: Stage,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<(), DeployError> {
        self.ledger
            .submit(instructions, &self.payer.pubkey(), signers)
            .map(|_| ())
            .map_err(|e| self.stage_error(stage, e))
    }

    /// Submit, absorbing exactly the already-satisfied error class.
    fn submit_absorbing(
        &self,
        stage: Stage,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<Outcome, DeployError> {
        match self
            .ledger
            .submit(instructions, &self.payer.pubkey(), signers)
        {
            Ok(_) => Ok(Outcome::Advanced),
            Err(e) if e.is_already_satisfied() => Ok(Outcome::AlreadySatisfied),
            Err(e) => Err(self.stage_error(stage, e)),
        }
    }

    fn stage_error(&self, stage: Stage, source: LedgerError) -> DeployError {
        DeployError::Stage {
            stage: stage.name(),
            source,
        }
    }
}
