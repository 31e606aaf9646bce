//! Alpha tax program instruction builders.
//!
//! Instructions:
//!   0 = Initialize
//!   1 = TransferWithTax
//!   2 = RenounceOwnership

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

use crate::constants::{ALPHA_TOKEN_PROGRAM_ID, CONFIG_SEED};

// ── Instruction Discriminators ──────────────────────────────────────────────

pub const IX_INITIALIZE: u8 = 0;
pub const IX_TRANSFER_WITH_TAX: u8 = 1;
pub const IX_RENOUNCE_OWNERSHIP: u8 = 2;

// ── Param Structs (exact Borsh match to program) ────────────────────────────

#[derive(BorshSerialize, BorshDeserialize)]
pub struct InitializeArgs {
    pub tax_wallet: Pubkey,
    pub tax_rate_bps: u16,
}

#[derive(BorshSerialize, BorshDeserialize)]
pub struct TransferWithTaxArgs {
    pub amount: u64,
}

// ── PDA Helpers ─────────────────────────────────────────────────────────────

pub fn find_token_config() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CONFIG_SEED], &ALPHA_TOKEN_PROGRAM_ID)
}

// ── Instruction Builders ────────────────────────────────────────────────────

/// Initialize the tax config.
///
/// Accounts:
///   0. `[signer, writable]` authority (payer)
///   1. `[writable]` config PDA
///   2. `[]` system_program
pub fn create_initialize_instruction(
    authority: &Pubkey,
    tax_wallet: &Pubkey,
    tax_rate_bps: u16,
) -> Instruction {
    let (config_pda, _) = find_token_config();

    let args = InitializeArgs {
        tax_wallet: *tax_wallet,
        tax_rate_bps,
    };
    let mut data = vec![IX_INITIALIZE];
    args.serialize(&mut data).unwrap();

    Instruction {
        program_id: ALPHA_TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(config_pda, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    }
}

/// Transfer tokens, splitting off the configured tax.
///
/// Accounts:
///   0. `[signer]` authority (owner of `from`)
///   1. `[]` config PDA
///   2. `[writable]` from token account
///   3. `[writable]` to token account
///   4. `[writable]` tax wallet token account
///   5. `[]` token_program
pub fn create_transfer_with_tax_instruction(
    authority: &Pubkey,
    from_token_account: &Pubkey,
    to_token_account: &Pubkey,
    tax_token_account: &Pubkey,
    amount: u64,
) -> Instruction {
    let (config_pda, _) = find_token_config();

    let args = TransferWithTaxArgs { amount };
    let mut data = vec![IX_TRANSFER_WITH_TAX];
    args.serialize(&mut data).unwrap();

    Instruction {
        program_id: ALPHA_TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new_readonly(*authority, true),
            AccountMeta::new_readonly(config_pda, false),
            AccountMeta::new(*from_token_account, false),
            AccountMeta::new(*to_token_account, false),
            AccountMeta::new(*tax_token_account, false),
            AccountMeta::new_readonly(spl_token_program_id(), false),
        ],
        data,
    }
}

/// Renounce program ownership. Permanent: the config authority is nulled and
/// no privileged instruction can succeed afterwards.
///
/// Accounts:
///   0. `[signer]` authority
///   1. `[writable]` config PDA
pub fn create_renounce_ownership_instruction(authority: &Pubkey) -> Instruction {
    let (config_pda, _) = find_token_config();

    let data = vec![IX_RENOUNCE_OWNERSHIP];

    Instruction {
        program_id: ALPHA_TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new_readonly(*authority, true),
            AccountMeta::new(config_pda, false),
        ],
        data,
    }
}

// The SDK stays off the spl-token crate; only the program address is needed
// here.
fn spl_token_program_id() -> Pubkey {
    solana_program::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_pda_is_deterministic() {
        let (a, bump_a) = find_token_config();
        let (b, bump_b) = find_token_config();
        assert_eq!(a, b);
        assert_eq!(bump_a, bump_b);
    }

    #[test]
    fn initialize_layout() {
        let authority = Pubkey::new_unique();
        let tax_wallet = Pubkey::new_unique();
        let ix = create_initialize_instruction(&authority, &tax_wallet, 500);

        assert_eq!(ix.program_id, ALPHA_TOKEN_PROGRAM_ID);
        assert_eq!(ix.data[0], IX_INITIALIZE);
        let args = InitializeArgs::try_from_slice(&ix.data[1..]).unwrap();
        assert_eq!(args.tax_wallet, tax_wallet);
        assert_eq!(args.tax_rate_bps, 500);
        assert!(ix.accounts[0].is_signer);
        assert_eq!(ix.accounts[1].pubkey, find_token_config().0);
    }

    #[test]
    fn transfer_layout() {
        let ix = create_transfer_with_tax_instruction(
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            42,
        );
        assert_eq!(ix.data[0], IX_TRANSFER_WITH_TAX);
        let args = TransferWithTaxArgs::try_from_slice(&ix.data[1..]).unwrap();
        assert_eq!(args.amount, 42);
        assert_eq!(ix.accounts.len(), 6);
    }
}
