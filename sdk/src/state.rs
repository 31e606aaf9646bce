//! On-chain state layout for the Alpha tax program.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

/// Singleton config account at PDA `["config"]`, created once by
/// `initialize` and mutated only by `renounce_ownership`.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    pub is_initialized: bool,
    /// Deploying identity, or the default pubkey once renounced.
    pub authority: Pubkey,
    /// Wallet whose associated token account receives the tax portion.
    pub tax_wallet: Pubkey,
    /// Transfer tax in basis points, fixed at initialization.
    pub tax_rate_bps: u16,
    pub is_renounced: bool,
    pub bump: u8,
}

impl TokenConfig {
    // 1 + 32 + 32 + 2 + 1 + 1
    pub const SIZE: usize = 69;

    /// True once ownership has been renounced. Renouncement is permanent:
    /// the authority field is nulled and never restored.
    pub fn renounced(&self) -> bool {
        self.is_renounced || self.authority == Pubkey::default()
    }

    pub fn renounce(&mut self) {
        self.authority = Pubkey::default();
        self.is_renounced = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TokenConfig {
        TokenConfig {
            is_initialized: true,
            authority: Pubkey::new_unique(),
            tax_wallet: Pubkey::new_unique(),
            tax_rate_bps: 500,
            is_renounced: false,
            bump: 254,
        }
    }

    #[test]
    fn size_matches_serialized_length() {
        let bytes = sample().try_to_vec().unwrap();
        assert_eq!(bytes.len(), TokenConfig::SIZE);
    }

    #[test]
    fn renounce_nulls_authority_permanently() {
        let mut config = sample();
        assert!(!config.renounced());
        config.renounce();
        assert!(config.renounced());
        assert_eq!(config.authority, Pubkey::default());
        assert!(config.is_renounced);
    }
}
