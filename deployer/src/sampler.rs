//! Point-in-time token balance sampling for transfer audits.

use std::collections::HashMap;

use solana_program::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use spl_token::state::Account as TokenAccount;

use crate::ledger::{Ledger, LedgerError};

/// Balances keyed by wallet owner, in the mint's smallest unit.
#[derive(Debug, Clone, Default)]
pub struct BalanceSnapshot {
    balances: HashMap<Pubkey, u64>,
}

impl BalanceSnapshot {
    pub fn get(&self, owner: &Pubkey) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }
}

impl FromIterator<(Pubkey, u64)> for BalanceSnapshot {
    fn from_iter<I: IntoIterator<Item = (Pubkey, u64)>>(iter: I) -> Self {
        Self {
            balances: iter.into_iter().collect(),
        }
    }
}

/// Sample each owner's associated token account for `mint`. A missing or
/// uninitialized token account reads as balance 0, not an error. Reads are
/// independent per owner; nothing here depends on ordering.
pub fn sample<L: Ledger>(
    ledger: &L,
    mint: &Pubkey,
    owners: &[Pubkey],
) -> Result<BalanceSnapshot, LedgerError> {
    let mut balances = HashMap::with_capacity(owners.len());
    for owner in owners {
        let ata = get_associated_token_address(owner, mint);
        let amount = match ledger.get_account(&ata)? {
            Some(snapshot) => TokenAccount::unpack(&snapshot.data)
                .map(|account| account.amount)
                .unwrap_or(0),
            None => 0,
        };
        balances.insert(*owner, amount);
    }
    Ok(BalanceSnapshot { balances })
}

/// Signed balance change between two samples; negative for senders.
pub fn delta(before: &BalanceSnapshot, after: &BalanceSnapshot, owner: &Pubkey) -> i128 {
    after.get(owner) as i128 - before.get(owner) as i128
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AccountSnapshot;
    use solana_sdk::{instruction::Instruction, signature::Keypair};

    struct FixedLedger {
        accounts: HashMap<Pubkey, AccountSnapshot>,
    }

    impl Ledger for FixedLedger {
        fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
            Ok(self.accounts.get(address).map(|a| a.lamports).unwrap_or(0))
        }

        fn get_account(&self, address: &Pubkey) -> Result<Option<AccountSnapshot>, LedgerError> {
            Ok(self.accounts.get(address).cloned())
        }

        fn minimum_rent_exempt_balance(&self, _data_len: usize) -> Result<u64, LedgerError> {
            Ok(0)
        }

        fn submit(
            &self,
            _instructions: &[Instruction],
            _payer: &Pubkey,
            _signers: &[&Keypair],
        ) -> Result<solana_sdk::signature::Signature, LedgerError> {
            unreachable!("sampling is read-only")
        }
    }

    fn token_account_data(mint: &Pubkey, owner: &Pubkey, amount: u64) -> Vec<u8> {
        let account = TokenAccount {
            mint: *mint,
            owner: *owner,
            amount,
            state: spl_token::state::AccountState::Initialized,
            ..TokenAccount::default()
        };
        let mut data = vec![0u8; TokenAccount::LEN];
        TokenAccount::pack(account, &mut data).unwrap();
        data
    }

    #[test]
    fn missing_token_account_samples_as_zero() {
        let mint = Pubkey::new_unique();
        let funded = Pubkey::new_unique();
        let unfunded = Pubkey::new_unique();

        let ata = get_associated_token_address(&funded, &mint);
        let mut accounts = HashMap::new();
        accounts.insert(
            ata,
            AccountSnapshot {
                lamports: 2_039_280,
                owner: spl_token::id(),
                executable: false,
                data: token_account_data(&mint, &funded, 750),
            },
        );
        let ledger = FixedLedger { accounts };

        let snapshot = sample(&ledger, &mint, &[funded, unfunded]).unwrap();
        assert_eq!(snapshot.get(&funded), 750);
        assert_eq!(snapshot.get(&unfunded), 0);
    }

    #[test]
    fn deltas_are_signed() {
        let sender = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();
        let before: BalanceSnapshot = [(sender, 1_000u64), (recipient, 0u64)].into_iter().collect();
        let after: BalanceSnapshot = [(sender, 0u64), (recipient, 950u64)].into_iter().collect();

        assert_eq!(delta(&before, &after, &sender), -1_000);
        assert_eq!(delta(&before, &after, &recipient), 950);
    }
}
