//! Transfer verification: expected tax split vs observed balance deltas.

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use alpha_sdk::tax::{split, TaxError};

use crate::sampler::{delta, BalanceSnapshot};

/// What the caller meant to transfer, in smallest units. Ephemeral; never
/// persisted.
#[derive(Debug, Clone, Copy)]
pub struct TransferIntent {
    pub amount: u64,
    pub tax_rate_bps: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub name: &'static str,
    pub expected: i128,
    pub actual: i128,
    pub passed: bool,
}

impl Check {
    fn within(name: &'static str, expected: i128, actual: i128, tolerance: u64) -> Self {
        let passed = (actual - expected).abs() <= tolerance as i128;
        Self {
            name,
            expected,
            actual,
            passed,
        }
    }
}

/// Outcome of one transfer audit. Failed checks are data, not errors, so a
/// caller can keep auditing after a mismatch.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    /// Nonzero only when the caller explicitly asked for rounding slack; the
    /// split itself is exact, so slack hides bugs and must stay visible in
    /// the report.
    pub tolerance: u64,
    pub expected_tax: u64,
    pub expected_net: u64,
    pub sender: Check,
    pub recipient: Check,
    pub tax: Check,
    pub conservation: Check,
}

impl VerificationReport {
    /// Logical AND of all four checks.
    pub fn passed(&self) -> bool {
        self.sender.passed && self.recipient.passed && self.tax.passed && self.conservation.passed
    }

    pub fn checks(&self) -> [&Check; 4] {
        [&self.sender, &self.recipient, &self.tax, &self.conservation]
    }
}

/// Compare the deltas between two balance samples against the exact split of
/// `intent`. Fails only on an invalid intent (rejected before any work);
/// every verification outcome is report data.
pub fn verify(
    intent: TransferIntent,
    before: &BalanceSnapshot,
    after: &BalanceSnapshot,
    sender: &Pubkey,
    recipient: &Pubkey,
    tax_wallet: &Pubkey,
    tolerance: u64,
) -> Result<VerificationReport, TaxError> {
    let expected = split(intent.amount, intent.tax_rate_bps)?;

    let sender_delta = delta(before, after, sender);
    let recipient_delta = delta(before, after, recipient);
    let tax_delta = delta(before, after, tax_wallet);

    // Conservation is judged from the observed deltas alone, so it still
    // catches a program whose actual split diverges from the formula.
    Ok(VerificationReport {
        tolerance,
        expected_tax: expected.tax,
        expected_net: expected.net,
        sender: Check::within(
            "sender debit",
            -(intent.amount as i128),
            sender_delta,
            tolerance,
        ),
        recipient: Check::within(
            "recipient credit",
            expected.net as i128,
            recipient_delta,
            tolerance,
        ),
        tax: Check::within("tax credit", expected.tax as i128, tax_delta, tolerance),
        conservation: Check::within(
            "conservation",
            -sender_delta,
            recipient_delta + tax_delta,
            tolerance,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parties() -> (Pubkey, Pubkey, Pubkey) {
        (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique())
    }

    fn snapshot(entries: &[(Pubkey, u64)]) -> BalanceSnapshot {
        entries.iter().copied().collect()
    }

    #[test]
    fn exact_split_passes_all_four_checks() {
        let (sender, recipient, tax_wallet) = parties();
        let before = snapshot(&[(sender, 10_000), (recipient, 0), (tax_wallet, 0)]);
        let after = snapshot(&[(sender, 9_000), (recipient, 950), (tax_wallet, 50)]);

        let report = verify(
            TransferIntent {
                amount: 1000,
                tax_rate_bps: 500,
            },
            &before,
            &after,
            &sender,
            &recipient,
            &tax_wallet,
            0,
        )
        .unwrap();

        assert_eq!(report.expected_tax, 50);
        assert_eq!(report.expected_net, 950);
        assert!(report.passed());
        for check in report.checks() {
            assert!(check.passed, "{} failed", check.name);
        }
    }

    #[test]
    fn short_tax_credit_fails_tax_and_conservation() {
        let (sender, recipient, tax_wallet) = parties();
        let before = snapshot(&[(sender, 10_000), (recipient, 0), (tax_wallet, 0)]);
        // Tax wallet only received 40 of the expected 50.
        let after = snapshot(&[(sender, 9_000), (recipient, 950), (tax_wallet, 40)]);

        let report = verify(
            TransferIntent {
                amount: 1000,
                tax_rate_bps: 500,
            },
            &before,
            &after,
            &sender,
            &recipient,
            &tax_wallet,
            0,
        )
        .unwrap();

        assert!(report.sender.passed);
        assert!(report.recipient.passed);
        assert!(!report.tax.passed);
        assert!(!report.conservation.passed);
        assert!(!report.passed());
    }

    #[test]
    fn diverging_program_split_caught_by_conservation() {
        let (sender, recipient, tax_wallet) = parties();
        let before = snapshot(&[(sender, 10_000), (recipient, 0), (tax_wallet, 0)]);
        // The "program" burned 10 units: per-leg checks for recipient/tax
        // are wrong AND value was destroyed outright.
        let after = snapshot(&[(sender, 9_000), (recipient, 945), (tax_wallet, 45)]);

        let report = verify(
            TransferIntent {
                amount: 1000,
                tax_rate_bps: 500,
            },
            &before,
            &after,
            &sender,
            &recipient,
            &tax_wallet,
            0,
        )
        .unwrap();

        assert!(!report.conservation.passed);
        assert!(!report.passed());
    }

    #[test]
    fn tolerance_is_recorded_and_widens_checks() {
        let (sender, recipient, tax_wallet) = parties();
        let before = snapshot(&[(sender, 10_000), (recipient, 0), (tax_wallet, 0)]);
        let after = snapshot(&[(sender, 9_000), (recipient, 951), (tax_wallet, 49)]);

        let strict = verify(
            TransferIntent {
                amount: 1000,
                tax_rate_bps: 500,
            },
            &before,
            &after,
            &sender,
            &recipient,
            &tax_wallet,
            0,
        )
        .unwrap();
        assert!(!strict.passed());

        let slack = verify(
            TransferIntent {
                amount: 1000,
                tax_rate_bps: 500,
            },
            &before,
            &after,
            &sender,
            &recipient,
            &tax_wallet,
            1,
        )
        .unwrap();
        assert!(slack.passed());
        // The slack is never silent.
        assert_eq!(slack.tolerance, 1);
    }

    #[test]
    fn invalid_rate_rejected_before_any_check() {
        let (sender, recipient, tax_wallet) = parties();
        let empty = snapshot(&[]);
        let err = verify(
            TransferIntent {
                amount: 1000,
                tax_rate_bps: 10_001,
            },
            &empty,
            &empty,
            &sender,
            &recipient,
            &tax_wallet,
            0,
        )
        .unwrap_err();
        assert_eq!(err, TaxError::InvalidRate(10_001));
    }
}
