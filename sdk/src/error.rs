//! Custom error codes shared with the Alpha tax program.
//!
//! The deployer classifies instruction failures on these structured codes,
//! never on error-message substrings.

use thiserror::Error;

/// Error codes emitted by the tax program as `ProgramError::Custom` values.
/// Codes start at 100 so they cannot collide with system-program custom
/// codes (0..=12, e.g. `AccountAlreadyInUse` = 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[repr(u32)]
pub enum AlphaTokenError {
    #[error("config account already initialized")]
    AlreadyInitialized = 100,
    #[error("config account not initialized")]
    NotInitialized = 101,
    #[error("unauthorized signer")]
    Unauthorized = 102,
    #[error("contract ownership has been renounced")]
    ContractRenounced = 103,
    #[error("tax account does not match the configured tax wallet")]
    InvalidTaxWallet = 104,
    #[error("arithmetic overflow")]
    Overflow = 105,
}

impl AlphaTokenError {
    pub const fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            100 => Some(Self::AlreadyInitialized),
            101 => Some(Self::NotInitialized),
            102 => Some(Self::Unauthorized),
            103 => Some(Self::ContractRenounced),
            104 => Some(Self::InvalidTaxWallet),
            105 => Some(Self::Overflow),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for err in [
            AlphaTokenError::AlreadyInitialized,
            AlphaTokenError::NotInitialized,
            AlphaTokenError::Unauthorized,
            AlphaTokenError::ContractRenounced,
            AlphaTokenError::InvalidTaxWallet,
            AlphaTokenError::Overflow,
        ] {
            assert_eq!(AlphaTokenError::from_code(err.code()), Some(err));
        }
        assert_eq!(AlphaTokenError::from_code(0), None);
        assert_eq!(AlphaTokenError::from_code(6000), None);
    }
}
