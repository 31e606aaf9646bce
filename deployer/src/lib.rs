//! Off-chain orchestration for the Alpha token lifecycle: deployment,
//! authority renouncement, and tax-transfer verification.

pub mod artifact;
pub mod deploy;
pub mod keystore;
pub mod ledger;
pub mod resolver;
pub mod sampler;
pub mod verify;
