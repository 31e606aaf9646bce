//! Alpha SDK — tax split arithmetic, on-chain state layout, and instruction
//! builders for the Alpha tax program.

pub mod constants;
pub mod error;
pub mod instruction;
pub mod state;
pub mod tax;
