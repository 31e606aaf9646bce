//! Alpha tax program ID, PDA seeds, and token parameters.

use solana_program::pubkey::Pubkey;

// ── Program IDs ─────────────────────────────────────────────────────────────

/// Alpha tax program — enforces the tax split on transfers and owns the
/// config PDA.
pub const ALPHA_TOKEN_PROGRAM_ID: Pubkey =
    solana_program::pubkey!("EQfYTxFVJT4B1Chm4wVZ8PsjQH3ZuahvW985YgVoXJfR");

// ── PDA Seeds ───────────────────────────────────────────────────────────────

pub const CONFIG_SEED: &[u8] = b"config";

// ── Tax Parameters ──────────────────────────────────────────────────────────
// The tax rate is expressed in basis points (1/100th of %) so the split never
// touches floating point.

/// Basis-point denominator: 10000 bps = 100%.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Default transfer tax: 5% = 500 bps.
pub const DEFAULT_TAX_RATE_BPS: u16 = 500;

// ── Token Parameters ────────────────────────────────────────────────────────

pub const TOKEN_NAME: &str = "Alpha";
pub const TOKEN_SYMBOL: &str = "ALPHA";

/// ALPHA token decimals.
pub const ALPHA_DECIMALS: u8 = 6;

/// Smallest units per whole ALPHA (10^6).
pub const UNITS_PER_ALPHA: u64 = 1_000_000;

/// Fixed total supply: 1 million ALPHA. Minted once, never again.
pub const TOTAL_SUPPLY_ALPHA: u64 = 1_000_000;

/// Total supply in smallest units.
pub const TOTAL_SUPPLY_UNITS: u64 = TOTAL_SUPPLY_ALPHA * UNITS_PER_ALPHA;
