// alpha-deployer: lifecycle orchestration for the Alpha token
// Usage: alpha-deployer <COMMAND> [FLAGS]

use std::path::PathBuf;
use std::str::FromStr;

use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};

use alpha_deployer::artifact::ToolchainArtifacts;
use alpha_deployer::deploy::{Deployment, MintHandle, Outcome, Stage, StageEvent};
use alpha_deployer::keystore;
use alpha_deployer::ledger::{Ledger, RpcLedger};
use alpha_deployer::resolver;
use alpha_deployer::sampler::{self, BalanceSnapshot};
use alpha_deployer::verify::{verify, TransferIntent};

use alpha_sdk::constants::{
    ALPHA_DECIMALS, ALPHA_TOKEN_PROGRAM_ID, DEFAULT_TAX_RATE_BPS, TOKEN_NAME, TOKEN_SYMBOL,
    TOTAL_SUPPLY_ALPHA,
};
use alpha_sdk::instruction::{create_transfer_with_tax_instruction, find_token_config};
use alpha_sdk::tax;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";
const DEFAULT_TAX_WALLET_FILE: &str = "tax-wallet.json";
const PROGRAM_BINARY_NAME: &str = "alpha_token.so";

/// Payer balance below this triggers a warning before deployment starts.
const LOW_BALANCE_LAMPORTS: u64 = 2 * LAMPORTS_PER_SOL;

// ── CLI Parsing ─────────────────────────────────────────────────────────────

struct CommonArgs {
    rpc_url: String,
    keypair_path: PathBuf,
}

impl CommonArgs {
    fn new() -> Self {
        Self {
            rpc_url: std::env::var("ALPHA_RPC_URL")
                .unwrap_or_else(|_| DEFAULT_RPC_URL.to_string()),
            keypair_path: keystore::default_identity_path(),
        }
    }

    /// Consume a flag shared by every subcommand. Returns false when the
    /// flag belongs to the subcommand instead.
    fn accept(&mut self, args: &[String], i: &mut usize) -> Result<bool, String> {
        match args[*i].as_str() {
            "--url" => {
                *i += 1;
                self.rpc_url = args.get(*i).ok_or("Missing value for --url")?.clone();
                Ok(true)
            }
            "--keypair" => {
                *i += 1;
                self.keypair_path =
                    PathBuf::from(args.get(*i).ok_or("Missing value for --keypair")?);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

struct DeployArgs {
    common: CommonArgs,
    mint: Option<Pubkey>,
    tax_wallet_file: PathBuf,
    tax_rate_bps: u16,
    program_dir: PathBuf,
}

struct RenounceArgs {
    common: CommonArgs,
    mint: Pubkey,
}

struct TransferArgs {
    common: CommonArgs,
    mint: Pubkey,
    to: Pubkey,
    amount: u64,
}

struct VerifyArgs {
    transfer: TransferArgs,
    tolerance: u64,
    json: bool,
}

fn parse_pubkey(value: &str, flag: &str) -> Result<Pubkey, String> {
    Pubkey::from_str(value).map_err(|e| format!("Invalid value for {flag}: {e}"))
}

fn flag_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing value for {flag}"))
}

fn parse_deploy(args: &[String]) -> Result<DeployArgs, String> {
    let mut common = CommonArgs::new();
    let mut mint = None;
    let mut tax_wallet_file = PathBuf::from(DEFAULT_TAX_WALLET_FILE);
    let mut tax_rate_bps = DEFAULT_TAX_RATE_BPS;
    let mut program_dir = PathBuf::from(".");

    let mut i = 0;
    while i < args.len() {
        if common.accept(args, &mut i)? {
            i += 1;
            continue;
        }
        match args[i].as_str() {
            "--mint" => {
                let value = flag_value(args, &mut i, "--mint")?;
                mint = Some(parse_pubkey(value, "--mint")?);
            }
            "--tax-wallet-file" => {
                let value = flag_value(args, &mut i, "--tax-wallet-file")?;
                tax_wallet_file = PathBuf::from(value);
            }
            "--tax-rate-bps" => {
                let value = flag_value(args, &mut i, "--tax-rate-bps")?;
                tax_rate_bps = value
                    .parse()
                    .map_err(|e| format!("Invalid value for --tax-rate-bps: {e}"))?;
            }
            "--program-dir" => {
                let value = flag_value(args, &mut i, "--program-dir")?;
                program_dir = PathBuf::from(value);
            }
            other => return Err(format!("Unknown argument: {other}")),
        }
        i += 1;
    }

    // Reject an out-of-range rate here, before any network traffic.
    tax::split(0, tax_rate_bps).map_err(|e| e.to_string())?;

    Ok(DeployArgs {
        common,
        mint,
        tax_wallet_file,
        tax_rate_bps,
        program_dir,
    })
}

fn parse_renounce(args: &[String]) -> Result<RenounceArgs, String> {
    let mut common = CommonArgs::new();
    let mut mint = None;

    let mut i = 0;
    while i < args.len() {
        if common.accept(args, &mut i)? {
            i += 1;
            continue;
        }
        match args[i].as_str() {
            "--mint" => {
                let value = flag_value(args, &mut i, "--mint")?;
                mint = Some(parse_pubkey(value, "--mint")?);
            }
            other => return Err(format!("Unknown argument: {other}")),
        }
        i += 1;
    }

    Ok(RenounceArgs {
        common,
        mint: mint.ok_or("--mint is required")?,
    })
}

fn parse_transfer_flags(
    args: &[String],
    extra: &mut dyn FnMut(&[String], &mut usize) -> Result<bool, String>,
) -> Result<TransferArgs, String> {
    let mut common = CommonArgs::new();
    let mut mint = None;
    let mut to = None;
    let mut amount = None;

    let mut i = 0;
    while i < args.len() {
        if common.accept(args, &mut i)? || extra(args, &mut i)? {
            i += 1;
            continue;
        }
        match args[i].as_str() {
            "--mint" => {
                let value = flag_value(args, &mut i, "--mint")?;
                mint = Some(parse_pubkey(value, "--mint")?);
            }
            "--to" => {
                let value = flag_value(args, &mut i, "--to")?;
                to = Some(parse_pubkey(value, "--to")?);
            }
            "--amount" => {
                let value = flag_value(args, &mut i, "--amount")?;
                amount = Some(
                    value
                        .parse::<u64>()
                        .map_err(|e| format!("Invalid value for --amount: {e}"))?,
                );
            }
            other => return Err(format!("Unknown argument: {other}")),
        }
        i += 1;
    }

    let amount = amount.ok_or("--amount is required")?;
    if amount == 0 {
        return Err("--amount must be greater than zero".to_string());
    }

    Ok(TransferArgs {
        common,
        mint: mint.ok_or("--mint is required")?,
        to: to.ok_or("--to is required")?,
        amount,
    })
}

fn parse_transfer(args: &[String]) -> Result<TransferArgs, String> {
    parse_transfer_flags(args, &mut |_, _| Ok(false))
}

fn parse_verify(args: &[String]) -> Result<VerifyArgs, String> {
    let mut tolerance = 0u64;
    let mut json = false;
    let transfer = parse_transfer_flags(args, &mut |args, i| match args[*i].as_str() {
        "--tolerance" => {
            let value = flag_value(args, i, "--tolerance")?;
            tolerance = value
                .parse()
                .map_err(|e| format!("Invalid value for --tolerance: {e}"))?;
            Ok(true)
        }
        "--json" => {
            json = true;
            Ok(true)
        }
        _ => Ok(false),
    })?;
    Ok(VerifyArgs {
        transfer,
        tolerance,
        json,
    })
}

fn print_usage() {
    eprintln!(
        r#"alpha-deployer: lifecycle orchestration for the Alpha token

USAGE:
    alpha-deployer <COMMAND> [FLAGS]

COMMANDS:
    deploy             Run the full deployment sequence (idempotent, re-runnable)
    renounce           Run only the renouncement stages against an existing mint
    transfer           Submit a tax-split transfer
    verify-transfer    Submit a tax-split transfer and audit the balance deltas

COMMON FLAGS:
    --url <URL>              RPC endpoint (default: $ALPHA_RPC_URL or {DEFAULT_RPC_URL})
    --keypair <PATH>         Payer keypair file (default: ~/.config/solana/id.json)

DEPLOY FLAGS:
    --mint <BASE58>          Resume against an existing mint instead of creating one
    --tax-wallet-file <PATH> Tax wallet keypair file (default: {DEFAULT_TAX_WALLET_FILE})
    --tax-rate-bps <u16>     Tax rate in basis points (default: {DEFAULT_TAX_RATE_BPS})
    --program-dir <PATH>     Program workspace for build/deploy (default: .)

RENOUNCE FLAGS:
    --mint <BASE58>          The mint whose authorities to renounce (required)

TRANSFER / VERIFY-TRANSFER FLAGS:
    --mint <BASE58>          The token mint (required)
    --to <BASE58>            Recipient wallet (required)
    --amount <u64>           Transfer amount in smallest units (required)
    --tolerance <u64>        Allowed per-check delta slack (verify-transfer, default: 0)
    --json                   Emit the verification report as JSON (verify-transfer)

    --help, -h               Print this help message"#
    );
}

// ── Rendering ───────────────────────────────────────────────────────────────

fn render_event(event: &StageEvent) {
    let marker = match event.outcome {
        Outcome::Advanced => "advanced",
        Outcome::AlreadySatisfied => "already satisfied",
    };
    println!(
        "[STAGE] {:<28} {:<18} {}",
        event.stage, marker, event.detail
    );
}

fn print_balance_table(
    title: &str,
    snapshot: &BalanceSnapshot,
    rows: &[(&str, &Pubkey)],
) {
    println!("=== Balances ({title}) ===");
    for (label, owner) in rows {
        println!("  {:<10} {:<44} {}", label, owner, snapshot.get(owner));
    }
}

// ── Commands ────────────────────────────────────────────────────────────────

fn run_deploy(args: DeployArgs) -> Result<(), String> {
    let payer = keystore::load_identity(&args.common.keypair_path).map_err(|e| e.to_string())?;
    let ledger = RpcLedger::new(&args.common.rpc_url);

    println!("=== {TOKEN_NAME} ({TOKEN_SYMBOL}) Deployment ===");
    println!("Payer:    {}", payer.pubkey());
    println!("Endpoint: {}", args.common.rpc_url);
    println!();

    let payer_balance = ledger
        .get_balance(&payer.pubkey())
        .map_err(|e| e.to_string())?;
    if payer_balance < LOW_BALANCE_LAMPORTS {
        eprintln!(
            "[WARN] payer balance is {:.3} SOL; deployment needs roughly 2 SOL for rent and fees",
            payer_balance as f64 / LAMPORTS_PER_SOL as f64
        );
    }

    let tax_wallet = keystore::load_or_generate_tax_wallet(&args.tax_wallet_file)
        .map_err(|e| e.to_string())?;
    if tax_wallet.generated {
        println!("[KEYS] generated new tax wallet {}", tax_wallet.keypair.pubkey());
        println!(
            "[KEYS] secret written to {}; back this file up now, it cannot be regenerated",
            args.tax_wallet_file.display()
        );
    } else {
        println!("[KEYS] loaded tax wallet {}", tax_wallet.keypair.pubkey());
    }
    println!();

    let mint = match args.mint {
        Some(address) => MintHandle::Existing(address),
        None => MintHandle::Fresh(Keypair::new()),
    };
    let artifacts = ToolchainArtifacts::new(
        args.program_dir,
        PROGRAM_BINARY_NAME,
        args.common.rpc_url.clone(),
        args.common.keypair_path.clone(),
    );

    let mut deployment = Deployment::new(
        &ledger,
        &artifacts,
        &payer,
        tax_wallet.keypair.pubkey(),
        args.tax_rate_bps,
        mint,
    );
    let mint_address = deployment.mint_address();
    let events = deployment.run().map_err(|e| e.to_string())?;
    for event in &events {
        render_event(event);
    }

    let config = resolver::resolve(&ledger).map_err(|e| e.to_string())?;
    let (config_pda, _) = find_token_config();
    println!();
    println!("=== Deployment Summary ===");
    println!("Program:    {ALPHA_TOKEN_PROGRAM_ID}");
    println!("Mint:       {mint_address}");
    println!("Supply:     {TOTAL_SUPPLY_ALPHA} {TOKEN_SYMBOL} ({ALPHA_DECIMALS} decimals)");
    println!("Tax Rate:   {} bps", config.tax_rate_bps);
    println!("Tax Wallet: {}", config.tax_wallet);
    println!("Config PDA: {config_pda}");
    println!("Renounced:  {}", config.renounced());
    Ok(())
}

fn run_renounce(args: RenounceArgs) -> Result<(), String> {
    let payer = keystore::load_identity(&args.common.keypair_path).map_err(|e| e.to_string())?;
    let ledger = RpcLedger::new(&args.common.rpc_url);
    let artifacts = ToolchainArtifacts::new(
        PathBuf::from("."),
        PROGRAM_BINARY_NAME,
        args.common.rpc_url.clone(),
        args.common.keypair_path.clone(),
    );

    println!("=== Renouncing Authorities for {} ===", args.mint);

    // Renouncement needs no key material for the tax wallet; the rate and
    // wallet fields only matter during initialization.
    let mut deployment = Deployment::new(
        &ledger,
        &artifacts,
        &payer,
        Pubkey::default(),
        DEFAULT_TAX_RATE_BPS,
        MintHandle::Existing(args.mint),
    );
    for stage in Stage::RENOUNCE_SEQUENCE {
        let event = deployment.advance(stage).map_err(|e| e.to_string())?;
        render_event(&event);
    }

    println!();
    println!("All authorities renounced. This is permanent.");
    Ok(())
}

fn submit_transfer(
    ledger: &RpcLedger,
    payer: &Keypair,
    args: &TransferArgs,
    tax_wallet: &Pubkey,
) -> Result<solana_sdk::signature::Signature, String> {
    let sender_ata = get_associated_token_address(&payer.pubkey(), &args.mint);
    let recipient_ata = get_associated_token_address(&args.to, &args.mint);
    let tax_ata = get_associated_token_address(tax_wallet, &args.mint);

    let ensure_recipient = create_associated_token_account_idempotent(
        &payer.pubkey(),
        &args.to,
        &args.mint,
        &spl_token::id(),
    );
    let transfer = create_transfer_with_tax_instruction(
        &payer.pubkey(),
        &sender_ata,
        &recipient_ata,
        &tax_ata,
        args.amount,
    );

    ledger
        .submit(&[ensure_recipient, transfer], &payer.pubkey(), &[payer])
        .map_err(|e| e.to_string())
}

fn run_transfer(args: TransferArgs) -> Result<(), String> {
    let payer = keystore::load_identity(&args.common.keypair_path).map_err(|e| e.to_string())?;
    let ledger = RpcLedger::new(&args.common.rpc_url);

    let config = resolver::resolve(&ledger).map_err(|e| e.to_string())?;
    let expected = tax::split(args.amount, config.tax_rate_bps).map_err(|e| e.to_string())?;

    println!("=== Tax-Split Transfer ===");
    println!("From:      {}", payer.pubkey());
    println!("To:        {}", args.to);
    println!("Amount:    {} units", args.amount);
    println!(
        "Split:     {} net to recipient, {} tax ({} bps)",
        expected.net, expected.tax, config.tax_rate_bps
    );

    let signature = submit_transfer(&ledger, &payer, &args, &config.tax_wallet)?;
    println!("Signature: {signature}");
    Ok(())
}

fn run_verify_transfer(args: VerifyArgs) -> Result<(), String> {
    let payer =
        keystore::load_identity(&args.transfer.common.keypair_path).map_err(|e| e.to_string())?;
    let ledger = RpcLedger::new(&args.transfer.common.rpc_url);

    let config = resolver::resolve(&ledger).map_err(|e| e.to_string())?;
    let sender = payer.pubkey();
    let owners = [sender, args.transfer.to, config.tax_wallet];
    let rows: [(&str, &Pubkey); 3] = [
        ("sender", &sender),
        ("recipient", &args.transfer.to),
        ("tax", &config.tax_wallet),
    ];

    let before =
        sampler::sample(&ledger, &args.transfer.mint, &owners).map_err(|e| e.to_string())?;
    let signature = submit_transfer(&ledger, &payer, &args.transfer, &config.tax_wallet)?;
    let after =
        sampler::sample(&ledger, &args.transfer.mint, &owners).map_err(|e| e.to_string())?;

    let report = verify(
        TransferIntent {
            amount: args.transfer.amount,
            tax_rate_bps: config.tax_rate_bps,
        },
        &before,
        &after,
        &sender,
        &args.transfer.to,
        &config.tax_wallet,
        args.tolerance,
    )
    .map_err(|e| e.to_string())?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?
        );
    } else {
        println!("=== Transfer Audit ===");
        println!("Signature: {signature}");
        println!(
            "Expected:  {} net, {} tax ({} bps, tolerance {})",
            report.expected_net, report.expected_tax, config.tax_rate_bps, report.tolerance
        );
        println!();
        print_balance_table("before", &before, &rows);
        print_balance_table("after", &after, &rows);
        println!();
        for check in report.checks() {
            let marker = if check.passed { "PASS" } else { "FAIL" };
            println!(
                "[{marker}] {:<16} expected {:>12} actual {:>12}",
                check.name, check.expected, check.actual
            );
        }
        println!();
    }

    if report.passed() {
        println!("Verification passed.");
        Ok(())
    } else {
        Err("transfer verification failed".to_string())
    }
}

// ── Main ────────────────────────────────────────────────────────────────────

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let command = match args.get(1).map(String::as_str) {
        Some("--help") | Some("-h") | Some("help") | None => {
            print_usage();
            std::process::exit(if args.len() > 1 { 0 } else { 1 });
        }
        Some(command) => command,
    };
    let rest = &args[2..];

    let result = match command {
        "deploy" => parse_deploy(rest).and_then(run_deploy),
        "renounce" => parse_renounce(rest).and_then(run_renounce),
        "transfer" => parse_transfer(rest).and_then(run_transfer),
        "verify-transfer" => parse_verify(rest).and_then(run_verify_transfer),
        other => Err(format!("Unknown command: {other}")),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
