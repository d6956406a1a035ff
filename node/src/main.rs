// Copyright (c) 2026 Solis Foundation. MIT License.
// See LICENSE for details.

//! # Solis Node
//!
//! Entry point for the `solis-node` binary. Parses CLI arguments,
//! initializes logging, and dispatches:
//!
//! - `init`      — create the data directory and generate a node keypair
//! - `selfcheck` — drive a transfer through the full transaction pipeline
//!                 against temporary storage and report each stage
//! - `version`   — print build version information

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;

use solis_protocol::account::{address_from_public_key, Account, AccountStore, MemoryAccountStore};
use solis_protocol::config::{format_solis_amount, ChainParams, TRANSFER_FEE};
use solis_protocol::crypto::SolisKeypair;
use solis_protocol::storage::{Block, KeyValueLedger, SolisDb};
use solis_protocol::transaction::{
    apply, apply_unconfirmed, db_save, normalize, process, verify_transaction, ChainContext,
    TransactionBuilder, TransactionError, TransferHandler, TypeRegistry,
};

use cli::{Commands, SolisNodeCli};
use logging::LogFormat;

fn main() -> Result<()> {
    let cli = SolisNodeCli::parse();

    match cli.command {
        Commands::Init(args) => init_node(args),
        Commands::Selfcheck(args) => {
            logging::init_logging(
                &format!("solis_node={0},solis_protocol={0}", args.log_level),
                LogFormat::from_str_lossy(&args.log_format),
            );
            tokio::runtime::Runtime::new()
                .context("failed to start the tokio runtime")?
                .block_on(run_selfcheck())
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Builds the startup context: chain parameters plus the handler registry.
/// Additional transaction types register here as they are linked in.
fn build_context() -> Result<ChainContext> {
    let mut registry = TypeRegistry::new();
    registry
        .register(Arc::new(TransferHandler))
        .map_err(|e| anyhow::anyhow!("handler registration failed: {e}"))?;
    Ok(ChainContext::new(ChainParams::default(), registry))
}

/// Creates the data directory and a fresh node keypair.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging(
        &format!("solis_node={}", args.log_level),
        LogFormat::from_str_lossy(&args.log_format),
    );

    let data_dir = cli::resolve_data_dir(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let key_path = data_dir.join("node_key");
    if key_path.exists() && !args.force {
        bail!(
            "node key already exists at {} (use --force to overwrite)",
            key_path.display()
        );
    }

    let keypair = SolisKeypair::generate();
    let address = address_from_public_key(&keypair.public_key());
    std::fs::write(&key_path, hex::encode(keypair.to_seed_bytes()))
        .with_context(|| format!("failed to write node key to {}", key_path.display()))?;

    tracing::info!(
        data_dir = %data_dir.display(),
        address = %address,
        public_key = %keypair.public_key(),
        "node initialized"
    );
    println!("node address: {address}");
    Ok(())
}

/// Drives a transfer through every pipeline stage against temporary storage.
///
/// This is the zero-to-working proof for an installation: if selfcheck
/// passes, the codec, signature engine, verifier, state mutator, and ledger
/// all agree with each other on this machine.
async fn run_selfcheck() -> Result<()> {
    let ctx = build_context()?;
    let store = MemoryAccountStore::new();
    let ledger = SolisDb::open_temporary()
        .map_err(|e| anyhow::anyhow!("failed to open a temporary ledger: {e}"))?;

    // A funded sender and a recipient derived from fresh keypairs.
    let sender_kp = SolisKeypair::generate();
    let sender_address = address_from_public_key(&sender_kp.public_key());
    let recipient_address =
        address_from_public_key(&SolisKeypair::generate().public_key());

    let initial_balance = 100 * TRANSFER_FEE;
    let mut sender = Account::with_balance(&sender_address, initial_balance);
    sender.public_key = Some(sender_kp.public_key());
    store.put(sender.clone());

    // Stage 1: build and re-ingest through the wire format.
    let built = TransactionBuilder::new(0)
        .recipient(&recipient_address)
        .amount(25 * TRANSFER_FEE)
        .build(&ctx, &sender, &sender_kp, None)
        .map_err(stage_err("build"))?;
    let raw = serde_json::to_value(&built).context("wire serialization failed")?;
    let mut trs = normalize(&ctx, &raw).map_err(stage_err("normalize"))?;
    tracing::info!(amount = %format_solis_amount(trs.amount), "selfcheck: normalized");

    // Stage 2: pool admission.
    process(&ctx, &ledger, &mut trs, &sender)
        .await
        .map_err(stage_err("process"))?;
    let id = trs.id.clone().unwrap_or_default();
    tracing::info!(%id, "selfcheck: admitted");

    // Stage 3: full verification.
    verify_transaction(&ctx, &trs, Some(&sender), None)
        .await
        .map_err(stage_err("verify"))?;
    tracing::info!(%id, "selfcheck: verified");

    // Stage 4: unconfirmed, then confirmed application.
    apply_unconfirmed(&ctx, &store, &trs, &sender, None)
        .await
        .map_err(stage_err("apply_unconfirmed"))?;
    let sender_mid = store
        .get(&sender_address)
        .await
        .map_err(|e| anyhow::anyhow!("store read failed: {e}"))?
        .context("sender vanished mid-selfcheck")?;

    let block = Block::new("1", 2, trs.timestamp + 10);
    apply(&ctx, &store, &trs, &block, &sender_mid)
        .await
        .map_err(stage_err("apply"))?;
    tracing::info!(%id, block = %block.id, "selfcheck: applied");

    // Stage 5: persistence and the replay guard.
    trs.block_id = Some(block.id.clone());
    let rows = db_save(&ctx, &trs).map_err(stage_err("db_save"))?;
    ledger
        .save_rows(&rows)
        .await
        .map_err(|e| anyhow::anyhow!("ledger save failed: {e}"))?;

    let mut replay = trs.clone();
    match process(&ctx, &ledger, &mut replay, &sender_mid).await {
        Err(TransactionError::AlreadyConfirmed(_)) => {}
        Ok(()) => bail!("selfcheck: replay was not rejected"),
        Err(other) => bail!("selfcheck: replay rejected with the wrong error: {other}"),
    }
    tracing::info!(%id, "selfcheck: replay rejected");

    // Final accounting.
    let sender_final = store
        .get(&sender_address)
        .await
        .map_err(|e| anyhow::anyhow!("store read failed: {e}"))?
        .context("sender vanished after apply")?;
    let recipient_final = store
        .get(&recipient_address)
        .await
        .map_err(|e| anyhow::anyhow!("store read failed: {e}"))?
        .context("recipient was never credited")?;

    println!("selfcheck passed");
    println!("  transaction: {id}");
    println!(
        "  sender:      {} SOLIS",
        format_solis_amount(sender_final.balance)
    );
    println!(
        "  recipient:   {} SOLIS",
        format_solis_amount(recipient_final.balance)
    );
    Ok(())
}

/// Wraps a pipeline error with the stage it failed in.
fn stage_err(stage: &'static str) -> impl Fn(TransactionError) -> anyhow::Error {
    move |e| anyhow::anyhow!("selfcheck failed at {stage}: {e}")
}

fn print_version() {
    println!("solis-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol crate: solis-protocol");
}
