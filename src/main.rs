use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::Rng;
use serde_json::Value;
use tracing::info;

use fractal_ledger::settings::Settings;
use fractal_ledger::{
    create_genesis_block, create_genesis_block_at, current_timestamp, Block, BlockHeader,
    Coordinate, Transaction, TransferTransaction, HASH_RECORD_VERSION,
};

// -----------------------------
// CLI
// -----------------------------

#[derive(Parser, Debug)]
#[clap(name = "fractal-ledger", version, about = "Fractal-coordinate block builder and hasher")]
struct Cli {
    /// Settings file (TOML, JSON or YAML).
    #[clap(long, value_parser)]
    config: Option<PathBuf>,

    /// Overrides the configured log level.
    #[clap(long, value_parser)]
    log_level: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the genesis block and its hash.
    Genesis {
        /// Fixed timestamp (seconds) for a reproducible hash.
        #[clap(long, value_parser)]
        timestamp: Option<f64>,
    },
    /// Build genesis plus one child block and register the child.
    Demo {
        /// Number of random transfers in the child block.
        #[clap(long, value_parser, default_value_t = 3)]
        transactions: usize,
    },
    /// Hash a header (or block) export form read from a JSON file.
    Hash {
        #[clap(value_parser)]
        path: PathBuf,
    },
}

// -----------------------------
// Helpers
// -----------------------------

fn print_json(value: &Value, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

fn random_transfers(count: usize, receiver: &Coordinate) -> Result<Vec<Transaction>> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|nonce| -> Result<Transaction> {
            let sender = Coordinate::from_path(vec![rng.gen_range(0..3)])?;
            let tx = TransferTransaction::builder(rng.gen_range(1..1000) as f64, 0.1, nonce as u64)
                .sender(sender)
                .receiver(receiver.clone())
                .signature(format!("sig_{}", rng.gen::<u16>()))
                .build()?;
            Ok(tx.into())
        })
        .collect()
}

// -----------------------------
// Commands
// -----------------------------

fn root_genesis(timestamp: Option<f64>) -> Result<Block> {
    let block = match timestamp {
        Some(ts) => create_genesis_block_at(Coordinate::root(), ts)
            .context("invalid genesis timestamp")?,
        None => create_genesis_block(Coordinate::root()),
    };
    Ok(block)
}

fn genesis(settings: &Settings, timestamp: Option<f64>) -> Result<()> {
    let block = root_genesis(timestamp.or(settings.genesis_timestamp))?;
    info!(hash = %block.block_hash(), "created genesis block");
    print_json(&block.to_dict()?, settings.pretty)
}

fn demo(settings: &Settings, tx_count: usize) -> Result<()> {
    let mut genesis = root_genesis(settings.genesis_timestamp)?;
    let genesis_hash = genesis.block_hash();
    info!(hash = %genesis_hash, "genesis block");

    let slot = 0;
    let child_coord = Coordinate::root().child(slot)?;
    let txs = random_transfers(tx_count, &child_coord)?;
    let mut child = Block::assemble(genesis_hash.clone(), current_timestamp(), child_coord, txs)?;
    child.header_mut().set_nonce(rand::thread_rng().gen());
    let child_hash = child.block_hash();
    info!(
        hash = %child_hash,
        coordinate = %child.header().coordinate(),
        txs = child.transactions().len(),
        nonce = child.header().nonce(),
        "child block"
    );

    genesis.header_mut().add_child_reference(slot, child_hash);
    let rehashed = genesis.block_hash();
    info!(before = %genesis_hash, after = %rehashed, "genesis re-hashed after child registration");

    print_json(
        &serde_json::json!({
            "genesis": genesis.to_dict()?,
            "child": child.to_dict()?,
        }),
        settings.pretty,
    )
}

fn hash(path: &Path) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&text).context("parsing header JSON")?;
    let record = value.get("header").unwrap_or(&value);
    let header = BlockHeader::from_dict(record).context("decoding header export form")?;
    info!(record_version = HASH_RECORD_VERSION, "hashing header");
    println!("{}", header.calculate_hash());
    Ok(())
}

// -----------------------------
// Application
// -----------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    if let Some(level) = cli.log_level {
        settings.log_level = level;
    }

    tracing_subscriber::fmt()
        .with_max_level(settings.tracing_level())
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Genesis { timestamp } => genesis(&settings, timestamp),
        Command::Demo { transactions } => demo(&settings, transactions),
        Command::Hash { path } => hash(&path),
    }
}
