//! custody: operator CLI for the shared wallet custody module
//!
//! Drives the module against a sled-backed store: genesis, signing
//! transactions, delivering them at a height, replaying a transaction log
//! and querying committed state.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use custody::ante::{AnteHandler, Ed25519Verifier};
use custody::identity::{Keypair, ParticipantId, WalletId};
use custody::module::{export_genesis, init_genesis, CustodyQuery, GenesisState};
use custody::msg::{Decision, EffectDescriptor, ProposalBuilder, TxCodec, VoteBuilder};
use custody::proposal::ProposalId;
use custody::storage::SledStore;
use custody::{AppModule, CustodyModule};

#[derive(Parser)]
#[command(name = "custody")]
#[command(about = "Shared wallet custody module")]
struct Cli {
    /// Data directory of the node's store
    #[arg(long, env = "CUSTODY_HOME", default_value = "custody-data")]
    home: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize the store from a genesis file
    Init {
        #[arg(long)]
        genesis: PathBuf,
        #[arg(long, default_value_t = 0)]
        height: u64,
    },
    /// Generate a participant key
    Keygen,
    /// Build and sign a transaction, printed as hex
    #[command(subcommand)]
    Tx(TxCommand),
    /// Authenticate and deliver a signed transaction at a height
    Apply {
        #[arg(long)]
        height: u64,
        /// Hex-encoded signed transaction
        tx: String,
    },
    /// Deliver every transaction of a JSON-lines log in order
    Replay {
        log: PathBuf,
    },
    /// Query committed state
    #[command(subcommand)]
    Query(QueryCommand),
    /// Dump the full module state as JSON
    Export,
}

#[derive(Args)]
struct KeyArg {
    /// Hex-encoded secret key of the signing participant
    #[arg(long, env = "CUSTODY_KEY")]
    key: String,
}

#[derive(Subcommand)]
enum TxCommand {
    CreateProposal {
        #[command(flatten)]
        key: KeyArg,
        #[arg(long)]
        wallet: String,
        /// Effect kind, e.g. send or add_participant
        #[arg(long)]
        kind: String,
        /// Effect parameter as key=value, repeatable
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        #[arg(long)]
        expiry: u64,
    },
    Vote {
        #[command(flatten)]
        key: KeyArg,
        #[arg(long)]
        proposal: String,
        /// approve or reject
        #[arg(long)]
        decision: String,
    },
}

#[derive(Subcommand)]
enum QueryCommand {
    Proposal { id: String },
    Pending {
        wallet: String,
        /// Hide proposals already past their expiry at this height
        #[arg(long, default_value_t = 0)]
        height: u64,
    },
    Custody { wallet: String },
    /// Executed spends and contract actions of a wallet
    Authorizations { wallet: String },
    Tally { id: String },
    Votes { id: String },
}

/// One line of a replay log
#[derive(Serialize, Deserialize)]
struct LogEntry {
    height: u64,
    tx: String,
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("custody={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Init { genesis, height } => {
            let genesis = GenesisState::from_file(&genesis)
                .with_context(|| format!("loading genesis from {}", genesis.display()))?;
            let mut store = SledStore::open(&cli.home)?;
            init_genesis(&mut store, &genesis, height)?;
            store.flush()?;
            info!(home = %cli.home.display(), "Store initialized");
        }
        Command::Keygen => {
            let keypair = Keypair::generate();
            let out = serde_json::json!({
                "secret": keypair.to_hex(),
                "public_key": keypair.public_key(),
                "participant": ParticipantId::from_public_key(&keypair.public_key()),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Tx(tx) => println!("{}", build_tx(tx)?),
        Command::Apply { height, tx } => {
            let mut store = SledStore::open(&cli.home)?;
            let module = CustodyModule::load(&store)?;
            let signed = TxCodec::decode_signed_hex(&tx)?;
            let cmd = AnteHandler::new(Ed25519Verifier).check(&signed)?;
            let receipt = module.deliver(&mut store, height, &cmd)?;
            store.flush()?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        Command::Replay { log } => replay(&cli.home, &log)?,
        Command::Query(query) => {
            let store = SledStore::open(&cli.home)?;
            println!("{}", run_query(&store, query)?);
        }
        Command::Export => {
            let store = SledStore::open(&cli.home)?;
            println!("{}", serde_json::to_string_pretty(&export_genesis(&store)?)?);
        }
    }

    Ok(())
}

fn build_tx(tx: TxCommand) -> anyhow::Result<String> {
    let signed = match tx {
        TxCommand::CreateProposal {
            key,
            wallet,
            kind,
            params,
            expiry,
        } => {
            let keypair = Keypair::from_hex(&key.key)?;
            let effect = params
                .into_iter()
                .fold(EffectDescriptor::new(kind), |e, (k, v)| e.with_param(k, v));
            ProposalBuilder::new()
                .signer(&keypair)
                .wallet(wallet)
                .effect(effect)
                .expiry_height(expiry)
                .build()?
        }
        TxCommand::Vote {
            key,
            proposal,
            decision,
        } => {
            let keypair = Keypair::from_hex(&key.key)?;
            let decision = match Decision::parse(&decision) {
                Some(decision) => decision,
                None => bail!("decision must be approve or reject, got '{}'", decision),
            };
            VoteBuilder::new()
                .signer(&keypair)
                .proposal(ProposalId::from_hex(&proposal)?)
                .decision(decision)
                .build()?
        }
    };
    Ok(TxCodec::encode_signed_hex(&signed)?)
}

fn replay(home: &Path, log: &Path) -> anyhow::Result<()> {
    let file = File::open(log).with_context(|| format!("opening {}", log.display()))?;
    let mut store = SledStore::open(home)?;
    let module = CustodyModule::load(&store)?;
    let ante = AnteHandler::new(Ed25519Verifier);

    let mut last_height = 0;
    let mut delivered = 0usize;
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: LogEntry =
            serde_json::from_str(&line).with_context(|| format!("line {}", n + 1))?;
        if entry.height < last_height {
            bail!(
                "line {}: height {} goes backwards from {}",
                n + 1,
                entry.height,
                last_height
            );
        }
        last_height = entry.height;

        let signed = TxCodec::decode_signed_hex(&entry.tx)?;
        let cmd = match ante.check(&signed) {
            Ok(cmd) => cmd,
            Err(err) => {
                warn!(line = n + 1, height = entry.height, error = %err, "Skipping unauthenticated transaction");
                continue;
            }
        };

        let receipt = module.deliver(&mut store, entry.height, &cmd)?;
        println!("{}", serde_json::to_string(&receipt)?);
        delivered += 1;
    }

    store.flush()?;
    info!(delivered, last_height, "Replay finished");
    Ok(())
}

fn run_query(store: &SledStore, query: QueryCommand) -> anyhow::Result<String> {
    let json = match query {
        QueryCommand::Proposal { id } => {
            let id = ProposalId::from_hex(&id)?;
            match CustodyQuery::proposal(store, &id)? {
                Some(proposal) => serde_json::to_string_pretty(&proposal)?,
                None => bail!("proposal {} not found", id),
            }
        }
        QueryCommand::Pending { wallet, height } => {
            let wallet = WalletId::parse(&wallet)?;
            serde_json::to_string_pretty(&CustodyQuery::pending(store, &wallet, height)?)?
        }
        QueryCommand::Custody { wallet } => {
            let wallet = WalletId::parse(&wallet)?;
            match CustodyQuery::custody(store, &wallet)? {
                Some(record) => serde_json::to_string_pretty(&record)?,
                None => bail!("no custody record for wallet {}", wallet),
            }
        }
        QueryCommand::Authorizations { wallet } => {
            let wallet = WalletId::parse(&wallet)?;
            serde_json::to_string_pretty(&CustodyQuery::authorizations(store, &wallet)?)?
        }
        QueryCommand::Tally { id } => {
            let id = ProposalId::from_hex(&id)?;
            match CustodyQuery::tally(store, &id)? {
                Some(tally) => serde_json::to_string_pretty(&tally)?,
                None => bail!("proposal {} not found", id),
            }
        }
        QueryCommand::Votes { id } => {
            let id = ProposalId::from_hex(&id)?;
            serde_json::to_string_pretty(&CustodyQuery::votes(store, &id)?)?
        }
    };
    Ok(json)
}
