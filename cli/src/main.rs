//! ChainABI CLI: decode EVM calldata and logs against known interfaces.
//!
//! # Commands
//! ```text
//! chainabi decode-call --calldata <hex> [--to <addr>] [--abi <path.json>...]
//! chainabi decode-log  --topics <...> [--data <hex>] [--address <addr>]
//! chainabi classify    --bytecode <hex> | --address <addr> [--interface <name>]
//! chainabi signatures  --interface <name|path.json>
//! chainabi token-info  --address <addr> [--holder <addr>]
//! chainabi decode-tx   --hash <tx hash>
//! ```

use anyhow::{Context, Result};
use chainabi_core::{DecodedCall, DecodedEvent, RawLog, RawTransaction, ZERO_ADDRESS};
use chainabi_evm::{classify, decode_log_any, decode_method_any, validate_bytecode};
use chainabi_observability::{init_tracing, ChainAbiMetrics};
use chainabi_registry::{AbiRegistry, InterfaceDefinition};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cmd_chain;
mod config;

use config::{CliConfig, RPC_URL_ENV};

#[derive(Parser)]
#[command(
    name = "chainabi",
    about = "Decode EVM calldata and event logs against registered ABIs",
    long_about = "
ChainABI CLI: decode EVM function calls and event logs, classify contracts
by bytecode, and read ERC-20/721 token metadata.

ENVIRONMENT VARIABLES:
  CHAINABI_RPC_URL    JSON-RPC endpoint (overrides rpc_url in the config file)
",
    version
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint (overrides config and environment)
    #[arg(long, global = true)]
    rpc: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode transaction calldata
    #[command(name = "decode-call")]
    DecodeCall {
        /// Raw calldata (0x-prefixed hex)
        #[arg(long)]
        calldata: String,
        /// Destination contract, reported in the output
        #[arg(long)]
        to: Option<String>,
        /// ABI JSON files to decode against instead of the registry
        #[arg(long)]
        abi: Vec<PathBuf>,
    },

    /// Decode an event log from raw topics + data
    #[command(name = "decode-log")]
    DecodeLog {
        /// topics[0] = event signature hash, topics[1..] = indexed params
        #[arg(long, num_args = 1..)]
        topics: Vec<String>,
        /// Non-indexed params (hex, 0x-prefixed)
        #[arg(long, default_value = "0x")]
        data: String,
        /// Emitting contract
        #[arg(long, default_value = ZERO_ADDRESS)]
        address: String,
        /// ABI JSON files to decode against instead of the registry
        #[arg(long)]
        abi: Vec<PathBuf>,
    },

    /// Classify a contract as ERC-721, ERC-20, ERC-1155 or unknown
    Classify {
        /// Deployed bytecode (hex)
        #[arg(long, conflicts_with = "address", required_unless_present = "address")]
        bytecode: Option<String>,
        /// Fetch the bytecode of this address over RPC
        #[arg(long)]
        address: Option<String>,
        /// Also check every selector/topic of this registered interface
        #[arg(long)]
        interface: Option<String>,
    },

    /// List the selectors, topics and signatures of an interface
    Signatures {
        /// Registered interface name or path to an ABI JSON file
        #[arg(long)]
        interface: String,
    },

    /// Resolve token metadata over RPC
    #[command(name = "token-info")]
    TokenInfo {
        #[arg(long)]
        address: String,
        /// Also read balanceOf(holder)
        #[arg(long)]
        holder: Option<String>,
    },

    /// Fetch a transaction and decode its calldata and receipt logs
    #[command(name = "decode-tx")]
    DecodeTx {
        #[arg(long)]
        hash: String,
    },
}

/// Settings resolved from flags, environment and config file.
pub(crate) struct App {
    pub config: CliConfig,
    pub json: bool,
    pub metrics: ChainAbiMetrics,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?
        .with_rpc_override(std::env::var(RPC_URL_ENV).ok(), cli.rpc.clone());
    if cli.verbose {
        config.log.level = "debug".into();
    }
    init_tracing(&config.log).context("install tracing subscriber")?;

    let ctx = App {
        config,
        json: cli.json,
        metrics: ChainAbiMetrics::global(),
    };

    match cli.command {
        Commands::DecodeCall { calldata, to, abi } => cmd_decode_call(&ctx, &calldata, to, &abi),
        Commands::DecodeLog {
            topics,
            data,
            address,
            abi,
        } => cmd_decode_log(&ctx, topics, &data, &address, &abi),
        Commands::Classify {
            bytecode,
            address,
            interface,
        } => {
            let code = match (bytecode, address) {
                (Some(code), _) => code,
                (None, Some(address)) => cmd_chain::fetch_code(&ctx, &address).await?,
                (None, None) => anyhow::bail!("either --bytecode or --address is required"),
            };
            cmd_classify(&ctx, &code, interface.as_deref())
        }
        Commands::Signatures { interface } => cmd_signatures(&ctx, &interface),
        Commands::TokenInfo { address, holder } => {
            cmd_chain::token_info(&ctx, &address, holder.as_deref()).await
        }
        Commands::DecodeTx { hash } => cmd_chain::decode_tx(&ctx, &hash).await,
    }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// Bundled interfaces plus `abi_dir`, or exactly `files` when any are given.
pub(crate) fn load_registry(config: &CliConfig, files: &[PathBuf]) -> Result<AbiRegistry> {
    if !files.is_empty() {
        let mut registry = AbiRegistry::new();
        for path in files {
            registry
                .load_file(path)
                .with_context(|| format!("load ABI file '{}'", path.display()))?;
        }
        return Ok(registry);
    }

    let mut registry = AbiRegistry::with_defaults().context("load bundled interfaces")?;
    if let Some(dir) = &config.abi_dir {
        let loaded = registry
            .load_directory(dir)
            .with_context(|| format!("load ABI directory '{}'", dir.display()))?;
        tracing::debug!(dir = %dir.display(), loaded, "registered extra interfaces");
    }
    Ok(registry)
}

fn resolve_interface(config: &CliConfig, name_or_path: &str) -> Result<Arc<InterfaceDefinition>> {
    let path = Path::new(name_or_path);
    if path.extension().map_or(false, |ext| ext == "json") && path.exists() {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read ABI file '{}'", path.display()))?;
        return Ok(Arc::new(InterfaceDefinition::parse(&json)?));
    }
    Ok(load_registry(config, &[])?.require(name_or_path)?)
}

fn parse_hex(label: &str, s: &str) -> Result<Vec<u8>> {
    hex::decode(s.trim().strip_prefix("0x").unwrap_or(s.trim()))
        .with_context(|| format!("invalid {label} hex"))
}

// ─── Output ──────────────────────────────────────────────────────────────────

pub(crate) fn print_call(call: &DecodedCall) {
    println!("Method:    {}", call.signature);
    println!("Selector:  {}", call.selector_hex);
    if !call.contract_address.is_empty() {
        println!("Contract:  {}", call.contract_address);
    }
    println!("Inputs:");
    for (name, val) in &call.parameters {
        println!("  {}: {}", name, val);
    }
}

pub(crate) fn print_event(event: &DecodedEvent) {
    println!("Event:     {}", event.signature);
    println!("Contract:  {}", event.contract_address);
    println!("Fields:");
    for (name, val) in &event.parameters {
        println!("  {}: {}", name, val);
    }
}

// ─── Offline commands ────────────────────────────────────────────────────────

fn cmd_decode_call(ctx: &App, calldata: &str, to: Option<String>, abi: &[PathBuf]) -> Result<()> {
    let registry = load_registry(&ctx.config, abi)?;
    let tx = RawTransaction::new(to, parse_hex("calldata", calldata)?);

    let decoded = decode_method_any(&tx, registry.candidates()).map_err(|e| {
        ctx.metrics.record_error(&e);
        e
    })?;
    ctx.metrics.record_call(&decoded.signature);

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&decoded)?);
    } else {
        print_call(&decoded);
    }
    Ok(())
}

fn cmd_decode_log(
    ctx: &App,
    topics: Vec<String>,
    data: &str,
    address: &str,
    abi: &[PathBuf],
) -> Result<()> {
    let registry = load_registry(&ctx.config, abi)?;
    let log = RawLog::new(address, topics, parse_hex("data", data)?);

    let decoded = decode_log_any(&log, registry.candidates()).map_err(|e| {
        ctx.metrics.record_error(&e);
        e
    })?;
    ctx.metrics.record_event(&decoded.signature);

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&decoded)?);
    } else {
        print_event(&decoded);
    }
    Ok(())
}

fn cmd_classify(ctx: &App, bytecode: &str, interface: Option<&str>) -> Result<()> {
    let standard = classify(bytecode);
    let implements = match interface {
        Some(name) => Some((name, validate_bytecode(bytecode, &*resolve_interface(&ctx.config, name)?))),
        None => None,
    };

    if ctx.json {
        let mut out = serde_json::json!({ "standard": standard });
        if let Some((name, ok)) = implements {
            out["interface"] = serde_json::json!({ "name": name, "implemented": ok });
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Standard:  {}", standard);
        if let Some((name, ok)) = implements {
            println!("Implements {}: {}", name, if ok { "yes" } else { "no" });
        }
    }
    Ok(())
}

fn cmd_signatures(ctx: &App, interface: &str) -> Result<()> {
    let iface = resolve_interface(&ctx.config, interface)?;

    if ctx.json {
        let methods: Vec<_> = iface
            .methods()
            .map(|(key, m)| serde_json::json!({ "key": key, "selector": m.selector_hex(), "signature": m.signature }))
            .collect();
        let events: Vec<_> = iface
            .events()
            .map(|(key, e)| {
                serde_json::json!({
                    "key": key,
                    "topic": e.topic_hex(),
                    "signature": e.signature,
                    "anonymous": e.anonymous,
                })
            })
            .collect();
        let out = serde_json::json!({ "methods": methods, "events": events });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Methods ({}):", iface.method_count());
        for (key, m) in iface.methods() {
            println!("  {}  {:24} {}", m.selector_hex(), key, m.signature);
        }
        println!("Events ({}):", iface.event_count());
        for (key, e) in iface.events() {
            println!("  {}  {:24} {}", e.topic_hex(), key, e.signature);
        }
    }
    Ok(())
}
