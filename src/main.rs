//! tfchainc - offline transaction tool
//!
//! Decodes, encodes, identifies and validates tfchain transactions without a
//! running daemon. Transactions are read as hex-encoded binary or as the JSON
//! envelope; the format is detected from the input.
//!
//! - `decode`   - binary (hex) to JSON
//! - `encode`   - JSON to binary (hex)
//! - `ids`      - transaction and output identifiers
//! - `validate` - default validation and standardness
//! - `short-id` - compose or inspect short transaction IDs
//! - `version`  - chain and tool version

use std::io::Read;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;

use tfchain_core::logging::{self, LogFormat};
use tfchain_core::node::{BlockchainInfo, Network};
use tfchain_core::types::{BlockHeight, Transaction, TransactionRegistry, TransactionShortId};

#[derive(Parser, Debug)]
#[command(
    name = "tfchainc",
    about = "Offline tfchain transaction tool",
    version,
    propagate_version = true
)]
struct Cli {
    /// Network whose chain constants apply.
    #[arg(long, global = true, env = "TFCHAIN_NETWORK", default_value = "standard")]
    network: Network,

    /// Log output format: pretty or json.
    #[arg(long, global = true, env = "TFCHAIN_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a binary transaction as JSON.
    Decode(InputArgs),
    /// Print the binary encoding of a JSON transaction as hex.
    Encode(InputArgs),
    /// Print the transaction ID and the IDs of its outputs.
    Ids(InputArgs),
    /// Validate a transaction against the network's constants.
    Validate(ValidateArgs),
    /// Compose or inspect short transaction IDs.
    #[command(subcommand)]
    ShortId(ShortIdCommands),
    /// Print version information.
    Version,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Hex-encoded binary or JSON transaction. Read from stdin when omitted.
    input: Option<String>,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Height of the block the transaction would be included in.
    #[arg(long, default_value_t = 0)]
    height: BlockHeight,

    /// Also verify input signatures.
    #[arg(long)]
    signatures: bool,
}

#[derive(Subcommand, Debug)]
enum ShortIdCommands {
    /// Pack a block height and a sequence index.
    Compose {
        #[arg(long)]
        height: BlockHeight,
        #[arg(long)]
        index: u16,
    },
    /// Unpack a short ID.
    Inspect { id: TransactionShortId },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging("tfchain_core=warn,tfchainc=info", cli.log_format);

    TransactionRegistry::builder()
        .build()
        .install()
        .context("failed to install transaction registry")?;
    tracing::debug!(network = %cli.network, "tfchainc started");

    match cli.command {
        Commands::Decode(args) => decode(args),
        Commands::Encode(args) => encode(args),
        Commands::Ids(args) => ids(args),
        Commands::Validate(args) => validate(args, cli.network),
        Commands::ShortId(cmd) => short_id(cmd),
        Commands::Version => print_json(&BlockchainInfo::new(cli.network)),
    }
}

fn read_input(args: InputArgs) -> Result<String> {
    match args.input {
        Some(input) => Ok(input),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read transaction from stdin")?;
            Ok(input)
        }
    }
}

fn parse_transaction(input: &str) -> Result<Transaction> {
    let input = input.trim();
    if input.starts_with('{') {
        let value: serde_json::Value =
            serde_json::from_str(input).context("transaction is not valid JSON")?;
        return Transaction::from_json(value).context("failed to decode JSON transaction");
    }
    let bytes = hex::decode(input).context("transaction is neither JSON nor hex")?;
    Transaction::from_bytes(&bytes).context("failed to decode binary transaction")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn decode(args: InputArgs) -> Result<()> {
    let tx = parse_transaction(&read_input(args)?)?;
    print_json(&tx.to_json()?)
}

fn encode(args: InputArgs) -> Result<()> {
    let tx = parse_transaction(&read_input(args)?)?;
    println!("{}", hex::encode(tx.to_bytes()?));
    Ok(())
}

fn ids(args: InputArgs) -> Result<()> {
    let tx = parse_transaction(&read_input(args)?)?;
    let coin_outputs = (0..tx.coin_outputs.len() as u64)
        .map(|i| tx.coin_output_id(i))
        .collect::<Result<Vec<_>, _>>()?;
    let block_stake_outputs = (0..tx.block_stake_outputs.len() as u64)
        .map(|i| tx.block_stake_output_id(i))
        .collect::<Result<Vec<_>, _>>()?;
    print_json(&json!({
        "id": tx.id()?,
        "coinoutputids": coin_outputs,
        "blockstakeoutputids": block_stake_outputs,
    }))
}

fn validate(args: ValidateArgs, network: Network) -> Result<()> {
    let tx = parse_transaction(&read_input(args.input)?)?;
    let ctx = network.chain_constants().validation_context(args.height);

    tx.is_standard_transaction()
        .context("transaction is not standard")?;
    tx.validate_transaction(&ctx)
        .context("transaction is invalid")?;
    if args.signatures {
        tx.verify_input_signatures()
            .context("signature verification failed")?;
    }

    let id = tx.id()?;
    tracing::info!(%id, %network, height = args.height, "transaction valid");
    print_json(&json!({ "id": id, "valid": true }))
}

fn short_id(cmd: ShortIdCommands) -> Result<()> {
    let id = match cmd {
        ShortIdCommands::Compose { height, index } => {
            if !TransactionShortId::fits(height, index) {
                bail!("height {} or sequence index {} out of range for a short ID", height, index);
            }
            TransactionShortId::new(height, index)
        }
        ShortIdCommands::Inspect { id } => id,
    };
    print_json(&json!({
        "shortid": id,
        "height": id.block_height(),
        "sequenceindex": id.transaction_sequence_index(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_transaction_detects_format() {
        let tx = Transaction::new();
        let hex_input = hex::encode(tx.to_bytes().unwrap());
        assert_eq!(parse_transaction(&hex_input).unwrap(), tx);

        let json_input = tx.to_json().unwrap().to_string();
        assert_eq!(parse_transaction(&json_input).unwrap(), tx);

        assert!(parse_transaction("not a transaction").is_err());
    }
}
