//! Operator CLI for the transaction orchestration layer.
//!
//! Submits transfers, batches, and contract calls against the configured
//! ledger network. The signing key is read from the `GATEWAY_PRIVATE_KEY`
//! environment variable; it never appears on the command line or in
//! config files.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chain_gateway::contract::ContractBinding;
use chain_gateway::ledger::{parse_address, LedgerRpc, NetworkClient};
use chain_gateway::orchestrator::{ItemOutcome, Orchestrator, TransferRequest};
use chain_gateway::tx::Credential;
use alloy::dyn_abi::{DynSolValue, Specifier};

#[derive(Parser)]
#[command(name = "chain-gateway")]
#[command(about = "Transaction orchestration CLI for the records dashboard ledger", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults target a local node.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send value to a single recipient
    Transfer {
        /// Recipient address
        to: String,
        /// Amount in the human denomination (e.g. "1.5")
        amount: String,
        /// Gas limit override
        #[arg(long)]
        gas_limit: Option<u64>,
    },
    /// Run an ordered batch of transfers from a JSON file
    Batch {
        /// JSON file: [{"to": "0x...", "amount": "1.5"}, ...]
        file: PathBuf,
        /// Gas limit per item
        #[arg(long)]
        gas_limit: Option<u64>,
    },
    /// Invoke a state-changing contract method
    Call {
        /// Path to the contract ABI JSON
        #[arg(long)]
        abi: PathBuf,
        /// Deployed contract address
        #[arg(long)]
        address: String,
        /// Method name
        method: String,
        /// Method arguments, coerced against the ABI
        args: Vec<String>,
        /// Gas limit override (estimation still runs as a revert check)
        #[arg(long)]
        gas_limit: Option<u64>,
    },
    /// Read a contract method without sending a transaction
    Query {
        /// Path to the contract ABI JSON
        #[arg(long)]
        abi: PathBuf,
        /// Deployed contract address
        #[arg(long)]
        address: String,
        /// Method name
        method: String,
        /// Method arguments, coerced against the ABI
        args: Vec<String>,
    },
    /// Show an account's native-token balance
    Balance {
        /// Account address
        address: String,
    },
    /// Check ledger connectivity and chain id
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chain_gateway=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = chain_gateway::config::load_or_default(cli.config.as_deref())?;

    let client = Arc::new(NetworkClient::new(config.network.clone()).await?);
    let orchestrator = Orchestrator::new(client.clone(), &config);

    match cli.command {
        Commands::Transfer {
            to,
            amount,
            gas_limit,
        } => {
            let credential = Credential::from_env()?;
            let from = credential.address().to_string();
            let gas = gas_limit.unwrap_or(config.gas.transfer_limit);

            let receipt = orchestrator
                .transfer(&from, &to, &amount, gas, &credential)
                .await?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        Commands::Batch { file, gas_limit } => {
            let credential = Credential::from_env()?;
            let from = credential.address().to_string();
            let gas = gas_limit.unwrap_or(config.gas.transfer_limit);

            let items: Vec<TransferRequest> =
                serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            let result = orchestrator
                .batch_transfer(&from, items, gas, &credential)
                .await?;

            for (index, outcome) in result.outcomes().iter().enumerate() {
                match outcome {
                    ItemOutcome::Confirmed(receipt) => {
                        println!("item {index}: confirmed {}", receipt.tx_hash);
                    }
                    ItemOutcome::Failed { stage, error } => {
                        println!("item {index}: failed at {stage:?}: {error}");
                    }
                    ItemOutcome::NotAttempted => {
                        println!("item {index}: not attempted");
                    }
                }
            }
            if !result.all_confirmed() {
                std::process::exit(1);
            }
        }
        Commands::Call {
            abi,
            address,
            method,
            args,
            gas_limit,
        } => {
            let credential = Credential::from_env()?;
            let from = credential.address().to_string();
            let binding = load_binding(&abi, &address)?;
            let values = coerce_args(&binding, &method, &args)?;

            let receipt = orchestrator
                .call_contract_method(&binding, &method, &values, &from, gas_limit, &credential)
                .await?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        Commands::Query {
            abi,
            address,
            method,
            args,
        } => {
            let binding = load_binding(&abi, &address)?;
            let values = coerce_args(&binding, &method, &args)?;

            let outputs = orchestrator
                .query_contract_method(&binding, &method, &values)
                .await?;
            for value in outputs {
                println!("{value:?}");
            }
        }
        Commands::Balance { address } => {
            let account = parse_address(&address)?;
            let balance = client.balance(account).await?;
            println!("{} ({} atomic units)", orchestrator.units().to_human(balance), balance);
        }
        Commands::Status => {
            let chain_id = client.chain_id().await?;
            let block = client.block_number().await?;
            println!("chain id: {chain_id}");
            println!("tip block: {block}");
            if chain_id != config.network.chain_id {
                println!(
                    "warning: configured for chain {} but connected to {}",
                    config.network.chain_id, chain_id
                );
            }
        }
    }

    Ok(())
}

fn load_binding(
    abi_path: &PathBuf,
    address: &str,
) -> Result<ContractBinding, Box<dyn std::error::Error>> {
    let abi_json = std::fs::read_to_string(abi_path)?;
    let address = parse_address(address)?;
    Ok(ContractBinding::from_json(&abi_json, address)?)
}

/// Coerce CLI string arguments against the ABI's declared parameter types.
fn coerce_args(
    binding: &ContractBinding,
    method: &str,
    raw: &[String],
) -> Result<Vec<DynSolValue>, Box<dyn std::error::Error>> {
    let functions = binding
        .abi()
        .function(method)
        .ok_or_else(|| format!("method {method} not found in ABI"))?;
    let function = functions
        .iter()
        .find(|f| f.inputs.len() == raw.len())
        .ok_or_else(|| format!("no overload of {method} takes {} argument(s)", raw.len()))?;

    let mut values = Vec::with_capacity(raw.len());
    for (param, arg) in function.inputs.iter().zip(raw) {
        let ty = param.resolve()?;
        let value = ty
            .coerce_str(arg)
            .map_err(|e| format!("argument '{arg}' is not a valid {}: {e}", param.ty))?;
        values.push(value);
    }
    Ok(values)
}
