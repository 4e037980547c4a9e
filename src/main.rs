//! PostgREST Data Provider CLI
//!
//! Runs one provider operation against a PostgREST API and prints the result.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pgrest_common::config::ProviderConfig;
use pgrest_provider::{Operation, PostgrestProvider};

#[derive(Parser, Debug)]
#[command(name = "pgrest-provider")]
#[command(about = "Run data provider operations against a PostgREST API", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "pgrest.toml")]
    config: PathBuf,

    /// API base URL, overrides the configuration file
    #[arg(long, env = "PGREST_API_URL")]
    api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print the HTTP request instead of sending it
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct OperationArgs {
    /// Resource (table or view) name
    #[arg(short, long)]
    resource: String,

    /// Operation parameters as JSON, e.g. '{"ids":[1,2]}'
    #[arg(short, long, default_value = "{}")]
    params: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// getList: page of records with total count
    List(OperationArgs),
    /// getOne: single record by identifier
    Get(OperationArgs),
    /// getMany: records by identifiers
    GetMany(OperationArgs),
    /// getManyReference: page of records referencing a parent
    Reference(OperationArgs),
    /// create: insert one record
    Create(OperationArgs),
    /// update: patch one record
    Update(OperationArgs),
    /// updateMany: patch records by identifiers
    UpdateMany(OperationArgs),
    /// delete: remove one record
    Delete(OperationArgs),
    /// deleteMany: remove records by identifiers
    DeleteMany(OperationArgs),
}

impl Command {
    fn into_parts(self) -> (&'static str, OperationArgs) {
        match self {
            Self::List(args) => ("getList", args),
            Self::Get(args) => ("getOne", args),
            Self::GetMany(args) => ("getMany", args),
            Self::Reference(args) => ("getManyReference", args),
            Self::Create(args) => ("create", args),
            Self::Update(args) => ("update", args),
            Self::UpdateMany(args) => ("updateMany", args),
            Self::Delete(args) => ("delete", args),
            Self::DeleteMany(args) => ("deleteMany", args),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if args.config.exists() {
        let content = std::fs::read_to_string(&args.config)?;
        toml::from_str(&content)?
    } else {
        ProviderConfig::default()
    };
    if let Some(api_url) = args.api_url {
        config.api_url = api_url;
    }

    // Initialize logging on stderr, stdout carries the result
    let level = args.log_level.unwrap_or_else(|| config.log.level.clone());
    let (plain, json) = if config.log.json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr)), None)
    };
    tracing_subscriber::registry()
        .with(plain)
        .with(json)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level)))
        .init();

    info!("PostgREST data provider v{}", env!("CARGO_PKG_VERSION"));
    info!("  - API: {}", config.base_url());

    let (name, op_args) = args.command.into_parts();
    let params: serde_json::Value = serde_json::from_str(&op_args.params)?;
    let operation = Operation::from_json(name, params)?;

    let provider = PostgrestProvider::from_config(&config)?;

    let output = if args.dry_run {
        serde_json::to_value(operation.request(&op_args.resource, provider.requests())?)?
    } else {
        match operation.execute(&op_args.resource, &provider).await {
            Ok(value) => value,
            Err(e) => {
                error!(code = e.error_code(), "{} failed: {}", operation.name(), e);
                return Err(e.into());
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
