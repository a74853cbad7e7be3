//! Search params CLI
//!
//! Resolve a query string against a schema file.
//!
//! # Usage
//!
//! ```bash
//! # Complete typed state as JSON
//! search-params resolve --schema alerts.yaml --query '?query=evil&filters=NOT(type:pe)'
//!
//! # Minimal query string, with persisted overrides applied
//! search-params delta --schema alerts.yaml --query 'rows=50' --stored 'rows=50' -o text
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use search_params::{
    BlueprintSet, DefaultOverrides, JsonFileStore, MemoryStore, ParamStore, SchemaConfig,
    SearchParams,
};

#[derive(Parser)]
#[command(name = "search-params")]
#[command(version)]
#[command(about = "Resolve and compact query strings against a parameter schema")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "json", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(clap::Args)]
struct Input {
    /// Schema file (YAML or JSON)
    #[arg(long, short, env = "SEARCH_PARAMS_SCHEMA")]
    schema: PathBuf,

    /// Query string to resolve
    #[arg(long, short, default_value = "")]
    query: String,

    /// Persisted default overrides, as a query string
    #[arg(long, conflicts_with = "store")]
    stored: Option<String>,

    /// JSON file holding persisted default overrides
    #[arg(long)]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the complete resolved state
    Resolve(Input),
    /// Print the minimal query string that reproduces the state
    Delta(Input),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Resolve(input) => cmd_resolve(input, cli.format),
        Commands::Delta(input) => cmd_delta(input, cli.format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": format!("{e:#}") }));
            } else {
                eprintln!("error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn cmd_resolve(input: &Input, format: OutputFormat) -> Result<()> {
    let set = effective_set(input)?;
    let resolved = set.full(&SearchParams::parse(&input.query));

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(resolved.values())
                    .context("failed to serialize state")?
            );
        }
        OutputFormat::Text => {
            for (key, value) in resolved.values() {
                println!("{key} = {value}");
            }
        }
    }
    Ok(())
}

fn cmd_delta(input: &Input, format: OutputFormat) -> Result<()> {
    let set = effective_set(input)?;
    let delta = set.delta(&SearchParams::parse(&input.query));

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "query": delta.to_string(),
                "values": delta.values(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => println!("{delta}"),
    }
    Ok(())
}

/// Schema set with persisted overrides applied and enforced fields locked.
fn effective_set(input: &Input) -> Result<BlueprintSet> {
    let schema = SchemaConfig::load(&input.schema)
        .with_context(|| format!("failed to load schema {}", input.schema.display()))?;
    let set = schema.blueprint_set()?;
    let config = schema.overrides_config();

    let store: Box<dyn ParamStore> = match (&input.stored, &input.store) {
        (_, Some(path)) => Box::new(JsonFileStore::new(path)),
        (Some(stored), None) => {
            let mut store = MemoryStore::new();
            store.set(&config.storage_key, stored)?;
            Box::new(store)
        }
        (None, None) => Box::new(MemoryStore::new()),
    };

    let overrides = DefaultOverrides::open(&set, &set.defaults(), config, store.as_ref())?;
    Ok(overrides
        .effective_blueprints()
        .with_locked(&schema.enforced))
}
