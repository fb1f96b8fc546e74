//! # CLI Layer
//!
//! The CLI layer is the **only** place in the workspace that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Owns an async runtime
//! - Handles argument parsing
//! - Formats output for human consumption
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: Convert shell arguments into typed commands via clap
//! 2. **Context Setup**: Resolve configuration, build the cache over an `FsGateway`
//! 3. **Dispatch**: Each invocation loads the collection, then applies one mutation
//! 4. **Output Formatting**: Render records and outcomes via `render.rs`
//! 5. **Exit Status**: A failed outcome becomes `Ok(false)`, plumbing errors `Err`

use super::logging;
use super::render::{render_listing_json, render_outcome, render_records, render_status_json};
use super::setup::{Cli, Commands};
use anyhow::Context;
use clap::Parser;
use modeldata::config::ModelDataConfig;
use modeldata::record::parse_record;
use modeldata::{CollectionCache, FsGateway, ModelDataError, OperationKind, Outcome};

type Cache = CollectionCache<FsGateway>;

/// Parse arguments, run one command, and report whether its outcome succeeded.
pub fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = resolve_config(&cli)?;

    if let Commands::Config { template } = &cli.command {
        return handle_config(&config, *template);
    }

    let cache = CollectionCache::from_config(&config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(dispatch(&cli, &cache))
}

/// Config file and environment first, then command-line overrides.
fn resolve_config(cli: &Cli) -> anyhow::Result<ModelDataConfig> {
    let mut config = ModelDataConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if cli.create_missing {
        config.missing_as_empty = true;
    }
    tracing::debug!(?config, "configuration resolved");
    Ok(config)
}

async fn dispatch(cli: &Cli, cache: &Cache) -> anyhow::Result<bool> {
    match &cli.command {
        Commands::List { collection } => handle_list(cli, cache, collection).await,
        Commands::Add { collection, record } => {
            let record = record_arg(record)?;
            if !load_first(cli, cache, collection).await? {
                return Ok(false);
            }
            cache.create(collection, record).await;
            report(cli, cache, OperationKind::Create)
        }
        Commands::Update {
            collection,
            index,
            record,
        } => {
            let record = record_arg(record)?;
            if !load_first(cli, cache, collection).await? {
                return Ok(false);
            }
            cache.update(collection, *index, record).await;
            report(cli, cache, OperationKind::Update)
        }
        Commands::Delete { collection, index } => {
            if !load_first(cli, cache, collection).await? {
                return Ok(false);
            }
            cache.delete(collection, *index).await;
            report(cli, cache, OperationKind::Delete)
        }
        // handled before the runtime starts
        Commands::Config { .. } => Ok(true),
    }
}

async fn handle_list(cli: &Cli, cache: &Cache, collection: &str) -> anyhow::Result<bool> {
    let loaded = cache.load(collection).await;
    if cli.json {
        let snapshot = cache.status().snapshot();
        println!(
            "{}",
            render_listing_json(collection, &cache.records(), &snapshot)?
        );
        return Ok(loaded);
    }
    if !loaded {
        return report(cli, cache, OperationKind::Load);
    }
    print!("{}", render_records(collection, &cache.records()));
    Ok(true)
}

/// Mutations work against a fresh replica. A failed load is reported and
/// stops the command before anything is written.
async fn load_first(cli: &Cli, cache: &Cache, collection: &str) -> anyhow::Result<bool> {
    if cache.load(collection).await {
        return Ok(true);
    }
    report(cli, cache, OperationKind::Load)
}

/// Print the last settled outcome for `op` and return whether it succeeded.
fn report(cli: &Cli, cache: &Cache, op: OperationKind) -> anyhow::Result<bool> {
    let snapshot = cache.status().snapshot();
    let outcome = snapshot
        .outcome
        .clone()
        .unwrap_or_else(|| Outcome::failure(modeldata::error::UNKNOWN_ERROR));
    let succeeded = outcome.is_success();

    if cli.json {
        println!("{}", render_status_json(&snapshot)?);
    } else if succeeded {
        println!("{}", render_outcome(op, &outcome));
    } else {
        eprintln!("{}", render_outcome(op, &outcome));
    }
    Ok(succeeded)
}

fn record_arg(input: &str) -> anyhow::Result<modeldata::Record> {
    parse_record(input).map_err(|e| match e {
        ModelDataError::Malformed(detail) => anyhow::anyhow!("Invalid record: {}", detail),
        other => anyhow::anyhow!("Invalid record: {}", other),
    })
}

fn handle_config(config: &ModelDataConfig, template: bool) -> anyhow::Result<bool> {
    if template {
        print!("{}", ModelDataConfig::template());
        return Ok(true);
    }

    let effective = ModelDataConfig {
        data_dir: Some(config.data_dir()?),
        write_policy: Some(config.write_policy()),
        ..config.clone()
    };
    println!("{}", serde_json::to_string_pretty(&effective)?);
    if let Some(path) = ModelDataConfig::default_file() {
        println!("config file: {}", path.display());
    }
    Ok(true)
}
