use anyhow::Context;
use cacheimg_engine::{
    CacheConfig, CacheEngine, ConfigOverrides, EntryState, FillOutcome, StoreKey,
};
use colored::Colorize;
use serde_json::json;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let engine = open_engine(&cli)?;
    match cli.command {
        Command::Fetch(args) => cmd_fetch(&engine, args, &cli.format).await,
        Command::Output(args) => cmd_output(&engine, args).await,
        Command::Drop(args) => cmd_drop(&engine, args, &cli.format),
        Command::List(_) => cmd_list(&engine, &cli.format),
    }
}

fn open_engine(cli: &Cli) -> anyhow::Result<CacheEngine> {
    let mut config = match &cli.config {
        Some(path) => CacheConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CacheConfig::default(),
    };
    if let Some(prefix) = &cli.prefix {
        config.storage_prefix = prefix.clone();
    }
    let engine = CacheEngine::open(config, cli.store.as_deref()).context("opening store")?;
    Ok(engine)
}

async fn cmd_fetch(
    engine: &CacheEngine,
    args: FetchArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let overrides = ConfigOverrides::new()
        .force_save(args.force)
        .encode_on_canvas(args.canvas);
    let outcome = engine.cache_url(&args.url, &overrides).await;

    match format {
        OutputFormat::Json => {
            let value = match &outcome {
                FillOutcome::Cached(payload) => {
                    json!({ "url": args.url, "cached": true, "bytes": payload.len() })
                }
                FillOutcome::Failed(reason) => {
                    json!({ "url": args.url, "cached": false, "error": reason.to_string() })
                }
            };
            println!("{value}");
        }
        OutputFormat::Text => match &outcome {
            FillOutcome::Cached(payload) => println!(
                "{} Cached {} ({} bytes)",
                "✓".green().bold(),
                args.url.bold(),
                payload.len()
            ),
            FillOutcome::Failed(reason) => {
                println!("{} {}: {}", "✗".red().bold(), args.url.bold(), reason.to_string().red())
            }
        },
    }

    match outcome {
        FillOutcome::Cached(_) => Ok(()),
        FillOutcome::Failed(reason) => anyhow::bail!("could not cache {}: {reason}", args.url),
    }
}

async fn cmd_output(engine: &CacheEngine, args: OutputArgs) -> anyhow::Result<()> {
    if let Some(payload) = engine.resolve_or_fallback(&args.url, None).await? {
        println!("{payload}");
    }
    Ok(())
}

fn cmd_drop(engine: &CacheEngine, args: DropArgs, format: &OutputFormat) -> anyhow::Result<()> {
    engine.purge_then(args.url.as_deref(), None, |report| match format {
        OutputFormat::Json => println!("{}", json!(report)),
        OutputFormat::Text => {
            let what = report.identifier.as_deref().unwrap_or("all entries");
            println!("{} Dropped {} ({} removed)", "✓".green(), what.bold(), report.removed);
        }
    })?;
    Ok(())
}

/// One row of `list` output.
struct Row {
    key: String,
    state: EntryState,
}

fn rows(engine: &CacheEngine) -> anyhow::Result<Vec<Row>> {
    let prefix = engine.config().storage_prefix.as_str();
    let mut rows = Vec::new();
    for key in engine.store().list_keys(prefix)? {
        let parsed = StoreKey::parse(&key, prefix)?;
        let state = engine.store().entry(&parsed)?;
        rows.push(Row { key, state });
    }
    Ok(rows)
}

fn cmd_list(engine: &CacheEngine, format: &OutputFormat) -> anyhow::Result<()> {
    let rows = rows(engine)?;
    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = rows
                .iter()
                .map(|r| {
                    json!({
                        "key": r.key,
                        "state": r.state.label(),
                        "bytes": r.state.payload().map(str::len),
                    })
                })
                .collect();
            println!("{}", json!(entries));
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No cached images.");
            }
            for row in &rows {
                let state = match &row.state {
                    EntryState::Cached(payload) => {
                        format!("cached, {} bytes", payload.len()).green()
                    }
                    EntryState::Pending => "pending".yellow(),
                    other => other.label().red(),
                };
                println!("  {} [{}]", row.key, state);
            }
        }
    }
    Ok(())
}
