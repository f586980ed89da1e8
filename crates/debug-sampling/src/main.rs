// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Debug sampling allow-list CLI
//!
//! Inspect and exercise an allow-list the same way a server would.
//!
//! # Usage
//!
//! ```bash
//! # Is a session allowed right now?
//! debug-sampling-ctl --source file:/etc/sampling.json check client-7
//!
//! # At a given UNIX time
//! debug-sampling-ctl --source file:/etc/sampling.json check client-7 --at 1767225600
//!
//! # Validate a payload file
//! debug-sampling-ctl validate /etc/sampling.json
//!
//! # Produce a payload
//! debug-sampling-ctl encode client-7=1767225600 client-8=1767229200
//!
//! # Follow reloads until Ctrl+C
//! debug-sampling-ctl --config sampling.toml watch
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use debug_sampling::{AllowListEntry, DebugSamplingRegistry, SamplingConfig, Settings};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

/// Debug sampling allow-list tool
#[derive(Parser, Debug)]
#[command(name = "debug-sampling-ctl")]
#[command(about = "Query and validate read stream debug sampling allow-lists")]
#[command(version)]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source descriptor (data:<payload> or file:<path>)
    #[arg(short, long, conflicts_with = "config")]
    source: Option<String>,

    /// File poll interval (milliseconds)
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check whether a session may sample debug info
    Check {
        /// Client session id
        csid: String,

        /// UNIX time in seconds (default: now)
        #[arg(long)]
        at: Option<u64>,
    },

    /// List sessions currently allowed
    List {
        /// UNIX time in seconds (default: now)
        #[arg(long)]
        at: Option<u64>,
    },

    /// Validate a payload file
    Validate {
        /// Payload file path
        path: PathBuf,
    },

    /// Print a payload for the given csid=deadline pairs
    Encode {
        /// Entries as csid=deadline
        #[arg(required = true)]
        entries: Vec<String>,
    },

    /// Print every installed configuration until Ctrl+C
    Watch,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args)?;

    // Initialize logging
    let filter =
        EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match args.command {
        Commands::Check { ref csid, at } => cmd_check(&settings, csid, at),
        Commands::List { at } => cmd_list(&settings, at),
        Commands::Validate { ref path } => cmd_validate(path),
        Commands::Encode { ref entries } => cmd_encode(entries),
        Commands::Watch => cmd_watch(&settings),
    }
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match args.config {
        Some(ref path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    if let Some(ref source) = args.source {
        settings.source = source.clone();
    }
    if let Some(ms) = args.poll_interval_ms {
        settings.poll_interval_ms = ms;
    }
    if let Some(ref level) = args.log_level {
        settings.log_level = level.clone();
    }

    settings.validate()?;
    Ok(settings)
}

fn query_time(at: Option<u64>) -> SystemTime {
    at.map_or_else(SystemTime::now, |secs| UNIX_EPOCH + Duration::from_secs(secs))
}

fn cmd_check(settings: &Settings, csid: &str, at: Option<u64>) -> Result<()> {
    let registry = DebugSamplingRegistry::from_settings(settings);
    let allowed = registry.is_allowed_at(csid, query_time(at));

    println!("{}: {}", csid, if allowed { "ALLOWED" } else { "DENIED" });
    if !allowed {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_list(settings: &Settings, at: Option<u64>) -> Result<()> {
    let registry = DebugSamplingRegistry::from_settings(settings);
    let snapshot = registry.snapshot();

    println!(
        "Source: {} (config v{})",
        registry.source_kind(),
        snapshot.version()
    );
    for csid in registry.allowed_csids_at(query_time(at)) {
        let deadline = snapshot.deadline(&csid).unwrap_or_default();
        println!("  {}  until {}", csid, deadline);
    }
    Ok(())
}

fn cmd_validate(path: &Path) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    match debug_sampling::decode(&bytes) {
        Ok(config) => {
            println!("Configuration valid!");
            println!();
            println!("Entries: {}", config.len());
            for (i, entry) in config.entries().enumerate() {
                println!("  [{}] {} until {}", i, entry.csid, entry.deadline);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_encode(entries: &[String]) -> Result<()> {
    let mut config = SamplingConfig::default();
    for raw in entries {
        config.push(parse_entry(raw)?);
    }
    println!(
        "{}",
        debug_sampling::encode(&config).context("Failed to encode payload")?
    );
    Ok(())
}

fn parse_entry(raw: &str) -> Result<AllowListEntry> {
    let Some((csid, deadline)) = raw.split_once('=') else {
        bail!("Invalid entry '{}' (expected csid=deadline)", raw);
    };
    if csid.is_empty() {
        bail!("Invalid entry '{}': empty csid", raw);
    }
    let deadline: i64 = deadline
        .trim()
        .parse()
        .with_context(|| format!("Invalid deadline in '{}'", raw))?;
    Ok(AllowListEntry::new(csid, deadline))
}

fn cmd_watch(settings: &Settings) -> Result<()> {
    let registry = DebugSamplingRegistry::builder(settings.source.clone())
        .poll_interval(settings.poll_interval())
        .on_update(|config| {
            println!("--- {} entries", config.len());
            for entry in config.entries() {
                println!("  {} until {}", entry.csid, entry.deadline);
            }
        })
        .build();

    if !registry.is_watching() {
        println!("Source is not polled ({}); nothing to watch.", registry.source_kind());
        return Ok(());
    }

    let (stop_tx, stop_rx) = crossbeam::channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, shutting down...");
        let _ = stop_tx.try_send(());
    })
    .context("Failed to install Ctrl+C handler")?;

    println!("Watching {} (Ctrl+C to stop)", settings.source);
    let _ = stop_rx.recv();
    registry.stop();

    let stats = registry.stats();
    println!();
    println!("Installs:        {}", stats.installs);
    println!(
        "Failures:        {} ({} decode, {} read)",
        stats.failures(),
        stats.decode_failures,
        stats.read_failures
    );
    Ok(())
}
