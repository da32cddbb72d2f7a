// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/ghostwatch-rs

//! GhostWatch - Simulated Paranormal Monitoring Engine
//!
//! Headless monitoring loop: synthesize correlated sensor readings,
//! score them, raise tiered alarms and keep a bounded history on disk.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ghostwatch::{Config, Engine, VERSION};

/// GhostWatch - Simulated Paranormal Monitoring Engine
#[derive(Parser, Debug)]
#[command(name = "ghostwatch")]
#[command(author = "GhostWatch Project")]
#[command(version = VERSION)]
#[command(about = "Simulation-driven paranormal monitoring demo")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Data output directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Disable audible alerts
    #[arg(long)]
    silent: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("👻 GhostWatch v{} - Simulated Paranormal Monitoring Engine", VERSION);

    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(seed) = args.seed {
        config.generator.seed = Some(seed);
        config.analysis.seed = Some(seed.wrapping_add(1));
    }
    if args.silent {
        config.alarm.sound_enabled = false;
    }

    info!("Configuration loaded from {:?}", config_path);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config))
}

async fn run(config: Config) -> Result<()> {
    let engine = Engine::new(config)?;
    let (shutdown, _) = broadcast::channel(1);

    info!("🚀 GhostWatch running - press Ctrl+C to shutdown");

    let stop = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = stop.send(());
        }
    });

    engine.run(shutdown).await?;

    info!("GhostWatch shutdown complete");
    Ok(())
}
