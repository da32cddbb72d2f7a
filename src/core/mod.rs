// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/ghostwatch-rs

//! Core engine - wires the generator, analyzer, alarm and history
//! together and drives the poll loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{info, warn};

use crate::alarm::AlarmSystem;
use crate::analysis::Analyzer;
use crate::config::Config;
use crate::history::HistoryStore;
use crate::sensors::SignalGenerator;

/// Owns the four components and runs the monitoring loop.
///
/// The generator gets its own task; the poll loop runs on the same
/// cadence and pushes each snapshot through analyze → record → alarm.
/// Components never hold references into each other; every hop passes
/// owned copies.
pub struct Engine {
    pub config: Arc<Config>,
    pub generator: Arc<SignalGenerator>,
    pub analyzer: Arc<Analyzer>,
    pub alarm: Arc<AlarmSystem>,
    pub history: Arc<HistoryStore>,
}

impl Engine {
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let cadence = Duration::from_millis(config.generator.update_interval_ms);

        let generator = Arc::new(match config.generator.seed {
            Some(seed) => SignalGenerator::with_seed(cadence, seed),
            None => SignalGenerator::new(cadence),
        });
        let analyzer = Arc::new(match config.analysis.seed {
            Some(seed) => Analyzer::with_seed(seed),
            None => Analyzer::new(),
        });
        let alarm = Arc::new(AlarmSystem::new(config.alarm.sound_enabled));
        let history = Arc::new(HistoryStore::open(config.history_path()));

        Ok(Self {
            config,
            generator,
            analyzer,
            alarm,
            history,
        })
    }

    /// Take one snapshot through the full pipeline.
    pub fn poll_once(&self) {
        let snapshot = self.generator.snapshot();
        let analysis = self.analyzer.analyze(&snapshot);
        self.history.record(snapshot, analysis.clone());
        if analysis.probability > self.config.alarm.trigger_threshold {
            self.alarm.trigger(&analysis);
        }
    }

    /// Run until the shutdown channel fires, then flush history.
    pub async fn run(&self, shutdown: broadcast::Sender<()>) -> Result<()> {
        info!("GhostWatch engine started");

        let generator = Arc::clone(&self.generator);
        let gen_shutdown = shutdown.subscribe();
        let generator_task = tokio::spawn(async move {
            generator.run(gen_shutdown).await;
        });

        let cadence = Duration::from_millis(self.config.generator.update_interval_ms);
        let autosave = Duration::from_secs(self.config.history.autosave_interval_secs.max(1));
        let mut poll_tick = interval(cadence);
        let mut save_tick = interval(autosave);
        let mut stop = shutdown.subscribe();

        loop {
            tokio::select! {
                _ = poll_tick.tick() => {
                    self.poll_once();
                }
                _ = save_tick.tick() => {
                    if let Err(e) = self.history.persist() {
                        warn!("history autosave failed: {}", e);
                    }
                }
                _ = stop.recv() => {
                    info!("engine shutting down");
                    break;
                }
            }
        }

        if let Err(e) = self.history.persist() {
            warn!("final history save failed: {}", e);
        }
        if tokio::time::timeout(Duration::from_secs(2), generator_task)
            .await
            .is_err()
        {
            warn!("generator task did not stop in time");
        }
        info!("GhostWatch engine stopped");
        Ok(())
    }

    pub fn uptime(&self) -> Duration {
        self.generator.uptime()
    }
}
