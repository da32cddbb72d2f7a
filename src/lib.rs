// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/ghostwatch-rs

//! GhostWatch - Simulated Paranormal Monitoring Engine
//!
//! A simulation-driven monitoring demo built around four components:
//! - A correlated synthetic signal generator with circadian modulation
//! - A heuristic scoring engine producing probability, classification,
//!   evidence and confidence
//! - A tiered alarm state machine with escalation-only alerts
//! - A bounded append-only history store with reports and CSV export
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                 GhostWatch Engine                  │
//! ├────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────┐   ┌──────────────┐   │
//! │  │ Signal    │ → │ Analyzer │ → │ Alarm System │   │
//! │  │ Generator │   │          │   └──────────────┘   │
//! │  └───────────┘   └──────────┘   ┌──────────────┐   │
//! │                        └──────→ │ History      │   │
//! │                                 │ Store        │   │
//! │                                 └──────────────┘   │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! The generator runs on its own periodic task; everything downstream
//! is invoked synchronously with owned copies of the data.

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod alarm;
pub mod analysis;
pub mod config;
pub mod core;
pub mod history;
pub mod sensors;

// Re-exports for convenience
pub use alarm::{AlarmLevel, AlarmSystem, Alert};
pub use analysis::{ActivityLevel, AnalysisResult, Analyzer};
pub use config::Config;
pub use core::Engine;
pub use history::{HistoryError, HistoryStore, LogEntry};
pub use sensors::{SensorChannel, SensorSnapshot, SignalGenerator};

/// GhostWatch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GhostWatch name
pub const NAME: &str = "GhostWatch";
