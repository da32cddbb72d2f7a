// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/ghostwatch-rs

//! History store - bounded reading/event logs with JSON persistence
//!
//! Two FIFO rings: raw readings paired with their analysis (capacity
//! 1000) and discrete significant events (capacity 500). Both rings are
//! loaded from and flushed to a single JSON document; a missing or
//! corrupt file starts the store empty with a warning, never an error.

use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Timelike, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::AnalysisResult;
use crate::sensors::{round1, SensorChannel, SensorSnapshot};

/// Reading log ring capacity.
const LOG_CAPACITY: usize = 1000;

/// Event ring capacity.
const EVENT_CAPACITY: usize = 500;

/// Probability above which a reading also produces a discrete event.
const SIGNIFICANT_THRESHOLD: f64 = 60.0;

/// Rows included in a delimited export.
const EXPORT_LIMIT: usize = 500;

/// Typed failure surfaced by the reporting API.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("no data available for this period")]
    NoData,
}

/// One reading plus its analysis, appended every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub sensors: SensorSnapshot,
    pub analysis: AnalysisResult,
}

/// Discrete event with an arbitrary payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: String,
    pub payload: serde_json::Value,
}

/// Summary statistics over a trailing window of log entries.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityReport {
    pub period: String,
    pub total_readings: usize,
    pub avg_activity: f64,
    pub max_probability: f64,
    pub min_probability: f64,
    /// Entries with probability above 50.
    pub total_detections: usize,
    pub entity_breakdown: HashMap<String, usize>,
    pub most_active_hour: MostActiveHour,
    pub generated: DateTime<Utc>,
}

/// Hour of day (0-23) holding the most readings in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MostActiveHour {
    pub hour: u32,
    pub readings: usize,
}

#[derive(Serialize, Deserialize)]
struct PersistedState {
    logs: Vec<LogEntry>,
    events: Vec<EventEntry>,
    last_save: DateTime<Utc>,
}

struct HistoryState {
    logs: VecDeque<LogEntry>,
    events: VecDeque<EventEntry>,
}

/// Append-only bounded history with whole-file persistence.
pub struct HistoryStore {
    state: Mutex<HistoryState>,
    path: PathBuf,
}

impl HistoryStore {
    /// Open a store backed by `path`, loading any prior snapshot.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self {
            state: Mutex::new(HistoryState {
                logs: VecDeque::with_capacity(LOG_CAPACITY),
                events: VecDeque::with_capacity(EVENT_CAPACITY),
            }),
            path: path.into(),
        };
        store.load();
        store
    }

    /// Reload both rings from the backing file. Absent or unreadable
    /// state starts the store empty.
    pub fn load(&self) {
        if !self.path.exists() {
            return;
        }
        let parsed = std::fs::read_to_string(&self.path)
            .map_err(anyhow::Error::from)
            .and_then(|text| serde_json::from_str::<PersistedState>(&text).map_err(Into::into));
        match parsed {
            Ok(persisted) => {
                let mut state = self.state.lock();
                state.logs = persisted.logs.into_iter().collect();
                state.events = persisted.events.into_iter().collect();
                Self::trim(&mut state);
                info!(logs = state.logs.len(), events = state.events.len(),
                    "loaded history from {:?}", self.path);
            }
            Err(e) => {
                warn!("could not load history from {:?}: {}", self.path, e);
            }
        }
    }

    /// Flush both rings wholesale to the backing file, overwriting.
    pub fn persist(&self) -> Result<()> {
        let persisted = {
            let state = self.state.lock();
            PersistedState {
                logs: state.logs.iter().cloned().collect(),
                events: state.events.iter().cloned().collect(),
                last_save: Utc::now(),
            }
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&self.path)
            .with_context(|| format!("creating history file {:?}", self.path))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &persisted)?;
        info!(logs = persisted.logs.len(), "saved history to {:?}", self.path);
        Ok(())
    }

    /// Append a reading; significant detections also produce an event.
    pub fn record(&self, sensors: SensorSnapshot, analysis: AnalysisResult) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            sensors,
            analysis,
        };
        self.push_entry(entry);
    }

    fn push_entry(&self, entry: LogEntry) {
        let mut state = self.state.lock();
        if entry.analysis.probability > SIGNIFICANT_THRESHOLD {
            state.events.push_back(EventEntry {
                timestamp: entry.timestamp,
                kind: "significant_detection".to_string(),
                payload: json!({
                    "probability": entry.analysis.probability,
                    "entity_type": entry.analysis.entity_type,
                    "evidence": entry.analysis.evidence,
                }),
            });
        }
        state.logs.push_back(entry);
        Self::trim(&mut state);
    }

    fn trim(state: &mut HistoryState) {
        while state.logs.len() > LOG_CAPACITY {
            state.logs.pop_front();
        }
        while state.events.len() > EVENT_CAPACITY {
            state.events.pop_front();
        }
    }

    /// Last `n` log entries in original (oldest-first) order.
    pub fn recent_logs(&self, n: usize) -> Vec<LogEntry> {
        let state = self.state.lock();
        let skip = state.logs.len().saturating_sub(n);
        state.logs.iter().skip(skip).cloned().collect()
    }

    /// Entries whose timestamp falls on `date` (`YYYY-MM-DD`).
    pub fn logs_by_date(&self, date: &str) -> Vec<LogEntry> {
        let state = self.state.lock();
        state
            .logs
            .iter()
            .filter(|log| log.timestamp.format("%Y-%m-%d").to_string() == date)
            .cloned()
            .collect()
    }

    /// Up to `limit` most recent events, optionally filtered by kind.
    pub fn events_by_type(&self, kind: Option<&str>, limit: usize) -> Vec<EventEntry> {
        let state = self.state.lock();
        let skip = state.events.len().saturating_sub(limit);
        state
            .events
            .iter()
            .skip(skip)
            .filter(|e| kind.map_or(true, |k| e.kind == k))
            .cloned()
            .collect()
    }

    /// Summary statistics over the trailing `hours` window.
    pub fn report(&self, hours: i64) -> std::result::Result<ActivityReport, HistoryError> {
        let state = self.state.lock();
        let cutoff = Utc::now() - Duration::hours(hours);
        let window: Vec<&LogEntry> = state
            .logs
            .iter()
            .filter(|log| log.timestamp > cutoff)
            .collect();

        if window.is_empty() {
            return Err(HistoryError::NoData);
        }

        let probabilities: Vec<f64> = window.iter().map(|l| l.analysis.probability).collect();
        let avg = probabilities.iter().sum::<f64>() / probabilities.len() as f64;
        let max = probabilities.iter().cloned().fold(f64::MIN, f64::max);
        let min = probabilities.iter().cloned().fold(f64::MAX, f64::min);

        let detections: Vec<&&LogEntry> = window
            .iter()
            .filter(|l| l.analysis.probability > 50.0)
            .collect();

        let mut entity_breakdown: HashMap<String, usize> = HashMap::new();
        for log in &detections {
            if let Some(entity) = &log.analysis.entity_type {
                *entity_breakdown.entry(entity.clone()).or_insert(0) += 1;
            }
        }

        Ok(ActivityReport {
            period: format!("Last {} hours", hours),
            total_readings: window.len(),
            avg_activity: round1(avg),
            max_probability: max,
            min_probability: min,
            total_detections: detections.len(),
            entity_breakdown,
            most_active_hour: Self::most_active_hour(&window),
            generated: Utc::now(),
        })
    }

    /// First-max scan over hour buckets, so ties resolve to the lowest
    /// hour number.
    fn most_active_hour(window: &[&LogEntry]) -> MostActiveHour {
        let mut counts = [0usize; 24];
        for log in window {
            counts[log.timestamp.hour() as usize] += 1;
        }
        let mut best = MostActiveHour { hour: 0, readings: counts[0] };
        for (hour, &readings) in counts.iter().enumerate().skip(1) {
            if readings > best.readings {
                best = MostActiveHour { hour: hour as u32, readings };
            }
        }
        best
    }

    /// Drop log entries older than `days`; returns the removed count.
    pub fn purge_older_than(&self, days: i64) -> usize {
        let mut state = self.state.lock();
        let cutoff = Utc::now() - Duration::days(days);
        let before = state.logs.len();
        state.logs.retain(|log| log.timestamp > cutoff);
        let removed = before - state.logs.len();
        if removed > 0 {
            info!(removed, "purged old log entries");
        }
        removed
    }

    /// Write the most recent 500 log entries as delimited rows with a
    /// fixed column set.
    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        let rows = self.recent_logs(EXPORT_LIMIT);
        let file = File::create(path)
            .with_context(|| format!("creating export file {:?}", path))?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "timestamp,emf,temperature,humidity,pressure,spectral,motion,probability,entity_type,activity_level"
        )?;
        for log in &rows {
            let sensors = &log.sensors;
            writeln!(
                writer,
                "{},{},{},{},{},{},{},{},{},{}",
                log.timestamp.to_rfc3339(),
                sensors.get(SensorChannel::Emf),
                sensors.get(SensorChannel::Temperature),
                sensors.get(SensorChannel::Humidity),
                sensors.get(SensorChannel::Pressure),
                sensors.get(SensorChannel::Spectral),
                sensors.get(SensorChannel::Motion),
                log.analysis.probability,
                log.analysis.entity_type.as_deref().unwrap_or(""),
                log.analysis.activity_level.as_str(),
            )?;
        }
        writer.flush()?;
        info!(rows = rows.len(), "exported history to {:?}", path);
        Ok(rows.len())
    }

    /// Current ring sizes (logs, events).
    pub fn counts(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.logs.len(), state.events.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisResult;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ghostwatch-{}-{}.json", tag, uuid::Uuid::new_v4()))
    }

    fn empty_store(tag: &str) -> HistoryStore {
        HistoryStore::open(temp_path(tag))
    }

    fn entry_with(probability: f64, timestamp: DateTime<Utc>) -> LogEntry {
        let mut analysis = AnalysisResult::quiet(probability);
        if probability > 40.0 {
            analysis.entity_type = Some("Specter".to_string());
        }
        LogEntry {
            timestamp,
            sensors: SensorSnapshot::default(),
            analysis,
        }
    }

    #[test]
    fn record_appends_and_flags_significant() {
        let store = empty_store("record");
        store.record(SensorSnapshot::default(), AnalysisResult::quiet(30.0));
        store.record(SensorSnapshot::default(), AnalysisResult::quiet(75.0));

        let (logs, events) = store.counts();
        assert_eq!(logs, 2);
        assert_eq!(events, 1);

        let events = store.events_by_type(Some("significant_detection"), 10);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload["probability"], 75.0);
    }

    #[test]
    fn boundary_sixty_is_not_significant() {
        let store = empty_store("boundary");
        store.record(SensorSnapshot::default(), AnalysisResult::quiet(60.0));
        assert_eq!(store.counts(), (1, 0));
    }

    #[test]
    fn rings_are_bounded_fifo() {
        let store = empty_store("rings");
        let now = Utc::now();
        for i in 0..(LOG_CAPACITY + 5) {
            let mut entry = entry_with(70.0, now);
            entry.analysis.evidence = vec![format!("seq {}", i)];
            store.push_entry(entry);
        }
        let (logs, events) = store.counts();
        assert_eq!(logs, LOG_CAPACITY);
        assert_eq!(events, EVENT_CAPACITY);

        // Oldest entries evicted first: the survivors are the most recent.
        let logs = store.recent_logs(LOG_CAPACITY);
        assert_eq!(logs[0].analysis.evidence, vec!["seq 5".to_string()]);
        assert_eq!(
            logs.last().unwrap().analysis.evidence,
            vec![format!("seq {}", LOG_CAPACITY + 4)]
        );
    }

    #[test]
    fn recent_logs_keeps_original_order() {
        let store = empty_store("recent");
        let now = Utc::now();
        for i in 0..10 {
            store.push_entry(entry_with(i as f64, now));
        }
        let recent = store.recent_logs(3);
        let probs: Vec<f64> = recent.iter().map(|l| l.analysis.probability).collect();
        assert_eq!(probs, vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn logs_by_date_filters_on_day() {
        let store = empty_store("bydate");
        let today = Utc::now();
        let last_week = today - Duration::days(7);
        store.push_entry(entry_with(10.0, last_week));
        store.push_entry(entry_with(20.0, today));

        let date = today.format("%Y-%m-%d").to_string();
        let logs = store.logs_by_date(&date);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].analysis.probability, 20.0);
        assert!(store.logs_by_date("1999-01-01").is_empty());
    }

    #[test]
    fn report_on_empty_window_is_no_data() {
        let store = empty_store("nodata");
        assert!(matches!(store.report(24), Err(HistoryError::NoData)));

        // Data exists but falls outside the window.
        store.push_entry(entry_with(80.0, Utc::now() - Duration::hours(48)));
        assert!(matches!(store.report(24), Err(HistoryError::NoData)));
    }

    #[test]
    fn report_computes_window_statistics() {
        let store = empty_store("report");
        let now = Utc::now();
        store.push_entry(entry_with(20.0, now - Duration::minutes(30)));
        store.push_entry(entry_with(55.0, now - Duration::minutes(20)));
        store.push_entry(entry_with(90.0, now - Duration::minutes(10)));
        store.push_entry(entry_with(99.0, now - Duration::hours(48))); // outside

        let report = store.report(24).unwrap();
        assert_eq!(report.total_readings, 3);
        assert_eq!(report.min_probability, 20.0);
        assert_eq!(report.max_probability, 90.0);
        assert_eq!(report.avg_activity, 55.0);
        assert_eq!(report.total_detections, 2);
        assert_eq!(report.entity_breakdown.get("Specter"), Some(&2));
    }

    #[test]
    fn most_active_hour_prefers_lowest_on_tie() {
        let a = entry_with(10.0, Utc::now());
        let window: Vec<&LogEntry> = vec![&a];
        let hour = a.timestamp.hour();
        assert_eq!(
            HistoryStore::most_active_hour(&window),
            MostActiveHour { hour, readings: 1 }
        );

        // All-zero buckets resolve to hour 0 via the first-max scan.
        let empty: Vec<&LogEntry> = vec![];
        assert_eq!(
            HistoryStore::most_active_hour(&empty),
            MostActiveHour { hour: 0, readings: 0 }
        );
    }

    #[test]
    fn purge_drops_old_entries_only() {
        let store = empty_store("purge");
        let now = Utc::now();
        store.push_entry(entry_with(10.0, now - Duration::days(10)));
        store.push_entry(entry_with(20.0, now - Duration::days(8)));
        store.push_entry(entry_with(30.0, now));

        assert_eq!(store.purge_older_than(7), 2);
        assert_eq!(store.counts().0, 1);
        assert_eq!(store.purge_older_than(7), 0);
    }

    #[test]
    fn persist_then_load_round_trips() {
        let path = temp_path("roundtrip");
        let store = HistoryStore::open(&path);
        for i in 0..25 {
            store.push_entry(entry_with(40.0 + i as f64, Utc::now()));
        }
        let before_logs = store.recent_logs(LOG_CAPACITY);
        let before_events = store.events_by_type(None, EVENT_CAPACITY);
        store.persist().unwrap();

        let reloaded = HistoryStore::open(&path);
        assert_eq!(reloaded.recent_logs(LOG_CAPACITY), before_logs);
        assert_eq!(reloaded.events_by_type(None, EVENT_CAPACITY), before_events);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn corrupt_state_file_starts_empty() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{ not valid json !").unwrap();
        let store = HistoryStore::open(&path);
        assert_eq!(store.counts(), (0, 0));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn export_writes_header_and_recent_rows() {
        let store = empty_store("export");
        let now = Utc::now();
        for i in 0..3 {
            store.push_entry(entry_with(45.0 + i as f64, now));
        }
        let path = temp_path("export-out");
        let rows = store.export_csv(&path).unwrap();
        assert_eq!(rows, 3);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("timestamp,emf,temperature"));
        assert!(lines[1].contains("Specter"));

        let _ = std::fs::remove_file(&path);
    }
}
