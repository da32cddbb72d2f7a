// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/ghostwatch-rs

//! Alarm state machine
//!
//! Maps analysis probability onto a totally ordered alarm level with
//! strict thresholds (>90 emergency, >80 critical, >60 warning). The
//! level is a pure function of the latest probability, so a lower score
//! silently downgrades the state. Transitions are journaled; alerts and
//! the audible pattern only fire when the level strictly increases.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::{ActivityLevel, AnalysisResult};

/// Active alert ring capacity.
const ALERT_CAPACITY: usize = 20;

/// Transition journal capacity.
const TRANSITION_CAPACITY: usize = 100;

/// Alarm levels, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlarmLevel {
    None,
    Warning,
    Critical,
    Emergency,
}

impl AlarmLevel {
    /// Level for a probability value. Strict comparisons throughout:
    /// exactly 90.0 stays critical-or-below territory.
    pub fn from_probability(probability: f64) -> Self {
        if probability > 90.0 {
            AlarmLevel::Emergency
        } else if probability > 80.0 {
            AlarmLevel::Critical
        } else if probability > 60.0 {
            AlarmLevel::Warning
        } else {
            AlarmLevel::None
        }
    }

    /// Explicit severity rank backing the `Ord` derive.
    pub fn rank(&self) -> u8 {
        match self {
            AlarmLevel::None => 0,
            AlarmLevel::Warning => 1,
            AlarmLevel::Critical => 2,
            AlarmLevel::Emergency => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmLevel::None => "NONE",
            AlarmLevel::Warning => "WARNING",
            AlarmLevel::Critical => "CRITICAL",
            AlarmLevel::Emergency => "EMERGENCY",
        }
    }
}

/// Alert severity tag carried on each alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Info,
    Warning,
    Critical,
    Emergency,
}

/// A single raised alert; acknowledge flips the flag in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub kind: AlertKind,
    pub acknowledged: bool,
}

/// Journal entry written whenever the alarm level actually changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub timestamp: DateTime<Utc>,
    pub previous: AlarmLevel,
    pub current: AlarmLevel,
    pub probability: f64,
    pub entity_type: Option<String>,
}

/// Status summary for the status API.
#[derive(Debug, Clone, Serialize)]
pub struct AlarmStatus {
    pub current_level: &'static str,
    pub active_alerts: usize,
    pub unacknowledged: usize,
    pub recent_transitions: Vec<StateTransition>,
}

struct AlarmState {
    level: AlarmLevel,
    alerts: VecDeque<Alert>,
    transitions: VecDeque<StateTransition>,
}

/// The alert state machine.
pub struct AlarmSystem {
    state: Mutex<AlarmState>,
    sound_enabled: bool,
}

impl AlarmSystem {
    pub fn new(sound_enabled: bool) -> Self {
        Self {
            state: Mutex::new(AlarmState {
                level: AlarmLevel::None,
                alerts: VecDeque::with_capacity(ALERT_CAPACITY),
                transitions: VecDeque::with_capacity(TRANSITION_CAPACITY),
            }),
            sound_enabled,
        }
    }

    /// Apply one analysis result to the state machine.
    pub fn trigger(&self, result: &AnalysisResult) {
        let mut state = self.state.lock();

        let previous = state.level;
        let current = AlarmLevel::from_probability(result.probability);
        state.level = current;

        if previous != current {
            info!(
                from = previous.as_str(),
                to = current.as_str(),
                probability = result.probability,
                "alarm level changed"
            );
            Self::push_bounded(
                &mut state.transitions,
                StateTransition {
                    timestamp: Utc::now(),
                    previous,
                    current,
                    probability: result.probability,
                    entity_type: result.entity_type.clone(),
                },
                TRANSITION_CAPACITY,
            );
        }

        // Alerts and sound only on escalation; downgrades are silent.
        if current > previous {
            let (message, kind) = match current {
                AlarmLevel::Emergency => (
                    "EMERGENCY: Extreme paranormal activity detected!",
                    AlertKind::Emergency,
                ),
                AlarmLevel::Critical => (
                    "CRITICAL: Entity confirmed - immediate attention required",
                    AlertKind::Critical,
                ),
                AlarmLevel::Warning => (
                    "WARNING: Significant paranormal activity detected",
                    AlertKind::Warning,
                ),
                AlarmLevel::None => unreachable!("escalation to None"),
            };
            Self::push_bounded(&mut state.alerts, Self::alert(message, kind), ALERT_CAPACITY);
            drop(state);
            if self.sound_enabled {
                Self::emit_sound_pattern(current);
            }
        }
    }

    fn alert(message: &str, kind: AlertKind) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            message: message.to_string(),
            kind,
            acknowledged: false,
        }
    }

    fn push_bounded<T>(ring: &mut VecDeque<T>, item: T, capacity: usize) {
        ring.push_back(item);
        while ring.len() > capacity {
            ring.pop_front();
        }
    }

    /// Fire-and-forget audible pattern. Runs detached so trigger never
    /// blocks; skipped with a debug log when no runtime is available,
    /// and any failure stays inside the task.
    fn emit_sound_pattern(level: AlarmLevel) {
        let tones: Vec<(u32, u64)> = match level {
            AlarmLevel::Warning => vec![(800, 200); 3],
            AlarmLevel::Critical => vec![(1000, 300); 5],
            AlarmLevel::Emergency => (0..8).flat_map(|_| [(1200, 200), (800, 200)]).collect(),
            AlarmLevel::None => return,
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    for (pitch_hz, duration_ms) in tones {
                        debug!(pitch_hz, duration_ms, "alert tone");
                        tokio::time::sleep(Duration::from_millis(duration_ms + 100)).await;
                    }
                });
            }
            Err(_) => debug!("no runtime for audible alert, skipping"),
        }
    }

    /// Mark one alert acknowledged by ring index. Out-of-range indexes
    /// report failure instead of panicking.
    pub fn acknowledge(&self, index: usize) -> bool {
        let mut state = self.state.lock();
        match state.alerts.get_mut(index) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => {
                warn!(index, "acknowledge index out of range");
                false
            }
        }
    }

    /// Reset to NONE, wipe the alert ring and leave a single info alert.
    pub fn clear(&self) -> &'static str {
        let mut state = self.state.lock();
        state.level = AlarmLevel::None;
        state.alerts.clear();
        Self::push_bounded(
            &mut state.alerts,
            Self::alert("All alarms cleared", AlertKind::Info),
            ALERT_CAPACITY,
        );
        info!("alarms cleared");
        "Alarms cleared"
    }

    /// Current level, alert counts and the five most recent transitions.
    pub fn status(&self) -> AlarmStatus {
        let state = self.state.lock();
        let unacknowledged = state.alerts.iter().filter(|a| !a.acknowledged).count();
        let skip = state.transitions.len().saturating_sub(5);
        AlarmStatus {
            current_level: state.level.as_str(),
            active_alerts: state.alerts.len(),
            unacknowledged,
            recent_transitions: state.transitions.iter().skip(skip).cloned().collect(),
        }
    }

    /// Active alerts, optionally including acknowledged ones.
    pub fn alerts(&self, include_acknowledged: bool) -> Vec<Alert> {
        let state = self.state.lock();
        state
            .alerts
            .iter()
            .filter(|a| include_acknowledged || !a.acknowledged)
            .cloned()
            .collect()
    }

    pub fn level(&self) -> AlarmLevel {
        self.state.lock().level
    }

    /// Feed a synthetic emergency through the state machine.
    pub fn simulate_emergency(&self) -> &'static str {
        let result = AnalysisResult {
            timestamp: Utc::now(),
            probability: 95.0,
            activity_level: ActivityLevel::Critical,
            entity_type: Some("Poltergeist".to_string()),
            evidence: vec![
                "EMF Spike: 85 mG".to_string(),
                "Cold Spot: 45°F".to_string(),
                "Spectral Anomaly: 750 MHz".to_string(),
            ],
            confidence: 90.0,
            recommendations: Vec::new(),
        };
        self.trigger(&result);
        "Emergency simulation activated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(probability: f64) -> AnalysisResult {
        let mut result = AnalysisResult::quiet(probability);
        result.entity_type = Some("Specter".to_string());
        result
    }

    fn quiet_system() -> AlarmSystem {
        AlarmSystem::new(false)
    }

    #[test]
    fn level_thresholds_are_strict() {
        assert_eq!(AlarmLevel::from_probability(60.0), AlarmLevel::None);
        assert_eq!(AlarmLevel::from_probability(60.1), AlarmLevel::Warning);
        assert_eq!(AlarmLevel::from_probability(80.0), AlarmLevel::Warning);
        assert_eq!(AlarmLevel::from_probability(80.1), AlarmLevel::Critical);
        assert_eq!(AlarmLevel::from_probability(90.0), AlarmLevel::Critical);
        assert_eq!(AlarmLevel::from_probability(90.1), AlarmLevel::Emergency);
    }

    #[test]
    fn level_order_matches_rank() {
        assert!(AlarmLevel::None < AlarmLevel::Warning);
        assert!(AlarmLevel::Warning < AlarmLevel::Critical);
        assert!(AlarmLevel::Critical < AlarmLevel::Emergency);
        for level in [
            AlarmLevel::None,
            AlarmLevel::Warning,
            AlarmLevel::Critical,
            AlarmLevel::Emergency,
        ] {
            assert_eq!(level as u8, level.rank());
        }
    }

    #[test]
    fn escalation_creates_alert_and_transition() {
        let alarm = quiet_system();
        alarm.trigger(&result_with(65.0));
        assert_eq!(alarm.level(), AlarmLevel::Warning);

        let status = alarm.status();
        assert_eq!(status.active_alerts, 1);
        assert_eq!(status.unacknowledged, 1);
        assert_eq!(status.recent_transitions.len(), 1);
        assert_eq!(status.recent_transitions[0].previous, AlarmLevel::None);
        assert_eq!(status.recent_transitions[0].current, AlarmLevel::Warning);
    }

    #[test]
    fn downgrade_records_history_but_no_alert() {
        let alarm = quiet_system();
        alarm.trigger(&result_with(95.0));
        assert_eq!(alarm.level(), AlarmLevel::Emergency);
        let alerts_before = alarm.status().active_alerts;

        alarm.trigger(&result_with(65.0));
        assert_eq!(alarm.level(), AlarmLevel::Warning);

        let status = alarm.status();
        assert_eq!(status.active_alerts, alerts_before);
        assert_eq!(status.recent_transitions.len(), 2);
        assert_eq!(status.recent_transitions[1].current, AlarmLevel::Warning);
    }

    #[test]
    fn repeated_level_is_not_journaled() {
        let alarm = quiet_system();
        alarm.trigger(&result_with(65.0));
        alarm.trigger(&result_with(70.0));
        alarm.trigger(&result_with(62.0));
        let status = alarm.status();
        assert_eq!(status.recent_transitions.len(), 1);
        assert_eq!(status.active_alerts, 1);
    }

    #[test]
    fn acknowledge_flips_flag_and_rejects_bad_index() {
        let alarm = quiet_system();
        alarm.trigger(&result_with(65.0));
        assert!(alarm.acknowledge(0));
        assert!(!alarm.acknowledge(5));

        let status = alarm.status();
        assert_eq!(status.active_alerts, 1);
        assert_eq!(status.unacknowledged, 0);
        assert!(alarm.alerts(false).is_empty());
        assert_eq!(alarm.alerts(true).len(), 1);
    }

    #[test]
    fn clear_resets_state_and_leaves_info_alert() {
        let alarm = quiet_system();
        alarm.trigger(&result_with(95.0));
        assert_eq!(alarm.clear(), "Alarms cleared");
        assert_eq!(alarm.level(), AlarmLevel::None);

        let alerts = alarm.alerts(true);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Info);
    }

    #[test]
    fn alert_ring_evicts_oldest() {
        let alarm = quiet_system();
        // Bounce through escalations so every cycle raises one alert.
        for i in 0..(ALERT_CAPACITY + 5) {
            alarm.trigger(&result_with(30.0));
            let mut result = result_with(65.0);
            result.evidence = vec![format!("cycle {}", i)];
            alarm.trigger(&result);
        }
        let alerts = alarm.alerts(true);
        assert_eq!(alerts.len(), ALERT_CAPACITY);
    }

    #[test]
    fn transition_ring_evicts_oldest() {
        let alarm = quiet_system();
        for i in 0..(TRANSITION_CAPACITY + 6) {
            // Alternate None <-> Warning so every trigger transitions.
            let p = if i % 2 == 0 { 65.0 } else { 10.0 };
            alarm.trigger(&result_with(p));
        }
        assert_eq!(alarm.state.lock().transitions.len(), TRANSITION_CAPACITY);
    }

    #[test]
    fn simulate_emergency_escalates() {
        let alarm = quiet_system();
        assert_eq!(alarm.simulate_emergency(), "Emergency simulation activated");
        assert_eq!(alarm.level(), AlarmLevel::Emergency);
        let status = alarm.status();
        assert_eq!(status.current_level, "EMERGENCY");
        assert_eq!(status.active_alerts, 1);
    }
}
