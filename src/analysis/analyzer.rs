// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/ghostwatch-rs

//! Heuristic scoring engine
//!
//! Turns one sensor snapshot plus short-term history into a probability,
//! activity band, entity classification, evidence list, confidence value
//! and recommendations. Pure arithmetic with explicit clamping; nothing
//! in here can fail on well-formed numeric input.

use std::collections::VecDeque;

use chrono::{Local, Timelike};
use parking_lot::Mutex;
use rand::prelude::*;

use crate::sensors::{round1, SensorChannel, SensorSnapshot};

use super::{AnalysisResult, ENTITY_TYPES};

/// Analysis history ring capacity, used for trend and consistency terms.
const HISTORY_CAPACITY: usize = 50;

/// Rounded probabilities above this get entity/evidence/confidence/
/// recommendation enrichment.
const DETECTION_GATE: f64 = 40.0;

/// Channel weights for the base probability. Order matches
/// `SensorChannel::ALL`.
const WEIGHTS: [(SensorChannel, f64); 6] = [
    (SensorChannel::Emf, 0.30),
    (SensorChannel::Temperature, 0.25),
    (SensorChannel::Spectral, 0.25),
    (SensorChannel::Motion, 0.15),
    (SensorChannel::Humidity, 0.03),
    (SensorChannel::Pressure, 0.02),
];

/// Per-channel thresholds feeding the confidence term.
const CONFIDENCE_TRIGGERS: [(SensorChannel, f64); 4] = [
    (SensorChannel::Emf, 60.0),
    (SensorChannel::Temperature, 55.0),
    (SensorChannel::Spectral, 500.0),
    (SensorChannel::Motion, 60.0),
];

struct AnalyzerState {
    history: VecDeque<AnalysisResult>,
    rng: StdRng,
}

/// Scoring engine with a bounded in-memory history for trend analysis.
pub struct Analyzer {
    state: Mutex<AnalyzerState>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Seeded constructor for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            state: Mutex::new(AnalyzerState {
                history: VecDeque::with_capacity(HISTORY_CAPACITY),
                rng,
            }),
        }
    }

    /// Score a snapshot and append the result to the history ring.
    pub fn analyze(&self, snapshot: &SensorSnapshot) -> AnalysisResult {
        self.analyze_at(snapshot, Local::now().hour())
    }

    /// Scoring with the circadian hour injected, for deterministic tests.
    pub(crate) fn analyze_at(&self, snapshot: &SensorSnapshot, hour: u32) -> AnalysisResult {
        let mut state = self.state.lock();
        let st = &mut *state;

        let base = Self::base_probability(snapshot);
        let trend = Self::trend_modifier(&st.history);
        let raw = base + circadian_modifier(hour) + trend;
        let probability = round1(raw.clamp(0.0, 100.0));

        let mut result = AnalysisResult::quiet(probability);
        if probability > DETECTION_GATE {
            result.entity_type = Some(Self::identify_entity(&mut st.rng, snapshot).to_string());
            result.evidence = Self::gather_evidence(snapshot);
            result.confidence = Self::confidence(&mut st.rng, snapshot, &st.history);
            result.recommendations = recommendations_for(probability);
        }

        st.history.push_back(result.clone());
        while st.history.len() > HISTORY_CAPACITY {
            st.history.pop_front();
        }

        result
    }

    /// Weighted average of normalized channels, scaled to 0-100. The
    /// zero-weight case cannot occur with a full snapshot but is guarded
    /// rather than divided through.
    fn base_probability(snapshot: &SensorSnapshot) -> f64 {
        let mut score = 0.0;
        let mut total_weight = 0.0;
        for (channel, weight) in WEIGHTS {
            score += normalize(channel, snapshot.get(channel)) * weight;
            total_weight += weight;
        }
        if total_weight > 0.0 {
            (score / total_weight) * 100.0
        } else {
            0.0
        }
    }

    /// Trend bonus from the last 10 history entries: +15 for a rise of
    /// more than 20 points, +8 for more than 10, else 0.
    fn trend_modifier(history: &VecDeque<AnalysisResult>) -> f64 {
        if history.len() < 10 {
            return 0.0;
        }
        let recent: Vec<f64> = history
            .iter()
            .skip(history.len() - 10)
            .map(|r| r.probability)
            .collect();
        let delta = recent[recent.len() - 1] - recent[0];
        if delta > 20.0 {
            15.0
        } else if delta > 10.0 {
            8.0
        } else {
            0.0
        }
    }

    /// Decision tree over the evidence flags. Precedence is fixed:
    /// cold + high-frequency beats the EMF/motion pairing, and the
    /// catalog draw is the fallback when nothing matches.
    fn identify_entity(rng: &mut StdRng, snapshot: &SensorSnapshot) -> &'static str {
        let emf_high = snapshot.emf > 70.0;
        let cold = snapshot.temperature < 50.0;
        let high_frequency = snapshot.spectral > 600.0;
        let motion_active = snapshot.motion > 60.0;

        if cold && high_frequency {
            "Wraith"
        } else if emf_high && motion_active {
            "Poltergeist"
        } else if high_frequency {
            "Specter"
        } else if cold {
            "Phantom"
        } else if motion_active {
            "Apparition"
        } else {
            ENTITY_TYPES[rng.gen_range(0..ENTITY_TYPES.len())]
        }
    }

    /// Up to five evidence strings, each gated by its own threshold.
    fn gather_evidence(snapshot: &SensorSnapshot) -> Vec<String> {
        let mut evidence = Vec::new();
        if snapshot.emf > 50.0 {
            evidence.push(format!("EMF Spike: {} mG", snapshot.emf));
        }
        if snapshot.temperature < 55.0 {
            evidence.push(format!("Cold Spot: {}°F", snapshot.temperature));
        }
        if snapshot.spectral > 500.0 {
            evidence.push(format!("Spectral Anomaly: {} MHz", snapshot.spectral));
        }
        if snapshot.motion > 50.0 {
            evidence.push(format!("Motion Detected: {}%", snapshot.motion));
        }
        if snapshot.humidity > 65.0 {
            evidence.push(format!("Humidity Surge: {}%", snapshot.humidity));
        }
        if snapshot.pressure < 995.0 {
            evidence.push(format!("Pressure Drop: {} hPa", snapshot.pressure));
        }
        evidence.truncate(5);
        evidence
    }

    /// Confidence 0-100: triggered channels x15, recent history
    /// consistency x8, plus a small random term.
    fn confidence(
        rng: &mut StdRng,
        snapshot: &SensorSnapshot,
        history: &VecDeque<AnalysisResult>,
    ) -> f64 {
        let triggered = CONFIDENCE_TRIGGERS
            .iter()
            .filter(|(channel, threshold)| snapshot.get(*channel) > *threshold)
            .count() as f64;

        let mut total = triggered * 15.0;

        if history.len() > 5 {
            let recent_detections = history
                .iter()
                .skip(history.len() - 5)
                .filter(|r| r.probability > 50.0)
                .count() as f64;
            total += recent_detections * 8.0;
        }

        total += rng.gen_range(5.0..15.0);
        round1(total.clamp(0.0, 100.0))
    }

    /// Most recent `n` results, oldest first.
    pub fn recent(&self, n: usize) -> Vec<AnalysisResult> {
        let state = self.state.lock();
        let skip = state.history.len().saturating_sub(n);
        state.history.iter().skip(skip).cloned().collect()
    }

    /// 20 spectral bands for visualization: a wandering base with a 30%
    /// chance of activity per band, clamped to [5, 100].
    pub fn spectral_bands(&self) -> Vec<f64> {
        let mut state = self.state.lock();
        let rng = &mut state.rng;
        let base = rng.gen_range(20.0..80.0);
        (0..20)
            .map(|_| {
                let band: f64 = if rng.gen::<f64>() < 0.3 {
                    base + rng.gen_range(-10.0..50.0)
                } else {
                    rng.gen_range(10.0..40.0)
                };
                band.clamp(5.0, 100.0)
            })
            .collect()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a channel value to [0, 1] over its declared bounds.
/// Temperature is inverted: colder reads as more anomalous.
pub fn normalize(channel: SensorChannel, value: f64) -> f64 {
    let (min, max) = channel.bounds();
    let scaled = (value - min) / (max - min);
    let scaled = if channel == SensorChannel::Temperature {
        1.0 - scaled
    } else {
        scaled
    };
    scaled.clamp(0.0, 1.0)
}

/// Circadian probability bonus. The night band wins over the
/// early/late band; daytime contributes nothing.
pub fn circadian_modifier(hour: u32) -> f64 {
    if hour < 6 || hour > 20 {
        15.0
    } else if hour < 8 || hour > 18 {
        5.0
    } else {
        0.0
    }
}

/// Fixed recommendation catalog per probability band.
fn recommendations_for(probability: f64) -> Vec<String> {
    let messages: &[&str] = if probability > 80.0 {
        &[
            "IMMEDIATE EVACUATION RECOMMENDED",
            "Contact paranormal investigation team",
            "Set up additional recording equipment",
        ]
    } else if probability > 60.0 {
        &[
            "Maintain observation - activity increasing",
            "Deploy backup sensors",
            "Document all readings",
        ]
    } else if probability > 40.0 {
        &[
            "Continue monitoring",
            "Check sensor calibration",
            "Note environmental conditions",
        ]
    } else {
        &["Normal conditions", "Perform routine sensor check"]
    };
    messages.iter().map(|m| m.to_string()).collect()
}
