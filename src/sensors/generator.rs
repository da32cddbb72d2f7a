// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/ghostwatch-rs

//! Correlated synthetic signal generator
//!
//! Produces the six sensor channels on a fixed cadence, driven by a
//! latent "ghost activity" scalar that is recomputed every cycle from a
//! circadian term, a bounded random term and a slow sinusoid. Channels
//! pick up correlated noise from the activity level and from each other
//! (temperature and motion both key off the emf channel).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, Timelike, Utc};
use parking_lot::Mutex;
use rand::prelude::*;
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info};

use super::{ChannelReading, ChannelStatus, SensorChannel, SensorSnapshot};

/// Latent activity samples kept for pattern inspection.
const PATTERN_CAPACITY: usize = 100;

/// Default generation cadence.
pub const DEFAULT_CADENCE: Duration = Duration::from_millis(500);

struct GeneratorState {
    values: SensorSnapshot,
    offsets: [f64; 6],
    activity: f64,
    pattern: VecDeque<(DateTime<Utc>, f64)>,
    rng: StdRng,
}

/// Periodic generator for the six simulated channels.
///
/// All mutable state sits behind one lock; readers get copies. The
/// `run` loop drives `advance` on its own task, but `advance` is also
/// public so tests and manual pollers can step the simulation directly.
pub struct SignalGenerator {
    state: Mutex<GeneratorState>,
    cadence: Duration,
    started: Instant,
}

impl SignalGenerator {
    pub fn new(cadence: Duration) -> Self {
        Self::with_rng(cadence, StdRng::from_entropy())
    }

    /// Seeded constructor for reproducible runs.
    pub fn with_seed(cadence: Duration, seed: u64) -> Self {
        Self::with_rng(cadence, StdRng::seed_from_u64(seed))
    }

    fn with_rng(cadence: Duration, rng: StdRng) -> Self {
        Self {
            state: Mutex::new(GeneratorState {
                values: SensorSnapshot::default(),
                offsets: [0.0; 6],
                activity: 0.0,
                pattern: VecDeque::with_capacity(PATTERN_CAPACITY),
                rng,
            }),
            cadence,
            started: Instant::now(),
        }
    }

    /// Advance the simulation one cycle, updating every channel in place.
    pub fn advance(&self) {
        let elapsed = self.started.elapsed().as_secs_f64();
        let hour = Local::now().hour();
        self.advance_at(elapsed, hour);
    }

    /// Cycle step with the clock inputs injected, for deterministic tests.
    fn advance_at(&self, elapsed_secs: f64, hour: u32) {
        let mut state = self.state.lock();
        let st = &mut *state;

        st.activity = Self::latent_activity(&mut st.rng, elapsed_secs, hour);
        st.pattern.push_back((Utc::now(), st.activity));
        while st.pattern.len() > PATTERN_CAPACITY {
            st.pattern.pop_front();
        }

        // Generation order matters: temperature and motion correlate
        // against the emf value from this same cycle.
        for channel in SensorChannel::ALL {
            let raw = Self::simulate_channel(st, channel, elapsed_secs);
            let (min, max) = channel.bounds();
            let offset = st.offsets[channel as usize];
            st.values.set(channel, (raw + offset).clamp(min, max));
        }
    }

    /// Latent activity in [0, 100]: circadian bonus + bounded random
    /// term + slow sinusoid.
    fn latent_activity(rng: &mut StdRng, elapsed_secs: f64, hour: u32) -> f64 {
        let night_bonus = if hour < 6 || hour > 20 { 30.0 } else { 0.0 };
        let random_term = rng.gen_range(0.0..40.0);
        let cycle = ((elapsed_secs * 0.1).sin() + 1.0) * 15.0;
        (night_bonus + random_term + cycle).clamp(0.0, 100.0)
    }

    fn simulate_channel(st: &mut GeneratorState, channel: SensorChannel, elapsed_secs: f64) -> f64 {
        let activity = st.activity;
        match channel {
            SensorChannel::Emf => {
                let mut v = 25.0 + st.rng.gen_range(-5.0..5.0);
                if activity > 50.0 {
                    v += activity * 0.7;
                }
                if st.rng.gen::<f64>() < 0.10 {
                    v += st.rng.gen_range(30.0..50.0);
                }
                v
            }
            SensorChannel::Temperature => {
                let mut v = 72.0 + st.rng.gen_range(-1.0..1.0);
                if activity > 60.0 {
                    v -= activity * 0.3; // cold spots
                }
                if st.values.emf > 70.0 {
                    v -= 10.0;
                }
                v
            }
            SensorChannel::Humidity => {
                let mut v = 45.0 + st.rng.gen_range(-3.0..3.0);
                if activity > 40.0 {
                    v += st.rng.gen_range(5.0..15.0);
                }
                v
            }
            SensorChannel::Pressure => {
                let mut v = 1013.0 + st.rng.gen_range(-2.0..2.0);
                if activity > 70.0 {
                    v += st.rng.gen_range(-10.0..-5.0);
                }
                v
            }
            SensorChannel::Spectral => {
                let mut v = st.rng.gen_range(100.0..300.0);
                if activity > 30.0 {
                    v += elapsed_secs.sin() * 50.0 + activity * 5.0;
                }
                if st.rng.gen::<f64>() < 0.15 {
                    v += st.rng.gen_range(200.0..400.0);
                }
                v
            }
            SensorChannel::Motion => {
                let mut v = st.rng.gen_range(0.0..20.0);
                if activity > 50.0 {
                    v += activity * 0.4;
                }
                if st.values.emf > 60.0 {
                    v += 30.0;
                }
                v
            }
        }
    }

    /// Current readings across all channels, rounded to one decimal.
    pub fn snapshot(&self) -> SensorSnapshot {
        self.state.lock().values.rounded()
    }

    /// Current reading plus metadata for a single channel.
    pub fn channel(&self, channel: SensorChannel) -> ChannelReading {
        let value = self.state.lock().values.get(channel);
        let (min, max) = channel.bounds();
        ChannelReading {
            channel,
            value,
            min,
            max,
            unit: channel.unit(),
        }
    }

    /// Redraw per-channel calibration offsets and reset latent state.
    pub fn calibrate(&self) -> &'static str {
        let mut state = self.state.lock();
        let st = &mut *state;
        for offset in st.offsets.iter_mut() {
            *offset = st.rng.gen_range(-2.0..2.0);
        }
        st.activity = 0.0;
        st.pattern.clear();
        info!("sensor calibration complete");
        "Calibration successful"
    }

    /// Per-channel availability. The simulator never loses a channel.
    pub fn status(&self) -> Vec<ChannelStatus> {
        SensorChannel::ALL
            .iter()
            .map(|&channel| ChannelStatus {
                channel,
                online: true,
            })
            .collect()
    }

    /// Time since the generator was constructed.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Latent activity pattern buffer, most recent last.
    pub fn activity_pattern(&self) -> Vec<(DateTime<Utc>, f64)> {
        self.state.lock().pattern.iter().cloned().collect()
    }

    /// Drive `advance` on the configured cadence until shutdown fires.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        info!(cadence_ms = self.cadence.as_millis() as u64, "signal generator started");
        let mut tick = interval(self.cadence);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.advance();
                }
                _ = shutdown.recv() => {
                    debug!("signal generator shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SignalGenerator {
        SignalGenerator::with_seed(DEFAULT_CADENCE, 42)
    }

    #[test]
    fn channels_stay_within_bounds() {
        let gen = seeded();
        for i in 0..500 {
            // Sweep day and night hours and the sinusoid phase.
            gen.advance_at(i as f64 * 0.5, (i % 24) as u32);
            let snap = gen.snapshot();
            for channel in SensorChannel::ALL {
                let (min, max) = channel.bounds();
                let v = snap.get(channel);
                assert!(
                    (min..=max).contains(&v),
                    "{:?} = {} outside [{}, {}]",
                    channel,
                    v,
                    min,
                    max
                );
            }
        }
    }

    #[test]
    fn repeated_calibration_keeps_channels_in_bounds() {
        let gen = seeded();
        for round in 0..6 {
            gen.calibrate();
            gen.advance_at(round as f64, 12);
            let snap = gen.snapshot();
            for channel in SensorChannel::ALL {
                let (min, max) = channel.bounds();
                let v = snap.get(channel);
                assert!((min..=max).contains(&v), "round {} {:?} = {}", round, channel, v);
            }
        }
    }

    #[test]
    fn calibrate_resets_latent_state() {
        let gen = seeded();
        for i in 0..10 {
            gen.advance_at(i as f64, 23);
        }
        assert!(!gen.activity_pattern().is_empty());
        assert_eq!(gen.calibrate(), "Calibration successful");
        assert!(gen.activity_pattern().is_empty());
        assert_eq!(gen.state.lock().activity, 0.0);
    }

    #[test]
    fn pattern_buffer_is_bounded() {
        let gen = seeded();
        for i in 0..(PATTERN_CAPACITY + 25) {
            gen.advance_at(i as f64, 12);
        }
        assert_eq!(gen.activity_pattern().len(), PATTERN_CAPACITY);
    }

    #[test]
    fn latent_activity_is_clamped_and_night_boosted() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let day = SignalGenerator::latent_activity(&mut rng, 1.0, 12);
            let night = SignalGenerator::latent_activity(&mut rng, 1.0, 23);
            assert!((0.0..=100.0).contains(&day));
            assert!((0.0..=100.0).contains(&night));
            // Night bonus alone guarantees at least 30.
            assert!(night >= 30.0);
        }
    }

    #[test]
    fn snapshot_values_are_rounded() {
        let gen = seeded();
        gen.advance_at(3.0, 12);
        let snap = gen.snapshot();
        for channel in SensorChannel::ALL {
            let v = snap.get(channel);
            assert_eq!(v, super::super::round1(v));
        }
    }

    #[test]
    fn seeded_generators_agree() {
        let a = SignalGenerator::with_seed(DEFAULT_CADENCE, 99);
        let b = SignalGenerator::with_seed(DEFAULT_CADENCE, 99);
        for i in 0..20 {
            a.advance_at(i as f64, 12);
            b.advance_at(i as f64, 12);
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn all_channels_report_online() {
        let gen = seeded();
        let status = gen.status();
        assert_eq!(status.len(), 6);
        assert!(status.iter().all(|s| s.online));
    }
}
