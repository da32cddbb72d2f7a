//! Sensor module - simulated channels and snapshot types

mod generator;

pub use generator::SignalGenerator;

use serde::{Deserialize, Serialize};

/// The six simulated sensor channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorChannel {
    /// Electromagnetic field probe, milliGauss
    Emf,
    /// Ambient temperature, °F
    Temperature,
    /// Relative humidity, %
    Humidity,
    /// Barometric pressure, hPa
    Pressure,
    /// Spectral analyzer peak, MHz
    Spectral,
    /// Motion detector, unitless 0-100
    Motion,
}

impl SensorChannel {
    /// All channels in generation order. Temperature and motion read the
    /// emf value updated earlier in the same cycle, so emf must come first.
    pub const ALL: [SensorChannel; 6] = [
        SensorChannel::Emf,
        SensorChannel::Temperature,
        SensorChannel::Humidity,
        SensorChannel::Pressure,
        SensorChannel::Spectral,
        SensorChannel::Motion,
    ];

    /// Declared [min, max] bounds for the channel.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            SensorChannel::Emf => (0.0, 100.0),
            SensorChannel::Temperature => (40.0, 90.0),
            SensorChannel::Humidity => (20.0, 80.0),
            SensorChannel::Pressure => (980.0, 1030.0),
            SensorChannel::Spectral => (0.0, 1000.0),
            SensorChannel::Motion => (0.0, 100.0),
        }
    }

    /// Resting value with no latent activity.
    pub fn baseline(&self) -> f64 {
        match self {
            SensorChannel::Emf => 25.0,
            SensorChannel::Temperature => 72.0,
            SensorChannel::Humidity => 45.0,
            SensorChannel::Pressure => 1013.0,
            SensorChannel::Spectral => 0.0,
            SensorChannel::Motion => 0.0,
        }
    }

    /// Measurement unit label.
    pub fn unit(&self) -> &'static str {
        match self {
            SensorChannel::Emf => "mG",
            SensorChannel::Temperature => "°F",
            SensorChannel::Humidity => "%",
            SensorChannel::Pressure => "hPa",
            SensorChannel::Spectral => "MHz",
            SensorChannel::Motion => "",
        }
    }

    /// Lowercase wire/export name.
    pub fn name(&self) -> &'static str {
        match self {
            SensorChannel::Emf => "emf",
            SensorChannel::Temperature => "temperature",
            SensorChannel::Humidity => "humidity",
            SensorChannel::Pressure => "pressure",
            SensorChannel::Spectral => "spectral",
            SensorChannel::Motion => "motion",
        }
    }
}

/// One reading per channel, captured at a single generation cycle.
///
/// Snapshots are plain values: the generator hands out copies, never
/// references into its own state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub emf: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub spectral: f64,
    pub motion: f64,
}

impl SensorSnapshot {
    /// Value for a single channel.
    pub fn get(&self, channel: SensorChannel) -> f64 {
        match channel {
            SensorChannel::Emf => self.emf,
            SensorChannel::Temperature => self.temperature,
            SensorChannel::Humidity => self.humidity,
            SensorChannel::Pressure => self.pressure,
            SensorChannel::Spectral => self.spectral,
            SensorChannel::Motion => self.motion,
        }
    }

    pub(crate) fn set(&mut self, channel: SensorChannel, value: f64) {
        match channel {
            SensorChannel::Emf => self.emf = value,
            SensorChannel::Temperature => self.temperature = value,
            SensorChannel::Humidity => self.humidity = value,
            SensorChannel::Pressure => self.pressure = value,
            SensorChannel::Spectral => self.spectral = value,
            SensorChannel::Motion => self.motion = value,
        }
    }

    /// Copy with every channel rounded to one decimal.
    pub fn rounded(&self) -> SensorSnapshot {
        let mut out = *self;
        for channel in SensorChannel::ALL {
            out.set(channel, round1(self.get(channel)));
        }
        out
    }
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        let mut snap = SensorSnapshot {
            emf: 0.0,
            temperature: 0.0,
            humidity: 0.0,
            pressure: 0.0,
            spectral: 0.0,
            motion: 0.0,
        };
        for channel in SensorChannel::ALL {
            snap.set(channel, channel.baseline());
        }
        snap
    }
}

/// Availability report for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStatus {
    pub channel: SensorChannel,
    pub online: bool,
}

/// Metadata view of a single channel, for the status API.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelReading {
    pub channel: SensorChannel,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
}

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_bounds_are_ordered() {
        for channel in SensorChannel::ALL {
            let (min, max) = channel.bounds();
            assert!(min < max, "{:?} has inverted bounds", channel);
        }
    }

    #[test]
    fn snapshot_defaults_to_baselines() {
        let snap = SensorSnapshot::default();
        assert_eq!(snap.emf, 25.0);
        assert_eq!(snap.temperature, 72.0);
        assert_eq!(snap.pressure, 1013.0);
    }

    #[test]
    fn rounding_keeps_one_decimal() {
        let snap = SensorSnapshot {
            emf: 25.4567,
            temperature: 71.95,
            humidity: 44.4444,
            pressure: 1013.01,
            spectral: 123.456,
            motion: 0.049,
        };
        let rounded = snap.rounded();
        assert_eq!(rounded.emf, 25.5);
        assert_eq!(rounded.humidity, 44.4);
        assert_eq!(rounded.motion, 0.0);
    }
}
