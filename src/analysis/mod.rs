//! Analysis module - heuristic scoring of sensor snapshots

mod analyzer;

pub use analyzer::Analyzer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Activity classification bands, partitioning probability 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl ActivityLevel {
    /// Band for a probability value: <30 Low, <60 Moderate, <80 High,
    /// else Critical.
    pub fn from_probability(probability: f64) -> Self {
        if probability < 30.0 {
            ActivityLevel::Low
        } else if probability < 60.0 {
            ActivityLevel::Moderate
        } else if probability < 80.0 {
            ActivityLevel::High
        } else {
            ActivityLevel::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Low => "Low",
            ActivityLevel::Moderate => "Moderate",
            ActivityLevel::High => "High",
            ActivityLevel::Critical => "Critical",
        }
    }
}

/// Entity catalog used when no evidence branch matches.
pub const ENTITY_TYPES: [&str; 10] = [
    "Poltergeist",
    "Wraith",
    "Phantom",
    "Specter",
    "Banshee",
    "Apparition",
    "Shadow Person",
    "Orb",
    "Mist Entity",
    "Ectoplasm",
];

/// Result of scoring one sensor snapshot.
///
/// The entity type, evidence, confidence and recommendations are only
/// populated when the rounded probability exceeds 40.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub timestamp: DateTime<Utc>,
    /// Probability of paranormal activity, 0-100, one decimal.
    pub probability: f64,
    pub activity_level: ActivityLevel,
    pub entity_type: Option<String>,
    pub evidence: Vec<String>,
    /// Detection confidence, 0-100.
    pub confidence: f64,
    pub recommendations: Vec<String>,
}

impl AnalysisResult {
    /// Quiet result carrying only probability and level.
    pub(crate) fn quiet(probability: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            probability,
            activity_level: ActivityLevel::from_probability(probability),
            entity_type: None,
            evidence: Vec::new(),
            confidence: 0.0,
            recommendations: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_level_partitions_range() {
        assert_eq!(ActivityLevel::from_probability(0.0), ActivityLevel::Low);
        assert_eq!(ActivityLevel::from_probability(29.9), ActivityLevel::Low);
        assert_eq!(ActivityLevel::from_probability(30.0), ActivityLevel::Moderate);
        assert_eq!(ActivityLevel::from_probability(59.9), ActivityLevel::Moderate);
        assert_eq!(ActivityLevel::from_probability(60.0), ActivityLevel::High);
        assert_eq!(ActivityLevel::from_probability(79.9), ActivityLevel::High);
        assert_eq!(ActivityLevel::from_probability(80.0), ActivityLevel::Critical);
        assert_eq!(ActivityLevel::from_probability(100.0), ActivityLevel::Critical);
    }
}
