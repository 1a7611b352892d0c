//! Common types for node health tracking and scoring

use crate::error::{ReputationError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use relaygate_core::{NodeId, ReputationScore, MAX_SCORE};

/// Uptime bounds in percent
pub const UPTIME_BOUNDS: (f64, f64) = (0.0, 100.0);

/// Latency bounds in milliseconds
pub const LATENCY_BOUNDS: (f64, f64) = (5.0, 400.0);

/// Accuracy bounds in percent
pub const ACCURACY_BOUNDS: (f64, f64) = (0.0, 100.0);

/// Per-node health record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    /// Availability, 0-100
    pub uptime: f64,

    /// Response latency in ms, 5-400, lower is better
    pub latency: f64,

    /// Result accuracy, 0-100
    pub accuracy: f64,

    /// Number of fault events observed
    pub missed: u64,

    /// Number of rounds this node has been evolved
    pub epochs_active: u64,
}

impl NodeMetrics {
    /// Create a record, clamping the bounded fields
    pub fn new(uptime: f64, latency: f64, accuracy: f64) -> Self {
        Self {
            uptime: uptime.clamp(UPTIME_BOUNDS.0, UPTIME_BOUNDS.1),
            latency: latency.clamp(LATENCY_BOUNDS.0, LATENCY_BOUNDS.1),
            accuracy: accuracy.clamp(ACCURACY_BOUNDS.0, ACCURACY_BOUNDS.1),
            missed: 0,
            epochs_active: 0,
        }
    }

    /// Starting state for a freshly registered node:
    /// uptime 80-100, latency 40-80 ms, accuracy 70-100
    pub fn bootstrap<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(
            80.0 + rng.gen::<f64>() * 20.0,
            40.0 + rng.gen::<f64>() * 40.0,
            70.0 + rng.gen::<f64>() * 30.0,
        )
    }

    /// Whether every bounded field is inside its range
    pub fn is_within_bounds(&self) -> bool {
        (UPTIME_BOUNDS.0..=UPTIME_BOUNDS.1).contains(&self.uptime)
            && (LATENCY_BOUNDS.0..=LATENCY_BOUNDS.1).contains(&self.latency)
            && (ACCURACY_BOUNDS.0..=ACCURACY_BOUNDS.1).contains(&self.accuracy)
    }
}

/// Random-walk and fault parameters applied once per round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionParams {
    /// Centre of the uptime walk; below 0.5 biases uptime upwards
    pub uptime_bias: f64,

    /// Uptime step scale
    pub uptime_step: f64,

    /// Latency step scale (ms)
    pub latency_step: f64,

    /// Accuracy step scale
    pub accuracy_step: f64,

    /// Probability of a fault event per node per round
    pub fault_probability: f64,

    /// Lower bound of the accuracy penalty on a fault
    pub fault_penalty_min: f64,

    /// Upper bound of the accuracy penalty on a fault
    pub fault_penalty_max: f64,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            uptime_bias: 0.45,
            uptime_step: 6.0,
            latency_step: 30.0,
            accuracy_step: 4.0,
            fault_probability: 0.03,
            fault_penalty_min: 10.0,
            fault_penalty_max: 40.0,
        }
    }
}

/// Inclusive-exclusive sampling range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandRange {
    pub min: f64,
    pub max: f64,
}

impl BandRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Draw a value in `[min, max)`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.min + rng.gen::<f64>() * (self.max - self.min)
    }

    fn is_valid_within(&self, bounds: (f64, f64)) -> bool {
        self.min <= self.max && self.min >= bounds.0 && self.max <= bounds.1
    }
}

/// Metric ranges forced onto the top-ranked nodes each round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthyBand {
    pub uptime: BandRange,
    pub accuracy: BandRange,
    pub latency: BandRange,
}

impl Default for HealthyBand {
    fn default() -> Self {
        Self {
            uptime: BandRange::new(95.0, 100.0),
            accuracy: BandRange::new(90.0, 95.0),
            latency: BandRange::new(30.0, 40.0),
        }
    }
}

impl HealthyBand {
    /// Whether every banded field of `metrics` lies inside the band
    pub fn contains(&self, metrics: &NodeMetrics) -> bool {
        self.uptime.contains(metrics.uptime)
            && self.accuracy.contains(metrics.accuracy)
            && self.latency.contains(metrics.latency)
    }

    /// Lowest score any forced node can end up with
    pub fn min_score(&self) -> ReputationScore {
        let worst = NodeMetrics::new(self.uptime.min, self.latency.max, self.accuracy.min);
        crate::score::score(&worst)
    }

    /// Overwrite uptime, accuracy and latency with values from the band
    pub fn apply<R: Rng + ?Sized>(&self, metrics: &mut NodeMetrics, rng: &mut R) {
        metrics.uptime = self.uptime.sample(rng);
        metrics.accuracy = self.accuracy.sample(rng);
        metrics.latency = self.latency.sample(rng);
    }
}

/// Configuration for scoring, eligibility and evolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationConfig {
    /// Nodes scoring strictly above this are safe (default: 70)
    pub safe_threshold: ReputationScore,

    /// Number of nodes forced into the healthy band each round (default: 2)
    pub min_healthy: usize,

    pub evolution: EvolutionParams,

    pub healthy_band: HealthyBand,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            safe_threshold: 70,
            min_healthy: 2,
            evolution: EvolutionParams::default(),
            healthy_band: HealthyBand::default(),
        }
    }
}

impl ReputationConfig {
    /// Reject configurations that break the minimum-healthy guarantee
    pub fn validate(&self) -> Result<()> {
        if self.safe_threshold > MAX_SCORE {
            return Err(ReputationError::InvalidConfig(format!(
                "safe_threshold {} exceeds {}",
                self.safe_threshold, MAX_SCORE
            )));
        }

        if self.min_healthy == 0 {
            return Err(ReputationError::InvalidConfig(
                "min_healthy must be at least 1".to_string(),
            ));
        }

        let band = &self.healthy_band;
        if !band.uptime.is_valid_within(UPTIME_BOUNDS)
            || !band.accuracy.is_valid_within(ACCURACY_BOUNDS)
            || !band.latency.is_valid_within(LATENCY_BOUNDS)
        {
            return Err(ReputationError::InvalidConfig(
                "healthy band ranges must be ordered and inside metric bounds".to_string(),
            ));
        }

        let band_floor = band.min_score();
        if self.safe_threshold >= band_floor {
            return Err(ReputationError::InvalidConfig(format!(
                "safe_threshold {} must be below the healthy band's minimum score {}",
                self.safe_threshold, band_floor
            )));
        }

        let evolution = &self.evolution;
        let drift = [
            ("uptime_bias", evolution.uptime_bias),
            ("uptime_step", evolution.uptime_step),
            ("latency_step", evolution.latency_step),
            ("accuracy_step", evolution.accuracy_step),
            ("fault_penalty_min", evolution.fault_penalty_min),
            ("fault_penalty_max", evolution.fault_penalty_max),
        ];
        if let Some((name, value)) = drift.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ReputationError::InvalidConfig(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }

        if !(0.0..=1.0).contains(&evolution.fault_probability) {
            return Err(ReputationError::InvalidConfig(format!(
                "fault_probability {} must be within [0, 1]",
                evolution.fault_probability
            )));
        }
        if evolution.fault_penalty_min < 0.0
            || evolution.fault_penalty_min > evolution.fault_penalty_max
        {
            return Err(ReputationError::InvalidConfig(
                "fault penalty range must be non-negative and ordered".to_string(),
            ));
        }

        Ok(())
    }
}
