//! Demo configuration.
//!
//! Every field has a default matching the published page, so an empty JSON
//! object (or no file at all) reproduces it.

#[cfg(feature = "serde")]
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::likelihood::LikelihoodParams;
use crate::phase::PhaseSchedule;
use crate::store::Layout;
use crate::synth::DEFAULT_COUPLING;
use crate::vec2::Vec2;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and > 0 (got {v})")))
    }
}

fn non_negative(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and >= 0 (got {v})")))
    }
}

/// Interactive nearest-neighbor explorer (hover / click-to-lock).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExplorerConfig {
    pub point_count: usize,
    pub neighbor_count: usize,
    pub width: f32,
    pub height: f32,
    pub coupling: f32,
    /// Total span of the vortex angle noise (radians).
    pub angle_noise: f32,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            point_count: 150,
            neighbor_count: 5,
            width: 800.0,
            height: 400.0,
            coupling: DEFAULT_COUPLING,
            angle_noise: 0.8,
        }
    }
}

impl ExplorerConfig {
    pub fn layout(&self) -> Layout {
        Layout::Vortex {
            count: self.point_count,
            width: self.width,
            height: self.height,
            angle_noise: self.angle_noise,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("explorer.width", self.width)?;
        positive("explorer.height", self.height)?;
        non_negative("explorer.angle_noise", self.angle_noise)?;
        if !self.coupling.is_finite() {
            return Err(invalid("explorer.coupling", "must be finite"));
        }
        Ok(())
    }
}

/// Naive vs. corrected agent drifting away from a scrolling expert stream.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DivergenceConfig {
    pub demo_count: usize,
    pub neighbor_count: usize,
    pub width: f32,
    pub height: f32,
    /// Vertical scatter of the stream around the baseline (total span, px).
    pub spread: f32,
    /// Simulated seconds per frame.
    pub time_step: f32,
    pub agent_start_x: f32,
    /// Horizontal px per frame, both agents.
    pub agent_speed: f32,
    /// Horizontal px per frame of the expert stream.
    pub stream_speed: f32,
    /// Stream points wrap once they pass `width + wrap_margin`.
    pub wrap_margin: f32,
    pub trail_len: usize,
    pub wobble_freq: f32,
    pub wobble_amp: f32,
    /// Naive agent: drift grows by this much per frame...
    pub naive_drift_rate: f32,
    /// ...and pushes y by `drift * naive_drift_gain` per frame.
    pub naive_drift_gain: f32,
    /// Corrected agent drift: `max(0, drift_initial - drift_decay * t) * t * drift_gain`.
    pub drift_initial: f32,
    pub drift_decay: f32,
    pub drift_gain: f32,
    /// Correction strength `min(t / correction_ramp, correction_max)`.
    pub correction_ramp: f32,
    pub correction_max: f32,
    pub likelihood: LikelihoodParams,
}

impl Default for DivergenceConfig {
    fn default() -> Self {
        Self {
            demo_count: 80,
            neighbor_count: 10,
            width: 800.0,
            height: 400.0,
            spread: 40.0,
            time_step: 0.016,
            agent_start_x: 100.0,
            agent_speed: 1.5,
            stream_speed: 1.5,
            wrap_margin: 20.0,
            trail_len: 150,
            wobble_freq: 2.0,
            wobble_amp: 0.5,
            naive_drift_rate: 0.012,
            naive_drift_gain: 0.4,
            drift_initial: 10.0,
            drift_decay: 1.1,
            drift_gain: 0.15,
            correction_ramp: 5.0,
            correction_max: 0.08,
            likelihood: LikelihoodParams::default(),
        }
    }
}

impl DivergenceConfig {
    pub fn baseline(&self) -> f32 {
        self.height * 0.5
    }

    pub fn layout(&self) -> Layout {
        Layout::Stream {
            count: self.demo_count,
            width: self.width,
            baseline: self.baseline(),
            spread: self.spread,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("divergence.width", self.width)?;
        positive("divergence.height", self.height)?;
        positive("divergence.time_step", self.time_step)?;
        positive("divergence.correction_ramp", self.correction_ramp)?;
        positive("divergence.likelihood.state_scale", self.likelihood.state_scale)?;
        positive("divergence.likelihood.delta_spread", self.likelihood.delta_spread)?;
        non_negative("divergence.spread", self.spread)?;
        non_negative("divergence.wrap_margin", self.wrap_margin)?;
        if self.trail_len == 0 {
            return Err(invalid("divergence.trail_len", "must be at least 1"));
        }
        if self.likelihood.band_low > self.likelihood.band_high {
            return Err(invalid("divergence.likelihood.band_low", "must not exceed band_high"));
        }
        Ok(())
    }
}

/// Averaging vs. mode-preserving aggregation over a bimodal neighbor set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MultimodalConfig {
    pub centers: Vec<Vec2>,
    pub radius: f32,
    pub per_cluster: usize,
    pub query: Vec2,
    pub neighbor_count: usize,
    pub time_step: f32,
    pub float_amp: f32,
    pub float_phase: f32,
    pub schedule: PhaseSchedule,
}

impl Default for MultimodalConfig {
    fn default() -> Self {
        Self {
            centers: vec![Vec2::new(250.0, 150.0), Vec2::new(550.0, 250.0)],
            radius: 50.0,
            per_cluster: 30,
            query: Vec2::new(410.0, 150.0),
            neighbor_count: 12,
            time_step: 0.02,
            float_amp: 3.0,
            float_phase: 0.01,
            schedule: PhaseSchedule::default(),
        }
    }
}

impl MultimodalConfig {
    pub fn layout(&self) -> Layout {
        Layout::Bimodal {
            centers: self.centers.clone(),
            radius: self.radius,
            per_cluster: self.per_cluster,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.centers.is_empty() {
            return Err(invalid("multimodal.centers", "at least one center is required"));
        }
        if self.centers.len() > u8::MAX as usize {
            return Err(invalid("multimodal.centers", "too many clusters"));
        }
        if self.centers.iter().any(|c| !c.is_finite()) || !self.query.is_finite() {
            return Err(invalid("multimodal.centers", "coordinates must be finite"));
        }
        non_negative("multimodal.radius", self.radius)?;
        positive("multimodal.time_step", self.time_step)?;
        positive("multimodal.schedule.select", self.schedule.select)?;
        positive("multimodal.schedule.mean", self.schedule.mean)?;
        positive("multimodal.schedule.modes", self.schedule.modes)?;
        positive("multimodal.schedule.hold", self.schedule.hold)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DarpConfig {
    /// Root seed; each demo salts its own stream from it.
    pub seed: u64,
    pub explorer: ExplorerConfig,
    pub divergence: DivergenceConfig,
    pub multimodal: MultimodalConfig,
}

impl Default for DarpConfig {
    fn default() -> Self {
        Self {
            seed: 0x0DA2_9001,
            explorer: ExplorerConfig::default(),
            divergence: DivergenceConfig::default(),
            multimodal: MultimodalConfig::default(),
        }
    }
}

impl DarpConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.explorer.validate()?;
        self.divergence.validate()?;
        self.multimodal.validate()
    }

    #[cfg(feature = "serde")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: DarpConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let cfg = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), seed = cfg.seed, "config loaded");
        Ok(cfg)
    }

    #[cfg(feature = "serde")]
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
