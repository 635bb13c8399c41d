//! Spatialization configuration
//!
//! An immutable [`SpatialConfig`] value is threaded through the whole
//! pipeline. Validation is eager: array lengths and value ranges are checked
//! before any clip is probed or scheduled, so a bad config never costs an
//! engine invocation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SusurrusError};

/// Ordering applied when `shuffle = false` and every layer draws from the
/// full pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPolicy {
    /// Every layer plays the pool in base order; layers differ only by
    /// offset, volume, and pan.
    #[default]
    Identical,
    /// Layer `i` plays the base order rotated left by `i` positions.
    Rotated,
}

/// Per-run spatialization parameters.
///
/// The three parallel arrays are indexed by layer: layer `i` gets
/// `pan_positions[i]`, `volumes[i]`, and `time_offsets[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpatialConfig {
    /// Number of parallel conversation layers
    pub num_layers: usize,

    /// Stereo position per layer, -1.0 (left) to +1.0 (right)
    pub pan_positions: Vec<f64>,

    /// Linear volume scale per layer, >= 0.0
    pub volumes: Vec<f64>,

    /// Start delay per layer in seconds, >= 0.0
    pub time_offsets: Vec<f64>,

    /// Randomize each layer's clip order (deterministically, per layer)
    #[serde(default = "default_true")]
    pub shuffle: bool,

    /// Whether every layer draws from the entire pool (`true`) or from a
    /// disjoint partition of it (`false`)
    #[serde(default = "default_true")]
    pub reuse: bool,

    /// Best-effort target duration; `None` plays the pool exactly once
    #[serde(default)]
    pub target_duration_minutes: Option<f64>,

    /// Ordering used when `shuffle = false` and `reuse = true`
    #[serde(default)]
    pub order_policy: OrderPolicy,

    /// Base seed for per-layer shuffle derivation
    #[serde(default)]
    pub seed: u64,
}

fn default_true() -> bool {
    true
}

impl SpatialConfig {
    /// Check array lengths and value ranges.
    ///
    /// Must be called before any probing or scheduling begins; a length
    /// mismatch is a configuration error, never silently tolerated.
    pub fn validate(&self) -> Result<()> {
        if self.num_layers == 0 {
            return Err(SusurrusError::config("num_layers must be at least 1"));
        }

        for (name, len) in [
            ("pan_positions", self.pan_positions.len()),
            ("volumes", self.volumes.len()),
            ("time_offsets", self.time_offsets.len()),
        ] {
            if len != self.num_layers {
                return Err(SusurrusError::config(format!(
                    "{} has {} entries, expected {} (one per layer)",
                    name, len, self.num_layers
                )));
            }
        }

        for (i, pan) in self.pan_positions.iter().enumerate() {
            if !(-1.0..=1.0).contains(pan) {
                return Err(SusurrusError::config(format!(
                    "pan_positions[{}] = {} is outside [-1, 1]",
                    i, pan
                )));
            }
        }

        for (i, vol) in self.volumes.iter().enumerate() {
            if *vol < 0.0 {
                return Err(SusurrusError::config(format!(
                    "volumes[{}] = {} is negative",
                    i, vol
                )));
            }
        }

        for (i, off) in self.time_offsets.iter().enumerate() {
            if *off < 0.0 {
                return Err(SusurrusError::config(format!(
                    "time_offsets[{}] = {} is negative",
                    i, off
                )));
            }
        }

        Ok(())
    }

    /// Load and validate a config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: SpatialConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}

/// Which outputs a run produces.
#[derive(Debug, Clone, Default)]
pub struct OutputSpec {
    /// Path for the mixed stereo soundscape, if requested
    pub stereo: Option<PathBuf>,
    /// Path for the unmixed N-channel asset, if requested
    pub channels: Option<PathBuf>,
}

impl OutputSpec {
    /// A run with no requested outputs has nothing to do.
    pub fn validate(&self) -> Result<()> {
        if self.stereo.is_none() && self.channels.is_none() {
            return Err(SusurrusError::config(
                "at least one output (stereo or channels) must be requested",
            ));
        }
        Ok(())
    }
}
