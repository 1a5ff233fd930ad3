//! Engine configuration
//!
//! Supplied by the host as JSON when an effect is mounted. Every field is
//! optional; missing fields fall back to defaults.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Multiplier on a scene's nominal entity count (Medium spawns the nominal count)
    pub fn particle_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.5,
            QualityPreset::Medium => 1.0,
            QualityPreset::High => 1.5,
        }
    }

    /// Whether to render the nebula glow layer of the starfield
    pub fn nebula_enabled(&self) -> bool {
        match self {
            QualityPreset::Low => false,
            QualityPreset::Medium => true,
            QualityPreset::High => true,
        }
    }
}

/// Low-power multipliers
const LOW_POWER_RESOLUTION: f32 = 0.55;
const LOW_POWER_FPS: f32 = 0.6;
const LOW_POWER_PARTICLES: f32 = 0.5;

/// Options recognised at activation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Reduce resolution scale, particle counts and target frame rate
    pub low_power: bool,
    /// External pause flag (e.g. an overlay closed mid-play)
    pub paused: bool,
    /// Touch-first layout: resize noise threshold, wider spacing
    pub mobile_optimized: bool,
    pub quality: QualityPreset,
    /// Fixed RNG seed; wall clock when absent
    pub seed: Option<u64>,
    /// Host-defined storage key for the best score (games only)
    pub best_score_key: Option<String>,
}

impl EngineConfig {
    /// Parse host options. An empty string means "all defaults".
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }

    /// Effective resolution scale for a scene authored at `base`
    pub fn resolution_scale(&self, base: f32) -> f32 {
        if self.low_power {
            base * LOW_POWER_RESOLUTION
        } else {
            base
        }
    }

    /// Effective logic tick rate for a scene authored at `base_fps`.
    /// Uncapped scenes (`0.0`) stay uncapped.
    pub fn target_fps(&self, base_fps: f32) -> f32 {
        if self.low_power && base_fps > 0.0 {
            (base_fps * LOW_POWER_FPS).round().max(1.0)
        } else {
            base_fps
        }
    }

    /// Effective entity budget for a scene authored at `base`
    pub fn particle_budget(&self, base: usize) -> usize {
        let mut scale = self.quality.particle_scale();
        if self.low_power {
            scale *= LOW_POWER_PARTICLES;
        }
        ((base as f32 * scale).round() as usize).max(1)
    }

    /// Pointer-reactive effects are disabled in low power mode
    pub fn pointer_response(&self) -> bool {
        !self.low_power
    }

    /// Seed for this activation
    pub fn seed_or(&self, fallback: u64) -> u64 {
        self.seed.unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = EngineConfig::from_json("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(!config.low_power);
        assert_eq!(config.quality, QualityPreset::Medium);
    }

    #[test]
    fn test_camel_case_options() {
        let config =
            EngineConfig::from_json(r#"{"lowPower":true,"mobileOptimized":true,"quality":"high","bestScoreKey":"hi"}"#)
                .unwrap();
        assert!(config.low_power);
        assert!(config.mobile_optimized);
        assert_eq!(config.quality, QualityPreset::High);
        assert_eq!(config.best_score_key.as_deref(), Some("hi"));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = EngineConfig::from_json("{lowPower:").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_low_power_reduces_everything() {
        let normal = EngineConfig::default();
        let low = EngineConfig {
            low_power: true,
            ..Default::default()
        };
        assert!(low.resolution_scale(1.0) < normal.resolution_scale(1.0));
        assert_eq!(normal.target_fps(30.0), 30.0);
        assert_eq!(low.target_fps(30.0), 18.0);
        assert_eq!(low.target_fps(0.0), 0.0);
        assert!(low.particle_budget(150) < normal.particle_budget(150));
        assert!(!low.pointer_response());
    }

    #[test]
    fn test_particle_budget_never_zero() {
        let config = EngineConfig {
            low_power: true,
            quality: QualityPreset::Low,
            ..Default::default()
        };
        assert_eq!(config.particle_budget(1), 1);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::parse("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
        assert_eq!(QualityPreset::High.as_str(), "High");
    }
}
