//! Canvas Sim - real-time 2D canvas simulation engine
//!
//! Core modules:
//! - `engine`: Frame clock, viewport, entity store, input, physics, lifecycle
//! - `renderer`: Painter seam, clear policies, shader backdrop pipeline
//! - `scenes`: Effect and mini-game simulations built on the engine
//! - `platform`: Browser host (DOM listeners, canvas painter, wasm API)
//! - `settings`: Host-supplied engine configuration

pub mod engine;
pub mod error;
pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod scenes;
pub mod settings;

pub use engine::{Engine, EnginePhase, HostEvent};
pub use error::EngineError;
pub use highscores::BestScore;
pub use settings::{EngineConfig, QualityPreset};

use glam::Vec2;

/// Engine-wide constants
pub mod consts {
    /// Reference frame duration that per-frame tuning values were authored against
    pub const REFERENCE_FRAME_SECS: f32 = 1.0 / 60.0;
    /// Largest dt handed to an update step (tab was backgrounded, debugger pause...)
    pub const MAX_DT: f32 = 0.1;

    /// Pointer position reported when no pointer is active.
    ///
    /// An implausible coordinate rather than `Option` so hot per-entity loops
    /// can compute distances without branching; everything lands far away.
    pub const NO_POINTER: (f32, f32) = (-1000.0, -1000.0);

    /// Height changes below this are ignored on mobile surfaces (browser chrome show/hide)
    pub const MOBILE_HEIGHT_NOISE_PX: f32 = 120.0;
    /// Width change that counts as a real resize (rotation, window drag)
    pub const WIDTH_CHANGE_EPSILON_PX: f32 = 1.0;

    /// Off-screen margin before an entity is pruned
    pub const PRUNE_MARGIN: f32 = 100.0;

    /// Default spring constants (tuned by eye, not physical)
    pub const SPRING_TENSION: f32 = 0.04;
    pub const SPRING_FRICTION: f32 = 0.85;

    /// Auto-repeat period while fire is held (ms)
    pub const AUTO_FIRE_MS: u32 = 150;
}

/// Multiplier turning per-reference-frame tuning values into per-dt values
#[inline]
pub fn frame_factor(dt: f32) -> f32 {
    dt / consts::REFERENCE_FRAME_SECS
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Points of an irregular rock outline (asteroids), already rotated and translated
pub fn rock_outline(center: Vec2, size: f32, rotation: f32, points: usize, lumpiness: f32) -> Vec<Vec2> {
    let step = std::f32::consts::TAU / points as f32;
    (0..points)
        .map(|i| {
            let angle = step * i as f32 + rotation;
            let r = size * (0.7 + (i as f32 * lumpiness).sin() * 0.3);
            center + direction(angle) * r
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_factor_is_one_at_reference_rate() {
        assert!((frame_factor(consts::REFERENCE_FRAME_SECS) - 1.0).abs() < 1e-6);
        assert!((frame_factor(consts::REFERENCE_FRAME_SECS * 2.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_rock_outline_stays_within_size() {
        let outline = rock_outline(Vec2::new(50.0, 50.0), 20.0, 0.3, 8, 2.0);
        assert_eq!(outline.len(), 8);
        for p in outline {
            let r = p.distance(Vec2::new(50.0, 50.0));
            assert!(r <= 20.0 + 1e-3 && r >= 20.0 * 0.4 - 1e-3);
        }
    }
}
