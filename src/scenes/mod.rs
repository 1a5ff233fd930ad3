//! Scenes
//!
//! Each scene is one `Simulation` plus a `Draw2d` (or GPU) render, built
//! entirely on the engine pieces:
//! - decorative: digital rain, starfield, cursor, border frame, shader
//!   backdrop, orb field
//! - games: the classic shooter and the in-site arena

pub mod arena;
pub mod backdrop;
pub mod border;
pub mod cursor;
pub mod orbs;
pub mod rain;
pub mod shooter;
pub mod space;
pub mod starfield;

pub use arena::Arena;
pub use backdrop::ShaderBackdrop;
pub use border::BorderFrame;
pub use cursor::CursorTrail;
pub use orbs::OrbField;
pub use rain::DigitalRain;
pub use shooter::Shooter;
pub use starfield::Starfield;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::frame_factor;
use crate::settings::EngineConfig;

/// Seed used when neither the host nor the platform supplies one
pub const DEFAULT_SEED: u64 = 0x5eed_cafe;

/// Scene selector used by the mount API and the smoke runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKind {
    DigitalRain,
    Starfield,
    Cursor,
    BorderFrame,
    ShaderBackdrop,
    OrbField,
    Shooter,
    Arena,
}

impl SceneKind {
    pub const ALL: [SceneKind; 8] = [
        SceneKind::DigitalRain,
        SceneKind::Starfield,
        SceneKind::Cursor,
        SceneKind::BorderFrame,
        SceneKind::ShaderBackdrop,
        SceneKind::OrbField,
        SceneKind::Shooter,
        SceneKind::Arena,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SceneKind::DigitalRain => "digital-rain",
            SceneKind::Starfield => "starfield",
            SceneKind::Cursor => "cursor",
            SceneKind::BorderFrame => "border-frame",
            SceneKind::ShaderBackdrop => "shader-backdrop",
            SceneKind::OrbField => "orb-field",
            SceneKind::Shooter => "shooter",
            SceneKind::Arena => "arena",
        }
    }

    /// Accepts kebab-case, snake_case or squashed names, any case
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "digitalrain" | "rain" => Some(SceneKind::DigitalRain),
            "starfield" | "spacebackground" => Some(SceneKind::Starfield),
            "cursor" | "customcursor" | "cursortrail" => Some(SceneKind::Cursor),
            "borderframe" | "border" => Some(SceneKind::BorderFrame),
            "shaderbackdrop" | "shader" | "backdrop" => Some(SceneKind::ShaderBackdrop),
            "orbfield" | "orbs" => Some(SceneKind::OrbField),
            "shooter" | "spaceshooter" => Some(SceneKind::Shooter),
            "arena" | "insitespacegame" => Some(SceneKind::Arena),
            _ => None,
        }
    }

    /// Games publish counters and accept a best-score key
    pub fn is_game(&self) -> bool {
        matches!(self, SceneKind::Shooter | SceneKind::Arena | SceneKind::OrbField)
    }
}

/// RNG for one activation
pub fn scene_rng(config: &EngineConfig) -> Pcg32 {
    Pcg32::seed_from_u64(config.seed_or(DEFAULT_SEED))
}

/// Uniform sample in `[lo, hi)`; tolerates an empty range on tiny surfaces
pub(crate) fn uniform(rng: &mut Pcg32, lo: f32, hi: f32) -> f32 {
    lo + rng.random::<f32>() * (hi - lo)
}

/// Symmetric sample in `[-half, half)`
pub(crate) fn jitter(rng: &mut Pcg32, half: f32) -> f32 {
    (rng.random::<f32>() - 0.5) * 2.0 * half
}

/// Roll an event tuned as "chance per 60 Hz frame" over a tick of `dt`
pub(crate) fn roll(rng: &mut Pcg32, per_frame: f32, dt: f32) -> bool {
    let p = 1.0 - (1.0 - per_frame.clamp(0.0, 1.0)).powf(frame_factor(dt));
    rng.random::<f32>() < p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::REFERENCE_FRAME_SECS;

    #[test]
    fn test_scene_kind_names_round_trip() {
        for kind in SceneKind::ALL {
            assert_eq!(SceneKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(SceneKind::parse("Digital_Rain"), Some(SceneKind::DigitalRain));
        assert_eq!(SceneKind::parse("InSiteSpaceGame"), Some(SceneKind::Arena));
        assert_eq!(SceneKind::parse("preloader"), None);
    }

    #[test]
    fn test_seed_makes_runs_repeatable() {
        let config = EngineConfig {
            seed: Some(42),
            ..Default::default()
        };
        let a: Vec<f32> = (0..5).map(|_| scene_rng(&config).random()).collect();
        let b: Vec<f32> = (0..5).map(|_| scene_rng(&config).random()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_roll_matches_rate_at_reference_frame() {
        let mut rng = Pcg32::seed_from_u64(7);
        let hits = (0..20_000)
            .filter(|_| roll(&mut rng, 0.1, REFERENCE_FRAME_SECS))
            .count();
        assert!((1_700..2_300).contains(&hits), "{hits}");
        assert!(!roll(&mut rng, 0.0, REFERENCE_FRAME_SECS));
    }

    #[test]
    fn test_uniform_handles_empty_range() {
        let mut rng = Pcg32::seed_from_u64(1);
        let v = uniform(&mut rng, 30.0, 30.0);
        assert_eq!(v, 30.0);
        for _ in 0..100 {
            let j = jitter(&mut rng, 0.05);
            assert!(j.abs() <= 0.05);
        }
    }
}
