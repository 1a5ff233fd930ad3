//! Shader backdrop
//!
//! The simulation side of the GPU background: it only tracks time, the
//! pointer (in GL orientation, y up) and an intensity that eases toward a
//! target. Drawing is done by `renderer::BackdropRenderState`; the `Draw2d`
//! impl is the cheap static gradient shown where no GPU surface exists.

use glam::Vec2;

use crate::engine::lifecycle::{EventKind, ListenTarget};
use crate::engine::physics::ease_toward;
use crate::engine::runner::{Simulation, UpdateContext};
use crate::engine::viewport::ViewportMetrics;
use crate::renderer::{ClearPolicy, Draw2d, Paint, Painter, palette};
use crate::settings::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackdropTuning {
    pub fps: f32,
    /// Fraction of the gap to the target closed per tick
    pub ease: f32,
    pub rest_intensity: f32,
    /// Intensity target while the pointer is moving
    pub boost_intensity: f32,
    /// How long a pointer move keeps the boost (seconds)
    pub boost_hold_secs: f32,
}

impl Default for BackdropTuning {
    fn default() -> Self {
        Self {
            fps: 30.0,
            ease: 0.05,
            rest_intensity: 1.0,
            boost_intensity: 1.05,
            boost_hold_secs: 0.2,
        }
    }
}

const POINTER_LISTENERS: &[(ListenTarget, EventKind)] = &[
    (ListenTarget::Window, EventKind::PointerMove),
    (ListenTarget::Window, EventKind::TouchMove),
];

#[derive(Debug, Clone)]
pub struct ShaderBackdrop {
    tuning: BackdropTuning,
    pointer_response: bool,
    /// Pointer in surface units, origin bottom-left
    pointer: Vec2,
    intensity: f32,
    target: f32,
    hold: f32,
    elapsed: f32,
}

impl ShaderBackdrop {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_tuning(config, BackdropTuning::default())
    }

    pub fn with_tuning(config: &EngineConfig, tuning: BackdropTuning) -> Self {
        Self {
            tuning,
            pointer_response: config.pointer_response(),
            pointer: Vec2::ZERO,
            intensity: tuning.rest_intensity,
            target: tuning.rest_intensity,
            hold: 0.0,
            elapsed: 0.0,
        }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn target_intensity(&self) -> f32 {
        self.target
    }

    /// Pointer with y measured from the bottom edge
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Seconds of simulated time since reset
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl Simulation for ShaderBackdrop {
    fn target_fps(&self) -> f32 {
        self.tuning.fps
    }

    fn listeners(&self) -> &'static [(ListenTarget, EventKind)] {
        if self.pointer_response { POINTER_LISTENERS } else { &[] }
    }

    fn reset(&mut self, metrics: &ViewportMetrics) {
        self.pointer = metrics.center();
        self.intensity = self.tuning.rest_intensity;
        self.target = self.tuning.rest_intensity;
        self.hold = 0.0;
        self.elapsed = 0.0;
    }

    fn resize(&mut self, metrics: &ViewportMetrics) {
        self.pointer = self.pointer.min(metrics.size());
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.elapsed += ctx.dt;

        if self.pointer_response && ctx.input.moved {
            if let Some(p) = ctx.input.pointer() {
                self.pointer = Vec2::new(p.x, ctx.metrics.height() - p.y);
                self.target = self.tuning.boost_intensity;
                self.hold = self.tuning.boost_hold_secs;
            }
        }

        if self.hold > 0.0 {
            self.hold -= ctx.dt;
            if self.hold <= 0.0 {
                self.target = self.tuning.rest_intensity;
            }
        }

        self.intensity = ease_toward(self.intensity, self.target, self.tuning.ease);
    }
}

impl Draw2d for ShaderBackdrop {
    fn clear_policy(&self) -> ClearPolicy {
        ClearPolicy::Fill(palette::SPACE)
    }

    fn draw(&self, painter: &mut dyn Painter, metrics: &ViewportMetrics, _time_ms: f64) {
        let size = metrics.size();
        let glow = (0.25 * self.intensity).clamp(0.0, 1.0);
        painter.fill_rect(
            Vec2::ZERO,
            size,
            &Paint::Linear {
                from: Vec2::ZERO,
                to: size,
                stops: vec![
                    (0.0, palette::VIOLET.with_alpha(glow)),
                    (0.5, palette::SPACE),
                    (1.0, palette::CYAN.with_alpha(glow * 0.6)),
                ],
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::InputSnapshot;

    fn metrics() -> ViewportMetrics {
        ViewportMetrics {
            css_width: 400.0,
            css_height: 300.0,
            dpr: 1.0,
            scale: 1.0,
        }
    }

    fn tick(scene: &mut ShaderBackdrop, input: &InputSnapshot, dt: f32) {
        let m = metrics();
        let mut ctx = UpdateContext {
            dt,
            now_ms: 0.0,
            input,
            metrics: &m,
        };
        scene.update(&mut ctx);
    }

    fn moved_to(x: f32, y: f32) -> InputSnapshot {
        InputSnapshot {
            pointer: Vec2::new(x, y),
            moved: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_pointer_move_boosts_then_relaxes() {
        let mut scene = ShaderBackdrop::new(&EngineConfig::default());
        scene.reset(&metrics());

        tick(&mut scene, &moved_to(100.0, 50.0), 1.0 / 30.0);
        assert_eq!(scene.target_intensity(), 1.05);
        assert!(scene.intensity() > 1.0);
        // y is flipped into GL orientation
        assert_eq!(scene.pointer(), Vec2::new(100.0, 250.0));

        let idle = InputSnapshot::default();
        for _ in 0..10 {
            tick(&mut scene, &idle, 1.0 / 30.0);
        }
        assert_eq!(scene.target_intensity(), 1.0);
        for _ in 0..200 {
            tick(&mut scene, &idle, 1.0 / 30.0);
        }
        assert!((scene.intensity() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_low_power_ignores_pointer() {
        let config = EngineConfig {
            low_power: true,
            ..Default::default()
        };
        let mut scene = ShaderBackdrop::new(&config);
        scene.reset(&metrics());
        assert!(scene.listeners().is_empty());
        tick(&mut scene, &moved_to(10.0, 10.0), 1.0 / 18.0);
        assert_eq!(scene.target_intensity(), 1.0);
        assert_eq!(scene.pointer(), metrics().center());
    }

    #[test]
    fn test_eases_five_percent_per_tick() {
        let mut scene = ShaderBackdrop::new(&EngineConfig::default());
        scene.reset(&metrics());
        tick(&mut scene, &moved_to(1.0, 1.0), 0.01);
        assert!((scene.intensity() - (1.0 + 0.05 * 0.05)).abs() < 1e-6);
    }
}
