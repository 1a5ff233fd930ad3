//! Custom cursor
//!
//! A dot that tracks the pointer exactly and a ring that chases it on a
//! stiff spring. Hovering an interactive element (reported by the host)
//! hides the dot and widens the ring. A short fading trail follows the dot.

use glam::Vec2;

use crate::engine::lifecycle::{EventKind, ListenTarget};
use crate::engine::physics::{Spring, StepCarry, decay, ease_toward};
use crate::engine::runner::{Simulation, UpdateContext};
use crate::engine::store::EntityStore;
use crate::engine::viewport::ViewportMetrics;
use crate::frame_factor;
use crate::renderer::{Draw2d, Painter, palette};
use crate::settings::EngineConfig;

const LISTENERS: &[(ListenTarget, EventKind)] = &[
    (ListenTarget::Window, EventKind::PointerMove),
    (ListenTarget::Window, EventKind::PointerLeave),
    (ListenTarget::Window, EventKind::TouchMove),
    (ListenTarget::Window, EventKind::TouchEnd),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorTuning {
    pub dot_radius: f32,
    pub ring_diameter: f32,
    pub hover_diameter: f32,
    pub stiffness: f32,
    pub damping: f32,
    /// Fraction of the remaining gap kept per frame while the ring resizes
    pub ring_ease: f32,
    /// Same for the dot scale
    pub dot_ease: f32,
    pub trail_len: usize,
    /// Trail life lost per frame
    pub trail_fade: f32,
}

impl Default for CursorTuning {
    fn default() -> Self {
        Self {
            dot_radius: 6.0,
            ring_diameter: 40.0,
            hover_diameter: 60.0,
            stiffness: 500.0,
            damping: 28.0,
            ring_ease: 0.8,
            dot_ease: 0.7,
            trail_len: 24,
            trail_fade: 0.06,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub life: f32,
}

pub struct CursorTrail {
    tuning: CursorTuning,
    spring: Spring,
    steps: StepCarry,
    pointer: Option<Vec2>,
    ring: Vec2,
    ring_vel: Vec2,
    diameter: f32,
    dot_scale: f32,
    hovering: bool,
    trail: EntityStore<TrailPoint>,
}

impl CursorTrail {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_tuning(config, CursorTuning::default())
    }

    pub fn with_tuning(config: &EngineConfig, tuning: CursorTuning) -> Self {
        Self {
            spring: Spring::from_stiffness(tuning.stiffness, tuning.damping),
            steps: StepCarry::default(),
            pointer: None,
            ring: Vec2::ZERO,
            ring_vel: Vec2::ZERO,
            diameter: tuning.ring_diameter,
            dot_scale: 1.0,
            hovering: false,
            trail: EntityStore::with_cap(config.particle_budget(tuning.trail_len)),
            tuning,
        }
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn ring(&self) -> Vec2 {
        self.ring
    }

    pub fn ring_diameter(&self) -> f32 {
        self.diameter
    }

    pub fn dot_scale(&self) -> f32 {
        self.dot_scale
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    pub fn trail(&self) -> &EntityStore<TrailPoint> {
        &self.trail
    }

    /// 0 at rest size, 1 at hover size
    fn hover_blend(&self) -> f32 {
        let span = self.tuning.hover_diameter - self.tuning.ring_diameter;
        if span.abs() < f32::EPSILON {
            return 0.0;
        }
        ((self.diameter - self.tuning.ring_diameter) / span).clamp(0.0, 1.0)
    }
}

impl Simulation for CursorTrail {
    fn target_fps(&self) -> f32 {
        0.0
    }

    fn listeners(&self) -> &'static [(ListenTarget, EventKind)] {
        LISTENERS
    }

    fn reset(&mut self, _metrics: &ViewportMetrics) {
        self.pointer = None;
        self.ring_vel = Vec2::ZERO;
        self.steps.reset();
        self.diameter = self.tuning.ring_diameter;
        self.dot_scale = 1.0;
        self.trail.clear();
    }

    fn resize(&mut self, _metrics: &ViewportMetrics) {}

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let dt = ctx.dt;
        let steps = self.steps.take(dt);
        let previous = self.pointer;
        self.pointer = ctx.input.pointer();

        match (previous, self.pointer) {
            // First sighting: no swoop in from the origin
            (None, Some(p)) => {
                self.ring = p;
                self.ring_vel = Vec2::ZERO;
            }
            (Some(_), Some(p)) => {
                self.spring.advance(&mut self.ring, &mut self.ring_vel, p, steps);
            }
            _ => {}
        }

        if ctx.input.moved {
            if let Some(p) = self.pointer {
                self.trail.spawn_evicting(TrailPoint { pos: p, life: 1.0 });
            }
        }
        let fade = self.tuning.trail_fade * frame_factor(dt);
        self.trail.update_retain(|t| {
            t.life -= fade;
            t.life > 0.0
        });

        let (diameter, dot) = if self.hovering {
            (self.tuning.hover_diameter, 0.0)
        } else {
            (self.tuning.ring_diameter, 1.0)
        };
        self.diameter = ease_toward(self.diameter, diameter, 1.0 - decay(self.tuning.ring_ease, dt));
        self.dot_scale = ease_toward(self.dot_scale, dot, 1.0 - decay(self.tuning.dot_ease, dt));
    }

    fn set_hovering(&mut self, hovering: bool) {
        self.hovering = hovering;
    }
}

impl Draw2d for CursorTrail {
    fn draw(&self, painter: &mut dyn Painter, _metrics: &ViewportMetrics, _time_ms: f64) {
        let Some(pointer) = self.pointer else {
            return;
        };

        for t in &self.trail {
            painter.fill_circle(
                t.pos,
                self.tuning.dot_radius * 0.5 * t.life,
                &palette::CYAN.with_alpha(t.life * 0.4).into(),
            );
        }

        let color = palette::WHITE
            .with_alpha(0.5)
            .lerp(palette::CYAN.with_alpha(0.8), self.hover_blend());
        painter.stroke_circle(self.ring, self.diameter * 0.5, 2.0, color);

        let radius = self.tuning.dot_radius * self.dot_scale;
        if radius > 0.05 {
            painter.fill_circle(pointer, radius, &palette::CYAN.into());
        }
    }
}
