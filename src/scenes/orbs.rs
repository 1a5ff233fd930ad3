//! Orb field
//!
//! Glowing orbs drift across the page and lean toward the pointer. Clicking
//! near one collects it: it swells and fades, then respawns somewhere else.
//! The collected count is reported as the score.

use glam::Vec2;
use rand_pcg::Pcg32;

use super::{jitter, scene_rng, uniform};
use crate::engine::lifecycle::{EventKind, ListenTarget};
use crate::engine::physics::{decay, integrate, wrap};
use crate::engine::runner::{GameStats, Simulation, UpdateContext};
use crate::engine::store::EntityStore;
use crate::engine::viewport::ViewportMetrics;
use crate::frame_factor;
use crate::renderer::{Color, Draw2d, Paint, Painter};
use crate::settings::EngineConfig;

const LISTENERS: &[(ListenTarget, EventKind)] = &[
    (ListenTarget::Window, EventKind::PointerMove),
    (ListenTarget::Surface, EventKind::Click),
    (ListenTarget::Window, EventKind::TouchMove),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbTuning {
    pub count: usize,
    /// Attraction per frame toward a pointer inside the ring `(min, max)`
    pub pull: f32,
    pub pull_range: (f32, f32),
    pub damping: f32,
    /// Extra click radius around an orb
    pub click_slop: f32,
}

impl Default for OrbTuning {
    fn default() -> Self {
        Self {
            count: 12,
            pull: 0.02,
            pull_range: (20.0, 150.0),
            damping: 0.99,
            click_slop: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orb {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub base_radius: f32,
    pub hue: f32,
    pub alpha: f32,
    pub pulse: f32,
    pub collected: bool,
}

impl Orb {
    fn random(rng: &mut Pcg32, area: Vec2) -> Self {
        let radius = uniform(rng, 8.0, 20.0);
        Self {
            pos: Vec2::new(uniform(rng, 0.0, area.x), uniform(rng, 0.0, area.y)),
            vel: Vec2::new(jitter(rng, 0.25), jitter(rng, 0.25)),
            radius,
            base_radius: radius,
            hue: uniform(rng, 160.0, 220.0),
            alpha: uniform(rng, 0.4, 0.7),
            pulse: 0.0,
            collected: false,
        }
    }

    pub fn reaches(&self, point: Vec2, slop: f32) -> bool {
        self.pos.distance(point) < self.radius + slop
    }
}

pub struct OrbField {
    tuning: OrbTuning,
    rng: Pcg32,
    size: Vec2,
    orbs: EntityStore<Orb>,
    collected: u64,
}

impl OrbField {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_tuning(config, OrbTuning::default())
    }

    pub fn with_tuning(config: &EngineConfig, tuning: OrbTuning) -> Self {
        Self {
            rng: scene_rng(config),
            size: Vec2::ZERO,
            orbs: EntityStore::with_cap(config.particle_budget(tuning.count)),
            collected: 0,
            tuning,
        }
    }

    pub fn orbs(&self) -> &EntityStore<Orb> {
        &self.orbs
    }

    pub fn orbs_mut(&mut self) -> &mut EntityStore<Orb> {
        &mut self.orbs
    }

    pub fn collected(&self) -> u64 {
        self.collected
    }

    /// Mark every live orb within reach of `point`; returns how many
    fn collect_at(&mut self, point: Vec2) -> u64 {
        let slop = self.tuning.click_slop;
        let mut hits = 0;
        for orb in self.orbs.iter_mut() {
            if !orb.collected && orb.reaches(point, slop) {
                orb.collected = true;
                hits += 1;
            }
        }
        hits
    }
}

impl Simulation for OrbField {
    fn target_fps(&self) -> f32 {
        0.0
    }

    fn listeners(&self) -> &'static [(ListenTarget, EventKind)] {
        LISTENERS
    }

    fn reset(&mut self, metrics: &ViewportMetrics) {
        self.size = metrics.size();
        self.collected = 0;
        self.orbs.clear();
        let count = self.orbs.cap().unwrap_or(self.tuning.count);
        let (rng, size) = (&mut self.rng, self.size);
        self.orbs.extend((0..count).map(|_| Orb::random(rng, size)));
    }

    fn resize(&mut self, metrics: &ViewportMetrics) {
        // Orbs wrap into the new bounds on their own
        self.size = metrics.size();
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        for click in &ctx.input.clicks {
            let hits = self.collect_at(*click);
            if hits > 0 {
                self.collected += hits;
                log::debug!("Collected {hits} orb(s), total {}", self.collected);
            }
        }

        let dt = ctx.dt;
        let ff = frame_factor(dt);
        let pointer = ctx.input.pointer();
        let OrbTuning {
            pull,
            pull_range: (near, far),
            damping,
            ..
        } = self.tuning;
        let damping = decay(damping, dt);
        let grow = decay(1.05, dt);
        let fade = decay(0.9, dt);
        let Self { rng, size, orbs, .. } = self;

        orbs.update_retain(|orb| {
            if orb.collected {
                orb.radius *= grow;
                orb.alpha *= fade;
                if orb.alpha < 0.01 {
                    *orb = Orb::random(rng, *size);
                }
                return true;
            }

            if let Some(p) = pointer {
                let to = p - orb.pos;
                let dist = to.length();
                if dist > near && dist < far {
                    orb.vel += to / dist * pull * ff;
                }
            }
            integrate(&mut orb.pos, orb.vel, dt);
            orb.vel *= damping;
            wrap(&mut orb.pos, *size, orb.radius);

            orb.pulse += 0.05 * ff;
            orb.radius = orb.base_radius + orb.pulse.sin() * 2.0;
            true
        });
    }

    fn stats(&self) -> Option<GameStats> {
        Some(GameStats {
            score: self.collected,
            lives: 0,
            level: 1,
            combo: 0,
            game_over: false,
        })
    }
}

impl Draw2d for OrbField {
    fn draw(&self, painter: &mut dyn Painter, _metrics: &ViewportMetrics, _time_ms: f64) {
        for orb in &self.orbs {
            if orb.collected {
                painter.stroke_circle(orb.pos, orb.radius, 2.0, Color::hsla(orb.hue, 1.0, 0.7, orb.alpha));
                continue;
            }
            painter.fill_circle(
                orb.pos,
                orb.radius,
                &Paint::glow(
                    orb.pos,
                    orb.radius,
                    vec![
                        (0.0, Color::hsla(orb.hue, 1.0, 0.7, orb.alpha)),
                        (0.5, Color::hsla(orb.hue, 0.8, 0.5, orb.alpha * 0.5)),
                        (1.0, Color::hsla(orb.hue, 0.6, 0.3, 0.0)),
                    ],
                ),
            );
            painter.fill_circle(
                orb.pos,
                orb.radius * 0.3,
                &Color::hsla(orb.hue, 1.0, 0.9, orb.alpha * 0.8).into(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::REFERENCE_FRAME_SECS;
    use crate::engine::input::InputSnapshot;
    use crate::renderer::RecordingPainter;

    fn metrics() -> ViewportMetrics {
        ViewportMetrics {
            css_width: 1024.0,
            css_height: 768.0,
            dpr: 1.0,
            scale: 1.0,
        }
    }

    fn field() -> OrbField {
        let mut field = OrbField::new(&EngineConfig {
            seed: Some(21),
            ..Default::default()
        });
        field.reset(&metrics());
        field
    }

    fn step(field: &mut OrbField, input: &InputSnapshot) {
        let m = metrics();
        let mut ctx = UpdateContext {
            dt: REFERENCE_FRAME_SECS,
            now_ms: 0.0,
            input,
            metrics: &m,
        };
        field.update(&mut ctx);
    }

    #[test]
    fn test_spawns_twelve_orbs_in_range() {
        let field = field();
        assert_eq!(field.orbs().len(), 12);
        for orb in field.orbs() {
            assert!((8.0..20.0).contains(&orb.radius));
            assert!((160.0..220.0).contains(&orb.hue));
        }
    }

    #[test]
    fn test_click_collects_then_orb_respawns() {
        let mut field = field();
        let target = field.orbs().iter().next().map(|o| o.pos).unwrap();
        let input = InputSnapshot {
            clicks: vec![target],
            ..Default::default()
        };
        step(&mut field, &input);
        assert!(field.collected() >= 1);
        assert_eq!(field.stats().map(|s| s.score), Some(field.collected()));
        assert!(field.orbs().iter().any(|o| o.collected));

        // alpha 0.7 * 0.9^n < 0.01 within 41 frames
        let idle = InputSnapshot::default();
        for _ in 0..45 {
            step(&mut field, &idle);
        }
        assert!(field.orbs().iter().all(|o| !o.collected));
        assert_eq!(field.orbs().len(), 12);
    }

    #[test]
    fn test_collected_orb_is_not_collected_twice() {
        let mut field = field();
        let target = field.orbs().iter().next().map(|o| o.pos).unwrap();
        let input = InputSnapshot {
            clicks: vec![target, target],
            ..Default::default()
        };
        let before = field.orbs().iter().filter(|o| o.reaches(target, 10.0)).count() as u64;
        step(&mut field, &input);
        assert_eq!(field.collected(), before);
    }

    #[test]
    fn test_pointer_attracts_within_ring() {
        let mut field = field();
        for orb in field.orbs_mut().iter_mut() {
            orb.pos = Vec2::new(500.0, 400.0);
            orb.vel = Vec2::ZERO;
        }
        let input = InputSnapshot {
            pointer: Vec2::new(600.0, 400.0),
            ..Default::default()
        };
        step(&mut field, &input);
        assert!(field.orbs().iter().all(|o| o.vel.x > 0.0 && o.pos.x > 500.0));
    }

    #[test]
    fn test_orbs_wrap_at_edges() {
        let mut field = field();
        for orb in field.orbs_mut().iter_mut() {
            orb.pos = Vec2::new(-30.0, 100.0);
            orb.vel = Vec2::new(-1.0, 0.0);
        }
        step(&mut field, &InputSnapshot::default());
        assert!(field.orbs().iter().all(|o| o.pos.x > 1000.0));
    }

    #[test]
    fn test_draws_glow_and_core() {
        let field = field();
        let mut painter = RecordingPainter::new();
        field.draw(&mut painter, &metrics(), 0.0);
        assert_eq!(painter.shape_count(), 24);
    }
}
