//! Starfield backdrop
//!
//! Site-wide ambient layer: twinkling stars, a few far asteroids, drifting
//! nebula glows, occasional shooting stars and embers rising from the
//! bottom edge. Trails come from the translucent fade clear.

use glam::Vec2;
use rand_pcg::Pcg32;

use super::space::{DriftStar, Streak, draw_asteroid};
use super::{jitter, roll, scene_rng, uniform};
use crate::engine::physics::integrate;
use crate::engine::runner::{Simulation, UpdateContext};
use crate::engine::store::EntityStore;
use crate::engine::viewport::ViewportMetrics;
use crate::renderer::{ClearPolicy, Color, Draw2d, Paint, Painter, palette};
use crate::settings::EngineConfig;
use crate::{frame_factor, rock_outline};

/// Nominal counts and per-frame chances. Chances were tuned by eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarfieldTuning {
    pub stars: usize,
    pub asteroids: usize,
    pub nebulae: usize,
    pub max_streaks: usize,
    pub max_embers: usize,
    pub streak_chance: f32,
    pub ember_chance: f32,
    pub fade_alpha: f32,
}

impl Default for StarfieldTuning {
    fn default() -> Self {
        Self {
            stars: 150,
            asteroids: 8,
            nebulae: 5,
            max_streaks: 3,
            max_embers: 15,
            streak_chance: 0.005,
            ember_chance: 0.02,
            fade_alpha: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FarRock {
    pub pos: Vec2,
    pub size: f32,
    pub speed: f32,
    pub rotation: f32,
    pub spin: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nebula {
    pub pos: Vec2,
    pub radius: f32,
    pub hue: f32,
    pub opacity: f32,
    pub drift: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ember {
    pub pos: Vec2,
    pub speed: f32,
    pub size: f32,
    pub hue: f32,
    pub opacity: f32,
}

pub struct Starfield {
    tuning: StarfieldTuning,
    rng: Pcg32,
    nebula_enabled: bool,
    stars: EntityStore<DriftStar>,
    rocks: EntityStore<FarRock>,
    nebulae: EntityStore<Nebula>,
    streaks: EntityStore<Streak>,
    embers: EntityStore<Ember>,
}

impl Starfield {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_tuning(config, StarfieldTuning::default())
    }

    pub fn with_tuning(config: &EngineConfig, tuning: StarfieldTuning) -> Self {
        Self {
            rng: scene_rng(config),
            nebula_enabled: config.quality.nebula_enabled(),
            stars: EntityStore::with_cap(config.particle_budget(tuning.stars)),
            rocks: EntityStore::with_cap(config.particle_budget(tuning.asteroids)),
            nebulae: EntityStore::with_cap(tuning.nebulae),
            streaks: EntityStore::with_cap(tuning.max_streaks),
            embers: EntityStore::with_cap(config.particle_budget(tuning.max_embers)),
            tuning,
        }
    }

    pub fn stars(&self) -> &EntityStore<DriftStar> {
        &self.stars
    }

    pub fn streaks(&self) -> &EntityStore<Streak> {
        &self.streaks
    }

    pub fn embers(&self) -> &EntityStore<Ember> {
        &self.embers
    }

    pub fn nebulae(&self) -> &EntityStore<Nebula> {
        &self.nebulae
    }

    fn populate(&mut self, metrics: &ViewportMetrics) {
        let size = metrics.size();
        let rng = &mut self.rng;

        self.stars.clear();
        let stars = self.stars.cap().unwrap_or(self.tuning.stars);
        self.stars
            .extend((0..stars).map(|_| DriftStar::random(rng, size, (0.5, 2.0), (0.1, 0.6))));

        self.rocks.clear();
        let rocks = self.rocks.cap().unwrap_or(self.tuning.asteroids);
        self.rocks.extend((0..rocks).map(|_| FarRock {
            pos: Vec2::new(uniform(rng, 0.0, size.x), uniform(rng, 0.0, size.y)),
            size: uniform(rng, 3.0, 11.0),
            speed: uniform(rng, 0.2, 0.5),
            rotation: 0.0,
            spin: jitter(rng, 0.005),
            opacity: uniform(rng, 0.15, 0.3),
        }));

        self.nebulae.clear();
        if self.nebula_enabled {
            self.nebulae.extend((0..self.tuning.nebulae).map(|_| Nebula {
                pos: Vec2::new(uniform(rng, 0.0, size.x), uniform(rng, 0.0, size.y)),
                radius: uniform(rng, 100.0, 300.0),
                hue: uniform(rng, 180.0, 240.0),
                opacity: uniform(rng, 0.03, 0.05),
                drift: jitter(rng, 0.05),
            }));
        }

        self.streaks.clear();
        self.embers.clear();
    }
}

impl Simulation for Starfield {
    fn target_fps(&self) -> f32 {
        0.0
    }

    fn reset(&mut self, metrics: &ViewportMetrics) {
        self.populate(metrics);
    }

    fn resize(&mut self, metrics: &ViewportMetrics) {
        // Keep the sky; pull stragglers back inside
        let size = metrics.size();
        for star in self.stars.iter_mut() {
            star.pos = star.pos.min(size);
        }
        for rock in self.rocks.iter_mut() {
            rock.pos = rock.pos.min(size);
        }
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let dt = ctx.dt;
        let ff = frame_factor(dt);
        let size = ctx.metrics.size();
        let Self {
            tuning,
            rng,
            stars,
            rocks,
            nebulae,
            streaks,
            embers,
            ..
        } = self;

        nebulae.update_retain(|n| {
            n.pos.x += n.drift * ff;
            if n.pos.x < -n.radius {
                n.pos.x = size.x + n.radius;
            } else if n.pos.x > size.x + n.radius {
                n.pos.x = -n.radius;
            }
            true
        });

        stars.update_retain(|star| {
            star.fall(rng, dt, size.x, size.y, 0.0);
            star.twinkle += 0.02 * ff;
            true
        });

        rocks.update_retain(|rock| {
            integrate(&mut rock.pos, Vec2::new(rock.speed * 0.3, rock.speed), dt);
            rock.rotation += rock.spin * ff;
            if rock.pos.y > size.y + rock.size {
                rock.pos.y = -rock.size;
                rock.pos.x = uniform(rng, 0.0, size.x);
            }
            true
        });

        if streaks.len() < tuning.max_streaks && roll(rng, tuning.streak_chance, dt) {
            streaks.spawn(Streak {
                pos: Vec2::new(uniform(rng, 0.0, size.x), 0.0),
                angle: std::f32::consts::FRAC_PI_4 + jitter(rng, 0.15),
                speed: uniform(rng, 8.0, 16.0),
                length: uniform(rng, 80.0, 140.0),
                opacity: 1.0,
                fade: 0.01,
            });
        }
        streaks.update_retain(|s| {
            s.advance(dt);
            s.opacity > 0.0 && s.pos.y <= size.y && s.pos.x <= size.x
        });

        if roll(rng, tuning.ember_chance, dt) {
            embers.spawn(Ember {
                pos: Vec2::new(uniform(rng, 0.0, size.x), size.y + 10.0),
                speed: uniform(rng, 1.0, 3.0),
                size: uniform(rng, 2.0, 5.0),
                hue: uniform(rng, 180.0, 220.0),
                opacity: uniform(rng, 0.3, 0.7),
            });
        }
        embers.update_retain(|e| {
            e.pos.y -= e.speed * ff;
            e.pos.x += (e.pos.y * 0.01).sin() * 0.5 * ff;
            e.opacity -= 0.002 * ff;
            e.pos.y >= -10.0 && e.opacity > 0.0
        });
    }
}

impl Draw2d for Starfield {
    fn clear_policy(&self) -> ClearPolicy {
        ClearPolicy::Fade(palette::SPACE.with_alpha(self.tuning.fade_alpha))
    }

    fn draw(&self, painter: &mut dyn Painter, _metrics: &ViewportMetrics, _time_ms: f64) {
        for n in &self.nebulae {
            let origin = n.pos - Vec2::splat(n.radius);
            painter.fill_rect(
                origin,
                Vec2::splat(n.radius * 2.0),
                &Paint::glow(
                    n.pos,
                    n.radius,
                    vec![
                        (0.0, Color::hsla(n.hue, 0.8, 0.5, n.opacity)),
                        (0.5, Color::hsla(n.hue, 0.6, 0.3, n.opacity * 0.5)),
                        (1.0, Color::TRANSPARENT),
                    ],
                ),
            );
        }

        for star in &self.stars {
            let twinkle = 0.5 + star.twinkle.sin() * 0.5;
            painter.fill_circle(star.pos, star.size, &palette::WHITE.with_alpha(twinkle * 0.7).into());
        }

        for rock in &self.rocks {
            painter.set_alpha(rock.opacity);
            let outline = rock_outline(rock.pos, rock.size, rock.rotation, 6, 2.0);
            draw_asteroid(painter, &outline, palette::ROCK_FAR, palette::ROCK_FAR, 0.0);
        }
        painter.set_alpha(1.0);

        for streak in &self.streaks {
            streak.draw(painter, 3.0);
        }

        for e in &self.embers {
            painter.fill_circle(
                e.pos,
                e.size,
                &Paint::glow(
                    e.pos,
                    e.size * 2.0,
                    vec![(0.0, Color::hsla(e.hue, 1.0, 0.7, e.opacity)), (1.0, Color::TRANSPARENT)],
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::InputSnapshot;
    use crate::renderer::RecordingPainter;
    use crate::settings::QualityPreset;

    fn metrics() -> ViewportMetrics {
        ViewportMetrics {
            css_width: 1280.0,
            css_height: 720.0,
            dpr: 1.0,
            scale: 1.0,
        }
    }

    fn run(field: &mut Starfield, frames: usize) {
        let input = InputSnapshot::default();
        let m = metrics();
        for _ in 0..frames {
            let mut ctx = UpdateContext {
                dt: 1.0 / 60.0,
                now_ms: 0.0,
                input: &input,
                metrics: &m,
            };
            field.update(&mut ctx);
        }
    }

    #[test]
    fn test_nominal_population() {
        let mut field = Starfield::new(&EngineConfig::default());
        field.reset(&metrics());
        assert_eq!(field.stars().len(), 150);
        assert_eq!(field.nebulae().len(), 5);
        assert!(field.streaks().is_empty());
    }

    #[test]
    fn test_low_quality_thins_the_sky() {
        let config = EngineConfig {
            quality: QualityPreset::Low,
            low_power: true,
            ..Default::default()
        };
        let mut field = Starfield::new(&config);
        field.reset(&metrics());
        assert!(field.stars().len() < 150);
        assert!(field.nebulae().is_empty());
    }

    #[test]
    fn test_transients_stay_within_caps() {
        let mut field = Starfield::new(&EngineConfig {
            seed: Some(4),
            ..Default::default()
        });
        field.reset(&metrics());
        for _ in 0..60 {
            run(&mut field, 60);
            assert!(field.streaks().len() <= 3);
            assert!(field.embers().len() <= 15);
        }
        // Stars never leave; they wrap
        assert_eq!(field.stars().len(), 150);
        assert!(field.stars().iter().all(|s| s.pos.y <= 720.0 + 1.0));
    }

    #[test]
    fn test_embers_rise_and_expire() {
        let mut field = Starfield::new(&EngineConfig {
            seed: Some(8),
            ..Default::default()
        });
        field.reset(&metrics());
        // An ember loses 0.002 opacity per frame, so 0.7 lasts at most 350 frames
        field.tuning.ember_chance = 1.0;
        run(&mut field, 1);
        field.tuning.ember_chance = 0.0;
        assert!(!field.embers().is_empty());
        run(&mut field, 400);
        assert!(field.embers().is_empty());
    }

    #[test]
    fn test_draws_every_layer() {
        let mut field = Starfield::new(&EngineConfig::default());
        field.reset(&metrics());
        let mut painter = RecordingPainter::new();
        field.draw(&mut painter, &metrics(), 0.0);
        // nebulae + stars + rocks
        assert!(painter.shape_count() >= 5 + 150 + 8);
    }
}
