//! Classic shooter
//!
//! Full-screen mini-game: the ship sits near the bottom edge, asteroids fall
//! from the top once a second, and every laser hit scores the rock's size.
//! Three lives; the session ends on the third ship hit.

use std::collections::VecDeque;

use glam::Vec2;
use rand_pcg::Pcg32;

use super::space::{
    Asteroid, DriftStar, GamePhase, Laser, Particle, ParticleRules, RockKind, ShipStyle, burst, draw_asteroid,
    draw_particles, draw_ship, step_particles,
};
use super::{jitter, roll, scene_rng, uniform};
use crate::engine::lifecycle::{EventKind, ListenTarget};
use crate::engine::physics::{collides, integrate, resolve_hits};
use crate::engine::runner::{GameStats, SceneTimer, Simulation, UpdateContext};
use crate::engine::store::EntityStore;
use crate::engine::viewport::ViewportMetrics;
use crate::frame_factor;
use crate::renderer::{ClearPolicy, Color, Draw2d, Paint, Painter, palette};
use crate::settings::EngineConfig;

const LISTENERS: &[(ListenTarget, EventKind)] = &[
    (ListenTarget::Window, EventKind::PointerMove),
    (ListenTarget::Surface, EventKind::Click),
    (ListenTarget::Surface, EventKind::TouchMove),
    (ListenTarget::Window, EventKind::KeyDown),
    (ListenTarget::Window, EventKind::KeyUp),
];

const SPAWN_TIMER: u16 = 0;

const PARTICLES: ParticleRules = ParticleRules {
    life_decay: 0.02,
    shrink: 0.95,
    damping: 1.0,
    speed: (3.0, 7.0),
    size: (3.0, 6.0),
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShooterTuning {
    pub lives: u32,
    pub stars: usize,
    pub spawn_ms: u32,
    pub laser_speed: f32,
    pub ship_speed: f32,
    /// Ship collision radius
    pub ship_radius: f32,
    /// Ship distance above the bottom edge
    pub ship_offset: f32,
    pub shooting_star_chance: f32,
    pub explosion_particles: usize,
}

impl Default for ShooterTuning {
    fn default() -> Self {
        Self {
            lives: 3,
            stars: 100,
            spawn_ms: 1000,
            laser_speed: 12.0,
            ship_speed: 8.0,
            ship_radius: 20.0,
            ship_offset: 100.0,
            shooting_star_chance: 0.02,
            explosion_particles: 15,
        }
    }
}

/// Falling star that leaves a dotted trail
#[derive(Debug, Clone, PartialEq)]
pub struct TrailStar {
    pub pos: Vec2,
    pub trail: VecDeque<Vec2>,
}

const TRAIL_LEN: usize = 20;
const TRAIL_SPEED: f32 = 15.0;

pub struct Shooter {
    tuning: ShooterTuning,
    rng: Pcg32,
    size: Vec2,
    phase: GamePhase,
    ship: Vec2,
    score: u64,
    lives: u32,
    stars: EntityStore<DriftStar>,
    shooting: EntityStore<TrailStar>,
    lasers: EntityStore<Laser>,
    asteroids: EntityStore<Asteroid>,
    particles: EntityStore<Particle>,
}

impl Shooter {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_tuning(config, ShooterTuning::default())
    }

    pub fn with_tuning(config: &EngineConfig, tuning: ShooterTuning) -> Self {
        Self {
            rng: scene_rng(config),
            size: Vec2::ZERO,
            phase: GamePhase::Ready,
            ship: Vec2::ZERO,
            score: 0,
            lives: tuning.lives,
            stars: EntityStore::with_cap(config.particle_budget(tuning.stars)),
            shooting: EntityStore::new(),
            lasers: EntityStore::new(),
            asteroids: EntityStore::new(),
            particles: EntityStore::with_cap(config.particle_budget(600)),
            tuning,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn ship(&self) -> Vec2 {
        self.ship
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn lasers(&self) -> &EntityStore<Laser> {
        &self.lasers
    }

    pub fn asteroids(&self) -> &EntityStore<Asteroid> {
        &self.asteroids
    }

    pub fn asteroids_mut(&mut self) -> &mut EntityStore<Asteroid> {
        &mut self.asteroids
    }

    pub fn particles(&self) -> &EntityStore<Particle> {
        &self.particles
    }

    fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    fn fire(&mut self) {
        if self.is_over() {
            return;
        }
        self.lasers.spawn(Laser::new(
            self.ship - Vec2::new(0.0, 20.0),
            Vec2::new(0.0, -self.tuning.laser_speed),
        ));
    }

    fn spawn_asteroid(&mut self) {
        if self.is_over() {
            return;
        }
        let rng = &mut self.rng;
        let x = uniform(rng, 30.0, (self.size.x - 30.0).max(30.0));
        let size = uniform(rng, 20.0, 60.0);
        let speed = uniform(rng, 2.0, 5.0);
        let spin = jitter(rng, 0.05);
        self.asteroids.spawn(Asteroid::new(
            Vec2::new(x, -50.0),
            Vec2::new(0.0, speed),
            size,
            spin,
            RockKind::Normal,
        ));
    }

    fn steer(&mut self, ctx: &UpdateContext<'_>) {
        let input = ctx.input;
        let (lo, hi) = (20.0, (self.size.x - 20.0).max(20.0));
        // Moves are window-wide, so the pointer may be off the canvas
        if input.moved {
            if let Some(p) = input.pointer() {
                self.ship.x = p.x.clamp(lo, hi);
            }
        }
        let step = self.tuning.ship_speed * frame_factor(ctx.dt);
        if input.any_down(&["arrowleft", "a"]) {
            self.ship.x = (self.ship.x - step).max(lo);
        }
        if input.any_down(&["arrowright", "d"]) {
            self.ship.x = (self.ship.x + step).min(hi);
        }
    }

    fn update_sky(&mut self, dt: f32) {
        let size = self.size;
        let chance = self.tuning.shooting_star_chance;
        let Self {
            rng, stars, shooting, ..
        } = self;
        stars.update_retain(|star| {
            star.fall(rng, dt, size.x, size.y + 10.0, -10.0);
            true
        });

        let fall = TRAIL_SPEED * frame_factor(dt);
        shooting.update_retain(|star| {
            star.pos.y += fall;
            star.trail.push_back(star.pos);
            if star.trail.len() > TRAIL_LEN {
                star.trail.pop_front();
            }
            star.pos.y <= size.y + 10.0
        });
        if roll(rng, chance, dt) {
            shooting.spawn(TrailStar {
                pos: Vec2::new(uniform(rng, 0.0, size.x), 0.0),
                trail: VecDeque::with_capacity(TRAIL_LEN + 1),
            });
        }
    }

    fn explode(&mut self, pos: Vec2, color: Color) {
        let count = self.tuning.explosion_particles;
        burst(&mut self.particles, &mut self.rng, &PARTICLES, pos, color, count);
    }
}

impl Simulation for Shooter {
    fn target_fps(&self) -> f32 {
        0.0
    }

    fn listeners(&self) -> &'static [(ListenTarget, EventKind)] {
        LISTENERS
    }

    fn timers(&self) -> Vec<SceneTimer> {
        vec![SceneTimer {
            tag: SPAWN_TIMER,
            period_ms: self.tuning.spawn_ms,
        }]
    }

    fn reset(&mut self, metrics: &ViewportMetrics) {
        self.size = metrics.size();
        self.phase = GamePhase::Ready;
        self.score = 0;
        self.lives = self.tuning.lives;
        self.ship = Vec2::new(self.size.x / 2.0, self.size.y - self.tuning.ship_offset);
        self.lasers.clear();
        self.asteroids.clear();
        self.particles.clear();
        self.shooting.clear();

        self.stars.clear();
        let count = self.stars.cap().unwrap_or(self.tuning.stars);
        let (rng, size) = (&mut self.rng, self.size);
        self.stars
            .extend((0..count).map(|_| DriftStar::random(rng, size, (0.5, 2.5), (1.0, 3.0))));
    }

    fn resize(&mut self, metrics: &ViewportMetrics) {
        self.size = metrics.size();
        self.ship.y = self.size.y - self.tuning.ship_offset;
        self.ship.x = self.ship.x.clamp(0.0, self.size.x);
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let dt = ctx.dt;
        if self.phase == GamePhase::Ready {
            self.phase = GamePhase::Running;
        }

        self.update_sky(dt);

        if !self.is_over() {
            self.steer(ctx);
            if ctx.input.was_pressed(" ") {
                self.fire();
            }
            for _ in &ctx.input.clicks {
                self.fire();
            }
        }

        self.lasers.update_retain(|laser| {
            integrate(&mut laser.pos, laser.vel, dt);
            laser.pos.y > -20.0
        });
        self.asteroids.update_retain(|rock| {
            rock.advance(dt);
            true
        });

        let mut blasts = Vec::new();
        let mut gained = 0u64;
        resolve_hits(
            &mut self.lasers,
            &mut self.asteroids,
            |laser, rock| collides(laser.pos, 0.0, rock.pos, rock.size),
            |_, rock| {
                blasts.push(rock.pos);
                gained += rock.size.floor() as u64;
                true
            },
        );
        self.score += gained;
        for pos in blasts {
            self.explode(pos, palette::PURPLE);
        }

        if !self.is_over() {
            let (ship, radius) = (self.ship, self.tuning.ship_radius);
            let before = self.asteroids.len();
            self.asteroids.retain(|rock| !collides(ship, radius, rock.pos, rock.size));
            let hits = (before - self.asteroids.len()) as u32;
            for _ in 0..hits {
                self.explode(ship, palette::PINK);
            }
            if hits > 0 {
                self.lives = self.lives.saturating_sub(hits);
                if self.lives == 0 {
                    self.phase = GamePhase::GameOver;
                    log::info!("Shooter over, score {}", self.score);
                }
            }
        }

        let bottom = self.size.y;
        self.asteroids.retain(|rock| rock.pos.y < bottom + rock.size);
        step_particles(&mut self.particles, &PARTICLES, dt);
    }

    fn on_timer(&mut self, tag: u16, metrics: &ViewportMetrics) {
        if tag == SPAWN_TIMER {
            self.size = metrics.size();
            self.spawn_asteroid();
        }
    }

    fn stats(&self) -> Option<GameStats> {
        Some(GameStats {
            score: self.score,
            lives: self.lives,
            level: 1,
            combo: 0,
            game_over: self.is_over(),
        })
    }
}

impl Draw2d for Shooter {
    fn clear_policy(&self) -> ClearPolicy {
        ClearPolicy::Fill(palette::SPACE)
    }

    fn draw(&self, painter: &mut dyn Painter, _metrics: &ViewportMetrics, time_ms: f64) {
        for star in &self.stars {
            painter.fill_circle(
                star.pos,
                star.size,
                &palette::WHITE.with_alpha(0.3 + star.size / 3.0).into(),
            );
        }
        for star in &self.shooting {
            let len = star.trail.len() as f32;
            for (i, t) in star.trail.iter().enumerate() {
                let alpha = i as f32 / len;
                if alpha > 0.0 {
                    painter.fill_circle(*t, 3.0 * alpha, &palette::WHITE.with_alpha(alpha * 0.5).into());
                }
            }
            painter.fill_circle(star.pos, 3.0, &palette::WHITE.into());
        }

        if !self.is_over() {
            // Flicker from the frame time so drawing stays a pure read
            let flame = ((time_ms * 0.037).sin() * 0.5 + 0.5) as f32;
            draw_ship(painter, self.ship, ShipStyle::Classic, flame);
        }

        for laser in &self.lasers {
            painter.fill_rect(
                laser.pos - Vec2::new(2.0, 0.0),
                Vec2::new(4.0, 20.0),
                &Paint::streak(laser.pos, laser.pos + Vec2::new(0.0, 20.0), palette::CYAN),
            );
            painter.fill_circle(laser.pos, 6.0, &palette::CYAN.with_alpha(0.3).into());
        }

        for rock in &self.asteroids {
            draw_asteroid(painter, &rock.outline(8, 2.0), palette::ROCK_DARK, palette::ROCK_EDGE, 2.0);
        }

        draw_particles(painter, &self.particles, false);
    }
}
