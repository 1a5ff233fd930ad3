//! Arena game
//!
//! The in-site shooter played over the page itself. Rocks come in from all
//! four edges and get faster with the level, kills build a combo multiplier,
//! and power-ups drift down from the top. The ship eases toward the pointer
//! and fires on press, with auto-repeat while held.
//!
//! Score is kept fractional (combo bonuses are tenths) and reported floored.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::space::{
    Asteroid, GamePhase, Laser, Particle, ParticleRules, Ring, RockKind, ShipStyle, Streak, burst, draw_asteroid,
    draw_particles, draw_rings, draw_ship, step_particles, step_rings,
};
use super::{jitter, scene_rng, uniform};
use crate::consts::PRUNE_MARGIN;
use crate::engine::lifecycle::{EventKind, ListenTarget};
use crate::engine::physics::{collides, decay, ease_toward, integrate, level_for_score, resolve_hits};
use crate::engine::runner::{GameStats, SceneTimer, Simulation, UpdateContext};
use crate::engine::store::EntityStore;
use crate::engine::viewport::ViewportMetrics;
use crate::frame_factor;
use crate::renderer::{Color, Draw2d, Painter, palette};
use crate::settings::EngineConfig;

const LISTENERS: &[(ListenTarget, EventKind)] = &[
    (ListenTarget::Window, EventKind::PointerMove),
    (ListenTarget::Surface, EventKind::PointerDown),
    (ListenTarget::Window, EventKind::PointerUp),
    (ListenTarget::Surface, EventKind::Click),
    (ListenTarget::Surface, EventKind::TouchStart),
    (ListenTarget::Surface, EventKind::TouchMove),
    (ListenTarget::Surface, EventKind::TouchEnd),
    (ListenTarget::Window, EventKind::KeyDown),
    (ListenTarget::Window, EventKind::KeyUp),
];

pub const ASTEROID_TIMER: u16 = 0;
pub const POWER_UP_TIMER: u16 = 1;
pub const SHOOTING_STAR_TIMER: u16 = 2;

const PARTICLES: ParticleRules = ParticleRules {
    life_decay: 0.025,
    shrink: 1.0,
    damping: 0.97,
    speed: (4.0, 9.0),
    size: (2.0, 5.0),
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaTuning {
    pub lives: u32,
    pub max_lives: u32,
    pub level_divisor: u64,
    /// Minimum time between shots (ms)
    pub shot_cooldown_ms: f64,
    pub shield_secs: f32,
    pub multi_shot_secs: f32,
    pub power_up_chance: f32,
    pub shooting_star_chance: f32,
    pub ship_speed: f32,
    /// Pointer easing per frame (x, y)
    pub ease: Vec2,
    pub ship_radius: f32,
    /// Extra reach a laser gets against a rock
    pub laser_reach: f32,
    pub pickup_radius: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            lives: 3,
            max_lives: 5,
            level_divisor: 500,
            shot_cooldown_ms: 120.0,
            shield_secs: 5.0,
            multi_shot_secs: 6.0,
            power_up_chance: 0.4,
            shooting_star_chance: 0.3,
            ship_speed: 8.0,
            ease: Vec2::new(0.15, 0.10),
            ship_radius: 20.0,
            laser_reach: 8.0,
            pickup_radius: 35.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpKind {
    Shield,
    MultiShot,
    Heal,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [PowerUpKind::Shield, PowerUpKind::MultiShot, PowerUpKind::Heal];

    pub fn color(&self) -> Color {
        match self {
            PowerUpKind::Shield => palette::CYAN,
            PowerUpKind::MultiShot => palette::PINK,
            PowerUpKind::Heal => palette::GREEN,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            PowerUpKind::Shield => "🛡",
            PowerUpKind::MultiShot => "✦",
            PowerUpKind::Heal => "❤",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerUp {
    pub pos: Vec2,
    pub speed: f32,
    pub kind: PowerUpKind,
}

pub struct Arena {
    tuning: ArenaTuning,
    rng: Pcg32,
    size: Vec2,
    phase: GamePhase,
    ship: Vec2,
    score: f64,
    lives: u32,
    combo: u32,
    max_combo: u32,
    level: u32,
    /// Seconds left on each power-up
    shield: f32,
    multi_shot: f32,
    last_shot_ms: Option<f64>,
    closing: bool,
    lasers: EntityStore<Laser>,
    asteroids: EntityStore<Asteroid>,
    power_ups: EntityStore<PowerUp>,
    particles: EntityStore<Particle>,
    rings: EntityStore<Ring>,
    streaks: EntityStore<Streak>,
}

impl Arena {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_tuning(config, ArenaTuning::default())
    }

    pub fn with_tuning(config: &EngineConfig, tuning: ArenaTuning) -> Self {
        Self {
            rng: scene_rng(config),
            size: Vec2::ZERO,
            phase: GamePhase::Ready,
            ship: Vec2::ZERO,
            score: 0.0,
            lives: tuning.lives,
            combo: 0,
            max_combo: 0,
            level: 1,
            shield: 0.0,
            multi_shot: 0.0,
            last_shot_ms: None,
            closing: false,
            lasers: EntityStore::new(),
            asteroids: EntityStore::new(),
            power_ups: EntityStore::new(),
            particles: EntityStore::with_cap(config.particle_budget(800)),
            rings: EntityStore::with_cap(config.particle_budget(64)),
            streaks: EntityStore::new(),
            tuning,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn ship(&self) -> Vec2 {
        self.ship
    }

    pub fn set_ship(&mut self, pos: Vec2) {
        self.ship = pos;
    }

    pub fn score(&self) -> u64 {
        self.score.floor() as u64
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_shielded(&self) -> bool {
        self.shield > 0.0
    }

    pub fn has_multi_shot(&self) -> bool {
        self.multi_shot > 0.0
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

    pub fn power_ups(&self) -> &EntityStore<PowerUp> {
        &self.power_ups
    }

    pub fn power_ups_mut(&mut self) -> &mut EntityStore<PowerUp> {
        &mut self.power_ups
    }

    pub fn streaks(&self) -> &EntityStore<Streak> {
        &self.streaks
    }

    fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Asteroid period for the current level
    pub fn spawn_period_ms(&self) -> u32 {
        1200u32.saturating_sub(self.level * 80).max(500)
    }

    /// Fire unless the cooldown is still running
    pub fn shoot(&mut self, now_ms: f64) -> bool {
        if self.is_over() {
            return false;
        }
        if let Some(last) = self.last_shot_ms {
            if now_ms - last < self.tuning.shot_cooldown_ms {
                return false;
            }
        }
        self.last_shot_ms = Some(now_ms);

        let ship = self.ship;
        self.lasers
            .spawn(Laser::new(ship - Vec2::new(0.0, 30.0), Vec2::new(0.0, -18.0)));
        if self.has_multi_shot() {
            self.lasers
                .spawn(Laser::new(ship + Vec2::new(-15.0, -25.0), Vec2::new(-2.0, -17.0)));
            self.lasers
                .spawn(Laser::new(ship + Vec2::new(15.0, -25.0), Vec2::new(2.0, -17.0)));
        }
        true
    }

    fn explode(&mut self, pos: Vec2, color: Color, count: usize) {
        burst(&mut self.particles, &mut self.rng, &PARTICLES, pos, color, count);
        self.rings.spawn(Ring {
            pos,
            radius: 5.0,
            opacity: 1.0,
            color,
        });
    }

    fn spawn_asteroid(&mut self) {
        if self.is_over() {
            return;
        }
        let (w, h) = (self.size.x, self.size.y);
        let rng = &mut self.rng;
        let speed = 1.5 + self.level as f32 * 0.3 + uniform(rng, 0.0, 2.0);
        let (pos, vel) = match rng.random_range(0..4) {
            0 => (
                Vec2::new(uniform(rng, 0.0, w), -50.0),
                Vec2::new(jitter(rng, 1.0), speed),
            ),
            1 => (
                Vec2::new(w + 50.0, uniform(rng, 0.0, h * 0.7)),
                Vec2::new(-speed, jitter(rng, 1.0)),
            ),
            2 => (
                Vec2::new(uniform(rng, 0.0, w), h + 50.0),
                Vec2::new(jitter(rng, 1.0), -speed * 0.5),
            ),
            _ => (
                Vec2::new(-50.0, uniform(rng, 0.0, h * 0.7)),
                Vec2::new(speed, jitter(rng, 1.0)),
            ),
        };
        let size = uniform(rng, 20.0, 50.0);
        // Two independent rolls
        let kind = if rng.random::<f32>() > 0.85 {
            RockKind::Golden
        } else if rng.random::<f32>() > 0.7 {
            RockKind::Fast
        } else {
            RockKind::Normal
        };
        let spin = jitter(rng, 0.025);
        self.asteroids.spawn(Asteroid::new(pos, vel, size, spin, kind));
    }

    fn spawn_power_up(&mut self) {
        if self.is_over() || self.rng.random::<f32>() > self.tuning.power_up_chance {
            return;
        }
        let rng = &mut self.rng;
        let kind = PowerUpKind::ALL[rng.random_range(0..PowerUpKind::ALL.len())];
        let x = uniform(rng, 50.0, (self.size.x - 50.0).max(50.0));
        self.power_ups.spawn(PowerUp {
            pos: Vec2::new(x, -30.0),
            speed: uniform(rng, 1.5, 2.5),
            kind,
        });
    }

    fn spawn_streak(&mut self) {
        if self.rng.random::<f32>() > self.tuning.shooting_star_chance {
            return;
        }
        let rng = &mut self.rng;
        self.streaks.spawn(Streak {
            pos: Vec2::new(uniform(rng, 0.0, self.size.x), -10.0),
            angle: std::f32::consts::FRAC_PI_4 + jitter(rng, 0.15),
            speed: uniform(rng, 10.0, 20.0),
            length: uniform(rng, 60.0, 100.0),
            opacity: 1.0,
            fade: 0.015,
        });
    }

    fn steer(&mut self, ctx: &UpdateContext<'_>) {
        let dt = ctx.dt;
        let input = ctx.input;
        let (top, bottom) = (100.0, (self.size.y - 50.0).max(100.0));

        if let Some(p) = input.pointer() {
            let ease = self.tuning.ease;
            self.ship.x = ease_toward(self.ship.x, p.x, 1.0 - decay(1.0 - ease.x, dt));
            self.ship.y = ease_toward(self.ship.y, p.y, 1.0 - decay(1.0 - ease.y, dt));
            self.ship.y = self.ship.y.clamp(top, bottom);
        }

        let step = self.tuning.ship_speed * frame_factor(dt);
        let (left, right) = (30.0, (self.size.x - 30.0).max(30.0));
        if input.any_down(&["arrowleft", "a"]) {
            self.ship.x = (self.ship.x - step).max(left);
        }
        if input.any_down(&["arrowright", "d"]) {
            self.ship.x = (self.ship.x + step).min(right);
        }
        if input.any_down(&["arrowup", "w"]) {
            self.ship.y = (self.ship.y - step).max(top);
        }
        if input.any_down(&["arrowdown", "s"]) {
            self.ship.y = (self.ship.y + step).min(bottom);
        }
    }

    fn resolve_laser_hits(&mut self) {
        let reach = self.tuning.laser_reach;
        let mut kills = Vec::new();
        resolve_hits(
            &mut self.lasers,
            &mut self.asteroids,
            |laser, rock| collides(laser.pos, 0.0, rock.pos, rock.size + reach),
            |_, rock| {
                rock.health = rock.health.saturating_sub(1);
                if rock.health == 0 {
                    kills.push((rock.pos, rock.kind));
                    return true;
                }
                false
            },
        );

        for (pos, kind) in kills {
            let color = if kind == RockKind::Golden {
                palette::GOLD
            } else {
                palette::PURPLE
            };
            self.explode(pos, color, 15);
            self.score += kind.points() as f64 * (1.0 + self.combo as f64 * 0.1);
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
            let level = level_for_score(self.score(), self.tuning.level_divisor);
            if level > self.level {
                self.level = level;
                log::info!("Arena level {}", level);
            }
        }
    }

    fn resolve_ship_hits(&mut self) {
        if self.is_over() || self.is_shielded() {
            return;
        }
        let (ship, radius) = (self.ship, self.tuning.ship_radius);
        let mut hits = Vec::new();
        self.asteroids.retain(|rock| {
            if collides(ship, radius, rock.pos, rock.size) {
                hits.push(rock.pos);
                return false;
            }
            true
        });

        for pos in hits {
            if self.is_over() {
                break;
            }
            self.explode(pos, palette::PINK, 20);
            self.lives = self.lives.saturating_sub(1);
            self.combo = 0;
            if self.lives == 0 {
                self.phase = GamePhase::GameOver;
                self.explode(ship, palette::RED, 30);
                log::info!("Arena over, score {} level {}", self.score(), self.level);
            }
        }
    }

    fn collect_power_ups(&mut self) {
        let over = self.is_over();
        let (ship, reach) = (self.ship, self.tuning.pickup_radius);
        let mut taken = Vec::new();
        self.power_ups.retain(|p| {
            if !over && p.pos.distance(ship) < reach {
                taken.push(*p);
                return false;
            }
            true
        });

        for p in taken {
            match p.kind {
                PowerUpKind::Shield => self.shield = self.tuning.shield_secs,
                PowerUpKind::MultiShot => self.multi_shot = self.tuning.multi_shot_secs,
                PowerUpKind::Heal => self.lives = (self.lives + 1).min(self.tuning.max_lives),
            }
            self.explode(p.pos, p.kind.color(), 10);
        }
    }
}

impl Simulation for Arena {
    fn target_fps(&self) -> f32 {
        0.0
    }

    fn listeners(&self) -> &'static [(ListenTarget, EventKind)] {
        LISTENERS
    }

    fn timers(&self) -> Vec<SceneTimer> {
        vec![
            SceneTimer {
                tag: ASTEROID_TIMER,
                period_ms: self.spawn_period_ms(),
            },
            SceneTimer {
                tag: POWER_UP_TIMER,
                period_ms: 10_000,
            },
            SceneTimer {
                tag: SHOOTING_STAR_TIMER,
                period_ms: 2_000,
            },
        ]
    }

    fn auto_repeat(&self) -> bool {
        true
    }

    fn reset(&mut self, metrics: &ViewportMetrics) {
        self.size = metrics.size();
        self.phase = GamePhase::Ready;
        self.ship = Vec2::new(self.size.x / 2.0, self.size.y - 120.0);
        self.score = 0.0;
        self.lives = self.tuning.lives;
        self.combo = 0;
        self.max_combo = 0;
        self.level = 1;
        self.shield = 0.0;
        self.multi_shot = 0.0;
        self.last_shot_ms = None;
        self.closing = false;
        self.lasers.clear();
        self.asteroids.clear();
        self.power_ups.clear();
        self.particles.clear();
        self.rings.clear();
        self.streaks.clear();
    }

    fn resize(&mut self, metrics: &ViewportMetrics) {
        self.size = metrics.size();
        self.ship = self.ship.clamp(Vec2::ZERO, self.size.max(Vec2::ZERO));
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let dt = ctx.dt;
        if self.phase == GamePhase::Ready {
            self.phase = GamePhase::Running;
        }
        if ctx.input.was_pressed("escape") {
            self.closing = true;
        }

        self.shield = (self.shield - dt).max(0.0);
        self.multi_shot = (self.multi_shot - dt).max(0.0);

        if !self.is_over() {
            self.steer(ctx);
            // One shot per space press; holding the key does not repeat
            if ctx.input.was_pressed(" ") || !ctx.input.clicks.is_empty() {
                self.shoot(ctx.now_ms);
            }
        }

        let size = self.size;
        self.streaks.update_retain(|s| {
            s.advance(dt);
            s.opacity > 0.0 && s.pos.y < size.y && s.pos.x < size.x + 50.0
        });
        self.lasers.update_retain(|l| {
            integrate(&mut l.pos, l.vel, dt);
            l.pos.y > -30.0 && l.pos.x > -30.0 && l.pos.x < size.x + 30.0
        });
        self.asteroids.update_retain(|rock| {
            rock.advance(dt);
            true
        });

        self.resolve_laser_hits();
        self.resolve_ship_hits();

        let metrics = *ctx.metrics;
        self.asteroids
            .retain(|rock| metrics.contains_with_margin(rock.pos, PRUNE_MARGIN));

        let ff = frame_factor(dt);
        self.power_ups.update_retain(|p| {
            p.pos.y += p.speed * ff;
            p.pos.y < size.y + 50.0
        });
        self.collect_power_ups();

        step_particles(&mut self.particles, &PARTICLES, dt);
        step_rings(&mut self.rings, dt);
    }

    fn on_timer(&mut self, tag: u16, metrics: &ViewportMetrics) {
        self.size = metrics.size();
        match tag {
            ASTEROID_TIMER => self.spawn_asteroid(),
            POWER_UP_TIMER => self.spawn_power_up(),
            SHOOTING_STAR_TIMER => self.spawn_streak(),
            _ => log::debug!("Unknown arena timer {tag}"),
        }
    }

    fn on_fire(&mut self, now_ms: f64) {
        self.shoot(now_ms);
    }

    fn stats(&self) -> Option<GameStats> {
        Some(GameStats {
            score: self.score(),
            lives: self.lives,
            level: self.level,
            combo: self.combo,
            game_over: self.is_over(),
        })
    }

    fn close_requested(&self) -> bool {
        self.closing
    }
}

impl Draw2d for Arena {
    fn draw(&self, painter: &mut dyn Painter, _metrics: &ViewportMetrics, time_ms: f64) {
        if !self.is_over() {
            if self.is_shielded() {
                let pulse = 0.6 + (time_ms * 0.01).sin() as f32 * 0.3;
                painter.stroke_circle(self.ship, 45.0, 3.0, palette::CYAN.with_alpha(pulse));
            }
            let flame = ((time_ms * 0.043).sin() * 0.5 + 0.5) as f32;
            draw_ship(painter, self.ship, ShipStyle::Arena, flame);
        }

        for s in &self.streaks {
            s.draw(painter, 0.0);
        }

        painter.set_glow(10.0, palette::LASER);
        for l in &self.lasers {
            painter.fill_rect(l.pos - Vec2::new(2.0, 0.0), Vec2::new(4.0, 20.0), &palette::LASER.into());
        }
        painter.set_glow(0.0, Color::TRANSPARENT);

        for rock in &self.asteroids {
            draw_asteroid(
                painter,
                &rock.outline(7, 2.5),
                rock.kind.color(),
                palette::WHITE.with_alpha(0.3),
                1.0,
            );
        }

        for p in &self.power_ups {
            painter.fill_circle(p.pos, 18.0, &p.kind.color().into());
            painter.stroke_circle(p.pos, 18.0, 2.0, palette::WHITE);
            painter.fill_text(p.kind.glyph(), p.pos - Vec2::splat(7.0), 14.0, palette::WHITE);
        }

        draw_particles(painter, &self.particles, true);
        draw_rings(painter, &self.rings);
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
            css_width: 1200.0,
            css_height: 800.0,
            dpr: 1.0,
            scale: 1.0,
        }
    }

    fn arena() -> Arena {
        let mut a = Arena::new(&EngineConfig {
            seed: Some(7),
            ..Default::default()
        });
        a.reset(&metrics());
        a
    }

    fn step_at(a: &mut Arena, input: &InputSnapshot, now_ms: f64) {
        let m = metrics();
        let mut ctx = UpdateContext {
            dt: REFERENCE_FRAME_SECS,
            now_ms,
            input,
            metrics: &m,
        };
        a.update(&mut ctx);
    }

    fn step(a: &mut Arena, input: &InputSnapshot) {
        step_at(a, input, 0.0);
    }

    fn still_rock(pos: Vec2, size: f32, kind: RockKind) -> Asteroid {
        Asteroid::new(pos, Vec2::ZERO, size, 0.0, kind)
    }

    #[test]
    fn test_fresh_session() {
        let a = arena();
        assert_eq!(a.ship(), Vec2::new(600.0, 680.0));
        assert_eq!(a.stats(), Some(GameStats {
            score: 0,
            lives: 3,
            level: 1,
            combo: 0,
            game_over: false,
        }));
        let periods: Vec<u32> = a.timers().iter().map(|t| t.period_ms).collect();
        assert_eq!(periods, vec![1120, 10_000, 2_000]);
        assert!(a.auto_repeat());
    }

    #[test]
    fn test_spawn_period_floors_at_half_a_second() {
        let mut a = arena();
        a.level = 3;
        assert_eq!(a.spawn_period_ms(), 960);
        a.level = 20;
        assert_eq!(a.spawn_period_ms(), 500);
    }

    #[test]
    fn test_shot_cooldown() {
        let mut a = arena();
        assert!(a.shoot(1000.0));
        assert!(!a.shoot(1100.0));
        assert!(a.shoot(1120.0));
        assert_eq!(a.lasers().len(), 2);
    }

    #[test]
    fn test_multi_shot_fires_three() {
        let mut a = arena();
        a.multi_shot = 6.0;
        a.shoot(0.0);
        assert_eq!(a.lasers().len(), 3);
    }

    #[test]
    fn test_combo_scoring_and_level() {
        let mut a = arena();
        a.set_ship(Vec2::new(100.0, 700.0));
        // Rocks sit on the laser path, far from the ship
        for i in 0..3 {
            a.asteroids_mut()
                .spawn(still_rock(Vec2::new(100.0, 640.0 - i as f32 * 200.0), 20.0, RockKind::Normal));
        }
        let mut now = 0.0;
        for _ in 0..90 {
            a.shoot(now);
            step_at(&mut a, &InputSnapshot::default(), now);
            now += 200.0;
        }
        // 10 + 11 + 12
        assert_eq!(a.score(), 33);
        assert_eq!(a.combo(), 3);
        assert_eq!(a.max_combo(), 3);
        assert_eq!(a.level(), 1);

        a.score = 499.0;
        a.asteroids_mut()
            .spawn(still_rock(Vec2::new(100.0, 640.0), 20.0, RockKind::Fast));
        a.shoot(now + 1000.0);
        for _ in 0..10 {
            step(&mut a, &InputSnapshot::default());
        }
        assert_eq!(a.level(), 2);
    }

    #[test]
    fn test_golden_rock_takes_two_hits() {
        let mut a = arena();
        a.set_ship(Vec2::new(100.0, 700.0));
        a.asteroids_mut()
            .spawn(still_rock(Vec2::new(100.0, 600.0), 20.0, RockKind::Golden));
        a.shoot(0.0);
        for _ in 0..10 {
            step(&mut a, &InputSnapshot::default());
        }
        assert_eq!(a.asteroids().len(), 1);
        assert_eq!(a.score(), 0);

        a.shoot(1000.0);
        for _ in 0..10 {
            step(&mut a, &InputSnapshot::default());
        }
        assert!(a.asteroids().is_empty());
        assert_eq!(a.score(), 50);
    }

    #[test]
    fn test_ship_hit_resets_combo_and_ends_game() {
        let mut a = arena();
        a.combo = 4;
        for _ in 0..3 {
            let ship = a.ship();
            a.asteroids_mut()
                .spawn(still_rock(ship + Vec2::new(10.0, 5.0), 15.0, RockKind::Normal));
            step(&mut a, &InputSnapshot::default());
            assert_eq!(a.combo(), 0);
        }
        assert_eq!(a.lives(), 0);
        assert_eq!(a.phase(), GamePhase::GameOver);
        assert!(a.stats().is_some_and(|s| s.game_over));
        assert!(!a.shoot(1_000_000.0));
    }

    #[test]
    fn test_shield_ignores_collisions_until_it_expires() {
        let mut a = arena();
        a.shield = 5.0;
        let ship = a.ship();
        a.asteroids_mut()
            .spawn(still_rock(ship, 20.0, RockKind::Normal));
        step(&mut a, &InputSnapshot::default());
        assert_eq!(a.lives(), 3);
        assert_eq!(a.asteroids().len(), 1);

        // 5 s of frames
        for _ in 0..301 {
            step(&mut a, &InputSnapshot::default());
            if !a.is_shielded() {
                break;
            }
        }
        assert!(!a.is_shielded());
        assert_eq!(a.lives(), 2);
    }

    #[test]
    fn test_power_ups() {
        let mut a = arena();
        let ship = a.ship();
        a.lives = 5;
        for kind in PowerUpKind::ALL {
            a.power_ups_mut().spawn(PowerUp {
                pos: ship,
                speed: 0.0,
                kind,
            });
        }
        step(&mut a, &InputSnapshot::default());
        assert!(a.power_ups().is_empty());
        assert!(a.is_shielded());
        assert!(a.has_multi_shot());
        // Heal caps at five
        assert_eq!(a.lives(), 5);
    }

    #[test]
    fn test_asteroids_enter_from_every_edge() {
        let mut a = arena();
        for _ in 0..200 {
            a.on_timer(ASTEROID_TIMER, &metrics());
        }
        let rocks: Vec<&Asteroid> = a.asteroids().iter().collect();
        assert_eq!(rocks.len(), 200);
        assert!(rocks.iter().any(|r| r.pos.y == -50.0));
        assert!(rocks.iter().any(|r| r.pos.x == 1250.0));
        assert!(rocks.iter().any(|r| r.pos.y == 850.0));
        assert!(rocks.iter().any(|r| r.pos.x == -50.0));
        assert!(rocks.iter().any(|r| r.kind == RockKind::Golden));
        // Every rock is heading into the screen
        for r in rocks {
            let inward = (metrics().center() - r.pos).dot(r.vel);
            assert!(inward > 0.0 || r.pos.y == -50.0 || r.pos.y == 850.0);
        }
    }

    #[test]
    fn test_space_fires_once_per_press() {
        let mut a = arena();
        let press = InputSnapshot {
            keys: [" ".to_string()].into_iter().collect(),
            pressed: vec![" ".to_string()],
            ..Default::default()
        };
        step_at(&mut a, &press, 1000.0);
        assert_eq!(a.lasers().len(), 1);

        // Still held, well past the cooldown
        let held = InputSnapshot {
            keys: [" ".to_string()].into_iter().collect(),
            ..Default::default()
        };
        for i in 1..10 {
            step_at(&mut a, &held, 1000.0 + i as f64 * 200.0);
        }
        assert_eq!(a.lasers().len(), 1);

        step_at(&mut a, &press, 3000.0);
        assert_eq!(a.lasers().len(), 2);
    }

    #[test]
    fn test_escape_requests_close() {
        let mut a = arena();
        assert!(!a.close_requested());
        let input = InputSnapshot {
            pressed: vec!["escape".to_string()],
            ..Default::default()
        };
        step(&mut a, &input);
        assert!(a.close_requested());
    }

    #[test]
    fn test_pointer_pulls_ship_within_bounds() {
        let mut a = arena();
        let input = InputSnapshot {
            pointer: Vec2::new(200.0, 10.0),
            ..Default::default()
        };
        for _ in 0..120 {
            step(&mut a, &input);
        }
        assert!((a.ship().x - 200.0).abs() < 1.0);
        assert_eq!(a.ship().y, 100.0);
    }

    #[test]
    fn test_draw_hides_ship_after_game_over() {
        let mut a = arena();
        let mut painter = RecordingPainter::new();
        a.draw(&mut painter, &metrics(), 0.0);
        assert_eq!(painter.shape_count(), 3);

        a.phase = GamePhase::GameOver;
        let mut painter = RecordingPainter::new();
        a.draw(&mut painter, &metrics(), 0.0);
        assert_eq!(painter.shape_count(), 0);
    }
}
