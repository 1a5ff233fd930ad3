//! Space entities shared by the starfield and the two games
//!
//! Every per-frame rate here (speeds, decays, fades) is a 60 Hz value and
//! is scaled by `frame_factor(dt)` when applied.

use std::f32::consts::TAU;

use glam::Vec2;
use rand_pcg::Pcg32;

use super::uniform;
use crate::engine::physics::{decay, integrate};
use crate::engine::store::EntityStore;
use crate::renderer::{Color, Paint, Painter, palette};
use crate::{direction, frame_factor, rock_outline};

/// Game session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamePhase {
    /// State built, first tick not run yet
    #[default]
    Ready,
    Running,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Laser {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Laser {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self { pos, vel }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RockKind {
    Normal,
    Fast,
    Golden,
}

impl RockKind {
    pub fn health(&self) -> u32 {
        match self {
            RockKind::Golden => 2,
            RockKind::Normal | RockKind::Fast => 1,
        }
    }

    pub fn points(&self) -> u32 {
        match self {
            RockKind::Normal => 10,
            RockKind::Fast => 30,
            RockKind::Golden => 50,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            RockKind::Normal => palette::ROCK,
            RockKind::Fast => palette::CORAL,
            RockKind::Golden => palette::GOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Asteroid {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub rotation: f32,
    pub spin: f32,
    pub kind: RockKind,
    pub health: u32,
}

impl Asteroid {
    pub fn new(pos: Vec2, vel: Vec2, size: f32, spin: f32, kind: RockKind) -> Self {
        Self {
            pos,
            vel,
            size,
            rotation: 0.0,
            spin,
            kind,
            health: kind.health(),
        }
    }

    pub fn advance(&mut self, dt: f32) {
        integrate(&mut self.pos, self.vel, dt);
        self.rotation += self.spin * frame_factor(dt);
    }

    pub fn outline(&self, points: usize, lumpiness: f32) -> Vec<Vec2> {
        rock_outline(self.pos, self.size, self.rotation, points, lumpiness)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// 1 at birth, removed at 0
    pub life: f32,
    pub color: Color,
}

/// Per-frame particle decay rates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleRules {
    pub life_decay: f32,
    /// Size multiplier per frame (1 = constant)
    pub shrink: f32,
    /// Velocity multiplier per frame (1 = none)
    pub damping: f32,
    pub speed: (f32, f32),
    pub size: (f32, f32),
}

/// Ring left behind by an explosion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    pub pos: Vec2,
    pub radius: f32,
    pub opacity: f32,
    pub color: Color,
}

/// Emit `count` particles on evenly spaced headings
pub fn burst(
    particles: &mut EntityStore<Particle>,
    rng: &mut Pcg32,
    rules: &ParticleRules,
    pos: Vec2,
    color: Color,
    count: usize,
) {
    let step = TAU / count.max(1) as f32;
    for i in 0..count {
        let speed = uniform(rng, rules.speed.0, rules.speed.1);
        let spawned = particles.spawn(Particle {
            pos,
            vel: direction(step * i as f32) * speed,
            size: uniform(rng, rules.size.0, rules.size.1),
            life: 1.0,
            color,
        });
        if !spawned {
            break;
        }
    }
}

pub fn step_particles(particles: &mut EntityStore<Particle>, rules: &ParticleRules, dt: f32) {
    let ff = frame_factor(dt);
    let shrink = decay(rules.shrink, dt);
    let damping = decay(rules.damping, dt);
    particles.update_retain(|p| {
        integrate(&mut p.pos, p.vel, dt);
        p.vel *= damping;
        p.size *= shrink;
        p.life -= rules.life_decay * ff;
        p.life > 0.0
    });
}

/// Rings grow 3 units and fade 0.05 per frame
pub fn step_rings(rings: &mut EntityStore<Ring>, dt: f32) {
    let ff = frame_factor(dt);
    rings.update_retain(|ring| {
        ring.radius += 3.0 * ff;
        ring.opacity -= 0.05 * ff;
        ring.opacity > 0.0
    });
}

/// Particles fade with life; `scale_with_life` also shrinks the radius
pub fn draw_particles(painter: &mut dyn Painter, particles: &EntityStore<Particle>, scale_with_life: bool) {
    for p in particles {
        let radius = if scale_with_life { p.size * p.life } else { p.size };
        if radius <= 0.0 {
            continue;
        }
        painter.fill_circle(p.pos, radius, &p.color.with_alpha(p.life).into());
    }
}

pub fn draw_rings(painter: &mut dyn Painter, rings: &EntityStore<Ring>) {
    for ring in rings {
        painter.stroke_circle(ring.pos, ring.radius.max(0.0), 2.0, ring.color.with_alpha(ring.opacity));
    }
}

/// Shooting star drawn as a fading streak behind its head
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Streak {
    pub pos: Vec2,
    pub angle: f32,
    pub speed: f32,
    pub length: f32,
    pub opacity: f32,
    /// Opacity lost per frame
    pub fade: f32,
}

impl Streak {
    pub fn advance(&mut self, dt: f32) {
        integrate(&mut self.pos, direction(self.angle) * self.speed, dt);
        self.opacity -= self.fade * frame_factor(dt);
    }

    pub fn tail(&self) -> Vec2 {
        self.pos - direction(self.angle) * self.length
    }

    pub fn draw(&self, painter: &mut dyn Painter, head_radius: f32) {
        let opacity = self.opacity.max(0.0);
        let tail = self.tail();
        painter.stroke_line(
            self.pos,
            tail,
            2.0,
            &Paint::streak(self.pos, tail, palette::WHITE.with_alpha(opacity)),
        );
        if head_radius > 0.0 {
            painter.fill_circle(self.pos, head_radius, &palette::WHITE.with_alpha(opacity).into());
        }
    }
}

/// Background star drifting downward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftStar {
    pub pos: Vec2,
    pub size: f32,
    pub speed: f32,
    /// Twinkle phase (radians)
    pub twinkle: f32,
}

impl DriftStar {
    pub fn random(rng: &mut Pcg32, area: Vec2, size: (f32, f32), speed: (f32, f32)) -> Self {
        Self {
            pos: Vec2::new(uniform(rng, 0.0, area.x), uniform(rng, 0.0, area.y)),
            size: uniform(rng, size.0, size.1),
            speed: uniform(rng, speed.0, speed.1),
            twinkle: uniform(rng, 0.0, TAU),
        }
    }

    /// Fall by `speed`; past `bottom` re-enter at `top_y` at a random x
    pub fn fall(&mut self, rng: &mut Pcg32, dt: f32, width: f32, bottom: f32, top_y: f32) -> bool {
        self.pos.y += self.speed * frame_factor(dt);
        if self.pos.y > bottom {
            self.pos.y = top_y;
            self.pos.x = uniform(rng, 0.0, width);
            return true;
        }
        false
    }
}

/// Player ship outlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipStyle {
    Classic,
    Arena,
}

impl ShipStyle {
    fn hull(&self) -> &'static [(f32, f32)] {
        match self {
            ShipStyle::Classic => &[(0.0, -25.0), (-20.0, 20.0), (0.0, 10.0), (20.0, 20.0)],
            ShipStyle::Arena => &[
                (0.0, -30.0),
                (-22.0, 22.0),
                (-8.0, 12.0),
                (0.0, 16.0),
                (8.0, 12.0),
                (22.0, 22.0),
            ],
        }
    }
}

/// Draw the ship at `pos`. `flame` in 0..1 sets exhaust length and heat.
pub fn draw_ship(painter: &mut dyn Painter, pos: Vec2, style: ShipStyle, flame: f32) {
    let hull: Vec<Vec2> = style.hull().iter().map(|(x, y)| pos + Vec2::new(*x, *y)).collect();
    let (nose, tail_y) = match style {
        ShipStyle::Classic => (-25.0, 20.0),
        ShipStyle::Arena => (-30.0, 22.0),
    };
    let stops = match style {
        ShipStyle::Classic => vec![(0.0, palette::CYAN), (1.0, palette::VIOLET)],
        ShipStyle::Arena => vec![(0.0, palette::CYAN), (0.5, palette::VIOLET), (1.0, palette::PINK)],
    };
    painter.fill_polygon(
        &hull,
        &Paint::Linear {
            from: pos + Vec2::new(0.0, nose),
            to: pos + Vec2::new(0.0, tail_y),
            stops,
        },
    );
    let edge = match style {
        ShipStyle::Classic => palette::WHITE,
        ShipStyle::Arena => palette::WHITE.with_alpha(0.7),
    };
    painter.stroke_polygon(&hull, 2.0, edge);

    let exhaust = match style {
        ShipStyle::Classic => [
            pos + Vec2::new(-10.0, 20.0),
            pos + Vec2::new(0.0, 35.0 + flame * 10.0),
            pos + Vec2::new(10.0, 20.0),
        ],
        ShipStyle::Arena => [
            pos + Vec2::new(-6.0, 16.0),
            pos + Vec2::new(0.0, 16.0 + 12.0 + flame * 12.0),
            pos + Vec2::new(6.0, 16.0),
        ],
    };
    let heat = match style {
        ShipStyle::Classic => Color::rgba(255, 150, 0, 0.5 + flame * 0.5),
        ShipStyle::Arena => Color::rgba(255, 120 + (flame * 80.0) as u8, 0, 0.8),
    };
    painter.fill_polygon(&exhaust, &heat.into());
}

pub fn draw_asteroid(painter: &mut dyn Painter, outline: &[Vec2], fill: Color, edge: Color, edge_width: f32) {
    painter.fill_polygon(outline, &fill.into());
    if edge_width > 0.0 {
        painter.stroke_polygon(outline, edge_width, edge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::REFERENCE_FRAME_SECS;
    use rand::SeedableRng;

    const FRAME: f32 = REFERENCE_FRAME_SECS;

    fn rules() -> ParticleRules {
        ParticleRules {
            life_decay: 0.025,
            shrink: 1.0,
            damping: 0.97,
            speed: (4.0, 9.0),
            size: (2.0, 5.0),
        }
    }

    #[test]
    fn test_burst_spreads_evenly_and_respects_cap() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut particles = EntityStore::with_cap(10);
        burst(&mut particles, &mut rng, &rules(), Vec2::ZERO, palette::PINK, 20);
        assert_eq!(particles.len(), 10);

        let mut particles = EntityStore::new();
        burst(&mut particles, &mut rng, &rules(), Vec2::ZERO, palette::PINK, 4);
        let sum: Vec2 = particles.iter().map(|p| p.vel.normalize()).sum();
        assert!(sum.length() < 1e-4);
    }

    #[test]
    fn test_particles_expire() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut particles = EntityStore::new();
        burst(&mut particles, &mut rng, &rules(), Vec2::ZERO, palette::PINK, 15);
        // life 1.0 at 0.025 per frame
        for _ in 0..39 {
            step_particles(&mut particles, &rules(), FRAME);
        }
        assert_eq!(particles.len(), 15);
        for _ in 0..2 {
            step_particles(&mut particles, &rules(), FRAME);
        }
        assert!(particles.is_empty());
    }

    #[test]
    fn test_rings_fade_out() {
        let mut rings = EntityStore::new();
        rings.spawn(Ring {
            pos: Vec2::ZERO,
            radius: 5.0,
            opacity: 1.0,
            color: palette::PURPLE,
        });
        step_rings(&mut rings, FRAME);
        assert_eq!(rings.iter().next().map(|r| r.radius), Some(8.0));
        for _ in 0..20 {
            step_rings(&mut rings, FRAME);
        }
        assert!(rings.is_empty());
    }

    #[test]
    fn test_rock_kinds() {
        assert_eq!(RockKind::Golden.health(), 2);
        assert_eq!(RockKind::Fast.points(), 30);
        let rock = Asteroid::new(Vec2::ZERO, Vec2::Y, 20.0, 0.01, RockKind::Golden);
        assert_eq!(rock.health, 2);
        assert_eq!(rock.outline(7, 2.5).len(), 7);
    }

    #[test]
    fn test_streak_tail_trails_heading() {
        let mut streak = Streak {
            pos: Vec2::ZERO,
            angle: 0.0,
            speed: 10.0,
            length: 60.0,
            opacity: 1.0,
            fade: 0.015,
        };
        streak.advance(FRAME);
        assert!((streak.pos.x - 10.0).abs() < 1e-4);
        assert!((streak.tail().x - (-50.0)).abs() < 1e-4);
        assert!((streak.opacity - 0.985).abs() < 1e-5);
    }

    #[test]
    fn test_drift_star_wraps_to_top() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut star = DriftStar {
            pos: Vec2::new(5.0, 99.5),
            size: 1.0,
            speed: 1.0,
            twinkle: 0.0,
        };
        assert!(star.fall(&mut rng, FRAME, 200.0, 100.0, 0.0));
        assert_eq!(star.pos.y, 0.0);
        assert!(star.pos.x >= 0.0 && star.pos.x < 200.0);
    }
}
